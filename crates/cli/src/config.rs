use anyhow::{Context, Result};
use prose_engine::EngineConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// On-disk CLI configuration. Every field is optional; omitted engine
/// settings fall back to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub engine: EngineConfig,

    /// Newline-separated wordlist replacing the built-in dictionary
    pub wordlist: Option<PathBuf>,
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config
            .engine
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
        Ok(config)
    }
}
