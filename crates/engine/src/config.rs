use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the analysis scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Debounce window for fast/local analyzers, in milliseconds
    pub debounce_fast_ms: u64,

    /// Debounce window for heavier remote analyzers, in milliseconds
    pub debounce_heavy_ms: u64,

    /// Maximum number of per-block cache entries kept
    pub cache_capacity: usize,

    /// Blocks dispatched per group during a full pass, with a yield
    /// between groups so a large paste cannot monopolize the loop
    pub dispatch_batch: usize,

    /// Suggestion cap surfaced per finding
    pub max_suggestions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_fast_ms: 300,
            debounce_heavy_ms: 500,
            cache_capacity: 100,
            dispatch_batch: 5,
            max_suggestions: 5,
        }
    }
}

impl EngineConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_capacity == 0 {
            return Err("cache_capacity must be > 0".to_string());
        }
        if self.dispatch_batch == 0 {
            return Err("dispatch_batch must be > 0".to_string());
        }
        if self.debounce_fast_ms > self.debounce_heavy_ms {
            return Err(format!(
                "debounce_fast_ms ({}) cannot exceed debounce_heavy_ms ({})",
                self.debounce_fast_ms, self.debounce_heavy_ms
            ));
        }
        Ok(())
    }

    /// Debounce duration for the fast analyzer class
    #[must_use]
    pub const fn fast_debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_fast_ms)
    }

    /// Debounce duration for the heavy analyzer class
    #[must_use]
    pub const fn heavy_debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_heavy_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_capacity() {
        let config = EngineConfig {
            cache_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_inverted_debounce() {
        let config = EngineConfig {
            debounce_fast_ms: 900,
            debounce_heavy_ms: 500,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
