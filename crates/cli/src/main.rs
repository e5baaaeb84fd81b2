use anyhow::{Context, Result};
use clap::Parser;
use prose_analyzers::{AnalyzerAdapter, DictionaryAnalyzer, RuleAnalyzer};
use prose_document::parse_markdown;
use prose_engine::analyze_document;
use prose_protocol::Severity;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::CliConfig;

mod config;
mod report;

#[derive(Parser)]
#[command(name = "prose-check")]
#[command(about = "Check prose for correctness and clarity issues", long_about = None)]
#[command(version)]
struct Cli {
    /// Markdown or plain-text file to check ("-" reads stdin)
    file: PathBuf,

    /// Emit machine-readable JSON on stdout
    #[arg(long)]
    json: bool,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Newline-separated wordlist overriding the built-in dictionary
    #[arg(long)]
    wordlist: Option<PathBuf>,

    /// Exit non-zero when error-severity findings are present
    #[arg(long)]
    strict: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log only warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };

    let input = read_input(&cli.file)?;
    let snapshot = parse_markdown(&input);

    let wordlist = cli.wordlist.as_ref().or(config.wordlist.as_ref());
    let dictionary = match wordlist {
        Some(path) => DictionaryAnalyzer::load(path).await?,
        None => DictionaryAnalyzer::builtin(),
    }
    .max_suggestions(config.engine.max_suggestions);
    let adapters: Vec<Arc<dyn AnalyzerAdapter>> =
        vec![Arc::new(dictionary), Arc::new(RuleAnalyzer::new())];

    let findings = analyze_document(&snapshot, &adapters).await;
    let has_errors = findings.iter().any(|f| f.severity == Severity::Error);

    let name = display_name(&cli.file);
    if cli.json {
        println!("{}", report::render_json(name, &findings)?);
    } else {
        print!(
            "{}",
            report::render_text(name, &findings, config.engine.max_suggestions)
        );
    }

    if cli.strict && has_errors {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    // Keep stdout clean for report/JSON output
    if cli.quiet || cli.json {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}

fn display_name(path: &Path) -> &str {
    if path.as_os_str() == "-" {
        "<stdin>"
    } else {
        path.to_str().unwrap_or("<file>")
    }
}
