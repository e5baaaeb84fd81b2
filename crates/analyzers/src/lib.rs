mod adapter;
mod dictionary;
mod error;
mod llm;
mod rules;
mod taxonomy;

pub use adapter::{AnalyzerAdapter, LatencyClass, RawFinding};
pub use dictionary::DictionaryAnalyzer;
pub use error::{AnalyzerError, Result};
pub use llm::{ChatClient, LlmAnalyzer};
pub use rules::RuleAnalyzer;
pub use taxonomy::classify;
