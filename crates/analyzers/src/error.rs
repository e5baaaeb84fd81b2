use thiserror::Error;

/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors that can occur inside an analyzer backend.
///
/// Per-call failures degrade to zero findings for the block at the
/// scheduler; only `DictionaryLoad` is surfaced to the user, because it
/// makes the spell checker unavailable entirely.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// The dictionary wordlist could not be loaded
    #[error("Dictionary load failed: {0}")]
    DictionaryLoad(String),

    /// The remote backend call failed
    #[error("Backend error: {0}")]
    Backend(String),

    /// The backend returned data that could not be parsed
    #[error("Malformed analyzer response: {0}")]
    MalformedResponse(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AnalyzerError {
    /// Create a dictionary load error
    pub fn dictionary_load(msg: impl Into<String>) -> Self {
        Self::DictionaryLoad(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }
}
