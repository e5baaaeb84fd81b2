use thiserror::Error;

/// Result type for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Errors that can occur while manipulating document snapshots
#[derive(Error, Debug)]
pub enum DocumentError {
    /// A position lies outside the document
    #[error("Position {pos} out of bounds (document length {len})")]
    OutOfBounds { pos: usize, len: usize },

    /// An edit endpoint landed on a node boundary in a way that cannot be
    /// expressed as a text replacement
    #[error("Edit [{from}, {to}) splits a node boundary")]
    BoundarySplit { from: usize, to: usize },

    /// An inverted range was supplied
    #[error("Inverted range: from={from}, to={to}")]
    InvertedRange { from: usize, to: usize },
}
