mod error;
mod hash;
mod mapping;
mod parse;
mod segment;
mod types;

pub use error::{DocumentError, Result};
pub use hash::content_hash;
pub use mapping::{Assoc, EditMapping, ReplacedSpan};
pub use parse::parse_markdown;
pub use segment::{segment, Block};
pub use types::{DocNode, DocumentSnapshot, NodeKind, BLOCK_OPEN_OFFSET};
