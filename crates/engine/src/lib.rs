//! Incremental analysis scheduler.
//!
//! [`Engine`] owns one document's analysis lifecycle: it tracks
//! analyzable blocks across edits, debounces re-analysis per latency
//! class, suppresses stale results by content hash, caches per-block
//! results, and merges everything into a single position-ordered
//! finding store published through a watch channel.
//!
//! [`analyze_document`] is the batch alternative for one-shot use.

mod blocks;
mod cache;
mod config;
mod engine;
mod error;
mod merge;
mod oneshot;
mod store;

pub use config::EngineConfig;
pub use engine::{Engine, EngineSnapshot, HostCommand};
pub use error::{EngineError, Result};
pub use oneshot::analyze_document;
