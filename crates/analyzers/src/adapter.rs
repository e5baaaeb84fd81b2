use crate::error::Result;
use async_trait::async_trait;
use prose_protocol::{AnalyzerSource, Category, Severity};
use serde::{Deserialize, Serialize};

/// How long an adapter typically takes, which picks its debounce window:
/// local analyzers feel instant and get the short window, remote
/// cross-paragraph ones get the longer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyClass {
    Fast,
    Heavy,
}

/// One issue reported by an analyzer backend, in analysis coordinates:
/// byte offsets relative to the block text that was analyzed, `end`
/// exclusive. The scheduler translates these into document coordinates.
///
/// Category and severity are already normalized by the adapter that
/// produced the finding; each backend maps its native taxonomy itself,
/// falling back to the shared keyword table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFinding {
    pub start: usize,
    pub end: usize,
    pub category: Category,
    pub severity: Severity,
    pub rule_id: String,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl RawFinding {
    /// Whether the offsets address a non-empty span of `text` on byte
    /// boundaries
    #[must_use]
    pub fn locates_in(&self, text: &str) -> bool {
        self.start < self.end
            && self.end <= text.len()
            && text.is_char_boundary(self.start)
            && text.is_char_boundary(self.end)
    }
}

/// A pluggable analysis backend.
///
/// Implementations differ in latency, categorization, and confidence but
/// share this contract; the scheduler works identically with one adapter
/// or five. A call that fails contributes zero findings for the block;
/// it must never corrupt other adapters' results.
#[async_trait]
pub trait AnalyzerAdapter: Send + Sync {
    /// Which source tag this adapter stamps on its findings
    fn source(&self) -> AnalyzerSource;

    /// Debounce class for this adapter
    fn latency_class(&self) -> LatencyClass {
        LatencyClass::Fast
    }

    /// Analyze one block's text, returning findings in analysis
    /// coordinates
    async fn analyze(&self, text: &str) -> Result<Vec<RawFinding>>;
}
