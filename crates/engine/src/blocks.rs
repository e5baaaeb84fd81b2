use prose_protocol::DocRange;

/// Stable identity of a tracked block, assigned when the block first
/// appears and carried across edits by mapping its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u64);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// Where a block sits in its current analysis cycle.
///
/// One cycle runs `Idle -> Debouncing -> InFlight` and ends `Merged`,
/// `Superseded`, or `Failed`; the terminal outcomes all return the block
/// to `Idle`, with supersession and failure leaving the store untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPhase {
    Idle,
    Debouncing,
    InFlight,
}

/// Scheduler state for one analyzable block
#[derive(Debug, Clone)]
pub struct TrackedBlock {
    pub id: BlockId,
    /// Node span in current document coordinates
    pub range: DocRange,
    /// Current text content
    pub text: String,
    /// Hash of `text`
    pub hash: u64,
    pub phase: BlockPhase,
    /// Bumped on every re-schedule; stale debounce timers carry an older
    /// generation and are ignored when they fire
    pub generation: u64,
}

impl TrackedBlock {
    pub fn new(id: BlockId, range: DocRange, text: String, hash: u64) -> Self {
        Self {
            id,
            range,
            text,
            hash,
            phase: BlockPhase::Idle,
            generation: 0,
        }
    }
}
