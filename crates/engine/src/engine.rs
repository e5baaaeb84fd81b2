use crate::blocks::{BlockId, BlockPhase, TrackedBlock};
use crate::cache::ResultCache;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::merge::translate_raw;
use crate::store::FindingStore;
use prose_analyzers::{AnalyzerAdapter, AnalyzerError, LatencyClass};
use prose_document::{
    content_hash, segment, Assoc, DocumentSnapshot, EditMapping, BLOCK_OPEN_OFFSET,
};
use prose_protocol::{
    assign_keys, categorize, resolve_key, AnalyzerSource, CategorizedFindings, Category, Finding,
    FindingKey,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const HOST_CHANNEL_CAPACITY: usize = 32;

/// Engine state published after every merge, the input to both
/// presentation surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub enabled: bool,
    /// True while the initial full pass (or a re-enable pass) is running
    pub is_loading: bool,
    /// Set only by failures that make all analysis unavailable
    pub error: Option<String>,
    /// Visible findings: deduplicated, position-ordered, gated categories
    /// filtered out
    pub findings: Vec<Finding>,
    /// The visible findings partitioned by category
    pub categorized: CategorizedFindings,
    /// Ungated totals, for UI badges that survive category gating
    pub correctness_total: usize,
    pub clarity_total: usize,
    /// Current gate state, rendered as the category toggle checkmarks
    pub correctness_enabled: bool,
    pub clarity_enabled: bool,
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self {
            enabled: true,
            is_loading: true,
            error: None,
            findings: Vec::new(),
            categorized: CategorizedFindings::default(),
            correctness_total: 0,
            clarity_total: 0,
            correctness_enabled: true,
            clarity_enabled: true,
        }
    }
}

/// Outbound command to the editor surface. The engine never mutates the
/// document itself; it asks the host to, and reacts to the resulting
/// document-change notification like any other edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum HostCommand {
    ReplaceRange { from: usize, to: usize, text: String },
    SetSelection { from: usize, to: usize },
    ScrollIntoView { from: usize },
}

enum LoopEvent {
    DocChanged {
        snapshot: DocumentSnapshot,
        mapping: EditMapping,
    },
    IgnoreWord(String),
    ReplaceWord {
        from: usize,
        to: usize,
        replacement: String,
    },
    FocusWord {
        from: usize,
        to: usize,
    },
    FocusFinding(FindingKey),
    ClearFocus,
    ToggleEnabled,
    ToggleCategory(Category),
    DebounceFired {
        block: BlockId,
        generation: u64,
        class: LatencyClass,
    },
    AnalysisDone {
        block: BlockId,
        hash: u64,
        source: AnalyzerSource,
        outcome: std::result::Result<Vec<prose_analyzers::RawFinding>, AnalyzerError>,
        initial: bool,
    },
    Shutdown,
}

/// Handle to a running analysis engine. One engine per open document.
///
/// Cheap to clone; the loop shuts down when the last handle drops.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    event_tx: mpsc::Sender<LoopEvent>,
    state_rx: watch::Receiver<EngineSnapshot>,
    focus_rx: watch::Receiver<Option<FindingKey>>,
    host_rx: std::sync::Mutex<Option<mpsc::Receiver<HostCommand>>>,
}

impl Engine {
    /// Spawn the engine loop over an initial document snapshot.
    ///
    /// Every analyzable block of a non-empty initial document is analyzed
    /// once, un-debounced, and merged as a single batch so the first
    /// published state doesn't flash "no issues".
    pub fn start(
        config: EngineConfig,
        adapters: Vec<Arc<dyn AnalyzerAdapter>>,
        initial: DocumentSnapshot,
    ) -> Result<Self> {
        config.validate().map_err(EngineError::invalid_config)?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(EngineSnapshot::default());
        let (focus_tx, focus_rx) = watch::channel(None);
        let (host_tx, host_rx) = mpsc::channel(HOST_CHANNEL_CAPACITY);

        let engine_loop = EngineLoop::new(config, adapters, state_tx, focus_tx, host_tx, event_tx.clone());
        tokio::spawn(engine_loop.run(initial, event_rx));

        Ok(Self {
            inner: Arc::new(EngineInner {
                event_tx,
                state_rx,
                focus_rx,
                host_rx: std::sync::Mutex::new(Some(host_rx)),
            }),
        })
    }

    /// Notify the engine of a document transition
    pub async fn document_changed(
        &self,
        snapshot: DocumentSnapshot,
        mapping: EditMapping,
    ) -> Result<()> {
        self.send(LoopEvent::DocChanged { snapshot, mapping }).await
    }

    /// Dismiss a word globally (case-insensitive) for this session
    pub async fn ignore_word(&self, word: &str) -> Result<()> {
        self.send(LoopEvent::IgnoreWord(word.to_string())).await
    }

    /// Ask the host editor to replace a span; the engine reacts to the
    /// resulting `document_changed` like any other edit
    pub async fn replace_word(&self, from: usize, to: usize, replacement: &str) -> Result<()> {
        self.send(LoopEvent::ReplaceWord {
            from,
            to,
            replacement: replacement.to_string(),
        })
        .await
    }

    /// Focus the finding at a document span (inline decoration click)
    pub async fn focus_word(&self, from: usize, to: usize) -> Result<()> {
        self.send(LoopEvent::FocusWord { from, to }).await
    }

    /// Focus a finding by key (panel selection); also asks the host to
    /// select and scroll to the corresponding span
    pub async fn focus_finding(&self, key: FindingKey) -> Result<()> {
        self.send(LoopEvent::FocusFinding(key)).await
    }

    /// Clear focus; a no-op when nothing is focused
    pub async fn clear_focus(&self) -> Result<()> {
        self.send(LoopEvent::ClearFocus).await
    }

    /// Disable analysis (clearing all findings immediately) or re-enable
    /// it (triggering a fresh full pass)
    pub async fn toggle_enabled(&self) -> Result<()> {
        self.send(LoopEvent::ToggleEnabled).await
    }

    /// Toggle visibility of one category across both surfaces
    pub async fn toggle_category(&self, category: Category) -> Result<()> {
        self.send(LoopEvent::ToggleCategory(category)).await
    }

    /// Stream of engine state, updated after every merge
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.inner.state_rx.clone()
    }

    /// Current engine state
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        self.inner.state_rx.borrow().clone()
    }

    /// Stream of the shared focus cursor
    #[must_use]
    pub fn focus_stream(&self) -> watch::Receiver<Option<FindingKey>> {
        self.inner.focus_rx.clone()
    }

    /// Take the outbound host-command receiver. Yields `Some` exactly
    /// once; the editor surface drains it.
    #[must_use]
    pub fn take_host_commands(&self) -> Option<mpsc::Receiver<HostCommand>> {
        self.inner.host_rx.lock().ok()?.take()
    }

    async fn send(&self, event: LoopEvent) -> Result<()> {
        self.inner
            .event_tx
            .send(event)
            .await
            .map_err(|_| EngineError::Stopped)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.event_tx.try_send(LoopEvent::Shutdown);
        }
    }
}

/// All mutable engine state, owned by the spawned loop task. Mutations
/// happen only here, run-to-completion per event, so the store and the
/// cache are never written concurrently.
struct EngineLoop {
    config: EngineConfig,
    adapters: Vec<Arc<dyn AnalyzerAdapter>>,
    /// Distinct latency classes among the adapters, with their windows
    debounce_classes: Vec<(LatencyClass, Duration)>,

    snapshot: DocumentSnapshot,
    doc_len: usize,
    blocks: HashMap<BlockId, TrackedBlock>,
    next_block_id: u64,

    cache: ResultCache,
    store: FindingStore,
    enabled: bool,
    is_loading: bool,
    error: Option<String>,

    /// Outstanding (block, source) pairs of the current full pass
    initial_pending: HashSet<(BlockId, AnalyzerSource)>,
    /// Results collected for the full pass's single batch merge
    initial_collected: Vec<Finding>,
    /// Content hash each block was dispatched at during the full pass;
    /// only blocks still at that hash get a cache entry when it ends
    initial_hashes: HashMap<BlockId, u64>,

    state_tx: watch::Sender<EngineSnapshot>,
    focus_tx: watch::Sender<Option<FindingKey>>,
    host_tx: mpsc::Sender<HostCommand>,
    event_tx: mpsc::Sender<LoopEvent>,
}

impl EngineLoop {
    fn new(
        config: EngineConfig,
        adapters: Vec<Arc<dyn AnalyzerAdapter>>,
        state_tx: watch::Sender<EngineSnapshot>,
        focus_tx: watch::Sender<Option<FindingKey>>,
        host_tx: mpsc::Sender<HostCommand>,
        event_tx: mpsc::Sender<LoopEvent>,
    ) -> Self {
        let mut debounce_classes = Vec::new();
        for adapter in &adapters {
            let class = adapter.latency_class();
            if !debounce_classes.iter().any(|(c, _)| *c == class) {
                let window = match class {
                    LatencyClass::Fast => config.fast_debounce(),
                    LatencyClass::Heavy => config.heavy_debounce(),
                };
                debounce_classes.push((class, window));
            }
        }
        let cache = ResultCache::new(config.cache_capacity);
        Self {
            config,
            adapters,
            debounce_classes,
            snapshot: DocumentSnapshot::empty(),
            doc_len: 0,
            blocks: HashMap::new(),
            next_block_id: 0,
            cache,
            store: FindingStore::new(),
            enabled: true,
            is_loading: false,
            error: None,
            initial_pending: HashSet::new(),
            initial_collected: Vec::new(),
            initial_hashes: HashMap::new(),
            state_tx,
            focus_tx,
            host_tx,
            event_tx,
        }
    }

    async fn run(mut self, initial: DocumentSnapshot, mut events: mpsc::Receiver<LoopEvent>) {
        self.install_snapshot(initial);
        self.start_full_pass().await;
        self.publish();

        while let Some(event) = events.recv().await {
            if matches!(event, LoopEvent::Shutdown) {
                break;
            }
            self.handle(event).await;
        }
        log::debug!("engine loop stopped");
    }

    async fn handle(&mut self, event: LoopEvent) {
        match event {
            LoopEvent::DocChanged { snapshot, mapping } => {
                self.handle_doc_changed(snapshot, &mapping);
            }
            LoopEvent::IgnoreWord(word) => {
                let removed = self.store.ignore_word(&word);
                log::debug!("ignored {word:?}, removed {removed} finding(s)");
                self.publish();
            }
            LoopEvent::ReplaceWord {
                from,
                to,
                replacement,
            } => {
                self.emit_host(HostCommand::ReplaceRange {
                    from,
                    to,
                    text: replacement,
                });
            }
            LoopEvent::FocusWord { from, to } => self.handle_focus_word(from, to),
            LoopEvent::FocusFinding(key) => self.handle_focus_finding(key),
            LoopEvent::ClearFocus => {
                self.focus_tx.send_replace(None);
            }
            LoopEvent::ToggleEnabled => self.handle_toggle_enabled().await,
            LoopEvent::ToggleCategory(category) => {
                self.store.toggle_category(category);
                self.publish();
            }
            LoopEvent::DebounceFired {
                block,
                generation,
                class,
            } => self.handle_debounce_fired(block, generation, class),
            LoopEvent::AnalysisDone {
                block,
                hash,
                source,
                outcome,
                initial,
            } => self.handle_analysis_done(block, hash, source, outcome, initial),
            LoopEvent::Shutdown => unreachable!("handled by run"),
        }
    }

    /// First snapshot: track blocks without scheduling anything
    fn install_snapshot(&mut self, snapshot: DocumentSnapshot) {
        self.snapshot = snapshot;
        self.doc_len = self.snapshot.len();
        for block in segment(&self.snapshot) {
            let hash = content_hash(&block.text);
            let id = self.next_id();
            self.blocks
                .insert(id, TrackedBlock::new(id, block.range, block.text, hash));
        }
    }

    /// Analyze every tracked block once, un-debounced, batched so the
    /// synchronous per-block work yields between groups
    async fn start_full_pass(&mut self) {
        self.initial_pending.clear();
        self.initial_collected.clear();
        self.initial_hashes.clear();
        if !self.enabled || self.blocks.is_empty() {
            self.is_loading = false;
            return;
        }
        self.is_loading = true;

        let mut ids: Vec<BlockId> = self.blocks.keys().copied().collect();
        ids.sort();
        for id in &ids {
            self.initial_hashes.insert(*id, self.blocks[id].hash);
            for adapter in &self.adapters {
                self.initial_pending.insert((*id, adapter.source()));
            }
        }
        for group in ids.chunks(self.config.dispatch_batch) {
            for id in group {
                let tracked = &self.blocks[id];
                for adapter in &self.adapters {
                    self.spawn_analysis(
                        tracked.id,
                        tracked.text.clone(),
                        tracked.hash,
                        adapter.clone(),
                        true,
                    );
                }
            }
            tokio::task::yield_now().await;
        }
    }

    fn handle_doc_changed(&mut self, snapshot: DocumentSnapshot, mapping: &EditMapping) {
        self.snapshot = snapshot;
        self.doc_len = self.snapshot.len();

        // Re-project the live findings through the edit before any
        // scheduling, so nothing ever renders against stale coordinates.
        // Cache entries hold block-relative spans and need no remap.
        self.store.remap(mapping, &self.snapshot);
        let snapshot_ref = &self.snapshot;
        self.initial_collected.retain_mut(|finding| {
            let Some(range) = mapping.map_range(finding.range) else {
                return false;
            };
            finding.range = range;
            snapshot_ref.text_in(range) == Some(finding.text.as_str())
        });

        // Re-associate tracked blocks by mapping their anchors forward
        let old = std::mem::take(&mut self.blocks);
        let mut by_anchor: HashMap<usize, TrackedBlock> = HashMap::new();
        for (_, tracked) in old {
            if let Some(anchor) = mapping.map_pos(tracked.range.from, Assoc::After) {
                by_anchor.insert(anchor, tracked);
            } else {
                self.cache.remove(tracked.id);
            }
        }

        let mut blocks = HashMap::new();
        for block in segment(&self.snapshot) {
            let hash = content_hash(&block.text);
            let (mut tracked, matched) = match by_anchor.remove(&block.range.from) {
                Some(existing) => (existing, true),
                None => {
                    let id = self.next_id();
                    (
                        TrackedBlock::new(id, block.range, block.text.clone(), hash),
                        false,
                    )
                }
            };
            let dirty = !matched || tracked.hash != hash;
            tracked.range = block.range;
            tracked.text = block.text;
            tracked.hash = hash;

            if dirty && self.enabled {
                // Any outstanding timer for the old content is now stale
                tracked.generation += 1;
                let text_from = tracked.range.from + BLOCK_OPEN_OFFSET;
                if let Some(cached) = self.cache.get(tracked.id, hash, text_from) {
                    // Same content seen before: resolve without dispatch
                    self.merge_cached(&tracked, cached);
                    tracked.phase = BlockPhase::Idle;
                } else {
                    tracked.phase = BlockPhase::Debouncing;
                    self.spawn_debounce_timers(&tracked);
                }
            }
            blocks.insert(tracked.id, tracked);
        }

        // Whatever didn't re-associate was deleted or merged away
        for (_, gone) in by_anchor {
            log::debug!("block {} disappeared", gone.id);
            self.cache.remove(gone.id);
        }
        self.blocks = blocks;
        self.publish();
    }

    fn handle_debounce_fired(&mut self, block: BlockId, generation: u64, class: LatencyClass) {
        if !self.enabled {
            return;
        }
        let Some(tracked) = self.blocks.get_mut(&block) else {
            return;
        };
        if tracked.generation != generation {
            // A newer edit re-scheduled this block; classic debounce reset
            return;
        }
        tracked.phase = BlockPhase::InFlight;
        // Dispatch the text as it stands now, not as it was when the
        // timer was armed
        let (text, hash) = (tracked.text.clone(), tracked.hash);
        let adapters: Vec<_> = self
            .adapters
            .iter()
            .filter(|a| a.latency_class() == class)
            .cloned()
            .collect();
        for adapter in adapters {
            self.spawn_analysis(block, text.clone(), hash, adapter, false);
        }
    }

    fn handle_analysis_done(
        &mut self,
        block: BlockId,
        hash: u64,
        source: AnalyzerSource,
        outcome: std::result::Result<Vec<prose_analyzers::RawFinding>, AnalyzerError>,
        initial: bool,
    ) {
        if initial {
            self.initial_pending.remove(&(block, source));
        }

        let live = self.blocks.get(&block).map(|t| (t.range, t.text.clone(), t.hash));
        match live {
            Some((range, text, live_hash)) if live_hash == hash && self.enabled => {
                match outcome {
                    Ok(raw) => {
                        let text_from = range.from + BLOCK_OPEN_OFFSET;
                        let mut findings =
                            translate_raw(&text, text_from, self.doc_len, source, raw);
                        findings.retain(|f| !self.store.is_ignored(&f.text));
                        if initial {
                            self.initial_collected.extend(findings);
                        } else {
                            self.store.replace_block_source(range, source, findings);
                            self.cache
                                .put(block, hash, text_from, self.store.findings_in(range));
                        }
                    }
                    Err(e) => {
                        log::warn!("{} analyzer failed for block {block}: {e}", source.as_str());
                        if matches!(e, AnalyzerError::DictionaryLoad(_)) {
                            // Spell checking is unavailable entirely;
                            // surface it, unlike per-call failures
                            self.error = Some(e.to_string());
                        }
                    }
                }
                if let Some(tracked) = self.blocks.get_mut(&block) {
                    tracked.phase = BlockPhase::Idle;
                }
            }
            Some(_) => {
                log::debug!("discarding superseded result for block {block} from {}", source.as_str());
                if let Some(tracked) = self.blocks.get_mut(&block) {
                    if tracked.phase == BlockPhase::InFlight {
                        tracked.phase = BlockPhase::Idle;
                    }
                }
            }
            None => {
                log::debug!("result for vanished block {block} dropped");
            }
        }

        if initial {
            self.finish_full_pass_if_done();
        }
        self.publish();
    }

    fn finish_full_pass_if_done(&mut self) {
        if !self.is_loading || !self.initial_pending.is_empty() {
            return;
        }
        let mut merged = std::mem::take(&mut self.initial_collected);
        // Incremental merges that raced the batch stay; duplicates are
        // collapsed by the store's normalization
        merged.extend(self.store.all().iter().cloned());
        self.store.replace_all(merged);
        // Seed entries only for blocks whose content is exactly what the
        // pass analyzed; blocks edited mid-pass are covered by their own
        // pending re-analysis instead.
        for tracked in self.blocks.values() {
            if self.initial_hashes.get(&tracked.id) != Some(&tracked.hash) {
                continue;
            }
            let text_from = tracked.range.from + BLOCK_OPEN_OFFSET;
            self.cache.put(
                tracked.id,
                tracked.hash,
                text_from,
                self.store.findings_in(tracked.range),
            );
        }
        self.initial_hashes.clear();
        self.is_loading = false;
        log::info!(
            "full analysis pass complete: {} finding(s)",
            self.store.all().len()
        );
    }

    /// Merge a cache hit: the block's whole contribution is replaced by
    /// the cached findings, re-validated against the live document
    fn merge_cached(&mut self, tracked: &TrackedBlock, cached: Vec<Finding>) {
        let snapshot = &self.snapshot;
        let store = &self.store;
        let valid: Vec<Finding> = cached
            .into_iter()
            .filter(|f| {
                f.is_valid_for(self.doc_len)
                    && !store.is_ignored(&f.text)
                    && snapshot.text_in(f.range) == Some(f.text.as_str())
            })
            .collect();
        self.store.replace_block(tracked.range, valid);
    }

    async fn handle_toggle_enabled(&mut self) {
        self.enabled = !self.enabled;
        if self.enabled {
            log::info!("analysis re-enabled, starting full pass");
            self.start_full_pass().await;
        } else {
            log::info!("analysis disabled, clearing findings");
            self.store.clear();
            self.cache.clear();
            self.initial_pending.clear();
            self.initial_collected.clear();
            self.initial_hashes.clear();
            self.is_loading = false;
            // Outstanding results fail their generation/hash checks and
            // the enabled guard on arrival; no hard cancellation needed
            for tracked in self.blocks.values_mut() {
                tracked.generation += 1;
                tracked.phase = BlockPhase::Idle;
            }
        }
        self.publish();
    }

    fn handle_focus_word(&mut self, from: usize, to: usize) {
        let visible = self.store.visible();
        let index = visible
            .iter()
            .position(|f| f.range.from == from && f.range.to == to)
            .or_else(|| visible.iter().position(|f| f.range.contains(from)));
        match index {
            Some(i) => {
                let keys = assign_keys(&visible);
                self.focus_tx.send_replace(Some(keys[i].clone()));
            }
            // Focusing something that no longer exists clears focus
            None => {
                self.focus_tx.send_replace(None);
            }
        }
    }

    fn handle_focus_finding(&mut self, key: FindingKey) {
        let visible = self.store.visible();
        match resolve_key(&visible, &key) {
            Some(i) => {
                let range = visible[i].range;
                self.focus_tx.send_replace(Some(key));
                self.emit_host(HostCommand::SetSelection {
                    from: range.from,
                    to: range.to,
                });
                self.emit_host(HostCommand::ScrollIntoView { from: range.from });
            }
            None => {
                self.focus_tx.send_replace(None);
            }
        }
    }

    fn spawn_debounce_timers(&self, tracked: &TrackedBlock) {
        for (class, window) in &self.debounce_classes {
            let tx = self.event_tx.clone();
            let (block, generation, class, window) =
                (tracked.id, tracked.generation, *class, *window);
            tokio::spawn(async move {
                tokio::time::sleep(window).await;
                let _ = tx
                    .send(LoopEvent::DebounceFired {
                        block,
                        generation,
                        class,
                    })
                    .await;
            });
        }
    }

    fn spawn_analysis(
        &self,
        block: BlockId,
        text: String,
        hash: u64,
        adapter: Arc<dyn AnalyzerAdapter>,
        initial: bool,
    ) {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let source = adapter.source();
            let outcome = adapter.analyze(&text).await;
            let _ = tx
                .send(LoopEvent::AnalysisDone {
                    block,
                    hash,
                    source,
                    outcome,
                    initial,
                })
                .await;
        });
    }

    fn emit_host(&self, command: HostCommand) {
        if let Err(e) = self.host_tx.try_send(command) {
            log::debug!("host command dropped: {e}");
        }
    }

    fn publish(&mut self) {
        let visible = self.store.visible();
        let (correctness_total, clarity_total) = self.store.counts();
        let state = EngineSnapshot {
            enabled: self.enabled,
            is_loading: self.is_loading,
            error: self.error.clone(),
            categorized: categorize(&visible),
            correctness_total,
            clarity_total,
            correctness_enabled: self.store.is_category_enabled(Category::Correctness),
            clarity_enabled: self.store.is_category_enabled(Category::Clarity),
            findings: visible,
        };

        let focused = self.focus_tx.borrow().clone();
        if let Some(key) = focused {
            if resolve_key(&state.findings, &key).is_none() {
                self.focus_tx.send_replace(None);
            }
        }
        self.state_tx.send_replace(state);
    }

    fn next_id(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        id
    }
}
