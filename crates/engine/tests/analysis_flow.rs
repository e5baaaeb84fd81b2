//! End-to-end scheduler behavior over a fake analyzer: debouncing,
//! stale suppression, caching, ignore/category gating, and the host
//! command channel. All tests run on a paused clock.

use async_trait::async_trait;
use prose_analyzers::{AnalyzerAdapter, AnalyzerError, LatencyClass, RawFinding};
use prose_document::{parse_markdown, DocNode, DocumentSnapshot};
use prose_engine::{Engine, EngineConfig, EngineSnapshot, HostCommand};
use prose_protocol::{AnalyzerSource, Category, DocRange, Severity};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Flags every occurrence of a fixed needle, case-insensitively, with
/// an optional artificial latency.
struct FakeAnalyzer {
    source: AnalyzerSource,
    class: LatencyClass,
    category: Category,
    needle: String,
    delay: Duration,
    fail_call: Option<usize>,
    calls: Arc<AtomicUsize>,
    texts: Arc<Mutex<Vec<String>>>,
}

impl FakeAnalyzer {
    fn new(needle: &str) -> Self {
        Self {
            source: AnalyzerSource::Rules,
            class: LatencyClass::Fast,
            category: Category::Correctness,
            needle: needle.to_lowercase(),
            delay: Duration::ZERO,
            fail_call: None,
            calls: Arc::new(AtomicUsize::new(0)),
            texts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn with_source(mut self, source: AnalyzerSource, category: Category) -> Self {
        self.source = source;
        self.category = category;
        self
    }

    /// Fail the nth call (1-based) with a backend error
    fn failing_call(mut self, n: usize) -> Self {
        self.fail_call = Some(n);
        self
    }
}

#[async_trait]
impl AnalyzerAdapter for FakeAnalyzer {
    fn source(&self) -> AnalyzerSource {
        self.source
    }

    fn latency_class(&self) -> LatencyClass {
        self.class
    }

    async fn analyze(&self, text: &str) -> prose_analyzers::Result<Vec<RawFinding>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.texts.lock().unwrap().push(text.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_call == Some(call) {
            return Err(AnalyzerError::backend("connection reset"));
        }
        let lower = text.to_lowercase();
        let mut findings = Vec::new();
        let mut at = 0;
        while let Some(i) = lower[at..].find(&self.needle) {
            let start = at + i;
            findings.push(RawFinding {
                start,
                end: start + self.needle.len(),
                category: self.category,
                severity: Severity::Error,
                rule_id: "fake".to_string(),
                message: "flagged by test analyzer".to_string(),
                suggestions: vec!["the".to_string()],
            });
            at = start + self.needle.len();
        }
        Ok(findings)
    }
}

/// Always fails the way an unloadable wordlist does
struct BrokenDictionary;

#[async_trait]
impl AnalyzerAdapter for BrokenDictionary {
    fn source(&self) -> AnalyzerSource {
        AnalyzerSource::Dictionary
    }

    fn latency_class(&self) -> LatencyClass {
        LatencyClass::Fast
    }

    async fn analyze(&self, _text: &str) -> prose_analyzers::Result<Vec<RawFinding>> {
        Err(AnalyzerError::dictionary_load("wordlist missing"))
    }
}

async fn wait_for(
    rx: &mut watch::Receiver<EngineSnapshot>,
    what: &str,
    pred: impl Fn(&EngineSnapshot) -> bool,
) -> EngineSnapshot {
    tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            {
                let state = rx.borrow_and_update();
                if pred(&state) {
                    return state.clone();
                }
            }
            rx.changed().await.expect("engine loop stopped");
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
}

#[tokio::test(start_paused = true)]
async fn initial_pass_covers_whole_document() {
    let fake = FakeAnalyzer::new("teh");
    let calls = fake.calls.clone();
    let doc = parse_markdown("Teh cat sat.\n\nAnother teh here.");
    let engine = Engine::start(EngineConfig::default(), vec![Arc::new(fake)], doc.clone()).unwrap();
    let mut rx = engine.subscribe();

    let state = wait_for(&mut rx, "initial pass", |s| !s.is_loading).await;
    assert_eq!(state.findings.len(), 2);
    // Position order across blocks, and spans that match the document
    assert!(state.findings[0].range.to <= state.findings[1].range.from);
    for finding in &state.findings {
        assert_eq!(doc.text_in(finding.range), Some(finding.text.as_str()));
    }
    // One dispatch per block, un-debounced
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_coalesce_into_one_analysis() {
    let fake = FakeAnalyzer::new("teh");
    let calls = fake.calls.clone();
    let texts = fake.texts.clone();
    let mut doc = DocumentSnapshot::new(vec![DocNode::paragraph("")]);
    let engine = Engine::start(EngineConfig::default(), vec![Arc::new(fake)], doc.clone()).unwrap();
    let mut rx = engine.subscribe();
    wait_for(&mut rx, "empty initial pass", |s| !s.is_loading).await;

    // Five keystrokes, 50ms apart, all inside the 300ms debounce window
    for chunk in ["T", "e", "h", " cat", " sat"] {
        let pos = doc.len() - 1;
        let (next, mapping) = doc.insert_at(pos, chunk).unwrap();
        doc = next;
        engine.document_changed(doc.clone(), mapping).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let state = wait_for(&mut rx, "debounced analysis", |s| !s.findings.is_empty()).await;
    assert_eq!(state.findings.len(), 1);
    assert_eq!(state.findings[0].text, "Teh");

    // No earlier timer ever dispatched, and none are still pending
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(texts.lock().unwrap().as_slice(), ["Teh cat sat"]);
}

#[tokio::test(start_paused = true)]
async fn superseded_results_never_surface() {
    let fake = FakeAnalyzer::new("teh").with_delay(Duration::from_millis(1000));
    let calls = fake.calls.clone();
    let doc = parse_markdown("Teh cat");
    let engine = Engine::start(EngineConfig::default(), vec![Arc::new(fake)], doc.clone()).unwrap();

    // Fix the typo while the slow initial analysis is still in flight
    tokio::time::sleep(Duration::from_millis(100)).await;
    let (doc2, mapping) = doc.replace_range(DocRange::new(1, 4), "The").unwrap();
    engine.document_changed(doc2, mapping).await.unwrap();

    // Old-text result arrives at t=1000 and must be discarded; the
    // re-analysis of the corrected text lands at t=1400
    tokio::time::sleep(Duration::from_millis(2000)).await;
    let state = engine.snapshot();
    assert!(!state.is_loading);
    assert!(state.findings.is_empty(), "stale finding surfaced: {:?}", state.findings);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn quick_revert_resolves_from_cache() {
    let fake = FakeAnalyzer::new("teh");
    let calls = fake.calls.clone();
    let doc = parse_markdown("Teh cat");
    let engine = Engine::start(EngineConfig::default(), vec![Arc::new(fake)], doc.clone()).unwrap();
    let mut rx = engine.subscribe();
    wait_for(&mut rx, "initial pass", |s| !s.is_loading).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Edit and undo within one debounce window
    let (doc2, m1) = doc.replace_range(DocRange::new(1, 4), "The").unwrap();
    engine.document_changed(doc2.clone(), m1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let (doc3, m2) = doc2.replace_range(DocRange::new(1, 4), "Teh").unwrap();
    engine.document_changed(doc3, m2).await.unwrap();

    let state = wait_for(&mut rx, "cached findings", |s| !s.findings.is_empty()).await;
    assert_eq!(state.findings[0].text, "Teh");
    assert_eq!(state.findings[0].range, DocRange::new(1, 4));

    // Neither the edit nor the revert reached the analyzer
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn edit_during_initial_pass_never_caches_stale_results() {
    // The block is edited while its initial analysis is in flight, and
    // the debounced re-analysis of the edited text fails. The finished
    // pass must not record an entry for content it never analyzed, or a
    // later revert to that content would resolve to the wrong findings
    // with no re-dispatch.
    let fake = FakeAnalyzer::new("teh")
        .with_delay(Duration::from_millis(1000))
        .failing_call(2);
    let calls = fake.calls.clone();
    let doc = parse_markdown("Teh cat");
    let engine = Engine::start(EngineConfig::default(), vec![Arc::new(fake)], doc.clone()).unwrap();
    let mut rx = engine.subscribe();

    // Edit mid-pass; the re-analysis dispatched for this text is the
    // failing call
    tokio::time::sleep(Duration::from_millis(100)).await;
    let (doc2, mapping) = doc.insert_at(8, " teh").unwrap();
    engine.document_changed(doc2.clone(), mapping).await.unwrap();
    wait_for(&mut rx, "pass over superseded content", |s| !s.is_loading).await;
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(engine.snapshot().findings.is_empty());

    // Edit away and back to the mid-pass content: this must re-dispatch
    // rather than resolve from a cache entry the pass never earned
    let (doc3, m1) = doc2.delete_range(DocRange::new(8, 12)).unwrap();
    engine.document_changed(doc3.clone(), m1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let (doc4, m2) = doc3.insert_at(8, " teh").unwrap();
    engine.document_changed(doc4, m2).await.unwrap();

    let state = wait_for(&mut rx, "re-analysis of reverted text", |s| {
        s.findings.len() == 2
    })
    .await;
    assert_eq!(state.findings[0].range, DocRange::new(1, 4));
    assert_eq!(state.findings[1].range, DocRange::new(9, 12));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn ignored_words_stay_suppressed() {
    let fake = FakeAnalyzer::new("teh");
    let doc = parse_markdown("Teh cat.\n\nteh again.");
    let engine = Engine::start(EngineConfig::default(), vec![Arc::new(fake)], doc.clone()).unwrap();
    let mut rx = engine.subscribe();
    let state = wait_for(&mut rx, "initial pass", |s| !s.is_loading).await;
    assert_eq!(state.findings.len(), 2);

    // Case-insensitive, and removes every instance at once
    engine.ignore_word("TEH").await.unwrap();
    wait_for(&mut rx, "ignore applied", |s| s.findings.is_empty()).await;

    // Ignoring again is a no-op, not an error
    engine.ignore_word("TEH").await.unwrap();

    // Fresh analysis results are filtered through the same set
    let (doc2, mapping) = doc.insert_at(21, " teh").unwrap();
    engine.document_changed(doc2, mapping).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(engine.snapshot().findings.is_empty());
}

#[tokio::test(start_paused = true)]
async fn category_gating_hides_without_destroying() {
    let correctness = FakeAnalyzer::new("teh");
    let clarity = FakeAnalyzer::new("very").with_source(AnalyzerSource::Llm, Category::Clarity);
    let doc = parse_markdown("Teh very cat.");
    let engine = Engine::start(
        EngineConfig::default(),
        vec![Arc::new(correctness), Arc::new(clarity)],
        doc,
    )
    .unwrap();
    let mut rx = engine.subscribe();
    let state = wait_for(&mut rx, "initial pass", |s| !s.is_loading && s.findings.len() == 2).await;
    assert_eq!(state.correctness_total, 1);
    assert_eq!(state.clarity_total, 1);
    assert!(state.correctness_enabled && state.clarity_enabled);

    engine.toggle_category(Category::Clarity).await.unwrap();
    let state = wait_for(&mut rx, "clarity hidden", |s| s.findings.len() == 1).await;
    assert_eq!(state.findings[0].category, Category::Correctness);
    assert!(state.categorized.clarity.is_empty());
    assert!(!state.clarity_enabled);
    // Badge totals ignore the gate
    assert_eq!(state.clarity_total, 1);

    engine.toggle_category(Category::Clarity).await.unwrap();
    let state = wait_for(&mut rx, "clarity restored", |s| s.findings.len() == 2).await;
    assert_eq!(state.categorized.clarity.len(), 1);
    assert!(state.clarity_enabled);
}

#[tokio::test(start_paused = true)]
async fn disable_clears_and_reenable_reanalyzes() {
    let fake = FakeAnalyzer::new("teh");
    let calls = fake.calls.clone();
    let doc = parse_markdown("Teh cat");
    let engine = Engine::start(EngineConfig::default(), vec![Arc::new(fake)], doc).unwrap();
    let mut rx = engine.subscribe();
    wait_for(&mut rx, "initial pass", |s| !s.is_loading).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    engine.toggle_enabled().await.unwrap();
    let state = wait_for(&mut rx, "disabled", |s| !s.enabled).await;
    assert!(state.findings.is_empty());

    engine.toggle_enabled().await.unwrap();
    let state = wait_for(&mut rx, "re-enabled pass", |s| {
        s.enabled && !s.is_loading && !s.findings.is_empty()
    })
    .await;
    assert_eq!(state.findings.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn dictionary_load_failure_is_surfaced() {
    let doc = parse_markdown("Teh cat");
    let engine = Engine::start(EngineConfig::default(), vec![Arc::new(BrokenDictionary)], doc).unwrap();
    let mut rx = engine.subscribe();
    let state = wait_for(&mut rx, "failed pass", |s| !s.is_loading).await;
    assert!(state.error.is_some());
    assert!(state.findings.is_empty());
}

#[tokio::test(start_paused = true)]
async fn host_commands_flow_for_replace_and_focus() {
    let fake = FakeAnalyzer::new("teh");
    let doc = parse_markdown("Teh cat");
    let engine = Engine::start(EngineConfig::default(), vec![Arc::new(fake)], doc).unwrap();
    let mut rx = engine.subscribe();
    let state = wait_for(&mut rx, "initial pass", |s| !s.findings.is_empty()).await;

    let mut host = engine.take_host_commands().expect("first take yields the receiver");
    assert!(engine.take_host_commands().is_none());

    engine.replace_word(1, 4, "The").await.unwrap();
    assert_eq!(
        host.recv().await,
        Some(HostCommand::ReplaceRange {
            from: 1,
            to: 4,
            text: "The".to_string(),
        })
    );

    // Panel selection drives editor selection and scroll
    let key = state.findings[0].key(0);
    engine.focus_finding(key.clone()).await.unwrap();
    assert_eq!(host.recv().await, Some(HostCommand::SetSelection { from: 1, to: 4 }));
    assert_eq!(host.recv().await, Some(HostCommand::ScrollIntoView { from: 1 }));
    assert_eq!(engine.focus_stream().borrow().as_ref(), Some(&key));

    engine.clear_focus().await.unwrap();
    engine.clear_focus().await.unwrap();
    let mut focus = engine.focus_stream();
    tokio::time::timeout(Duration::from_secs(5), async {
        while focus.borrow_and_update().is_some() {
            focus.changed().await.unwrap();
        }
    })
    .await
    .expect("focus never cleared");
}

#[tokio::test(start_paused = true)]
async fn focus_clears_when_target_disappears() {
    let fake = FakeAnalyzer::new("teh");
    let doc = parse_markdown("Teh cat");
    let engine = Engine::start(EngineConfig::default(), vec![Arc::new(fake)], doc).unwrap();
    let mut rx = engine.subscribe();
    wait_for(&mut rx, "initial pass", |s| !s.findings.is_empty()).await;

    engine.focus_word(1, 4).await.unwrap();
    let mut focus = engine.focus_stream();
    tokio::time::timeout(Duration::from_secs(5), async {
        while focus.borrow_and_update().is_none() {
            focus.changed().await.unwrap();
        }
    })
    .await
    .expect("focus never set");

    // Removing the finding revalidates and drops the focus
    engine.ignore_word("teh").await.unwrap();
    wait_for(&mut rx, "finding removed", |s| s.findings.is_empty()).await;
    assert!(engine.focus_stream().borrow().is_none());

    // Focusing a span with no finding is a clean no-op
    engine.focus_word(1, 4).await.unwrap();
    wait_for(&mut rx, "settle", |s| s.findings.is_empty()).await;
    assert!(engine.focus_stream().borrow().is_none());
}

#[tokio::test(start_paused = true)]
async fn unrelated_blocks_are_not_reanalyzed() {
    let fake = FakeAnalyzer::new("teh");
    let calls = fake.calls.clone();
    let texts = fake.texts.clone();
    let doc = parse_markdown("Teh cat.\n\nteh dog.");
    let engine = Engine::start(EngineConfig::default(), vec![Arc::new(fake)], doc.clone()).unwrap();
    let mut rx = engine.subscribe();
    wait_for(&mut rx, "initial pass", |s| !s.is_loading).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Touch only the second paragraph
    let (doc2, mapping) = doc.insert_at(19, " still teh").unwrap();
    engine.document_changed(doc2.clone(), mapping).await.unwrap();
    let state = wait_for(&mut rx, "re-analysis", |s| s.findings.len() == 3).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(texts.lock().unwrap().last().map(String::as_str), Some("teh dog. still teh"));

    // First block's finding kept its text without a re-run
    assert_eq!(doc2.text_in(state.findings[0].range), Some("Teh"));
}
