use crate::merge::translate_raw;
use prose_analyzers::AnalyzerAdapter;
use prose_document::{segment, DocumentSnapshot, BLOCK_OPEN_OFFSET};
use prose_protocol::{dedupe_findings, Finding};
use std::sync::Arc;

/// Analyze a whole document once, outside the incremental loop.
///
/// Runs every adapter over every analyzable block sequentially and
/// returns the merged findings in position order. This is the batch
/// entry point; per-call analyzer failures are logged and skipped.
pub async fn analyze_document(
    snapshot: &DocumentSnapshot,
    adapters: &[Arc<dyn AnalyzerAdapter>],
) -> Vec<Finding> {
    let doc_len = snapshot.len();
    let mut collected = Vec::new();
    for block in segment(snapshot) {
        let text_from = block.range.from + BLOCK_OPEN_OFFSET;
        for adapter in adapters {
            match adapter.analyze(&block.text).await {
                Ok(raw) => collected.extend(translate_raw(
                    &block.text,
                    text_from,
                    doc_len,
                    adapter.source(),
                    raw,
                )),
                Err(e) => {
                    log::warn!("{} analyzer failed: {e}", adapter.source().as_str());
                }
            }
        }
    }
    collected.sort_by(|a, b| {
        (a.range.from, a.range.to, a.source).cmp(&(b.range.from, b.range.to, b.source))
    });
    dedupe_findings(collected)
}
