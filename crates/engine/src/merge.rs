use prose_analyzers::RawFinding;
use prose_protocol::{AnalyzerSource, DocRange, Finding};

/// Translate one adapter's raw results for a block into document-coordinate
/// findings, discarding anything malformed.
///
/// `text_from` is the document position of the block text's first byte
/// (block start plus the structural open-boundary offset). Dropped here,
/// silently: findings whose offsets don't address the analyzed text,
/// whose flagged substring is empty/whitespace, or whose translated range
/// falls outside the document.
pub(crate) fn translate_raw(
    block_text: &str,
    text_from: usize,
    doc_len: usize,
    source: AnalyzerSource,
    raw: Vec<RawFinding>,
) -> Vec<Finding> {
    let mut out = Vec::with_capacity(raw.len());
    for finding in raw {
        if !finding.locates_in(block_text) {
            log::debug!(
                "{source} finding has bad offsets {}..{} for block of {} bytes",
                finding.start,
                finding.end,
                block_text.len(),
                source = source.as_str(),
            );
            continue;
        }
        let text = &block_text[finding.start..finding.end];
        if text.trim().is_empty() {
            continue;
        }
        let range = DocRange::new(text_from + finding.start, text_from + finding.end);
        if !range.is_valid_for(doc_len) {
            continue;
        }
        out.push(Finding {
            text: text.to_string(),
            range,
            category: finding.category,
            severity: finding.severity,
            rule_id: finding.rule_id,
            message: finding.message,
            suggestions: finding.suggestions,
            source,
        });
    }
    out
}
