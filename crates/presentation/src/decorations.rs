use prose_protocol::{assign_keys, Category, DocRange, Finding, FindingKey, Severity};
use serde::Serialize;

/// One inline underline over a document span. The editor surface maps
/// these onto whatever mark/decoration primitive it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoration {
    pub range: DocRange,
    pub key: FindingKey,
    pub category: Category,
    pub severity: Severity,
    pub focused: bool,
}

impl Decoration {
    /// Style hook, one distinct treatment per category plus a focus
    /// modifier
    #[must_use]
    pub fn style_class(&self) -> String {
        let base = match self.category {
            Category::Correctness => "prose-underline-correctness",
            Category::Clarity => "prose-underline-clarity",
        };
        if self.focused {
            format!("{base} prose-underline-focused")
        } else {
            base.to_string()
        }
    }
}

/// Build the inline decoration set for the current visible findings.
///
/// Findings whose range does not fit the document are skipped rather
/// than allowed to break the render; at most one decoration is focused.
#[must_use]
pub fn build_decorations(
    doc_len: usize,
    findings: &[Finding],
    focus: Option<&FindingKey>,
) -> Vec<Decoration> {
    let keys = assign_keys(findings);
    let mut out = Vec::with_capacity(findings.len());
    for (finding, key) in findings.iter().zip(keys) {
        if !finding.is_valid_for(doc_len) {
            log::debug!(
                "skipping decoration with invalid range {}..{} (doc len {doc_len})",
                finding.range.from,
                finding.range.to
            );
            continue;
        }
        let focused = focus == Some(&key);
        out.push(Decoration {
            range: finding.range,
            key,
            category: finding.category,
            severity: finding.severity,
            focused,
        });
    }
    out
}
