use prose_protocol::{assign_keys, Category, Finding, FindingKey, Severity};
use serde::Serialize;

const DEFAULT_SUGGESTION_CAP: usize = 5;

/// One expandable row in the findings panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelItem {
    pub key: FindingKey,
    /// Flagged text, shown as the row label
    pub text: String,
    pub message: String,
    pub rule_id: String,
    pub severity: Severity,
    /// Suggestion chips, best first, capped
    pub suggestions: Vec<String>,
    /// Expanded rows show message, chips, the free-text replacement
    /// input and the Replace/Ignore actions
    pub expanded: bool,
}

/// Category-tabbed list view over the current visible findings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PanelView {
    pub correctness: Vec<PanelItem>,
    pub clarity: Vec<PanelItem>,
}

impl PanelView {
    /// Build the panel from the engine's visible findings. The focused
    /// finding's row comes back expanded; everything else collapsed.
    #[must_use]
    pub fn build(findings: &[Finding], focus: Option<&FindingKey>) -> Self {
        Self::build_with_cap(findings, focus, DEFAULT_SUGGESTION_CAP)
    }

    /// Same as [`PanelView::build`] with an explicit suggestion cap
    #[must_use]
    pub fn build_with_cap(
        findings: &[Finding],
        focus: Option<&FindingKey>,
        suggestion_cap: usize,
    ) -> Self {
        let keys = assign_keys(findings);
        let items: Vec<PanelItem> = findings
            .iter()
            .zip(keys)
            .map(|(finding, key)| {
                let expanded = focus == Some(&key);
                PanelItem {
                    key,
                    text: finding.text.clone(),
                    message: finding.message.clone(),
                    rule_id: finding.rule_id.clone(),
                    severity: finding.severity,
                    suggestions: finding
                        .suggestions
                        .iter()
                        .take(suggestion_cap)
                        .cloned()
                        .collect(),
                    expanded,
                }
            })
            .collect();

        // Partition mirrors the protocol's category split so both
        // surfaces agree row-for-row with categorize()
        let correctness_len = findings
            .iter()
            .filter(|f| f.category == Category::Correctness)
            .count();
        let mut correctness = Vec::with_capacity(correctness_len);
        let mut clarity = Vec::with_capacity(items.len() - correctness_len);
        for (item, finding) in items.into_iter().zip(findings) {
            match finding.category {
                Category::Correctness => correctness.push(item),
                Category::Clarity => clarity.push(item),
            }
        }
        Self {
            correctness,
            clarity,
        }
    }

    /// Total rows across both tabs
    #[must_use]
    pub fn len(&self) -> usize {
        self.correctness.len() + self.clarity.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.correctness.is_empty() && self.clarity.is_empty()
    }

    /// The expanded item, if any
    #[must_use]
    pub fn expanded(&self) -> Option<&PanelItem> {
        self.correctness
            .iter()
            .chain(&self.clarity)
            .find(|item| item.expanded)
    }
}
