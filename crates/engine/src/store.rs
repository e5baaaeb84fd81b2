use prose_document::{DocumentSnapshot, EditMapping};
use prose_protocol::{Category, DocRange, Finding};
use std::collections::HashSet;

/// The authoritative, deduplicated collection of current findings.
///
/// Owned exclusively by the engine loop; every mutation happens on the
/// loop, never concurrently. Category gating hides findings rather than
/// destroying them, so both presentation surfaces see the same filtered
/// view while badge counts stay honest.
#[derive(Debug, Default)]
pub(crate) struct FindingStore {
    findings: Vec<Finding>,
    ignored: HashSet<String>,
    disabled: HashSet<Category>,
}

impl FindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All findings, gated categories included
    pub fn all(&self) -> &[Finding] {
        &self.findings
    }

    /// Findings visible to the presentation surfaces: gated categories
    /// filtered out, order preserved
    pub fn visible(&self) -> Vec<Finding> {
        self.findings
            .iter()
            .filter(|f| !self.disabled.contains(&f.category))
            .cloned()
            .collect()
    }

    /// Ungated per-category totals, for UI badges
    pub fn counts(&self) -> (usize, usize) {
        let correctness = self
            .findings
            .iter()
            .filter(|f| f.category == Category::Correctness)
            .count();
        (correctness, self.findings.len() - correctness)
    }

    /// Findings whose range lies inside a block span
    pub fn findings_in(&self, block_range: DocRange) -> Vec<Finding> {
        self.findings
            .iter()
            .filter(|f| f.range.within(&block_range))
            .cloned()
            .collect()
    }

    /// Re-project every finding through an edit, dropping any whose range
    /// died or whose text no longer matches the document underneath it
    pub fn remap(&mut self, mapping: &EditMapping, snapshot: &DocumentSnapshot) {
        let before = self.findings.len();
        self.findings.retain_mut(|finding| {
            let Some(range) = mapping.map_range(finding.range) else {
                return false;
            };
            finding.range = range;
            snapshot.text_in(range) == Some(finding.text.as_str())
        });
        let dropped = before - self.findings.len();
        if dropped > 0 {
            log::debug!("remap dropped {dropped} finding(s)");
        }
    }

    /// Replace one source's contribution to one block: previous findings
    /// from that source inside the block span are removed, the new ones
    /// added, and the store re-normalized
    pub fn replace_block_source(
        &mut self,
        block_range: DocRange,
        source: prose_protocol::AnalyzerSource,
        new: Vec<Finding>,
    ) {
        self.findings
            .retain(|f| !(f.source == source && f.range.within(&block_range)));
        self.findings.extend(new);
        self.normalize();
    }

    /// Replace every source's contribution to one block at once, for
    /// cache hits where the entry already holds the merged union
    pub fn replace_block(&mut self, block_range: DocRange, new: Vec<Finding>) {
        self.findings.retain(|f| !f.range.within(&block_range));
        self.findings.extend(new);
        self.normalize();
    }

    /// Replace the entire store in one batch (initial full pass)
    pub fn replace_all(&mut self, findings: Vec<Finding>) {
        self.findings = findings;
        self.findings.retain(|f| !self.ignored.contains(&f.text.to_lowercase()));
        self.normalize();
    }

    /// Add a word to the ignore set and retroactively drop matching
    /// findings. Returns how many were removed; calling twice is a no-op
    /// the second time.
    pub fn ignore_word(&mut self, word: &str) -> usize {
        let lowered = word.trim().to_lowercase();
        if lowered.is_empty() {
            return 0;
        }
        self.ignored.insert(lowered.clone());
        let before = self.findings.len();
        self.findings.retain(|f| f.text.to_lowercase() != lowered);
        before - self.findings.len()
    }

    /// Whether flagged text is on the ignore list (case-insensitive)
    pub fn is_ignored(&self, text: &str) -> bool {
        self.ignored.contains(&text.to_lowercase())
    }

    /// Toggle a category gate; returns whether the category is now
    /// enabled
    pub fn toggle_category(&mut self, category: Category) -> bool {
        if self.disabled.remove(&category) {
            true
        } else {
            self.disabled.insert(category);
            false
        }
    }

    pub fn is_category_enabled(&self, category: Category) -> bool {
        !self.disabled.contains(&category)
    }

    pub fn clear(&mut self) {
        self.findings.clear();
    }

    /// Sort by position with higher-trust sources first at equal spans,
    /// then drop duplicates keeping the first occurrence
    fn normalize(&mut self) {
        self.findings
            .sort_by(|a, b| {
                (a.range.from, a.range.to, a.source).cmp(&(b.range.from, b.range.to, b.source))
            });
        self.findings
            .dedup_by(|b, a| a.range == b.range && a.text == b.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use prose_document::DocNode;
    use prose_protocol::{AnalyzerSource, Severity};

    fn finding(from: usize, to: usize, text: &str, source: AnalyzerSource) -> Finding {
        Finding {
            text: text.to_string(),
            range: DocRange::new(from, to),
            category: Category::Correctness,
            severity: Severity::Error,
            rule_id: "spelling".into(),
            message: String::new(),
            suggestions: vec![],
            source,
        }
    }

    #[test]
    fn test_replace_block_source_is_source_scoped() {
        let mut store = FindingStore::new();
        store.replace_all(vec![
            finding(2, 5, "teh", AnalyzerSource::Dictionary),
            finding(8, 12, "wrold", AnalyzerSource::Rules),
        ]);
        // New dictionary results for the block [0, 20) must not disturb
        // the rules finding.
        store.replace_block_source(
            DocRange::new(0, 20),
            AnalyzerSource::Dictionary,
            vec![finding(14, 17, "teh", AnalyzerSource::Dictionary)],
        );
        let texts: Vec<_> = store.all().iter().map(|f| f.range.from).collect();
        assert_eq!(texts, vec![8, 14]);
    }

    #[test]
    fn test_duplicates_keep_highest_trust_source() {
        let mut store = FindingStore::new();
        store.replace_all(vec![
            finding(2, 5, "teh", AnalyzerSource::Llm),
            finding(2, 5, "teh", AnalyzerSource::Dictionary),
        ]);
        assert_eq!(store.all().len(), 1);
        assert_eq!(store.all()[0].source, AnalyzerSource::Dictionary);
    }

    #[test]
    fn test_ignore_word_is_case_insensitive_and_idempotent() {
        let mut store = FindingStore::new();
        store.replace_all(vec![
            finding(2, 5, "Teh", AnalyzerSource::Dictionary),
            finding(8, 11, "TEH", AnalyzerSource::Dictionary),
            finding(14, 19, "wrold", AnalyzerSource::Dictionary),
        ]);
        assert_eq!(store.ignore_word("teh"), 2);
        assert_eq!(store.ignore_word("teh"), 0);
        assert_eq!(store.all().len(), 1);
        assert!(store.is_ignored("TeH"));
        // Future merges must also be filtered: replace_all applies the set
        store.replace_all(vec![finding(2, 5, "teh", AnalyzerSource::Dictionary)]);
        assert_eq!(store.all().len(), 0);
    }

    #[test]
    fn test_remap_drops_text_mismatches() {
        let snapshot = DocumentSnapshot::new(vec![DocNode::paragraph("Hello wrold today")]);
        let mut store = FindingStore::new();
        // "wrold" sits at [7, 12) in this snapshot's coordinates
        store.replace_all(vec![finding(7, 12, "wrold", AnalyzerSource::Dictionary)]);

        // Identity mapping, same snapshot: survives
        store.remap(&EditMapping::identity(), &snapshot);
        assert_eq!(store.all().len(), 1);

        // An edit inside the finding leaves a mapped range whose text no
        // longer matches; the finding must go.
        let (edited, mapping) = snapshot.insert_at(9, "xx").unwrap();
        store.remap(&mapping, &edited);
        assert_eq!(store.all(), &[]);
    }

    #[test]
    fn test_category_gating_hides_but_keeps_counts() {
        let mut store = FindingStore::new();
        let mut clarity = finding(2, 5, "very", AnalyzerSource::Rules);
        clarity.category = Category::Clarity;
        store.replace_all(vec![
            finding(8, 11, "teh", AnalyzerSource::Dictionary),
            clarity,
        ]);

        assert!(!store.toggle_category(Category::Clarity));
        assert_eq!(store.visible().len(), 1);
        assert_eq!(store.counts(), (1, 1));

        assert!(store.toggle_category(Category::Clarity));
        assert_eq!(store.visible().len(), 2);
    }
}
