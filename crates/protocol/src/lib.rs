use serde::{Deserialize, Serialize};

/// A half-open range `[from, to)` in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocRange {
    pub from: usize,
    pub to: usize,
}

impl DocRange {
    /// Create a new range
    #[must_use]
    pub const fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    /// Length of the range in document positions
    #[must_use]
    pub const fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    /// Whether the range is empty or inverted
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.to <= self.from
    }

    /// A range is valid when `0 <= from < to <= doc_len`
    #[must_use]
    pub const fn is_valid_for(&self, doc_len: usize) -> bool {
        self.from < self.to && self.to <= doc_len
    }

    /// Whether this range contains a position
    #[must_use]
    pub const fn contains(&self, pos: usize) -> bool {
        pos >= self.from && pos < self.to
    }

    /// Whether this range touches another, boundaries included. An
    /// empty range sitting exactly on another's edge still touches it.
    #[must_use]
    pub const fn touches(&self, other: &Self) -> bool {
        self.from <= other.to && other.from <= self.to
    }

    /// Whether this range lies fully inside another
    #[must_use]
    pub const fn within(&self, other: &Self) -> bool {
        self.from >= other.from && self.to <= other.to
    }
}

/// High-level grouping of findings presented to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Spelling, grammar, punctuation, capitalization, confused words
    Correctness,
    /// Style, redundancy, passive voice, readability
    Clarity,
}

impl Category {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Correctness => "correctness",
            Self::Clarity => "clarity",
        }
    }
}

/// How strongly a finding should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// Which analyzer backend produced a finding.
///
/// Listed in trust order: when two sources report the same span, the
/// earlier variant wins deduplication (merges list higher-trust sources
/// first).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerSource {
    /// Wordlist spell checker
    Dictionary,
    /// Local rule engine (grammar/style heuristics)
    Rules,
    /// Remote LLM-backed grammar analyzer
    Llm,
}

impl AnalyzerSource {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dictionary => "dictionary",
            Self::Rules => "rules",
            Self::Llm => "llm",
        }
    }
}

/// One reported writing issue, located in document coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Exact source substring flagged
    pub text: String,

    /// Location in current document coordinates
    pub range: DocRange,

    pub category: Category,
    pub severity: Severity,

    /// Short label of the rule/class of issue (stable for grouping)
    pub rule_id: String,

    /// Human-readable explanation
    pub message: String,

    /// Candidate replacements, best first (possibly empty)
    pub suggestions: Vec<String>,

    /// Which adapter produced this finding
    pub source: AnalyzerSource,
}

impl Finding {
    /// Whether the finding's range is still valid against a document length
    #[must_use]
    pub const fn is_valid_for(&self, doc_len: usize) -> bool {
        self.range.is_valid_for(doc_len)
    }

    /// Derive the stable key identifying this finding at a given ordinal
    /// position within the current finding list.
    #[must_use]
    pub fn key(&self, ordinal: usize) -> FindingKey {
        FindingKey {
            text: self.text.clone(),
            from: self.range.from,
            rule_id: self.rule_id.clone(),
            ordinal,
        }
    }
}

/// Stable identity of a finding, shared by the inline decorations and the
/// panel so both surfaces agree on what is focused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FindingKey {
    pub text: String,
    pub from: usize,
    pub rule_id: String,
    pub ordinal: usize,
}

/// Findings partitioned by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedFindings {
    pub correctness: Vec<Finding>,
    pub clarity: Vec<Finding>,
}

impl CategorizedFindings {
    /// Total finding count across categories
    #[must_use]
    pub fn len(&self) -> usize {
        self.correctness.len() + self.clarity.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.correctness.is_empty() && self.clarity.is_empty()
    }
}

/// Partition findings by category. Pure; preserves input order within each
/// partition.
#[must_use]
pub fn categorize(findings: &[Finding]) -> CategorizedFindings {
    let mut out = CategorizedFindings::default();
    for finding in findings {
        match finding.category {
            Category::Correctness => out.correctness.push(finding.clone()),
            Category::Clarity => out.clarity.push(finding.clone()),
        }
    }
    out
}

/// Assign every finding its derived key. Ordinals disambiguate findings
/// sharing `(text, from, rule_id)`: rare, but possible when two adapters
/// flag the same word for the same rule at different spans that later map
/// onto each other.
#[must_use]
pub fn assign_keys(findings: &[Finding]) -> Vec<FindingKey> {
    let mut counts: std::collections::HashMap<(&str, usize, &str), usize> =
        std::collections::HashMap::new();
    findings
        .iter()
        .map(|finding| {
            let slot = counts
                .entry((
                    finding.text.as_str(),
                    finding.range.from,
                    finding.rule_id.as_str(),
                ))
                .or_insert(0);
            let ordinal = *slot;
            *slot += 1;
            finding.key(ordinal)
        })
        .collect()
}

/// Find the index of the finding a key refers to, if it still exists.
/// Keys for findings that have since disappeared resolve to `None`,
/// never an error.
#[must_use]
pub fn resolve_key(findings: &[Finding], key: &FindingKey) -> Option<usize> {
    assign_keys(findings).iter().position(|k| k == key)
}

/// Drop duplicate findings, keeping the first occurrence.
///
/// Two findings are duplicates when `(range.from, range.to, text)` are
/// identical; callers that care about trust ordering should list
/// higher-trust sources first.
#[must_use]
pub fn dedupe_findings(findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(findings.len());
    for finding in findings {
        let key = (finding.range.from, finding.range.to, finding.text.clone());
        if seen.insert(key) {
            out.push(finding);
        }
    }
    out
}
