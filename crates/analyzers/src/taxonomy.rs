use prose_protocol::{Category, Severity};

/// Keywords whose presence in a rule label or message marks a finding as
/// a correctness issue
const CORRECTNESS_KEYWORDS: &[&str] = &[
    "spell", "grammar", "grammat", "punctuat", "capital", "agreement",
    "tense", "confus", "typo", "apostrophe", "plural", "article",
];

/// Keywords marking clarity/style issues
const CLARITY_KEYWORDS: &[&str] = &[
    "passiv", "redundan", "wordy", "style", "readab", "clich", "concis",
    "vague", "repetit", "filler", "verbose",
];

const ERROR_KEYWORDS: &[&str] = &["spell", "typo", "agreement", "grammar"];
const INFO_KEYWORDS: &[&str] = &["style", "readab", "passiv", "concis", "filler"];

/// Map an adapter-native rule label and message onto the shared
/// category/severity vocabulary.
///
/// This is a heuristic fallback for backends whose taxonomy doesn't map
/// cleanly (notably the LLM adapter, which invents rule names freely);
/// when nothing matches we default to correctness, the safer bucket for
/// a grammar checker.
#[must_use]
pub fn classify(rule_id: &str, message: &str) -> (Category, Severity) {
    let haystack = format!("{} {}", rule_id.to_lowercase(), message.to_lowercase());

    // Correctness keywords take precedence, and no match at all also
    // lands in correctness, the safer default.
    let category = if contains_any(&haystack, CLARITY_KEYWORDS)
        && !contains_any(&haystack, CORRECTNESS_KEYWORDS)
    {
        Category::Clarity
    } else {
        Category::Correctness
    };

    let severity = if contains_any(&haystack, ERROR_KEYWORDS) {
        Severity::Error
    } else if contains_any(&haystack, INFO_KEYWORDS) {
        Severity::Info
    } else {
        Severity::Warning
    };

    (category, severity)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
