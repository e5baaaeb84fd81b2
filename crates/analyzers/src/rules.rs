use crate::adapter::{AnalyzerAdapter, LatencyClass, RawFinding};
use crate::error::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use prose_protocol::{AnalyzerSource, Category, Severity};
use regex::{Captures, Regex};
use unicode_segmentation::UnicodeSegmentation;

const LONG_SENTENCE_WORDS: usize = 30;

struct RegexRule {
    id: &'static str,
    category: Category,
    severity: Severity,
    message: &'static str,
    pattern: Regex,
    /// Capture group to flag; 0 flags the whole match
    group: usize,
    suggest: Option<fn(&Captures) -> Vec<String>>,
}

static REGEX_RULES: Lazy<Vec<RegexRule>> = Lazy::new(|| {
    vec![
        RegexRule {
            id: "subject-verb-agreement",
            category: Category::Correctness,
            severity: Severity::Error,
            message: "The verb does not agree with its subject",
            pattern: Regex::new(r"(?i)\b(?:i|we|you|they)\s+(has)\b").unwrap(),
            group: 1,
            suggest: Some(|_| vec!["have".to_string()]),
        },
        RegexRule {
            id: "subject-verb-agreement",
            category: Category::Correctness,
            severity: Severity::Error,
            message: "The verb does not agree with its subject",
            pattern: Regex::new(r"(?i)\b(?:he|she|it)\s+(have)\b").unwrap(),
            group: 1,
            suggest: Some(|_| vec!["has".to_string()]),
        },
        RegexRule {
            id: "article-choice",
            category: Category::Correctness,
            severity: Severity::Warning,
            message: "Use \"an\" before a vowel sound",
            pattern: Regex::new(r"(?i)\b(a)\s+[aeiou][a-z]*\b").unwrap(),
            group: 1,
            suggest: Some(|_| vec!["an".to_string()]),
        },
        RegexRule {
            id: "confused-words",
            category: Category::Correctness,
            severity: Severity::Error,
            message: "\"of\" here should be \"have\"",
            pattern: Regex::new(r"(?i)\b(could|would|should|might|must)\s+of\b").unwrap(),
            group: 0,
            suggest: Some(|caps| vec![format!("{} have", &caps[1])]),
        },
        RegexRule {
            id: "confused-words",
            category: Category::Correctness,
            severity: Severity::Error,
            message: "\"alot\" is not a word",
            pattern: Regex::new(r"(?i)\balot\b").unwrap(),
            group: 0,
            suggest: Some(|_| vec!["a lot".to_string()]),
        },
        RegexRule {
            id: "double-space",
            category: Category::Correctness,
            severity: Severity::Info,
            message: "Multiple consecutive spaces",
            // Anchor on the preceding character so the flagged span is
            // never whitespace-only (those are discarded downstream)
            pattern: Regex::new(r"(\S)  +").unwrap(),
            group: 0,
            suggest: Some(|caps| vec![format!("{} ", &caps[1])]),
        },
        RegexRule {
            id: "passive-voice",
            category: Category::Clarity,
            severity: Severity::Info,
            message: "Consider rewriting in active voice",
            pattern: Regex::new(
                r"(?i)\b(?:is|are|was|were|been|being)\s+(?:\w+ly\s+)?(?:\w{2,}ed|\w+wn|\w+ven)\b",
            )
            .unwrap(),
            group: 0,
            suggest: None,
        },
    ]
});

/// Local rule-based grammar and style analyzer.
///
/// Pairs a fixed regex rule table with a couple of token-scan checks the
/// regex engine cannot express (repeated words need a backreference,
/// sentence length needs counting).
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleAnalyzer;

impl RuleAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn regex_findings(text: &str, findings: &mut Vec<RawFinding>) {
        for rule in REGEX_RULES.iter() {
            for caps in rule.pattern.captures_iter(text) {
                let Some(m) = caps.get(rule.group) else {
                    continue;
                };
                findings.push(RawFinding {
                    start: m.start(),
                    end: m.end(),
                    category: rule.category,
                    severity: rule.severity,
                    rule_id: rule.id.to_string(),
                    message: rule.message.to_string(),
                    suggestions: rule.suggest.map_or_else(Vec::new, |f| f(&caps)),
                });
            }
        }
    }

    fn repeated_word_findings(text: &str, findings: &mut Vec<RawFinding>) {
        let mut previous: Option<(usize, &str)> = None;
        for (offset, word) in text.unicode_word_indices() {
            if let Some((prev_offset, prev_word)) = previous {
                let gap = &text[prev_offset + prev_word.len()..offset];
                if gap.chars().all(char::is_whitespace)
                    && word.eq_ignore_ascii_case(prev_word)
                    && word.chars().all(char::is_alphabetic)
                {
                    findings.push(RawFinding {
                        start: prev_offset,
                        end: offset + word.len(),
                        category: Category::Clarity,
                        severity: Severity::Warning,
                        rule_id: "repeated-word".to_string(),
                        message: format!("\"{word}\" is repeated"),
                        suggestions: vec![prev_word.to_string()],
                    });
                }
            }
            previous = Some((offset, word));
        }
    }

    fn long_sentence_findings(text: &str, findings: &mut Vec<RawFinding>) {
        for (start, sentence) in sentences(text) {
            let words = sentence.unicode_words().count();
            if words > LONG_SENTENCE_WORDS {
                findings.push(RawFinding {
                    start,
                    end: start + sentence.len(),
                    category: Category::Clarity,
                    severity: Severity::Info,
                    rule_id: "readability".to_string(),
                    message: format!(
                        "Sentence is {words} words long; consider splitting it"
                    ),
                    suggestions: vec![],
                });
            }
        }
    }
}

/// Split into sentences on `.`/`?`/`!` runs, yielding trimmed slices with
/// their byte offsets.
fn sentences(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if matches!(bytes[i], b'.' | b'?' | b'!') {
            while i + 1 < bytes.len() && matches!(bytes[i + 1], b'.' | b'?' | b'!') {
                i += 1;
            }
            push_trimmed(text, start, i + 1, &mut out);
            start = i + 1;
        }
        i += 1;
    }
    push_trimmed(text, start, text.len(), &mut out);
    out
}

fn push_trimmed<'a>(text: &'a str, from: usize, to: usize, out: &mut Vec<(usize, &'a str)>) {
    let slice = &text[from..to];
    let trimmed = slice.trim_start();
    let offset = from + (slice.len() - trimmed.len());
    let trimmed = trimmed.trim_end();
    if !trimmed.is_empty() {
        out.push((offset, trimmed));
    }
}

#[async_trait]
impl AnalyzerAdapter for RuleAnalyzer {
    fn source(&self) -> AnalyzerSource {
        AnalyzerSource::Rules
    }

    fn latency_class(&self) -> LatencyClass {
        LatencyClass::Fast
    }

    async fn analyze(&self, text: &str) -> Result<Vec<RawFinding>> {
        let mut findings = Vec::new();
        Self::regex_findings(text, &mut findings);
        Self::repeated_word_findings(text, &mut findings);
        Self::long_sentence_findings(text, &mut findings);
        findings.sort_by_key(|f| (f.start, f.end));
        Ok(findings)
    }
}
