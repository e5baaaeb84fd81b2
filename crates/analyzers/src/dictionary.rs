use crate::adapter::{AnalyzerAdapter, LatencyClass, RawFinding};
use crate::error::{AnalyzerError, Result};
use async_trait::async_trait;
use prose_protocol::{AnalyzerSource, Category, Severity};
use std::collections::HashSet;
use std::path::Path;
use unicode_segmentation::UnicodeSegmentation;

const BUILTIN_WORDS: &str = include_str!("../assets/words.txt");
const DEFAULT_MAX_SUGGESTIONS: usize = 5;
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Wordlist-backed spell checker.
///
/// Flags alphabetic words absent from the dictionary and offers
/// single-edit corrections drawn from the dictionary itself. Lookup is
/// case-insensitive; suggestion casing follows the flagged word.
#[derive(Debug)]
pub struct DictionaryAnalyzer {
    words: HashSet<String>,
    max_suggestions: usize,
}

impl DictionaryAnalyzer {
    /// Build from an explicit word set (lowercased on insert)
    pub fn with_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }

    /// Build from the compiled-in wordlist
    #[must_use]
    pub fn builtin() -> Self {
        Self::with_words(BUILTIN_WORDS.lines())
    }

    /// Load a newline-separated wordlist from disk.
    ///
    /// A failure here makes spell checking unavailable and is the one
    /// analyzer error surfaced to the user.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AnalyzerError::dictionary_load(format!("{}: {e}", path.display()))
        })?;
        let analyzer = Self::with_words(content.lines());
        if analyzer.words.is_empty() {
            return Err(AnalyzerError::dictionary_load(format!(
                "{}: wordlist is empty",
                path.display()
            )));
        }
        Ok(analyzer)
    }

    /// Override the suggestion cap
    #[must_use]
    pub const fn max_suggestions(mut self, limit: usize) -> Self {
        self.max_suggestions = limit;
        self
    }

    /// Whether a word is known, ignoring case
    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    /// Dictionary words within one edit of `word`, best-effort ordered,
    /// capped at the configured limit.
    fn suggestions_for(&self, word: &str) -> Vec<String> {
        let lower = word.to_lowercase();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for candidate in single_edits(&lower) {
            if out.len() >= self.max_suggestions {
                break;
            }
            if self.words.contains(&candidate) && seen.insert(candidate.clone()) {
                out.push(match_case(&candidate, word));
            }
        }
        out
    }
}

#[async_trait]
impl AnalyzerAdapter for DictionaryAnalyzer {
    fn source(&self) -> AnalyzerSource {
        AnalyzerSource::Dictionary
    }

    fn latency_class(&self) -> LatencyClass {
        LatencyClass::Fast
    }

    async fn analyze(&self, text: &str) -> Result<Vec<RawFinding>> {
        let mut findings = Vec::new();
        for (offset, word) in text.unicode_word_indices() {
            if !word.chars().all(char::is_alphabetic) || word.chars().count() < 2 {
                continue;
            }
            if self.contains(word) {
                continue;
            }
            findings.push(RawFinding {
                start: offset,
                end: offset + word.len(),
                category: Category::Correctness,
                severity: Severity::Error,
                rule_id: "spelling".to_string(),
                message: format!("\"{word}\" is not in the dictionary"),
                suggestions: self.suggestions_for(word),
            });
        }
        Ok(findings)
    }
}

/// All candidates within one edit (deletion, transposition, replacement,
/// insertion) of an ASCII-lowercase word. Non-ASCII words get only
/// deletions and transpositions.
fn single_edits(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut out = Vec::new();

    // Transpositions first: they fix the most common typo class
    for i in 0..chars.len().saturating_sub(1) {
        let mut candidate = chars.clone();
        candidate.swap(i, i + 1);
        out.push(candidate.into_iter().collect());
    }
    // Deletions
    for i in 0..chars.len() {
        let mut candidate = chars.clone();
        candidate.remove(i);
        out.push(candidate.into_iter().collect());
    }
    // Replacements
    for i in 0..chars.len() {
        for &b in ALPHABET {
            if chars[i] == b as char {
                continue;
            }
            let mut candidate = chars.clone();
            candidate[i] = b as char;
            out.push(candidate.into_iter().collect());
        }
    }
    // Insertions
    for i in 0..=chars.len() {
        for &b in ALPHABET {
            let mut candidate = chars.clone();
            candidate.insert(i, b as char);
            out.push(candidate.into_iter().collect());
        }
    }
    out
}

/// Carry the original word's leading capitalization onto a suggestion
fn match_case(suggestion: &str, original: &str) -> String {
    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = suggestion.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    } else {
        suggestion.to_string()
    }
}
