use crate::adapter::{AnalyzerAdapter, LatencyClass, RawFinding};
use crate::error::{AnalyzerError, Result};
use crate::taxonomy::classify;
use async_trait::async_trait;
use prose_protocol::AnalyzerSource;
use serde::Deserialize;

const DEFAULT_MAX_SUGGESTIONS: usize = 5;

const PROMPT_HEADER: &str = "You are a grammar and style checker for API documentation prose.\n\
Report every issue in the text below as a JSON array, no prose around it.\n\
Each element: {\"text\": exact flagged substring, \"rule\": short rule label,\n\
\"message\": one-sentence explanation, \"suggestions\": replacement strings}.\n\
Return [] when the text is clean.\n\nText:\n";

/// Transport seam for the LLM-backed analyzer: one prompt in, the raw
/// model output out. Tests inject a canned implementation; production
/// hosts wrap their HTTP client of choice.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Issue shape the model is asked to produce
#[derive(Debug, Deserialize)]
struct LlmIssue {
    text: String,
    #[serde(default)]
    rule: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    suggestions: Vec<String>,
}

/// Remote grammar analyzer backed by a chat model.
///
/// The model reports flagged substrings rather than offsets; offsets are
/// recovered by searching the block text, walking forward so repeated
/// substrings land on distinct occurrences. Responses that fail to parse
/// degrade to an error the scheduler logs and treats as zero findings.
pub struct LlmAnalyzer<C> {
    client: C,
    max_suggestions: usize,
}

impl<C: ChatClient> LlmAnalyzer<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }

    /// Override the suggestion cap
    #[must_use]
    pub fn max_suggestions(mut self, limit: usize) -> Self {
        self.max_suggestions = limit;
        self
    }

    fn parse_response(&self, text: &str, response: &str) -> Result<Vec<RawFinding>> {
        let body = strip_code_fence(response.trim());
        let issues: Vec<LlmIssue> = serde_json::from_str(body)
            .map_err(|e| AnalyzerError::malformed(format!("bad JSON from model: {e}")))?;

        let mut findings = Vec::with_capacity(issues.len());
        let mut search_from = 0;
        for issue in issues {
            if issue.text.trim().is_empty() {
                continue;
            }
            // Walk forward first so duplicate substrings map to successive
            // occurrences; fall back to a full scan for out-of-order output.
            let found = find_from(text, &issue.text, search_from)
                .or_else(|| find_from(text, &issue.text, 0));
            let Some(start) = found else {
                log::debug!("model flagged {:?}, not present in block", issue.text);
                continue;
            };
            search_from = start + issue.text.len();

            let (category, severity) = classify(&issue.rule, &issue.message);
            let mut suggestions = issue.suggestions;
            suggestions.truncate(self.max_suggestions);
            findings.push(RawFinding {
                start,
                end: start + issue.text.len(),
                category,
                severity,
                rule_id: if issue.rule.is_empty() {
                    "grammar".to_string()
                } else {
                    issue.rule
                },
                message: issue.message,
                suggestions,
            });
        }
        Ok(findings)
    }
}

#[async_trait]
impl<C: ChatClient> AnalyzerAdapter for LlmAnalyzer<C> {
    fn source(&self) -> AnalyzerSource {
        AnalyzerSource::Llm
    }

    fn latency_class(&self) -> LatencyClass {
        LatencyClass::Heavy
    }

    async fn analyze(&self, text: &str) -> Result<Vec<RawFinding>> {
        let prompt = format!("{PROMPT_HEADER}{text}");
        let response = self.client.complete(&prompt).await?;
        self.parse_response(text, &response)
    }
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack.get(from..)?.find(needle).map(|i| from + i)
}

/// Models love to wrap JSON in a markdown fence despite instructions
fn strip_code_fence(body: &str) -> &str {
    let Some(rest) = body.strip_prefix("```") else {
        return body;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches('\n')
        .strip_suffix("```")
        .map_or(body, str::trim_end)
}
