// Search Query Generator
//
// Claim → web search query of at most 100 characters.

use crate::oracles::content_fetcher::truncate_chars;
use crate::oracles::{response_parser, LlmOracle};
use crate::types::OracleError;
use regex::Regex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const MAX_QUERY_CHARS: usize = 100;

/// Words kept by the fallback
const MAX_FALLBACK_WORDS: usize = 6;
/// Words must be longer than this to be kept
const MIN_WORD_CHARS: usize = 3;
const MAX_QUALIFIERS: usize = 2;
const QUALIFIERS: [&str; 6] = ["health", "safety", "study", "research", "FDA", "CDC"];

const SYSTEM_PROMPT: &str = "You write web search queries for verifying claims. \
Extract the key searchable terms from the claim and add one or two domain-appropriate \
qualifier terms (for example health, safety or research terms). \
Do not include generic phrases such as \"fact check\", \"true or false\" or \"debunk\". \
Respond with the query text only, at most 100 characters.";

/// Deterministic query built from the claim's own words
pub fn fallback_query(claim: &str) -> String {
    let stripped: String = claim
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let mut terms: Vec<String> = stripped
        .split_whitespace()
        .filter(|word| word.chars().count() > MIN_WORD_CHARS)
        .take(MAX_FALLBACK_WORDS)
        .map(str::to_string)
        .collect();

    let qualifiers: Vec<String> = QUALIFIERS
        .iter()
        .filter(|q| !terms.iter().any(|t| t.eq_ignore_ascii_case(q)))
        .take(MAX_QUALIFIERS)
        .map(|q| q.to_string())
        .collect();
    terms.extend(qualifiers);

    truncate_chars(&terms.join(" "), MAX_QUERY_CHARS)
}

/// Generic fact-checking phrases that add nothing to a web search
fn generic_phrase_pattern() -> Result<Regex, regex::Error> {
    Regex::new(r"(?i)\bfact[\s-]?check\b")
}

/// Clean an LLM answer into a usable query; `None` when nothing usable is left
fn sanitize_query(raw: &str, generic_phrases: Option<&Regex>) -> Option<String> {
    let body = response_parser::strip_code_fences(raw);
    let first_line = body.lines().find(|line| !line.trim().is_empty())?;
    let unquoted = first_line
        .trim()
        .trim_start_matches("Query:")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`');

    let cleaned = match generic_phrases {
        Some(pattern) => pattern.replace_all(unquoted, " "),
        None => unquoted.into(),
    };

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(truncate_chars(&collapsed, MAX_QUERY_CHARS))
    }
}

pub struct QueryGenerator {
    llm: Arc<dyn LlmOracle>,
    generic_phrases: Option<Regex>,
}

impl QueryGenerator {
    pub fn new(llm: Arc<dyn LlmOracle>) -> Self {
        Self {
            llm,
            generic_phrases: generic_phrase_pattern().ok(),
        }
    }

    /// Search query for `claim`, never longer than [`MAX_QUERY_CHARS`]
    pub async fn generate_query(&self, claim: &str, cancel: &CancellationToken) -> String {
        let answer = self
            .llm
            .complete(SYSTEM_PROMPT, &format!("Claim: {}", claim.trim()), cancel)
            .await
            .and_then(|raw| {
                sanitize_query(&raw, self.generic_phrases.as_ref())
                    .ok_or_else(|| OracleError::Malformed("Empty query".to_string()))
            });

        match answer {
            Ok(query) => {
                debug!(query = %query, "Generated search query");
                query
            }
            Err(e) => {
                let query = fallback_query(claim);
                warn!(oracle = self.llm.name(), error = %e, query = %query, "Query generation failed, using fallback");
                query
            }
        }
    }
}
