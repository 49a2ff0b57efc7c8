//! LLM response parsing
//!
//! LLM answers are untrusted: they may wrap JSON in markdown fences, add prose
//! around it, or not be JSON at all. Parsing yields `Result<T, OracleError>`
//! and never panics; callers fall back on `Err`.

use crate::types::OracleError;
use serde::de::DeserializeOwned;

/// Remove a surrounding markdown code fence (```` ```json ... ``` ````), if any
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json", "JSON", ...) on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// The outermost `{ ... }` span, for answers that wrap JSON in prose
fn outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse an LLM answer as `T`
///
/// Strips code fences first; when that still fails, retries once on the
/// outermost JSON object in the text.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, OracleError> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(OracleError::Malformed("Empty response".to_string()));
    }

    match serde_json::from_str::<T>(cleaned) {
        Ok(value) => Ok(value),
        Err(first_error) => match outer_object(cleaned) {
            Some(object) if object != cleaned => serde_json::from_str::<T>(object)
                .map_err(|e| OracleError::Malformed(e.to_string())),
            _ => Err(OracleError::Malformed(first_error.to_string())),
        },
    }
}
