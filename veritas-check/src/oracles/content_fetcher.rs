//! Source content fetcher
//!
//! Downloads a source page and reduces it to readable text. The fetch runs
//! under a child cancellation token that a timer cancels after the configured
//! timeout (10 s by default); the parent request token cancels it too.

use crate::oracles::ContentFetcher;
use crate::types::OracleError;
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use veritas_common::config::FetchConfig;

const USER_AGENT: &str = concat!("veritas-check/", env!("CARGO_PKG_VERSION"));

/// HTML → plain text reducer
pub struct HtmlText {
    script_or_style: Regex,
    tag: Regex,
    whitespace: Regex,
}

impl HtmlText {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            script_or_style: Regex::new(r"(?is)<(script|style|noscript)\b[^>]*>.*?</(script|style|noscript)\s*>")?,
            tag: Regex::new(r"(?s)<[^>]*>")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Strip script/style blocks and markup, decode common entities, collapse
    /// whitespace and truncate to `max_chars` characters.
    pub fn extract(&self, html: &str, max_chars: usize) -> String {
        let without_blocks = self.script_or_style.replace_all(html, " ");
        let without_tags = self.tag.replace_all(&without_blocks, " ");
        let decoded = decode_entities(&without_tags);
        let collapsed = self.whitespace.replace_all(&decoded, " ");
        truncate_chars(collapsed.trim(), max_chars)
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// First `max_chars` characters of `text`, on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// Append as much of `chunk` as fits under `limit` bytes. Returns true once
/// the buffer is full.
fn append_capped(buf: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
    let room = limit.saturating_sub(buf.len());
    buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
    buf.len() >= limit
}

pub struct HttpContentFetcher {
    http_client: reqwest::Client,
    timeout: Duration,
    max_chars: usize,
    max_body_bytes: usize,
    html: HtmlText,
}

impl HttpContentFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, OracleError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| OracleError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;
        let html = HtmlText::new().map_err(|e| OracleError::Unavailable(e.to_string()))?;

        Ok(Self {
            http_client,
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            max_chars: config.max_chars,
            max_body_bytes: config.max_body_bytes.max(1),
            html,
        })
    }

    async fn download(&self, url: &str) -> Result<String, OracleError> {
        let mut response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Unavailable(format!("HTTP {} from {}", status.as_u16(), url)));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?
        {
            if append_capped(&mut body, &chunk, self.max_body_bytes) {
                debug!(url = %url, bytes = body.len(), "Response body truncated");
                break;
            }
        }

        // A cut may split a multi-byte character; lossy decoding keeps the rest
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch_text(&self, url: &str, cancel: &CancellationToken) -> Result<String, OracleError> {
        let deadline = cancel.child_token();
        let timer = {
            let deadline = deadline.clone();
            let timeout = self.timeout;
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                deadline.cancel();
            })
        };

        let result = tokio::select! {
            _ = deadline.cancelled() => {
                if cancel.is_cancelled() {
                    Err(OracleError::Cancelled)
                } else {
                    Err(OracleError::Timeout(self.timeout))
                }
            }
            body = self.download(url) => body,
        };
        timer.abort();

        let text = self.html.extract(&result?, self.max_chars);
        debug!(url = %url, chars = text.chars().count(), "Fetched source content");

        if text.is_empty() {
            return Err(OracleError::Malformed(format!("No readable text at {}", url)));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_strips_scripts_and_markup() {
        let html = r#"<html><head><style>body { color: red; }</style>
            <script type="text/javascript">var x = "<p>not text</p>";</script></head>
            <body><h1>Water &amp; COVID</h1>
            <p>Drinking   water does
            not cure COVID-19.</p></body></html>"#;
        let text = HtmlText::new().unwrap().extract(html, 3000);
        assert_eq!(text, "Water & COVID Drinking water does not cure COVID-19.");
    }

    #[test]
    fn test_extract_truncates_on_char_boundary() {
        let text = HtmlText::new().unwrap().extract("<p>héllo wörld</p>", 4);
        assert_eq!(text, "héll");
    }

    #[test]
    fn test_truncate_chars_short_input() {
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_append_capped_stops_at_limit() {
        let mut body = Vec::new();
        assert!(!append_capped(&mut body, b"<p>water", 12));
        assert!(append_capped(&mut body, b" cures nothing</p>", 12));
        assert_eq!(body, b"<p>water cur");

        assert!(append_capped(&mut body, b"more", 12));
        assert_eq!(body.len(), 12);
    }

    #[test]
    fn test_capped_body_split_inside_character_still_decodes() {
        let mut body = Vec::new();
        append_capped(&mut body, "wörld".as_bytes(), 2);
        let text = String::from_utf8_lossy(&body);
        assert!(text.starts_with('w'));
        assert_eq!(text.chars().count(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_request_is_reported() {
        let fetcher = HttpContentFetcher::new(&FetchConfig::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = fetcher.fetch_text("http://127.0.0.1:9/never", &cancel).await;
        assert!(result.is_err());
    }
}
