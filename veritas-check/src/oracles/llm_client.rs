//! LLM client
//!
//! Chat-completions client for any OpenAI-compatible endpoint, with a
//! `governor` rate limiter and an explicit per-call timeout.
//!
//! A client without an API key is still constructible; every call then fails
//! fast with `OracleError::Unavailable` and callers use their fallbacks.

use crate::oracles::{with_deadline, LlmOracle};
use crate::types::OracleError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use veritas_common::config::LlmConfig;

/// Sampling temperature for every prompt; answers should be near-deterministic JSON
const TEMPERATURE: f32 = 0.1;

type DirectRateLimiter = governor::RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct LlmClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    rate_limiter: DirectRateLimiter,
}

impl LlmClient {
    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Result<Self, OracleError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| OracleError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = governor::RateLimiter::direct(governor::Quota::per_second(per_second));

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            rate_limiter,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send(&self, api_key: &str, system_prompt: &str, user_prompt: &str) -> Result<String, OracleError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: TEMPERATURE,
        };

        debug!(url = %url, model = %self.model, "Sending LLM request");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(OracleError::Unavailable(format!(
                "LLM API error {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| OracleError::Malformed("LLM response has no content".to_string()))
    }
}

#[async_trait]
impl LlmOracle for LlmClient {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, OracleError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(OracleError::Unavailable("No LLM API key configured".to_string()));
        };

        with_deadline(self.timeout, cancel, self.send(api_key, system_prompt, user_prompt)).await
    }
}
