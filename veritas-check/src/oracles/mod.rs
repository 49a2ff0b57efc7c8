//! External Oracles
//!
//! Every collaborator outside this process sits behind a trait so the claim
//! finalizer, analyzer and pipeline can run against HTTP implementations in
//! production and mocks in tests:
//!
//! - **LlmOracle:** chat-completion style text generation
//! - **ValidatorOracle:** per-modality validation service
//! - **ContentFetcher:** source URL → plain text
//! - **SourceSearch:** query → candidate sources
//!
//! All oracle calls return `Result<_, OracleError>`. Callers recover with
//! their own fallback values; nothing here panics or retries.

pub mod content_fetcher;
pub mod llm_client;
pub mod response_parser;
pub mod search;
pub mod validator;

pub use content_fetcher::HttpContentFetcher;
pub use llm_client::LlmClient;
pub use search::{HttpSourceSearch, UnconfiguredSearch};
pub use validator::{HttpValidator, ValidationRequest, ValidatorOutput};

use crate::types::{Modality, OracleError, SourceRef};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Text-generation oracle
#[async_trait]
pub trait LlmOracle: Send + Sync {
    /// Oracle name for logging
    fn name(&self) -> &'static str;

    /// Complete a prompt, returning the raw assistant text
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, OracleError>;
}

/// Per-modality validator oracle
#[async_trait]
pub trait ValidatorOracle: Send + Sync {
    fn modality(&self) -> Modality;

    async fn validate(
        &self,
        request: &ValidationRequest,
        cancel: &CancellationToken,
    ) -> Result<ValidatorOutput, OracleError>;
}

/// Source content fetcher
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch `url` and return its readable text
    async fn fetch_text(&self, url: &str, cancel: &CancellationToken) -> Result<String, OracleError>;
}

/// Source search collaborator
#[async_trait]
pub trait SourceSearch: Send + Sync {
    async fn search(&self, query: &str, cancel: &CancellationToken) -> Result<Vec<SourceRef>, OracleError>;
}

/// Run an oracle future under a deadline and the request's cancellation token
///
/// Cancellation wins over the deadline when both fire.
pub async fn with_deadline<T, F>(
    timeout: Duration,
    cancel: &CancellationToken,
    future: F,
) -> Result<T, OracleError>
where
    F: Future<Output = Result<T, OracleError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(OracleError::Cancelled),
        result = tokio::time::timeout(timeout, future) => {
            result.unwrap_or_else(|_| Err(OracleError::Timeout(timeout)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_deadline_passes_result_through() {
        let cancel = CancellationToken::new();
        let result = with_deadline(Duration::from_secs(1), &cancel, async { Ok::<_, OracleError>(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_with_deadline_times_out() {
        let cancel = CancellationToken::new();
        let result: Result<(), OracleError> = with_deadline(Duration::from_millis(10), &cancel, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(OracleError::Timeout(Duration::from_millis(10))));
    }

    #[tokio::test]
    async fn test_with_deadline_observes_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<(), OracleError> =
            with_deadline(Duration::from_secs(5), &cancel, async { Ok(()) }).await;
        assert_eq!(result, Err(OracleError::Cancelled));
    }
}
