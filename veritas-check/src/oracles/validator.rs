//! Modality validator client
//!
//! One HTTP validator per modality. Input `{sourceRef, claim}`, output
//! `{isValid, confidence, ...forensics}`. Confidence may come back on either
//! a 0..1 or 0..100 scale; the evidence adapter normalizes it.

use crate::oracles::{with_deadline, ValidatorOracle};
use crate::types::{Forensics, Modality, OracleError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Validator request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub source_ref: String,
    pub claim: String,
}

/// Validator response in its native shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorOutput {
    pub is_valid: bool,
    pub confidence: f64,
    #[serde(flatten)]
    pub forensics: Forensics,
    #[serde(default, alias = "analysis", alias = "description")]
    pub summary: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

pub struct HttpValidator {
    modality: Modality,
    endpoint: String,
    http_client: reqwest::Client,
    timeout: Duration,
}

impl HttpValidator {
    pub fn new(modality: Modality, endpoint: impl Into<String>, timeout: Duration) -> Result<Self, OracleError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| OracleError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            modality,
            endpoint: endpoint.into(),
            http_client,
            timeout,
        })
    }

    async fn post(&self, request: &ValidationRequest) -> Result<ValidatorOutput, OracleError> {
        debug!(modality = %self.modality, endpoint = %self.endpoint, source_ref = %request.source_ref, "Calling validator");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Unavailable(format!(
                "{} validator returned HTTP {}",
                self.modality,
                status.as_u16()
            )));
        }

        response
            .json::<ValidatorOutput>()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ValidatorOracle for HttpValidator {
    fn modality(&self) -> Modality {
        self.modality
    }

    async fn validate(
        &self,
        request: &ValidationRequest,
        cancel: &CancellationToken,
    ) -> Result<ValidatorOutput, OracleError> {
        with_deadline(self.timeout, cancel, self.post(request)).await
    }
}
