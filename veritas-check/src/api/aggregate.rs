//! Aggregation API handlers
//!
//! POST /aggregate, POST /aggregate/breakdown, POST /aggregate/sources,
//! POST /validate

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::aggregation::{self, adapters, BreakdownVerdict};
use crate::error::{ApiError, ApiResult};
use crate::oracles::ValidatorOutput;
use crate::pipeline::{AnalyzedSource, ModalityRef};
use crate::types::{AggregateResult, ConfidenceTier, EvidenceItem, Modality, ModalityBreakdown};
use crate::AppState;

/// Validator output as reported by a caller, tagged with its modality
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorEvidence {
    pub modality: Modality,
    pub source_ref: String,
    #[serde(flatten)]
    pub output: ValidatorOutput,
}

/// POST /aggregate request
///
/// Canonical items and native validator outputs may be mixed.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregateRequest {
    pub items: Vec<EvidenceItem>,
    pub validations: Vec<ValidatorEvidence>,
}

/// POST /aggregate/breakdown request
#[derive(Debug, Deserialize)]
pub struct BreakdownRequest {
    #[serde(default)]
    pub breakdown: ModalityBreakdown,
}

/// POST /aggregate/sources request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcesRequest {
    #[serde(default)]
    pub analyses: Vec<AnalyzedSource>,
    #[serde(alias = "confidenceLevel")]
    pub confidence_tier: ConfidenceTier,
}

/// POST /validate request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub claim: String,
    #[serde(default)]
    pub media: Vec<ModalityRef>,
}

/// POST /aggregate
///
/// Modality-weighted verdict over canonical evidence items.
pub async fn aggregate_evidence(
    payload: Result<Json<AggregateRequest>, JsonRejection>,
) -> ApiResult<Json<AggregateResult>> {
    let Json(request) = payload?;
    let mut items = request.items;
    items.extend(
        request
            .validations
            .iter()
            .map(|v| adapters::from_validator(v.modality, &v.source_ref, &v.output)),
    );
    Ok(Json(aggregation::aggregate_evidence(&items)))
}

/// POST /aggregate/breakdown
///
/// Verdict straight from per-modality counts.
pub async fn aggregate_breakdown(
    payload: Result<Json<BreakdownRequest>, JsonRejection>,
) -> ApiResult<Json<BreakdownVerdict>> {
    let Json(request) = payload?;
    Ok(Json(aggregation::aggregate(&request.breakdown)))
}

/// POST /aggregate/sources
///
/// Source-weighted truthfulness over per-source analyses.
pub async fn aggregate_sources(
    payload: Result<Json<SourcesRequest>, JsonRejection>,
) -> ApiResult<Json<AggregateResult>> {
    let Json(request) = payload?;
    let items: Vec<EvidenceItem> = request
        .analyses
        .iter()
        .map(|a| adapters::from_source_analysis(&a.source, &a.analysis))
        .collect();
    Ok(Json(aggregation::aggregate_sources(&items, request.confidence_tier)))
}

/// POST /validate
///
/// Run the configured modality validators and aggregate their results.
pub async fn validate_media(
    State(state): State<AppState>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> ApiResult<Json<AggregateResult>> {
    let Json(request) = payload?;
    if request.claim.trim().is_empty() {
        return Err(ApiError::BadRequest("claim must not be empty".to_string()));
    }

    let cancel = CancellationToken::new();
    let result = state
        .pipeline
        .validate_modalities(&request.claim, &request.media, &cancel)
        .await;
    Ok(Json(result))
}

/// Build aggregation routes
pub fn aggregate_routes() -> Router<AppState> {
    Router::new()
        .route("/aggregate", post(aggregate_evidence))
        .route("/aggregate/breakdown", post(aggregate_breakdown))
        .route("/aggregate/sources", post(aggregate_sources))
        .route("/validate", post(validate_media))
}
