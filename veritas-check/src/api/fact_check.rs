//! Fact-check session API handlers
//!
//! POST /fact-check, GET /fact-check/:session_id/progress,
//! POST /fact-check/:session_id/cancel

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::pipeline::{FactCheckRequest, SessionProgress, SessionStatus};
use crate::AppState;

/// POST /fact-check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartFactCheckResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
}

/// POST /fact-check/:session_id/cancel response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelFactCheckResponse {
    pub session_id: Uuid,
    pub cancelled_at: DateTime<Utc>,
}

/// POST /fact-check
///
/// Accept a post for fact-checking. Returns 202 Accepted with the session ID;
/// the pipeline runs in the background.
pub async fn start_fact_check(
    State(state): State<AppState>,
    payload: Result<Json<FactCheckRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StartFactCheckResponse>)> {
    let Json(request) = payload?;
    if request.post_title.trim().is_empty() && request.evidence.total_items() == 0 {
        return Err(ApiError::BadRequest(
            "postTitle or at least one evidence item is required".to_string(),
        ));
    }

    let cancel = CancellationToken::new();
    let session_id = match state.pipeline.clone().start(request, cancel.clone()).await {
        Ok(session_id) => session_id,
        Err(e) => {
            *state.last_error.write().await = Some(e.to_string());
            return Err(e.into());
        }
    };
    state
        .cancellation_tokens
        .write()
        .await
        .insert(session_id, cancel);

    tracing::info!(session_id = %session_id, "Fact-check session started");

    Ok((
        StatusCode::ACCEPTED,
        Json(StartFactCheckResponse {
            session_id,
            status: SessionStatus::Running,
            started_at: Utc::now(),
        }),
    ))
}

/// GET /fact-check/:session_id/progress
///
/// Progress log so far, plus the report once the run has completed.
pub async fn get_progress(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionProgress>> {
    state
        .sessions
        .get(session_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Fact-check session not found: {}", session_id)))
}

/// POST /fact-check/:session_id/cancel
///
/// Signal a running pipeline to stop. In-flight oracle calls are abandoned.
pub async fn cancel_fact_check(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<CancelFactCheckResponse>> {
    let progress = state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Fact-check session not found: {}", session_id)))?;

    if progress.status != SessionStatus::Running {
        return Err(ApiError::BadRequest(format!(
            "Fact-check session already finished: {:?}",
            progress.status
        )));
    }

    match state.cancellation_tokens.write().await.remove(&session_id) {
        Some(token) => token.cancel(),
        None => {
            return Err(ApiError::NotFound(format!(
                "No running pipeline for session: {}",
                session_id
            )))
        }
    }

    tracing::info!(session_id = %session_id, "Fact-check session cancelled");

    Ok(Json(CancelFactCheckResponse {
        session_id,
        cancelled_at: Utc::now(),
    }))
}

/// Build fact-check routes
pub fn fact_check_routes() -> Router<AppState> {
    Router::new()
        .route("/fact-check", post(start_fact_check))
        .route("/fact-check/:session_id/progress", get(get_progress))
        .route("/fact-check/:session_id/cancel", post(cancel_fact_check))
}
