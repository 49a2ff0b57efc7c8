//! Server-Sent Events (SSE) for pipeline progress streaming

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events - SSE stream of all pipeline events
///
/// Streams PipelineStarted, StageProgress, SourceAnalyzed,
/// PipelineCompleted and PipelineFailed for every session.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    veritas_common::sse::create_event_sse_stream("veritas-check", &state.event_bus)
}
