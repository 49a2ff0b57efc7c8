//! veritas-check library interface
//!
//! Fact-checking service: claim finalization, source search and analysis,
//! and the evidence aggregation / credibility scoring engine, exposed over
//! HTTP REST + SSE.

pub mod aggregation;
pub mod analysis;
pub mod api;
pub mod claim;
pub mod config;
pub mod credibility;
pub mod error;
pub mod oracles;
pub mod pipeline;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use crate::pipeline::{FactCheckPipeline, SessionStatus, SessionStore};
use axum::Router;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use uuid::Uuid;
use veritas_common::events::EventBus;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<FactCheckPipeline>,
    /// Progress log of fact-check sessions
    pub sessions: Arc<dyn SessionStore>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Cancellation tokens for running pipelines
    pub cancellation_tokens: Arc<RwLock<HashMap<Uuid, CancellationToken>>>,
    /// Whether an LLM API key was resolved at startup
    pub llm_configured: bool,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(pipeline: Arc<FactCheckPipeline>, event_bus: EventBus, llm_configured: bool) -> Self {
        Self {
            sessions: Arc::clone(pipeline.sessions()),
            pipeline,
            event_bus,
            cancellation_tokens: Arc::new(RwLock::new(HashMap::new())),
            llm_configured,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Evict idle sessions and forget tokens of pipelines no longer running
    ///
    /// Returns the number of sessions evicted.
    pub async fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let removed = self.sessions.expire(now).await;

        let ids: Vec<Uuid> = self.cancellation_tokens.read().await.keys().copied().collect();
        let mut finished = Vec::new();
        for id in ids {
            let running = matches!(
                self.sessions.get(id).await.map(|p| p.status),
                Some(SessionStatus::Running)
            );
            if !running {
                finished.push(id);
            }
        }
        if !finished.is_empty() {
            let mut tokens = self.cancellation_tokens.write().await;
            for id in finished {
                tokens.remove(&id);
            }
        }

        removed
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::fact_check_routes())
        .merge(api::aggregate_routes())
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
