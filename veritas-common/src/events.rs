//! Event types and EventBus for Veritas pipeline progress

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Pipeline stage identifiers, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    ClaimFinalization,
    QueryGeneration,
    SourceSearch,
    SourceAnalysis,
    Aggregation,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::ClaimFinalization => "claim_finalization",
            PipelineStage::QueryGeneration => "query_generation",
            PipelineStage::SourceSearch => "source_search",
            PipelineStage::SourceAnalysis => "source_analysis",
            PipelineStage::Aggregation => "aggregation",
        };
        write!(f, "{}", name)
    }
}

/// Veritas event types
///
/// Broadcast via [`EventBus`] and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VeritasEvent {
    /// A fact-check pipeline run was accepted
    PipelineStarted {
        session_id: Uuid,
        post_title: String,
        timestamp: DateTime<Utc>,
    },

    /// A pipeline stage reported progress
    StageProgress {
        session_id: Uuid,
        stage: PipelineStage,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// One source finished analysis (LLM or fallback)
    SourceAnalyzed {
        session_id: Uuid,
        publisher: String,
        supports: bool,
        confidence: u8,
        used_fallback: bool,
        timestamp: DateTime<Utc>,
    },

    /// Pipeline produced a verdict
    PipelineCompleted {
        session_id: Uuid,
        verdict: String,
        confidence_score: f64,
        timestamp: DateTime<Utc>,
    },

    /// Pipeline aborted (cancellation or unexpected failure)
    PipelineFailed {
        session_id: Uuid,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl VeritasEvent {
    /// SSE event name for this variant
    pub fn event_type(&self) -> &'static str {
        match self {
            VeritasEvent::PipelineStarted { .. } => "PipelineStarted",
            VeritasEvent::StageProgress { .. } => "StageProgress",
            VeritasEvent::SourceAnalyzed { .. } => "SourceAnalyzed",
            VeritasEvent::PipelineCompleted { .. } => "PipelineCompleted",
            VeritasEvent::PipelineFailed { .. } => "PipelineFailed",
        }
    }

    /// Session this event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            VeritasEvent::PipelineStarted { session_id, .. }
            | VeritasEvent::StageProgress { session_id, .. }
            | VeritasEvent::SourceAnalyzed { session_id, .. }
            | VeritasEvent::PipelineCompleted { session_id, .. }
            | VeritasEvent::PipelineFailed { session_id, .. } => *session_id,
        }
    }
}

/// Central event distribution bus
///
/// Wraps `tokio::broadcast`: publishing never blocks, slow subscribers see
/// `Lagged` instead of stalling producers, and receivers clean up on drop.
///
/// # Examples
///
/// ```
/// use veritas_common::events::{EventBus, VeritasEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(VeritasEvent::PipelineFailed {
///     session_id: uuid::Uuid::new_v4(),
///     error: "cancelled".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<VeritasEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<VeritasEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: VeritasEvent,
    ) -> Result<usize, broadcast::error::SendError<VeritasEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: VeritasEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        let result = bus.emit(VeritasEvent::PipelineFailed {
            session_id: Uuid::new_v4(),
            error: "test".to_string(),
            timestamp: Utc::now(),
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let session_id = Uuid::new_v4();

        bus.emit_lossy(VeritasEvent::StageProgress {
            session_id,
            stage: PipelineStage::QueryGeneration,
            message: "Generated query".to_string(),
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.session_id(), session_id);
        assert_eq!(event.event_type(), "StageProgress");
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.capacity(), 10);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = VeritasEvent::PipelineCompleted {
            session_id: Uuid::nil(),
            verdict: "LIKELY FALSE".to_string(),
            confidence_score: 0.0,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PipelineCompleted");
        assert_eq!(json["verdict"], "LIKELY FALSE");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PipelineStage::SourceAnalysis.to_string(), "source_analysis");
    }
}
