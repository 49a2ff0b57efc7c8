//! Session progress store
//!
//! Append-only progress log per fact-check session, read by polling clients.
//! Sessions are created when a run is accepted, closed with a report or an
//! error, and evicted once idle for longer than the TTL.

use crate::pipeline::FactCheckReport;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;
use veritas_common::events::PipelineStage;
use veritas_common::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub stage: PipelineStage,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

/// Snapshot of one session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub entries: Vec<ProgressEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<FactCheckReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionProgress {
    fn new(session_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            status: SessionStatus::Running,
            entries: Vec::new(),
            report: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Session-keyed progress log
///
/// Entries of one session are only ever appended, and only by the run that
/// owns the session. Operations on unknown (or evicted) sessions return
/// `Error::NotFound`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session_id: Uuid) -> Result<()>;

    async fn append(&self, session_id: Uuid, stage: PipelineStage, message: String) -> Result<()>;

    async fn complete(&self, session_id: Uuid, report: FactCheckReport) -> Result<()>;

    async fn fail(&self, session_id: Uuid, error: String) -> Result<()>;

    async fn get(&self, session_id: Uuid) -> Option<SessionProgress>;

    /// Evict sessions idle since before `now - ttl`; returns how many were removed
    async fn expire(&self, now: DateTime<Utc>) -> usize;
}

/// Single-process store: a map behind a tokio `RwLock`
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, SessionProgress>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::hours(1)),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn update<F>(&self, session_id: Uuid, apply: F) -> Result<()>
    where
        F: FnOnce(&mut SessionProgress) + Send,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(|| Error::NotFound(format!("Session {}", session_id)))?;
        apply(session);
        session.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session_id: Uuid) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session_id) {
            return Err(Error::InvalidInput(format!("Session {} already exists", session_id)));
        }
        sessions.insert(session_id, SessionProgress::new(session_id, Utc::now()));
        Ok(())
    }

    async fn append(&self, session_id: Uuid, stage: PipelineStage, message: String) -> Result<()> {
        self.update(session_id, |session| {
            session.entries.push(ProgressEntry {
                stage,
                message,
                timestamp: Utc::now(),
            });
        })
        .await
    }

    async fn complete(&self, session_id: Uuid, report: FactCheckReport) -> Result<()> {
        self.update(session_id, |session| {
            session.status = SessionStatus::Completed;
            session.report = Some(report);
        })
        .await
    }

    async fn fail(&self, session_id: Uuid, error: String) -> Result<()> {
        self.update(session_id, |session| {
            session.status = SessionStatus::Failed;
            session.error = Some(error);
        })
        .await
    }

    async fn get(&self, session_id: Uuid) -> Option<SessionProgress> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    async fn expire(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.updated_at >= cutoff);
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, remaining = sessions.len(), "Expired idle sessions");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemorySessionStore {
        InMemorySessionStore::new(std::time::Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let store = store();
        let id = Uuid::new_v4();
        store.create(id).await.unwrap();
        store
            .append(id, PipelineStage::ClaimFinalization, "first".to_string())
            .await
            .unwrap();
        store
            .append(id, PipelineStage::QueryGeneration, "second".to_string())
            .await
            .unwrap();

        let progress = store.get(id).await.unwrap();
        assert_eq!(progress.status, SessionStatus::Running);
        let messages: Vec<&str> = progress.entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_sessions_do_not_interleave() {
        let store = store();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store.create(a).await.unwrap();
        store.create(b).await.unwrap();
        store.append(a, PipelineStage::SourceSearch, "a".to_string()).await.unwrap();
        store.append(b, PipelineStage::SourceSearch, "b".to_string()).await.unwrap();

        assert_eq!(store.get(a).await.unwrap().entries.len(), 1);
        assert_eq!(store.get(b).await.unwrap().entries[0].message, "b");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let store = store();
        let result = store
            .append(Uuid::new_v4(), PipelineStage::Aggregation, "x".to_string())
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(store.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let store = store();
        let id = Uuid::new_v4();
        store.create(id).await.unwrap();
        assert!(matches!(store.create(id).await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_fail_records_error() {
        let store = store();
        let id = Uuid::new_v4();
        store.create(id).await.unwrap();
        store.fail(id, "cancelled".to_string()).await.unwrap();
        let progress = store.get(id).await.unwrap();
        assert_eq!(progress.status, SessionStatus::Failed);
        assert_eq!(progress.error.as_deref(), Some("cancelled"));
    }

    #[tokio::test]
    async fn test_expire_evicts_idle_sessions() {
        let store = store();
        let id = Uuid::new_v4();
        store.create(id).await.unwrap();

        assert_eq!(store.expire(Utc::now()).await, 0);
        assert_eq!(store.expire(Utc::now() + Duration::seconds(120)).await, 1);
        assert_eq!(store.len().await, 0);
        assert!(store.get(id).await.is_none());
    }
}
