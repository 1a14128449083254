use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::errors::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    InProgress,
    Processed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMark {
    pub state: SessionState,
    pub updated_at: DateTime<Utc>,
}

/// Remembers which sessions already produced a test so repeated webhook
/// deliveries do not publish duplicates.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    async fn has_processed(&self, session_id: &str) -> AppResult<bool>;

    /// Atomically claims `session_id` for processing. Returns `false` when the
    /// session is already claimed or processed.
    async fn try_claim(&self, session_id: &str) -> AppResult<bool>;

    async fn mark_processed(&self, session_id: &str) -> AppResult<()>;

    /// Drops a claim after a failed run so a later delivery can retry.
    async fn release(&self, session_id: &str) -> AppResult<()>;
}

#[derive(Default, Clone)]
pub struct InMemoryIdempotencyStore {
    sessions: Arc<RwLock<HashMap<String, SessionMark>>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn state_of(&self, session_id: &str) -> Option<SessionState> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|mark| mark.state)
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn has_processed(&self, session_id: &str) -> AppResult<bool> {
        Ok(self.state_of(session_id).await == Some(SessionState::Processed))
    }

    async fn try_claim(&self, session_id: &str) -> AppResult<bool> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session_id) {
            return Ok(false);
        }
        sessions.insert(
            session_id.to_string(),
            SessionMark {
                state: SessionState::InProgress,
                updated_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn mark_processed(&self, session_id: &str) -> AppResult<()> {
        self.sessions.write().await.insert(
            session_id.to_string(),
            SessionMark {
                state: SessionState::Processed,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn release(&self, session_id: &str) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(session_id)
            .is_some_and(|mark| mark.state == SessionState::InProgress)
        {
            sessions.remove(session_id);
        }
        Ok(())
    }
}
