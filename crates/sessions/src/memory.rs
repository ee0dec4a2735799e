//! Process-local backend.
//!
//! Plain `RwLock`-guarded map. Appends are atomic under the write lock, and
//! operations on different session ids never contend beyond the lock itself.
//! No retention enforcement — entries live for the process lifetime.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use bait_domain::error::Result;
use bait_domain::{IntelligenceMap, Message};

use crate::backend::SessionBackend;

#[derive(Debug, Default, Clone)]
struct SessionState {
    history: Vec<Message>,
    intelligence: IntelligenceMap,
    last_seen: Option<DateTime<Utc>>,
    finalized: bool,
}

/// In-memory session backend. Infallible by construction.
#[derive(Default)]
pub struct MemoryBackend {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    async fn append_message(&self, session_id: &str, message: &Message) -> Result<()> {
        let mut sessions = self.sessions.write();
        let state = sessions.entry(session_id.to_owned()).or_default();
        state.history.push(message.clone());
        state.last_seen = Some(Utc::now());
        Ok(())
    }

    async fn history(&self, session_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .sessions
            .read()
            .get(session_id)
            .map(|s| s.history.clone())
            .unwrap_or_default())
    }

    async fn intelligence(&self, session_id: &str) -> Result<IntelligenceMap> {
        Ok(self
            .sessions
            .read()
            .get(session_id)
            .map(|s| s.intelligence.clone())
            .unwrap_or_default())
    }

    async fn set_intelligence(&self, session_id: &str, intel: &IntelligenceMap) -> Result<()> {
        let mut sessions = self.sessions.write();
        sessions.entry(session_id.to_owned()).or_default().intelligence = intel.clone();
        Ok(())
    }

    async fn last_seen(&self, session_id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .sessions
            .read()
            .get(session_id)
            .and_then(|s| s.last_seen))
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        Ok(self.sessions.read().keys().cloned().collect())
    }

    async fn mark_finalized(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write();
        sessions.entry(session_id.to_owned()).or_default().finalized = true;
        Ok(())
    }

    async fn is_finalized(&self, session_id: &str) -> Result<bool> {
        Ok(self
            .sessions
            .read()
            .get(session_id)
            .map(|s| s.finalized)
            .unwrap_or(false))
    }
}
