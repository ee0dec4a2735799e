//! Failover session store.
//!
//! Fronts an optional remote backend with a process-local memory backend.
//! The first remote failure latches the store into memory mode for the rest
//! of the process lifetime: no automatic reconnection, no crash for the
//! caller. State written before the failover is lost to this process, which
//! the engine already tolerates (a vanished session reappears as fresh).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use bait_domain::{Error, IntelligenceMap, Message, TraceEvent};

use crate::backend::SessionBackend;
use crate::memory::MemoryBackend;

/// The one shared mutable resource of the engine. All public operations are
/// infallible: remote errors degrade to memory instead of propagating.
pub struct SessionStore {
    remote: Option<Arc<dyn SessionBackend>>,
    memory: MemoryBackend,
    degraded: AtomicBool,
}

impl SessionStore {
    pub fn new(remote: Option<Arc<dyn SessionBackend>>) -> Self {
        Self {
            remote,
            memory: MemoryBackend::new(),
            degraded: AtomicBool::new(false),
        }
    }

    /// Memory-only store (no remote configured).
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// The active remote backend, unless we have already failed over.
    fn active_remote(&self) -> Option<&Arc<dyn SessionBackend>> {
        if self.degraded.load(Ordering::Relaxed) {
            return None;
        }
        self.remote.as_ref()
    }

    /// Latch into memory mode after a remote failure.
    fn fail_over(&self, err: &Error) {
        if !self.degraded.swap(true, Ordering::Relaxed) {
            TraceEvent::StoreFailover {
                error: err.to_string(),
            }
            .emit();
            tracing::warn!(error = %err, "session store degraded to process-local memory");
        }
    }

    pub async fn append_message(&self, session_id: &str, message: &Message) {
        if let Some(remote) = self.active_remote() {
            match remote.append_message(session_id, message).await {
                Ok(()) => return,
                Err(e) => self.fail_over(&e),
            }
        }
        let _ = self.memory.append_message(session_id, message).await;
    }

    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        if let Some(remote) = self.active_remote() {
            match remote.history(session_id).await {
                Ok(v) => return v,
                Err(e) => self.fail_over(&e),
            }
        }
        self.memory.history(session_id).await.unwrap_or_default()
    }

    pub async fn intelligence(&self, session_id: &str) -> IntelligenceMap {
        if let Some(remote) = self.active_remote() {
            match remote.intelligence(session_id).await {
                Ok(v) => return v,
                Err(e) => self.fail_over(&e),
            }
        }
        self.memory
            .intelligence(session_id)
            .await
            .unwrap_or_default()
    }

    pub async fn set_intelligence(&self, session_id: &str, intel: &IntelligenceMap) {
        if let Some(remote) = self.active_remote() {
            match remote.set_intelligence(session_id, intel).await {
                Ok(()) => return,
                Err(e) => self.fail_over(&e),
            }
        }
        let _ = self.memory.set_intelligence(session_id, intel).await;
    }

    pub async fn last_seen(&self, session_id: &str) -> Option<DateTime<Utc>> {
        if let Some(remote) = self.active_remote() {
            match remote.last_seen(session_id).await {
                Ok(v) => return v,
                Err(e) => self.fail_over(&e),
            }
        }
        self.memory.last_seen(session_id).await.unwrap_or_default()
    }

    pub async fn list_sessions(&self) -> Vec<String> {
        if let Some(remote) = self.active_remote() {
            match remote.list_sessions().await {
                Ok(v) => return v,
                Err(e) => self.fail_over(&e),
            }
        }
        self.memory.list_sessions().await.unwrap_or_default()
    }

    pub async fn mark_finalized(&self, session_id: &str) {
        if let Some(remote) = self.active_remote() {
            match remote.mark_finalized(session_id).await {
                Ok(()) => return,
                Err(e) => self.fail_over(&e),
            }
        }
        let _ = self.memory.mark_finalized(session_id).await;
    }

    pub async fn is_finalized(&self, session_id: &str) -> bool {
        if let Some(remote) = self.active_remote() {
            match remote.is_finalized(session_id).await {
                Ok(v) => return v,
                Err(e) => self.fail_over(&e),
            }
        }
        self.memory
            .is_finalized(session_id)
            .await
            .unwrap_or_default()
    }

    /// Message count for a session.
    pub async fn total_messages(&self, session_id: &str) -> usize {
        self.history(session_id).await.len()
    }

    /// True once the store has fallen back to memory.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }
}
