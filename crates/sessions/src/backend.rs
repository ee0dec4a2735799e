use async_trait::async_trait;
use chrono::{DateTime, Utc};

use bait_domain::error::Result;
use bait_domain::{IntelligenceMap, Message};

/// Storage operations a session backend must provide.
///
/// Semantics are deliberately minimal: atomic single-item history append,
/// whole-value get/set for intelligence, and listing of known sessions.
/// Every mutating key carries a bounded retention window; eviction is the
/// backend's prerogative, and a vanished session reappears as fresh.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Append one message to the session history and bump last-seen.
    async fn append_message(&self, session_id: &str, message: &Message) -> Result<()>;

    /// Full ordered history, oldest first. Unknown session → empty.
    async fn history(&self, session_id: &str) -> Result<Vec<Message>>;

    /// Merged intelligence as last persisted. Unknown session → empty map.
    async fn intelligence(&self, session_id: &str) -> Result<IntelligenceMap>;

    /// Replace the persisted intelligence mapping.
    async fn set_intelligence(&self, session_id: &str, intel: &IntelligenceMap) -> Result<()>;

    /// Timestamp of the most recent message, if any.
    async fn last_seen(&self, session_id: &str) -> Result<Option<DateTime<Utc>>>;

    /// All known session identifiers.
    async fn list_sessions(&self) -> Result<Vec<String>>;

    /// Set the finalized flag. False→true exactly once; never unset.
    async fn mark_finalized(&self, session_id: &str) -> Result<()>;

    async fn is_finalized(&self, session_id: &str) -> Result<bool>;
}
