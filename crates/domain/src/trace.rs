use serde::Serialize;

/// Structured trace events emitted across all Baitline crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    TurnProcessed {
        session_id: String,
        scam_detected: bool,
        matched_keywords: usize,
        intel_items: usize,
        replied: bool,
    },
    ReplyGenerated {
        session_id: String,
        tier: String,
        chars: usize,
    },
    GuardrailTripped {
        session_id: String,
        reason: String,
    },
    StoreFailover {
        error: String,
    },
    CallbackAttempt {
        session_id: String,
        attempt: u32,
        status: u16,
        duration_ms: u64,
    },
    SessionFinalized {
        session_id: String,
        trigger: String,
    },
    ApiKeysReloaded {
        key_count: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "bait_event");
    }
}
