//! One inbound turn, end to end.
//!
//! Detect on the current text, extract over the whole available
//! conversation, merge into the session's persisted intelligence, reply when
//! a scam signal is present, and always answer. No step may abort the
//! response: any failure in the middle degrades its field to a default.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use bait_domain::{IntelligenceMap, Message, TraceEvent};
use bait_extract::{detect, Extractor};
use bait_sessions::SessionStore;

use crate::reply::ReplyGenerator;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One inbound event from a channel connector.
///
/// `conversation_history` is kept as raw JSON: connectors send whatever they
/// have, and entries with missing or malformed fields are defaulted rather
/// than rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnEvent {
    pub session_id: String,
    pub message: Message,
    #[serde(default)]
    pub conversation_history: Vec<Value>,
    #[serde(default)]
    pub metadata: Value,
}

impl TurnEvent {
    /// History entries as messages, lenient per-entry. Non-object entries
    /// are skipped; missing fields default.
    fn history_messages(&self) -> Vec<Message> {
        self.conversation_history
            .iter()
            .filter(|v| v.is_object())
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect()
    }

    /// Timestamps of history entries that actually carried one. Entries
    /// without an explicit timestamp do not count toward engagement
    /// duration.
    fn history_timestamps(&self) -> Vec<DateTime<Utc>> {
        self.conversation_history
            .iter()
            .filter_map(|v| v.get("timestamp"))
            .filter(|ts| !ts.is_null() && ts.as_str() != Some(""))
            .map(bait_domain::message::parse_flexible)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    pub engagement_duration_seconds: i64,
    pub total_messages_exchanged: usize,
}

/// Everything the transport returns for one turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub status: String,
    pub scam_detected: bool,
    pub engagement_metrics: EngagementMetrics,
    pub extracted_intelligence: IntelligenceMap,
    pub agent_notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_reply: Option<Message>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Orchestrates one inbound conversational turn. Strictly sequential for a
/// single call; many turns may run concurrently across sessions.
pub struct EventHandler {
    store: Arc<SessionStore>,
    extractor: Extractor,
    generator: ReplyGenerator,
}

impl EventHandler {
    pub fn new(store: Arc<SessionStore>, generator: ReplyGenerator) -> Self {
        Self {
            store,
            extractor: Extractor::new(),
            generator,
        }
    }

    pub async fn handle(&self, event: TurnEvent) -> TurnOutcome {
        // 1. Normalize minimal shape.
        let mut message = event.message.clone();
        if message.sender.trim().is_empty() {
            message.sender = "unknown".to_owned();
        }

        // 2. Detect on the current text; extract over history + current.
        let detection = detect(&message.text);
        let full_text = {
            let mut texts: Vec<String> = event
                .history_messages()
                .iter()
                .map(|m| m.text.clone())
                .filter(|t| !t.is_empty())
                .collect();
            texts.push(message.text.clone());
            texts.join("\n")
        };
        let extracted = self.extractor.extract(&full_text);

        // 3. Persist the inbound message, then union-merge intelligence.
        self.store.append_message(&event.session_id, &message).await;

        let mut merged = self.store.intelligence(&event.session_id).await;
        merged.merge(&extracted);
        merged.add_keywords(detection.matched_keywords.iter().map(String::as_str));
        self.store
            .set_intelligence(&event.session_id, &merged)
            .await;

        // 4. Engagement metrics. Never negative, never fails.
        let total_messages = event.conversation_history.len() + 1;
        let mut timestamps = event.history_timestamps();
        timestamps.push(message.timestamp);
        let engagement_seconds = engagement_duration_seconds(&timestamps);

        // 5. Reply when a scam signal is present.
        let agent_reply = if detection.scam {
            let mut conversation = self.store.history(&event.session_id).await;
            // Reconcile with the current message so the reply generator
            // always sees it as the trailing turn, without duplicating it.
            let already_trailing = conversation
                .last()
                .map(|m| m.text == message.text)
                .unwrap_or(false);
            if !already_trailing {
                conversation.push(message.clone());
            }

            let reply = self
                .generator
                .generate(&event.session_id, &conversation, &event.metadata)
                .await;
            self.store.append_message(&event.session_id, &reply).await;
            Some(reply)
        } else {
            None
        };

        // 6. Notes and response.
        let mut notes: Vec<String> = Vec::new();
        if !detection.matched_keywords.is_empty() {
            notes.push(format!(
                "Matched keywords: {}",
                detection.matched_keywords.join(", ")
            ));
        }
        if !merged.is_empty() {
            notes.push("Extracted possible intelligence items.".to_owned());
        }
        let agent_notes = if notes.is_empty() {
            "No flags detected.".to_owned()
        } else {
            notes.join(" ")
        };

        TraceEvent::TurnProcessed {
            session_id: event.session_id.clone(),
            scam_detected: detection.scam,
            matched_keywords: detection.matched_keywords.len(),
            intel_items: merged.total_items(),
            replied: agent_reply.is_some(),
        }
        .emit();

        TurnOutcome {
            status: "success".to_owned(),
            scam_detected: detection.scam,
            engagement_metrics: EngagementMetrics {
                engagement_duration_seconds: engagement_seconds,
                total_messages_exchanged: total_messages,
            },
            extracted_intelligence: merged,
            agent_notes,
            agent_reply,
        }
    }
}

/// Span between the earliest and latest timestamp, in whole seconds.
/// Zero when fewer than two timestamps are available; never negative.
fn engagement_duration_seconds(timestamps: &[DateTime<Utc>]) -> i64 {
    if timestamps.len() < 2 {
        return 0;
    }
    let min = timestamps.iter().min().copied().unwrap_or_default();
    let max = timestamps.iter().max().copied().unwrap_or_default();
    max.signed_duration_since(min).num_seconds().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn duration_zero_with_single_timestamp() {
        let t = Utc.with_ymd_and_hms(2026, 1, 30, 10, 0, 0).unwrap();
        assert_eq!(engagement_duration_seconds(&[t]), 0);
        assert_eq!(engagement_duration_seconds(&[]), 0);
    }

    #[test]
    fn duration_spans_min_to_max() {
        let a = Utc.with_ymd_and_hms(2026, 1, 30, 10, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 1, 30, 10, 1, 30).unwrap();
        // Order of arrival does not matter.
        assert_eq!(engagement_duration_seconds(&[b, a]), 90);
    }
}
