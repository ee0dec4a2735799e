//! Auto-finalizer background loop.
//!
//! One long-lived task, fixed poll interval, cooperative cancellation. Each
//! pass sweeps every known non-finalized session and applies three triggers
//! in order — evidence found, message volume, idle timeout — first match
//! wins. A session is marked finalized only after a confirmed successful
//! delivery, so a failed callback simply means the session is revisited on
//! the next pass. One bad session never stops the sweep.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use bait_domain::config::FinalizerConfig;
use bait_domain::{CaseSummary, IntelligenceMap, TraceEvent};
use bait_sessions::SessionStore;

use crate::delivery::{CaseDelivery, DeliveryOutcome};

/// Which heuristic decided a session was finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Evidence,
    Volume,
    Idle,
}

impl Trigger {
    /// Free-text note carried in the outbound case payload.
    pub fn note(&self) -> &'static str {
        match self {
            Self::Evidence => "Auto-finalized by heuristic: extracted items found",
            Self::Volume => "Auto-finalized by heuristic: message count threshold",
            Self::Idle => "Auto-finalized by heuristic: idle timeout",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Evidence => "evidence",
            Self::Volume => "volume",
            Self::Idle => "idle",
        }
    }
}

/// Apply the three finalization triggers in order. Pure; exposed for tests.
pub fn evaluate_trigger(
    intel: &IntelligenceMap,
    total_messages: usize,
    last_seen: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cfg: &FinalizerConfig,
) -> Option<Trigger> {
    if intel.has_evidence() {
        return Some(Trigger::Evidence);
    }
    if total_messages >= cfg.min_messages {
        return Some(Trigger::Volume);
    }
    if let Some(seen) = last_seen {
        if now.signed_duration_since(seen).num_seconds() >= cfg.idle_secs {
            return Some(Trigger::Idle);
        }
    }
    None
}

/// The recurring finalization process.
pub struct AutoFinalizer {
    store: Arc<SessionStore>,
    delivery: Arc<dyn CaseDelivery>,
    config: FinalizerConfig,
}

impl AutoFinalizer {
    pub fn new(
        store: Arc<SessionStore>,
        delivery: Arc<dyn CaseDelivery>,
        config: FinalizerConfig,
    ) -> Self {
        Self {
            store,
            delivery,
            config,
        }
    }

    /// Run until `stop` is cancelled. The stop condition is checked at least
    /// once per poll interval; an in-flight delivery is allowed to finish.
    pub async fn run(&self, stop: CancellationToken) {
        let interval = std::time::Duration::from_secs(self.config.poll_interval_secs);
        tracing::info!(
            poll_secs = self.config.poll_interval_secs,
            min_messages = self.config.min_messages,
            idle_secs = self.config.idle_secs,
            "auto-finalizer started"
        );

        loop {
            if stop.is_cancelled() {
                break;
            }
            self.sweep().await;

            tokio::select! {
                _ = stop.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        tracing::info!("auto-finalizer stopped");
    }

    /// One pass over all known sessions. Exposed so tests (and a manual
    /// admin path) can drive passes directly.
    pub async fn sweep(&self) {
        let sessions = self.store.list_sessions().await;

        for session_id in sessions {
            if self.store.is_finalized(&session_id).await {
                continue;
            }

            let intel = self.store.intelligence(&session_id).await;
            let total = self.store.total_messages(&session_id).await;
            let last_seen = self.store.last_seen(&session_id).await;

            let Some(trigger) =
                evaluate_trigger(&intel, total, last_seen, Utc::now(), &self.config)
            else {
                continue;
            };

            let case = CaseSummary {
                session_id: session_id.clone(),
                scam_detected: true,
                total_messages_exchanged: total,
                extracted_intelligence: intel,
                agent_notes: trigger.note().to_owned(),
            };

            match self.delivery.deliver(&case).await {
                DeliveryOutcome::Sent { .. } => {
                    self.store.mark_finalized(&session_id).await;
                    TraceEvent::SessionFinalized {
                        session_id: session_id.clone(),
                        trigger: trigger.as_str().to_owned(),
                    }
                    .emit();
                }
                DeliveryOutcome::Failed { error } => {
                    // Leave the session eligible for the next pass.
                    tracing::debug!(
                        session_id,
                        error,
                        "case delivery failed; will retry on a later pass"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::DeliveryOutcome;
    use async_trait::async_trait;
    use bait_domain::Message;
    use parking_lot::Mutex;

    fn cfg() -> FinalizerConfig {
        FinalizerConfig {
            poll_interval_secs: 1,
            min_messages: 5,
            idle_secs: 300,
        }
    }

    // ── trigger evaluation ───────────────────────────────────────────

    #[test]
    fn evidence_trigger_fires_first() {
        let mut intel = IntelligenceMap::default();
        intel.upi_ids.push("pay@upi".into());
        // Volume threshold also met, but evidence wins by order.
        let t = evaluate_trigger(&intel, 10, None, Utc::now(), &cfg());
        assert_eq!(t, Some(Trigger::Evidence));
    }

    #[test]
    fn keywords_alone_do_not_trigger_evidence() {
        let mut intel = IntelligenceMap::default();
        intel.add_keywords(["urgent"]);
        let t = evaluate_trigger(&intel, 1, None, Utc::now(), &cfg());
        assert_eq!(t, None);
    }

    #[test]
    fn volume_trigger_at_threshold() {
        let intel = IntelligenceMap::default();
        assert_eq!(
            evaluate_trigger(&intel, 5, None, Utc::now(), &cfg()),
            Some(Trigger::Volume)
        );
        assert_eq!(evaluate_trigger(&intel, 4, None, Utc::now(), &cfg()), None);
    }

    #[test]
    fn idle_trigger_after_window() {
        let intel = IntelligenceMap::default();
        let now = Utc::now();
        let seen = now - chrono::Duration::seconds(301);
        assert_eq!(
            evaluate_trigger(&intel, 1, Some(seen), now, &cfg()),
            Some(Trigger::Idle)
        );

        let recent = now - chrono::Duration::seconds(10);
        assert_eq!(evaluate_trigger(&intel, 1, Some(recent), now, &cfg()), None);
    }

    #[test]
    fn no_last_seen_means_no_idle_trigger() {
        let intel = IntelligenceMap::default();
        assert_eq!(evaluate_trigger(&intel, 1, None, Utc::now(), &cfg()), None);
    }

    // ── sweep behavior ───────────────────────────────────────────────

    struct AlwaysFails;

    #[async_trait]
    impl CaseDelivery for AlwaysFails {
        async fn deliver(&self, _: &CaseSummary) -> DeliveryOutcome {
            DeliveryOutcome::Failed {
                error: "endpoint down".into(),
            }
        }
    }

    struct Records(Mutex<Vec<CaseSummary>>);

    #[async_trait]
    impl CaseDelivery for Records {
        async fn deliver(&self, case: &CaseSummary) -> DeliveryOutcome {
            self.0.lock().push(case.clone());
            DeliveryOutcome::Sent { status: 200 }
        }
    }

    fn msg(text: &str) -> Message {
        Message {
            sender: "scammer".to_owned(),
            text: text.to_owned(),
            timestamp: Utc::now(),
        }
    }

    async fn store_with_evidence(session: &str) -> Arc<SessionStore> {
        let store = Arc::new(SessionStore::in_memory());
        store.append_message(session, &msg("pay me")).await;
        let mut intel = IntelligenceMap::default();
        intel.phone_numbers.push("9876543210".into());
        store.set_intelligence(session, &intel).await;
        store
    }

    #[tokio::test]
    async fn failed_delivery_leaves_session_unfinalized() {
        let store = store_with_evidence("s1").await;
        let fin = AutoFinalizer::new(store.clone(), Arc::new(AlwaysFails), cfg());

        fin.sweep().await;
        assert!(
            !store.is_finalized("s1").await,
            "failed delivery must not finalize"
        );

        // The session is re-evaluated on the next pass.
        fin.sweep().await;
        assert!(!store.is_finalized("s1").await);
    }

    #[tokio::test]
    async fn successful_delivery_finalizes_once() {
        let store = store_with_evidence("s1").await;
        let records = Arc::new(Records(Mutex::new(Vec::new())));
        let fin = AutoFinalizer::new(store.clone(), records.clone(), cfg());

        fin.sweep().await;
        assert!(store.is_finalized("s1").await);

        // A second pass must skip the finalized session entirely.
        fin.sweep().await;
        let sent = records.0.lock();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].scam_detected);
        assert_eq!(sent[0].agent_notes, Trigger::Evidence.note());
    }

    #[tokio::test]
    async fn loop_exits_on_cancellation() {
        let store = Arc::new(SessionStore::in_memory());
        let fin = AutoFinalizer::new(store, Arc::new(AlwaysFails), cfg());

        let stop = CancellationToken::new();
        let handle = {
            let stop = stop.clone();
            tokio::spawn(async move { fin.run(stop).await })
        };

        stop.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("loop must exit promptly after cancellation")
            .expect("loop task must not panic");
    }
}
