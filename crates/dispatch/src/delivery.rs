//! Delivery of finalized cases to the reporting endpoint.
//!
//! Up to `max_retries` attempts with exponential back-off starting at the
//! configured initial delay and doubling per attempt. A 2xx response is the
//! only success condition; anything else — including transport errors — is
//! retried until attempts run out, and the overall result is `Failed`. The
//! caller must not mark the session finalized on `Failed`.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use bait_domain::config::CallbackConfig;
use bait_domain::error::{Error, Result};
use bait_domain::{CaseSummary, TraceEvent};

/// Terminal result of one delivery (after all retries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent { status: u16 },
    Failed { error: String },
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Something that can deliver a finalized case. The HTTP implementation is
/// the production path; tests substitute stubs.
#[async_trait]
pub trait CaseDelivery: Send + Sync {
    async fn deliver(&self, case: &CaseSummary) -> DeliveryOutcome;
}

/// Posts the case summary as JSON to the configured reporting endpoint.
pub struct HttpCaseDelivery {
    http: reqwest::Client,
    url: String,
    max_retries: u32,
    initial_backoff: Duration,
}

impl HttpCaseDelivery {
    pub fn from_config(cfg: &CallbackConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            url: cfg.url.clone(),
            max_retries: cfg.max_retries,
            initial_backoff: Duration::from_millis(cfg.initial_backoff_ms),
        })
    }
}

#[async_trait]
impl CaseDelivery for HttpCaseDelivery {
    async fn deliver(&self, case: &CaseSummary) -> DeliveryOutcome {
        let mut backoff = self.initial_backoff;
        let mut last_error = String::from("no attempts made");

        for attempt in 1..=self.max_retries {
            if attempt > 1 {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            let start = Instant::now();
            let result = self.http.post(&self.url).json(case).send().await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    TraceEvent::CallbackAttempt {
                        session_id: case.session_id.clone(),
                        attempt,
                        status,
                        duration_ms,
                    }
                    .emit();

                    if resp.status().is_success() {
                        return DeliveryOutcome::Sent { status };
                    }
                    last_error = format!("unexpected status {status}");
                }
                Err(e) => {
                    TraceEvent::CallbackAttempt {
                        session_id: case.session_id.clone(),
                        attempt,
                        status: 0,
                        duration_ms,
                    }
                    .emit();
                    last_error = e.to_string();
                }
            }
        }

        DeliveryOutcome::Failed { error: last_error }
    }
}
