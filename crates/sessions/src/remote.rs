//! REST client for the remote session-state service.
//!
//! Wraps a `reqwest::Client` and translates every backend method into the
//! corresponding HTTP call, with retry + exponential back-off on transient
//! (5xx / timeout) failures. 4xx responses are permanent and not retried.
//!
//! Mutating calls carry a `ttl` query parameter naming the retention window
//! in seconds; the service may evict entries after it elapses.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use bait_domain::config::StoreConfig;
use bait_domain::error::{Error, Result};
use bait_domain::{IntelligenceMap, Message};

use crate::backend::SessionBackend;

/// REST-backed session state. Created once and reused; the underlying
/// `reqwest::Client` maintains a connection pool.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    http: Client,
    base_url: String,
    retention_secs: u64,
    max_retries: u32,
}

impl RemoteBackend {
    /// Build a client from the store config. Returns `None` when no remote
    /// URL is configured.
    pub fn from_config(cfg: &StoreConfig) -> Result<Option<Self>> {
        let Some(url) = &cfg.remote_url else {
            return Ok(None);
        };

        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Some(Self {
            http,
            base_url: url.trim_end_matches('/').to_owned(),
            retention_secs: cfg.retention_secs,
            max_retries: cfg.max_retries,
        }))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Execute a request with retry + exponential back-off on transient
    /// errors. Retries on 5xx and transport failures; not on 4xx.
    async fn execute_with_retry(
        &self,
        endpoint: &str,
        build_request: impl Fn() -> RequestBuilder,
    ) -> Result<Response> {
        let mut last_err: Option<Error> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                tokio::time::sleep(backoff).await;
            }

            match build_request().send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_server_error() {
                        let body = resp.text().await.unwrap_or_default();
                        last_err =
                            Some(Error::Store(format!("{endpoint} returned {status}: {body}")));
                        continue;
                    }
                    if status.is_client_error() {
                        let body = resp.text().await.unwrap_or_default();
                        return Err(Error::Store(format!(
                            "{endpoint} returned {status}: {body}"
                        )));
                    }
                    return Ok(resp);
                }
                Err(e) => {
                    last_err = Some(from_reqwest(e));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Store(format!("{endpoint}: all retries exhausted"))))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, endpoint: &str, path: &str) -> Result<T> {
        let url = self.url(path);
        let resp = self
            .execute_with_retry(endpoint, || self.http.get(&url))
            .await?;
        let body = resp.text().await.map_err(from_reqwest)?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Store(format!("{endpoint}: bad response: {e}: {body}")))
    }
}

#[derive(Debug, Deserialize)]
struct LastSeenBody {
    /// Epoch milliseconds of the most recent message, if any.
    ts_ms: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct FinalizedBody {
    finalized: bool,
}

#[async_trait]
impl SessionBackend for RemoteBackend {
    async fn append_message(&self, session_id: &str, message: &Message) -> Result<()> {
        let url = self.url(&format!("/api/sessions/{session_id}/messages"));
        self.execute_with_retry("POST messages", || {
            self.http
                .post(&url)
                .query(&[("ttl", self.retention_secs)])
                .json(message)
        })
        .await?;
        Ok(())
    }

    async fn history(&self, session_id: &str) -> Result<Vec<Message>> {
        self.get_json("GET messages", &format!("/api/sessions/{session_id}/messages"))
            .await
    }

    async fn intelligence(&self, session_id: &str) -> Result<IntelligenceMap> {
        self.get_json("GET intel", &format!("/api/sessions/{session_id}/intel"))
            .await
    }

    async fn set_intelligence(&self, session_id: &str, intel: &IntelligenceMap) -> Result<()> {
        let url = self.url(&format!("/api/sessions/{session_id}/intel"));
        self.execute_with_retry("PUT intel", || {
            self.http
                .put(&url)
                .query(&[("ttl", self.retention_secs)])
                .json(intel)
        })
        .await?;
        Ok(())
    }

    async fn last_seen(&self, session_id: &str) -> Result<Option<DateTime<Utc>>> {
        let body: LastSeenBody = self
            .get_json("GET last-seen", &format!("/api/sessions/{session_id}/last-seen"))
            .await?;
        Ok(body
            .ts_ms
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()))
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        self.get_json("GET sessions", "/api/sessions").await
    }

    async fn mark_finalized(&self, session_id: &str) -> Result<()> {
        let url = self.url(&format!("/api/sessions/{session_id}/finalized"));
        self.execute_with_retry("POST finalized", || {
            self.http.post(&url).query(&[("ttl", self.retention_secs)])
        })
        .await?;
        Ok(())
    }

    async fn is_finalized(&self, session_id: &str) -> Result<bool> {
        let body: FinalizedBody = self
            .get_json("GET finalized", &format!("/api/sessions/{session_id}/finalized"))
            .await?;
        Ok(body.finalized)
    }
}

/// Convert a `reqwest::Error` into a domain `Error`. Timeouts become
/// `Error::Timeout`; everything else becomes `Error::Http`.
fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
