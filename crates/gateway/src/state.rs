use std::sync::Arc;

use bait_dispatch::CaseDelivery;
use bait_domain::config::Config;
use bait_engine::EventHandler;
use bait_sessions::SessionStore;

use crate::keys::ApiKeySet;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Session persistence (remote with in-memory fallback).
    pub store: Arc<SessionStore>,
    /// The per-turn pipeline: detect, extract, persist, reply.
    pub handler: Arc<EventHandler>,
    /// Outbound case reporting.
    pub delivery: Arc<dyn CaseDelivery>,
    /// Accepted API keys (rotatable at runtime).
    pub keys: Arc<ApiKeySet>,
}
