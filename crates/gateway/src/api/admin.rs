//! Health probe and operational endpoints.

use axum::extract::State;
use axum::response::Json;

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /health
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Liveness probe. `storeDegraded` flips to true once the remote session
/// store has failed over to memory.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "storeDegraded": state.store.is_degraded(),
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/admin/keys/reload
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Re-read the API key env var so keys can be rotated without a restart.
/// The caller must authenticate with a currently-valid key first.
pub async fn reload_keys(State(state): State<AppState>) -> Json<serde_json::Value> {
    let count = state.keys.reload();
    Json(serde_json::json!({ "status": "reloaded", "keyCount": count }))
}
