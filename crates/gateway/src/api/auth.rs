//! API authentication middleware.
//!
//! Accepted keys live in [`crate::keys::ApiKeySet`], loaded from the env var
//! named by `config.auth.api_keys_env`. Protected requests must carry a valid
//! `x-api-key` header. If no keys are configured the server logs a warning
//! once and allows unauthenticated access (dev mode).

use std::sync::atomic::{AtomicBool, Ordering};

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

static DEV_MODE_WARNED: AtomicBool = AtomicBool::new(false);

/// Axum middleware that enforces `x-api-key` authentication on protected
/// routes. Attach via `axum::middleware::from_fn_with_state`.
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if state.keys.is_open() {
        if !DEV_MODE_WARNED.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                env_var = %state.config.auth.api_keys_env,
                "no API keys configured; all requests allowed (dev mode)"
            );
        }
        return next.run(req).await;
    }

    let provided = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !state.keys.check(provided) {
        return (
            axum::http::StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({ "error": "invalid or missing API key" })),
        )
            .into_response();
    }

    next.run(req).await
}
