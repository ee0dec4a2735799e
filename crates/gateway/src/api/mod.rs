pub mod admin;
pub mod auth;
pub mod events;
pub mod sessions;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Routes are split into **public** (health probe only) and **protected**
/// (gated behind the `x-api-key` middleware).
///
/// `state` is needed to wire up the auth middleware at build time.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/health", get(admin::health));

    let protected = Router::new()
        // Turn ingestion (core pipeline)
        .route("/v1/events", post(events::ingest_event))
        // Session introspection
        .route("/v1/sessions", get(sessions::list_sessions))
        .route("/v1/sessions/:id", get(sessions::get_session))
        // Manual finalization
        .route("/v1/sessions/:id/finalize", post(sessions::finalize_session))
        // Admin
        .route("/v1/admin/keys/reload", post(admin::reload_keys))
        // Apply API auth middleware to all protected routes.
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_api_key,
        ));

    public.merge(protected)
}
