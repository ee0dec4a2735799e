//! Turn ingestion endpoint.

use axum::extract::State;
use axum::response::Json;

use bait_engine::{TurnEvent, TurnOutcome};

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/events
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process one inbound scam-actor turn.
///
/// This is the main entry point for connectors: post the message plus any
/// caller-supplied history, get back detection flags, engagement metrics,
/// the accumulated intelligence map, and (for scam turns) the agent reply.
/// The pipeline itself never fails a request; malformed optional fields are
/// absorbed by the lenient [`TurnEvent`] deserialization.
pub async fn ingest_event(
    State(state): State<AppState>,
    Json(event): Json<TurnEvent>,
) -> Json<TurnOutcome> {
    Json(state.handler.handle(event).await)
}
