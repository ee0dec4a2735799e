//! Session introspection and manual finalization endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use bait_dispatch::DeliveryOutcome;
use bait_domain::{CaseSummary, TraceEvent};

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// List known sessions with per-session summary counters.
pub async fn list_sessions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let ids = state.store.list_sessions().await;
    let mut sessions = Vec::with_capacity(ids.len());

    for id in ids {
        let total = state.store.total_messages(&id).await;
        let intel = state.store.intelligence(&id).await;
        let finalized = state.store.is_finalized(&id).await;
        sessions.push(serde_json::json!({
            "sessionId": id,
            "totalMessages": total,
            "intelItems": intel.total_items(),
            "finalized": finalized,
        }));
    }

    Json(serde_json::json!({
        "count": sessions.len(),
        "degraded": state.store.is_degraded(),
        "sessions": sessions,
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/sessions/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Full detail for one session: history, intelligence, finalized flag.
/// An unknown session reads as empty rather than 404, matching the
/// store's lazy-creation behavior.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let history = state.store.history(&id).await;
    let intel = state.store.intelligence(&id).await;
    let last_seen = state.store.last_seen(&id).await;
    let finalized = state.store.is_finalized(&id).await;

    Json(serde_json::json!({
        "sessionId": id,
        "history": history,
        "extractedIntelligence": intel,
        "lastSeen": last_seen,
        "finalized": finalized,
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/sessions/:id/finalize
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn d_manual_notes() -> String {
    "Manually finalized".to_owned()
}

/// Request body for manual finalization. All fields optional; the stored
/// message count is used when the caller does not supply one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeBody {
    #[serde(default)]
    pub scam_detected: bool,
    #[serde(default)]
    pub total_messages_exchanged: Option<usize>,
    #[serde(default = "d_manual_notes")]
    pub agent_notes: String,
}

/// Force a case report for a session, regardless of the auto-finalizer's
/// heuristics. The session is marked finalized only if delivery succeeds,
/// so a failed callback leaves it eligible for later passes.
pub async fn finalize_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FinalizeBody>,
) -> impl IntoResponse {
    if !body.scam_detected {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "scamDetected must be true to finalize" })),
        )
            .into_response();
    }

    let total = match body.total_messages_exchanged {
        Some(n) => n,
        None => state.store.total_messages(&id).await,
    };

    let case = CaseSummary {
        session_id: id.clone(),
        scam_detected: true,
        total_messages_exchanged: total,
        extracted_intelligence: state.store.intelligence(&id).await,
        agent_notes: body.agent_notes,
    };

    match state.delivery.deliver(&case).await {
        DeliveryOutcome::Sent { status } => {
            state.store.mark_finalized(&id).await;
            TraceEvent::SessionFinalized {
                session_id: id,
                trigger: "manual".to_owned(),
            }
            .emit();
            Json(serde_json::json!({
                "status": "callback_attempted",
                "result": { "sent": true, "httpStatus": status },
            }))
            .into_response()
        }
        DeliveryOutcome::Failed { error } => Json(serde_json::json!({
            "status": "callback_attempted",
            "result": { "sent": false, "error": error },
        }))
        .into_response(),
    }
}
