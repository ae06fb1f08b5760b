//! `POST /enforce` — the enforcement decision endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use agentguard_core::model::EnforcementRequest;

use crate::state::AppState;

/// Status is carried by the pipeline outcome: 200 ALLOW, 403 BLOCK,
/// 400 schema rejection, 404 unknown tool. Structurally malformed bodies
/// fail as a client error and are not audited.
pub async fn enforce(State(state): State<AppState>, body: Bytes) -> Response {
    let request: EnforcementRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "invalid_request",
                    "details": e.to_string(),
                })),
            )
                .into_response();
        }
    };

    match state.enforcement.enforce(&request) {
        Ok(outcome) => {
            let status = StatusCode::from_u16(outcome.status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(outcome.envelope)).into_response()
        }
        Err(e) => super::internal_error(e),
    }
}
