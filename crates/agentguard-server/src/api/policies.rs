//! Policy administration endpoints.
//!
//! - `GET /policies`         — all policies, rules deserialized
//! - `POST /policies`        — create (auto-versioned when no version given)
//! - `DELETE /policies/:id`  — delete by id

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::Value;

use crate::state::AppState;

pub async fn list_policies(State(state): State<AppState>) -> Response {
    match state.policies.list() {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => super::internal_error(e),
    }
}

pub async fn create_policy(State(state): State<AppState>, body: Bytes) -> Response {
    let document: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "status": "error",
                    "error": "invalid_request",
                    "details": e.to_string(),
                })),
            )
                .into_response();
        }
    };

    match state.policies.create(&document) {
        Ok(created) => Json(serde_json::json!({
            "status": "created",
            "version": created.version,
            "created_at": created.created_at,
        }))
        .into_response(),
        // Duplicate versions and unversionable documents are client errors.
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "status": "error",
                "error": e.to_string(),
            })),
        )
            .into_response(),
    }
}

pub async fn delete_policy(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.policies.delete(id) {
        Ok(true) => Json(serde_json::json!({
            "status": "deleted",
            "policy_id": id,
        }))
        .into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "status": "error",
                "error": "not_found",
            })),
        )
            .into_response(),
        Err(e) => super::internal_error(e),
    }
}
