//! `GET /audit` — newest-first audit rows, capped at 200.

use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};

use crate::state::AppState;

const AUDIT_LIMIT: u32 = 200;

pub async fn list_audit(State(state): State<AppState>) -> Response {
    match state.store.recent_audit(AUDIT_LIMIT) {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => super::internal_error(e),
    }
}
