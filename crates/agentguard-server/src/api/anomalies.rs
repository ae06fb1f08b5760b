//! `GET /anomalies` — newest-first anomalies flagged by the auditor.

use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};

use crate::state::AppState;

pub async fn list_anomalies(State(state): State<AppState>) -> Response {
    match state.store.list_anomalies() {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => super::internal_error(e),
    }
}
