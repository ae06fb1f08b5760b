//! `GET /tools` — the full tool catalog including signatures.

use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};

use crate::state::AppState;

pub async fn list_tools(State(state): State<AppState>) -> Response {
    match state.registry.list() {
        Ok(tools) => Json(tools).into_response(),
        Err(e) => super::internal_error(e),
    }
}
