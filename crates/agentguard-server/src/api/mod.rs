pub mod anomalies;
pub mod audit;
pub mod dashboard;
pub mod enforce;
pub mod generate;
pub mod policies;
pub mod tools;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/enforce", post(enforce::enforce))
        .route("/audit", get(audit::list_audit))
        .route(
            "/policies",
            get(policies::list_policies).post(policies::create_policy),
        )
        .route("/policies/:id", delete(policies::delete_policy))
        .route("/tools", get(tools::list_tools))
        .route("/anomalies", get(anomalies::list_anomalies))
        .route("/generate_policy", post(generate::generate_policy))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Build a standardized JSON error response: `{ "error": "<message>" }`.
pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
        .into_response()
}

/// 500 for infrastructure failures; the cause goes to the log, not the wire.
pub(crate) fn internal_error(err: anyhow::Error) -> Response {
    tracing::error!(error = %err, "request failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
}
