//! `POST /generate_policy` — invoke the external natural-language policy
//! generator. The generator never writes policies itself; callers post the
//! validated document through `POST /policies`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::generator;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct GenerateRequest {
    #[serde(default)]
    nl: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

pub async fn generate_policy(State(state): State<AppState>, body: Bytes) -> Response {
    // An unreadable body is treated like an empty one, which then fails
    // the missing-nl check below.
    let request: GenerateRequest = serde_json::from_slice(&body).unwrap_or_default();

    let Some(nl) = request.nl.filter(|s| !s.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"status": "error", "error": "missing_nl"})),
        )
            .into_response();
    };
    let model = request
        .model
        .unwrap_or_else(|| state.config.gemini_model.clone());

    match generator::run_policy_generator(&state.config, &nl, &model).await {
        Ok(document) => Json(serde_json::json!({
            "status": "ok",
            "policy": document,
        }))
        .into_response(),
        Err(detail) => {
            let mut payload = match detail {
                Value::Object(map) => map,
                other => {
                    let mut map = serde_json::Map::new();
                    map.insert("detail".to_string(), other);
                    map
                }
            };
            payload.insert("status".to_string(), Value::String("error".to_string()));
            (StatusCode::INTERNAL_SERVER_ERROR, Json(Value::Object(payload))).into_response()
        }
    }
}
