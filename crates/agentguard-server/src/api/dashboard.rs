//! `GET /` — a minimal HTML status page.

use axum::extract::State;
use axum::response::{Html, IntoResponse};

use crate::state::AppState;

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let policies = state.store.count_rows("policies").unwrap_or(0);
    let tools = state.store.count_rows("tools").unwrap_or(0);
    let audits = state.store.count_rows("audit_logs").unwrap_or(0);
    let anomalies = state.store.count_rows("anomalies").unwrap_or(0);

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>AgentGuard</title></head>
<body>
  <h1>AgentGuard</h1>
  <p>Policy enforcement for AI-agent tool invocations.</p>
  <ul>
    <li>policies: {policies}</li>
    <li>tools: {tools}</li>
    <li>audit entries: {audits}</li>
    <li>anomalies: {anomalies}</li>
  </ul>
  <p>
    Endpoints: <code>POST /enforce</code>, <code>GET /audit</code>,
    <code>GET /policies</code>, <code>POST /policies</code>,
    <code>GET /tools</code>, <code>GET /anomalies</code>,
    <code>POST /generate_policy</code>
  </p>
</body>
</html>
"#
    ))
}
