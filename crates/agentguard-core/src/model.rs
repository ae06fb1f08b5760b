use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The two possible enforcement outcomes. Serialized as `"ALLOW"` / `"BLOCK"`
/// on the wire and in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Allow,
    Block,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::Block => "BLOCK",
        }
    }
}

fn default_tool_version() -> String {
    "1.0".to_string()
}

/// An enforcement request as posted to `/enforce`.
///
/// `tool_version` defaults to `"1.0"` when omitted. The built-in catalog
/// ships its tools at `"1.0.0"`, so callers that omit the version will get
/// `tool_not_found` unless a matching tool was registered at `"1.0"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnforcementRequest {
    pub agent_id: String,
    pub agent_roles: Vec<String>,
    pub tool_id: String,
    #[serde(default = "default_tool_version")]
    pub tool_version: String,
    pub params: Map<String, Value>,
    pub request_id: String,
}

/// A tool definition as stored in the registry. The `input_schema` is a
/// declarative field-descriptor map; `signature` is the hex HMAC-SHA256 over
/// the canonical representation (see [`crate::signing`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub id: String,
    pub version: String,
    pub description: String,
    pub input_schema: Value,
    #[serde(default)]
    pub example_calls: Vec<Value>,
    #[serde(default)]
    pub signature: String,
}

/// A stored policy. `rules` is kept structured here; the store serializes it
/// to a JSON text column and rehydrates it on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub version: String,
    pub name: String,
    pub rules: Value,
    pub created_by: String,
    pub signature_placeholder: String,
    pub created_at: Option<String>,
}

/// The result of evaluating a request against the active policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub decision: Decision,
    pub version: Option<String>,
    pub reason: String,
}

/// One audit-log row. Exactly one row is written per enforcement request
/// that survived structural validation. `roles` is the comma-joined role
/// list; `params_hash` maps each parameter name to the hex SHA-256 of that
/// parameter's canonical JSON encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub request_id: String,
    pub agent_id: String,
    pub roles: String,
    pub tool_id: String,
    pub tool_version: String,
    pub params_hash: Value,
    pub decision: String,
    pub reason: String,
    pub policy_version: Option<String>,
    pub created_at: String,
}

/// An anomaly row derived from the audit log by the auditor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub agent_id: String,
    pub detail: Value,
    pub created_at: String,
}
