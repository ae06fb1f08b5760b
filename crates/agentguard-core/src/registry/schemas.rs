//! Per-tool parameter schemas as a table of tagged validators.
//!
//! A schema validates a map of request params against a fixed field list.
//! Tools without a registered schema resolve to [`ParamSchema::Permissive`],
//! which accepts anything; the registry logs that case.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct SchemaViolation(pub String);

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Integer { min: Option<i64>, max: Option<i64> },
    Number,
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum ParamSchema {
    /// Validate the listed fields; parameters outside the list are accepted.
    Fields(&'static [FieldSpec]),
    /// Accept-all fallback for tools with no registered schema.
    Permissive,
}

impl ParamSchema {
    /// First violation wins; its message becomes `schema_error:<message>` in
    /// the enforcement reason.
    pub fn validate(&self, params: &Map<String, Value>) -> Result<(), SchemaViolation> {
        let fields = match self {
            ParamSchema::Permissive => return Ok(()),
            ParamSchema::Fields(fields) => fields,
        };
        for field in *fields {
            let value = match params.get(field.name) {
                Some(v) => v,
                None if field.required => {
                    return Err(SchemaViolation(format!(
                        "missing required field '{}'",
                        field.name
                    )));
                }
                None => continue,
            };
            check_field(field, value)?;
        }
        Ok(())
    }
}

fn check_field(field: &FieldSpec, value: &Value) -> Result<(), SchemaViolation> {
    match field.kind {
        FieldKind::Integer { min, max } => {
            let n = value.as_i64().ok_or_else(|| {
                SchemaViolation(format!("'{}' must be an integer", field.name))
            })?;
            if let Some(min) = min {
                if n < min {
                    return Err(SchemaViolation(format!(
                        "'{}' must be >= {min}",
                        field.name
                    )));
                }
            }
            if let Some(max) = max {
                if n > max {
                    return Err(SchemaViolation(format!(
                        "'{}' must be <= {max}",
                        field.name
                    )));
                }
            }
        }
        FieldKind::Number => {
            if value.as_f64().is_none() {
                return Err(SchemaViolation(format!(
                    "'{}' must be a number",
                    field.name
                )));
            }
        }
        FieldKind::Text => {
            if !value.is_string() {
                return Err(SchemaViolation(format!(
                    "'{}' must be a string",
                    field.name
                )));
            }
        }
    }
    Ok(())
}

const READ_LOGS: ParamSchema = ParamSchema::Fields(&[FieldSpec {
    name: "limit",
    kind: FieldKind::Integer {
        min: Some(1),
        max: Some(100),
    },
    required: true,
}]);

const LIST_TOOLS: ParamSchema = ParamSchema::Fields(&[]);

const GET_POLICY: ParamSchema = ParamSchema::Fields(&[FieldSpec {
    name: "version",
    kind: FieldKind::Text,
    required: true,
}]);

const MODIFY_POLICY: ParamSchema = ParamSchema::Fields(&[FieldSpec {
    name: "change",
    kind: FieldKind::Text,
    required: true,
}]);

const EXECUTE_TOOL_WRAPPER: ParamSchema = ParamSchema::Fields(&[FieldSpec {
    name: "target_tool",
    kind: FieldKind::Text,
    required: true,
}]);

const RUN_SHELL: ParamSchema = ParamSchema::Fields(&[FieldSpec {
    name: "cmd",
    kind: FieldKind::Text,
    required: true,
}]);

const READ_SENSITIVE: ParamSchema = ParamSchema::Fields(&[FieldSpec {
    name: "path",
    kind: FieldKind::Text,
    required: true,
}]);

const METRICS_WRITE: ParamSchema = ParamSchema::Fields(&[
    FieldSpec {
        name: "series",
        kind: FieldKind::Text,
        required: true,
    },
    FieldSpec {
        name: "value",
        kind: FieldKind::Number,
        required: true,
    },
]);

const PERMISSIVE: ParamSchema = ParamSchema::Permissive;

/// Compile-time mapping from tool id to its validator. Unknown ids get the
/// permissive schema.
pub fn schema_for(tool_id: &str) -> &'static ParamSchema {
    match tool_id {
        "mcp:read_logs" => &READ_LOGS,
        "mcp:list_tools" => &LIST_TOOLS,
        "mcp:get_policy" => &GET_POLICY,
        "mcp:modify_policy" => &MODIFY_POLICY,
        "mcp:execute_tool_wrapper" => &EXECUTE_TOOL_WRAPPER,
        "mcp:run_shell_sim" => &RUN_SHELL,
        "mcp:read_sensitive_sim" => &READ_SENSITIVE,
        "mcp:metrics_write" => &METRICS_WRITE,
        _ => &PERMISSIVE,
    }
}

pub fn is_registered(tool_id: &str) -> bool {
    !matches!(schema_for(tool_id), ParamSchema::Permissive)
}
