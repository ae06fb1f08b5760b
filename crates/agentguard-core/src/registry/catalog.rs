//! The built-in tool catalog inserted (unsigned) at startup.
//!
//! Field names in each `input_schema` must agree with the validator table in
//! [`super::schemas`]; the schema descriptors here are what gets signed and
//! served, the validators are what actually runs against request params.

use serde_json::json;

use crate::model::ToolDefinition;

pub const CATALOG_VERSION: &str = "1.0.0";

pub fn default_catalog() -> Vec<ToolDefinition> {
    vec![
        tool(
            "mcp:read_logs",
            "Read audit logs",
            json!({"limit": {"type": "integer", "max": 100}}),
            vec![json!({"params": {"limit": 10}})],
        ),
        tool(
            "mcp:list_tools",
            "List MCP tools",
            json!({}),
            vec![json!({"params": {}})],
        ),
        tool(
            "mcp:get_policy",
            "Fetch latest policy",
            json!({"version": {"type": "string"}}),
            vec![json!({"params": {"version": "1.0.0"}})],
        ),
        tool(
            "mcp:modify_policy",
            "Modify policy entries",
            json!({"change": {"type": "string"}}),
            vec![json!({"params": {"change": "add"}})],
        ),
        tool(
            "mcp:execute_tool_wrapper",
            "Wraps tool execution",
            json!({"target_tool": {"type": "string"}}),
            vec![json!({"params": {"target_tool": "mcp:read_logs"}})],
        ),
        tool(
            "mcp:run_shell_sim",
            "Simulated shell",
            json!({"cmd": {"type": "string"}}),
            vec![json!({"params": {"cmd": "ls"}})],
        ),
        tool(
            "mcp:read_sensitive_sim",
            "Simulated sensitive reader",
            json!({"path": {"type": "string"}}),
            vec![json!({"params": {"path": "/etc/shadow"}})],
        ),
        tool(
            "mcp:metrics_write",
            "Write metrics",
            json!({"series": {"type": "string"}, "value": {"type": "number"}}),
            vec![json!({"params": {"series": "latency", "value": 12}})],
        ),
    ]
}

fn tool(
    id: &str,
    description: &str,
    input_schema: serde_json::Value,
    example_calls: Vec<serde_json::Value>,
) -> ToolDefinition {
    ToolDefinition {
        id: id.to_string(),
        version: CATALOG_VERSION.to_string(),
        description: description.to_string(),
        input_schema,
        example_calls,
        signature: String::new(),
    }
}
