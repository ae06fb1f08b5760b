//! Rule normalization and matching, operating on loosely-typed JSON rules.

use serde_json::{Map, Value};

/// Normalize a raw `rules` input into the stored form.
///
/// Accepts a JSON array or a JSON-encoded string of one (strings that fail
/// to parse become empty). Non-object entries are dropped; `tool` is copied
/// to `tool_id` when the latter is absent; input order is preserved.
pub fn normalize(raw: &Value) -> Vec<Value> {
    let items = match raw {
        Value::String(s) => serde_json::from_str::<Value>(s)
            .ok()
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default(),
        Value::Array(items) => items.clone(),
        _ => return Vec::new(),
    };

    let mut out = Vec::new();
    for item in items {
        let Value::Object(mut rule) = item else {
            continue;
        };
        if rule.contains_key("tool") && !rule.contains_key("tool_id") {
            let tool = rule["tool"].clone();
            rule.insert("tool_id".to_string(), tool);
        }
        out.push(Value::Object(rule));
    }
    out
}

/// A rule is a candidate when the caller's roles intersect the rule's roles
/// and the requested tool id is in the rule's normalized target set; it
/// fires when every condition matches.
pub fn rule_matches(
    rule: &Value,
    roles: &[String],
    tool_id: &str,
    params: &Map<String, Value>,
) -> bool {
    let rule_roles = rule
        .get("roles")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|r| r.as_str()).collect::<Vec<_>>())
        .unwrap_or_default();
    if !roles.iter().any(|r| rule_roles.contains(&r.as_str())) {
        return false;
    }

    let Some(rule_tool) = rule.get("tool_id").and_then(|v| v.as_str()) else {
        return false;
    };
    if !tool_targets(rule_tool, tool_id) {
        return false;
    }

    match_conditions(params, rule.get("conditions"))
}

/// Tool-id normalization: a rule written against `mcp:read_logs` also
/// matches a request for `read_logs`, and vice versa.
fn tool_targets(rule_tool: &str, tool_id: &str) -> bool {
    if tool_id == rule_tool {
        return true;
    }
    match rule_tool.strip_prefix("mcp:") {
        Some(bare) => tool_id == bare,
        None => false,
    }
}

fn match_conditions(params: &Map<String, Value>, conditions: Option<&Value>) -> bool {
    let Some(Value::Object(conditions)) = conditions else {
        return true;
    };
    for (key, expected) in conditions {
        let actual = params.get(key).unwrap_or(&Value::Null);
        match expected {
            Value::Object(matcher) => {
                if let Some(equals) = matcher.get("equals") {
                    if actual != equals {
                        return false;
                    }
                }
                if let Some(lte) = matcher.get("lte") {
                    // Non-numeric parameters (and absent ones) never satisfy
                    // a numeric upper bound.
                    let (Some(actual_n), Some(lte_n)) = (actual.as_f64(), lte.as_f64()) else {
                        return false;
                    };
                    if actual_n > lte_n {
                        return false;
                    }
                }
            }
            _ => {
                if actual != expected {
                    return false;
                }
            }
        }
    }
    true
}
