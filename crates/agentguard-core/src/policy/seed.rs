//! Demo policy seeding for fresh databases.

use chrono::Utc;
use serde_json::{json, Value};

use crate::storage::store::Store;

pub fn demo_rules() -> Value {
    json!([
        {
            "roles": ["reader"],
            "tool_id": "mcp:read_logs",
            "effect": "ALLOW",
            "conditions": {"limit": {"lte": 50}},
            "reason": "Reader access to logs"
        },
        {
            "roles": ["auditor"],
            "tool_id": "mcp:list_tools",
            "effect": "ALLOW",
            "conditions": {},
            "reason": "Auditor can list tools"
        },
        {
            "roles": ["policy_admin"],
            "tool_id": "mcp:modify_policy",
            "effect": "ALLOW",
            "conditions": {},
            "reason": "Policy admin privileges"
        }
    ])
}

/// Insert the demo policy into an empty store, recording it in the lazily
/// created `policy_version_history` table. A store that already holds any
/// policy is left untouched.
pub fn seed_demo_policy(store: &Store) -> anyhow::Result<()> {
    store.ensure_version_history_table()?;

    let existing = store.count_policies()?;
    if existing > 0 {
        tracing::debug!(existing, "policy seed skipped; policies already exist");
        return Ok(());
    }

    let version = "1.0.0";
    let now = Utc::now().to_rfc3339();
    let policy_id = store.insert_policy_with_history(
        version,
        "demo-autoseed-policy",
        &demo_rules().to_string(),
        "auto-seed",
        "approved",
        &now,
        "auto-seed demo policy",
    )?;
    tracing::debug!(policy_id, version, "policy seed inserted");
    Ok(())
}
