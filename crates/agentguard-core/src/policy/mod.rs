//! Versioned policy store and the rule evaluator (the PDP half).

pub mod rules;
pub mod seed;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::model::{Decision, Evaluation, Policy};
use crate::storage::store::Store;

#[derive(Clone)]
pub struct PolicyStore {
    store: Store,
}

#[derive(Debug, Clone)]
pub struct CreatedPolicy {
    pub version: String,
    pub created_at: String,
}

impl PolicyStore {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Persist a policy document. Assigns the next patch version when the
    /// document carries none, normalizes rules, and stamps `created_at`.
    pub fn create(&self, document: &Value) -> anyhow::Result<CreatedPolicy> {
        let version = match document.get("version").and_then(|v| v.as_str()) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => self.next_version()?,
        };

        let raw_rules = document.get("rules").cloned().unwrap_or(Value::Array(vec![]));
        let rules = Value::Array(rules::normalize(&raw_rules));

        let name = document
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("policy-{version}"));
        let created_by = document
            .get("created_by")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        let signature_placeholder = document
            .get("signature_placeholder")
            .and_then(|v| v.as_str())
            .unwrap_or("pending");

        let created_at = Utc::now().to_rfc3339();
        self.store.insert_policy(
            &version,
            &name,
            &rules.to_string(),
            created_by,
            signature_placeholder,
            &created_at,
        )?;
        tracing::info!(event = "policy_created", version = %version, name = %name);
        Ok(CreatedPolicy {
            version,
            created_at,
        })
    }

    /// All policies with `rules` rehydrated to structured JSON.
    pub fn list(&self) -> anyhow::Result<Vec<Policy>> {
        self.store.all_policies()
    }

    /// Delete by id; false means no such policy.
    pub fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let deleted = self.store.delete_policy(id)?;
        if deleted {
            tracing::info!(event = "policy_deleted", policy_id = id);
        }
        Ok(deleted)
    }

    /// Evaluate a request against the active policy. Reads the policy set
    /// fresh on every call; concurrent writers are picked up immediately.
    pub fn evaluate(
        &self,
        roles: &[String],
        tool_id: &str,
        params: &Map<String, Value>,
    ) -> anyhow::Result<Evaluation> {
        let Some(policy) = self.active_policy()? else {
            return Ok(Evaluation {
                decision: Decision::Block,
                version: None,
                reason: "no_policy".to_string(),
            });
        };

        let rule_list = policy.rules.as_array().cloned().unwrap_or_default();
        for rule in &rule_list {
            if !rules::rule_matches(rule, roles, tool_id, params) {
                continue;
            }
            let effect = rule.get("effect").and_then(|v| v.as_str()).unwrap_or("BLOCK");
            let decision = if effect == "ALLOW" {
                Decision::Allow
            } else {
                // Unrecognized effects fail closed.
                Decision::Block
            };
            let reason = rule
                .get("reason")
                .and_then(|v| v.as_str())
                .unwrap_or("rule_matched")
                .to_string();
            return Ok(Evaluation {
                decision,
                version: Some(policy.version.clone()),
                reason,
            });
        }

        Ok(Evaluation {
            decision: Decision::Block,
            version: Some(policy.version),
            reason: "no_rule_matched".to_string(),
        })
    }

    /// The single policy a given `evaluate` call runs against: greatest
    /// release triple wins, newest `created_at` breaks ties. Unparseable
    /// versions sort lowest.
    fn active_policy(&self) -> anyhow::Result<Option<Policy>> {
        let policies = self.store.all_policies()?;
        Ok(policies
            .into_iter()
            .max_by_key(|p| (version_key(&p.version), created_at_key(p.created_at.as_deref()))))
    }

    fn next_version(&self) -> anyhow::Result<String> {
        match self.store.max_version_lexicographic()? {
            None => Ok("1.0.0".to_string()),
            Some(latest) => {
                let parts: Vec<u64> = latest
                    .split('.')
                    .map(|p| p.parse::<u64>())
                    .collect::<Result<_, _>>()
                    .with_context(|| format!("cannot auto-version from '{latest}'"))?;
                anyhow::ensure!(
                    parts.len() == 3,
                    "cannot auto-version from '{latest}': expected M.m.p"
                );
                Ok(format!("{}.{}.{}", parts[0], parts[1], parts[2] + 1))
            }
        }
    }
}

/// Release triple parsed from a dotted version, `[0, 0, 0]` when the string
/// does not parse. Short versions like `"1.0"` pad with zeros.
fn version_key(version: &str) -> [u64; 3] {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() > 3 {
        return [0, 0, 0];
    }
    let mut key = [0u64; 3];
    for (i, part) in parts.iter().enumerate() {
        match part.parse::<u64>() {
            Ok(n) => key[i] = n,
            Err(_) => return [0, 0, 0],
        }
    }
    key
}

fn created_at_key(created_at: Option<&str>) -> Option<DateTime<Utc>> {
    created_at
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
