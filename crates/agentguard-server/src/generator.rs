//! Subprocess glue for the natural-language policy generator.
//!
//! The generator is an external program that prints a single JSON policy
//! document on stdout. It is never trusted to touch the database; its output
//! is validated here and handed back to the caller.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::ServerConfig;

/// The document contract the generator must satisfy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub id: String,
    pub version: String,
    pub name: String,
    pub created_by: String,
    pub created_at: String,
    pub description: String,
    pub rules: Vec<GeneratedRule>,
    pub assumptions: Vec<String>,
    pub examples: PolicyExamples,
    pub test_vectors: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedRule {
    pub id: String,
    pub roles: Vec<String>,
    pub tool: String,
    pub effect: String,
    pub conditions: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyExamples {
    pub allowed: Vec<String>,
    pub blocked: Vec<String>,
}

/// Run the configured generator command with `--nl <text> --model <model>`
/// appended. The error value is the structured payload the endpoint returns
/// under a 500.
pub async fn run_policy_generator(
    cfg: &ServerConfig,
    nl: &str,
    model: &str,
) -> Result<PolicyDocument, Value> {
    let Some((program, leading_args)) = cfg.generator_command.split_first() else {
        return Err(json!({"error": "generator_unconfigured"}));
    };

    let mut cmd = Command::new(program);
    cmd.args(leading_args)
        .arg("--nl")
        .arg(nl)
        .arg("--model")
        .arg(model)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // A timed-out generator is killed when the future is dropped.
        .kill_on_drop(true);

    tracing::debug!(program = %program, model = %model, "running policy generator");

    let output = match timeout(cfg.generator_timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(json!({
                "error": "generator_failed",
                "detail": format!("failed to spawn generator: {e}"),
            }));
        }
        Err(_) => {
            return Err(json!({
                "error": "timeout",
                "detail": format!(
                    "generator exceeded {}s",
                    cfg.generator_timeout.as_secs()
                ),
            }));
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        return Err(json!({
            "error": "generator_failed",
            "exit_code": output.status.code(),
            "stderr": truncate(&stderr, 2000),
            "stdout_preview": truncate(&stdout, 2000),
        }));
    }

    let raw: Value = match serde_json::from_str(&stdout) {
        Ok(v) => v,
        Err(e) => {
            return Err(json!({
                "error": "invalid_json",
                "detail": e.to_string(),
                "stdout": truncate(&stdout, 4000),
                "stderr": truncate(&stderr, 2000),
            }));
        }
    };

    let document: PolicyDocument = match serde_json::from_value(raw) {
        Ok(d) => d,
        Err(e) => {
            return Err(json!({
                "error": "invalid_policy_document",
                "detail": e.to_string(),
            }));
        }
    };
    if !is_iso_timestamp(&document.created_at) {
        return Err(json!({
            "error": "invalid_policy_document",
            "detail": "created_at is not an ISO-8601 timestamp",
        }));
    }

    Ok(document)
}

fn is_iso_timestamp(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || s.parse::<chrono::NaiveDateTime>().is_ok()
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_timestamps_with_and_without_offset() {
        assert!(is_iso_timestamp("2026-08-01T00:00:00+00:00"));
        assert!(is_iso_timestamp("2026-08-01T12:30:00Z"));
        assert!(is_iso_timestamp("2026-08-01T00:00:00"));
        assert!(!is_iso_timestamp("last tuesday"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("é‰b", 2), "é‰");
    }
}
