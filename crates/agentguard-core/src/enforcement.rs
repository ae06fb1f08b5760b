//! The enforcement pipeline (the PEP half): registry lookup, signature
//! verification, parameter validation, policy evaluation, audit persistence.
//!
//! Every exit below structural validation writes exactly one audit row
//! before the outcome is returned, so a client that sees a decision can
//! assume the corresponding audit row is durable.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::canonical;
use crate::model::{AuditRecord, Decision, EnforcementRequest};
use crate::policy::PolicyStore;
use crate::registry::ToolRegistry;
use crate::signing;
use crate::storage::store::Store;

/// The response envelope, identical in shape for ALLOW and BLOCK.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionEnvelope {
    pub decision: Decision,
    pub policy_version: Option<String>,
    pub reason: String,
    pub request_hash: String,
}

#[derive(Debug)]
pub struct Outcome {
    pub envelope: DecisionEnvelope,
    /// HTTP status the wire surface should answer with.
    pub status: u16,
}

#[derive(Clone)]
pub struct EnforcementService {
    registry: ToolRegistry,
    policies: PolicyStore,
    store: Store,
}

impl EnforcementService {
    pub fn new(registry: ToolRegistry, policies: PolicyStore, store: Store) -> Self {
        Self {
            registry,
            policies,
            store,
        }
    }

    /// Run a structurally valid request through the fixed decision sequence.
    ///
    /// Errors out of here are infrastructure failures (the database refused
    /// a write); every policy-level outcome is data, not an error.
    pub fn enforce(&self, request: &EnforcementRequest) -> anyhow::Result<Outcome> {
        let tool = self.registry.get(&request.tool_id, &request.tool_version)?;
        let Some(tool) = tool else {
            tracing::debug!(
                tool_id = %request.tool_id,
                tool_version = %request.tool_version,
                "tool not found in registry"
            );
            return self.conclude(request, Decision::Block, None, "tool_not_found".into(), 404);
        };

        if !signing::verify_tool(&tool) {
            tracing::warn!(
                tool_id = %tool.id,
                tool_version = %tool.version,
                "stored tool definition failed signature verification"
            );
            return self.conclude(
                request,
                Decision::Block,
                None,
                "invalid_tool_signature".into(),
                403,
            );
        }

        if let Err(violation) = self
            .registry
            .schema_for(&request.tool_id)
            .validate(&request.params)
        {
            return self.conclude(
                request,
                Decision::Block,
                None,
                format!("schema_error:{violation}"),
                400,
            );
        }

        let evaluation =
            self.policies
                .evaluate(&request.agent_roles, &request.tool_id, &request.params)?;
        let status = match evaluation.decision {
            Decision::Allow => 200,
            Decision::Block => 403,
        };
        self.conclude(
            request,
            evaluation.decision,
            evaluation.version,
            evaluation.reason,
            status,
        )
    }

    /// Persist the audit row, then build the envelope. The insert commits
    /// before the decision leaves this function.
    fn conclude(
        &self,
        request: &EnforcementRequest,
        decision: Decision,
        policy_version: Option<String>,
        reason: String,
        status: u16,
    ) -> anyhow::Result<Outcome> {
        let record = AuditRecord {
            id: None,
            request_id: request.request_id.clone(),
            agent_id: request.agent_id.clone(),
            roles: request.agent_roles.join(","),
            tool_id: request.tool_id.clone(),
            tool_version: request.tool_version.clone(),
            params_hash: Value::Object(canonical::hash_params(&request.params)),
            decision: decision.as_str().to_string(),
            reason: reason.clone(),
            policy_version: policy_version.clone(),
            created_at: Utc::now().to_rfc3339(),
        };
        self.store.insert_audit(&record)?;

        let envelope = DecisionEnvelope {
            decision,
            policy_version,
            reason,
            request_hash: request_hash(request)?,
        };
        tracing::info!(
            event = "enforce_decision",
            request_id = %request.request_id,
            agent_id = %request.agent_id,
            tool_id = %request.tool_id,
            decision = decision.as_str(),
            reason = %envelope.reason,
            status
        );
        Ok(Outcome { envelope, status })
    }
}

/// Hex SHA-256 of the canonical (sorted-key) encoding of the request,
/// including the defaulted `tool_version`.
pub fn request_hash(request: &EnforcementRequest) -> anyhow::Result<String> {
    let value = serde_json::to_value(request)?;
    Ok(canonical::hash_value(&value))
}
