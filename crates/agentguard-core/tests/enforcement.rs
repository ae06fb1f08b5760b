use agentguard_core::enforcement::{request_hash, EnforcementService};
use agentguard_core::model::{Decision, EnforcementRequest};
use agentguard_core::policy::PolicyStore;
use agentguard_core::registry::ToolRegistry;
use agentguard_core::storage::store::Store;
use serde_json::{json, Value};

fn service() -> (EnforcementService, Store) {
    let store = Store::memory().unwrap();
    store.init_schema().unwrap();
    let registry = ToolRegistry::bootstrap(store.clone()).unwrap();
    let policies = PolicyStore::new(store.clone());
    let service = EnforcementService::new(registry, policies, store.clone());
    (service, store)
}

fn seed_reader_policy(store: &Store) {
    PolicyStore::new(store.clone())
        .create(&json!({
            "name": "test-policy",
            "version": "1.0.0",
            "rules": [{
                "roles": ["reader"],
                "tool_id": "mcp:read_logs",
                "effect": "ALLOW",
                "conditions": {"limit": {"lte": 10}},
                "reason": "reader-allow"
            }],
            "created_by": "tests"
        }))
        .unwrap();
}

fn request(agent_id: &str, tool_id: &str, params: Value, request_id: &str) -> EnforcementRequest {
    serde_json::from_value(json!({
        "agent_id": agent_id,
        "agent_roles": ["reader"],
        "tool_id": tool_id,
        "tool_version": "1.0.0",
        "params": params,
        "request_id": request_id,
    }))
    .unwrap()
}

fn audit_rows_for(store: &Store, request_id: &str) -> Vec<agentguard_core::model::AuditRecord> {
    store
        .recent_audit(200)
        .unwrap()
        .into_iter()
        .filter(|r| r.request_id == request_id)
        .collect()
}

#[test]
fn allow_request() {
    let (service, store) = service();
    seed_reader_policy(&store);

    let req = request("agent1", "mcp:read_logs", json!({"limit": 5}), "req-allow");
    let outcome = service.enforce(&req).unwrap();

    assert_eq!(outcome.status, 200);
    assert_eq!(outcome.envelope.decision, Decision::Allow);
    assert_eq!(outcome.envelope.policy_version.as_deref(), Some("1.0.0"));
    assert_eq!(outcome.envelope.reason, "reader-allow");

    let rows = audit_rows_for(&store, "req-allow");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].decision, "ALLOW");
    assert_eq!(rows[0].roles, "reader");
    assert_eq!(rows[0].policy_version.as_deref(), Some("1.0.0"));
}

#[test]
fn schema_rejection_blocks_before_policy() {
    let (service, store) = service();
    seed_reader_policy(&store);

    let req = request("agent2", "mcp:read_logs", json!({"limit": 5073}), "req-bad-schema");
    let outcome = service.enforce(&req).unwrap();

    assert_eq!(outcome.status, 400);
    assert_eq!(outcome.envelope.decision, Decision::Block);
    assert!(outcome.envelope.reason.starts_with("schema_error:"));
    assert_eq!(outcome.envelope.policy_version, None);

    let rows = audit_rows_for(&store, "req-bad-schema");
    assert_eq!(rows.len(), 1);
    assert!(rows[0].reason.starts_with("schema_error:"));
}

#[test]
fn unknown_tool_is_audited_404() {
    let (service, store) = service();
    seed_reader_policy(&store);

    let req = request("agent3", "unknown", json!({}), "req-unknown");
    let outcome = service.enforce(&req).unwrap();

    assert_eq!(outcome.status, 404);
    assert_eq!(outcome.envelope.reason, "tool_not_found");

    let rows = audit_rows_for(&store, "req-unknown");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].decision, "BLOCK");
}

#[test]
fn no_policy_blocks_with_null_version() {
    let (service, store) = service();

    let req = request("agent4", "mcp:read_logs", json!({"limit": 5}), "req-no-policy");
    let outcome = service.enforce(&req).unwrap();

    assert_eq!(outcome.status, 403);
    assert_eq!(outcome.envelope.reason, "no_policy");
    assert_eq!(outcome.envelope.policy_version, None);
    assert_eq!(audit_rows_for(&store, "req-no-policy").len(), 1);
}

#[test]
fn omitted_tool_version_defaults_to_1_0_and_misses_catalog() {
    let (service, store) = service();
    seed_reader_policy(&store);

    // The catalog ships "1.0.0"; the request default is "1.0".
    let req: EnforcementRequest = serde_json::from_value(json!({
        "agent_id": "agent5",
        "agent_roles": ["reader"],
        "tool_id": "mcp:read_logs",
        "params": {"limit": 5},
        "request_id": "req-default-version",
    }))
    .unwrap();
    assert_eq!(req.tool_version, "1.0");

    let outcome = service.enforce(&req).unwrap();
    assert_eq!(outcome.status, 404);
    assert_eq!(outcome.envelope.reason, "tool_not_found");

    let rows = audit_rows_for(&store, "req-default-version");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].tool_version, "1.0");
}

#[test]
fn tampered_signature_blocks_403() {
    let (service, store) = service();
    seed_reader_policy(&store);

    // A definition whose signature was not produced by the current secret.
    let definition = json!({
        "id": "mcp:rogue_tool",
        "version": "1.0.0",
        "description": "Definition with a forged signature",
        "input_schema": {},
        "example_calls": [],
        "signature": "deadbeef"
    });
    store
        .insert_tool_if_absent("mcp:rogue_tool", "1.0.0", &definition.to_string())
        .unwrap();

    let req = request("agent6", "mcp:rogue_tool", json!({}), "req-forged");
    let outcome = service.enforce(&req).unwrap();

    assert_eq!(outcome.status, 403);
    assert_eq!(outcome.envelope.reason, "invalid_tool_signature");
    assert_eq!(audit_rows_for(&store, "req-forged").len(), 1);
}

#[test]
fn request_hash_is_deterministic() {
    let (service, store) = service();
    seed_reader_policy(&store);

    let a = request("agent7", "mcp:read_logs", json!({"limit": 5, "extra": "x"}), "req-hash");
    let b = request("agent7", "mcp:read_logs", json!({"extra": "x", "limit": 5}), "req-hash");

    let out_a = service.enforce(&a).unwrap();
    let out_b = service.enforce(&b).unwrap();
    assert_eq!(out_a.envelope.request_hash, out_b.envelope.request_hash);
    assert_eq!(out_a.envelope.request_hash, request_hash(&a).unwrap());

    // Both runs were audited independently.
    assert_eq!(audit_rows_for(&store, "req-hash").len(), 2);
}

#[test]
fn params_hash_covers_each_parameter_independently() {
    let (service, store) = service();
    seed_reader_policy(&store);

    let req = request("agent8", "mcp:read_logs", json!({"limit": 5}), "req-params-hash");
    service.enforce(&req).unwrap();

    let rows = audit_rows_for(&store, "req-params-hash");
    let hashes = rows[0].params_hash.as_object().unwrap();
    assert_eq!(hashes.len(), 1);
    assert_eq!(
        hashes["limit"].as_str().unwrap(),
        agentguard_core::canonical::hash_value(&json!(5))
    );
}
