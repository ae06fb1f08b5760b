use agentguard_core::auditor::Auditor;
use agentguard_core::model::AuditRecord;
use agentguard_core::storage::store::Store;
use chrono::{Duration, Utc};
use serde_json::json;
use tokio::sync::watch;

fn store() -> Store {
    let store = Store::memory().unwrap();
    store.init_schema().unwrap();
    store
}

fn block_row(agent_id: &str, request_id: &str, created_at: String) -> AuditRecord {
    AuditRecord {
        id: None,
        request_id: request_id.to_string(),
        agent_id: agent_id.to_string(),
        roles: "reader".to_string(),
        tool_id: "mcp:read_logs".to_string(),
        tool_version: "1.0.0".to_string(),
        params_hash: json!({}),
        decision: "BLOCK".to_string(),
        reason: "no_rule_matched".to_string(),
        policy_version: Some("1.0.0".to_string()),
        created_at,
    }
}

#[test]
fn three_blocks_in_window_flag_an_anomaly() {
    let store = store();
    let now = Utc::now().to_rfc3339();
    for i in 0..3 {
        store
            .insert_audit(&block_row("agent-burst", &format!("req-{i}"), now.clone()))
            .unwrap();
    }

    let flagged = Auditor::new(store.clone()).scan().unwrap();
    assert_eq!(flagged, 1);

    let anomalies = store.list_anomalies().unwrap();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].agent_id, "agent-burst");
    assert!(anomalies[0].detail["blocks_last_minute"].as_i64().unwrap() >= 3);
}

#[test]
fn blocks_outside_the_window_do_not_count() {
    let store = store();
    let stale = (Utc::now() - Duration::seconds(120)).to_rfc3339();
    for i in 0..5 {
        store
            .insert_audit(&block_row("agent-stale", &format!("req-{i}"), stale.clone()))
            .unwrap();
    }

    assert_eq!(Auditor::new(store.clone()).scan().unwrap(), 0);
    assert!(store.list_anomalies().unwrap().is_empty());
}

#[test]
fn two_blocks_are_below_threshold() {
    let store = store();
    let now = Utc::now().to_rfc3339();
    for i in 0..2 {
        store
            .insert_audit(&block_row("agent-mild", &format!("req-{i}"), now.clone()))
            .unwrap();
    }

    assert_eq!(Auditor::new(store.clone()).scan().unwrap(), 0);
}

#[test]
fn offenders_are_grouped_by_agent() {
    let store = store();
    let now = Utc::now().to_rfc3339();
    for agent in ["agent-a", "agent-b"] {
        for i in 0..4 {
            store
                .insert_audit(&block_row(agent, &format!("req-{agent}-{i}"), now.clone()))
                .unwrap();
        }
    }

    assert_eq!(Auditor::new(store.clone()).scan().unwrap(), 2);
    let mut agents: Vec<String> = store
        .list_anomalies()
        .unwrap()
        .into_iter()
        .map(|a| a.agent_id)
        .collect();
    agents.sort();
    assert_eq!(agents, vec!["agent-a".to_string(), "agent-b".to_string()]);
}

#[tokio::test]
async fn shutdown_signal_stops_the_task() {
    let store = store();
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(Auditor::new(store).run(rx));

    tx.send(true).unwrap();
    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("auditor should exit after the shutdown signal")
        .unwrap();
}
