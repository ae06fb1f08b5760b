use crate::model::{Anomaly, AuditRecord, Policy};
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// The single shared handle to the SQLite database. Every component reads
/// and writes through this; nothing caches rows in memory across requests.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("failed to open sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }

    // --- policies ---

    pub fn insert_policy(
        &self,
        version: &str,
        name: &str,
        rules_json: &str,
        created_by: &str,
        signature_placeholder: &str,
        created_at: &str,
    ) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO policies (version, name, rules, created_by, signature_placeholder, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![version, name, rules_json, created_by, signature_placeholder, created_at],
        )
        .context("insert policy")?;
        Ok(conn.last_insert_rowid())
    }

    /// All policies, newest version string first (lexicographic, matching the
    /// listing order of the wire API; the evaluator does its own selection).
    pub fn all_policies(&self) -> anyhow::Result<Vec<Policy>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, version, name, rules, created_by, signature_placeholder, created_at
             FROM policies ORDER BY version DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            let rules_text: Option<String> = row.get(3)?;
            Ok(Policy {
                id: Some(row.get(0)?),
                version: row.get(1)?,
                name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                rules: rehydrate_rules(rules_text, row.get::<_, i64>(0)?),
                created_by: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                signature_placeholder: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                created_at: row.get(6)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn delete_policy(&self, id: i64) -> anyhow::Result<bool> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute("DELETE FROM policies WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    /// Lexicographically greatest stored version, used by auto-versioning.
    pub fn max_version_lexicographic(&self) -> anyhow::Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let v = conn
            .query_row(
                "SELECT version FROM policies ORDER BY version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(v)
    }

    pub fn count_policies(&self) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        let n = conn.query_row("SELECT COUNT(*) FROM policies", [], |r| r.get(0))?;
        Ok(n)
    }

    /// Demo-seed insert: the policy row and its version-history row land in
    /// one transaction. Assumes `ensure_version_history_table` already ran.
    pub fn insert_policy_with_history(
        &self,
        version: &str,
        name: &str,
        rules_json: &str,
        created_by: &str,
        signature_placeholder: &str,
        created_at: &str,
        history_detail: &str,
    ) -> anyhow::Result<i64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO policies (version, name, rules, created_by, signature_placeholder, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![version, name, rules_json, created_by, signature_placeholder, created_at],
        )?;
        let policy_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO policy_version_history (policy_id, version, detail, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![policy_id, version, history_detail, created_at],
        )?;
        tx.commit()?;
        Ok(policy_id)
    }

    pub fn ensure_version_history_table(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::VERSION_HISTORY_DDL)?;
        Ok(())
    }

    // --- tools ---

    /// Insert-if-absent keyed on (tool_id, version); repeated bootstraps are
    /// no-ops.
    pub fn insert_tool_if_absent(
        &self,
        tool_id: &str,
        version: &str,
        definition_json: &str,
    ) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO tools (tool_id, version, definition) VALUES (?1, ?2, ?3)",
            params![tool_id, version, definition_json],
        )
        .context("insert tool")?;
        Ok(())
    }

    pub fn get_tool_definition(
        &self,
        tool_id: &str,
        version: &str,
    ) -> anyhow::Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let def = conn
            .query_row(
                "SELECT definition FROM tools WHERE tool_id = ?1 AND version = ?2",
                params![tool_id, version],
                |row| row.get(0),
            )
            .optional()?;
        Ok(def)
    }

    pub fn list_tool_definitions(&self) -> anyhow::Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT definition FROM tools ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    // --- audit log ---

    pub fn insert_audit(&self, record: &AuditRecord) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO audit_logs (request_id, agent_id, roles, tool_id, tool_version, params_hash, decision, reason, policy_version, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.request_id,
                record.agent_id,
                record.roles,
                record.tool_id,
                record.tool_version,
                record.params_hash.to_string(),
                record.decision,
                record.reason,
                record.policy_version,
                record.created_at,
            ],
        )
        .context("insert audit row")?;
        Ok(())
    }

    pub fn recent_audit(&self, limit: u32) -> anyhow::Result<Vec<AuditRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, request_id, agent_id, roles, tool_id, tool_version, params_hash, decision, reason, policy_version, created_at
             FROM audit_logs ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            let params_text: String = row.get(6)?;
            Ok(AuditRecord {
                id: Some(row.get(0)?),
                request_id: row.get(1)?,
                agent_id: row.get(2)?,
                roles: row.get(3)?,
                tool_id: row.get(4)?,
                tool_version: row.get(5)?,
                params_hash: serde_json::from_str(&params_text)
                    .unwrap_or(Value::String(params_text)),
                decision: row.get(7)?,
                reason: row.get(8)?,
                policy_version: row.get(9)?,
                created_at: row.get(10)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Per-agent BLOCK counts since `cutoff` (ISO-8601; TEXT comparison works
    /// because every `created_at` is RFC 3339 UTC), thresholded in SQL.
    pub fn block_counts_since(
        &self,
        cutoff: &str,
        threshold: u32,
    ) -> anyhow::Result<Vec<(String, i64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT agent_id, COUNT(*) as cnt
             FROM audit_logs
             WHERE decision = 'BLOCK' AND created_at >= ?1
             GROUP BY agent_id
             HAVING cnt >= ?2",
        )?;
        let rows = stmt.query_map(params![cutoff, threshold], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    // --- anomalies ---

    /// One transaction per auditor scan cycle.
    pub fn insert_anomalies(&self, batch: &[Anomaly]) -> anyhow::Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        for anomaly in batch {
            tx.execute(
                "INSERT INTO anomalies (agent_id, detail, created_at) VALUES (?1, ?2, ?3)",
                params![anomaly.agent_id, anomaly.detail.to_string(), anomaly.created_at],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Row count for the dashboard; table names are allowlisted.
    pub fn count_rows(&self, table: &str) -> anyhow::Result<i64> {
        if !["policies", "tools", "audit_logs", "anomalies"].contains(&table) {
            anyhow::bail!("invalid table name for count_rows: {}", table);
        }
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let n: i64 = conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(n)
    }

    pub fn list_anomalies(&self) -> anyhow::Result<Vec<Anomaly>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, agent_id, detail, created_at FROM anomalies ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            let detail_text: String = row.get(2)?;
            Ok(Anomaly {
                id: Some(row.get(0)?),
                agent_id: row.get(1)?,
                detail: serde_json::from_str(&detail_text)
                    .unwrap_or(Value::String(detail_text)),
                created_at: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}

/// A stored `rules` blob that no longer parses degrades to `[]` so one bad
/// row cannot take down the read path.
fn rehydrate_rules(text: Option<String>, policy_id: i64) -> Value {
    match text {
        Some(s) if !s.trim().is_empty() => serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!(policy_id, error = %e, "failed to parse stored rules; treating as empty");
            Value::Array(vec![])
        }),
        _ => Value::Array(vec![]),
    }
}
