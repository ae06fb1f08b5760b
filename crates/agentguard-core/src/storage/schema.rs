pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS policies (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  version TEXT UNIQUE,
  name TEXT,
  rules TEXT,
  created_by TEXT,
  signature_placeholder TEXT,
  created_at TEXT
);

CREATE TABLE IF NOT EXISTS audit_logs (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  request_id TEXT,
  agent_id TEXT,
  roles TEXT,
  tool_id TEXT,
  tool_version TEXT,
  params_hash TEXT,
  decision TEXT,
  reason TEXT,
  policy_version TEXT,
  created_at TEXT
);

CREATE TABLE IF NOT EXISTS tools (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  tool_id TEXT,
  version TEXT,
  definition TEXT,
  UNIQUE(tool_id, version)
);

CREATE TABLE IF NOT EXISTS anomalies (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  agent_id TEXT,
  detail TEXT,
  created_at TEXT
);
"#;

/// Created lazily on the first demo seed, not at bootstrap.
pub const VERSION_HISTORY_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS policy_version_history (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  policy_id INTEGER,
  version TEXT,
  detail TEXT,
  recorded_at TEXT
);
"#;
