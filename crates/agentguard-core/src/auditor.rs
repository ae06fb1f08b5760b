//! Background auditor: derives anomaly rows from the audit log.
//!
//! One long-lived task scans for agents with at least [`BLOCK_THRESHOLD`]
//! BLOCK decisions inside the rolling window, emitting one anomaly row per
//! offender per cycle. Bursts are re-flagged on every cycle until they age
//! out of the window.

use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::sync::watch;

use crate::model::Anomaly;
use crate::storage::store::Store;

pub const SCAN_INTERVAL: Duration = Duration::from_secs(5);
pub const BLOCK_WINDOW_SECS: i64 = 60;
pub const BLOCK_THRESHOLD: u32 = 3;

pub struct Auditor {
    store: Store,
    interval: Duration,
    window_secs: i64,
    threshold: u32,
}

impl Auditor {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            interval: SCAN_INTERVAL,
            window_secs: BLOCK_WINDOW_SECS,
            threshold: BLOCK_THRESHOLD,
        }
    }

    /// Run until the shutdown channel fires. A cycle in progress when the
    /// signal arrives finishes before the task exits; scan failures are
    /// logged and the loop continues.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            event = "auditor_started",
            interval_secs = self.interval.as_secs(),
            window_secs = self.window_secs,
            threshold = self.threshold
        );
        let mut tick = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match self.scan() {
                        Ok(0) => {}
                        Ok(flagged) => {
                            tracing::info!(event = "anomalies_flagged", count = flagged);
                        }
                        Err(e) => {
                            tracing::warn!(event = "auditor_scan_failed", error = %e);
                        }
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        tracing::info!(event = "auditor_stopped");
    }

    /// One scan cycle: count recent BLOCKs per agent and insert an anomaly
    /// row for each agent at or over the threshold. Returns the number of
    /// anomalies written.
    pub fn scan(&self) -> anyhow::Result<usize> {
        let cutoff = (Utc::now() - chrono::Duration::seconds(self.window_secs)).to_rfc3339();
        let offenders = self.store.block_counts_since(&cutoff, self.threshold)?;
        if offenders.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().to_rfc3339();
        let batch: Vec<Anomaly> = offenders
            .into_iter()
            .map(|(agent_id, count)| Anomaly {
                id: None,
                agent_id,
                detail: json!({"blocks_last_minute": count}),
                created_at: now.clone(),
            })
            .collect();
        let flagged = batch.len();
        self.store.insert_anomalies(&batch)?;
        Ok(flagged)
    }
}
