//! Per-task run log
//!
//! One row per task per generation, written after the plan itself.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;
use serde::Serialize;
use serde_json::Value;

use super::database::Database;

pub const RUN_STATUS_COMPLETE: &str = "complete";
pub const RUN_STATUS_ERROR: &str = "error";

/// A run to be logged.
#[derive(Debug, Clone)]
pub struct NewAgentRun {
    pub plan_id: String,
    /// Task display name
    pub agent_type: String,
    pub status: String,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRunRecord {
    pub id: String,
    pub plan_id: String,
    pub agent_type: String,
    pub status: String,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub duration_ms: Option<i64>,
}

pub struct AgentRunStore<'a> {
    db: &'a Database,
}

impl<'a> AgentRunStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append one run. Returns the run ID.
    pub fn record_run(&self, run: &NewAgentRun) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let input = run.input.as_ref().map(Value::to_string);
        let output = run.output.as_ref().map(Value::to_string);

        self.db.conn().execute(
            "INSERT INTO agent_runs (
                 id, plan_id, agent_type, status, input, output, error,
                 started_at, completed_at, duration_ms
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                run.plan_id,
                run.agent_type,
                run.status,
                input,
                output,
                run.error,
                run.started_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                run.completed_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                run.duration_ms as i64,
            ],
        )?;

        tracing::debug!(
            plan_id = %run.plan_id,
            agent = %run.agent_type,
            status = %run.status,
            "Recorded agent run"
        );
        Ok(id)
    }

    /// Runs for a plan in the order they were recorded.
    pub fn list_for_plan(&self, plan_id: &str) -> Result<Vec<AgentRunRecord>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT id, plan_id, agent_type, status, output, error,
                    started_at, completed_at, duration_ms
             FROM agent_runs
             WHERE plan_id = ?1
             ORDER BY rowid",
        )?;

        let rows = stmt.query_map([plan_id], |row| {
            let output: Option<String> = row.get(4)?;
            Ok(AgentRunRecord {
                id: row.get(0)?,
                plan_id: row.get(1)?,
                agent_type: row.get(2)?,
                status: row.get(3)?,
                output: output.and_then(|json| serde_json::from_str(&json).ok()),
                error: row.get(5)?,
                started_at: row.get(6)?,
                completed_at: row.get(7)?,
                duration_ms: row.get(8)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
