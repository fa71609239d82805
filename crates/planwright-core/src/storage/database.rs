//! SQLite connection and schema

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// An open database with the schema applied.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS business_plans (
                    id TEXT PRIMARY KEY,
                    business_description TEXT NOT NULL,
                    business_model TEXT NOT NULL,
                    target_market TEXT NOT NULL,
                    location TEXT NOT NULL DEFAULT '',
                    location_type TEXT NOT NULL,
                    investment_level TEXT,
                    timeline TEXT,
                    unique_advantage TEXT,
                    executive_summary TEXT,
                    market_analysis TEXT,
                    competitive_analysis TEXT,
                    customer_analysis TEXT,
                    marketing_strategy TEXT,
                    operations_plan TEXT,
                    financial_projections TEXT,
                    risk_analysis TEXT,
                    legal_compliance TEXT,
                    status TEXT NOT NULL DEFAULT 'pending',
                    confidence TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    completed_at TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_business_plans_created
                    ON business_plans(created_at DESC);

                CREATE TABLE IF NOT EXISTS agent_runs (
                    id TEXT PRIMARY KEY,
                    plan_id TEXT NOT NULL REFERENCES business_plans(id) ON DELETE CASCADE,
                    agent_type TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'running',
                    input TEXT,
                    output TEXT,
                    error TEXT,
                    started_at TEXT NOT NULL,
                    completed_at TEXT,
                    duration_ms INTEGER
                );

                CREATE INDEX IF NOT EXISTS idx_agent_runs_plan
                    ON agent_runs(plan_id);",
            )
            .context("failed to run migrations")?;
        Ok(())
    }
}
