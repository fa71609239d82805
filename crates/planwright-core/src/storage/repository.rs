//! Storage seam used by the generation pipeline

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use super::agent_runs::{AgentRunStore, NewAgentRun};
use super::database::Database;
use super::plans::PlanStore;
use crate::agent::{PlanAggregate, PlanStatus};
use crate::questionnaire::QuestionnaireInput;

/// Persistence failure. Always fatal to a generation run.
#[derive(Debug, Error)]
#[error("{0:#}")]
pub struct StorageError(#[from] anyhow::Error);

/// The three writes a generation run performs.
///
/// Calls are made sequentially; there is no transaction spanning them, so a
/// crash between `update_plan` and the last `record_agent_run` leaves the
/// run log short.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Insert a plan in `generating` state and return its ID.
    async fn create_plan(&self, input: &QuestionnaireInput) -> Result<String, StorageError>;

    async fn update_plan(&self, plan_id: &str, plan: &PlanAggregate) -> Result<(), StorageError>;

    async fn record_agent_run(&self, run: &NewAgentRun) -> Result<(), StorageError>;
}

/// Opens the SQLite database for each call.
#[derive(Debug, Clone)]
pub struct SqlitePlanRepository {
    db_path: PathBuf,
}

impl SqlitePlanRepository {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn open(&self) -> Result<Database, StorageError> {
        Ok(Database::new(&self.db_path)?)
    }
}

#[async_trait]
impl PlanRepository for SqlitePlanRepository {
    async fn create_plan(&self, input: &QuestionnaireInput) -> Result<String, StorageError> {
        let db = self.open()?;
        Ok(PlanStore::new(&db).create_plan(input, PlanStatus::Generating)?)
    }

    async fn update_plan(&self, plan_id: &str, plan: &PlanAggregate) -> Result<(), StorageError> {
        let db = self.open()?;
        Ok(PlanStore::new(&db).update_plan(plan_id, plan)?)
    }

    async fn record_agent_run(&self, run: &NewAgentRun) -> Result<(), StorageError> {
        let db = self.open()?;
        AgentRunStore::new(&db).record_run(run)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;
    use crate::agent::aggregate;
    use crate::agent::runner::RunResults;
    use crate::agent::test_support::sample_input;
    use crate::storage::agent_runs::RUN_STATUS_COMPLETE;

    #[tokio::test]
    async fn writes_are_visible_to_stores() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("repo.db");
        let repo = SqlitePlanRepository::new(&db_path);

        let plan_id = repo.create_plan(&sample_input()).await.unwrap();
        repo.update_plan(&plan_id, &aggregate(&RunResults::default(), "s".into()))
            .await
            .unwrap();
        let now = Utc::now();
        repo.record_agent_run(&NewAgentRun {
            plan_id: plan_id.clone(),
            agent_type: "Market Research".into(),
            status: RUN_STATUS_COMPLETE.into(),
            input: None,
            output: None,
            error: None,
            started_at: now,
            completed_at: now,
            duration_ms: 0,
        })
        .await
        .unwrap();

        let db = Database::new(&db_path).unwrap();
        let plan = PlanStore::new(&db).get_plan(&plan_id).unwrap().unwrap();
        assert_eq!(plan.status, PlanStatus::Complete);
        assert_eq!(AgentRunStore::new(&db).list_for_plan(&plan_id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unopenable_database_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the database file should be.
        let repo = SqlitePlanRepository::new(temp_dir.path());
        assert!(repo.create_plan(&sample_input()).await.is_err());
    }
}
