//! Persistence layer
//!
//! SQLite-based storage for:
//! - Business plans (questionnaire, sections, confidence, summary)
//! - Per-task agent run logs

pub mod agent_runs;
mod database;
mod plans;
mod repository;

pub use agent_runs::{AgentRunRecord, AgentRunStore, NewAgentRun};
pub use database::Database;
pub use plans::{PlanRecord, PlanStore, PlanSummary, SECTION_COLUMNS};
pub use repository::{PlanRepository, SqlitePlanRepository, StorageError};
