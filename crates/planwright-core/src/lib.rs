//! Planwright core library
//!
//! Turns a short business questionnaire into a persisted business plan:
//! - `agent` - Section catalog, concurrent fan-out, JSON extraction,
//!   executive summary synthesis and plan aggregation
//! - `ai` - Text-generation client (Anthropic Messages API)
//! - `storage` - SQLite persistence for plans and agent run logs
//! - `questionnaire` - Caller-supplied input and its validation rules
//!
//! ```text
//!  Questionnaire ──► AgentRunner ──(8 tasks)──► SummarySynthesizer
//!                        │                            │
//!                        ▼                            ▼
//!                  ProgressSink              PlanAggregator ──► PlanRepository
//! ```

pub mod agent;
pub mod ai;
pub mod config;
pub mod constants;
pub mod paths;
pub mod questionnaire;
pub mod storage;

pub use config::PlanwrightConfig;
pub use questionnaire::QuestionnaireInput;
