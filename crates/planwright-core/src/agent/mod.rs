//! Plan generation agents
//!
//! - `catalog` - The eight analysis tasks and their prompt builders
//! - `runner` - Concurrent fan-out with per-task fault isolation
//! - `extract` - Pulls the JSON payload out of free-form model text
//! - `summary` - Executive summary over the successful sections
//! - `aggregate` - Folds everything into one plan record
//! - `events` - Progress events and the channel they travel on
//! - `pipeline` - End-to-end orchestration with persistence

pub mod aggregate;
pub mod catalog;
pub mod events;
pub mod extract;
pub mod pipeline;
pub mod runner;
pub mod summary;

pub use aggregate::{aggregate, PlanAggregate, PlanStatus};
pub use catalog::TaskSpec;
pub use events::{
    progress_channel, PlanEvent, ProgressEvent, ProgressKind, ProgressSink, ProgressStream,
};
pub use extract::ExtractError;
pub use pipeline::{GenerationSettings, PipelineError, PlanPipeline};
pub use runner::{AgentRunner, RunResults, TaskError, TaskOutcome, TaskResult};
pub use summary::SummarySynthesizer;
