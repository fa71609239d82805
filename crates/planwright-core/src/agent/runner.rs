//! Concurrent section fan-out
//!
//! Every catalog task runs as its own tokio task. A failure or panic inside
//! one task becomes that task's `Failure` result and never touches the
//! others; `run` always returns one result per catalog entry.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::FutureExt;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use super::catalog::{self, TaskSpec};
use super::events::{ProgressEvent, ProgressSink};
use super::extract::{self, ExtractError};
use crate::ai::{GenerationError, TextGenerator};
use crate::constants::ai::SECTION_MAX_TOKENS;
use crate::questionnaire::QuestionnaireInput;

/// Why a single task produced no section.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TaskError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Extraction(#[from] ExtractError),
    #[error("task aborted unexpectedly: {0}")]
    Panicked(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Success {
        data: Map<String, Value>,
        confidence: f64,
    },
    Failure {
        error: TaskError,
    },
}

/// Outcome of one task, created exactly once per task per run.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub task_name: String,
    pub result_key: String,
    pub outcome: TaskOutcome,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Success { .. })
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        match &self.outcome {
            TaskOutcome::Success { data, .. } => Some(data),
            TaskOutcome::Failure { .. } => None,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match &self.outcome {
            TaskOutcome::Success { confidence, .. } => Some(*confidence),
            TaskOutcome::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match &self.outcome {
            TaskOutcome::Success { .. } => None,
            TaskOutcome::Failure { error } => Some(error.to_string()),
        }
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.started_at + chrono::Duration::milliseconds(self.duration_ms as i64)
    }
}

/// All task results of one run, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    results: Vec<TaskResult>,
}

impl RunResults {
    pub fn from_results(results: Vec<TaskResult>) -> Self {
        Self { results }
    }

    pub fn get(&self, result_key: &str) -> Option<&TaskResult> {
        self.results.iter().find(|r| r.result_key == result_key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.iter()
    }

    pub fn successes(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl IntoIterator for RunResults {
    type Item = TaskResult;
    type IntoIter = std::vec::IntoIter<TaskResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

/// Runs the section tasks against one questionnaire.
pub struct AgentRunner {
    generator: Arc<dyn TextGenerator>,
    catalog: Vec<TaskSpec>,
    max_tokens: usize,
}

impl AgentRunner {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            catalog: catalog::list().to_vec(),
            max_tokens: SECTION_MAX_TOKENS,
        }
    }

    pub fn with_catalog(mut self, catalog: Vec<TaskSpec>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Run every task concurrently and wait for all of them.
    ///
    /// Completion is reported through `sink` as it happens; the returned
    /// results are in catalog order regardless.
    pub async fn run(&self, input: Arc<QuestionnaireInput>, sink: &ProgressSink) -> RunResults {
        info!(tasks = self.catalog.len(), "Starting section fan-out");
        let run_started = Instant::now();

        // One slot per result key; tasks never write the same slot.
        let slots: Arc<DashMap<&'static str, TaskResult>> =
            Arc::new(DashMap::with_capacity(self.catalog.len()));

        let (launched, handles): (Vec<_>, Vec<_>) = self
            .catalog
            .iter()
            .map(|spec| {
                let spec = *spec;
                let started_at = Utc::now();
                let task = run_task(
                    spec,
                    Arc::clone(&self.generator),
                    Arc::clone(&input),
                    sink.clone(),
                    self.max_tokens,
                    started_at,
                );
                let slots = Arc::clone(&slots);
                let handle = tokio::spawn(async move {
                    let result = task.await;
                    slots.insert(spec.result_key, result);
                });
                ((spec, started_at), handle)
            })
            .unzip();

        let joined = futures::future::join_all(handles).await;

        // Panics are caught inside each task; this only sees tasks torn down
        // before they could record a result.
        for ((spec, started_at), joined) in launched.iter().zip(joined) {
            if let Err(join_error) = joined {
                let reason = if join_error.is_panic() {
                    "panicked"
                } else {
                    "cancelled"
                };
                warn!(agent = spec.name, reason, "Section task aborted");
                sink.emit(ProgressEvent::failed(spec.name)).await;
                slots.insert(
                    spec.result_key,
                    TaskResult {
                        task_name: spec.name.to_string(),
                        result_key: spec.result_key.to_string(),
                        outcome: TaskOutcome::Failure {
                            error: TaskError::Panicked(reason.to_string()),
                        },
                        started_at: *started_at,
                        duration_ms: elapsed_ms_since(*started_at),
                    },
                );
            }
        }

        let results: Vec<_> = launched
            .iter()
            .filter_map(|(spec, _)| slots.remove(spec.result_key).map(|(_, result)| result))
            .collect();

        let results = RunResults::from_results(results);
        info!(
            succeeded = results.successes().count(),
            failed = results.failure_count(),
            elapsed_ms = run_started.elapsed().as_millis() as u64,
            "Section fan-out finished"
        );
        results
    }
}

async fn run_task(
    spec: TaskSpec,
    generator: Arc<dyn TextGenerator>,
    input: Arc<QuestionnaireInput>,
    sink: ProgressSink,
    max_tokens: usize,
    started_at: DateTime<Utc>,
) -> TaskResult {
    sink.emit(ProgressEvent::started(spec.name)).await;
    info!(agent = spec.name, "Section task started");
    let timer = Instant::now();

    let produced = AssertUnwindSafe(produce_section(
        &spec,
        generator.as_ref(),
        &input,
        max_tokens,
    ))
    .catch_unwind()
    .await
    .unwrap_or_else(|payload| Err(TaskError::Panicked(panic_message(payload.as_ref()))));

    let outcome = match produced {
        Ok(data) => {
            let confidence = extract::confidence_of(&data);
            info!(
                agent = spec.name,
                confidence,
                elapsed_ms = timer.elapsed().as_millis() as u64,
                "Section task completed"
            );
            sink.emit(ProgressEvent::completed(spec.name, spec.result_key))
                .await;
            TaskOutcome::Success { data, confidence }
        }
        Err(error) => {
            warn!(
                agent = spec.name,
                error = %error,
                elapsed_ms = timer.elapsed().as_millis() as u64,
                "Section task failed"
            );
            sink.emit(ProgressEvent::failed(spec.name)).await;
            TaskOutcome::Failure { error }
        }
    };

    TaskResult {
        task_name: spec.name.to_string(),
        result_key: spec.result_key.to_string(),
        outcome,
        started_at,
        duration_ms: timer.elapsed().as_millis() as u64,
    }
}

async fn produce_section(
    spec: &TaskSpec,
    generator: &dyn TextGenerator,
    input: &QuestionnaireInput,
    max_tokens: usize,
) -> Result<Map<String, Value>, TaskError> {
    let prompt = spec.prompt(input);
    let raw = generator.complete(&prompt, max_tokens).await?;
    Ok(extract::extract(&raw)?)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked".to_string()
    }
}

fn elapsed_ms_since(started_at: DateTime<Utc>) -> u64 {
    (Utc::now() - started_at).num_milliseconds().max(0) as u64
}
