//! End-to-end plan generation
//!
//! ```text
//! create plan ─► plan_created ─► fan-out ─► summary ─► aggregate
//!                                                         │
//!                 complete ◄── record runs ◄── update plan ┘
//! ```
//!
//! Task and summary failures degrade the plan; storage failures and an
//! exhausted time budget end the run with an `error` event.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use super::aggregate::aggregate;
use super::catalog::{EXECUTIVE_SUMMARY_KEY, EXECUTIVE_SUMMARY_NAME};
use super::events::{PlanEvent, ProgressEvent, ProgressSink};
use super::runner::{AgentRunner, RunResults, TaskOutcome};
use super::summary::SummarySynthesizer;
use crate::ai::TextGenerator;
use crate::config::PlanwrightConfig;
use crate::constants::ai::{SECTION_MAX_TOKENS, SUMMARY_MAX_TOKENS};
use crate::questionnaire::QuestionnaireInput;
use crate::storage::agent_runs::{RUN_STATUS_COMPLETE, RUN_STATUS_ERROR};
use crate::storage::{NewAgentRun, PlanRepository, StorageError};

/// Output budgets for one run.
#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub section_max_tokens: usize,
    pub summary_max_tokens: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            section_max_tokens: SECTION_MAX_TOKENS,
            summary_max_tokens: SUMMARY_MAX_TOKENS,
        }
    }
}

impl From<&PlanwrightConfig> for GenerationSettings {
    fn from(config: &PlanwrightConfig) -> Self {
        Self {
            section_max_tokens: config.section_max_tokens,
            summary_max_tokens: config.summary_max_tokens,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("generation timed out")]
    TimedOut,
}

pub struct PlanPipeline {
    generator: Arc<dyn TextGenerator>,
    repository: Arc<dyn PlanRepository>,
    settings: GenerationSettings,
}

impl PlanPipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        repository: Arc<dyn PlanRepository>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            generator,
            repository,
            settings,
        }
    }

    /// Generate, persist and report one plan. Returns the plan ID.
    ///
    /// The last event sent to `sink` is always `complete` or `error`.
    pub async fn generate(
        &self,
        input: QuestionnaireInput,
        sink: &ProgressSink,
    ) -> Result<String, PipelineError> {
        match self.run(input, sink).await {
            Ok(plan_id) => {
                sink.emit(PlanEvent::Complete {
                    plan_id: plan_id.clone(),
                })
                .await;
                Ok(plan_id)
            }
            Err(e) => {
                error!(error = %e, "Plan generation failed");
                sink.emit(PlanEvent::Error {
                    message: e.to_string(),
                })
                .await;
                Err(e)
            }
        }
    }

    /// `generate` under a wall-clock budget.
    ///
    /// On expiry the sink receives `error` and the plan stays `generating`.
    /// Section tasks already spawned are not cancelled.
    pub async fn generate_with_timeout(
        &self,
        input: QuestionnaireInput,
        sink: &ProgressSink,
        budget: Duration,
    ) -> Result<String, PipelineError> {
        match tokio::time::timeout(budget, self.generate(input, sink)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    timeout_ms = budget.as_millis() as u64,
                    "Plan generation exceeded its time budget"
                );
                let err = PipelineError::TimedOut;
                sink.emit(PlanEvent::Error {
                    message: err.to_string(),
                })
                .await;
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        input: QuestionnaireInput,
        sink: &ProgressSink,
    ) -> Result<String, PipelineError> {
        let plan_id = self.repository.create_plan(&input).await?;
        info!(plan_id = %plan_id, "Generating plan");
        sink.emit(PlanEvent::PlanCreated {
            plan_id: plan_id.clone(),
        })
        .await;

        let input = Arc::new(input);
        let results = AgentRunner::new(Arc::clone(&self.generator))
            .with_max_tokens(self.settings.section_max_tokens)
            .run(Arc::clone(&input), sink)
            .await;

        let summary = self.summarize(&input, &results, sink).await;
        let plan = aggregate(&results, summary);

        self.repository.update_plan(&plan_id, &plan).await?;
        self.record_runs(&plan_id, &results).await?;

        info!(
            plan_id = %plan_id,
            sections = plan.sections().len(),
            "Plan complete"
        );
        Ok(plan_id)
    }

    /// Summary failures leave the summary empty.
    async fn summarize(
        &self,
        input: &QuestionnaireInput,
        results: &RunResults,
        sink: &ProgressSink,
    ) -> String {
        sink.emit(ProgressEvent::started(EXECUTIVE_SUMMARY_NAME))
            .await;

        let synthesizer = SummarySynthesizer::new(Arc::clone(&self.generator))
            .with_max_tokens(self.settings.summary_max_tokens);
        match synthesizer.synthesize(input, results).await {
            Ok(summary) => {
                sink.emit(ProgressEvent::completed(
                    EXECUTIVE_SUMMARY_NAME,
                    EXECUTIVE_SUMMARY_KEY,
                ))
                .await;
                summary
            }
            Err(e) => {
                warn!(error = %e, "Executive summary failed; continuing without it");
                sink.emit(ProgressEvent::failed(EXECUTIVE_SUMMARY_NAME))
                    .await;
                String::new()
            }
        }
    }

    async fn record_runs(&self, plan_id: &str, results: &RunResults) -> Result<(), StorageError> {
        for result in results.iter() {
            let (status, output, error) = match &result.outcome {
                TaskOutcome::Success { data, .. } => {
                    (RUN_STATUS_COMPLETE, Some(Value::Object(data.clone())), None)
                }
                TaskOutcome::Failure { error } => (RUN_STATUS_ERROR, None, Some(error.to_string())),
            };

            self.repository
                .record_agent_run(&NewAgentRun {
                    plan_id: plan_id.to_string(),
                    agent_type: result.task_name.clone(),
                    status: status.to_string(),
                    input: None,
                    output,
                    error,
                    started_at: result.started_at,
                    completed_at: result.completed_at(),
                    duration_ms: result.duration_ms,
                })
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::agent::events::progress_channel;
    use crate::agent::test_support::{sample_input, Reply, ScriptedGenerator};
    use crate::agent::{PlanAggregate, PlanStatus};
    use crate::ai::GenerationError;
    use crate::storage::{AgentRunStore, Database, PlanStore, SqlitePlanRepository};

    const SUMMARY_PROMPT: &str = "Write an executive summary";

    /// Records writes in memory; each write can be made to fail.
    #[derive(Default)]
    struct MemoryRepository {
        fail_create: bool,
        fail_update: bool,
        /// Fail once this many runs are recorded.
        fail_record_after: Option<usize>,
        plans: Mutex<Vec<(String, Option<PlanAggregate>)>>,
        runs: Mutex<Vec<NewAgentRun>>,
    }

    #[async_trait]
    impl PlanRepository for MemoryRepository {
        async fn create_plan(&self, _input: &QuestionnaireInput) -> Result<String, StorageError> {
            if self.fail_create {
                return Err(anyhow::anyhow!("database is locked").into());
            }
            let mut plans = self.plans.lock().unwrap();
            let id = format!("plan-{}", plans.len() + 1);
            plans.push((id.clone(), None));
            Ok(id)
        }

        async fn update_plan(
            &self,
            plan_id: &str,
            plan: &PlanAggregate,
        ) -> Result<(), StorageError> {
            if self.fail_update {
                return Err(anyhow::anyhow!("disk full").into());
            }
            let mut plans = self.plans.lock().unwrap();
            if let Some(slot) = plans.iter_mut().find(|(id, _)| id == plan_id) {
                slot.1 = Some(plan.clone());
            }
            Ok(())
        }

        async fn record_agent_run(&self, run: &NewAgentRun) -> Result<(), StorageError> {
            let mut runs = self.runs.lock().unwrap();
            if self.fail_record_after.is_some_and(|limit| runs.len() >= limit) {
                return Err(anyhow::anyhow!("constraint failed").into());
            }
            runs.push(run.clone());
            Ok(())
        }
    }

    async fn collect(mut stream: crate::agent::ProgressStream) -> Vec<PlanEvent> {
        let mut events = Vec::new();
        while let Some(event) = stream.recv().await {
            events.push(event);
        }
        events
    }

    async fn generate(
        generator: ScriptedGenerator,
        repository: Arc<dyn PlanRepository>,
        input: QuestionnaireInput,
    ) -> (Result<String, PipelineError>, Vec<PlanEvent>) {
        let pipeline = PlanPipeline::new(
            Arc::new(generator),
            repository,
            GenerationSettings::default(),
        );
        let (sink, stream) = progress_channel(64);
        let result = pipeline.generate(input, &sink).await;
        drop(sink);
        (result, collect(stream).await)
    }

    fn sections_reply() -> ScriptedGenerator {
        ScriptedGenerator::new(Reply::Text(
            "```json\n{\"highlights\": [\"ok\"], \"confidence\": 0.9}\n```".into(),
        ))
    }

    #[tokio::test]
    async fn events_are_bracketed_by_created_and_complete() {
        let repository = Arc::new(MemoryRepository::default());
        let generator = ScriptedGenerator::new(Reply::Text(r#"{"confidence": 0.9}"#.into()))
            .on(SUMMARY_PROMPT, Reply::Text("Summary".into()));
        let (result, events) = generate(generator, repository.clone(), sample_input()).await;

        let plan_id = result.unwrap();
        assert_eq!(
            events.first(),
            Some(&PlanEvent::PlanCreated {
                plan_id: plan_id.clone()
            })
        );
        assert_eq!(events.last(), Some(&PlanEvent::Complete { plan_id }));
        assert!(events.contains(&PlanEvent::AgentComplete {
            agent: EXECUTIVE_SUMMARY_NAME.into(),
            section: EXECUTIVE_SUMMARY_KEY.into(),
        }));
        assert_eq!(repository.runs.lock().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn summary_failure_leaves_summary_empty() {
        let repository = Arc::new(MemoryRepository::default());
        let generator = ScriptedGenerator::new(Reply::Text(r#"{"confidence": 0.9}"#.into())).on(
            SUMMARY_PROMPT,
            Reply::Fail(GenerationError::upstream_status(529, "overloaded")),
        );
        let (result, events) = generate(generator, repository.clone(), sample_input()).await;

        assert!(result.is_ok());
        assert!(events.contains(&PlanEvent::AgentError {
            agent: EXECUTIVE_SUMMARY_NAME.into()
        }));
        let plans = repository.plans.lock().unwrap();
        let plan = plans[0].1.as_ref().unwrap();
        assert_eq!(plan.executive_summary(), "");
        assert_eq!(plan.sections().len(), 8);
    }

    #[tokio::test]
    async fn create_failure_sends_only_error() {
        let repository = Arc::new(MemoryRepository {
            fail_create: true,
            ..Default::default()
        });
        let generator = Arc::new(ScriptedGenerator::new(Reply::Text("{}".into())));
        let pipeline = PlanPipeline::new(
            generator.clone(),
            repository.clone(),
            GenerationSettings::default(),
        );
        let (sink, stream) = progress_channel(64);
        let result = pipeline.generate(sample_input(), &sink).await;
        drop(sink);
        let events = collect(stream).await;

        assert!(matches!(result, Err(PipelineError::Storage(_))));
        assert_eq!(
            events,
            vec![PlanEvent::Error {
                message: "database is locked".into()
            }]
        );
        assert_eq!(generator.calls(), 0);
        assert!(repository.runs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_failure_ends_with_error_event() {
        let repository = Arc::new(MemoryRepository {
            fail_update: true,
            ..Default::default()
        });
        let generator = ScriptedGenerator::new(Reply::Text("{}".into()));
        let (result, events) = generate(generator, repository.clone(), sample_input()).await;

        assert!(matches!(result, Err(PipelineError::Storage(_))));
        assert_eq!(
            events.last(),
            Some(&PlanEvent::Error {
                message: "disk full".into()
            })
        );
        assert!(repository.runs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_failure_leaves_run_log_short() {
        let repository = Arc::new(MemoryRepository {
            fail_record_after: Some(3),
            ..Default::default()
        });
        let generator = ScriptedGenerator::new(Reply::Text("{}".into()));
        let (result, events) = generate(generator, repository.clone(), sample_input()).await;

        assert!(matches!(result, Err(PipelineError::Storage(_))));
        assert!(matches!(events.first(), Some(PlanEvent::PlanCreated { .. })));
        assert_eq!(
            events.last(),
            Some(&PlanEvent::Error {
                message: "constraint failed".into()
            })
        );
        assert!(!events
            .iter()
            .any(|e| matches!(e, PlanEvent::Complete { .. })));

        let plans = repository.plans.lock().unwrap();
        assert_eq!(plans[0].1.as_ref().unwrap().sections().len(), 8);
        assert_eq!(repository.runs.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn failed_tasks_are_logged_with_error() {
        let repository = Arc::new(MemoryRepository::default());
        let generator = ScriptedGenerator::new(Reply::Text("{}".into()))
            .on("legal consultant", Reply::Text("Sorry, no.".into()));
        let (result, _) = generate(generator, repository.clone(), sample_input()).await;

        assert!(result.is_ok());
        let runs = repository.runs.lock().unwrap();
        let legal = runs
            .iter()
            .find(|r| r.agent_type == "Legal & Compliance")
            .unwrap();
        assert_eq!(legal.status, RUN_STATUS_ERROR);
        assert_eq!(legal.error.as_deref(), Some("No JSON found in response"));
        assert!(legal.output.is_none());
    }

    #[tokio::test]
    async fn dropped_consumer_does_not_fail_the_run() {
        let repository = Arc::new(MemoryRepository::default());
        let pipeline = PlanPipeline::new(
            Arc::new(ScriptedGenerator::new(Reply::Text("{}".into()))),
            repository.clone(),
            GenerationSettings::default(),
        );
        let (sink, stream) = progress_channel(1);
        drop(stream);

        assert!(pipeline.generate(sample_input(), &sink).await.is_ok());
        assert_eq!(repository.runs.lock().unwrap().len(), 8);
    }

    /// Never answers within a test's lifetime.
    struct Stalled;

    #[async_trait]
    impl TextGenerator for Stalled {
        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: usize,
        ) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("{}".to_string())
        }
    }

    #[tokio::test]
    async fn exhausted_budget_ends_with_timeout_error() {
        let repository = Arc::new(MemoryRepository::default());
        let pipeline = PlanPipeline::new(
            Arc::new(Stalled),
            repository.clone(),
            GenerationSettings::default(),
        );
        let (sink, stream) = progress_channel(64);

        let result = pipeline
            .generate_with_timeout(sample_input(), &sink, Duration::from_millis(100))
            .await;
        drop(sink);
        let events = collect(stream).await;

        assert!(matches!(result, Err(PipelineError::TimedOut)));
        assert!(matches!(events.first(), Some(PlanEvent::PlanCreated { .. })));
        assert_eq!(
            events.last(),
            Some(&PlanEvent::Error {
                message: "generation timed out".into()
            })
        );
        assert!(repository.plans.lock().unwrap()[0].1.is_none());
    }

    #[tokio::test]
    async fn budget_is_not_applied_to_fast_runs() {
        let repository = Arc::new(MemoryRepository::default());
        let pipeline = PlanPipeline::new(
            Arc::new(ScriptedGenerator::new(Reply::Text("{}".into()))),
            repository,
            GenerationSettings::default(),
        );
        let (sink, stream) = progress_channel(64);

        let plan_id = pipeline
            .generate_with_timeout(sample_input(), &sink, Duration::from_secs(5))
            .await
            .unwrap();
        drop(sink);

        assert_eq!(
            collect(stream).await.last(),
            Some(&PlanEvent::Complete { plan_id })
        );
    }

    // End to end against a real SQLite file.

    struct Stored {
        plan_id: String,
        events: Vec<PlanEvent>,
        db_path: std::path::PathBuf,
        _dir: TempDir,
    }

    async fn generate_into_sqlite(generator: ScriptedGenerator) -> Stored {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = dir.path().join("plans.db");
        let input = QuestionnaireInput {
            business_description: "Artisan bakery and coffee".to_string(),
            business_model: "retail".to_string(),
            target_market: "Young urban professionals".to_string(),
            location: "Portland".to_string(),
            location_type: "local".to_string(),
            investment_level: Some("medium".to_string()),
            timeline: None,
            unique_advantage: None,
        };
        assert_eq!(input.business_description.chars().count(), 25);
        input.validate().unwrap();

        let repository = Arc::new(SqlitePlanRepository::new(&db_path));
        let (result, events) = generate(generator, repository, input).await;

        Stored {
            plan_id: result.expect("generation should succeed"),
            events,
            db_path,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn sqlite_all_sections_succeed() {
        let stored = generate_into_sqlite(
            sections_reply().on(SUMMARY_PROMPT, Reply::Text("A strong local opportunity.".into())),
        )
        .await;

        let db = Database::new(&stored.db_path).unwrap();
        let plan = PlanStore::new(&db).get_plan(&stored.plan_id).unwrap().unwrap();

        assert_eq!(plan.sections.len(), 8);
        assert_eq!(plan.confidence.len(), 8);
        assert!(plan.confidence.values().all(|c| *c == 0.9));
        assert_eq!(
            plan.executive_summary.as_deref(),
            Some("A strong local opportunity.")
        );
        assert_eq!(plan.status, PlanStatus::Complete);

        let runs = AgentRunStore::new(&db).list_for_plan(&stored.plan_id).unwrap();
        assert_eq!(runs.len(), 8);
        assert!(runs.iter().all(|r| r.status == RUN_STATUS_COMPLETE));

        assert!(matches!(stored.events.last(), Some(PlanEvent::Complete { .. })));
    }

    #[tokio::test]
    async fn sqlite_one_upstream_failure_leaves_seven_sections() {
        let stored = generate_into_sqlite(
            sections_reply()
                .on(SUMMARY_PROMPT, Reply::Text("Summary of seven sections.".into()))
                .on(
                    "risk analyst",
                    Reply::Fail(GenerationError::upstream_status(529, "Overloaded")),
                ),
        )
        .await;

        let db = Database::new(&stored.db_path).unwrap();
        let plan = PlanStore::new(&db).get_plan(&stored.plan_id).unwrap().unwrap();

        assert_eq!(plan.sections.len(), 7);
        assert_eq!(plan.confidence.len(), 7);
        assert!(!plan.sections.contains_key("riskAnalysis"));
        assert!(!plan.confidence.contains_key("riskAnalysis"));
        assert!(!plan.executive_summary.unwrap_or_default().is_empty());
        assert_eq!(plan.status, PlanStatus::Complete);

        let runs = AgentRunStore::new(&db).list_for_plan(&stored.plan_id).unwrap();
        let risk = runs
            .iter()
            .find(|r| r.agent_type == "Risk Assessment")
            .unwrap();
        assert_eq!(risk.status, RUN_STATUS_ERROR);
        assert_eq!(risk.error.as_deref(), Some("HTTP 529: Overloaded"));

        assert!(stored.events.contains(&PlanEvent::AgentError {
            agent: "Risk Assessment".to_string()
        }));
    }

    #[tokio::test]
    async fn sqlite_summary_failure_still_completes() {
        let stored = generate_into_sqlite(sections_reply().on(
            SUMMARY_PROMPT,
            Reply::Fail(GenerationError::upstream("connection reset")),
        ))
        .await;

        let db = Database::new(&stored.db_path).unwrap();
        let plan = PlanStore::new(&db).get_plan(&stored.plan_id).unwrap().unwrap();

        assert_eq!(plan.executive_summary.as_deref(), Some(""));
        assert_eq!(plan.sections.len(), 8);
        assert_eq!(plan.status, PlanStatus::Complete);
        assert!(matches!(stored.events.last(), Some(PlanEvent::Complete { .. })));
    }
}
