//! Plan generation and retrieval endpoints

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::{Stream, StreamExt};

use planwright_core::agent::{progress_channel, PlanEvent, PlanPipeline, ProgressStream};
use planwright_core::constants::plan::{DEFAULT_LIST_LIMIT, PROGRESS_CHANNEL_BUFFER};
use planwright_core::storage::{
    AgentRunStore, Database, PlanRecord, PlanStore, SqlitePlanRepository,
};
use planwright_core::QuestionnaireInput;

use crate::error::AppError;
use crate::types::{AgentRunsResponse, ListPlansQuery, PlanListResponse};
use crate::AppState;

/// Build the plans router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_plans))
        .route("/generate", post(generate_plan))
        .route("/:id", get(get_plan))
        .route("/:id/runs", get(list_agent_runs))
}

/// Generate a plan, streaming progress as server-sent events.
///
/// Input is validated before the stream opens. The run continues to
/// completion even if the client disconnects.
async fn generate_plan(
    State(state): State<AppState>,
    Json(input): Json<QuestionnaireInput>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    input.validate()?;

    let generator = state.generator.clone().ok_or_else(|| {
        AppError::Unavailable("No API key configured for plan generation".to_string())
    })?;

    let pipeline = PlanPipeline::new(
        generator,
        Arc::new(SqlitePlanRepository::new(state.db_path.to_path_buf())),
        state.settings,
    );
    let progress = spawn_generation(pipeline, input, state.run_timeout);

    let stream = progress.into_stream().map(|event| Ok(to_sse_event(&event)));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Run the pipeline in the background under the time budget.
fn spawn_generation(
    pipeline: PlanPipeline,
    input: QuestionnaireInput,
    run_timeout: Duration,
) -> ProgressStream {
    let (sink, progress) = progress_channel(PROGRESS_CHANNEL_BUFFER);

    tokio::spawn(async move {
        // Failures are already on the stream as its terminal event
        if let Ok(plan_id) = pipeline
            .generate_with_timeout(input, &sink, run_timeout)
            .await
        {
            tracing::debug!(plan_id = %plan_id, "Generation stream finished");
        }
    });

    progress
}

fn to_sse_event(event: &PlanEvent) -> Event {
    Event::default()
        .json_data(event)
        .unwrap_or_else(|_| Event::default().data("error"))
}

/// List the most recent plans
async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<ListPlansQuery>,
) -> Result<Json<PlanListResponse>, AppError> {
    let db = Database::new(&state.db_path)?;
    let plans = PlanStore::new(&db).list_recent(query.limit.unwrap_or(DEFAULT_LIST_LIMIT))?;
    Ok(Json(PlanListResponse { plans }))
}

/// Get a plan with all stored sections
async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlanRecord>, AppError> {
    let db = Database::new(&state.db_path)?;
    let plan = PlanStore::new(&db)
        .get_plan(&id)?
        .ok_or_else(|| AppError::NotFound(format!("Plan {} not found", id)))?;
    Ok(Json(plan))
}

/// Per-task run log for a plan
async fn list_agent_runs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AgentRunsResponse>, AppError> {
    let db = Database::new(&state.db_path)?;
    let plan = PlanStore::new(&db)
        .get_plan(&id)?
        .ok_or_else(|| AppError::NotFound(format!("Plan {} not found", id)))?;
    let runs = AgentRunStore::new(&db).list_for_plan(&id)?;

    Ok(Json(AgentRunsResponse {
        plan_id: plan.id,
        status: plan.status,
        runs,
    }))
}
