//! `planwright generate` - run one plan generation without the server

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use planwright_core::agent::{progress_channel, GenerationSettings, PlanPipeline, ProgressStream};
use planwright_core::constants::plan::PROGRESS_CHANNEL_BUFFER;
use planwright_core::storage::SqlitePlanRepository;
use planwright_core::{PlanwrightConfig, QuestionnaireInput};

pub async fn run(config: PlanwrightConfig, input_path: &Path) -> Result<()> {
    let input = read_input(input_path)?;

    let Some(client) = planwright_server::create_ai_client(&config) else {
        bail!("ANTHROPIC_API_KEY is not set; cannot generate");
    };

    let pipeline = PlanPipeline::new(
        Arc::new(client),
        Arc::new(SqlitePlanRepository::new(config.db_path.clone())),
        GenerationSettings::from(&config),
    );
    let (sink, progress) = progress_channel(PROGRESS_CHANNEL_BUFFER);

    let printer = tokio::spawn(write_events(progress, std::io::stdout()));

    let outcome = pipeline
        .generate_with_timeout(input, &sink, config.run_timeout)
        .await;
    drop(sink);
    printer.await.context("event printer stopped")??;

    let plan_id = outcome.context("generation failed")?;
    tracing::info!(plan_id = %plan_id, "Plan saved");
    Ok(())
}

/// Parse and validate a questionnaire file.
pub fn read_input(path: &Path) -> Result<QuestionnaireInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let input: QuestionnaireInput = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    input
        .validate()
        .with_context(|| format!("invalid questionnaire in {}", path.display()))?;
    Ok(input)
}

/// Print each event as one JSON line.
async fn write_events(mut progress: ProgressStream, mut out: impl Write) -> Result<()> {
    while let Some(event) = progress.recv().await {
        writeln!(out, "{}", serde_json::to_string(&event)?)?;
        out.flush()?;
    }
    Ok(())
}
