//! Executive summary synthesis
//!
//! Runs after the fan-out. Only successful sections feed the digest; the
//! prompt sees the first few hundred characters of each section's JSON.

use std::sync::Arc;

use tracing::debug;

use super::runner::RunResults;
use crate::ai::{GenerationError, TextGenerator};
use crate::constants::{ai::SUMMARY_MAX_TOKENS, plan::SUMMARY_DIGEST_CHARS};
use crate::questionnaire::QuestionnaireInput;

pub struct SummarySynthesizer {
    generator: Arc<dyn TextGenerator>,
    max_tokens: usize,
    digest_chars: usize,
}

impl SummarySynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_tokens: SUMMARY_MAX_TOKENS,
            digest_chars: SUMMARY_DIGEST_CHARS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// `key: <truncated json>...` per successful section, catalog order.
    pub fn build_digest(&self, results: &RunResults) -> String {
        results
            .successes()
            .filter_map(|result| {
                let data = result.data()?;
                let json = serde_json::to_string(data).ok()?;
                let head: String = json.chars().take(self.digest_chars).collect();
                Some(format!("{}: {}...", result.result_key, head))
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn build_prompt(&self, input: &QuestionnaireInput, results: &RunResults) -> String {
        format!(
            "Write an executive summary for this business plan:

Business Description: {description}
Business Model: {model}
Target Market: {market}

Section summaries:
{digest}

Write a compelling 2-3 paragraph executive summary that captures the business opportunity, strategy, and key financials. Be specific and use numbers where available.",
            description = input.business_description,
            model = input.business_model,
            market = input.target_market,
            digest = self.build_digest(results),
        )
    }

    /// One generation call over the digest. Called even when every section
    /// failed; the digest is then empty.
    pub async fn synthesize(
        &self,
        input: &QuestionnaireInput,
        results: &RunResults,
    ) -> Result<String, GenerationError> {
        let prompt = self.build_prompt(input, results);
        debug!(
            sections = results.successes().count(),
            prompt_chars = prompt.len(),
            "Requesting executive summary"
        );
        let text = self.generator.complete(&prompt, self.max_tokens).await?;
        Ok(text.trim().to_string())
    }
}
