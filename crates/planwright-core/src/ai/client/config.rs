//! AI Client configuration

use std::time::Duration;

use crate::config::PlanwrightConfig;
use crate::constants;

/// Configuration for the AI client
#[derive(Debug, Clone)]
pub struct AiClientConfig {
    /// Model ID to use for API calls
    pub model: String,
    /// Optional base URL override (defaults to the Anthropic endpoint)
    pub base_url: Option<String>,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for AiClientConfig {
    fn default() -> Self {
        Self {
            model: constants::ai::DEFAULT_MODEL.to_string(),
            base_url: None,
            request_timeout: Duration::from_secs(constants::ai::REQUEST_TIMEOUT_SECS),
        }
    }
}

impl AiClientConfig {
    /// Get the API URL to use
    pub fn api_url(&self) -> String {
        match &self.base_url {
            Some(base) => base.clone(),
            None => constants::ai::DEFAULT_API_URL.to_string(),
        }
    }

    /// Build from the resolved application config.
    pub fn from_app_config(config: &PlanwrightConfig) -> Self {
        Self {
            model: config.model.clone(),
            base_url: Some(config.base_url.clone()),
            ..Default::default()
        }
    }
}
