//! Shared HTTP plumbing for the AI client

use reqwest::{Client, RequestBuilder, Response};
use tracing::warn;

use super::config::AiClientConfig;
use crate::ai::error::GenerationError;
use crate::ai::types::ErrorEnvelope;
use crate::constants;

/// Client for the Anthropic Messages API.
pub struct AiClient {
    http: Client,
    config: AiClientConfig,
    api_key: String,
}

impl AiClient {
    pub fn new(config: AiClientConfig, api_key: String) -> Self {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build configured HTTP client, using defaults: {}", e);
                Client::new()
            });

        Self {
            http,
            config,
            api_key,
        }
    }

    pub fn config(&self) -> &AiClientConfig {
        &self.config
    }

    /// POST request with auth and version headers applied.
    pub(crate) fn build_request(&self, url: &str) -> RequestBuilder {
        self.http
            .post(url)
            .header("content-type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", constants::ai::ANTHROPIC_VERSION)
    }

    /// Turn a non-2xx response into `GenerationError::Upstream`.
    pub(crate) async fn handle_error_response(
        &self,
        response: Response,
    ) -> Result<Response, GenerationError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| {
                if envelope.error.error_type.is_empty() {
                    envelope.error.message
                } else {
                    format!("{}: {}", envelope.error.error_type, envelope.error.message)
                }
            })
            .unwrap_or(body);

        Err(GenerationError::upstream_status(status.as_u16(), message))
    }
}

/// Classify a transport failure the way the rest of the crate reports it.
pub(crate) fn transport_error(err: reqwest::Error) -> GenerationError {
    let status = err.status().map(|s| s.as_u16());
    let message = if err.is_timeout() {
        format!("Request timeout: {}", err)
    } else if err.is_connect() {
        format!("Connection failed: {}", err)
    } else {
        format!("Request failed: {}", err)
    };

    GenerationError::Upstream { status, message }
}
