//! Simple (non-streaming) API calls
//!
//! Every section prompt and the executive summary go through `call_simple`:
//! one user-role message in, the first content block out.

use async_trait::async_trait;
use tracing::debug;

use super::core::{transport_error, AiClient};
use crate::ai::error::GenerationError;
use crate::ai::types::{ContentBlock, MessagesRequest, MessagesResponse};
use crate::ai::TextGenerator;

/// Return the first content block's text, failing if it is anything else.
///
/// Later blocks are ignored even when they are text.
pub fn first_text_block(response: MessagesResponse) -> Result<String, GenerationError> {
    match response.content.into_iter().next() {
        Some(ContentBlock::Text { text }) => Ok(text),
        Some(ContentBlock::Other) => Err(GenerationError::UnexpectedResponseShape(
            "first content block is not text".to_string(),
        )),
        None => Err(GenerationError::UnexpectedResponseShape(
            "response has no content blocks".to_string(),
        )),
    }
}

impl AiClient {
    /// Make a simple non-streaming API call with a single user prompt.
    pub async fn call_simple(
        &self,
        prompt: &str,
        max_tokens: usize,
    ) -> Result<String, GenerationError> {
        let model = self.config().model.clone();
        let body = MessagesRequest::user_prompt(&model, max_tokens, prompt);

        debug!(
            model = %model,
            max_tokens,
            prompt_chars = prompt.len(),
            "Sending completion request"
        );

        let request = self.build_request(&self.config().api_url());
        let response = request.json(&body).send().await.map_err(transport_error)?;
        let response = self.handle_error_response(response).await?;

        let bytes = response.bytes().await.map_err(transport_error)?;
        let parsed: MessagesResponse = serde_json::from_slice(&bytes).map_err(|e| {
            GenerationError::UnexpectedResponseShape(format!("undecodable response body: {}", e))
        })?;

        if let Some(reason) = parsed.stop_reason.as_deref() {
            debug!(model = %model, stop_reason = reason, "Completion finished");
        }

        first_text_block(parsed)
    }
}

#[async_trait]
impl TextGenerator for AiClient {
    async fn complete(&self, prompt: &str, max_tokens: usize) -> Result<String, GenerationError> {
        self.call_simple(prompt, max_tokens).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ai::client::AiClientConfig;

    fn parse(value: serde_json::Value) -> MessagesResponse {
        serde_json::from_value(value).expect("response should deserialize")
    }

    #[test]
    fn first_text_block_returns_text() {
        let response = parse(json!({
            "content": [{"type": "text", "text": "{\"a\":1}"}],
            "stop_reason": "end_turn"
        }));
        assert_eq!(first_text_block(response).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn non_text_first_block_is_unexpected_shape() {
        let response = parse(json!({
            "content": [
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": "ignored"}
            ]
        }));
        assert!(matches!(
            first_text_block(response),
            Err(GenerationError::UnexpectedResponseShape(_))
        ));
    }

    #[test]
    fn empty_content_is_unexpected_shape() {
        let response = parse(json!({ "content": [] }));
        assert!(matches!(
            first_text_block(response),
            Err(GenerationError::UnexpectedResponseShape(_))
        ));
    }

    #[test]
    fn request_body_has_single_user_message() {
        let body = MessagesRequest::user_prompt("m", 4096, "hello");
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "m",
                "max_tokens": 4096,
                "messages": [{"role": "user", "content": "hello"}]
            })
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_upstream_error() {
        let config = AiClientConfig {
            base_url: Some("http://127.0.0.1:9/v1/messages".to_string()),
            request_timeout: std::time::Duration::from_secs(2),
            ..Default::default()
        };
        let client = AiClient::new(config, "sk-test".to_string());

        let result = client.complete("hello", 16).await;
        assert!(matches!(result, Err(GenerationError::Upstream { .. })));
    }
}
