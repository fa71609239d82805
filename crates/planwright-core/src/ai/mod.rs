//! AI provider layer
//!
//! The single integration seam with the external text-generation service.
//! Everything above this module only sees [`TextGenerator`].

pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;

pub use client::{AiClient, AiClientConfig};
pub use error::GenerationError;

/// Black-box `generate(prompt) -> text` contract.
///
/// Implementations may be slow (seconds) and may fail; callers do not retry.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send one user-role prompt and return the text of the first content block.
    async fn complete(&self, prompt: &str, max_tokens: usize) -> Result<String, GenerationError>;
}
