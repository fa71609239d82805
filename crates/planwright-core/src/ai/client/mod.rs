//! AI client for the Anthropic Messages API
//!
//! - `config` - Endpoint, model and request timeout
//! - `core` - HTTP plumbing shared by every call
//! - `simple` - Non-streaming single-prompt completion

mod config;
mod core;
mod simple;

pub use config::AiClientConfig;
pub use self::core::AiClient;
pub use simple::first_text_block;
