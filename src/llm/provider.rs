use async_trait::async_trait;

use crate::errors::GridZoomResult;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse};

/// Unified LLM provider trait. New backends only need to implement this
/// trait and be registered in config.toml.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the provider's identifier (matches config.toml key).
    fn name(&self) -> &str;

    /// One non-streaming chat completion over the full message list.
    async fn chat(&self, messages: Vec<ChatMessage>, cfg: &CallConfig) -> GridZoomResult<LlmResponse>;
}
