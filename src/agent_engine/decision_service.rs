use std::sync::Arc;

use async_trait::async_trait;

use crate::agent_engine::conversation::ConversationState;
use crate::agent_engine::decision::{parse_decision, Decision};
use crate::errors::GridZoomResult;
use crate::llm::provider::LlmProvider;
use crate::llm::types::CallConfig;

/// One new observation for the model: the instruction text and the gridded frame.
#[derive(Debug, Clone)]
pub struct Observation {
    pub instruction: String,
    /// `data:image/png;base64,...`
    pub image_url: String,
}

/// Turns (history + observation) into the next decision.
///
/// Implementations take ownership of the conversation and hand back the
/// updated one; the controller adopts it as its new state. An unparseable
/// reply must surface as `GridZoomError::DecisionParse`.
#[async_trait]
pub trait DecisionService: Send + Sync {
    async fn decide(
        &self,
        conversation: ConversationState,
        observation: Observation,
    ) -> GridZoomResult<(Decision, ConversationState)>;
}

/// Decision service backed by a chat-completions provider.
pub struct LlmDecisionService {
    provider: Arc<dyn LlmProvider>,
    cfg: CallConfig,
}

impl LlmDecisionService {
    pub fn new(provider: Arc<dyn LlmProvider>, cfg: CallConfig) -> Self {
        Self { provider, cfg }
    }
}

#[async_trait]
impl DecisionService for LlmDecisionService {
    async fn decide(
        &self,
        mut conversation: ConversationState,
        observation: Observation,
    ) -> GridZoomResult<(Decision, ConversationState)> {
        conversation.append_user_turn(observation.instruction, Some(observation.image_url))?;

        // Full history replay on every call.
        let response = self.provider.chat(conversation.to_messages(), &self.cfg).await?;
        tracing::debug!(provider = %self.provider.name(), reply = %response.content, "model reply");

        conversation.append_assistant_turn(response.content.clone())?;
        let decision = parse_decision(&response.content)?;
        Ok((decision, conversation))
    }
}
