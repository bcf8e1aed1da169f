/// Append-only conversation log replayed to the model on every call.
///
/// Shape: exactly one system directive first, then strictly alternating
/// user (observation) and assistant (decision) turns. Turns are never edited
/// or removed for the lifetime of a session.
use serde::{Deserialize, Serialize};

use crate::errors::{GridZoomError, GridZoomResult};
use crate::llm::types::{ChatMessage, ContentPart, ImageUrl, MessageContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// Image reference (a `data:` URL) attached to user turns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Turn {
    fn to_message(&self) -> ChatMessage {
        let content = match &self.image {
            Some(url) => MessageContent::Parts(vec![
                ContentPart::Text { text: self.text.clone() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: url.clone() },
                },
            ]),
            None => MessageContent::Text(self.text.clone()),
        };
        ChatMessage {
            role: self.role.as_str().to_string(),
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn new(system_directive: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn {
                role: Role::System,
                text: system_directive.into(),
                image: None,
            }],
        }
    }

    /// Role the next appended turn must have.
    pub fn expected_role(&self) -> Role {
        match self.turns.last().map(|t| t.role) {
            Some(Role::User) => Role::Assistant,
            _ => Role::User,
        }
    }

    fn push(&mut self, turn: Turn) -> GridZoomResult<()> {
        let expected = self.expected_role();
        if turn.role != expected {
            return Err(GridZoomError::Conversation(format!(
                "expected a {} turn, got {}",
                expected.as_str(),
                turn.role.as_str()
            )));
        }
        self.turns.push(turn);
        Ok(())
    }

    pub fn append_user_turn(&mut self, text: impl Into<String>, image: Option<String>) -> GridZoomResult<()> {
        self.push(Turn {
            role: Role::User,
            text: text.into(),
            image,
        })
    }

    pub fn append_assistant_turn(&mut self, text: impl Into<String>) -> GridZoomResult<()> {
        self.push(Turn {
            role: Role::Assistant,
            text: text.into(),
            image: None,
        })
    }

    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always false: the system directive is present from construction.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Completed user/assistant exchanges.
    pub fn exchanges(&self) -> usize {
        (self.turns.len() - 1) / 2
    }

    /// Provider messages for the whole history.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        self.turns.iter().map(Turn::to_message).collect()
    }
}
