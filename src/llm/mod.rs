//! Chat model access.
//!
//! Whether a reply carried a text field or had to be stringified is decided
//! here, at the client boundary, and surfaced as [`ModelReply`].

mod local;

pub use local::LocalChatModel;

use crate::error::Result;
use async_trait::async_trait;

/// Who sent a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

/// One message sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    /// The response's message text.
    Text(String),
    /// The whole response, stringified, when it carried no message text.
    Raw(String),
}

impl ModelReply {
    pub fn as_str(&self) -> &str {
        match self {
            ModelReply::Text(s) | ModelReply::Raw(s) => s,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ModelReply::Text(s) | ModelReply::Raw(s) => s,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, ModelReply::Raw(_))
    }
}

/// Trait for chat-completion models.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send a conversation and return the reply.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ModelReply>;

    /// Name of the model.
    fn model(&self) -> &str;
}
