//! Chat completions from a locally hosted model (Ollama) over the OpenAI-compatible API.

use super::{ChatMessage, ChatModel, ModelReply, Role};
use crate::config::Settings;
use crate::error::{PustakaError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    CreateChatCompletionResponse,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Chat model served by the local runtime.
pub struct LocalChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl LocalChatModel {
    /// Create a chat model from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::with_config(
            &settings.llm.base_url,
            &settings.llm.model,
            settings.llm.temperature,
            Duration::from_secs(settings.llm.timeout_secs),
        )
    }

    /// Create a chat model with a custom endpoint, model and temperature.
    pub fn with_config(
        base_url: &str,
        model: &str,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(base_url, timeout)?,
            model: model.to_string(),
            temperature,
        })
    }

    fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
        let built: ChatCompletionRequestMessage = match message.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(|e| PustakaError::Model(e.to_string()))?
                .into(),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(|e| PustakaError::Model(e.to_string()))?
                .into(),
        };
        Ok(built)
    }
}

/// Take the first choice's message text, or stringify the whole response.
pub(crate) fn reply_from_response(response: &CreateChatCompletionResponse) -> ModelReply {
    match response
        .choices
        .first()
        .and_then(|c| c.message.content.as_ref())
    {
        Some(text) => ModelReply::Text(text.clone()),
        None => {
            warn!("Model response had no message text; using the raw response");
            ModelReply::Raw(format!("{:?}", response))
        }
    }
}

#[async_trait]
impl ChatModel for LocalChatModel {
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ModelReply> {
        let request_messages = messages
            .iter()
            .map(Self::to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(request_messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| PustakaError::Model(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PustakaError::Model(format!("Failed to generate response: {}", e)))?;

        let reply = reply_from_response(&response);
        debug!("Model replied with {} characters", reply.as_str().len());
        Ok(reply)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
