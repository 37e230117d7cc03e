//! Translation between the interaction language and the documents' language.

use crate::config::Prompts;
use crate::error::{PustakaError, Result};
use crate::language::InteractionLanguage;
use crate::llm::{ChatMessage, ChatModel, ModelReply};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Translates questions and answers with the chat model.
///
/// Replies are used as-is: no retry, caching or validation.
pub struct Translator {
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
}

impl Translator {
    pub fn new(model: Arc<dyn ChatModel>, prompts: Prompts) -> Self {
        Self { model, prompts }
    }

    /// Translate a question from `from` into the documents' language.
    #[instrument(skip(self, question), fields(from = from.code()))]
    pub async fn question_to_documents(
        &self,
        question: &str,
        from: InteractionLanguage,
    ) -> Result<ModelReply> {
        let mut vars = HashMap::new();
        vars.insert("source_language".to_string(), from.name().to_string());
        vars.insert(
            "target_language".to_string(),
            InteractionLanguage::DOCUMENTS.name().to_string(),
        );
        vars.insert("text".to_string(), question.to_string());

        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.translation.question, &vars);
        self.send(prompt).await
    }

    /// Translate an answer into `to`.
    #[instrument(skip(self, answer), fields(to = to.code()))]
    pub async fn answer_to_language(
        &self,
        answer: &str,
        to: InteractionLanguage,
    ) -> Result<ModelReply> {
        let mut vars = HashMap::new();
        vars.insert("target_language".to_string(), to.name().to_string());
        vars.insert("text".to_string(), answer.to_string());

        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.translation.answer, &vars);
        self.send(prompt).await
    }

    async fn send(&self, prompt: String) -> Result<ModelReply> {
        let reply = self
            .model
            .complete(&[ChatMessage::user(prompt)])
            .await
            .map_err(|e| PustakaError::Translation(e.to_string()))?;
        debug!(raw = reply.is_raw(), "Translation received");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedChatModel;

    #[tokio::test]
    async fn test_question_prompt() {
        let model = Arc::new(ScriptedChatModel::new().reply("What is the capital of France?"));
        let translator = Translator::new(model.clone(), Prompts::default());

        let reply = translator
            .question_to_documents("ಫ್ರಾನ್ಸ್‌ನ ರಾಜಧಾನಿ ಯಾವುದು?", InteractionLanguage::Kannada)
            .await
            .unwrap();

        assert_eq!(reply.as_str(), "What is the capital of France?");
        assert_eq!(
            model.last_messages(),
            vec![
                "Translate the following Kannada question to English. Reply ONLY with the English translation:\n\nಫ್ರಾನ್ಸ್‌ನ ರಾಜಧಾನಿ ಯಾವುದು?"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_answer_prompt() {
        let model = Arc::new(ScriptedChatModel::new().reply("ಪ್ಯಾರಿಸ್"));
        let translator = Translator::new(model.clone(), Prompts::default());

        translator
            .answer_to_language("Paris", InteractionLanguage::Kannada)
            .await
            .unwrap();

        assert_eq!(
            model.last_messages(),
            vec![
                "Translate the following answer to Kannada. Reply ONLY with the Kannada translation:\n\nParis"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_raw_reply_is_passed_through() {
        let model = Arc::new(ScriptedChatModel::new().raw("Response { choices: [] }"));
        let translator = Translator::new(model, Prompts::default());

        let reply = translator
            .answer_to_language("Paris", InteractionLanguage::Kannada)
            .await
            .unwrap();
        assert!(reply.is_raw());
    }

    #[tokio::test]
    async fn test_model_failure_is_a_translation_error() {
        let model = Arc::new(ScriptedChatModel::new().fail("connection refused"));
        let translator = Translator::new(model, Prompts::default());

        let result = translator
            .question_to_documents("ಪ್ರಶ್ನೆ", InteractionLanguage::Kannada)
            .await;
        assert!(matches!(result, Err(PustakaError::Translation(_))));
    }
}
