//! Answer generation.

use super::context::{format_context_for_display, format_context_for_prompt};
use super::{ContextChunk, Translator};
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::language::InteractionLanguage;
use crate::llm::{ChatMessage, ChatModel};
use crate::vector_store::SearchIndex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Answers questions from the chunks of one indexed document.
pub struct RagEngine {
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn ChatModel>,
    translator: Translator,
    prompts: Prompts,
    top_k: usize,
}

impl RagEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn ChatModel>,
        prompts: Prompts,
        top_k: usize,
    ) -> Self {
        Self {
            translator: Translator::new(model.clone(), prompts.clone()),
            embedder,
            model,
            prompts,
            top_k: top_k.max(1),
        }
    }

    /// Number of chunks retrieved per question.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn set_top_k(&mut self, top_k: usize) {
        self.top_k = top_k.max(1);
    }

    /// Answer `question`, asked in `language`, from `index`.
    #[instrument(skip(self, index, question), fields(language = language.code(), top_k = self.top_k))]
    pub async fn answer(
        &self,
        index: &SearchIndex,
        question: &str,
        language: InteractionLanguage,
    ) -> Result<Answer> {
        info!("Answering question against {}", index.document().filename);

        let retrieval_query = if language.needs_translation() {
            self.translator
                .question_to_documents(question, language)
                .await?
                .into_text()
        } else {
            question.to_string()
        };
        debug!("Retrieval query: {}", retrieval_query);

        let query_embedding = self.embedder.embed(&retrieval_query).await?;
        let sources: Vec<ContextChunk> = index
            .search(&query_embedding, self.top_k)
            .await?
            .into_iter()
            .map(ContextChunk::from)
            .collect();
        debug!("Retrieved {} chunks:\n{}", sources.len(), format_context_for_display(&sources));

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context_for_prompt(&sources));
        vars.insert("question".to_string(), retrieval_query.clone());

        let messages = [
            ChatMessage::system(self.prompts.render_with_custom(&self.prompts.rag.system, &vars)),
            ChatMessage::user(self.prompts.render_with_custom(&self.prompts.rag.user, &vars)),
        ];
        let grounded = self.model.complete(&messages).await?;
        debug!("Generated answer from {} chunks", sources.len());

        let reply = if language.needs_translation() {
            self.translator
                .answer_to_language(grounded.as_str(), language)
                .await?
        } else {
            grounded
        };

        Ok(Answer {
            question: question.to_string(),
            retrieval_query,
            language,
            raw: reply.is_raw(),
            text: reply.into_text(),
            sources,
        })
    }
}

/// An answer in the interaction language, with the chunks it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// The question as the user asked it.
    pub question: String,
    /// The query used for retrieval (the question, translated if needed).
    pub retrieval_query: String,
    pub language: InteractionLanguage,
    /// The answer text.
    pub text: String,
    /// Whether `text` is a stringified model response rather than message text.
    pub raw: bool,
    /// Chunks retrieved for the question, best first.
    pub sources: Vec<ContextChunk>,
}
