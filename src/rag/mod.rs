//! Retrieval-grounded answering over the loaded document.
//!
//! Answers come only from retrieved chunks. Kannada questions are translated
//! into the documents' language before retrieval and the answer is translated
//! back afterwards.

pub mod context;
mod engine;
mod translate;

pub use context::{format_context_for_display, format_context_for_prompt};
pub use engine::{Answer, RagEngine};
pub use translate::Translator;

use crate::vector_store::SearchResult;
use serde::Serialize;

/// A retrieved chunk, as shown to the model and the user.
#[derive(Debug, Clone, Serialize)]
pub struct ContextChunk {
    /// Filename the chunk came from.
    pub source: String,
    /// Page (PDF) or body (DOCX) index, 1-based.
    pub record_index: usize,
    /// Position of the chunk in the document.
    pub order: usize,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        let chunk = result.entry.chunk;
        Self {
            source: chunk.source,
            record_index: chunk.record_index,
            order: chunk.order,
            content: chunk.content,
            score: result.score,
        }
    }
}
