//! Splitting extracted text into overlapping chunks for embedding.

mod recursive;

pub use recursive::RecursiveCharacterChunker;

use crate::config::ChunkingSettings;
use crate::error::{PustakaError, Result};
use crate::ingest::ExtractedRecord;
use serde::{Deserialize, Serialize};

/// A bounded span of one record's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Filename the text came from.
    pub source: String,
    /// Index of the record (page) this chunk belongs to.
    pub record_index: usize,
    /// Position of this chunk across the whole document.
    pub order: usize,
    /// Offset of the first character within the record, in characters.
    pub char_offset: usize,
    /// Text content of this chunk.
    pub content: String,
}

/// Chunk size and overlap, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(PustakaError::Chunking(format!(
                "overlap ({}) must be smaller than a non-zero chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

impl TryFrom<&ChunkingSettings> for ChunkingConfig {
    type Error = PustakaError;

    fn try_from(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }
}

/// Trait for chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split records into chunks. The same input always yields the same output.
    fn chunk(&self, records: &[ExtractedRecord]) -> Vec<TextChunk>;
}
