//! The search index built for one uploaded document.

use super::{IndexEntry, MemoryVectorStore, SearchResult, VectorStore};
use crate::chunking::TextChunk;
use crate::embedding::Embedder;
use crate::error::{PustakaError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Summary of the document currently loaded into an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: Uuid,
    pub filename: String,
    /// Upload fingerprint; equal fingerprints mean the same file.
    pub fingerprint: u64,
    pub record_count: usize,
    pub chunk_count: usize,
    pub embedding_model: String,
    pub indexed_at: DateTime<Utc>,
}

/// Chunks of one document with their embeddings, searchable by query vector.
///
/// Rebuilt from scratch for every upload; never persisted.
pub struct SearchIndex {
    document: IndexedDocument,
    store: Arc<dyn VectorStore>,
}

impl SearchIndex {
    /// Embed every chunk and build an in-memory index over them.
    #[instrument(skip_all, fields(filename = %filename, chunks = chunks.len()))]
    pub async fn build(
        filename: &str,
        fingerprint: u64,
        record_count: usize,
        chunks: Vec<TextChunk>,
        embedder: &dyn Embedder,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(PustakaError::Index(format!("{} produced no chunks", filename)));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(PustakaError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry::new(chunk, embedding))
            .collect();

        let store = Arc::new(MemoryVectorStore::new());
        let chunk_count = store.upsert_batch(entries).await?;
        info!("Indexed {} chunks from {}", chunk_count, filename);

        Ok(Self {
            document: IndexedDocument {
                id: Uuid::new_v4(),
                filename: filename.to_string(),
                fingerprint,
                record_count,
                chunk_count,
                embedding_model: embedder.model().to_string(),
                indexed_at: Utc::now(),
            },
            store,
        })
    }

    pub fn document(&self) -> &IndexedDocument {
        &self.document
    }

    /// Return the `k` chunks closest to a query vector, best first.
    pub async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        self.store.search(query_embedding, k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::KeywordEmbedder;

    fn chunk(order: usize, content: &str) -> TextChunk {
        TextChunk {
            source: "facts.pdf".to_string(),
            record_index: order + 1,
            order,
            char_offset: 0,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_build_and_search() {
        let embedder = KeywordEmbedder::new(&["paris", "france", "berlin", "germany"]);
        let chunks = vec![
            chunk(0, "The capital of Germany is Berlin."),
            chunk(1, "The capital of France is Paris."),
        ];

        let index = SearchIndex::build("facts.pdf", 7, 2, chunks, &embedder).await.unwrap();
        assert_eq!(index.document().chunk_count, 2);
        assert_eq!(index.document().embedding_model, "keyword-test");

        let query = embedder.embed("capital of France").await.unwrap();
        let results = index.search(&query, 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].entry.chunk.content.contains("Paris"));
    }

    #[tokio::test]
    async fn test_empty_chunks_are_rejected() {
        let embedder = KeywordEmbedder::new(&["x"]);
        let result = SearchIndex::build("empty.pdf", 0, 0, Vec::new(), &embedder).await;
        assert!(matches!(result, Err(PustakaError::Index(_))));
    }
}
