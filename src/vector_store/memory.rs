//! In-memory vector store implementation.
//!
//! Exact search over every entry; documents are small enough that no
//! approximate index is needed.

use super::{cosine_similarity, IndexEntry, SearchResult, VectorStore};
use crate::error::{PustakaError, Result};
use async_trait::async_trait;
use std::sync::RwLock;

/// In-memory vector store. Entries keep insertion order.
pub struct MemoryVectorStore {
    entries: RwLock<Vec<IndexEntry>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> PustakaError {
    PustakaError::Index("vector store lock poisoned".to_string())
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, entries: Vec<IndexEntry>) -> Result<usize> {
        let mut store = self.entries.write().map_err(|_| poisoned())?;

        if let (Some(existing), Some(incoming)) = (store.first(), entries.first()) {
            if existing.embedding.len() != incoming.embedding.len() {
                return Err(PustakaError::Index(format!(
                    "Embedding dimension mismatch: index has {}, got {}",
                    existing.embedding.len(),
                    incoming.embedding.len()
                )));
            }
        }

        let count = entries.len();
        store.extend(entries);
        Ok(count)
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;

        let mut results: Vec<SearchResult> = entries
            .iter()
            .map(|entry| SearchResult {
                score: cosine_similarity(query_embedding, &entry.embedding),
                entry: entry.clone(),
            })
            .collect();

        // Stable sort: equal scores keep document order.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }
}
