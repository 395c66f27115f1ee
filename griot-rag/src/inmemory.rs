//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryStore`], a zero-dependency vector store
//! backed by a `HashMap` protected by a `tokio::sync::RwLock`. Search is
//! brute-force cosine over all passages in the collection, which is ample
//! for a corpus of a few hundred chunks.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{RagError, Result};
use crate::vectorstore::{Passage, ScoredPassage, VectorStore};

/// An in-memory vector store using cosine similarity for search.
///
/// Collections are stored as nested `HashMap`s: collection name → passage
/// ID → passage. All operations are async-safe via `tokio::sync::RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, Passage>>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn create_collection(&self, name: &str, _dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn upsert(&self, collection: &str, passages: &[Passage]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| RagError::VectorStoreError {
            backend: "InMemory".to_string(),
            message: format!("collection '{collection}' does not exist"),
        })?;
        for passage in passages {
            store.insert(passage.id.clone(), passage.clone());
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPassage>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| RagError::VectorStoreError {
            backend: "InMemory".to_string(),
            message: format!("collection '{collection}' does not exist"),
        })?;

        let mut scored: Vec<ScoredPassage> = store
            .values()
            .map(|passage| ScoredPassage {
                content: passage.content.clone(),
                meta: passage.meta.clone(),
                score: cosine_similarity(&passage.embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let sim = cosine_similarity(&[2.0, 0.0], &[4.0, 0.0]);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn search_on_missing_collection_errors() {
        let store = InMemoryStore::new();
        let err = store.search("missing", &[1.0], 3).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStoreError { .. }));
    }

    #[tokio::test]
    async fn upsert_overwrites_same_id() {
        let store = InMemoryStore::new();
        store.create_collection("docs", 2).await.unwrap();

        let meta = crate::vectorstore::PassageMeta {
            title: "T".to_string(),
            source: "s.pdf".to_string(),
            category: "culture".to_string(),
        };
        let first = Passage {
            id: "doc_1".to_string(),
            content: "ancien".to_string(),
            meta: meta.clone(),
            embedding: vec![1.0, 0.0],
        };
        let second = Passage { content: "nouveau".to_string(), ..first.clone() };

        store.upsert("docs", &[first]).await.unwrap();
        store.upsert("docs", &[second]).await.unwrap();

        let results = store.search("docs", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "nouveau");
    }
}
