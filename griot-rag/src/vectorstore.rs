//! Vector store trait and the passage types that flow through it.

use async_trait::async_trait;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata carried alongside a passage through indexing, so citations can
/// be produced without re-reading the corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassageMeta {
    /// Title of the originating document chunk.
    pub title: String,
    /// Source reference, e.g. `guide_culturel.pdf - page 5`.
    pub source: String,
    /// Category label, e.g. `culture` or `architecture`.
    pub category: String,
}

/// A passage stored in the vector store: text, metadata, and embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passage {
    /// Unique identifier within the collection (later upserts win).
    pub id: String,
    /// The text content of the passage.
    pub content: String,
    /// Citation metadata.
    pub meta: PassageMeta,
    /// The vector embedding for this passage's content.
    pub embedding: Vec<f32>,
}

/// A retrieved passage paired with a similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPassage {
    /// The text content of the matched passage.
    pub content: String,
    /// Citation metadata of the matched passage.
    pub meta: PassageMeta,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// A storage backend for vector embeddings with similarity search.
///
/// Implementations manage named collections of [`Passage`]s and support
/// upserting and searching by vector similarity. Persistence, if any, is
/// whatever the backend provides.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection. No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Upsert passages into a collection. Passages must have embeddings set.
    async fn upsert(&self, collection: &str, passages: &[Passage]) -> Result<()>;

    /// Search for the `top_k` most similar passages to the given embedding.
    ///
    /// Returns results ordered by descending similarity score.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPassage>>;
}
