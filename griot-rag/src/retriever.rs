//! Retrieval orchestrator.
//!
//! The [`Retriever`] coordinates the delegated pieces of the pipeline:
//! embedding the corpus into a [`VectorStore`] in micro-batches, and
//! answering searches with category-aware filtering plus a broadened
//! recovery search for questions the primary search cannot serve.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::RetrievalConfig;
use crate::corpus::Corpus;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::query::{CategoryBias, detect_bias};
use crate::vectorstore::{Passage, PassageMeta, ScoredPassage, VectorStore};

/// General heritage terms used by the broadened recovery search.
const BROADENED_TERMS: &[&str] =
    &["Burkina Faso culture traditions", "histoire Burkina Faso", "patrimoine burkinabè"];

/// Coordinates embedding, indexing, and category-aware similarity search.
///
/// Construct one via [`Retriever::builder()`].
pub struct Retriever {
    config: RetrievalConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    /// Create a new [`RetrieverBuilder`].
    pub fn builder() -> RetrieverBuilder {
        RetrieverBuilder::default()
    }

    /// Return a reference to the retrieval configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Embed and upsert every corpus document into the vector store.
    ///
    /// Documents are processed in micro-batches of `batch_size` to bound
    /// peak memory on small deployments. Indexing is idempotent: passage
    /// IDs are derived as `doc_{id}` and later upserts win.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::RetrievalError`] if embedding or storage fails,
    /// naming the failing batch.
    pub async fn index_corpus(&self, corpus: &Corpus) -> Result<()> {
        let collection = &self.config.collection;
        self.store.create_collection(collection, self.embedder.dimensions()).await?;

        let documents: Vec<_> = corpus.iter().collect();
        for (batch_index, batch) in documents.chunks(self.config.batch_size).enumerate() {
            let texts: Vec<&str> = batch.iter().map(|doc| doc.content.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
                error!(batch_index, error = %e, "embedding failed during indexing");
                RagError::RetrievalError(format!("embedding failed for batch {batch_index}: {e}"))
            })?;

            let passages: Vec<Passage> = batch
                .iter()
                .zip(embeddings)
                .map(|(doc, embedding)| Passage {
                    id: format!("doc_{}", doc.id),
                    content: doc.content.clone(),
                    meta: PassageMeta {
                        title: doc.title.clone(),
                        source: doc.source.clone(),
                        category: doc.category.clone(),
                    },
                    embedding,
                })
                .collect();

            self.store.upsert(collection, &passages).await.map_err(|e| {
                error!(batch_index, error = %e, "upsert failed during indexing");
                RagError::RetrievalError(format!("upsert failed for batch {batch_index}: {e}"))
            })?;

            debug!(batch_index, batch_len = batch.len(), "indexed batch");
        }

        info!(collection, document_count = documents.len(), "corpus indexed");
        Ok(())
    }

    /// Search for the passages most relevant to a question.
    ///
    /// When a category bias is active the search over-fetches 3× `n` and
    /// then filters: a pure culture bias excludes `architecture`-category
    /// passages. The fetch size is capped at `fetch_cap` either way.
    /// Results below the similarity threshold are dropped. At most `n`
    /// passages are returned.
    pub async fn search(&self, question: &str, n: usize) -> Result<Vec<ScoredPassage>> {
        let bias = detect_bias(question);
        let n_fetch = if bias.is_active() { n * 3 } else { n }.min(self.config.fetch_cap);

        let query_embedding = self.embedder.embed(question).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            RagError::RetrievalError(format!("query embedding failed: {e}"))
        })?;

        let candidates =
            self.store.search(&self.config.collection, &query_embedding, n_fetch).await?;

        let mut results = Vec::with_capacity(n);
        for candidate in candidates {
            if candidate.score < self.config.similarity_threshold {
                continue;
            }
            if bias == CategoryBias::Culture && candidate.meta.category == "architecture" {
                continue;
            }
            results.push(candidate);
            if results.len() >= n {
                break;
            }
        }

        debug!(?bias, n_fetch, result_count = results.len(), "search completed");
        Ok(results)
    }

    /// Recovery tier: pool results for fixed general heritage terms.
    ///
    /// Used when the primary search returns nothing but an answer is still
    /// owed. Per-term failures are logged and skipped; an empty pool is not
    /// an error.
    pub async fn search_broadened(&self, n: usize) -> Result<Vec<ScoredPassage>> {
        let mut pooled = Vec::new();
        for term in BROADENED_TERMS {
            let embedding = match self.embedder.embed(term).await {
                Ok(embedding) => embedding,
                Err(e) => {
                    warn!(term, error = %e, "broadened term embedding failed");
                    continue;
                }
            };
            match self.store.search(&self.config.collection, &embedding, n).await {
                Ok(results) => pooled.extend(results),
                Err(e) => warn!(term, error = %e, "broadened search failed"),
            }
        }

        info!(pooled_count = pooled.len(), "broadened search completed");
        Ok(pooled)
    }
}

/// Builder for constructing a [`Retriever`].
#[derive(Default)]
pub struct RetrieverBuilder {
    config: Option<RetrievalConfig>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
}

impl RetrieverBuilder {
    /// Set the retrieval configuration.
    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector store backend.
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the [`Retriever`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<Retriever> {
        let config = self.config.unwrap_or_default();
        let embedder = self
            .embedder
            .ok_or_else(|| RagError::ConfigError("embedder is required".to_string()))?;
        let store =
            self.store.ok_or_else(|| RagError::ConfigError("store is required".to_string()))?;

        Ok(Retriever { config, embedder, store })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusDocument;
    use crate::embedding::HashEmbedder;
    use crate::inmemory::InMemoryStore;
    use std::collections::HashMap;

    fn doc(id: u64, content: &str, category: &str) -> CorpusDocument {
        CorpusDocument {
            id,
            title: format!("Document {id}"),
            content: content.to_string(),
            source: format!("doc{id}.pdf - page 1"),
            category: category.to_string(),
            word_count: content.split_whitespace().count(),
            metadata: HashMap::new(),
        }
    }

    fn retriever(top_k: usize) -> Retriever {
        Retriever::builder()
            .config(RetrievalConfig::builder().top_k(top_k).build().unwrap())
            .embedder(Arc::new(HashEmbedder::new(32)))
            .store(Arc::new(InMemoryStore::new()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn index_then_search_returns_at_most_n() {
        let retriever = retriever(2);
        let corpus = Corpus::from_documents(vec![
            doc(1, "Le balafon est un instrument de percussion.", "culture"),
            doc(2, "Les greniers en banco stockent le mil.", "architecture"),
            doc(3, "Le FESPACO est un festival de cinéma.", "culture"),
        ]);

        retriever.index_corpus(&corpus).await.unwrap();
        let results = retriever.search("instrument de musique", 2).await.unwrap();
        assert!(results.len() <= 2);
        assert!(!results.is_empty());
    }

    #[tokio::test]
    async fn culture_bias_excludes_architecture_passages() {
        let retriever = retriever(3);
        let corpus = Corpus::from_documents(vec![
            doc(1, "Le balafon accompagne les griots.", "culture"),
            doc(2, "Les cases en banco du pays lobi.", "architecture"),
        ]);

        retriever.index_corpus(&corpus).await.unwrap();
        // "griot" is a pure cultural keyword, so architecture is filtered.
        let results = retriever.search("parle-moi des griots", 3).await.unwrap();
        assert!(results.iter().all(|p| p.meta.category != "architecture"));
    }

    #[tokio::test]
    async fn mixed_bias_applies_no_exclusion() {
        let retriever = retriever(3);
        let corpus = Corpus::from_documents(vec![
            doc(1, "Le balafon accompagne les griots.", "culture"),
            doc(2, "Les cases en banco du pays lobi.", "architecture"),
        ]);

        retriever.index_corpus(&corpus).await.unwrap();
        let results = retriever.search("les masques et les maisons", 3).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn fetch_cap_bounds_an_unbiased_search() {
        let retriever = retriever(3);
        let docs: Vec<CorpusDocument> = (1..=20)
            .map(|i| doc(i, &format!("Texte numéro {i} sans mot-clé particulier."), "culture-générale"))
            .collect();
        retriever.index_corpus(&Corpus::from_documents(docs)).await.unwrap();

        // No bias keyword, n above the default fetch_cap of 15.
        let results = retriever.search("une question neutre", 20).await.unwrap();
        assert_eq!(results.len(), 15);
    }

    #[tokio::test]
    async fn indexing_is_idempotent() {
        let retriever = retriever(5);
        let corpus =
            Corpus::from_documents(vec![doc(1, "Le tissage traditionnel mossi.", "culture")]);

        retriever.index_corpus(&corpus).await.unwrap();
        retriever.index_corpus(&corpus).await.unwrap();

        let results = retriever.search("tissage", 5).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn broadened_search_pools_results() {
        let retriever = retriever(3);
        let corpus = Corpus::from_documents(vec![
            doc(1, "La culture burkinabè est riche.", "culture"),
            doc(2, "L'histoire du Burkina Faso.", "culture-générale"),
        ]);

        retriever.index_corpus(&corpus).await.unwrap();
        let pooled = retriever.search_broadened(2).await.unwrap();
        // Three terms, each returning up to 2 of the 2 stored passages.
        assert!(!pooled.is_empty());
        assert!(pooled.len() <= 6);
    }
}
