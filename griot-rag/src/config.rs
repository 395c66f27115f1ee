//! Configuration for the retriever.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for indexing and search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Name of the vector store collection holding the corpus.
    pub collection: String,
    /// Number of results returned by a search.
    pub top_k: usize,
    /// Number of documents embedded and upserted per indexing batch.
    pub batch_size: usize,
    /// Minimum similarity score; results below it are filtered out.
    /// The default of `-1.0` (the cosine lower bound) keeps everything.
    pub similarity_threshold: f32,
    /// Upper bound on over-fetching when a category bias is active.
    pub fetch_cap: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            collection: "burkina_culture".to_string(),
            top_k: 3,
            batch_size: 10,
            similarity_threshold: -1.0,
            fetch_cap: 15,
        }
    }
}

impl RetrievalConfig {
    /// Create a new builder for constructing a [`RetrievalConfig`].
    pub fn builder() -> RetrievalConfigBuilder {
        RetrievalConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RetrievalConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetrievalConfigBuilder {
    config: RetrievalConfig,
}

impl RetrievalConfigBuilder {
    /// Set the vector store collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Set the number of results returned by a search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the indexing batch size.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set the minimum similarity threshold for filtering results.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the over-fetch cap used when a category bias is active.
    pub fn fetch_cap(mut self, cap: usize) -> Self {
        self.config.fetch_cap = cap;
        self
    }

    /// Build the [`RetrievalConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `top_k == 0` or `batch_size == 0`
    /// - `fetch_cap < top_k`
    /// - `collection` is empty
    pub fn build(self) -> Result<RetrievalConfig> {
        if self.config.collection.is_empty() {
            return Err(RagError::ConfigError("collection name must not be empty".to_string()));
        }
        if self.config.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.config.batch_size == 0 {
            return Err(RagError::ConfigError("batch_size must be greater than zero".to_string()));
        }
        if self.config.fetch_cap < self.config.top_k {
            return Err(RagError::ConfigError(format!(
                "fetch_cap ({}) must be at least top_k ({})",
                self.config.fetch_cap, self.config.top_k
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = RetrievalConfig::builder().build().unwrap();
        assert_eq!(config, RetrievalConfig::default());
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let err = RetrievalConfig::builder().top_k(0).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }

    #[test]
    fn fetch_cap_below_top_k_is_rejected() {
        let err = RetrievalConfig::builder().top_k(10).fetch_cap(5).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }
}
