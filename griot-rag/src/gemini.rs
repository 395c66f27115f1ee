//! Gemini embedding provider using the `griot-gemini` crate.
//!
//! This module is only available when the `gemini` feature is enabled.

use async_trait::async_trait;
use tracing::{debug, error};

use griot_gemini::Gemini;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// An [`EmbeddingProvider`] backed by the Gemini embedding API.
///
/// Wraps a [`Gemini`] client and delegates to its `embedContent` and
/// `batchEmbedContents` endpoints.
pub struct GeminiEmbedder {
    client: Gemini,
}

impl GeminiEmbedder {
    /// Create a new provider from an existing [`Gemini`] client.
    pub fn new(client: Gemini) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Gemini", text_len = text.len(), "embedding single text");

        self.client.embed(text).await.map_err(|e| {
            error!(provider = "Gemini", error = %e, "embedding request failed");
            RagError::EmbeddingError { provider: "Gemini".into(), message: format!("{e}") }
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "Gemini", batch_size = texts.len(), "embedding batch");

        self.client.embed_batch(texts).await.map_err(|e| {
            error!(provider = "Gemini", error = %e, "batch embedding request failed");
            RagError::EmbeddingError { provider: "Gemini".into(), message: format!("{e}") }
        })
    }

    fn dimensions(&self) -> usize {
        Gemini::EMBEDDING_DIMENSIONS
    }
}
