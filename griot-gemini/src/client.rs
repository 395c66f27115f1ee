//! HTTP client for the Gemini `generateContent` and embedding endpoints.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, error};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const EMBEDDING_MODEL: &str = "text-embedding-004";

/// Errors returned by the Gemini client.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// The HTTP request could not be sent or the connection failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success HTTP status.
    #[error("API error (HTTP {status}): {detail}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The response body, as far as it could be read.
        detail: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response contained no candidates or no text parts.
    #[error("response contained no candidates")]
    EmptyCandidates,
}

impl GeminiError {
    /// The HTTP status code associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            GeminiError::Api { status, .. } => Some(*status),
            GeminiError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this error is a connection-level failure.
    pub fn is_network(&self) -> bool {
        matches!(self, GeminiError::Request(e) if e.is_connect() || e.is_timeout())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn from_text(text: &str) -> Self {
        Self { parts: vec![Part { text: Some(text.to_string()) }] }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Content,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct GenerationResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerationResponse {
    /// Concatenate the text parts of the first candidate.
    pub(crate) fn into_text(self) -> Result<String, GeminiError> {
        let candidate = self.candidates.into_iter().next().ok_or(GeminiError::EmptyCandidates)?;
        let text: String =
            candidate.content.parts.into_iter().filter_map(|part| part.text).collect();
        if text.is_empty() {
            return Err(GeminiError::EmptyCandidates);
        }
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct EmbedContentRequest {
    pub model: String,
    pub content: Content,
}

impl EmbedContentRequest {
    fn new(text: &str) -> Self {
        Self { model: format!("models/{EMBEDDING_MODEL}"), content: Content::from_text(text) }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentEmbedding {
    pub values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbedContentResponse {
    pub embedding: ContentEmbedding,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchEmbedContentsRequest {
    pub requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchEmbedContentsResponse {
    #[serde(default)]
    pub embeddings: Vec<ContentEmbedding>,
}

/// A minimal Gemini API client.
///
/// Covers exactly the surface the Griot service needs: text generation
/// via `generateContent` and embeddings via `embedContent` /
/// `batchEmbedContents`. The API key is sent in the `x-goog-api-key`
/// header; the base URL can be overridden for tests.
#[derive(Debug, Clone)]
pub struct Gemini {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl Gemini {
    /// Dimensionality of `text-embedding-004` vectors.
    pub const EMBEDDING_DIMENSIONS: usize = 768;

    /// Create a client using the default `gemini-2.5-flash` model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_model(api_key, DEFAULT_MODEL)
    }

    /// Create a client using a specific generation model.
    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the base URL (used by tests against a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        if !self.base_url.ends_with('/') {
            self.base_url.push('/');
        }
        self
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, GeminiError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "sending Gemini request");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Gemini API returned an error");
            return Err(GeminiError::Api { status: status.as_u16(), detail });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Generate text for a prompt, returning the first candidate's text.
    pub async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        let request = GenerateContentRequest { contents: vec![Content::from_text(prompt)] };
        let path = format!("models/{}:generateContent", self.model);
        let response: GenerationResponse = self.post(&path, &request).await?;
        response.into_text()
    }

    /// Embed a single text with `text-embedding-004`.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, GeminiError> {
        let path = format!("models/{EMBEDDING_MODEL}:embedContent");
        let response: EmbedContentResponse =
            self.post(&path, &EmbedContentRequest::new(text)).await?;
        Ok(response.embedding.values)
    }

    /// Embed a batch of texts with `text-embedding-004`.
    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, GeminiError> {
        let request = BatchEmbedContentsRequest {
            requests: texts.iter().map(|text| EmbedContentRequest::new(text)).collect(),
        };
        let path = format!("models/{EMBEDDING_MODEL}:batchEmbedContents");
        let response: BatchEmbedContentsResponse = self.post(&path, &request).await?;
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}
