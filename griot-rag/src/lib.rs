//! # griot-rag
//!
//! Retrieval layer for the Griot cultural heritage question-answering
//! service: corpus model and loader, embedding-provider and vector-store
//! seams with an in-memory cosine backend, query classification
//! heuristics, and the retriever that ties them together.
//!
//! Embedding, nearest-neighbour search, and persistence are delegated to
//! the seams; nothing here implements an index of its own.

pub mod chunking;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod inmemory;
pub mod query;
pub mod retriever;
pub mod vectorstore;

pub use chunking::{WordChunker, categorize, clean_text, derive_title};
pub use config::{RetrievalConfig, RetrievalConfigBuilder};
pub use corpus::{Corpus, CorpusDocument, CorpusStats};
pub use embedding::{EmbeddingProvider, HashEmbedder};
pub use error::{RagError, Result};
#[cfg(feature = "gemini")]
pub use gemini::GeminiEmbedder;
pub use inmemory::InMemoryStore;
pub use query::{CategoryBias, QueryIntent, classify, detect_bias};
pub use retriever::{Retriever, RetrieverBuilder};
pub use vectorstore::{Passage, PassageMeta, ScoredPassage, VectorStore};
