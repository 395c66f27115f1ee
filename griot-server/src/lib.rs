//! # griot-server
//!
//! HTTP surface and answer composition for the Griot cultural heritage
//! question-answering service. The binary wires a corpus, an embedding
//! provider, and the in-memory vector store into an [`assistant::Assistant`]
//! served over REST.

pub mod assistant;
pub mod composer;
pub mod ingest;
pub mod rest;

pub use assistant::{Assistant, ChatOutcome, SourceRef};
pub use composer::{Composer, ConversationTurn};
pub use rest::{AppState, ServerConfig, app_router, run_server};
