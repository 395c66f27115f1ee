//! # griot-gemini
//!
//! Minimal Rust client for the Google Gemini API, covering the two
//! endpoints the Griot question-answering service uses:
//!
//! - `generateContent` for answer generation
//! - `embedContent` / `batchEmbedContents` for text embeddings
//!
//! Errors are typed ([`GeminiError`]) and expose the HTTP status code so
//! callers can classify failures (overloaded, quota, credentials).

mod client;

pub use client::{Gemini, GeminiError};
