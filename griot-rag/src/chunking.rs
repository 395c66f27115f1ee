//! Text preparation for the corpus builder.
//!
//! This module provides the pieces the builder composes into corpus
//! documents: whitespace cleanup, word-count chunking with overlap,
//! keyword categorisation, and title derivation.

use std::sync::LazyLock;

use regex::Regex;

/// Fragments at or below this word count are dropped by the chunker
/// (except a text that fits whole).
const MIN_FRAGMENT_WORDS: usize = 50;

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Collapse whitespace runs to single spaces and trim.
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RUNS.replace_all(text, " ").trim().to_string()
}

/// Splits text into chunks by word count with configurable overlap.
///
/// A text that fits within `max_words` is returned whole. Otherwise the
/// text is windowed with `max_words - overlap` words of stride, and
/// fragments of [`MIN_FRAGMENT_WORDS`] words or fewer are dropped.
#[derive(Debug, Clone)]
pub struct WordChunker {
    max_words: usize,
    overlap: usize,
}

impl WordChunker {
    /// Create a new `WordChunker`.
    ///
    /// # Arguments
    ///
    /// * `max_words` — maximum number of words per chunk
    /// * `overlap` — number of overlapping words between consecutive chunks
    pub fn new(max_words: usize, overlap: usize) -> Self {
        Self { max_words, overlap }
    }

    /// Split a text into word-count chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();

        if words.len() <= self.max_words {
            return vec![text.to_string()];
        }

        let stride = self.max_words.saturating_sub(self.overlap).max(1);
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + self.max_words).min(words.len());
            if end - start > MIN_FRAGMENT_WORDS {
                chunks.push(words[start..end].join(" "));
            }
            start += stride;
        }

        chunks
    }
}

impl Default for WordChunker {
    fn default() -> Self {
        Self::new(500, 50)
    }
}

/// Determine the category of a document from its filename and content.
///
/// Keyword rules, checked in order; the first match wins.
pub fn categorize(filename: &str, text: &str) -> &'static str {
    let filename = filename.to_lowercase();
    let text = text.to_lowercase();

    if filename.contains("architecture") || text.contains("construction") {
        "architecture"
    } else if filename.contains("pédagogique") || text.contains("éducation") {
        "éducation"
    } else if text.contains("culture") || text.contains("tradition") {
        "culture"
    } else if text.contains("santé") || text.contains("médical") {
        "santé"
    } else if filename.contains("technique") || text.contains("scientifique") {
        "science-tech"
    } else {
        "culture-générale"
    }
}

/// Derive a display title from a chunk's text.
///
/// Uses the first sentence when its length is between 10 and 100
/// characters, otherwise the first 10 words. Titles longer than 80
/// characters are cut at 77 with an ellipsis.
pub fn derive_title(text: &str) -> String {
    let first_sentence = text.split('.').next().unwrap_or("").trim();

    let title = if first_sentence.chars().count() > 10 && first_sentence.chars().count() < 100 {
        first_sentence.to_string()
    } else {
        text.split_whitespace().take(10).collect::<Vec<_>>().join(" ")
    };

    if title.chars().count() > 80 {
        let cut: String = title.chars().take(77).collect();
        format!("{cut}...")
    } else {
        title
    }
}
