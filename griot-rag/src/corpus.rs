//! The document corpus: loading, accessors, and statistics.
//!
//! A corpus is a JSON array of [`CorpusDocument`]s produced by the corpus
//! builder. Documents are immutable after load; the query path only ever
//! reads them.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RagError, Result};

/// A single document chunk of the cultural corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorpusDocument {
    /// Numeric identifier assigned by the corpus builder.
    pub id: u64,
    /// Human-readable title derived from the source text.
    pub title: String,
    /// The text content of the chunk.
    pub content: String,
    /// Source reference, e.g. `guide_culturel.pdf - page 5`.
    pub source: String,
    /// Category label, e.g. `culture` or `architecture`.
    pub category: String,
    /// Number of words in `content`.
    pub word_count: usize,
    /// Free-form metadata recorded at ingestion time.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Aggregate statistics over a loaded corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorpusStats {
    /// Total number of document chunks.
    pub total_documents: usize,
    /// Number of chunks per category.
    pub categories: BTreeMap<String, usize>,
    /// Sorted, deduplicated source names (the part before the first ` - `).
    pub sources: Vec<String>,
}

/// An immutable, in-memory corpus of [`CorpusDocument`]s.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<CorpusDocument>,
}

impl Corpus {
    /// Load a corpus from a JSON file containing an array of documents.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::CorpusError`] if the file is missing or the JSON
    /// is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| RagError::CorpusError {
            path: path.display().to_string(),
            message: format!("failed to read corpus file: {e}"),
        })?;
        let documents: Vec<CorpusDocument> =
            serde_json::from_str(&data).map_err(|e| RagError::CorpusError {
                path: path.display().to_string(),
                message: format!("failed to parse corpus JSON: {e}"),
            })?;

        info!(path = %path.display(), document_count = documents.len(), "loaded corpus");
        Ok(Self { documents })
    }

    /// Load a corpus, keeping only the first `max` documents.
    ///
    /// Used by low-memory deployments where indexing the full corpus would
    /// exceed the available RAM.
    pub fn load_capped(path: impl AsRef<Path>, max: usize) -> Result<Self> {
        let mut corpus = Self::load(path)?;
        if corpus.documents.len() > max {
            warn!(
                total = corpus.documents.len(),
                max, "capping corpus size for low-memory deployment"
            );
            corpus.documents.truncate(max);
        }
        Ok(corpus)
    }

    /// Build a corpus directly from a vector of documents.
    pub fn from_documents(documents: Vec<CorpusDocument>) -> Self {
        Self { documents }
    }

    /// Number of documents in the corpus.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the corpus contains no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterate over the documents in load order.
    pub fn iter(&self) -> impl Iterator<Item = &CorpusDocument> {
        self.documents.iter()
    }

    /// Access a document by position.
    pub fn get(&self, index: usize) -> Option<&CorpusDocument> {
        self.documents.get(index)
    }

    /// Compute aggregate statistics over the corpus.
    ///
    /// Source names are truncated at their first ` - ` separator so that all
    /// pages of one file count as a single source.
    pub fn stats(&self) -> CorpusStats {
        let mut categories: BTreeMap<String, usize> = BTreeMap::new();
        let mut sources: BTreeSet<String> = BTreeSet::new();

        for doc in &self.documents {
            *categories.entry(doc.category.clone()).or_insert(0) += 1;
            let source = doc.source.split(" - ").next().unwrap_or("").trim();
            if !source.is_empty() {
                sources.insert(source.to_string());
            }
        }

        CorpusStats {
            total_documents: self.documents.len(),
            categories,
            sources: sources.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: u64, source: &str, category: &str) -> CorpusDocument {
        CorpusDocument {
            id,
            title: format!("Document {id}"),
            content: "Le balafon est un instrument de percussion.".to_string(),
            source: source.to_string(),
            category: category.to_string(),
            word_count: 7,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn stats_counts_categories_and_dedupes_sources() {
        let corpus = Corpus::from_documents(vec![
            doc(1, "guide.pdf - page 1", "culture"),
            doc(2, "guide.pdf - page 2", "culture"),
            doc(3, "habitat.pdf - page 1", "architecture"),
        ]);

        let stats = corpus.stats();
        assert_eq!(stats.total_documents, 3);
        assert_eq!(stats.categories.get("culture"), Some(&2));
        assert_eq!(stats.categories.get("architecture"), Some(&1));
        assert_eq!(stats.sources, vec!["guide.pdf", "habitat.pdf"]);
    }

    #[test]
    fn stats_skips_empty_sources() {
        let corpus = Corpus::from_documents(vec![doc(1, "", "culture")]);
        assert!(corpus.stats().sources.is_empty());
    }

    #[test]
    fn load_missing_file_is_a_corpus_error() {
        let err = Corpus::load("/nonexistent/corpus.json").unwrap_err();
        assert!(matches!(err, RagError::CorpusError { .. }));
    }

    #[test]
    fn load_and_cap_roundtrip() {
        let docs = vec![doc(1, "a.pdf - page 1", "culture"), doc(2, "b.pdf - page 1", "culture")];
        let path = std::env::temp_dir().join(format!("griot_corpus_{}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_string(&docs).unwrap()).unwrap();

        let corpus = Corpus::load(&path).unwrap();
        assert_eq!(corpus.len(), 2);

        let capped = Corpus::load_capped(&path, 1).unwrap();
        assert_eq!(capped.len(), 1);
        assert_eq!(capped.get(0).unwrap().id, 1);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn metadata_defaults_to_empty_map() {
        let json = r#"[{"id":1,"title":"T","content":"C","source":"s.pdf","category":"culture","word_count":1}]"#;
        let documents: Vec<CorpusDocument> = serde_json::from_str(json).unwrap();
        assert!(documents[0].metadata.is_empty());
    }
}
