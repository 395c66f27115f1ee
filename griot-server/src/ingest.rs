//! The corpus builder: walk a directory of plain-text files and emit
//! corpus documents.
//!
//! Each `.txt`/`.md` file is cleaned, split into word-count chunks, and
//! turned into [`CorpusDocument`]s with a derived title and a keyword
//! category. Unreadable files are logged and skipped.

use std::collections::HashMap;
use std::path::Path;

use serde_json::json;
use tracing::{info, warn};
use walkdir::WalkDir;

use griot_rag::chunking::{WordChunker, categorize, clean_text, derive_title};
use griot_rag::corpus::CorpusDocument;

/// Files with fewer cleaned characters than this are skipped entirely.
const MIN_FILE_CHARS: usize = 50;

/// Build corpus documents from every `.txt` and `.md` file under `input`.
///
/// Files are visited in name order so document IDs are stable across runs.
pub fn build_corpus(
    input: &Path,
    max_words: usize,
    overlap: usize,
) -> anyhow::Result<Vec<CorpusDocument>> {
    let chunker = WordChunker::new(max_words, overlap);
    let mut documents = Vec::new();
    let mut next_id: u64 = 1;

    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
        if extension != "txt" && extension != "md" {
            continue;
        }
        let filename = entry.file_name().to_string_lossy().to_string();

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };

        let cleaned = clean_text(&raw);
        if cleaned.chars().count() < MIN_FILE_CHARS {
            warn!(file = %path.display(), "skipping near-empty file");
            continue;
        }

        let chunks = chunker.split(&cleaned);
        let multi_part = chunks.len() > 1;
        for (chunk_index, chunk) in chunks.iter().enumerate() {
            let mut title = derive_title(chunk);
            if multi_part {
                title.push_str(&format!(" (partie {})", chunk_index + 1));
            }

            let mut metadata = HashMap::new();
            metadata.insert("file".to_string(), json!(filename));
            metadata.insert("chunk_index".to_string(), json!(chunk_index));

            documents.push(CorpusDocument {
                id: next_id,
                title,
                content: chunk.clone(),
                source: filename.clone(),
                category: categorize(&filename, chunk).to_string(),
                word_count: chunk.split_whitespace().count(),
                metadata,
            });
            next_id += 1;
        }

        info!(file = %filename, chunk_count = chunks.len(), "processed file");
    }

    info!(document_count = documents.len(), "corpus built");
    Ok(documents)
}
