//! The assistant orchestrator and response formatting.
//!
//! [`Assistant::ask`] runs the per-request pipeline: greeting
//! short-circuit → intent classification → (conditional) similarity
//! search → answer composition → source citation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use griot_rag::corpus::Corpus;
use griot_rag::error::Result;
use griot_rag::query::{QueryIntent, classify};
use griot_rag::retriever::Retriever;

use crate::composer::{Composer, ConversationTurn};

/// Canned reply for an exact greeting; no search or model call is made.
const GREETING_ANSWER: &str = "Bonjour ! 👋 Je suis Griot, votre assistant culturel sur le \
    Burkina Faso. Comment puis-je vous aider aujourd'hui ? 😊";

/// How many citations are attached to an answer.
const MAX_SOURCES: usize = 3;

/// A source citation surfaced in chat responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRef {
    /// Title of the cited document chunk.
    pub title: String,
    /// Source reference, e.g. `guide_culturel.pdf - page 5`.
    pub source: String,
    /// Category label of the cited chunk.
    pub category: String,
}

/// The result of one question: answer text plus structured citations.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    /// The question as asked.
    pub question: String,
    /// The final answer text, with a sources block appended when
    /// citations exist.
    pub answer: String,
    /// Structured citations (at most three), empty unless a knowledge
    /// search ran and returned passages.
    pub sources: Vec<SourceRef>,
}

/// The indexed question-answering assistant shared across requests.
pub struct Assistant {
    corpus: Corpus,
    retriever: Arc<Retriever>,
    composer: Composer,
}

impl Assistant {
    /// Create an assistant over an already-indexed retriever.
    pub fn new(corpus: Corpus, retriever: Arc<Retriever>, composer: Composer) -> Self {
        Self { corpus, retriever, composer }
    }

    /// The corpus backing this assistant.
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Answer a question.
    ///
    /// The answer is always non-empty. Sources are attached only when the
    /// question warranted a knowledge search and the search returned
    /// passages.
    ///
    /// # Errors
    ///
    /// Returns an error only when the similarity search itself fails;
    /// composition never fails.
    pub async fn ask(
        &self,
        question: &str,
        n_results: usize,
        use_llm: bool,
        history: &[ConversationTurn],
    ) -> Result<ChatOutcome> {
        let intent = classify(question);
        debug!(?intent, history_len = history.len(), "classified question");

        if intent == QueryIntent::Greeting {
            return Ok(ChatOutcome {
                question: question.to_string(),
                answer: GREETING_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let needs_search = intent == QueryIntent::KnowledgeLookup;
        let passages = if needs_search {
            self.retriever.search(question, n_results).await?
        } else {
            Vec::new()
        };

        let answer =
            self.composer.compose(question, &passages, history, &self.retriever, use_llm).await;

        let sources: Vec<SourceRef> = if needs_search {
            passages
                .iter()
                .take(MAX_SOURCES)
                .map(|passage| SourceRef {
                    title: passage.meta.title.clone(),
                    source: passage.meta.source.clone(),
                    category: passage.meta.category.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let answer = if sources.is_empty() {
            answer.trim().to_string()
        } else {
            let lines: Vec<String> =
                sources.iter().map(|source| format!("- {}", source.source)).collect();
            format!("{}\n\n\n📚 Sources :\n\n{}", answer.trim(), lines.join("\n"))
        };

        info!(needs_search, source_count = sources.len(), "question answered");
        Ok(ChatOutcome { question: question.to_string(), answer, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use griot_rag::config::RetrievalConfig;
    use griot_rag::corpus::CorpusDocument;
    use griot_rag::embedding::HashEmbedder;
    use griot_rag::inmemory::InMemoryStore;
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

    async fn assistant() -> Assistant {
        let corpus = Corpus::from_documents(vec![
            doc(1, "Le balafon est un instrument de percussion mélodique joué par les griots.", "culture"),
            doc(2, "Les greniers en banco protègent les récoltes de mil et de sorgho.", "architecture"),
        ]);
        let retriever = Arc::new(
            Retriever::builder()
                .config(RetrievalConfig::default())
                .embedder(Arc::new(HashEmbedder::new(32)))
                .store(Arc::new(InMemoryStore::new()))
                .build()
                .unwrap(),
        );
        retriever.index_corpus(&corpus).await.unwrap();
        Assistant::new(corpus, retriever, Composer::new(None))
    }

    #[tokio::test]
    async fn greetings_short_circuit_without_sources() {
        let assistant = assistant().await;
        let outcome = assistant.ask("Bonjour", 3, true, &[]).await.unwrap();
        assert_eq!(outcome.answer, GREETING_ANSWER);
        assert!(outcome.sources.is_empty());
    }

    #[tokio::test]
    async fn knowledge_questions_carry_citations() {
        let assistant = assistant().await;
        let outcome = assistant.ask("Qu'est-ce que le balafon ?", 3, true, &[]).await.unwrap();
        assert!(!outcome.answer.is_empty());
        assert!(!outcome.sources.is_empty());
        assert!(outcome.sources.len() <= 3);
        assert!(outcome.answer.contains("📚 Sources :"));
    }

    #[tokio::test]
    async fn conversational_questions_have_no_sources() {
        let assistant = assistant().await;
        let outcome = assistant.ask("merci beaucoup", 3, true, &[]).await.unwrap();
        assert!(!outcome.answer.is_empty());
        assert!(outcome.sources.is_empty());
        assert!(!outcome.answer.contains("📚 Sources :"));
    }
}
