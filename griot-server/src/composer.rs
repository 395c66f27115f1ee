//! Answer composition: prompt building, the LLM tier, and the extractive
//! fallback tiers.
//!
//! The composer never fails. It tries the Gemini tier first (when a client
//! is configured and the request allows it), then falls back to an
//! extractive synthesis of the retrieved passages, then to a broadened
//! search, and finally to a fixed apology. LLM failures are classified
//! into a French user notice prefixed to whichever fallback answer is
//! produced.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use griot_gemini::{Gemini, GeminiError};
use griot_rag::retriever::Retriever;
use griot_rag::vectorstore::ScoredPassage;

/// Maximum number of history turns rendered into a prompt.
const MAX_HISTORY_TURNS: usize = 6;
/// Maximum characters kept per rendered history turn.
const HISTORY_CONTENT_CHARS: usize = 150;
/// Maximum characters of each passage excerpt in a prompt.
const PASSAGE_EXCERPT_CHARS: usize = 500;
/// Maximum number of passages rendered into a prompt.
const MAX_PROMPT_PASSAGES: usize = 3;
/// An LLM answer shorter than this is treated as unusable.
const MIN_LLM_ANSWER_CHARS: usize = 30;
/// Sentences shorter than this are skipped by the extractive fallback.
const MIN_SENTENCE_CHARS: usize = 25;
/// Maximum sentences assembled by the extractive fallback.
const MAX_FALLBACK_SENTENCES: usize = 4;
/// Maximum words assembled by the extractive fallback.
const MAX_FALLBACK_WORDS: usize = 250;
/// Maximum characters of a fallback answer.
const MAX_FALLBACK_CHARS: usize = 600;
/// How many passages the broadened recovery tier feeds to the fallback.
const MAX_BROADENED_PASSAGES: usize = 5;

static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence regex is valid"));

/// Fixed apology used when no tier can produce an answer.
const NO_ANSWER_APOLOGY: &str = "Désolé, je n'ai pas d'information sur ce sujet dans ma base de \
    données. Posez-moi des questions sur la culture, l'histoire, les traditions, l'artisanat ou \
    l'architecture du Burkina Faso. Par exemple : 'Qu'est-ce que le SIAO ?', 'Parle-moi du \
    FESPACO', 'Qui est Thomas Sankara ?'";

/// One turn of the conversation, supplied per-request by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    /// `user` or `assistant`.
    pub role: String,
    /// The turn's text content.
    pub content: String,
}

/// Truncate a string to at most `max` characters, safely across
/// multi-byte boundaries (the corpus is French text with accents).
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max { text.to_string() } else { text.chars().take(max).collect() }
}

/// Render the conversation history preceding the current question.
///
/// Keeps at most the [`MAX_HISTORY_TURNS`] turns before the question,
/// skipping the trailing user turn when it duplicates the question, and
/// truncates each content to [`HISTORY_CONTENT_CHARS`] characters. Returns
/// `None` when fewer than two turns are available.
pub fn history_excerpt(turns: &[ConversationTurn], question: &str) -> Option<String> {
    if turns.len() < 2 {
        return None;
    }

    let mut window = turns;
    if let Some(last) = window.last() {
        if last.role == "user" && last.content.trim() == question.trim() {
            window = &window[..window.len() - 1];
        }
    }
    if window.is_empty() {
        return None;
    }

    let start = window.len().saturating_sub(MAX_HISTORY_TURNS);
    let lines: Vec<String> = window[start..]
        .iter()
        .map(|turn| {
            let role = if turn.role == "user" { "Utilisateur" } else { "Assistant" };
            format!("{role}: {}", truncate_chars(&turn.content, HISTORY_CONTENT_CHARS))
        })
        .collect();

    Some(lines.join("\n"))
}

/// Build the generation prompt: four variants depending on whether
/// retrieved context and conversation history are available.
pub fn build_prompt(
    question: &str,
    passages: &[ScoredPassage],
    history: Option<&str>,
) -> String {
    if passages.is_empty() {
        return match history {
            Some(history) => format!(
                "Tu es Griot, un assistant sympathique et expert sur le Burkina Faso.\n\n\
                 HISTORIQUE DE LA CONVERSATION :\n{history}\n\n\
                 QUESTION : {question}\n\n\
                 TA MISSION :\n\
                 - TIENS COMPTE de l'historique pour comprendre le contexte\n\
                 - Si la question fait référence à la conversation précédente, utilise cet historique\n\
                 - Si c'est une salutation → réponds chaleureusement\n\
                 - Si c'est une question sur le Burkina Faso → réponds avec tes connaissances\n\
                 - Reste naturel, sympathique et cohérent avec la conversation\n\
                 - Réponds en français (1-3 phrases)\n\n\
                 RÉPONSE (naturelle, sympathique et cohérente) :"
            ),
            None => format!(
                "Tu es Griot, un assistant sympathique et expert sur le Burkina Faso.\n\n\
                 QUESTION : {question}\n\n\
                 CONTEXTE : C'est une question conversationnelle ou aucune donnée spécifique \
                 n'est nécessaire.\n\n\
                 TA MISSION :\n\
                 - Si c'est une salutation (bonjour, salut, etc.) → réponds chaleureusement et brièvement\n\
                 - Si c'est une question sur toi → explique que tu es un assistant sur le Burkina Faso\n\
                 - Si c'est une question sur le Burkina Faso → réponds avec tes connaissances\n\
                 - Reste naturel, sympathique et concis (1-3 phrases)\n\
                 - Réponds en français\n\n\
                 RÉPONSE (naturelle et sympathique) :"
            ),
        };
    }

    let context = passages
        .iter()
        .take(MAX_PROMPT_PASSAGES)
        .enumerate()
        .map(|(i, passage)| {
            format!("Document {}:\n{}", i + 1, truncate_chars(&passage.content, PASSAGE_EXCERPT_CHARS))
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    match history {
        Some(history) => format!(
            "Tu es un assistant expert sur le Burkina Faso (culture, histoire, traditions).\n\n\
             HISTORIQUE DE LA CONVERSATION :\n{history}\n\n\
             CONTEXTE TROUVÉ DANS MA BASE DE DONNÉES :\n{context}\n\n\
             QUESTION DE L'UTILISATEUR : {question}\n\n\
             TA MISSION :\n\
             1. TIENS COMPTE de l'historique de conversation ci-dessus pour comprendre le contexte\n\
             2. Utilise les informations du contexte de ma base de données comme BASE\n\
             3. Reformule de manière claire et fluide (pas de copier-coller)\n\
             4. Tu peux COMPLÉTER avec tes propres connaissances si nécessaire\n\
             5. Si la question fait référence à quelque chose dans l'historique (comme \"elle\", \
             \"il\", \"le SIAO\", etc.), utilise cet historique\n\
             6. Réponds de manière naturelle et informative (2-4 phrases)\n\n\
             IMPORTANT : Réponds de façon cohérente avec la conversation précédente.\n\n\
             RÉPONSE (en français, naturelle et complète) :"
        ),
        None => format!(
            "Tu es un assistant expert sur le Burkina Faso (culture, histoire, traditions).\n\n\
             CONTEXTE TROUVÉ DANS MA BASE DE DONNÉES :\n{context}\n\n\
             QUESTION DE L'UTILISATEUR : {question}\n\n\
             TA MISSION :\n\
             1. Utilise les informations du contexte ci-dessus comme BASE\n\
             2. Reformule de manière claire et fluide (pas de copier-coller)\n\
             3. Tu peux COMPLÉTER avec tes propres connaissances si nécessaire\n\
             4. Tu peux CORRIGER si une information semble incorrecte\n\
             5. Réponds de manière naturelle et informative (2-4 phrases)\n\n\
             IMPORTANT : Même si le contexte ne répond pas parfaitement, utilise tes \
             connaissances du Burkina Faso pour donner une réponse complète et utile.\n\n\
             RÉPONSE (en français, naturelle et complète) :"
        ),
    }
}

/// Map an LLM failure to a French user-facing notice.
pub fn llm_notice(err: &GeminiError) -> &'static str {
    let message = err.to_string().to_lowercase();
    match err.status() {
        Some(503) => {
            "⚠️ Le service d'IA est temporairement surchargé. Veuillez réessayer dans quelques instants."
        }
        Some(429) => {
            "⚠️ Limite d'utilisation atteinte. Veuillez réessayer dans quelques minutes."
        }
        Some(401) | Some(403) => {
            "⚠️ Problème de configuration de l'API. Veuillez contacter l'administrateur."
        }
        _ if message.contains("overloaded") => {
            "⚠️ Le service d'IA est temporairement surchargé. Veuillez réessayer dans quelques instants."
        }
        _ if message.contains("quota") || message.contains("rate") => {
            "⚠️ Limite d'utilisation atteinte. Veuillez réessayer dans quelques minutes."
        }
        _ if message.contains("unauthorized") || message.contains("api key") => {
            "⚠️ Problème de configuration de l'API. Veuillez contacter l'administrateur."
        }
        _ if err.is_network() || message.contains("connection") || message.contains("network") => {
            "⚠️ Problème de connexion réseau. Veuillez vérifier votre connexion internet et réessayer."
        }
        _ => {
            "⚠️ Le service d'IA est temporairement indisponible. Veuillez réessayer ultérieurement."
        }
    }
}

/// Synthesise an answer from retrieved passages without an LLM.
///
/// Sentence-splits the top passages, skips short sentences, de-duplicates,
/// and stops at [`MAX_FALLBACK_SENTENCES`] sentences or
/// [`MAX_FALLBACK_WORDS`] words. The intro is chosen from the question
/// type; the result always carries terminal punctuation and is capped at
/// [`MAX_FALLBACK_CHARS`] characters.
pub fn extractive_answer(passages: &[ScoredPassage], question: &str) -> String {
    if passages.is_empty() {
        return NO_ANSWER_APOLOGY.to_string();
    }

    let best = &passages[..passages.len().min(MAX_PROMPT_PASSAGES)];
    let q = question.to_lowercase();

    let is_definition = ["qu'est-ce", "c'est quoi", "what is", "définition"]
        .iter()
        .any(|kw| q.contains(kw));
    let is_general_culture =
        ["culture", "traditions", "patrimoine", "burkinab"].iter().any(|kw| q.contains(kw));

    let intro = if is_definition {
        "Voici ce que je peux vous dire : "
    } else if is_general_culture {
        "Concernant la culture burkinabè : "
    } else {
        ""
    };

    let mut sentences: Vec<String> = Vec::new();
    let mut total_words = 0;

    'outer: for passage in best {
        let content = passage.content.trim();
        if content.is_empty() {
            continue;
        }
        for sentence in SENTENCE_BOUNDARY.split(content) {
            let sentence = sentence.trim();
            if sentence.chars().count() < MIN_SENTENCE_CHARS {
                continue;
            }
            if sentences.iter().any(|s| s == sentence) {
                continue;
            }
            let words = sentence.split_whitespace().count();
            if total_words + words > MAX_FALLBACK_WORDS {
                // Too long for the remaining budget; the next passage may
                // still hold shorter sentences.
                break;
            }
            sentences.push(sentence.to_string());
            total_words += words;
            if sentences.len() >= MAX_FALLBACK_SENTENCES {
                break 'outer;
            }
        }
        if total_words >= MAX_FALLBACK_WORDS {
            break;
        }
    }

    if sentences.is_empty() {
        // Last resort: lead with the first passage's text.
        let first = best[0].content.trim();
        if first.chars().count() > 400 {
            return format!("{intro}{}...", truncate_chars(first, 400).trim_end());
        }
        return format!("{intro}{first}");
    }

    let mut answer = format!("{intro}{}", sentences.join(" ")).trim().to_string();
    if !answer.ends_with(['.', '!', '?']) {
        answer.push('.');
    }
    if answer.chars().count() > MAX_FALLBACK_CHARS {
        answer = format!("{}...", truncate_chars(&answer, MAX_FALLBACK_CHARS - 3));
    }

    answer
}

/// Composes the final answer text for a question.
pub struct Composer {
    llm: Option<Gemini>,
}

impl Composer {
    /// Create a composer. Without an LLM client only the extractive tiers
    /// are available.
    pub fn new(llm: Option<Gemini>) -> Self {
        Self { llm }
    }

    /// Whether an LLM client is configured.
    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// Run the answer tiers for a question. Some tier always yields a
    /// string; this method cannot fail.
    pub async fn compose(
        &self,
        question: &str,
        passages: &[ScoredPassage],
        history: &[ConversationTurn],
        retriever: &Retriever,
        use_llm: bool,
    ) -> String {
        let has_context = !passages.is_empty();
        let history = history_excerpt(history, question);
        let mut notice: Option<&'static str> = None;

        if use_llm {
            if let Some(llm) = &self.llm {
                let prompt = build_prompt(question, passages, history.as_deref());
                match llm.generate(&prompt).await {
                    Ok(answer) => {
                        let answer = answer.trim();
                        if !answer.is_empty() && answer.chars().count() > MIN_LLM_ANSWER_CHARS {
                            info!(has_context, "answer generated by the LLM tier");
                            return answer.to_string();
                        }
                        warn!("LLM answer too short, falling back");
                    }
                    Err(e) => {
                        warn!(error = %e, "LLM call failed, falling back");
                        notice = Some(llm_notice(&e));
                    }
                }
            }
        }

        if has_context {
            let fallback = extractive_answer(passages, question);
            return match notice {
                Some(notice) => format!(
                    "{notice}\n\nVoici les informations que j'ai trouvées dans ma base de \
                     données :\n\n{fallback}"
                ),
                None => fallback,
            };
        }

        // Empty-context tier: broadened search, then the fallback over the
        // pooled passages.
        let pooled = match retriever.search_broadened(retriever.config().top_k).await {
            Ok(pooled) => pooled,
            Err(e) => {
                warn!(error = %e, "broadened search failed");
                Vec::new()
            }
        };

        if !pooled.is_empty() {
            let pooled = &pooled[..pooled.len().min(MAX_BROADENED_PASSAGES)];
            let fallback = extractive_answer(pooled, question);
            return match notice {
                Some(notice) => format!(
                    "{notice}\n\nVoici des informations générales sur le Burkina Faso :\n\n{fallback}"
                ),
                None => fallback,
            };
        }

        match notice {
            Some(notice) => format!("{notice}\n\n{NO_ANSWER_APOLOGY}"),
            None => NO_ANSWER_APOLOGY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use griot_rag::config::RetrievalConfig;
    use griot_rag::corpus::{Corpus, CorpusDocument};
    use griot_rag::embedding::HashEmbedder;
    use griot_rag::inmemory::InMemoryStore;
    use griot_rag::vectorstore::PassageMeta;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn passage(content: &str) -> ScoredPassage {
        ScoredPassage {
            content: content.to_string(),
            meta: PassageMeta {
                title: "Titre".to_string(),
                source: "doc.pdf - page 1".to_string(),
                category: "culture".to_string(),
            },
            score: 0.9,
        }
    }

    fn turn(role: &str, content: &str) -> ConversationTurn {
        ConversationTurn { role: role.to_string(), content: content.to_string() }
    }

    #[test]
    fn truncation_is_char_boundary_safe_on_accents() {
        let text = "éàèéàèéàèé";
        assert_eq!(truncate_chars(text, 4), "éàèé");
        assert_eq!(truncate_chars(text, 100), text);
    }

    #[test]
    fn history_requires_two_turns() {
        assert!(history_excerpt(&[turn("user", "bonjour")], "autre").is_none());
    }

    #[test]
    fn history_skips_the_duplicated_trailing_question() {
        let turns = vec![
            turn("user", "Bonjour"),
            turn("assistant", "Bonjour !"),
            turn("user", "Qu'est-ce que le SIAO ?"),
        ];
        let excerpt = history_excerpt(&turns, "Qu'est-ce que le SIAO ?").unwrap();
        assert_eq!(excerpt, "Utilisateur: Bonjour\nAssistant: Bonjour !");
    }

    #[test]
    fn history_keeps_at_most_six_turns() {
        let turns: Vec<ConversationTurn> =
            (0..10).map(|i| turn(if i % 2 == 0 { "user" } else { "assistant" }, &format!("tour {i}"))).collect();
        let excerpt = history_excerpt(&turns, "nouvelle question").unwrap();
        assert_eq!(excerpt.lines().count(), 6);
        assert!(excerpt.starts_with("Utilisateur: tour 4"));
    }

    #[test]
    fn history_truncates_long_contents() {
        let turns = vec![turn("user", &"x".repeat(300)), turn("assistant", "ok")];
        let excerpt = history_excerpt(&turns, "question").unwrap();
        let first = excerpt.lines().next().unwrap();
        assert_eq!(first.chars().count(), "Utilisateur: ".chars().count() + 150);
    }

    #[test]
    fn prompt_variants_cover_context_and_history() {
        let passages = vec![passage("Le balafon est un instrument de percussion mélodique.")];

        let with_both = build_prompt("Q ?", &passages, Some("Utilisateur: salut"));
        assert!(with_both.contains("HISTORIQUE DE LA CONVERSATION"));
        assert!(with_both.contains("CONTEXTE TROUVÉ DANS MA BASE DE DONNÉES"));

        let context_only = build_prompt("Q ?", &passages, None);
        assert!(!context_only.contains("HISTORIQUE"));
        assert!(context_only.contains("Document 1:"));

        let history_only = build_prompt("Q ?", &[], Some("Utilisateur: salut"));
        assert!(history_only.contains("HISTORIQUE"));
        assert!(!history_only.contains("Document 1:"));

        let bare = build_prompt("Q ?", &[], None);
        assert!(bare.contains("question conversationnelle"));
    }

    #[test]
    fn prompt_caps_passage_excerpts() {
        let long = "a".repeat(800);
        let prompt = build_prompt("Q ?", &[passage(&long)], None);
        assert!(!prompt.contains(&long));
        assert!(prompt.contains(&"a".repeat(500)));
    }

    #[test]
    fn notices_follow_the_status_code() {
        let overloaded = GeminiError::Api { status: 503, detail: "overloaded".into() };
        assert!(llm_notice(&overloaded).contains("surchargé"));

        let quota = GeminiError::Api { status: 429, detail: "quota".into() };
        assert!(llm_notice(&quota).contains("Limite d'utilisation"));

        let credentials = GeminiError::Api { status: 401, detail: "bad key".into() };
        assert!(llm_notice(&credentials).contains("configuration de l'API"));

        let generic = GeminiError::EmptyCandidates;
        assert!(llm_notice(&generic).contains("indisponible"));
    }

    #[test]
    fn extractive_answer_selects_definition_intro() {
        let passages = vec![passage(
            "Le balafon est un instrument de percussion mélodique. Il se joue avec des maillets \
             recouverts de caoutchouc. Court. On le retrouve dans toute l'Afrique de l'Ouest.",
        )];
        let answer = extractive_answer(&passages, "Qu'est-ce que le balafon ?");
        assert!(answer.starts_with("Voici ce que je peux vous dire : "));
        // The 6-character sentence is skipped.
        assert!(!answer.contains("Court."));
        assert!(answer.ends_with(['.', '!', '?']));
    }

    #[test]
    fn extractive_answer_deduplicates_sentences() {
        let repeated = "Les griots sont les gardiens de la tradition orale. ";
        let passages = vec![passage(&repeated.repeat(3))];
        let answer = extractive_answer(&passages, "les griots");
        assert_eq!(answer.matches("gardiens de la tradition orale").count(), 1);
    }

    #[test]
    fn extractive_answer_skips_an_overlong_sentence_not_the_next_passage() {
        // The second sentence alone exceeds the word budget; the next
        // passage still contributes.
        let oversized = format!("Le balafon accompagne les cérémonies des griots. {}.", vec!["récit"; 260].join(" "));
        let passages = vec![
            passage(&oversized),
            passage("Les masques interviennent dans les danses rituelles du pays."),
        ];

        let answer = extractive_answer(&passages, "question");
        assert!(answer.contains("balafon"));
        assert!(answer.contains("masques"));
        assert!(!answer.contains("récit"));
    }

    #[test]
    fn extractive_answer_is_capped_at_600_chars() {
        let sentences: Vec<String> =
            (0..4).map(|i| format!("Phrase numéro {i} {}.", "contenu ".repeat(20))).collect();
        let passages = vec![passage(&sentences.join(" "))];
        let answer = extractive_answer(&passages, "question");
        assert!(answer.chars().count() <= 600);
        assert!(answer.ends_with("..."));
    }

    #[test]
    fn extractive_answer_without_passages_apologises() {
        assert_eq!(extractive_answer(&[], "question"), NO_ANSWER_APOLOGY);
    }

    async fn indexed_retriever(documents: Vec<CorpusDocument>) -> Retriever {
        let retriever = Retriever::builder()
            .config(RetrievalConfig::default())
            .embedder(Arc::new(HashEmbedder::new(32)))
            .store(Arc::new(InMemoryStore::new()))
            .build()
            .unwrap();
        retriever.index_corpus(&Corpus::from_documents(documents)).await.unwrap();
        retriever
    }

    fn doc(id: u64, content: &str) -> CorpusDocument {
        CorpusDocument {
            id,
            title: format!("Document {id}"),
            content: content.to_string(),
            source: format!("doc{id}.pdf - page 1"),
            category: "culture".to_string(),
            word_count: content.split_whitespace().count(),
            metadata: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn compose_uses_the_extractive_tier_without_an_llm() {
        let retriever = indexed_retriever(vec![doc(1, "Texte indexé.")]).await;
        let composer = Composer::new(None);
        let passages =
            vec![passage("Le FESPACO est le plus grand festival de cinéma africain du continent.")];

        let answer = composer.compose("le fespaco", &passages, &[], &retriever, true).await;
        assert!(answer.contains("festival de cinéma africain"));
    }

    #[tokio::test]
    async fn use_llm_false_skips_a_configured_client() {
        let retriever = indexed_retriever(vec![doc(1, "Texte indexé.")]).await;
        // An unreachable endpoint: any attempted call would surface a notice.
        let llm = Gemini::new("test-key").with_base_url("http://127.0.0.1:9");
        let composer = Composer::new(Some(llm));
        let passages =
            vec![passage("Le FESPACO est le plus grand festival de cinéma africain du continent.")];

        let answer = composer.compose("le fespaco", &passages, &[], &retriever, false).await;
        assert!(answer.contains("festival de cinéma africain"));
        assert!(!answer.contains("⚠️"));
    }

    #[tokio::test]
    async fn compose_broadens_when_no_context_exists() {
        let retriever = indexed_retriever(vec![doc(
            1,
            "Le patrimoine culturel du Burkina Faso est d'une très grande richesse historique.",
        )])
        .await;
        let composer = Composer::new(None);

        let answer = composer.compose("merci beaucoup", &[], &[], &retriever, true).await;
        assert!(answer.contains("grande richesse historique"));
    }

    #[tokio::test]
    async fn compose_apologises_on_an_empty_store() {
        let retriever = indexed_retriever(Vec::new()).await;
        let composer = Composer::new(None);

        let answer = composer.compose("question inconnue", &[], &[], &retriever, true).await;
        assert_eq!(answer, NO_ANSWER_APOLOGY);
    }
}
