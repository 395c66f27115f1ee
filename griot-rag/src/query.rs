//! Query classification heuristics.
//!
//! Keyword lists decide whether a question warrants a knowledge-base search
//! and whether retrieval should prefer a corpus category. The lists mirror
//! the vocabulary of the corpus (French-language cultural documents about
//! Burkina Faso) and are matched on the lowercased question.

/// Exact greeting phrases answered without any search or model call.
const GREETINGS: &[&str] = &["bonjour", "salut", "bonsoir", "coucou", "hey", "hello", "hi"];

/// Keywords signalling a preference for `culture`-category passages.
const CULTURAL_KEYWORDS: &[&str] = &[
    "griot",
    "balafon",
    "djembé",
    "kora",
    "musique",
    "danse",
    "tradition",
    "masque",
    "fespaco",
    "siao",
    "artisan",
    "tissage",
    "poterie",
    "bronze",
    "cérémonie",
    "rite",
    "ancêtre",
    "chef",
    "roi",
    "royaume",
    "ethnie",
    "mossi",
    "peul",
    "bobo",
    "lobi",
    "gourounsi",
    "touareg",
];

/// Keywords signalling a preference for `architecture`-category passages.
const ARCHITECTURAL_KEYWORDS: &[&str] = &[
    "grenier",
    "case",
    "maison",
    "habitat",
    "construction",
    "architecture",
    "mosquée",
    "bâtiment",
    "édifice",
    "banco",
    "terre",
    "paille",
];

/// History, geography, and interrogative lead-ins that also warrant a
/// knowledge-base search even without a category keyword.
const LOOKUP_KEYWORDS: &[&str] = &[
    // History
    "histoire",
    "indépendance",
    "thomas sankara",
    "sankara",
    "mogho naba",
    "empire",
    "colonial",
    "français",
    "guerre",
    // Geography
    "ouagadougou",
    "bobo-dioulasso",
    "banfora",
    "ville",
    "région",
    // Explicit questions
    "qui est",
    "qu'est-ce que",
    "c'est quoi",
    "parle-moi de",
    "explique",
    "raconte",
    "définition",
    "signification",
];

/// What kind of handling a question needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    /// An exact greeting; answered with a canned reply.
    Greeting,
    /// Small talk or an out-of-domain question; no search is run.
    Conversational,
    /// A question about the corpus domain; search before answering.
    KnowledgeLookup,
}

/// A retrieval-time preference for a corpus category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryBias {
    /// No category keyword matched.
    None,
    /// Only cultural keywords matched; `architecture` passages are excluded.
    Culture,
    /// Only architectural keywords matched.
    Architecture,
    /// Keywords from both families matched; no exclusion applies.
    Both,
}

impl CategoryBias {
    /// Whether any category preference is active.
    pub fn is_active(self) -> bool {
        self != CategoryBias::None
    }
}

/// Classify a question into a [`QueryIntent`].
///
/// Greetings are detected by exact match after trim and lowercase. A
/// question containing any cultural, architectural, or lookup keyword is a
/// [`QueryIntent::KnowledgeLookup`]; everything else is conversational.
pub fn classify(question: &str) -> QueryIntent {
    let q = question.trim().to_lowercase();

    if GREETINGS.contains(&q.as_str()) {
        return QueryIntent::Greeting;
    }

    let needs_search = CULTURAL_KEYWORDS
        .iter()
        .chain(ARCHITECTURAL_KEYWORDS)
        .chain(LOOKUP_KEYWORDS)
        .any(|kw| q.contains(kw));

    if needs_search { QueryIntent::KnowledgeLookup } else { QueryIntent::Conversational }
}

/// Detect the category preference of a question from its keywords.
pub fn detect_bias(question: &str) -> CategoryBias {
    let q = question.to_lowercase();
    let culture = CULTURAL_KEYWORDS.iter().any(|kw| q.contains(kw));
    let architecture = ARCHITECTURAL_KEYWORDS.iter().any(|kw| q.contains(kw));

    match (culture, architecture) {
        (true, true) => CategoryBias::Both,
        (true, false) => CategoryBias::Culture,
        (false, true) => CategoryBias::Architecture,
        (false, false) => CategoryBias::None,
    }
}
