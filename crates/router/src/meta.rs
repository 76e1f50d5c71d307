//! Meta-query classifier: the no-embedding fast path.
//!
//! Very short queries and bare greetings/acknowledgements go straight to the
//! default agent. Nothing here touches the embedder or either cache.

use skillroute_core::text::normalize_query;

/// Greetings and acknowledgements, already normalised.
const META_PHRASES: &[&str] = &[
    "hi", "hello", "hey", "hiya", "howdy", "yo", "greetings", "good morning", "good afternoon",
    "good evening", "thanks", "thank you", "thanks a lot", "thank you very much", "thx", "ty",
    "ok", "okay", "k", "cool", "great", "nice", "got it", "sure", "yes", "no", "yep", "nope",
    "bye", "goodbye", "see you", "how are you", "what's up", "whats up",
    "привет", "здравствуйте", "спасибо", "пока", "хорошо", "ок",
    "hola", "gracias", "bonjour", "merci", "salut", "hallo", "danke", "ciao", "grazie",
];

/// Result of classifying a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaVerdict {
    /// Trivial query; route to `default_agent` without lookups
    Meta { default_agent: String },
    /// Needs the full pipeline
    Substantive,
}

impl MetaVerdict {
    pub fn is_meta(&self) -> bool {
        matches!(self, Self::Meta { .. })
    }
}

pub struct MetaClassifier {
    min_chars: usize,
    default_agent: String,
}

impl MetaClassifier {
    pub fn new(min_chars: usize, default_agent: impl Into<String>) -> Self {
        Self {
            min_chars,
            default_agent: default_agent.into(),
        }
    }

    pub fn default_agent(&self) -> &str {
        &self.default_agent
    }

    pub fn classify(&self, query: &str) -> MetaVerdict {
        if query.trim().chars().count() < self.min_chars || is_meta_phrase(query) {
            MetaVerdict::Meta {
                default_agent: self.default_agent.clone(),
            }
        } else {
            MetaVerdict::Substantive
        }
    }
}

/// Normalised text with surrounding punctuation removed matches a known phrase.
fn is_meta_phrase(query: &str) -> bool {
    let normalized = normalize_query(query);
    let stripped = normalized.trim_matches(|c: char| !c.is_alphanumeric());
    META_PHRASES.contains(&stripped)
}
