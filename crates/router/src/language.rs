//! Language directive injector.
//!
//! Detection sits behind [`LanguageClassifier`]; low confidence, empty input,
//! and symbol-only input all come back as [`Verdict::NoSignal`] rather than
//! an error. A directive is produced only for a confident detection of a
//! language other than the configured default.

use skillroute_config::LanguageConfig;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Detected {
        /// ISO 639-3
        code: String,
        /// English name, e.g. "Russian"
        name: String,
        confidence: f64,
    },
    NoSignal,
}

pub trait LanguageClassifier: Send + Sync {
    fn name(&self) -> &str;

    fn classify(&self, text: &str) -> Verdict;
}

/// Trigram-based detection via `whatlang`.
pub struct WhatlangClassifier {
    min_confidence: f64,
}

impl WhatlangClassifier {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }
}

impl LanguageClassifier for WhatlangClassifier {
    fn name(&self) -> &str {
        "whatlang"
    }

    fn classify(&self, text: &str) -> Verdict {
        let text = text.trim();
        if text.is_empty() || !text.chars().any(char::is_alphabetic) {
            return Verdict::NoSignal;
        }

        let Some(info) = whatlang::detect(text) else {
            return Verdict::NoSignal;
        };
        if info.confidence() < self.min_confidence {
            debug!(lang = info.lang().code(), confidence = info.confidence(), "Language detection below bar");
            return Verdict::NoSignal;
        }

        Verdict::Detected {
            code: info.lang().code().to_string(),
            name: info.lang().eng_name().to_string(),
            confidence: info.confidence(),
        }
    }
}

/// Instruction to answer in the user's language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageDirective {
    pub code: String,
    pub name: String,
}

impl LanguageDirective {
    pub fn render(&self) -> String {
        format!(
            "## Language Directive\nThe user wrote in {name}. Respond in {name} unless the user explicitly asks for another language.",
            name = self.name
        )
    }
}

pub struct LanguageDirectiveInjector {
    classifier: Arc<dyn LanguageClassifier>,
    default_language: String,
}

impl LanguageDirectiveInjector {
    pub fn new(classifier: Arc<dyn LanguageClassifier>, default_language: impl Into<String>) -> Self {
        Self {
            classifier,
            default_language: default_language.into(),
        }
    }

    pub fn from_config(config: &LanguageConfig) -> Self {
        Self::new(
            Arc::new(WhatlangClassifier::new(config.min_confidence)),
            config.default_language.clone(),
        )
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// A directive when the query is confidently in a non-default language.
    pub fn directive_for(&self, query: &str) -> Option<LanguageDirective> {
        match self.classifier.classify(query) {
            Verdict::Detected { code, name, .. } if !code.eq_ignore_ascii_case(&self.default_language) => {
                Some(LanguageDirective { code, name })
            }
            _ => None,
        }
    }
}
