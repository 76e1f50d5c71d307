//! Agent selector: ranks agents for a query that missed the route cache.
//!
//! The blended score combines keyword overlap with the agent's declared
//! domain keywords and cosine similarity against the agent embedding:
//!
//! ```text
//! score = KEYWORD_WEIGHT * keyword + EMBEDDING_WEIGHT * similarity
//! ```
//!
//! Without a query embedding every agent is scored on keywords alone. With
//! one, an agent that has no vector of its own contributes zero similarity,
//! so all candidates share one scale. A top score at or above the confidence
//! bar resolves; anything lower abstains with the full ranked list so the
//! host can decide.

use skillroute_catalog::cosine_similarity;
use skillroute_core::text::{contains_phrase, tokenize};
use skillroute_core::{CatalogEntry, RankedCandidate};
use std::cmp::Ordering;

/// Weight of keyword overlap in the blended score.
pub const KEYWORD_WEIGHT: f32 = 0.4;

/// Weight of embedding similarity in the blended score.
pub const EMBEDDING_WEIGHT: f32 = 0.6;

/// Matched keyword phrases needed for a full keyword score.
pub const KEYWORD_SATURATION: usize = 2;

/// What the selector decided.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Resolved { agent_id: String, confidence: f32 },
    /// No candidate cleared the bar; ranked descending
    Abstained { candidates: Vec<RankedCandidate> },
}

/// Chooses an agent, or abstains.
pub trait AgentSelector: Send + Sync {
    fn name(&self) -> &str;

    /// `query_embedding` is `None` when the embedder is unavailable.
    fn select(&self, query: &str, query_embedding: Option<&[f32]>, agents: &[CatalogEntry]) -> Selection;
}

/// The agent whose trigger command opens the query, if any.
pub fn match_trigger<'a>(query: &str, agents: &'a [CatalogEntry]) -> Option<&'a CatalogEntry> {
    agents
        .iter()
        .find(|entry| entry.as_agent().is_some_and(|profile| profile.is_triggered_by(query)))
}

/// Fraction of saturation reached by distinct keyword phrases found in the query.
pub fn keyword_score(query_tokens: &[String], keywords: &[String]) -> f32 {
    let matched = keywords
        .iter()
        .filter(|keyword| contains_phrase(query_tokens, &tokenize(keyword)))
        .count();
    (matched as f32 / KEYWORD_SATURATION as f32).min(1.0)
}

/// Keyword + embedding blend.
pub struct BlendedSelector {
    confidence_bar: f32,
}

impl BlendedSelector {
    pub fn new(confidence_bar: f32) -> Self {
        Self { confidence_bar }
    }

    pub fn confidence_bar(&self) -> f32 {
        self.confidence_bar
    }

    /// Every agent scored, descending; ties by id.
    pub fn rank(&self, query: &str, query_embedding: Option<&[f32]>, agents: &[CatalogEntry]) -> Vec<RankedCandidate> {
        let tokens = tokenize(query);
        let mut ranked: Vec<RankedCandidate> = agents
            .iter()
            .filter_map(|entry| {
                let profile = entry.as_agent()?;
                let keyword = keyword_score(&tokens, &profile.domain_keywords);
                let score = match query_embedding {
                    Some(query) => {
                        let similarity = entry
                            .embedding
                            .as_deref()
                            .map_or(0.0, |agent| cosine_similarity(query, agent).clamp(0.0, 1.0));
                        KEYWORD_WEIGHT * keyword + EMBEDDING_WEIGHT * similarity
                    }
                    None => keyword,
                };
                Some(RankedCandidate::new(entry.id.clone(), score))
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.entry_id.cmp(&b.entry_id))
        });
        ranked
    }
}

impl AgentSelector for BlendedSelector {
    fn name(&self) -> &str {
        "blended"
    }

    fn select(&self, query: &str, query_embedding: Option<&[f32]>, agents: &[CatalogEntry]) -> Selection {
        let candidates = self.rank(query, query_embedding, agents);
        match candidates.first() {
            Some(top) if top.score >= self.confidence_bar => Selection::Resolved {
                agent_id: top.entry_id.clone(),
                confidence: top.score.min(1.0),
            },
            _ => Selection::Abstained { candidates },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::agent_entry;

    fn agents() -> Vec<CatalogEntry> {
        vec![
            agent_entry("software_engineer", &["null pointer", "debug", "rust", "refactor"], Some("/dev")),
            agent_entry("data_analyst", &["sql", "dataset", "chart"], Some("/data")),
            agent_entry("writer", &["essay", "poem"], None),
        ]
    }

    #[test]
    fn weights_are_pinned() {
        assert_eq!(KEYWORD_WEIGHT, 0.4);
        assert_eq!(EMBEDDING_WEIGHT, 0.6);
        assert!((KEYWORD_WEIGHT + EMBEDDING_WEIGHT - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn keyword_score_counts_phrases() {
        let tokens = tokenize("Debug this null pointer please");
        let keywords = vec!["null pointer".to_string(), "debug".to_string(), "rust".to_string()];
        assert_eq!(keyword_score(&tokens, &keywords), 1.0);
        assert_eq!(keyword_score(&tokenize("rust only"), &keywords), 0.5);
        assert_eq!(keyword_score(&tokenize("pointer null"), &keywords[..1]), 0.0);
        assert_eq!(keyword_score(&tokens, &[]), 0.0);
    }

    #[test]
    fn keyword_only_resolution() {
        let selector = BlendedSelector::new(0.55);
        let selection = selector.select("How do I debug a null pointer in rust?", None, &agents());
        assert_eq!(
            selection,
            Selection::Resolved {
                agent_id: "software_engineer".into(),
                confidence: 1.0
            }
        );
    }

    #[test]
    fn weak_evidence_abstains_with_every_agent() {
        let selector = BlendedSelector::new(0.55);
        match selector.select("tell me something about sql", None, &agents()) {
            Selection::Abstained { candidates } => {
                assert_eq!(candidates.len(), 3);
                assert_eq!(candidates[0].entry_id, "data_analyst");
                assert_eq!(candidates[0].score, 0.5);
                // zero scores tie-break by id
                assert_eq!(candidates[1].entry_id, "software_engineer");
                assert_eq!(candidates[2].entry_id, "writer");
            }
            other => panic!("expected abstention, got {other:?}"),
        }
    }

    #[test]
    fn embedding_similarity_blends_in() {
        let mut agents = agents();
        agents[0].embedding = Some(vec![1.0, 0.0]);
        agents[1].embedding = Some(vec![0.0, 1.0]);

        let selector = BlendedSelector::new(0.55);
        let ranked = selector.rank("plain words", Some(&[1.0, 0.0]), &agents);

        assert_eq!(ranked[0].entry_id, "software_engineer");
        assert!((ranked[0].score - EMBEDDING_WEIGHT).abs() < 1e-6);
        assert_eq!(ranked[1].score, 0.0);
        assert_eq!(ranked.iter().find(|c| c.entry_id == "writer").unwrap().score, 0.0);
    }

    #[test]
    fn unembedded_agent_shares_the_blended_scale() {
        let mut embedded = agent_entry("a_embedded", &["rust", "debug"], None);
        embedded.embedding = Some(vec![0.5, 0.75f32.sqrt()]);
        let plain = agent_entry("b_plain", &["rust", "debug"], None);
        let agents = vec![plain, embedded];

        let ranked = BlendedSelector::new(0.55).rank("debug my rust code", Some(&[1.0, 0.0]), &agents);

        assert_eq!(ranked[0].entry_id, "a_embedded");
        assert!((ranked[0].score - (KEYWORD_WEIGHT + EMBEDDING_WEIGHT * 0.5)).abs() < 1e-6);
        assert_eq!(ranked[1].entry_id, "b_plain");
        assert!((ranked[1].score - KEYWORD_WEIGHT).abs() < 1e-6);

        // without a query vector both fall back to keywords and tie
        let ranked = BlendedSelector::new(0.55).rank("debug my rust code", None, &agents);
        assert_eq!(ranked[0].score, 1.0);
        assert_eq!(ranked[1].score, 1.0);
        assert_eq!(ranked[0].entry_id, "a_embedded");
    }

    #[test]
    fn negative_similarity_is_clamped() {
        let mut agents = agents();
        agents[0].embedding = Some(vec![-1.0, 0.0]);
        let ranked = BlendedSelector::new(0.55).rank("debug", Some(&[1.0, 0.0]), &agents);
        let engineer = ranked.iter().find(|c| c.entry_id == "software_engineer").unwrap();
        assert!((engineer.score - KEYWORD_WEIGHT * 0.5).abs() < 1e-6);
    }

    #[test]
    fn trigger_matches_leading_token() {
        let agents = agents();
        assert_eq!(match_trigger("/data show revenue", &agents).unwrap().id, "data_analyst");
        assert_eq!(match_trigger("/DEV", &agents).unwrap().id, "software_engineer");
        assert!(match_trigger("run /dev now", &agents).is_none());
        assert!(match_trigger("", &agents).is_none());
    }

    #[test]
    fn empty_catalog_abstains() {
        let selection = BlendedSelector::new(0.55).select("anything at all", None, &[]);
        assert_eq!(selection, Selection::Abstained { candidates: vec![] });
    }
}
