//! Skill/implant retriever: top-k fragments for a query and agent.
//!
//! Candidates come from the vector store, are filtered by a per-collection
//! similarity floor, and then nudged by a bounded bonus when the agent lists
//! them as preferred. The floor applies before the bonus, so a preference
//! never rescues a poor match.
//!
//! Without a query embedding, or when the store fails or times out, the
//! retriever returns the agent's static list for the collection in declared
//! order. That is the degraded mode, not an error.

use skillroute_catalog::Catalog;
use skillroute_config::RetrievalConfig;
use skillroute_core::{AgentProfile, CatalogEntry, Collection};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Ranking knobs for one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalPolicy {
    pub k: usize,
    pub min_similarity: f32,
    pub preference_bonus: f32,
}

impl RetrievalPolicy {
    pub fn skills(config: &RetrievalConfig) -> Self {
        Self {
            k: config.skills_k,
            min_similarity: config.skill_min_similarity,
            preference_bonus: config.preference_bonus,
        }
    }

    pub fn implants(config: &RetrievalConfig) -> Self {
        Self {
            k: config.implants_k,
            min_similarity: config.implant_min_similarity,
            preference_bonus: config.preference_bonus,
        }
    }
}

/// Retrieved fragments, in final order.
#[derive(Debug, Clone, Default)]
pub struct Retrieved {
    pub entries: Vec<CatalogEntry>,
    /// The static fallback list was used
    pub degraded: bool,
}

impl Retrieved {
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }
}

pub struct FragmentRetriever {
    skills: RetrievalPolicy,
    implants: RetrievalPolicy,
}

impl FragmentRetriever {
    pub fn new(skills: RetrievalPolicy, implants: RetrievalPolicy) -> Self {
        Self { skills, implants }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(RetrievalPolicy::skills(config), RetrievalPolicy::implants(config))
    }

    /// Policy for a fragment collection; agents use the skill policy.
    pub fn policy(&self, collection: Collection) -> &RetrievalPolicy {
        match collection {
            Collection::Implants => &self.implants,
            Collection::Skills | Collection::Agents => &self.skills,
        }
    }

    /// Up to `k` fragments from `collection` for the query.
    pub async fn retrieve(
        &self,
        catalog: &Catalog,
        collection: Collection,
        query_embedding: Option<&[f32]>,
        agent: Option<&AgentProfile>,
        k: usize,
    ) -> Retrieved {
        if collection == Collection::Agents || k == 0 {
            return Retrieved::default();
        }

        let Some(embedding) = query_embedding else {
            return Self::degraded(catalog, collection, agent);
        };

        let preferred = agent.map_or(&[][..], |a| a.preferred_ids(collection));
        let fetch = k.saturating_mul(2).saturating_add(preferred.len());
        let hits = match catalog.nearest(collection, embedding, fetch).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(%collection, error = %e, "Vector store query failed; using static list");
                return Self::degraded(catalog, collection, agent);
            }
        };

        let policy = self.policy(collection);
        let mut scored: Vec<(f32, &CatalogEntry)> = hits
            .iter()
            .filter_map(|hit| {
                let Some(entry) = catalog.fragment(collection, &hit.id) else {
                    debug!(id = %hit.id, %collection, "Indexed id not in catalog");
                    return None;
                };
                let similarity = hit.similarity();
                if similarity < policy.min_similarity {
                    return None;
                }
                let bonus = if preferred.contains(&hit.id) {
                    policy.preference_bonus
                } else {
                    0.0
                };
                Some((similarity + bonus, entry))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.id.cmp(&b.1.id))
        });
        scored.truncate(k);

        Retrieved {
            entries: scored.into_iter().map(|(_, entry)| entry.clone()).collect(),
            degraded: false,
        }
    }

    /// The agent's static list, declared order, unknown ids skipped.
    pub fn static_fallback(catalog: &Catalog, collection: Collection, agent: Option<&AgentProfile>) -> Vec<CatalogEntry> {
        let Some(agent) = agent else {
            return Vec::new();
        };
        agent
            .static_ids(collection)
            .iter()
            .filter_map(|id| {
                let entry = catalog.fragment(collection, id);
                if entry.is_none() {
                    warn!(%id, %collection, "Static fallback id not in catalog");
                }
                entry.cloned()
            })
            .collect()
    }

    fn degraded(catalog: &Catalog, collection: Collection, agent: Option<&AgentProfile>) -> Retrieved {
        Retrieved {
            entries: Self::static_fallback(catalog, collection, agent),
            degraded: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingStore, agent_entry, fragment_entry};
    use skillroute_catalog::InMemoryVectorStore;
    use skillroute_core::VectorStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn policy(k: usize, min_similarity: f32) -> RetrievalPolicy {
        RetrievalPolicy {
            k,
            min_similarity,
            preference_bonus: 0.1,
        }
    }

    fn engineer() -> AgentProfile {
        let mut entry = agent_entry("software_engineer", &["debug"], None);
        if let skillroute_core::EntryKind::Agent(profile) = &mut entry.kind {
            profile.static_skill_ids = vec!["skill-zeta".into(), "skill-ghost".into(), "skill-alpha".into()];
            profile.preferred_skill_ids = vec!["skill-beta".into()];
        }
        entry.as_agent().cloned().unwrap()
    }

    async fn catalog_with(store: Arc<dyn VectorStore>) -> Catalog {
        let entries = vec![
            fragment_entry(Collection::Skills, "skill-alpha", "alpha"),
            fragment_entry(Collection::Skills, "skill-beta", "beta"),
            fragment_entry(Collection::Skills, "skill-gamma", "gamma"),
            fragment_entry(Collection::Skills, "skill-zeta", "zeta"),
        ];
        Catalog::new(entries, store, Duration::from_millis(200))
    }

    /// Vectors at known similarity to the query [1, 0].
    async fn seeded_store() -> Arc<InMemoryVectorStore> {
        let store = Arc::new(InMemoryVectorStore::new());
        let at = |sim: f32| vec![sim, (1.0 - sim * sim).sqrt()];
        store.upsert(Collection::Skills, "skill-alpha", at(0.90)).await.unwrap();
        store.upsert(Collection::Skills, "skill-beta", at(0.85)).await.unwrap();
        store.upsert(Collection::Skills, "skill-gamma", at(0.60)).await.unwrap();
        store.upsert(Collection::Skills, "skill-zeta", at(0.20)).await.unwrap();
        // indexed but no longer in the catalog
        store.upsert(Collection::Skills, "skill-orphan", at(0.99)).await.unwrap();
        store
    }

    #[tokio::test]
    async fn ranks_by_similarity_above_floor() {
        let catalog = catalog_with(seeded_store().await).await;
        let retriever = FragmentRetriever::new(policy(4, 0.55), policy(3, 0.27));

        let out = retriever
            .retrieve(&catalog, Collection::Skills, Some(&[1.0, 0.0]), None, 4)
            .await;

        assert!(!out.degraded);
        assert_eq!(out.ids(), ["skill-alpha", "skill-beta", "skill-gamma"]);
    }

    #[tokio::test]
    async fn preference_bonus_reorders_close_matches() {
        let catalog = catalog_with(seeded_store().await).await;
        let retriever = FragmentRetriever::new(policy(2, 0.55), policy(3, 0.27));
        let agent = engineer();

        let out = retriever
            .retrieve(&catalog, Collection::Skills, Some(&[1.0, 0.0]), Some(&agent), 2)
            .await;

        assert_eq!(out.ids(), ["skill-beta", "skill-alpha"]);
    }

    #[tokio::test]
    async fn preference_never_rescues_poor_match() {
        let catalog = catalog_with(seeded_store().await).await;
        let retriever = FragmentRetriever::new(policy(4, 0.55), policy(3, 0.27));
        let mut agent = engineer();
        agent.preferred_skill_ids = vec!["skill-zeta".into()];

        let out = retriever
            .retrieve(&catalog, Collection::Skills, Some(&[1.0, 0.0]), Some(&agent), 4)
            .await;

        assert!(!out.ids().contains(&"skill-zeta".to_string()));
    }

    #[tokio::test]
    async fn store_failure_returns_static_list_in_order() {
        let catalog = catalog_with(Arc::new(FailingStore)).await;
        let retriever = FragmentRetriever::new(policy(1, 0.55), policy(3, 0.27));
        let agent = engineer();

        let out = retriever
            .retrieve(&catalog, Collection::Skills, Some(&[1.0, 0.0]), Some(&agent), 1)
            .await;

        assert!(out.degraded);
        // declared order, unknown id skipped, not truncated to k
        assert_eq!(out.ids(), ["skill-zeta", "skill-alpha"]);
    }

    #[tokio::test]
    async fn missing_embedding_degrades() {
        let catalog = catalog_with(seeded_store().await).await;
        let retriever = FragmentRetriever::new(policy(4, 0.55), policy(3, 0.27));

        let out = retriever.retrieve(&catalog, Collection::Skills, None, Some(&engineer()), 4).await;
        assert!(out.degraded);
        assert_eq!(out.ids(), ["skill-zeta", "skill-alpha"]);

        let none = retriever.retrieve(&catalog, Collection::Implants, None, None, 3).await;
        assert!(none.degraded);
        assert!(none.entries.is_empty());
    }

    #[tokio::test]
    async fn unbounded_limit_returns_every_match() {
        let catalog = catalog_with(seeded_store().await).await;
        let retriever = FragmentRetriever::new(policy(4, 0.55), policy(3, 0.27));

        let out = retriever
            .retrieve(&catalog, Collection::Skills, Some(&[1.0, 0.0]), Some(&engineer()), usize::MAX)
            .await;

        assert!(!out.degraded);
        assert_eq!(out.ids(), ["skill-beta", "skill-alpha", "skill-gamma"]);
    }

    #[tokio::test]
    async fn agents_collection_is_not_retrievable() {
        let catalog = catalog_with(seeded_store().await).await;
        let retriever = FragmentRetriever::new(policy(4, 0.55), policy(3, 0.27));
        let out = retriever.retrieve(&catalog, Collection::Agents, Some(&[1.0, 0.0]), None, 4).await;
        assert!(out.entries.is_empty());
        assert!(!out.degraded);
    }
}
