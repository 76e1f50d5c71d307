//! The routing engine: query in, agent plus composite prompt out.
//!
//! Pipeline for one request:
//!
//! 1. **Meta check**: trivial queries go to the default agent with no
//!    embedding, no retrieval, and no route cache access
//! 2. **Trigger**: a leading trigger token selects its agent outright
//! 3. **Route cache**: nearest previous decision for the (history-aware)
//!    query embedding
//! 4. **Selector**: blended ranking; abstains when nothing clears the bar
//! 5. **Enrichment** through the session cache: retrieval, language
//!    directive, assembly
//!
//! Embedding and vector store failures never surface: retrieval drops to
//! static lists and selection to keyword-only scoring. One [`RouteRecord`]
//! goes to every observer per request.

use crate::context::{
    Enrichment, EnrichmentScope, SessionPromptCache, assemble, format_implants, format_skills, join_sections,
};
use crate::language::{LanguageClassifier, LanguageDirectiveInjector};
use crate::meta::{MetaClassifier, MetaVerdict};
use crate::retriever::{FragmentRetriever, Retrieved};
use crate::route_cache::SemanticRouteCache;
use crate::selector::{AgentSelector, BlendedSelector, Selection, match_trigger};
use crate::strategies::{StrategyLookup, TaskType};
use serde::{Deserialize, Serialize};
use skillroute_catalog::{Catalog, embed_with_timeout};
use skillroute_config::AppConfig;
use skillroute_core::error::CatalogError;
use skillroute_core::text::{normalize_query, tail_chars};
use skillroute_core::{
    AgentProfile, Collection, Embedder, Outcome, RankedCandidate, Resolution, RouteObserver, RouteRecord,
    RouteSource,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A query to route, with optional prior chat turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteRequest {
    pub query: String,
    #[serde(default)]
    pub history: Vec<String>,
}

impl RouteRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = history;
        self
    }
}

/// Skills and implants sections without the base prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynamicContext {
    pub content: String,
    pub skill_ids: Vec<String>,
    pub implant_ids: Vec<String>,
    pub degraded: bool,
}

/// Point-in-time view of the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub agents: usize,
    pub skills: usize,
    pub implants: usize,
    pub route_cache_entries: usize,
    pub route_cache_capacity: usize,
    pub session_cache_entries: usize,
    pub embedder: String,
    pub store: String,
    pub selector: String,
    pub default_agent: String,
}

/// Per-request memo of the query embedding.
enum EmbeddingState {
    NotComputed,
    Ready(Vec<f32>),
    Failed,
}

pub struct RoutingEngine {
    catalog: Arc<Catalog>,
    embedder: Arc<dyn Embedder>,
    selector: Arc<dyn AgentSelector>,
    meta: MetaClassifier,
    route_cache: SemanticRouteCache,
    session_cache: SessionPromptCache,
    retriever: FragmentRetriever,
    language: LanguageDirectiveInjector,
    observers: Vec<Arc<dyn RouteObserver>>,
    embed_timeout: Duration,
    history_chars: usize,
}

impl RoutingEngine {
    pub fn new(catalog: Arc<Catalog>, embedder: Arc<dyn Embedder>, config: &AppConfig) -> Self {
        let routing = &config.routing;
        Self {
            catalog,
            embedder,
            selector: Arc::new(BlendedSelector::new(routing.selector_confidence)),
            meta: MetaClassifier::new(routing.meta_min_chars, routing.default_agent.clone()),
            route_cache: SemanticRouteCache::new(routing.route_cache_capacity),
            session_cache: SessionPromptCache::new(config.session.capacity),
            retriever: FragmentRetriever::from_config(&config.retrieval),
            language: LanguageDirectiveInjector::from_config(&config.language),
            observers: Vec::new(),
            embed_timeout: Duration::from_millis(config.embedding.timeout_ms),
            history_chars: routing.history_chars,
        }
    }

    /// Replace the blended selector.
    pub fn with_selector(mut self, selector: Arc<dyn AgentSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Replace the language classifier, keeping the default language.
    pub fn with_language_classifier(mut self, classifier: Arc<dyn LanguageClassifier>) -> Self {
        let default_language = self.language.default_language().to_string();
        self.language = LanguageDirectiveInjector::new(classifier, default_language);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RouteObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn default_agent(&self) -> &str {
        self.meta.default_agent()
    }

    pub fn route_cache(&self) -> &SemanticRouteCache {
        &self.route_cache
    }

    pub fn session_cache(&self) -> &SessionPromptCache {
        &self.session_cache
    }

    // ── Routing ───────────────────────────────────────────────────────────

    /// Route a query. Abstention is an [`Outcome`], never an error.
    pub async fn route(&self, request: &RouteRequest) -> Outcome {
        let started = Instant::now();
        let mut record = RouteRecord::new();

        let outcome = self.route_inner(request, &mut record).await;

        record.latency_ms = started.elapsed().as_millis() as u64;
        self.emit(&record);
        outcome
    }

    async fn route_inner(&self, request: &RouteRequest, record: &mut RouteRecord) -> Outcome {
        let query = request.query.as_str();

        if let MetaVerdict::Meta { default_agent } = self.meta.classify(query) {
            info!(agent = %default_agent, "Meta query; routing to default agent");
            record.meta = true;
            let (enrichment, hit) = self.enrich_meta(&default_agent, query).await;
            return Outcome::Resolved(self.resolution(default_agent, 1.0, RouteSource::Meta, enrichment, hit, record));
        }

        let mut state = EmbeddingState::NotComputed;

        if let Some(agent) = match_trigger(query, self.catalog.agents()) {
            let agent_id = agent.id.clone();
            info!(agent = %agent_id, "Trigger command matched");
            let (enrichment, hit) = self.enrich(&agent_id, query, &mut state).await;
            return Outcome::Resolved(self.resolution(agent_id, 1.0, RouteSource::Trigger, enrichment, hit, record));
        }

        let cache_key = self.cache_key_embedding(request, &mut state).await;

        if let Some(key) = cache_key.as_deref()
            && let Some(hit) = self.route_cache.lookup(key)
        {
            if self.catalog.has_agent(&hit.agent_id) {
                info!(agent = %hit.agent_id, distance = hit.distance, "Route cache hit");
                record.route_cache_hit = true;
                let (enrichment, session_hit) = self.enrich(&hit.agent_id, query, &mut state).await;
                return Outcome::Resolved(self.resolution(
                    hit.agent_id,
                    hit.confidence,
                    RouteSource::RouteCache,
                    enrichment,
                    session_hit,
                    record,
                ));
            }
            warn!(agent = %hit.agent_id, "Route cache points at an agent no longer in the catalog");
        }

        let embedding = self.query_embedding(query, &mut state).await;
        match self.selector.select(query, embedding.as_deref(), self.catalog.agents()) {
            Selection::Resolved { agent_id, confidence } if self.catalog.has_agent(&agent_id) => {
                info!(agent = %agent_id, confidence, selector = self.selector.name(), "Selector resolved");
                if let Some(key) = cache_key {
                    let outcome = self.route_cache.insert(key, &agent_id, confidence);
                    debug!(?outcome, "Route cache write");
                }
                let (enrichment, hit) = self.enrich(&agent_id, query, &mut state).await;
                Outcome::Resolved(self.resolution(agent_id, confidence, RouteSource::Selector, enrichment, hit, record))
            }
            Selection::Resolved { agent_id, .. } => {
                warn!(agent = %agent_id, "Selector chose an unknown agent; abstaining");
                record.abstained = true;
                self.abstain(Vec::new())
            }
            Selection::Abstained { candidates } => {
                info!(candidates = candidates.len(), "Selector abstained; host decides");
                record.abstained = true;
                self.abstain(candidates)
            }
        }
    }

    /// Accept the host's pick after an abstention and cache it as certain.
    pub async fn accept_host_choice(
        &self,
        agent_id: &str,
        query: &str,
        history: &[String],
    ) -> Result<Resolution, CatalogError> {
        if !self.catalog.has_agent(agent_id) {
            return Err(CatalogError::UnknownAgent(agent_id.to_string()));
        }

        let started = Instant::now();
        let mut record = RouteRecord::new();
        let request = RouteRequest {
            query: query.to_string(),
            history: history.to_vec(),
        };

        let mut state = EmbeddingState::NotComputed;
        if let Some(key) = self.cache_key_embedding(&request, &mut state).await {
            let outcome = self.route_cache.insert(key, agent_id, 1.0);
            debug!(?outcome, agent = agent_id, "Host choice cached");
        }

        let (enrichment, hit) = self.enrich(agent_id, query, &mut state).await;
        let resolution = self.resolution(agent_id.to_string(), 1.0, RouteSource::Host, enrichment, hit, &mut record);
        info!(agent = agent_id, "Host choice accepted");

        record.latency_ms = started.elapsed().as_millis() as u64;
        self.emit(&record);
        Ok(resolution)
    }

    // ── Inspection ────────────────────────────────────────────────────────

    /// The skills and implants that would be added for `agent_id`.
    pub async fn dynamic_context(&self, agent_id: &str, query: &str) -> Result<DynamicContext, CatalogError> {
        let profile = self.agent_profile(agent_id)?;
        let mut state = EmbeddingState::NotComputed;
        let embedding = self.query_embedding(query, &mut state).await;

        let skills = self.retrieve(Collection::Skills, embedding.as_deref(), Some(profile), None).await;
        let implants = self.retrieve(Collection::Implants, embedding.as_deref(), Some(profile), None).await;

        Ok(DynamicContext {
            content: join_sections([format_skills(&skills.entries).as_str(), format_implants(&implants.entries).as_str()]),
            skill_ids: skills.ids(),
            implant_ids: implants.ids(),
            degraded: skills.degraded || implants.degraded,
        })
    }

    /// Implants relevant to `query`, biased toward `agent_id`'s preferences.
    pub async fn relevant_implants(
        &self,
        query: &str,
        agent_id: Option<&str>,
        limit: usize,
    ) -> Result<DynamicContext, CatalogError> {
        let profile = agent_id.map(|id| self.agent_profile(id)).transpose()?;
        let mut state = EmbeddingState::NotComputed;
        let embedding = self.query_embedding(query, &mut state).await;

        let implants = self
            .retrieve(Collection::Implants, embedding.as_deref(), profile, Some(limit))
            .await;

        Ok(DynamicContext {
            content: format_implants(&implants.entries),
            skill_ids: Vec::new(),
            implant_ids: implants.ids(),
            degraded: implants.degraded,
        })
    }

    /// Fixed implant bundle for a task type.
    pub fn reasoning_strategy(&self, task_type: &str) -> StrategyLookup {
        let Ok(task) = task_type.parse::<TaskType>() else {
            return StrategyLookup::unknown(task_type);
        };

        let implants: Vec<_> = task
            .implant_ids()
            .iter()
            .filter_map(|id| {
                let entry = self.catalog.fragment(Collection::Implants, id);
                if entry.is_none() {
                    debug!(%id, task = %task, "Strategy implant not in catalog");
                }
                entry.cloned()
            })
            .collect();

        StrategyLookup::Found {
            task_type: task,
            implant_ids: implants.iter().map(|e| e.id.clone()).collect(),
            content: format_implants(&implants),
        }
    }

    /// Drop every memoised prompt; returns how many were removed.
    pub fn clear_session_cache(&self) -> usize {
        let removed = self.session_cache.clear();
        info!(removed, "Session cache cleared");
        removed
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            agents: self.catalog.len(Collection::Agents),
            skills: self.catalog.len(Collection::Skills),
            implants: self.catalog.len(Collection::Implants),
            route_cache_entries: self.route_cache.len(),
            route_cache_capacity: self.route_cache.capacity(),
            session_cache_entries: self.session_cache.len(),
            embedder: self.embedder.name().to_string(),
            store: self.catalog.store_name().to_string(),
            selector: self.selector.name().to_string(),
            default_agent: self.default_agent().to_string(),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn agent_profile(&self, agent_id: &str) -> Result<&AgentProfile, CatalogError> {
        self.catalog
            .agent(agent_id)
            .and_then(|entry| entry.as_agent())
            .ok_or_else(|| CatalogError::UnknownAgent(agent_id.to_string()))
    }

    /// Embedding of the normalised query, computed at most once per request.
    async fn query_embedding(&self, query: &str, state: &mut EmbeddingState) -> Option<Vec<f32>> {
        if let EmbeddingState::NotComputed = state {
            *state = match embed_with_timeout(self.embedder.as_ref(), &normalize_query(query), self.embed_timeout).await {
                Ok(vector) => EmbeddingState::Ready(vector),
                Err(e) => {
                    warn!(embedder = self.embedder.name(), error = %e, "Query embedding failed; degrading");
                    EmbeddingState::Failed
                }
            };
        }
        match state {
            EmbeddingState::Ready(vector) => Some(vector.clone()),
            _ => None,
        }
    }

    /// Route cache key: recent history plus the query, or the query alone.
    async fn cache_key_embedding(&self, request: &RouteRequest, state: &mut EmbeddingState) -> Option<Vec<f32>> {
        let history = request.history.join("\n");
        if history.trim().is_empty() || self.history_chars == 0 {
            return self.query_embedding(&request.query, state).await;
        }

        let text = format!(
            "{}\n{}",
            tail_chars(&history, self.history_chars),
            normalize_query(&request.query)
        );
        match embed_with_timeout(self.embedder.as_ref(), &text, self.embed_timeout).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!(error = %e, "History embedding failed; skipping route cache");
                None
            }
        }
    }

    async fn retrieve(
        &self,
        collection: Collection,
        embedding: Option<&[f32]>,
        agent: Option<&AgentProfile>,
        limit: Option<usize>,
    ) -> Retrieved {
        let k = limit.unwrap_or(self.retriever.policy(collection).k);
        self.retriever
            .retrieve(&self.catalog, collection, embedding, agent, k)
            .await
    }

    /// Full enrichment through the session cache.
    async fn enrich(&self, agent_id: &str, query: &str, state: &mut EmbeddingState) -> (Enrichment, bool) {
        self.session_cache
            .get_or_compute(EnrichmentScope::Full, agent_id, query, move || {
                self.compute_enrichment(agent_id, query, state)
            })
            .await
    }

    async fn compute_enrichment(&self, agent_id: &str, query: &str, state: &mut EmbeddingState) -> Enrichment {
        let entry = self.catalog.agent(agent_id);
        let profile = entry.and_then(|e| e.as_agent());
        let base = entry.map_or("", |e| e.text.as_str());

        let embedding = self.query_embedding(query, state).await;
        let skills = self.retrieve(Collection::Skills, embedding.as_deref(), profile, None).await;
        let implants = self.retrieve(Collection::Implants, embedding.as_deref(), profile, None).await;
        let directive = self.language.directive_for(query);

        let composite_prompt = assemble(
            base,
            &skills.entries,
            &implants.entries,
            directive.as_ref().map(|d| d.render()).as_deref(),
        );

        Enrichment {
            composite_prompt,
            skill_ids: skills.ids(),
            implant_ids: implants.ids(),
            language: directive.map(|d| d.code),
            degraded: skills.degraded || implants.degraded,
        }
    }

    /// Base prompt plus language directive; no embedding, no retrieval.
    async fn enrich_meta(&self, agent_id: &str, query: &str) -> (Enrichment, bool) {
        self.session_cache
            .get_or_compute(EnrichmentScope::Meta, agent_id, query, move || async move {
                let base = match self.catalog.agent(agent_id) {
                    Some(entry) => entry.text.as_str(),
                    None => {
                        warn!(agent = agent_id, "Default agent missing from catalog; empty base prompt");
                        ""
                    }
                };
                let directive = self.language.directive_for(query);
                Enrichment {
                    composite_prompt: assemble(base, &[], &[], directive.as_ref().map(|d| d.render()).as_deref()),
                    skill_ids: Vec::new(),
                    implant_ids: Vec::new(),
                    language: directive.map(|d| d.code),
                    degraded: false,
                }
            })
            .await
    }

    fn resolution(
        &self,
        agent_id: String,
        confidence: f32,
        source: RouteSource,
        enrichment: Enrichment,
        session_cache_hit: bool,
        record: &mut RouteRecord,
    ) -> Resolution {
        record.agent_id = Some(agent_id.clone());
        record.source = Some(source);
        record.session_cache_hit = session_cache_hit;
        record.degraded = enrichment.degraded;
        record.skill_ids = enrichment.skill_ids.clone();
        record.implant_ids = enrichment.implant_ids.clone();

        Resolution {
            agent_id,
            confidence,
            source,
            composite_prompt: enrichment.composite_prompt,
            skill_ids: enrichment.skill_ids,
            implant_ids: enrichment.implant_ids,
            language: enrichment.language,
            session_cache_hit,
            degraded: enrichment.degraded,
        }
    }

    fn abstain(&self, candidates: Vec<RankedCandidate>) -> Outcome {
        Outcome::Abstained {
            candidates,
            default_fallback: self.default_agent().to_string(),
        }
    }

    fn emit(&self, record: &RouteRecord) {
        for observer in &self.observers {
            if let Err(e) = observer.observe(record) {
                warn!(observer = observer.name(), error = %e, "Route observer failed");
            }
        }
    }
}
