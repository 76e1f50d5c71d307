//! The routing core of skillroute.
//!
//! A query passes through a cheap meta-query check, an explicit trigger
//! check, the semantic route cache, and the agent selector. A resolved agent
//! then gets its composite prompt from the session cache or, on a miss, from
//! fragment retrieval, language detection, and assembly:
//!
//! 1. **Classify** the query (meta / trigger / substantive)
//! 2. **Resolve** an agent (route cache, selector, or the host)
//! 3. **Enrich** the agent's base prompt with skills, implants, and a
//!    language directive
//!
//! When the selector abstains, the ranked candidates go back to the host,
//! whose pick is accepted through [`RoutingEngine::accept_host_choice`].

pub mod context;
pub mod engine;
pub mod language;
pub mod meta;
pub mod retriever;
pub mod route_cache;
pub mod selector;
pub mod strategies;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{Enrichment, EnrichmentScope, SessionPromptCache, assemble, session_key};
pub use engine::{DynamicContext, EngineStats, RouteRequest, RoutingEngine};
pub use language::{LanguageClassifier, LanguageDirective, LanguageDirectiveInjector, Verdict, WhatlangClassifier};
pub use meta::{MetaClassifier, MetaVerdict};
pub use retriever::{FragmentRetriever, RetrievalPolicy, Retrieved};
pub use route_cache::{INSERT_MIN_CONFIDENCE, InsertOutcome, LOOKUP_MAX_DISTANCE, RouteHit, SemanticRouteCache};
pub use selector::{AgentSelector, BlendedSelector, Selection};
pub use strategies::{StrategyLookup, TaskType};
