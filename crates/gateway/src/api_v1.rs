//! HTTP API v1: the routing tool surface.
//!
//! Endpoints:
//!
//! - `POST   /v1/route`: Route a query through the full pipeline
//! - `POST   /v1/agents/{agent_id}/context`: Accept the host's pick after an abstention
//! - `POST   /v1/context`: Dynamic context for an agent
//! - `POST   /v1/implants`: Implants relevant to a query
//! - `GET    /v1/strategies/{task_type}`: Fixed reasoning strategy
//! - `DELETE /v1/session-cache`: Clear the session prompt cache
//! - `GET    /v1/agents`: List agents
//! - `GET    /v1/stats`: Engine and telemetry snapshot
//! - `GET    /v1/routes/recent`: Most recent route records

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use skillroute_core::error::CatalogError;
use skillroute_core::{CatalogEntry, Outcome, RankedCandidate, Resolution, RouteSource};
use skillroute_router::{DynamicContext, EngineStats, RouteRequest, StrategyLookup};
use skillroute_telemetry::{RouteStats, TracedRoute};

use crate::SharedState;

/// Implants returned by `/v1/implants` when the request names no limit.
const DEFAULT_IMPLANT_LIMIT: usize = 5;
/// Records returned by `/v1/routes/recent` when the request names no limit.
const DEFAULT_RECENT_LIMIT: usize = 20;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/route", post(route_handler))
        .route("/agents", get(list_agents_handler))
        .route("/agents/{agent_id}/context", post(host_choice_handler))
        .route("/context", post(context_handler))
        .route("/implants", post(implants_handler))
        .route("/strategies/{task_type}", get(strategy_handler))
        .route("/session-cache", delete(clear_session_cache_handler))
        .route("/stats", get(stats_handler))
        .route("/routes/recent", get(recent_routes_handler))
        .with_state(state)
}

// ── Types ─────────────────────────────────────────────────────────────────

/// Response of `/v1/route` and `/v1/agents/{agent_id}/context`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteResponse {
    Resolved {
        agent: String,
        confidence: f32,
        source: RouteSource,
        system_prompt: String,
        skills: Vec<String>,
        implants: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        route_cache_hit: bool,
        session_cache_hit: bool,
        degraded: bool,
    },
    Abstained {
        candidates: Vec<RankedCandidate>,
        default_fallback: String,
        available_agents: Vec<AgentSummary>,
        instruction: String,
    },
}

impl RouteResponse {
    fn resolved(resolution: Resolution) -> Self {
        Self::Resolved {
            route_cache_hit: resolution.source == RouteSource::RouteCache,
            agent: resolution.agent_id,
            confidence: resolution.confidence,
            source: resolution.source,
            system_prompt: resolution.composite_prompt,
            skills: resolution.skill_ids,
            implants: resolution.implant_ids,
            language: resolution.language,
            session_cache_hit: resolution.session_cache_hit,
            degraded: resolution.degraded,
        }
    }

    fn from_outcome(outcome: Outcome, agents: &[CatalogEntry]) -> Self {
        match outcome {
            Outcome::Resolved(resolution) => Self::resolved(resolution),
            Outcome::Abstained {
                candidates,
                default_fallback,
            } => Self::Abstained {
                instruction: format!(
                    "Select the best agent from the candidates and POST the query to \
                     /v1/agents/{{agent_id}}/context. If the domain is unclear or ambiguous, \
                     use '{default_fallback}' as the safe default."
                ),
                candidates,
                default_fallback,
                available_agents: agents.iter().filter_map(AgentSummary::from_entry).collect(),
            },
        }
    }
}

/// One row of the agent listing.
#[derive(Debug, Serialize)]
pub struct AgentSummary {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

impl AgentSummary {
    fn from_entry(entry: &CatalogEntry) -> Option<Self> {
        let profile = entry.as_agent()?;
        Some(Self {
            id: entry.id.clone(),
            display_name: profile.display_name.clone(),
            description: profile.description.clone(),
            keywords: profile.domain_keywords.clone(),
            trigger: profile.trigger_command.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct HostChoiceRequest {
    query: String,
    #[serde(default)]
    history: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ContextRequest {
    agent: String,
    query: String,
}

#[derive(Debug, Deserialize)]
struct ImplantsRequest {
    query: String,
    #[serde(default)]
    agent: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ClearedResponse {
    cleared: usize,
}

#[derive(Serialize)]
struct StatsResponse {
    engine: EngineStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    routes: Option<RouteStats>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn catalog_error(err: CatalogError) -> ApiError {
    let status = match err {
        CatalogError::UnknownAgent(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    warn!(%err, status = status.as_u16(), "Request rejected");
    (status, Json(ErrorResponse { error: err.to_string() }))
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn route_handler(
    State(state): State<SharedState>,
    Json(request): Json<RouteRequest>,
) -> Json<RouteResponse> {
    let outcome = state.engine.route(&request).await;
    Json(RouteResponse::from_outcome(outcome, state.engine.catalog().agents()))
}

async fn host_choice_handler(
    State(state): State<SharedState>,
    Path(agent_id): Path<String>,
    Json(request): Json<HostChoiceRequest>,
) -> Result<Json<RouteResponse>, ApiError> {
    let resolution = state
        .engine
        .accept_host_choice(&agent_id, &request.query, &request.history)
        .await
        .map_err(catalog_error)?;
    Ok(Json(RouteResponse::resolved(resolution)))
}

async fn context_handler(
    State(state): State<SharedState>,
    Json(request): Json<ContextRequest>,
) -> Result<Json<DynamicContext>, ApiError> {
    state
        .engine
        .dynamic_context(&request.agent, &request.query)
        .await
        .map(Json)
        .map_err(catalog_error)
}

async fn implants_handler(
    State(state): State<SharedState>,
    Json(request): Json<ImplantsRequest>,
) -> Result<Json<DynamicContext>, ApiError> {
    let limit = request.limit.unwrap_or(DEFAULT_IMPLANT_LIMIT);
    state
        .engine
        .relevant_implants(&request.query, request.agent.as_deref(), limit)
        .await
        .map(Json)
        .map_err(catalog_error)
}

async fn strategy_handler(
    State(state): State<SharedState>,
    Path(task_type): Path<String>,
) -> (StatusCode, Json<StrategyLookup>) {
    let lookup = state.engine.reasoning_strategy(&task_type);
    let status = match lookup {
        StrategyLookup::Found { .. } => StatusCode::OK,
        StrategyLookup::UnknownStrategy { .. } => {
            debug!(%task_type, "Unknown strategy requested");
            StatusCode::NOT_FOUND
        }
    };
    (status, Json(lookup))
}

async fn clear_session_cache_handler(State(state): State<SharedState>) -> Json<ClearedResponse> {
    Json(ClearedResponse {
        cleared: state.engine.clear_session_cache(),
    })
}

async fn list_agents_handler(State(state): State<SharedState>) -> Json<Vec<AgentSummary>> {
    Json(
        state
            .engine
            .catalog()
            .agents()
            .iter()
            .filter_map(AgentSummary::from_entry)
            .collect(),
    )
}

async fn stats_handler(State(state): State<SharedState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        engine: state.engine.stats(),
        routes: state.recorder.as_ref().map(|r| r.stats()),
    })
}

async fn recent_routes_handler(
    State(state): State<SharedState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<TracedRoute>>, StatusCode> {
    let recorder = state.recorder.as_ref().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(recorder.recent(query.limit.unwrap_or(DEFAULT_RECENT_LIMIT))))
}
