//! HTTP tool surface for skillroute.
//!
//! Exposes the routing engine to an external host (an IDE assistant, a chat
//! front end) as JSON endpoints: route a query, accept the host's pick after
//! an abstention, fetch dynamic context, relevant implants, and reasoning
//! strategies, and inspect the caches and telemetry.
//!
//! Built on Axum.

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use skillroute_router::RoutingEngine;
use skillroute_telemetry::RouteRecorder;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub engine: Arc<RoutingEngine>,

    /// Present when telemetry is enabled; also registered as an engine observer
    pub recorder: Option<Arc<RouteRecorder>>,
}

impl GatewayState {
    pub fn new(engine: Arc<RoutingEngine>) -> Self {
        Self { engine, recorder: None }
    }

    pub fn with_recorder(mut self, recorder: Arc<RouteRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the full router: `/health` plus the v1 API under `/v1`.
///
/// Layers applied:
/// - CORS limited to loopback origins
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin, _| {
            let origin = origin.as_bytes();
            origin.starts_with(b"http://localhost") || origin.starts_with(b"http://127.0.0.1")
        }))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server on the configured address.
pub async fn start(
    config: &skillroute_config::GatewayConfig,
    state: SharedState,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.host, config.port);
    let stats = state.engine.stats();
    let app = build_router(state);

    info!(
        addr = %addr,
        agents = stats.agents,
        skills = stats.skills,
        implants = stats.implants,
        "Gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
