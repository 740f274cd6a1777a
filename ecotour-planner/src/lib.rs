//! ecotour-planner library interface
//!
//! Exposes the orchestrator, pipelines, service clients and HTTP router for
//! the binary and for integration testing.

pub mod api;
pub mod db;
pub mod error;
pub mod map_sink;
pub mod orchestrator;
pub mod pipeline;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult};
pub use crate::orchestrator::{
    OrchestratorEvent, OrchestratorHandle, StateSubscription, TourOrchestrator,
};
pub use crate::types::TourError;

use axum::Router;
use chrono::{DateTime, Utc};
use ecotour_common::config::ServicesConfig;
use ecotour_common::events::EventBus;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::pipeline::TourBuilder;
use crate::services::{PlacesClient, RouteClient, SuggestionClient};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Handle to the running tour orchestrator
    pub orchestrator: OrchestratorHandle,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(orchestrator: OrchestratorHandle, event_bus: EventBus) -> Self {
        Self {
            orchestrator,
            event_bus,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Tour builder wired to the HTTP service clients
pub fn build_tour_builder(services: &ServicesConfig) -> Result<TourBuilder, TourError> {
    Ok(TourBuilder::new(
        Arc::new(SuggestionClient::from_config(services)?),
        Arc::new(PlacesClient::from_config(services)?),
        Arc::new(RouteClient::from_config(services)?),
    ))
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::tour_routes())
        .merge(api::saved_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
