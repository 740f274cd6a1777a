//! Saved tour endpoints
//!
//! GET /tours, POST /tours/:id/load

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use ecotour_common::OrchestratorState;

use super::run_event;
use crate::error::ApiResult;
use crate::orchestrator::OrchestratorEvent;
use crate::AppState;

/// GET /tours
///
/// Refreshes the saved-tour listing; the list is in `saved_tours`.
pub async fn list_saved_tours(State(state): State<AppState>) -> ApiResult<Json<OrchestratorState>> {
    Ok(Json(run_event(&state, OrchestratorEvent::LoadSavedTours).await?))
}

/// POST /tours/:id/load
pub async fn load_saved_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<OrchestratorState>> {
    Ok(Json(
        run_event(&state, OrchestratorEvent::LoadTourFromSaved(id)).await?,
    ))
}

/// Build saved tour routes
pub fn saved_routes() -> Router<AppState> {
    Router::new()
        .route("/tours", get(list_saved_tours))
        .route("/tours/:id/load", post(load_saved_tour))
}
