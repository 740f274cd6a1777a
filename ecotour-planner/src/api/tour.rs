//! Active tour endpoints
//!
//! GET /tour, POST /tour/load, POST /tour/pois, DELETE /tour/pois/:name,
//! POST /tour/join, POST /tour/reset, POST /tour/save

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use ecotour_common::{OrchestratorState, Poi, TourRequest};
use serde::{Deserialize, Serialize};

use super::run_event;
use crate::error::{ApiError, ApiResult};
use crate::orchestrator::OrchestratorEvent;
use crate::AppState;

/// POST /tour/save request
#[derive(Debug, Deserialize)]
pub struct SaveTourRequest {
    pub name: String,
}

/// POST /tour/save response
#[derive(Debug, Serialize)]
pub struct SaveTourResponse {
    pub id: String,
}

/// GET /tour
pub async fn get_tour(State(state): State<AppState>) -> Json<OrchestratorState> {
    Json(state.orchestrator.current_state())
}

/// POST /tour/load
///
/// Builds a new tour. Returns the resulting state; a failed build is reported
/// through `has_error`, not an HTTP error.
pub async fn load_tour(
    State(state): State<AppState>,
    Json(request): Json<TourRequest>,
) -> ApiResult<Json<OrchestratorState>> {
    tracing::info!(
        city = %request.city,
        desired_count = request.desired_count,
        "Tour load requested"
    );
    Ok(Json(run_event(&state, OrchestratorEvent::LoadTour(request)).await?))
}

/// POST /tour/pois
pub async fn add_poi(
    State(state): State<AppState>,
    Json(poi): Json<Poi>,
) -> ApiResult<Json<OrchestratorState>> {
    if poi.name.trim().is_empty() {
        return Err(ApiError::BadRequest("POI name must not be empty".to_string()));
    }
    if !poi.coordinates.is_valid() {
        return Err(ApiError::BadRequest(format!(
            "Invalid coordinates for POI {}",
            poi.name
        )));
    }
    Ok(Json(run_event(&state, OrchestratorEvent::AddPoi(poi)).await?))
}

/// DELETE /tour/pois/:name
pub async fn remove_poi(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<OrchestratorState>> {
    Ok(Json(run_event(&state, OrchestratorEvent::RemovePoi(name)).await?))
}

/// POST /tour/join
pub async fn join_tour(State(state): State<AppState>) -> ApiResult<Json<OrchestratorState>> {
    Ok(Json(run_event(&state, OrchestratorEvent::JoinTour).await?))
}

/// POST /tour/reset
pub async fn reset_tour(State(state): State<AppState>) -> ApiResult<Json<OrchestratorState>> {
    Ok(Json(run_event(&state, OrchestratorEvent::ResetTour).await?))
}

/// POST /tour/save
///
/// 409 Conflict when there is no active tour.
pub async fn save_tour(
    State(state): State<AppState>,
    Json(request): Json<SaveTourRequest>,
) -> ApiResult<Json<SaveTourResponse>> {
    match state.orchestrator.save_current_tour(&request.name).await? {
        Some(id) => Ok(Json(SaveTourResponse { id })),
        None => Err(ApiError::Conflict("No active tour to save".to_string())),
    }
}

/// Build active tour routes
pub fn tour_routes() -> Router<AppState> {
    Router::new()
        .route("/tour", get(get_tour))
        .route("/tour/load", post(load_tour))
        .route("/tour/pois", post(add_poi))
        .route("/tour/pois/:name", delete(remove_poi))
        .route("/tour/join", post(join_tour))
        .route("/tour/reset", post(reset_tour))
        .route("/tour/save", post(save_tour))
}
