//! HTTP API handlers for ecotour-planner
//!
//! JSON endpoints driving the orchestrator plus an SSE event stream

pub mod health;
pub mod saved;
pub mod sse;
pub mod tour;

pub use health::health_routes;
pub use saved::saved_routes;
pub use sse::event_stream;
pub use tour::tour_routes;

use ecotour_common::OrchestratorState;

use crate::error::{ApiError, ApiResult};
use crate::orchestrator::OrchestratorEvent;
use crate::AppState;

/// Dispatch an event, wait for it to be handled, and remember failures for /health
pub(crate) async fn run_event(
    state: &AppState,
    event: OrchestratorEvent,
) -> ApiResult<OrchestratorState> {
    let name = event.name();
    let result = state
        .orchestrator
        .dispatch_and_wait(event)
        .await
        .map_err(ApiError::from)?;

    if result.has_error {
        *state.last_error.write().await = Some(format!("{} failed", name));
    }

    Ok(result)
}
