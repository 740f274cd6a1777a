//! Server-Sent Events for state changes and map commands

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /events - SSE stream of every TourEvent
///
/// Streams:
/// - StateChanged (each orchestrator state, in emission order)
/// - MapCommand (DrawRoute, AddMarker, RemoveMarker, ClearMap)
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    ecotour_common::sse::create_event_bus_sse_stream(&state.event_bus, "ecotour-planner")
}
