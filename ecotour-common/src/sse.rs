//! Server-Sent Events (SSE) utilities

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::events::{EventBus, TourEvent};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Convert a TourEvent into an SSE frame
///
/// Returns `None` if the event cannot be serialized.
pub fn to_sse_event(event: &TourEvent) -> Option<Event> {
    let event_type = event.event_type();
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event(event_type).data(json)),
        Err(e) => {
            warn!("SSE: Failed to serialize event {}: {}", event_type, e);
            None
        }
    }
}

/// Create an SSE stream forwarding every event on the bus
///
/// Sends a `ConnectionStatus` frame first, then events in emission order with
/// heartbeats every 15 seconds. A lagging client is told how many events it
/// missed via a `Lagged` frame and continues from the oldest retained event.
pub fn create_event_bus_sse_stream(
    event_bus: &EventBus,
    service_name: &'static str,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);

    let mut rx = event_bus.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("ConnectionStatus").data("connected"));

        loop {
            tokio::select! {
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }
                received = rx.recv() => {
                    match received {
                        Ok(event) => {
                            if let Some(frame) = to_sse_event(&event) {
                                debug!("SSE: Broadcasting {}", event.event_type());
                                yield Ok(frame);
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(
                                "SSE: {} client lagged, {} events skipped",
                                service_name, skipped
                            );
                            yield Ok(Event::default().event("Lagged").data(skipped.to_string()));
                        }
                        Err(RecvError::Closed) => {
                            info!("SSE: {} event bus closed", service_name);
                            break;
                        }
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(HEARTBEAT_INTERVAL).text("heartbeat"))
}
