//! Event types for EcoTour
//!
//! Provides the shared event definitions and EventBus used by the planner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::{OrchestratorState, Poi, Tour};

/// Command for a map renderer
///
/// `DrawRoute` is the only command the orchestrator waits on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum MapCommand {
    /// Replace the rendered route with this tour
    DrawRoute { tour: Tour },
    /// Show a single marker
    AddMarker { poi: Poi },
    /// Remove the marker with this POI name
    RemoveMarker { name: String },
    /// Remove route and all markers
    ClearMap,
}

impl MapCommand {
    pub fn command_type(&self) -> &'static str {
        match self {
            MapCommand::DrawRoute { .. } => "DrawRoute",
            MapCommand::AddMarker { .. } => "AddMarker",
            MapCommand::RemoveMarker { .. } => "RemoveMarker",
            MapCommand::ClearMap => "ClearMap",
        }
    }
}

/// EcoTour event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TourEvent {
    /// Orchestrator state replaced
    ///
    /// Triggers:
    /// - SSE: Update connected UIs
    /// - State subscriptions: next value in emission order
    StateChanged {
        state: OrchestratorState,
        timestamp: DateTime<Utc>,
    },

    /// Command for map renderers
    MapCommand {
        command: MapCommand,
        timestamp: DateTime<Utc>,
    },
}

impl TourEvent {
    pub fn state_changed(state: OrchestratorState) -> Self {
        TourEvent::StateChanged {
            state,
            timestamp: Utc::now(),
        }
    }

    pub fn map_command(command: MapCommand) -> Self {
        TourEvent::MapCommand {
            command,
            timestamp: Utc::now(),
        }
    }

    /// Event name used as the SSE event field
    pub fn event_type(&self) -> &str {
        match self {
            TourEvent::StateChanged { .. } => "StateChanged",
            TourEvent::MapCommand { .. } => "MapCommand",
        }
    }
}

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use ecotour_common::events::{EventBus, MapCommand, TourEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(TourEvent::map_command(MapCommand::ClearMap));
///
/// // In async context:
/// // while let Ok(event) = rx.recv().await { ... }
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TourEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<TourEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: TourEvent) -> Result<usize, broadcast::error::SendError<TourEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: TourEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
