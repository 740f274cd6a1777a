//! Map sink implementations
//!
//! [`EventBusMapSink`] forwards commands to map renderers over the EventBus
//! (and from there to SSE clients). [`RecordingMapSink`] keeps them in memory.

use async_trait::async_trait;
use ecotour_common::events::{EventBus, MapCommand, TourEvent};
use ecotour_common::{Poi, Tour};
use std::sync::Mutex;
use tracing::debug;

use crate::types::MapSink;

/// Publishes map commands as `TourEvent::MapCommand`
#[derive(Clone)]
pub struct EventBusMapSink {
    event_bus: EventBus,
}

impl EventBusMapSink {
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }

    fn send(&self, command: MapCommand) {
        debug!(command = command.command_type(), "Map command");
        self.event_bus.emit_lossy(TourEvent::map_command(command));
    }
}

#[async_trait]
impl MapSink for EventBusMapSink {
    async fn draw_route(&self, tour: &Tour) {
        self.send(MapCommand::DrawRoute { tour: tour.clone() });
    }

    fn add_marker(&self, poi: &Poi) {
        self.send(MapCommand::AddMarker { poi: poi.clone() });
    }

    fn remove_marker(&self, name: &str) {
        self.send(MapCommand::RemoveMarker {
            name: name.to_string(),
        });
    }

    fn clear_map(&self) {
        self.send(MapCommand::ClearMap);
    }
}

/// Records every command it receives, in order
#[derive(Default)]
pub struct RecordingMapSink {
    commands: Mutex<Vec<MapCommand>>,
}

impl RecordingMapSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received so far
    pub fn commands(&self) -> Vec<MapCommand> {
        self.commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn record(&self, command: MapCommand) {
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command);
        }
    }
}

#[async_trait]
impl MapSink for RecordingMapSink {
    async fn draw_route(&self, tour: &Tour) {
        self.record(MapCommand::DrawRoute { tour: tour.clone() });
    }

    fn add_marker(&self, poi: &Poi) {
        self.record(MapCommand::AddMarker { poi: poi.clone() });
    }

    fn remove_marker(&self, name: &str) {
        self.record(MapCommand::RemoveMarker {
            name: name.to_string(),
        });
    }

    fn clear_map(&self) {
        self.record(MapCommand::ClearMap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecotour_common::Coordinates;

    #[tokio::test]
    async fn test_event_bus_sink_publishes_commands() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let sink = EventBusMapSink::new(bus);

        sink.add_marker(&Poi::new("Ribeira", Coordinates::new(41.14, -8.61), ""));
        sink.remove_marker("Ribeira");

        match rx.recv().await.unwrap() {
            TourEvent::MapCommand {
                command: MapCommand::AddMarker { poi },
                ..
            } => assert_eq!(poi.name, "Ribeira"),
            other => panic!("unexpected event {:?}", other),
        }
        match rx.recv().await.unwrap() {
            TourEvent::MapCommand { command, .. } => assert_eq!(
                command,
                MapCommand::RemoveMarker {
                    name: "Ribeira".to_string()
                }
            ),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingMapSink::new();
        sink.clear_map();
        sink.remove_marker("x");
        assert_eq!(
            sink.commands(),
            vec![
                MapCommand::ClearMap,
                MapCommand::RemoveMarker {
                    name: "x".to_string()
                }
            ]
        );
    }
}
