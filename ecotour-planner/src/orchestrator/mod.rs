//! Tour orchestrator
//!
//! Owns the current tour and the observable [`OrchestratorState`]. A single
//! tokio task receives commands from an mpsc queue and handles each one to
//! completion, including every awaited service call, before taking the next.
//! That ordering is what keeps concurrent edits from losing updates; no lock
//! guards the state because only this task ever replaces it.
//!
//! Every replacement is published to the `watch` channel (latest value), to
//! each [`StateSubscription`] (full history, emission order) and to the
//! EventBus as `TourEvent::StateChanged` for SSE clients.

mod handle;

pub use handle::{OrchestratorHandle, StateSubscription};

use handle::StateSubscribers;

use ecotour_common::events::{EventBus, TourEvent};
use ecotour_common::models::is_current_location;
use ecotour_common::{OrchestratorState, Poi, TourRequest};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::pipeline::{recompute, reoptimize, TourBuilder};
use crate::types::{MapSink, RouteOptimizer, TourError, TourStore};

/// Events accepted by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestratorEvent {
    /// Build a new tour from scratch
    LoadTour(TourRequest),
    /// Append a POI and re-optimize
    AddPoi(Poi),
    /// Remove a POI by name and re-optimize
    RemovePoi(String),
    /// Toggle whether the user follows the route
    JoinTour,
    /// Drop the active tour
    ResetTour,
    /// Refresh the saved-tour listing
    LoadSavedTours,
    /// Make a persisted tour the active one
    LoadTourFromSaved(String),
}

impl OrchestratorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OrchestratorEvent::LoadTour(_) => "LoadTour",
            OrchestratorEvent::AddPoi(_) => "AddPoi",
            OrchestratorEvent::RemovePoi(_) => "RemovePoi",
            OrchestratorEvent::JoinTour => "JoinTour",
            OrchestratorEvent::ResetTour => "ResetTour",
            OrchestratorEvent::LoadSavedTours => "LoadSavedTours",
            OrchestratorEvent::LoadTourFromSaved(_) => "LoadTourFromSaved",
        }
    }
}

/// Queue entries processed by the orchestrator task
pub(crate) enum Command {
    Event {
        event: OrchestratorEvent,
        done: Option<oneshot::Sender<OrchestratorState>>,
    },
    Save {
        name: String,
        reply: oneshot::Sender<Result<Option<String>, TourError>>,
    },
}

/// Orchestrator task state
pub struct TourOrchestrator {
    state: OrchestratorState,
    builder: TourBuilder,
    optimizer: Arc<dyn RouteOptimizer>,
    store: Arc<dyn TourStore>,
    map_sink: Arc<dyn MapSink>,
    state_tx: watch::Sender<OrchestratorState>,
    subscribers: StateSubscribers,
    event_bus: EventBus,
}

impl TourOrchestrator {
    /// Start the orchestrator task
    ///
    /// The task stops once every [`OrchestratorHandle`] has been dropped.
    pub fn spawn(
        builder: TourBuilder,
        store: Arc<dyn TourStore>,
        map_sink: Arc<dyn MapSink>,
        event_bus: EventBus,
    ) -> OrchestratorHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(OrchestratorState::default());
        let subscribers: StateSubscribers = Arc::new(Mutex::new(Vec::new()));

        let orchestrator = Self {
            state: OrchestratorState::default(),
            optimizer: builder.optimizer(),
            builder,
            store,
            map_sink,
            state_tx,
            subscribers: Arc::clone(&subscribers),
            event_bus,
        };

        tokio::spawn(orchestrator.run(rx));

        OrchestratorHandle::new(tx, state_rx, subscribers)
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        info!("Tour orchestrator started");

        while let Some(command) = rx.recv().await {
            match command {
                Command::Event { event, done } => {
                    debug!(event = event.name(), "Handling event");
                    self.handle_event(event).await;
                    if let Some(done) = done {
                        let _ = done.send(self.state.clone());
                    }
                }
                Command::Save { name, reply } => {
                    let result = self.save_current_tour(&name).await;
                    let _ = reply.send(result);
                }
            }
        }

        // Ends every open subscription
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.clear();
        }
        info!("Tour orchestrator stopped");
    }

    async fn handle_event(&mut self, event: OrchestratorEvent) {
        match event {
            OrchestratorEvent::LoadTour(request) => self.load_tour(request).await,
            OrchestratorEvent::AddPoi(poi) => self.add_poi(poi).await,
            OrchestratorEvent::RemovePoi(name) => self.remove_poi(name).await,
            OrchestratorEvent::JoinTour => {
                let joined = !self.state.joined;
                info!(joined, "Join flag toggled");
                self.publish(OrchestratorState {
                    joined,
                    ..self.state.clone()
                });
            }
            OrchestratorEvent::ResetTour => {
                info!("Tour reset");
                self.publish(OrchestratorState {
                    tour: None,
                    joined: false,
                    ..self.state.clone()
                });
                self.map_sink.clear_map();
            }
            OrchestratorEvent::LoadSavedTours => self.load_saved_tours().await,
            OrchestratorEvent::LoadTourFromSaved(id) => self.load_tour_from_saved(id).await,
        }
    }

    async fn load_tour(&mut self, request: TourRequest) {
        self.publish(self.state.begin_loading());

        match self.builder.build(&request).await {
            Ok(tour) => {
                self.publish(OrchestratorState {
                    tour: Some(tour.clone()),
                    loading: false,
                    ..self.state.clone()
                });
                self.map_sink.draw_route(&tour).await;
            }
            Err(e) => {
                warn!(city = %request.city, error = %e, "Tour build failed");
                self.publish(self.state.failed());
            }
        }
    }

    async fn add_poi(&mut self, poi: Poi) {
        let Some(current) = self.state.tour.clone() else {
            debug!(poi = %poi.name, "AddPoi without active tour ignored");
            return;
        };
        if current.contains_poi(&poi.name) {
            warn!(poi = %poi.name, "POI already in tour, AddPoi ignored");
            return;
        }

        self.publish(self.state.begin_loading());

        let mut pois = current.pois.clone();
        pois.push(poi.clone());

        match reoptimize(self.optimizer.as_ref(), &pois, &current).await {
            Ok(tour) => {
                info!(poi = %poi.name, pois = tour.pois.len(), "POI added");
                self.publish(OrchestratorState {
                    tour: Some(tour.clone()),
                    loading: false,
                    ..self.state.clone()
                });
                self.map_sink.draw_route(&tour).await;
                self.map_sink.add_marker(&poi);
            }
            Err(e) => {
                warn!(poi = %poi.name, error = %e, "Recompute after AddPoi failed");
                self.publish(self.state.failed());
            }
        }
    }

    async fn remove_poi(&mut self, name: String) {
        let Some(current) = self.state.tour.clone() else {
            debug!(poi = %name, "RemovePoi without active tour ignored");
            return;
        };

        // Removing the user's own position always ends following the route
        let leaves_route = is_current_location(&name);

        if !current.contains_poi(&name) {
            debug!(poi = %name, "RemovePoi for unknown POI ignored");
            if leaves_route && self.state.joined {
                self.publish(OrchestratorState {
                    joined: false,
                    ..self.state.clone()
                });
            }
            return;
        }

        let joined = !leaves_route && self.state.joined;

        self.publish(OrchestratorState {
            joined,
            ..self.state.begin_loading()
        });

        let pois: Vec<Poi> = current
            .pois
            .iter()
            .filter(|p| p.name != name)
            .cloned()
            .collect();

        match recompute(self.optimizer.as_ref(), pois, &current).await {
            Ok(Some(tour)) => {
                info!(poi = %name, pois = tour.pois.len(), "POI removed");
                self.publish(OrchestratorState {
                    tour: Some(tour.clone()),
                    loading: false,
                    ..self.state.clone()
                });
                self.map_sink.draw_route(&tour).await;
                self.map_sink.remove_marker(&name);
            }
            Ok(None) => {
                self.publish(OrchestratorState {
                    tour: None,
                    loading: false,
                    joined: false,
                    ..self.state.clone()
                });
                self.map_sink.remove_marker(&name);
                self.map_sink.clear_map();
            }
            Err(e) => {
                warn!(poi = %name, error = %e, "Recompute after RemovePoi failed");
                self.publish(self.state.failed());
            }
        }
    }

    async fn load_saved_tours(&mut self) {
        self.publish(self.state.begin_loading());

        match self.store.list_saved().await {
            Ok(saved_tours) => {
                debug!(count = saved_tours.len(), "Saved tours loaded");
                self.publish(OrchestratorState {
                    saved_tours,
                    loading: false,
                    ..self.state.clone()
                });
            }
            Err(e) => {
                warn!(error = %e, "Listing saved tours failed");
                self.publish(self.state.failed());
            }
        }
    }

    async fn load_tour_from_saved(&mut self, id: String) {
        self.publish(self.state.begin_loading());

        match self.store.get_by_id(&id).await {
            Ok(Some(tour)) if !tour.pois.is_empty() => {
                info!(tour_id = %id, city = %tour.city, "Saved tour loaded");
                self.publish(OrchestratorState {
                    tour: Some(tour.clone()),
                    loading: false,
                    ..self.state.clone()
                });
                self.map_sink.draw_route(&tour).await;
            }
            Ok(Some(_)) => {
                warn!(tour_id = %id, "Saved tour has no POIs");
                self.publish(self.state.failed());
            }
            Ok(None) => {
                warn!(tour_id = %id, "Saved tour not found");
                self.publish(self.state.failed());
            }
            Err(e) => {
                warn!(tour_id = %id, error = %e, "Loading saved tour failed");
                self.publish(self.state.failed());
            }
        }
    }

    async fn save_current_tour(&mut self, name: &str) -> Result<Option<String>, TourError> {
        let Some(tour) = self.state.tour.clone() else {
            debug!("Save without active tour ignored");
            return Ok(None);
        };
        if name.trim().is_empty() {
            return Err(TourError::InvalidRequest("tour name must not be empty".to_string()));
        }

        match self.store.save(&tour, name.trim()).await {
            Ok(id) => {
                info!(tour_id = %id, name = %name.trim(), "Tour saved");
                Ok(Some(id))
            }
            Err(e) => {
                warn!(error = %e, "Saving tour failed");
                self.publish(self.state.failed());
                Err(e)
            }
        }
    }

    /// Replace the state and broadcast it
    fn publish(&mut self, state: OrchestratorState) {
        self.state = state;
        self.state_tx.send_replace(self.state.clone());
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|tx| tx.send(self.state.clone()).is_ok());
        }
        self.event_bus
            .emit_lossy(TourEvent::state_changed(self.state.clone()));
    }
}
