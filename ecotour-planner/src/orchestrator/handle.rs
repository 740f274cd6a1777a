//! Client side of the orchestrator: dispatch, state reads, subscriptions

use ecotour_common::OrchestratorState;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot, watch};

use super::{Command, OrchestratorEvent};
use crate::types::TourError;

/// Senders of every live [`StateSubscription`]
pub(crate) type StateSubscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<OrchestratorState>>>>;

/// Cloneable handle to a running orchestrator
///
/// This is the only mutation surface: events go through the queue, reads come
/// from the latest published state.
#[derive(Clone)]
pub struct OrchestratorHandle {
    tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<OrchestratorState>,
    subscribers: StateSubscribers,
}

impl OrchestratorHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<Command>,
        state_rx: watch::Receiver<OrchestratorState>,
        subscribers: StateSubscribers,
    ) -> Self {
        Self {
            tx,
            state_rx,
            subscribers,
        }
    }

    /// Queue an event without waiting for it to be handled
    pub fn dispatch(&self, event: OrchestratorEvent) -> Result<(), TourError> {
        self.tx
            .send(Command::Event { event, done: None })
            .map_err(|_| TourError::Closed)
    }

    /// Queue an event and wait for the state after it was handled
    pub async fn dispatch_and_wait(
        &self,
        event: OrchestratorEvent,
    ) -> Result<OrchestratorState, TourError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(Command::Event {
                event,
                done: Some(done_tx),
            })
            .map_err(|_| TourError::Closed)?;
        done_rx.await.map_err(|_| TourError::Closed)
    }

    /// Persist the active tour under `name`
    ///
    /// Returns `Ok(None)` when there is no active tour.
    pub async fn save_current_tour(&self, name: &str) -> Result<Option<String>, TourError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Save {
                name: name.to_string(),
                reply: reply_tx,
            })
            .map_err(|_| TourError::Closed)?;
        reply_rx.await.map_err(|_| TourError::Closed)?
    }

    /// Latest published state
    pub fn current_state(&self) -> OrchestratorState {
        self.state_rx.borrow().clone()
    }

    /// Observe every subsequent state in emission order
    ///
    /// Each subscription has its own unbounded queue, so a slow observer
    /// never misses a state; map commands and SSE traffic on the EventBus do
    /// not share it.
    pub fn subscribe(&self) -> StateSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        StateSubscription { rx }
    }
}

/// Sequence of orchestrator states
///
/// Created by [`OrchestratorHandle::subscribe`]. Drop it or call
/// [`StateSubscription::unsubscribe`] to stop receiving; the orchestrator
/// forgets a subscription on its next publish after it is dropped.
pub struct StateSubscription {
    rx: mpsc::UnboundedReceiver<OrchestratorState>,
}

impl StateSubscription {
    /// Next state, or `None` once the orchestrator has stopped
    pub async fn next(&mut self) -> Option<OrchestratorState> {
        self.rx.recv().await
    }

    /// Stop receiving states
    pub fn unsubscribe(mut self) {
        self.rx.close();
    }
}
