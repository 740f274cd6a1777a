//! # EcoTour Common Library
//!
//! Shared code for the EcoTour planner including:
//! - Domain models (points of interest, tours, orchestrator state)
//! - Event types (TourEvent enum) and the EventBus
//! - Server-Sent Events helpers
//! - Configuration loading

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod sse;

pub use error::{Error, Result};
pub use models::{Coordinates, OrchestratorState, Poi, Tour, TourRequest, TourSummary, TravelMode};
