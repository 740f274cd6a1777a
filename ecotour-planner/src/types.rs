//! Core types and capability traits for the tour planner
//!
//! The orchestrator talks to every collaborator through one of these traits:
//! - [`PoiSuggester`] - generative POI suggestions
//! - [`PlaceEnricher`] - per-POI metadata lookup
//! - [`RouteOptimizer`] - authoritative route ordering
//! - [`TourStore`] - persisted tours
//! - [`MapSink`] - map rendering commands
//!
//! Implementations are shared as `Arc<dyn Trait>` so tests can swap in mocks.

use async_trait::async_trait;
use ecotour_common::{Poi, Tour, TourRequest, TourSummary, TravelMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Tour planning error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TourError {
    /// Suggestion or optimization call failed; fatal to the current pipeline
    #[error("{service} service error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    /// Enrichment for one POI failed or found nothing; recovered locally
    #[error("No enrichment for '{name}': {reason}")]
    EnrichmentMiss { name: String, reason: String },

    /// Persistence read/write failed
    #[error("Tour store error: {0}")]
    Store(String),

    /// Request rejected before any service call
    #[error("Invalid tour request: {0}")]
    InvalidRequest(String),

    /// Orchestrator task is gone
    #[error("Tour orchestrator is not running")]
    Closed,
}

impl TourError {
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        TourError::Upstream {
            service,
            message: message.into(),
        }
    }
}

impl From<ecotour_common::Error> for TourError {
    fn from(e: ecotour_common::Error) -> Self {
        match e {
            ecotour_common::Error::InvalidInput(msg) => TourError::InvalidRequest(msg),
            other => TourError::Store(other.to_string()),
        }
    }
}

/// Result of a place lookup
///
/// Every field is optional; a lookup may know the place but not its rating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceData {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub name: Option<String>,
    pub editorial_summary: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub photo_references: Vec<String>,
    pub rating: Option<f64>,
    pub formatted_address: Option<String>,
    pub user_ratings_total: Option<u32>,
}

/// Generative POI suggestion capability
#[async_trait]
pub trait PoiSuggester: Send + Sync {
    /// Candidate POIs for the request
    ///
    /// # Errors
    /// Returns `TourError::Upstream` on any failure; callers do not retry.
    async fn suggest(&self, request: &TourRequest) -> Result<Vec<Poi>, TourError>;
}

/// Per-POI enrichment capability
#[async_trait]
pub trait PlaceEnricher: Send + Sync {
    /// Look up a place by name within a city
    ///
    /// `Ok(None)` means the lookup ran but found nothing.
    async fn enrich(&self, name: &str, city: &str) -> Result<Option<PlaceData>, TourError>;

    /// Resolve a photo reference from [`PlaceData::photo_references`] into an image URL
    fn photo_url(&self, photo_reference: &str) -> String;
}

/// Route optimization capability
///
/// The returned tour's POI order is authoritative.
#[async_trait]
pub trait RouteOptimizer: Send + Sync {
    async fn optimize(
        &self,
        pois: &[Poi],
        mode: TravelMode,
        city: &str,
        preferences: &BTreeSet<String>,
    ) -> Result<Tour, TourError>;
}

/// Persistence for named tours
#[async_trait]
pub trait TourStore: Send + Sync {
    /// Persist a tour under a name, returning its new identifier
    async fn save(&self, tour: &Tour, name: &str) -> Result<String, TourError>;

    async fn list_saved(&self) -> Result<Vec<TourSummary>, TourError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Tour>, TourError>;
}

/// Map rendering commands
///
/// Only `draw_route` is awaited by the orchestrator.
#[async_trait]
pub trait MapSink: Send + Sync {
    async fn draw_route(&self, tour: &Tour);

    fn add_marker(&self, poi: &Poi);

    fn remove_marker(&self, name: &str);

    fn clear_map(&self);
}
