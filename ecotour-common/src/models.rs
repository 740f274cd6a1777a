//! Tour domain model
//!
//! Points of interest, tours and the orchestrator state broadcast to observers.
//! All values are replaced wholesale; nothing here is edited in place by the
//! orchestrator once published.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::{Error, Result};

/// Name of the reserved POI that marks the user's own position.
///
/// Removing it from a tour means the user has stopped following the route.
pub const CURRENT_LOCATION_NAME: &str = "Current Location";

/// Whether `name` is the reserved current-location POI
pub fn is_current_location(name: &str) -> bool {
    name == CURRENT_LOCATION_NAME
}

/// WGS84 coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both axes finite and within WGS84 bounds
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Point of interest
///
/// `name` is the identity key inside a tour: markers and removals are
/// correlated by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub name: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub description: String,
    /// Canonical web page for the place
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ratings_total: Option<u32>,
}

impl Poi {
    /// Bare POI as returned by a suggestion (no enrichment fields)
    pub fn new(
        name: impl Into<String>,
        coordinates: Coordinates,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            coordinates,
            description: description.into(),
            url: None,
            image_url: None,
            rating: None,
            address: None,
            user_ratings_total: None,
        }
    }
}

/// Travel mode used for route optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Walking,
    Cycling,
    Driving,
    Transit,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
            TravelMode::Cycling => "cycling",
            TravelMode::Driving => "driving",
            TravelMode::Transit => "transit",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TravelMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walking" => Ok(TravelMode::Walking),
            "cycling" | "bicycling" => Ok(TravelMode::Cycling),
            "driving" => Ok(TravelMode::Driving),
            "transit" => Ok(TravelMode::Transit),
            other => Err(Error::InvalidInput(format!("Unknown travel mode: {}", other))),
        }
    }
}

/// Optimized tour over a set of POIs
///
/// `pois` is in route order as returned by the route optimizer. A `Tour`
/// held as the orchestrator's current tour is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    pub city: String,
    pub pois: Vec<Poi>,
    pub mode: TravelMode,
    #[serde(default)]
    pub preferences: BTreeSet<String>,
    /// Aggregate route distance in meters
    pub distance_meters: f64,
    /// Aggregate route duration in seconds
    pub duration_seconds: f64,
}

impl Tour {
    pub fn contains_poi(&self, name: &str) -> bool {
        self.pois.iter().any(|p| p.name == name)
    }

    pub fn poi_names(&self) -> Vec<&str> {
        self.pois.iter().map(|p| p.name.as_str()).collect()
    }

    /// Same trip: city, mode, preferences and POI sequence match
    ///
    /// Aggregate metrics are ignored; they are whatever the optimizer last said.
    pub fn same_trip(&self, other: &Tour) -> bool {
        self.city == other.city
            && self.mode == other.mode
            && self.preferences == other.preferences
            && self.pois == other.pois
    }
}

/// Listing entry for a persisted tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourSummary {
    pub id: String,
    pub name: String,
    pub city: String,
    pub mode: TravelMode,
    pub poi_count: usize,
    pub saved_at: DateTime<Utc>,
}

/// Inputs for building a new tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourRequest {
    pub city: String,
    /// Upper bound on the number of POIs in the resulting tour
    pub desired_count: usize,
    #[serde(default)]
    pub preferences: BTreeSet<String>,
    /// Time budget for the whole tour
    pub max_time_minutes: u32,
    #[serde(default)]
    pub mode: TravelMode,
    /// Extra instructions forwarded to the suggestion service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
}

impl TourRequest {
    pub fn validate(&self) -> Result<()> {
        if self.city.trim().is_empty() {
            return Err(Error::InvalidInput("city must not be empty".to_string()));
        }
        if self.desired_count == 0 {
            return Err(Error::InvalidInput(
                "desired_count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Observable orchestrator state
///
/// Invariant: `has_error` is only ever reported together with `loading == false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorState {
    pub tour: Option<Tour>,
    pub loading: bool,
    pub has_error: bool,
    /// User has committed to following the route
    pub joined: bool,
    pub saved_tours: Vec<TourSummary>,
}

impl OrchestratorState {
    /// Copy with the loading flag raised and any previous error cleared
    pub fn begin_loading(&self) -> Self {
        Self {
            loading: true,
            has_error: false,
            ..self.clone()
        }
    }

    /// Copy reporting a failure; always clears loading
    pub fn failed(&self) -> Self {
        Self {
            loading: false,
            has_error: true,
            ..self.clone()
        }
    }
}
