//! Route optimization client
//!
//! The optimizer answers either with an index permutation of the submitted
//! POIs or with the POIs themselves in route order. Either way the tour is
//! assembled from the submitted POI values so enrichment is never lost, and
//! any mismatch in membership is treated as a failed optimization.

use async_trait::async_trait;
use ecotour_common::config::ServicesConfig;
use ecotour_common::{Poi, Tour, TravelMode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use crate::types::{RouteOptimizer, TourError};

const SERVICE: &str = "optimization";

#[derive(Debug, Serialize)]
struct OptimizePayload<'a> {
    pois: &'a [Poi],
    mode: TravelMode,
    city: &'a str,
    preferences: &'a BTreeSet<String>,
}

/// Optimizer response body
#[derive(Debug, Deserialize)]
pub struct OptimizeResponse {
    /// Route order as indices into the submitted POIs
    #[serde(default)]
    pub order: Option<Vec<usize>>,
    /// Route order as POIs (matched to the submitted ones by name)
    #[serde(default)]
    pub pois: Option<Vec<Poi>>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// HTTP client for the route optimizer
pub struct RouteClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RouteClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TourError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| TourError::upstream(SERVICE, e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn from_config(services: &ServicesConfig) -> Result<Self, TourError> {
        Self::new(
            services.routes_url.clone(),
            services.routes_api_key.clone(),
            Duration::from_secs(services.request_timeout_secs),
        )
    }
}

#[async_trait]
impl RouteOptimizer for RouteClient {
    async fn optimize(
        &self,
        pois: &[Poi],
        mode: TravelMode,
        city: &str,
        preferences: &BTreeSet<String>,
    ) -> Result<Tour, TourError> {
        let payload = OptimizePayload {
            pois,
            mode,
            city,
            preferences,
        };

        tracing::debug!(
            city = %city,
            pois = pois.len(),
            mode = %mode,
            "Requesting route optimization"
        );

        let mut builder = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TourError::upstream(SERVICE, format!("network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TourError::upstream(
                SERVICE,
                format!("HTTP {}: {}", status.as_u16(), error_text),
            ));
        }

        let body: OptimizeResponse = response
            .json()
            .await
            .map_err(|e| TourError::upstream(SERVICE, format!("parse error: {}", e)))?;

        let tour = assemble_tour(pois, body, mode, city, preferences)?;

        tracing::info!(
            city = %city,
            pois = tour.pois.len(),
            distance_meters = tour.distance_meters,
            "Route optimized"
        );

        Ok(tour)
    }
}

/// Build a tour from the submitted POIs in the optimizer's order
pub fn assemble_tour(
    submitted: &[Poi],
    response: OptimizeResponse,
    mode: TravelMode,
    city: &str,
    preferences: &BTreeSet<String>,
) -> Result<Tour, TourError> {
    let order: Vec<usize> = match (response.order, response.pois) {
        (Some(order), _) => order,
        (None, Some(routed)) => {
            let index: HashMap<&str, usize> = submitted
                .iter()
                .enumerate()
                .map(|(i, p)| (p.name.as_str(), i))
                .collect();
            routed
                .iter()
                .map(|p| {
                    index.get(p.name.as_str()).copied().ok_or_else(|| {
                        TourError::upstream(SERVICE, format!("unknown POI in route: {}", p.name))
                    })
                })
                .collect::<Result<_, _>>()?
        }
        (None, None) => {
            return Err(TourError::upstream(SERVICE, "response carries no route order"));
        }
    };

    if !is_permutation(&order, submitted.len()) {
        return Err(TourError::upstream(
            SERVICE,
            format!(
                "route order {:?} is not a permutation of {} POIs",
                order,
                submitted.len()
            ),
        ));
    }

    Ok(Tour {
        city: city.to_string(),
        pois: order.iter().map(|&i| submitted[i].clone()).collect(),
        mode,
        preferences: preferences.clone(),
        distance_meters: response.distance_meters,
        duration_seconds: response.duration_seconds,
    })
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &i in order {
        if i >= len || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    true
}
