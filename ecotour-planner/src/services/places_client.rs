//! Places enrichment client
//!
//! Text-search lookup of `"{name}, {city}"` against a Places-style API. The
//! first result is taken as the match. Requests are rate limited since the
//! build pipeline fires one lookup per candidate at once.

use async_trait::async_trait;
use ecotour_common::config::ServicesConfig;
use governor::{Quota, RateLimiter};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;

use crate::types::{PlaceData, PlaceEnricher, TourError};

const SERVICE: &str = "places";

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    name: Option<String>,
    geometry: Option<Geometry>,
    editorial_summary: Option<EditorialSummary>,
    website: Option<String>,
    #[serde(default)]
    photos: Vec<PlacePhoto>,
    rating: Option<f64>,
    formatted_address: Option<String>,
    user_ratings_total: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: Option<f64>,
    lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EditorialSummary {
    overview: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlacePhoto {
    photo_reference: String,
}

/// Places API client
pub struct PlacesClient {
    client: Client,
    search_url: String,
    photo_url: String,
    api_key: Option<String>,
    photo_max_width: u32,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl PlacesClient {
    pub fn from_config(services: &ServicesConfig) -> Result<Self, TourError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(services.request_timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| TourError::upstream(SERVICE, e.to_string()))?;

        let per_second = NonZeroU32::new(services.places_requests_per_second)
            .unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            search_url: services.places_url.clone(),
            photo_url: services.places_photo_url.clone(),
            api_key: services.places_api_key.clone(),
            photo_max_width: services.photo_max_width,
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }
}

#[async_trait]
impl PlaceEnricher for PlacesClient {
    async fn enrich(&self, name: &str, city: &str) -> Result<Option<PlaceData>, TourError> {
        self.rate_limiter.until_ready().await;

        let query = format!("{}, {}", name, city);
        let mut params = vec![("query", query.as_str())];
        if let Some(key) = &self.api_key {
            params.push(("key", key.as_str()));
        }

        tracing::debug!(poi = %name, city = %city, "Querying places API");

        let response = self
            .client
            .get(&self.search_url)
            .query(&params)
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

        let body: TextSearchResponse = response
            .json()
            .await
            .map_err(|e| TourError::upstream(SERVICE, format!("parse error: {}", e)))?;

        let place = place_from_response(body)?;
        if place.is_none() {
            tracing::debug!(poi = %name, "No place match");
        }
        Ok(place)
    }

    fn photo_url(&self, photo_reference: &str) -> String {
        let mut params = vec![
            ("maxwidth", self.photo_max_width.to_string()),
            ("photo_reference", photo_reference.to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }

        match Url::parse_with_params(&self.photo_url, &params) {
            Ok(url) => url.to_string(),
            Err(_) => format!(
                "{}?maxwidth={}&photo_reference={}",
                self.photo_url, self.photo_max_width, photo_reference
            ),
        }
    }
}

/// Map a text-search response to the first place found
fn place_from_response(body: TextSearchResponse) -> Result<Option<PlaceData>, TourError> {
    match body.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(None),
        other => {
            return Err(TourError::upstream(
                SERVICE,
                format!(
                    "status {}: {}",
                    other,
                    body.error_message.unwrap_or_default()
                ),
            ))
        }
    }

    Ok(body.results.into_iter().next().map(|result| {
        let (lat, lng) = result
            .geometry
            .map(|g| (g.location.lat, g.location.lng))
            .unwrap_or((None, None));

        PlaceData {
            lat,
            lng,
            name: result.name,
            editorial_summary: result.editorial_summary.and_then(|s| s.overview),
            website: result.website,
            photo_references: result
                .photos
                .into_iter()
                .map(|p| p.photo_reference)
                .collect(),
            rating: result.rating,
            formatted_address: result.formatted_address,
            user_ratings_total: result.user_ratings_total,
        }
    }))
}
