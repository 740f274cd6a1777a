//! Generative POI suggestion client
//!
//! Posts the tour request to a text-generation endpoint that answers with a
//! JSON list of candidate POIs. Generative services like to wrap JSON in
//! markdown fences, so the body is unwrapped before parsing.

use async_trait::async_trait;
use ecotour_common::config::ServicesConfig;
use ecotour_common::{Coordinates, Poi, TourRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{PoiSuggester, TourError};

const SERVICE: &str = "suggestion";

/// Request body sent to the suggestion endpoint
#[derive(Debug, Serialize)]
struct SuggestionPayload<'a> {
    city: &'a str,
    count: usize,
    preferences: Vec<&'a str>,
    max_time_minutes: u32,
    mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<&'a str>,
}

/// Candidate as produced by the generative service
#[derive(Debug, Deserialize)]
struct CandidateDto {
    name: String,
    #[serde(alias = "latitude")]
    lat: f64,
    #[serde(alias = "longitude", alias = "lon")]
    lng: f64,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SuggestionResponse {
    List(Vec<CandidateDto>),
    Wrapped { pois: Vec<CandidateDto> },
}

/// HTTP client for the suggestion service
pub struct SuggestionClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl SuggestionClient {
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
            services.suggestion_url.clone(),
            services.suggestion_api_key.clone(),
            Duration::from_secs(services.request_timeout_secs),
        )
    }
}

#[async_trait]
impl PoiSuggester for SuggestionClient {
    async fn suggest(&self, request: &TourRequest) -> Result<Vec<Poi>, TourError> {
        let payload = SuggestionPayload {
            city: &request.city,
            count: request.desired_count,
            preferences: request.preferences.iter().map(String::as_str).collect(),
            max_time_minutes: request.max_time_minutes,
            mode: request.mode.as_str(),
            system_instruction: request.system_instruction.as_deref(),
        };

        tracing::debug!(city = %request.city, url = %self.endpoint, "Requesting POI suggestions");

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

        let body = response
            .text()
            .await
            .map_err(|e| TourError::upstream(SERVICE, format!("read error: {}", e)))?;

        let pois = parse_candidates(&body)?;

        tracing::info!(city = %request.city, candidates = pois.len(), "Received POI suggestions");

        Ok(pois)
    }
}

/// Parse a suggestion response body
///
/// Accepts a bare array or `{"pois": [...]}`, optionally inside a markdown
/// code fence. Candidates with invalid coordinates are dropped. An empty
/// result is an error.
pub fn parse_candidates(body: &str) -> Result<Vec<Poi>, TourError> {
    let json = strip_code_fence(body);

    let response: SuggestionResponse = serde_json::from_str(json)
        .map_err(|e| TourError::upstream(SERVICE, format!("parse error: {}", e)))?;

    let candidates = match response {
        SuggestionResponse::List(list) => list,
        SuggestionResponse::Wrapped { pois } => pois,
    };

    let pois: Vec<Poi> = candidates
        .into_iter()
        .filter_map(|c| {
            let coordinates = Coordinates::new(c.lat, c.lng);
            if !coordinates.is_valid() {
                tracing::warn!(poi = %c.name, "Dropping suggestion with invalid coordinates");
                return None;
            }
            Some(Poi::new(c.name.trim(), coordinates, c.description))
        })
        .collect();

    if pois.is_empty() {
        return Err(TourError::upstream(SERVICE, "no candidates returned"));
    }

    Ok(pois)
}

fn strip_code_fence(body: &str) -> &str {
    let trimmed = body.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the optional language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}
