//! Tour build pipeline: suggest -> enrich -> optimize
//!
//! Suggestion and optimization failures abort the build. Enrichment runs
//! concurrently for every candidate and each failure is isolated to its POI.

use ecotour_common::{Poi, Tour, TourRequest};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::merge::merge_poi;
use super::recompute::ensure_same_membership;
use crate::types::{PlaceEnricher, PoiSuggester, RouteOptimizer, TourError};

/// Builds complete tours from a [`TourRequest`]
#[derive(Clone)]
pub struct TourBuilder {
    suggester: Arc<dyn PoiSuggester>,
    enricher: Arc<dyn PlaceEnricher>,
    optimizer: Arc<dyn RouteOptimizer>,
}

impl TourBuilder {
    pub fn new(
        suggester: Arc<dyn PoiSuggester>,
        enricher: Arc<dyn PlaceEnricher>,
        optimizer: Arc<dyn RouteOptimizer>,
    ) -> Self {
        Self {
            suggester,
            enricher,
            optimizer,
        }
    }

    pub fn optimizer(&self) -> Arc<dyn RouteOptimizer> {
        Arc::clone(&self.optimizer)
    }

    /// Run the full pipeline
    ///
    /// # Errors
    /// - `InvalidRequest` if the request fails validation (no service called)
    /// - `Upstream` if suggestion or optimization fails, nothing usable comes
    ///   back, or the optimized route does not visit exactly the enriched POIs
    pub async fn build(&self, request: &TourRequest) -> Result<Tour, TourError> {
        request.validate()?;

        info!(
            city = %request.city,
            desired_count = request.desired_count,
            mode = %request.mode,
            "Building tour"
        );

        let suggested = self.suggester.suggest(request).await?;
        let candidates = select_candidates(suggested, request.desired_count);
        if candidates.is_empty() {
            return Err(TourError::upstream("suggestion", "no usable POI candidates"));
        }
        debug!(count = candidates.len(), "Suggestion phase complete");

        let enriched = self.enrich_all(candidates, &request.city).await;

        let tour = self
            .optimizer
            .optimize(&enriched, request.mode, &request.city, &request.preferences)
            .await?;
        ensure_same_membership(&enriched, &tour)?;

        info!(
            city = %tour.city,
            pois = tour.pois.len(),
            distance_meters = tour.distance_meters,
            duration_seconds = tour.duration_seconds,
            "Tour built"
        );
        Ok(tour)
    }

    /// Enrich every candidate concurrently
    ///
    /// Output has the same membership and order as the input; a failed or
    /// empty lookup leaves that candidate unchanged.
    pub async fn enrich_all(&self, candidates: Vec<Poi>, city: &str) -> Vec<Poi> {
        let lookups = candidates.into_iter().map(|candidate| {
            let enricher = Arc::clone(&self.enricher);
            async move {
                match enricher.enrich(&candidate.name, city).await {
                    Ok(Some(place)) => {
                        debug!(poi = %candidate.name, "Enrichment successful");
                        merge_poi(&candidate, &place, |r| enricher.photo_url(r))
                    }
                    Ok(None) => {
                        let miss = TourError::EnrichmentMiss {
                            name: candidate.name.clone(),
                            reason: "place not found".to_string(),
                        };
                        warn!(poi = %candidate.name, "{}", miss);
                        candidate
                    }
                    Err(e) => {
                        let miss = TourError::EnrichmentMiss {
                            name: candidate.name.clone(),
                            reason: e.to_string(),
                        };
                        warn!(poi = %candidate.name, "{} (keeping suggested fields)", miss);
                        candidate
                    }
                }
            }
        });

        join_all(lookups).await
    }
}

/// Drop blank and duplicate names, then cap at the requested count
fn select_candidates(suggested: Vec<Poi>, desired_count: usize) -> Vec<Poi> {
    let mut seen = HashSet::new();
    suggested
        .into_iter()
        .filter(|poi| !poi.name.trim().is_empty())
        .filter(|poi| seen.insert(poi.name.clone()))
        .take(desired_count)
        .collect()
}
