//! Mutation pipeline: re-optimize a tour after its POI set was edited

use ecotour_common::{Poi, Tour};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::types::{RouteOptimizer, TourError};

/// Recompute the route for an edited POI set
///
/// City, mode and preferences are carried over from `prior` unchanged.
/// Returns `Ok(None)` when the edited set is empty: the tour is cleared rather
/// than kept with an empty route.
///
/// # Errors
/// See [`reoptimize`].
pub async fn recompute(
    optimizer: &dyn RouteOptimizer,
    pois: Vec<Poi>,
    prior: &Tour,
) -> Result<Option<Tour>, TourError> {
    if pois.is_empty() {
        info!(city = %prior.city, "Last POI removed, clearing tour");
        return Ok(None);
    }

    reoptimize(optimizer, &pois, prior).await.map(Some)
}

/// Optimize a non-empty POI set with the trip settings of `prior`
///
/// # Errors
/// `Upstream` if optimization fails or the optimizer returns a different POI
/// membership than it was given.
pub async fn reoptimize(
    optimizer: &dyn RouteOptimizer,
    pois: &[Poi],
    prior: &Tour,
) -> Result<Tour, TourError> {
    debug!(city = %prior.city, pois = pois.len(), "Recomputing route");

    let tour = optimizer
        .optimize(pois, prior.mode, &prior.city, &prior.preferences)
        .await?;
    ensure_same_membership(pois, &tour)?;

    Ok(tour)
}

/// Check that an optimized tour visits exactly the submitted POIs
///
/// The optimizer decides the order only: a dropped, added or repeated POI is
/// an optimization failure.
pub fn ensure_same_membership(submitted: &[Poi], tour: &Tour) -> Result<(), TourError> {
    let expected: BTreeSet<&str> = submitted.iter().map(|p| p.name.as_str()).collect();
    let returned: BTreeSet<&str> = tour.pois.iter().map(|p| p.name.as_str()).collect();

    if expected != returned || tour.pois.len() != submitted.len() {
        return Err(TourError::upstream(
            "optimization",
            format!(
                "route membership changed: submitted {:?}, received {:?}",
                submitted.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
                tour.poi_names()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecotour_common::{Coordinates, TravelMode};

    fn poi(name: &str) -> Poi {
        Poi::new(name, Coordinates::new(41.15, -8.61), "")
    }

    fn tour_of(names: &[&str]) -> Tour {
        Tour {
            city: "Porto".to_string(),
            pois: names.iter().map(|n| poi(n)).collect(),
            mode: TravelMode::Walking,
            preferences: BTreeSet::new(),
            distance_meters: 0.0,
            duration_seconds: 0.0,
        }
    }

    #[test]
    fn test_reordered_membership_accepted() {
        let submitted = vec![poi("A"), poi("B"), poi("C")];
        assert!(ensure_same_membership(&submitted, &tour_of(&["C", "A", "B"])).is_ok());
    }

    #[test]
    fn test_repeated_poi_rejected() {
        let submitted = vec![poi("A"), poi("B")];
        let result = ensure_same_membership(&submitted, &tour_of(&["A", "B", "A"]));
        assert!(matches!(result, Err(TourError::Upstream { service: "optimization", .. })));
    }

    #[test]
    fn test_replaced_poi_rejected() {
        let submitted = vec![poi("A"), poi("B")];
        assert!(ensure_same_membership(&submitted, &tour_of(&["A", "X"])).is_err());
        assert!(ensure_same_membership(&submitted, &tour_of(&["A", "A"])).is_err());
        assert!(ensure_same_membership(&submitted, &tour_of(&["A"])).is_err());
    }
}
