//! Field-level merge of a suggested POI with its place lookup

use ecotour_common::{Coordinates, Poi};

use crate::types::PlaceData;

/// Merge enrichment data into a candidate POI
///
/// Enriched fields win when present; absent or blank enriched fields keep the
/// candidate's value. Coordinates are replaced only when both axes are
/// supplied. An image URL is only built from the first non-blank photo
/// reference; without one the candidate's own image (if any) is kept. The name
/// is the POI's identity and is kept.
pub fn merge_poi(original: &Poi, place: &PlaceData, photo_url: impl Fn(&str) -> String) -> Poi {
    let coordinates = match (place.lat, place.lng) {
        (Some(lat), Some(lng)) if Coordinates::new(lat, lng).is_valid() => {
            Coordinates::new(lat, lng)
        }
        _ => original.coordinates,
    };

    let image_url = place
        .photo_references
        .iter()
        .find(|r| !r.trim().is_empty())
        .map(|r| photo_url(r))
        .or_else(|| original.image_url.clone());

    Poi {
        name: original.name.clone(),
        coordinates,
        description: non_blank(&place.editorial_summary)
            .unwrap_or_else(|| original.description.clone()),
        url: non_blank(&place.website).or_else(|| original.url.clone()),
        image_url,
        rating: place.rating.or(original.rating),
        address: non_blank(&place.formatted_address).or_else(|| original.address.clone()),
        user_ratings_total: place.user_ratings_total.or(original.user_ratings_total),
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .filter(|v| !v.trim().is_empty())
        .cloned()
}
