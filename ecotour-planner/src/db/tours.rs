//! Saved tour persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ecotour_common::{Error, Poi, Result, Tour, TourSummary, TravelMode};
use sqlx::{Row, SqlitePool};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::types::{TourError, TourStore};

/// Save a tour under `name`, returning the generated id
pub async fn save_tour(pool: &SqlitePool, tour: &Tour, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("tour name must not be empty".to_string()));
    }

    // Prepare all data BEFORE acquiring database connection
    let id = Uuid::new_v4().to_string();
    let preferences = serde_json::to_string(&tour.preferences)
        .map_err(|e| Error::Internal(format!("Failed to serialize preferences: {}", e)))?;
    let pois = serde_json::to_string(&tour.pois)
        .map_err(|e| Error::Internal(format!("Failed to serialize POIs: {}", e)))?;
    let saved_at = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO saved_tours (
            id, name, city, mode, preferences, pois,
            distance_meters, duration_seconds, saved_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name)
    .bind(&tour.city)
    .bind(tour.mode.as_str())
    .bind(&preferences)
    .bind(&pois)
    .bind(tour.distance_meters)
    .bind(tour.duration_seconds)
    .bind(&saved_at)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Summaries of all saved tours, newest first
pub async fn list_tours(pool: &SqlitePool) -> Result<Vec<TourSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, city, mode, pois, saved_at
        FROM saved_tours
        ORDER BY saved_at DESC, rowid DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| -> Result<TourSummary> {
            let pois: String = row.get("pois");
            let pois: Vec<Poi> = serde_json::from_str(&pois)
                .map_err(|e| Error::Internal(format!("Failed to deserialize POIs: {}", e)))?;
            let mode: String = row.get("mode");
            let saved_at: String = row.get("saved_at");

            Ok(TourSummary {
                id: row.get("id"),
                name: row.get("name"),
                city: row.get("city"),
                mode: mode.parse()?,
                poi_count: pois.len(),
                saved_at: parse_timestamp(&saved_at)?,
            })
        })
        .collect()
}

/// Load a saved tour by id
pub async fn load_tour(pool: &SqlitePool, id: &str) -> Result<Option<Tour>> {
    let row = sqlx::query(
        r#"
        SELECT city, mode, preferences, pois, distance_meters, duration_seconds
        FROM saved_tours
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let preferences: String = row.get("preferences");
            let preferences: BTreeSet<String> = serde_json::from_str(&preferences)
                .map_err(|e| Error::Internal(format!("Failed to deserialize preferences: {}", e)))?;

            let pois: String = row.get("pois");
            let pois: Vec<Poi> = serde_json::from_str(&pois)
                .map_err(|e| Error::Internal(format!("Failed to deserialize POIs: {}", e)))?;

            let mode: String = row.get("mode");
            let mode: TravelMode = mode.parse()?;

            Ok(Some(Tour {
                city: row.get("city"),
                pois,
                mode,
                preferences,
                distance_meters: row.get("distance_meters"),
                duration_seconds: row.get("duration_seconds"),
            }))
        }
        None => Ok(None),
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse saved_at: {}", e)))
}

/// [`TourStore`] backed by the `saved_tours` table
#[derive(Clone)]
pub struct SqliteTourStore {
    pool: SqlitePool,
}

impl SqliteTourStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TourStore for SqliteTourStore {
    async fn save(&self, tour: &Tour, name: &str) -> std::result::Result<String, TourError> {
        save_tour(&self.pool, tour, name).await.map_err(store_error)
    }

    async fn list_saved(&self) -> std::result::Result<Vec<TourSummary>, TourError> {
        list_tours(&self.pool).await.map_err(store_error)
    }

    async fn get_by_id(&self, id: &str) -> std::result::Result<Option<Tour>, TourError> {
        load_tour(&self.pool, id).await.map_err(store_error)
    }
}

fn store_error(e: Error) -> TourError {
    TourError::Store(e.to_string())
}
