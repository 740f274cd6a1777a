//! Saved tour persistence tests against a file-backed SQLite database

mod helpers;

use ecotour_common::{Error, Tour, TravelMode};
use ecotour_planner::db::tours::{list_tours, load_tour, save_tour};
use ecotour_planner::db::{init_database_pool, SqliteTourStore};
use ecotour_planner::types::{TourError, TourStore};
use helpers::porto_pois;
use tempfile::TempDir;

fn sample_tour() -> Tour {
    let mut pois = porto_pois(&["Torre dos Clerigos", "Livraria Lello"]);
    pois[0].rating = Some(4.6);
    pois[1].image_url = Some("https://photos.test/lello".to_string());

    Tour {
        city: "Porto".to_string(),
        pois,
        mode: TravelMode::Cycling,
        preferences: ["books".to_string(), "views".to_string()].into_iter().collect(),
        distance_meters: 1850.5,
        duration_seconds: 1320.0,
    }
}

async fn temp_pool() -> (TempDir, sqlx::SqlitePool) {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database_pool(&temp_dir.path().join("nested").join("ecotour.db"))
        .await
        .unwrap();
    (temp_dir, pool)
}

#[tokio::test]
async fn test_save_and_load_preserves_tour() {
    let (_dir, pool) = temp_pool().await;
    let tour = sample_tour();

    let id = save_tour(&pool, &tour, "Bookish afternoon").await.unwrap();
    let loaded = load_tour(&pool, &id).await.unwrap();

    assert_eq!(loaded, Some(tour));
}

#[tokio::test]
async fn test_load_missing_is_none() {
    let (_dir, pool) = temp_pool().await;
    assert_eq!(load_tour(&pool, "no-such-id").await.unwrap(), None);
}

#[tokio::test]
async fn test_blank_name_rejected() {
    let (_dir, pool) = temp_pool().await;

    let result = save_tour(&pool, &sample_tour(), "  ").await;

    assert!(matches!(result, Err(Error::InvalidInput(_))));
    assert!(list_tours(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_newest_first_with_counts() {
    let (_dir, pool) = temp_pool().await;
    let mut short = sample_tour();
    short.pois.truncate(1);

    let first = save_tour(&pool, &sample_tour(), "First").await.unwrap();
    let second = save_tour(&pool, &short, " Second ").await.unwrap();

    let summaries = list_tours(&pool).await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].id, second);
    assert_eq!(summaries[0].name, "Second");
    assert_eq!(summaries[0].poi_count, 1);
    assert_eq!(summaries[1].id, first);
    assert_eq!(summaries[1].poi_count, 2);
    assert_eq!(summaries[1].mode, TravelMode::Cycling);
    assert_eq!(summaries[1].city, "Porto");
}

#[tokio::test]
async fn test_database_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("ecotour.db");

    let id = {
        let pool = init_database_pool(&db_path).await.unwrap();
        let id = save_tour(&pool, &sample_tour(), "Kept").await.unwrap();
        pool.close().await;
        id
    };

    let pool = init_database_pool(&db_path).await.unwrap();
    assert!(load_tour(&pool, &id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_store_trait_maps_errors_to_store() {
    let temp_dir = TempDir::new().unwrap();
    let db_url = format!("sqlite:{}?mode=rwc", temp_dir.path().join("empty.db").display());
    // No tables created
    let pool = sqlx::SqlitePool::connect(&db_url).await.unwrap();
    let store = SqliteTourStore::new(pool);

    assert!(matches!(store.list_saved().await, Err(TourError::Store(_))));
    assert!(matches!(store.get_by_id("x").await, Err(TourError::Store(_))));
    assert!(matches!(
        store.save(&sample_tour(), "Name").await,
        Err(TourError::Store(_))
    ));
}

#[tokio::test]
async fn test_store_trait_round_trip() {
    let (_dir, pool) = temp_pool().await;
    let store = SqliteTourStore::new(pool);

    let id = store.save(&sample_tour(), "Via trait").await.unwrap();

    assert_eq!(store.list_saved().await.unwrap().len(), 1);
    assert_eq!(store.get_by_id(&id).await.unwrap(), Some(sample_tour()));
}
