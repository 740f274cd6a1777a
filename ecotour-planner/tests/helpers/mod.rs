//! Test Helper Utilities
//!
//! Mock collaborators and a planner harness shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use ecotour_common::events::EventBus;
use ecotour_common::{Coordinates, Poi, Tour, TourRequest, TourSummary, TravelMode};
use ecotour_planner::db::{init_tables, SqliteTourStore};
use ecotour_planner::map_sink::RecordingMapSink;
use ecotour_planner::pipeline::TourBuilder;
use ecotour_planner::types::{
    PlaceData, PlaceEnricher, PoiSuggester, RouteOptimizer, TourError, TourStore,
};
use ecotour_planner::{OrchestratorHandle, TourOrchestrator};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// POI near Porto's centre, offset per index so coordinates differ
pub fn porto_poi(name: &str, index: usize) -> Poi {
    Poi::new(
        name,
        Coordinates::new(41.14 + index as f64 * 0.001, -8.61),
        format!("Suggested {}", name),
    )
}

pub fn porto_pois(names: &[&str]) -> Vec<Poi> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| porto_poi(name, i))
        .collect()
}

pub fn porto_request(desired_count: usize) -> TourRequest {
    TourRequest {
        city: "Porto".to_string(),
        desired_count,
        preferences: ["architecture".to_string()].into_iter().collect(),
        max_time_minutes: 240,
        mode: TravelMode::Walking,
        system_instruction: None,
    }
}

/// Suggester returning a fixed candidate list, or failing
pub struct MockSuggester {
    pois: Vec<Poi>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockSuggester {
    pub fn returning(pois: Vec<Poi>) -> Self {
        Self {
            pois,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        let suggester = Self::returning(Vec::new());
        suggester.fail.store(true, Ordering::SeqCst);
        suggester
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PoiSuggester for MockSuggester {
    async fn suggest(&self, _request: &TourRequest) -> Result<Vec<Poi>, TourError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(TourError::upstream("suggestion", "mock suggestion failure"));
        }
        Ok(self.pois.clone())
    }
}

/// Enricher that knows every place except the ones told to fail or miss
///
/// Per-name delays control the order in which lookups complete; the order
/// they actually completed in is recorded.
#[derive(Default)]
pub struct MockEnricher {
    failing: HashSet<String>,
    unknown: HashSet<String>,
    delays: HashMap<String, Duration>,
    completed: Mutex<Vec<String>>,
}

impl MockEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(names: &[&str]) -> Self {
        Self::new().with_failing(names)
    }

    /// Lookups for `names` error out
    pub fn with_failing(mut self, names: &[&str]) -> Self {
        self.failing = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Lookups for `names` find nothing
    pub fn with_unknown(mut self, names: &[&str]) -> Self {
        self.unknown = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Lookups for each name take the given number of milliseconds
    pub fn with_delays(mut self, delays: &[(&str, u64)]) -> Self {
        self.delays = delays
            .iter()
            .map(|(name, ms)| (name.to_string(), Duration::from_millis(*ms)))
            .collect();
        self
    }

    /// Names in the order their lookups finished
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaceEnricher for MockEnricher {
    async fn enrich(&self, name: &str, city: &str) -> Result<Option<PlaceData>, TourError> {
        if let Some(delay) = self.delays.get(name) {
            tokio::time::sleep(*delay).await;
        }
        self.completed.lock().unwrap().push(name.to_string());

        if self.failing.contains(name) {
            return Err(TourError::upstream("places", "mock lookup failure"));
        }
        if self.unknown.contains(name) {
            return Ok(None);
        }
        Ok(Some(PlaceData {
            name: Some(format!("{} ({})", name, city)),
            editorial_summary: Some(format!("About {}", name)),
            photo_references: vec![format!("ref-{}", name)],
            rating: Some(4.5),
            formatted_address: Some(format!("{}, {}", name, city)),
            ..PlaceData::default()
        }))
    }

    fn photo_url(&self, photo_reference: &str) -> String {
        format!("https://photos.test/{}", photo_reference)
    }
}

/// Optimizer that reverses the submitted order
///
/// Can be told to fail, to drop or repeat a POI, or to take its time.
#[derive(Default)]
pub struct MockOptimizer {
    fail: AtomicBool,
    drop_last: AtomicBool,
    repeat_first: AtomicBool,
    delay: Option<Duration>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_drop_last(&self, drop_last: bool) {
        self.drop_last.store(drop_last, Ordering::SeqCst);
    }

    /// Append the first submitted POI again at the end of the route
    pub fn set_repeat_first(&self, repeat_first: bool) {
        self.repeat_first.store(repeat_first, Ordering::SeqCst);
    }

    /// POI names submitted on each call
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RouteOptimizer for MockOptimizer {
    async fn optimize(
        &self,
        pois: &[Poi],
        mode: TravelMode,
        city: &str,
        preferences: &BTreeSet<String>,
    ) -> Result<Tour, TourError> {
        self.calls
            .lock()
            .unwrap()
            .push(pois.iter().map(|p| p.name.clone()).collect());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(TourError::upstream("optimization", "mock optimizer failure"));
        }

        let mut routed: Vec<Poi> = pois.iter().rev().cloned().collect();
        if self.drop_last.load(Ordering::SeqCst) {
            routed.pop();
        }
        if self.repeat_first.load(Ordering::SeqCst) {
            if let Some(first) = pois.first() {
                routed.push(first.clone());
            }
        }

        Ok(Tour {
            city: city.to_string(),
            distance_meters: 1000.0 * routed.len() as f64,
            duration_seconds: 900.0 * routed.len() as f64,
            pois: routed,
            mode,
            preferences: preferences.clone(),
        })
    }
}

/// Store whose every operation fails
pub struct FailingTourStore;

#[async_trait]
impl TourStore for FailingTourStore {
    async fn save(&self, _tour: &Tour, _name: &str) -> Result<String, TourError> {
        Err(TourError::Store("disk full".to_string()))
    }

    async fn list_saved(&self) -> Result<Vec<TourSummary>, TourError> {
        Err(TourError::Store("disk full".to_string()))
    }

    async fn get_by_id(&self, _id: &str) -> Result<Option<Tour>, TourError> {
        Err(TourError::Store("disk full".to_string()))
    }
}

/// In-memory SQLite pool with planner tables
///
/// A single connection keeps every query on the same in-memory database.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    init_tables(&pool)
        .await
        .expect("Failed to initialize database schema");
    pool
}

/// Running orchestrator wired to mocks
pub struct TestPlanner {
    pub handle: OrchestratorHandle,
    pub event_bus: EventBus,
    pub suggester: Arc<MockSuggester>,
    pub enricher: Arc<MockEnricher>,
    pub optimizer: Arc<MockOptimizer>,
    pub map_sink: Arc<RecordingMapSink>,
}

impl TestPlanner {
    /// Planner backed by an in-memory SQLite store
    pub async fn start(
        suggester: MockSuggester,
        enricher: MockEnricher,
        optimizer: MockOptimizer,
    ) -> Self {
        let store = Arc::new(SqliteTourStore::new(create_test_pool().await));
        Self::start_with_store(suggester, enricher, optimizer, store)
    }

    pub fn start_with_store(
        suggester: MockSuggester,
        enricher: MockEnricher,
        optimizer: MockOptimizer,
        store: Arc<dyn TourStore>,
    ) -> Self {
        Self::start_with(suggester, enricher, optimizer, store, 256)
    }

    /// Fully specified planner, including the EventBus capacity
    pub fn start_with(
        suggester: MockSuggester,
        enricher: MockEnricher,
        optimizer: MockOptimizer,
        store: Arc<dyn TourStore>,
        event_bus_capacity: usize,
    ) -> Self {
        let suggester = Arc::new(suggester);
        let enricher = Arc::new(enricher);
        let optimizer = Arc::new(optimizer);
        let map_sink = Arc::new(RecordingMapSink::new());
        let event_bus = EventBus::new(event_bus_capacity);

        let builder = TourBuilder::new(
            Arc::clone(&suggester) as Arc<dyn PoiSuggester>,
            Arc::clone(&enricher) as Arc<dyn PlaceEnricher>,
            Arc::clone(&optimizer) as Arc<dyn RouteOptimizer>,
        );
        let handle = TourOrchestrator::spawn(
            builder,
            store,
            Arc::clone(&map_sink) as Arc<dyn ecotour_planner::types::MapSink>,
            event_bus.clone(),
        );

        Self {
            handle,
            event_bus,
            suggester,
            enricher,
            optimizer,
            map_sink,
        }
    }

    /// Planner whose suggester returns `names` around Porto
    pub async fn with_pois(names: &[&str]) -> Self {
        Self::start(
            MockSuggester::returning(porto_pois(names)),
            MockEnricher::new(),
            MockOptimizer::new(),
        )
        .await
    }
}
