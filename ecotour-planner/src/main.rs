//! ecotour-planner - tour planning service
//!
//! Builds optimized city tours from POI suggestions, keeps them consistent
//! under edits, and serves state and map commands over HTTP + SSE.

use anyhow::Result;
use clap::Parser;
use ecotour_common::config::{load_config, LoggingConfig};
use ecotour_common::events::EventBus;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ecotour_planner::db::{init_database_pool, SqliteTourStore};
use ecotour_planner::map_sink::EventBusMapSink;
use ecotour_planner::{build_router, build_tour_builder, AppState, TourOrchestrator};

#[derive(Debug, Parser)]
#[command(name = "ecotour-planner", version, about = "City tour planning service")]
struct Args {
    /// Path to TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root folder for the tour database
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// HTTP port
    #[arg(long)]
    port: Option<u16>,
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, config_source) = load_config(args.config.as_deref())?;
    if let Some(root_folder) = args.root_folder {
        config.root_folder = Some(root_folder);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config.logging)?;

    info!("Starting ecotour-planner");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    config_source.log();

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());
    let db_pool = init_database_pool(&db_path).await?;

    let event_bus = EventBus::new(config.event_bus_capacity);
    info!("Event bus initialized (capacity {})", event_bus.capacity());

    let builder = build_tour_builder(&config.services)?;
    let orchestrator = TourOrchestrator::spawn(
        builder,
        Arc::new(SqliteTourStore::new(db_pool)),
        Arc::new(EventBusMapSink::new(event_bus.clone())),
        event_bus.clone(),
    );

    let state = AppState::new(orchestrator, event_bus);
    let app = build_router(state);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
