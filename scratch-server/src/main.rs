//! Scratch Card Server
//!
//! Two-bucket scratch-card matching service: users claim one side of a
//! card, and when both sides of a code are claimed the pair is notified.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::file::StorageBackend;
use config::{ConfigLoader, ProfileSource, get_database_url};
use scratch_core::engine::ScratchEngine;
use scratch_core::events::Fanout;
use scratch_core::framework::DatabaseProcessor;
use scratch_core::profile::{HttpProfileStore, ProfileStore, StaticProfileStore};
use scratch_core::store::MemoryStore;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Scratch Card Server - two-bucket card matching backend
#[derive(Parser, Debug)]
#[command(name = "scratch-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./scratch-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting scratch-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    let backend = loaded_config.storage;
    let profiles = build_profile_store(loaded_config.profiles.clone());
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Convert to shared config with separate locks for each section
    let shared_config = loaded_config.into_shared();
    let fanout = Fanout::new();

    let (engine, db_pool) = match backend {
        StorageBackend::Postgres => {
            let db_pool = connect_database(args.migrate).await?;
            let storage = Arc::new(DatabaseProcessor::new(db_pool.clone()));
            let engine = ScratchEngine::new(storage, profiles, fanout, shared_config.cards.clone());
            (engine, Some(db_pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; all state is lost on shutdown");
            let storage = Arc::new(MemoryStore::new());
            let engine = ScratchEngine::new(storage, profiles, fanout, shared_config.cards.clone());
            (engine, None)
        }
    };

    let state = AppState::new(shared_config, engine);

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader);

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    shutdown_notify.notify_one();

    if let Some(db_pool) = db_pool {
        tracing::info!("Closing database connections...");
        db_pool.close().await;
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

async fn connect_database(migrate: bool) -> anyhow::Result<PgPool> {
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    Ok(db_pool)
}

fn build_profile_store(source: ProfileSource) -> Arc<dyn ProfileStore> {
    match source {
        ProfileSource::Http(base_url) => {
            tracing::info!(%base_url, "Resolving match profiles over HTTP");
            Arc::new(HttpProfileStore::new(base_url))
        }
        ProfileSource::Static(entries) => {
            tracing::info!(count = entries.len(), "Using inline match profiles");
            Arc::new(entries.into_iter().collect::<StaticProfileStore>())
        }
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
