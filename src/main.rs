//! Speech Synthesis Service - Main Application Entry Point
//!
//! REST API for registering users, keeping a token balance, settling
//! transactions and turning text into audio through a background worker.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx, or an in-memory store when `DATABASE_URL` is unset
//! - **Authentication**: bearer tokens, stored as SHA-256 hashes with an expiry
//! - **Worker**: tokio task fed by a bounded channel
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Open the store (connect and migrate when a database is configured)
//! 3. Make sure the exchange rate record exists
//! 4. Start the generation worker
//! 5. Build the HTTP router and start serving on the configured port

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use kcsynth_service::{
    app::{self, AppState},
    config::Config,
    db,
    services::exchange_service,
    store::{Store, memory::MemoryStore, postgres::PgStore},
    worker::{self, GenerationWorker, queue, synth::ToneSynthesizer},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, keeping data in memory");
            Arc::new(MemoryStore::new())
        }
    };

    exchange_service::init_exchange_rate(store.as_ref(), config.default_exchange_rate).await?;

    tokio::fs::create_dir_all(&config.output_dir).await?;
    let (publisher, tasks) = queue::channel(config.task_queue_capacity);
    let generation_worker = GenerationWorker::new(
        config.worker_id.clone(),
        store.clone(),
        Arc::new(ToneSynthesizer::new(&config.output_dir)),
    );
    worker::spawn(generation_worker, tasks);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let state = AppState::new(store, Arc::new(publisher), config);
    let app = app::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
