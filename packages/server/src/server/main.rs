// Main entry point for the pipeline server

use std::sync::Arc;

use anyhow::{Context, Result};
use pipeline::StageQueue;
use server_core::kernel::{
    listing_config, pipeline_config, Backends, JetStreamQueue, QueueWorker, ServerDeps,
    WorkerConfig,
};
use server_core::{server::build_app, Config};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,pipeline=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting content pipeline server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Connect to NATS JetStream
    tracing::info!(url = %config.nats_url, "Connecting to NATS...");
    let nats = async_nats::connect(&config.nats_url)
        .await
        .context("Failed to connect to NATS")?;
    let queue = Arc::new(
        JetStreamQueue::connect(nats, &config.pipeline_stream, &config.pipeline_queue)
            .await
            .context("Failed to set up pipeline queue")?,
    );
    tracing::info!(queue = %config.pipeline_queue, "Pipeline queue ready");

    // Build dependencies
    let stage_queue: Arc<dyn StageQueue> = queue.clone();
    let deps = Arc::new(ServerDeps::new(
        pipeline_config(&config),
        listing_config(&config),
        Backends::production(&config, pool, stage_queue),
    ));

    // Start queue worker
    let shutdown = CancellationToken::new();
    let worker = QueueWorker::new(
        queue,
        deps.controller.clone(),
        WorkerConfig::default().with_batch_size(config.worker_batch_size),
    );
    let worker_handle = tokio::spawn(worker.run(shutdown.clone()));

    // Start server
    let app = build_app(deps);
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await
        .context("Server error")?;

    // Stop the worker and wait for pending cache writes
    shutdown.cancel();
    worker_handle
        .await
        .context("Queue worker panicked")?
        .context("Queue worker failed")?;

    tracing::info!("Server stopped");
    Ok(())
}
