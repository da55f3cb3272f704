use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use medialift_core::Config;
use medialift_db::{AssetRepository, AssetStore, HostRepository, HostStore, JobRepository, JobStore};
use medialift_providers::configured_providers;
use medialift_worker::{JobHandler, Reconciler, UploadJobManager, UploadQueue, UploadQueueConfig};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    medialift_db::run_migrations(&pool).await?;

    let assets: Arc<dyn AssetStore> = Arc::new(AssetRepository::new(pool.clone()));
    let hosts: Arc<dyn HostStore> = Arc::new(HostRepository::new(pool.clone()));
    let jobs: Arc<dyn JobStore> = Arc::new(JobRepository::new(pool.clone()));

    let providers = configured_providers(&config)?;
    if providers.is_empty() {
        anyhow::bail!("No provider credentials configured, nothing to do");
    }
    tracing::info!(providers = providers.len(), "Provider clients ready");

    let manager = Arc::new(UploadJobManager::new(
        assets,
        hosts,
        jobs.clone(),
        providers,
        config.worker.clone(),
    ));

    let handler: Arc<dyn JobHandler> = manager.clone();
    let queue = UploadQueue::new(
        jobs,
        UploadQueueConfig::from(&config.worker),
        Arc::downgrade(&handler),
        Some(pool.clone()),
    );

    let reconciler = Reconciler::spawn(manager.clone(), config.worker.reconcile_interval_secs);

    tracing::info!(environment = %config.environment, "Medialift worker running");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    reconciler.shutdown().await;
    queue.shutdown().await;

    Ok(())
}
