//! Medialift DB
//!
//! Postgres repositories for assets, provider host records, and upload
//! jobs, plus the store traits the worker is written against (concrete
//! repositories implement them; tests use in-memory mocks).

use anyhow::{Context, Result};
use sqlx::PgPool;

pub mod db;
pub mod store;

pub use db::asset::AssetRepository;
pub use db::host::HostRepository;
pub use db::job::{JobRepository, JOB_NOTIFY_CHANNEL};
pub use store::{AssetStore, HostStore, JobStore};

/// Apply embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!()
        .run(pool)
        .await
        .context("Failed to run database migrations")
}
