use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use medialift_core::models::{HostStatus, MediaInfo, ProviderHost, ProviderKind};

const HOST_COLUMNS: &str = "id, asset_id, provider, host_id, status, status_message, \
     job_id, url, embed, thumbnail_url, created_at, updated_at";

#[derive(Clone)]
pub struct HostRepository {
    pool: PgPool,
}

impl HostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a pending host record for an (asset, provider) pair. The
    /// UNIQUE constraint rejects a second record for the same pair.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, asset_id: Uuid, provider: ProviderKind) -> Result<ProviderHost> {
        sqlx::query_as::<Postgres, ProviderHost>(&format!(
            r#"
            INSERT INTO provider_hosts (asset_id, provider)
            VALUES ($1, $2)
            RETURNING {HOST_COLUMNS}
            "#,
        ))
        .bind(asset_id)
        .bind(provider)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert provider host")
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Option<ProviderHost>> {
        sqlx::query_as::<Postgres, ProviderHost>(&format!(
            "SELECT {HOST_COLUMNS} FROM provider_hosts WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch provider host")
    }

    #[tracing::instrument(skip(self))]
    pub async fn host_for_asset(
        &self,
        asset_id: Uuid,
        provider: ProviderKind,
    ) -> Result<Option<ProviderHost>> {
        sqlx::query_as::<Postgres, ProviderHost>(&format!(
            "SELECT {HOST_COLUMNS} FROM provider_hosts WHERE asset_id = $1 AND provider = $2",
        ))
        .bind(asset_id)
        .bind(provider)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch provider host for asset")
    }

    /// Point a host record at the upload job that will resolve it.
    #[tracing::instrument(skip(self))]
    pub async fn attach_job(&self, id: Uuid, job_id: Uuid) -> Result<Option<ProviderHost>> {
        sqlx::query_as::<Postgres, ProviderHost>(&format!(
            r#"
            UPDATE provider_hosts
            SET job_id = $2, updated_at = now()
            WHERE id = $1
            RETURNING {HOST_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to attach job to provider host")
    }

    /// Wipe a host back to its pre-upload state for resubmission. The
    /// remote copy, if one exists, is orphaned on purpose.
    #[tracing::instrument(skip(self))]
    pub async fn reset_pending(&self, id: Uuid) -> Result<Option<ProviderHost>> {
        sqlx::query_as::<Postgres, ProviderHost>(&format!(
            r#"
            UPDATE provider_hosts
            SET host_id = NULL,
                status = 'pending',
                status_message = NULL,
                job_id = NULL,
                url = NULL,
                embed = NULL,
                thumbnail_url = NULL,
                updated_at = now()
            WHERE id = $1
            RETURNING {HOST_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to reset provider host")
    }

    /// Persist a provider query result onto a host record.
    ///
    /// Mirrors [`ProviderHost::apply_info`]: `host_id` and `status` survive
    /// when the result omits them, everything else is taken verbatim.
    #[tracing::instrument(skip(self, info))]
    pub async fn apply_info(&self, id: Uuid, info: &MediaInfo) -> Result<Option<ProviderHost>> {
        sqlx::query_as::<Postgres, ProviderHost>(&format!(
            r#"
            UPDATE provider_hosts
            SET host_id = COALESCE($2, host_id),
                status = COALESCE($3, status),
                status_message = $4,
                url = $5,
                embed = $6,
                thumbnail_url = $7,
                updated_at = now()
            WHERE id = $1
            RETURNING {HOST_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&info.id)
        .bind(info.status)
        .bind(&info.status_message)
        .bind(&info.url)
        .bind(&info.embed)
        .bind(&info.thumbnail_url)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to apply media info to provider host")
    }

    /// Record a failure with its reason so the host does not re-enter the
    /// reconciliation batch for the message alone.
    #[tracing::instrument(skip(self, message))]
    pub async fn mark_error(&self, id: Uuid, message: &str) -> Result<Option<ProviderHost>> {
        sqlx::query_as::<Postgres, ProviderHost>(&format!(
            r#"
            UPDATE provider_hosts
            SET status = 'error', status_message = $2, updated_at = now()
            WHERE id = $1
            RETURNING {HOST_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(message)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to mark provider host as errored")
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        status: HostStatus,
        message: Option<&str>,
    ) -> Result<Option<ProviderHost>> {
        sqlx::query_as::<Postgres, ProviderHost>(&format!(
            r#"
            UPDATE provider_hosts
            SET status = $2, status_message = $3, updated_at = now()
            WHERE id = $1
            RETURNING {HOST_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(status)
        .bind(message)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update provider host status")
    }

    /// Hosts whose upload job finished but whose record never resolved:
    /// an error with no recorded reason, or a missing URL. Matches
    /// [`ProviderHost::needs_requery`], restricted to completed jobs so
    /// in-flight uploads are left alone.
    #[tracing::instrument(skip(self))]
    pub async fn list_unresolved(&self, limit: i64) -> Result<Vec<ProviderHost>> {
        sqlx::query_as::<Postgres, ProviderHost>(
            r#"
            SELECT h.id, h.asset_id, h.provider, h.host_id, h.status, h.status_message,
                   h.job_id, h.url, h.embed, h.thumbnail_url, h.created_at, h.updated_at
            FROM provider_hosts h
            JOIN upload_jobs j ON j.id = h.job_id
            WHERE j.status = 'completed'
              AND ((h.status = 'error' AND h.status_message IS NULL) OR h.url IS NULL)
            ORDER BY h.updated_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list unresolved provider hosts")
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM provider_hosts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete provider host")?;

        Ok(result.rows_affected() > 0)
    }
}
