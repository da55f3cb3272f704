use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use medialift_core::models::{JobStatus, UploadJob};

/// Channel notified on job creation so idle workers wake without waiting
/// for the next poll tick.
pub const JOB_NOTIFY_CHANNEL: &str = "medialift_new_job";

const JOB_COLUMNS: &str = "id, status, payload, result, scheduled_at, started_at, \
     completed_at, retry_count, max_retries, timeout_seconds, created_at, updated_at";

#[derive(Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a job and notify listening workers in the same transaction.
    /// A failed notify is logged, not fatal: polling picks the job up.
    #[tracing::instrument(skip(self, payload))]
    pub async fn create(
        &self,
        payload: serde_json::Value,
        max_retries: i32,
        timeout_seconds: Option<i32>,
    ) -> Result<UploadJob> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction for job creation")?;

        let job: UploadJob = sqlx::query_as::<Postgres, UploadJob>(&format!(
            r#"
            INSERT INTO upload_jobs (payload, max_retries, timeout_seconds)
            VALUES ($1, $2, $3)
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(payload)
        .bind(max_retries)
        .bind(timeout_seconds)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert upload job")?;

        if let Err(err) = sqlx::query("SELECT pg_notify($1, $2)")
            .bind(JOB_NOTIFY_CHANNEL)
            .bind(job.id.to_string())
            .execute(&mut *tx)
            .await
        {
            tracing::warn!(job_id = %job.id, error = %err, "Failed to notify workers of new job");
        }

        tx.commit()
            .await
            .context("Failed to commit job creation")?;

        tracing::info!(job_id = %job.id, "Upload job created");
        Ok(job)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Option<UploadJob>> {
        sqlx::query_as::<Postgres, UploadJob>(&format!(
            "SELECT {JOB_COLUMNS} FROM upload_jobs WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch upload job")
    }

    /// Claim the oldest runnable job, marking it running. `FOR UPDATE SKIP
    /// LOCKED` lets concurrent workers claim distinct jobs without blocking.
    #[tracing::instrument(skip(self))]
    pub async fn claim_next(&self) -> Result<Option<UploadJob>> {
        sqlx::query_as::<Postgres, UploadJob>(&format!(
            r#"
            UPDATE upload_jobs
            SET status = 'running', started_at = now(), updated_at = now()
            WHERE id = (
                SELECT id FROM upload_jobs
                WHERE status IN ('pending', 'scheduled') AND scheduled_at <= now()
                ORDER BY scheduled_at ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .fetch_optional(&self.pool)
        .await
        .context("Failed to claim next upload job")
    }

    #[tracing::instrument(skip(self, result))]
    pub async fn mark_completed(
        &self,
        id: Uuid,
        result: serde_json::Value,
    ) -> Result<Option<UploadJob>> {
        sqlx::query_as::<Postgres, UploadJob>(&format!(
            r#"
            UPDATE upload_jobs
            SET status = 'completed', result = $2, completed_at = now(), updated_at = now()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(result)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to mark upload job completed")
    }

    #[tracing::instrument(skip(self, error))]
    pub async fn mark_failed(&self, id: Uuid, error: &str) -> Result<Option<UploadJob>> {
        sqlx::query_as::<Postgres, UploadJob>(&format!(
            r#"
            UPDATE upload_jobs
            SET status = 'failed',
                result = jsonb_build_object('error', $2::text),
                completed_at = now(),
                updated_at = now()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(error)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to mark upload job failed")
    }

    /// Push a failed attempt back into the queue after a backoff.
    #[tracing::instrument(skip(self))]
    pub async fn reschedule_retry(
        &self,
        id: Uuid,
        backoff_seconds: u64,
    ) -> Result<Option<UploadJob>> {
        sqlx::query_as::<Postgres, UploadJob>(&format!(
            r#"
            UPDATE upload_jobs
            SET status = 'scheduled',
                retry_count = retry_count + 1,
                scheduled_at = now() + make_interval(secs => $2),
                started_at = NULL,
                updated_at = now()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(backoff_seconds as f64)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to reschedule upload job")
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: Uuid, status: JobStatus) -> Result<Option<UploadJob>> {
        sqlx::query_as::<Postgres, UploadJob>(&format!(
            r#"
            UPDATE upload_jobs
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update upload job status")
    }
}
