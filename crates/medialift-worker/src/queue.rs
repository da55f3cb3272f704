//! Upload queue: worker pool, LISTEN/NOTIFY or polling, and retry.
//!
//! Shutdown: [`UploadQueue::shutdown`] signals the pool to stop; it does not
//! wait for in-flight jobs. For graceful shutdown, coordinate with your
//! runtime and allow time for running uploads to finish before process exit.

use anyhow::{Context, Result};
use serde_json::json;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::sleep;

use medialift_core::config::WorkerConfig;
use medialift_core::models::UploadJob;
use medialift_db::{JobStore, JOB_NOTIFY_CHANNEL};
use medialift_providers::ProviderError;

use crate::handler::JobHandler;

/// Maximum delay in seconds before retrying a failed job. Caps exponential
/// backoff so that high retry counts do not produce excessively long delays.
pub const MAX_RETRY_BACKOFF_SECS: u64 = 300;

/// Computes backoff in seconds for a given retry count (exponential with cap).
#[inline]
pub(crate) fn compute_retry_backoff_seconds(retry_count: i32) -> u64 {
    (2_u64.pow(retry_count as u32)).min(MAX_RETRY_BACKOFF_SECS)
}

#[derive(Clone)]
pub struct UploadQueueConfig {
    pub max_workers: usize,
    pub poll_interval_ms: u64,
    pub default_timeout_seconds: i32,
    pub max_retries: i32,
}

impl Default for UploadQueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            poll_interval_ms: 1000,
            default_timeout_seconds: 3600,
            max_retries: 3,
        }
    }
}

impl From<&WorkerConfig> for UploadQueueConfig {
    fn from(worker: &WorkerConfig) -> Self {
        Self {
            max_workers: worker.max_workers,
            poll_interval_ms: worker.poll_interval_ms,
            default_timeout_seconds: worker.default_timeout_seconds,
            max_retries: worker.max_retries,
        }
    }
}

pub struct UploadQueue {
    shutdown_tx: mpsc::Sender<()>,
}

impl UploadQueue {
    /// Create a new UploadQueue with a weak reference to the job handler.
    /// Job submission goes through `UploadJobManager::submit`, which writes
    /// the job row; the queue only claims and dispatches.
    ///
    /// If `pool` is `Some`, the worker uses PostgreSQL LISTEN/NOTIFY to wake
    /// immediately when jobs are created, in addition to polling at
    /// `poll_interval_ms`. If `pool` is `None`, only polling is used.
    pub fn new(
        jobs: Arc<dyn JobStore>,
        config: UploadQueueConfig,
        handler: Weak<dyn JobHandler>,
        pool: Option<sqlx::PgPool>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(async move {
            Self::worker_pool(jobs, config, handler, shutdown_rx, pool).await;
        });

        Self { shutdown_tx }
    }

    async fn worker_pool(
        jobs: Arc<dyn JobStore>,
        config: UploadQueueConfig,
        handler: Weak<dyn JobHandler>,
        mut shutdown_rx: mpsc::Receiver<()>,
        pool: Option<sqlx::PgPool>,
    ) {
        let use_listen = pool.is_some();
        tracing::info!(
            max_workers = config.max_workers,
            poll_interval_ms = config.poll_interval_ms,
            listen_notify = use_listen,
            "Upload queue worker pool started"
        );

        let semaphore = Arc::new(Semaphore::new(config.max_workers));
        let poll_interval = Duration::from_millis(config.poll_interval_ms);

        // Wake the main loop when LISTEN receives a NOTIFY (avoids blocking
        // on recv when no pool).
        let (notify_tx, mut notify_rx) = mpsc::channel::<()>(16);
        if let Some(pool) = pool {
            let tx = notify_tx.clone();
            tokio::spawn(async move {
                loop {
                    match sqlx::postgres::PgListener::connect_with(&pool).await {
                        Ok(mut listener) => {
                            if let Err(e) = listener.listen(JOB_NOTIFY_CHANNEL).await {
                                tracing::warn!(error = %e, "LISTEN failed, will retry");
                                tokio::time::sleep(Duration::from_secs(5)).await;
                                continue;
                            }
                            while listener.recv().await.is_ok() {
                                let _ = tx.send(()).await;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "PgListener connect failed, will retry");
                            tokio::time::sleep(Duration::from_secs(5)).await;
                        }
                    }
                }
            });
        }

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Upload queue worker pool shutting down");
                    break;
                }
                _ = notify_rx.recv() => {
                    Self::claim_and_dispatch_one(&jobs, &semaphore, &handler).await;
                }
                _ = sleep(poll_interval) => {
                    Self::claim_and_dispatch_one(&jobs, &semaphore, &handler).await;
                }
            }
        }

        tracing::info!("Upload queue worker pool stopped");
    }

    async fn claim_and_dispatch_one(
        jobs: &Arc<dyn JobStore>,
        semaphore: &Arc<Semaphore>,
        handler: &Weak<dyn JobHandler>,
    ) {
        let permit = match semaphore.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::debug!("No workers available, skipping claim");
                return;
            }
        };

        match jobs.claim_next().await {
            Ok(Some(job)) => {
                let jobs = jobs.clone();
                let handler = handler.clone();

                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(e) = Self::process_job_with_retry(job, jobs, handler).await {
                        tracing::error!(error = %e, "Job processing failed after retries");
                    }
                });
            }
            Ok(None) => {
                drop(permit);
                tracing::trace!("No jobs available in queue");
            }
            Err(e) => {
                drop(permit);
                tracing::error!(error = %e, "Failed to claim job from queue");
            }
        }
    }

    #[tracing::instrument(skip(jobs, handler), fields(job.id = %job.id))]
    async fn process_job_with_retry(
        job: UploadJob,
        jobs: Arc<dyn JobStore>,
        handler: Weak<dyn JobHandler>,
    ) -> Result<()> {
        let handler = handler
            .upgrade()
            .ok_or_else(|| anyhow::anyhow!("JobHandler was dropped, cannot process job"))?;

        let timeout_duration = job
            .timeout_seconds
            .map(|s| Duration::from_secs(s as u64))
            .unwrap_or(Duration::from_secs(3600));

        let result = tokio::time::timeout(timeout_duration, handler.run(&job)).await;

        match result {
            Ok(Ok(job_result)) => {
                jobs.mark_completed(job.id, job_result)
                    .await
                    .context("Failed to mark job as completed")?;
                tracing::info!(job_id = %job.id, "Upload job completed successfully");
                Ok(())
            }
            Ok(Err(e)) => {
                // Configuration and authentication failures never retry.
                let is_unrecoverable = e
                    .downcast_ref::<ProviderError>()
                    .map(|pe| !pe.is_recoverable())
                    .unwrap_or(false);

                tracing::error!(
                    job_id = %job.id,
                    error = %e,
                    retry_count = job.retry_count,
                    max_retries = job.max_retries,
                    unrecoverable = is_unrecoverable,
                    "Upload job execution failed"
                );

                if is_unrecoverable {
                    jobs.mark_failed(job.id, &e.to_string())
                        .await
                        .context("Failed to mark job as failed")?;
                    tracing::error!(
                        job_id = %job.id,
                        "Job failed with unrecoverable error, will not retry"
                    );
                    return Err(e);
                }

                if job.can_retry() {
                    let backoff_seconds = compute_retry_backoff_seconds(job.retry_count);
                    tracing::info!(
                        job_id = %job.id,
                        retry_count = job.retry_count + 1,
                        backoff_seconds = backoff_seconds,
                        "Scheduling job retry"
                    );
                    jobs.reschedule_retry(job.id, backoff_seconds)
                        .await
                        .context("Failed to reschedule job")?;
                    Ok(())
                } else {
                    jobs.mark_failed(job.id, &e.to_string())
                        .await
                        .context("Failed to mark job as failed")?;
                    tracing::error!(job_id = %job.id, "Job failed after max retries");
                    Err(e)
                }
            }
            Err(_) => {
                tracing::error!(
                    job_id = %job.id,
                    timeout_seconds = ?job.timeout_seconds,
                    "Upload job execution timed out"
                );
                if job.can_retry() {
                    let backoff_seconds = compute_retry_backoff_seconds(job.retry_count);
                    jobs.reschedule_retry(job.id, backoff_seconds).await?;
                    Ok(())
                } else {
                    jobs.mark_failed(
                        job.id,
                        &json!({
                            "error": "Job execution timed out",
                            "timeout_seconds": job.timeout_seconds,
                        })
                        .to_string(),
                    )
                    .await?;
                    Err(anyhow::anyhow!("Job execution timed out"))
                }
            }
        }
    }

    /// Signals the worker pool to stop claiming new jobs and exit the main
    /// loop. Returns immediately; in-flight uploads continue until they
    /// complete or time out.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating upload queue shutdown");
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl Clone for UploadQueue {
    fn clone(&self) -> Self {
        Self {
            shutdown_tx: self.shutdown_tx.clone(),
        }
    }
}
