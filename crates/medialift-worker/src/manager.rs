//! Upload job manager
//!
//! Orchestrates the upload lifecycle: submission creates a pending host
//! record and a queued job, job execution drives the provider client and
//! persists the outcome, and the periodic reconcile pass re-queries hosts
//! whose records never resolved.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use medialift_core::config::WorkerConfig;
use medialift_core::models::{
    HostStatus, MediaInfo, ProviderHost, ProviderKind, UploadJob, UploadJobPayload,
};
use medialift_core::AppError;
use medialift_db::{AssetStore, HostStore, JobStore};
use medialift_providers::{ProviderClient, ProviderError};

use crate::handler::JobHandler;

/// Upper bound on hosts examined per reconcile pass.
const RECONCILE_BATCH_LIMIT: i64 = 100;

/// Outcome of one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub examined: usize,
    pub repaired: usize,
    pub skipped: usize,
}

pub struct UploadJobManager {
    assets: Arc<dyn AssetStore>,
    hosts: Arc<dyn HostStore>,
    jobs: Arc<dyn JobStore>,
    providers: HashMap<ProviderKind, Arc<dyn ProviderClient>>,
    config: WorkerConfig,
}

impl UploadJobManager {
    pub fn new(
        assets: Arc<dyn AssetStore>,
        hosts: Arc<dyn HostStore>,
        jobs: Arc<dyn JobStore>,
        providers: HashMap<ProviderKind, Arc<dyn ProviderClient>>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            assets,
            hosts,
            jobs,
            providers,
            config,
        }
    }

    fn provider(&self, kind: ProviderKind) -> Result<&Arc<dyn ProviderClient>> {
        self.providers.get(&kind).ok_or_else(|| {
            ProviderError::Configuration(format!("Provider {kind} is not configured")).into()
        })
    }

    /// Submit an asset for upload to one provider.
    ///
    /// Creates (or resets) the host record for the (asset, provider) pair,
    /// enqueues the upload job, and points the host at it. A host whose
    /// previous job is still pending is rejected; a failed or errored host
    /// is wiped back to pending for a fresh attempt.
    #[tracing::instrument(skip(self))]
    pub async fn submit(&self, asset_id: Uuid, provider: ProviderKind) -> Result<ProviderHost> {
        // Fail fast on an unconfigured provider rather than queueing a job
        // that can never run.
        self.provider(provider)?;

        let asset = self
            .assets
            .get_asset(asset_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("asset {asset_id}")))?;

        let host = match self.hosts.host_for_asset(asset_id, provider).await? {
            Some(existing) if existing.status == HostStatus::Pending => {
                return Err(AppError::InvalidInput(format!(
                    "asset {asset_id} already has a pending upload to {provider}"
                ))
                .into());
            }
            Some(existing) => self
                .hosts
                .reset_pending(existing.id)
                .await?
                .ok_or_else(|| anyhow!("Host record {} vanished during reset", existing.id))?,
            None => self.hosts.create_host(asset_id, provider).await?,
        };

        // A pending host without a job handle would never be picked up by
        // reconciliation, so an enqueue failure is recorded on the host the
        // same way a failed upload is.
        let payload = UploadJobPayload { asset_id, provider };
        let job = match self
            .jobs
            .create_job(
                serde_json::to_value(payload).context("Failed to serialize job payload")?,
                self.config.max_retries,
                Some(self.config.default_timeout_seconds),
            )
            .await
        {
            Ok(job) => job,
            Err(e) => {
                self.hosts
                    .mark_error(host.id, &format!("Failed to enqueue upload job: {e}"))
                    .await?;
                return Err(e);
            }
        };

        let host = match self.hosts.attach_job(host.id, job.id).await {
            Ok(Some(host)) => host,
            Ok(None) => {
                return Err(anyhow!("Host record {} vanished during job attach", host.id));
            }
            Err(e) => {
                self.hosts
                    .mark_error(host.id, &format!("Failed to attach upload job: {e}"))
                    .await?;
                return Err(e);
            }
        };

        tracing::info!(
            asset_id = %asset.id,
            provider = %provider,
            job_id = %job.id,
            host_record = %host.id,
            "Upload submitted"
        );
        Ok(host)
    }

    /// Execute one claimed upload job: push the file to the provider and
    /// persist the returned record onto the host. On failure the host is
    /// marked errored with the reason before the error propagates to the
    /// queue's retry logic.
    #[tracing::instrument(skip(self, job), fields(job.id = %job.id))]
    pub async fn run_upload(&self, job: &UploadJob) -> Result<serde_json::Value> {
        let payload: UploadJobPayload = job
            .try_payload_as()
            .context("Malformed upload job payload")?;

        let asset = self
            .assets
            .get_asset(payload.asset_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("asset {}", payload.asset_id)))?;

        let host = self
            .hosts
            .host_for_asset(payload.asset_id, payload.provider)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "host record for asset {} on {}",
                    payload.asset_id, payload.provider
                ))
            })?;

        let provider = self.provider(payload.provider)?;

        match provider
            .upload(
                asset.kind,
                &asset.local_path,
                &asset.title,
                &asset.description,
                &asset.tags,
            )
            .await
        {
            Ok(info) => {
                self.hosts.apply_info(host.id, &info).await?;
                tracing::info!(
                    asset_id = %asset.id,
                    provider = %payload.provider,
                    media_id = ?info.id,
                    "Upload finished"
                );
                Ok(json!({ "media_id": info.id, "url": info.url }))
            }
            Err(e) => {
                self.hosts.mark_error(host.id, &e.to_string()).await?;
                Err(e.into())
            }
        }
    }

    /// Re-query every host whose upload job completed but whose record is
    /// unresolved: an error with no recorded reason, or a missing URL.
    ///
    /// One failing host never aborts the batch; it is logged and skipped,
    /// and the next pass picks it up again. Hosts without a remote id
    /// cannot be queried and are skipped with a warning.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<ReconcileSummary> {
        let unresolved = self.hosts.list_unresolved(RECONCILE_BATCH_LIMIT).await?;
        let mut summary = ReconcileSummary {
            examined: unresolved.len(),
            ..Default::default()
        };

        for host in unresolved {
            let Some(media_id) = host.host_id.as_deref() else {
                tracing::warn!(
                    host_record = %host.id,
                    asset_id = %host.asset_id,
                    provider = %host.provider,
                    "Unresolved host has no remote id to query, skipping"
                );
                summary.skipped += 1;
                continue;
            };

            let provider = match self.provider(host.provider) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(host_record = %host.id, error = %e, "Skipping host");
                    summary.skipped += 1;
                    continue;
                }
            };

            match provider.get_info(media_id).await {
                Ok(info) => {
                    self.hosts.apply_info(host.id, &info).await?;
                    summary.repaired += 1;
                    tracing::info!(
                        host_record = %host.id,
                        media_id = media_id,
                        status = ?info.status,
                        "Host record reconciled"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        host_record = %host.id,
                        media_id = media_id,
                        error = %e,
                        "Provider query failed during reconcile, skipping"
                    );
                    summary.skipped += 1;
                }
            }
        }

        tracing::info!(
            examined = summary.examined,
            repaired = summary.repaired,
            skipped = summary.skipped,
            "Reconcile pass finished"
        );
        Ok(summary)
    }

    /// Remove the remote copy behind a host record and mark it deleted.
    #[tracing::instrument(skip(self))]
    pub async fn delete_remote(&self, host_record_id: Uuid) -> Result<()> {
        let host = self
            .hosts
            .get_host(host_record_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("host record {host_record_id}")))?;

        let media_id = host.host_id.as_deref().ok_or_else(|| {
            AppError::InvalidInput(format!("host record {host_record_id} has no remote id"))
        })?;

        let provider = self.provider(host.provider)?;
        provider.delete(media_id).await?;

        self.hosts
            .apply_info(
                host.id,
                &MediaInfo::with_status(media_id, HostStatus::Deleted, None),
            )
            .await?;

        tracing::info!(
            host_record = %host.id,
            provider = %host.provider,
            media_id = media_id,
            "Remote media deleted"
        );
        Ok(())
    }
}

#[async_trait]
impl JobHandler for UploadJobManager {
    async fn run(self: Arc<Self>, job: &UploadJob) -> Result<serde_json::Value> {
        self.run_upload(job).await
    }
}
