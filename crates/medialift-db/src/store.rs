//! Store traits the worker and upload manager are written against.
//!
//! The Postgres repositories implement them for production; unit tests
//! substitute in-memory implementations.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use medialift_core::models::{MediaAsset, MediaInfo, ProviderHost, ProviderKind, UploadJob};

use crate::db::asset::AssetRepository;
use crate::db::host::HostRepository;
use crate::db::job::JobRepository;

#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn get_asset(&self, id: Uuid) -> Result<Option<MediaAsset>>;
}

#[async_trait]
pub trait HostStore: Send + Sync {
    async fn create_host(&self, asset_id: Uuid, provider: ProviderKind) -> Result<ProviderHost>;
    async fn get_host(&self, id: Uuid) -> Result<Option<ProviderHost>>;
    async fn host_for_asset(
        &self,
        asset_id: Uuid,
        provider: ProviderKind,
    ) -> Result<Option<ProviderHost>>;
    async fn attach_job(&self, id: Uuid, job_id: Uuid) -> Result<Option<ProviderHost>>;
    async fn reset_pending(&self, id: Uuid) -> Result<Option<ProviderHost>>;
    async fn apply_info(&self, id: Uuid, info: &MediaInfo) -> Result<Option<ProviderHost>>;
    async fn mark_error(&self, id: Uuid, message: &str) -> Result<Option<ProviderHost>>;
    async fn list_unresolved(&self, limit: i64) -> Result<Vec<ProviderHost>>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(
        &self,
        payload: serde_json::Value,
        max_retries: i32,
        timeout_seconds: Option<i32>,
    ) -> Result<UploadJob>;
    async fn claim_next(&self) -> Result<Option<UploadJob>>;
    async fn mark_completed(
        &self,
        id: Uuid,
        result: serde_json::Value,
    ) -> Result<Option<UploadJob>>;
    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<Option<UploadJob>>;
    async fn reschedule_retry(&self, id: Uuid, backoff_seconds: u64)
        -> Result<Option<UploadJob>>;
}

#[async_trait]
impl AssetStore for AssetRepository {
    async fn get_asset(&self, id: Uuid) -> Result<Option<MediaAsset>> {
        self.get(id).await
    }
}

#[async_trait]
impl HostStore for HostRepository {
    async fn create_host(&self, asset_id: Uuid, provider: ProviderKind) -> Result<ProviderHost> {
        self.create(asset_id, provider).await
    }

    async fn get_host(&self, id: Uuid) -> Result<Option<ProviderHost>> {
        self.get(id).await
    }

    async fn host_for_asset(
        &self,
        asset_id: Uuid,
        provider: ProviderKind,
    ) -> Result<Option<ProviderHost>> {
        HostRepository::host_for_asset(self, asset_id, provider).await
    }

    async fn attach_job(&self, id: Uuid, job_id: Uuid) -> Result<Option<ProviderHost>> {
        HostRepository::attach_job(self, id, job_id).await
    }

    async fn reset_pending(&self, id: Uuid) -> Result<Option<ProviderHost>> {
        HostRepository::reset_pending(self, id).await
    }

    async fn apply_info(&self, id: Uuid, info: &MediaInfo) -> Result<Option<ProviderHost>> {
        HostRepository::apply_info(self, id, info).await
    }

    async fn mark_error(&self, id: Uuid, message: &str) -> Result<Option<ProviderHost>> {
        HostRepository::mark_error(self, id, message).await
    }

    async fn list_unresolved(&self, limit: i64) -> Result<Vec<ProviderHost>> {
        HostRepository::list_unresolved(self, limit).await
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn create_job(
        &self,
        payload: serde_json::Value,
        max_retries: i32,
        timeout_seconds: Option<i32>,
    ) -> Result<UploadJob> {
        self.create(payload, max_retries, timeout_seconds).await
    }

    async fn claim_next(&self) -> Result<Option<UploadJob>> {
        JobRepository::claim_next(self).await
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        result: serde_json::Value,
    ) -> Result<Option<UploadJob>> {
        JobRepository::mark_completed(self, id, result).await
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<Option<UploadJob>> {
        JobRepository::mark_failed(self, id, error).await
    }

    async fn reschedule_retry(
        &self,
        id: Uuid,
        backoff_seconds: u64,
    ) -> Result<Option<UploadJob>> {
        JobRepository::reschedule_retry(self, id, backoff_seconds).await
    }
}
