//! Job handler trait
//!
//! The upload manager implements this trait. The queue holds a weak
//! reference and calls `run` for each claimed job; a dropped handler
//! stops processing without keeping the manager alive.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use medialift_core::models::UploadJob;

#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Execute one claimed job and return its result document.
    async fn run(self: Arc<Self>, job: &UploadJob) -> Result<serde_json::Value>;
}
