//! Medialift Worker
//!
//! Background upload execution: the job queue (worker pool fed by
//! LISTEN/NOTIFY plus polling), the upload manager that drives provider
//! clients, and the periodic reconciler that repairs unresolved host
//! records.

pub mod handler;
pub mod manager;
pub mod queue;
pub mod reconciler;

pub use handler::JobHandler;
pub use manager::{ReconcileSummary, UploadJobManager};
pub use queue::{UploadQueue, UploadQueueConfig, MAX_RETRY_BACKOFF_SECS};
pub use reconciler::Reconciler;
