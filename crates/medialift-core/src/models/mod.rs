pub mod asset;
pub mod host;
pub mod job;
pub mod media_info;

pub use asset::{MediaAsset, MediaKind};
pub use host::{HostStatus, ProviderHost, ProviderKind};
pub use job::{JobStatus, UploadJob, UploadJobPayload};
pub use media_info::MediaInfo;
