//! Medialift Providers
//!
//! Provider-agnostic abstraction over remote media-hosting services, plus
//! the two concrete clients: MediaHub (commercial media host, REST/multipart
//! API) and VidShare (video-sharing platform, metadata-envelope protocol).
//!
//! Callers hold `Arc<dyn ProviderClient>` obtained from the factory and
//! never a concrete client type.

pub mod embed;
pub mod factory;
pub mod mediahub;
pub mod traits;
pub mod vidshare;

pub use factory::{configured_providers, create_provider};
pub use mediahub::MediaHubClient;
pub use traits::{tags_with_sentinel, ProviderClient, ProviderError, ProviderResult, SENTINEL_TAG};
pub use vidshare::VidShareClient;
