//! Provider abstraction trait
//!
//! This module defines the `ProviderClient` trait that all remote hosting
//! backends implement, together with the provider error taxonomy.

use async_trait::async_trait;
use thiserror::Error;

use medialift_core::models::{MediaInfo, MediaKind, ProviderKind};

/// Provider operation errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Missing provider configuration: {0}")]
    Configuration(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Remote media not found: {0}")]
    NotFound(String),

    #[error("Operation not supported: {0}")]
    NotSupported(&'static str),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Whether a retry could plausibly succeed. Configuration and
    /// authentication failures abort without retry.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ProviderError::Configuration(_)
                | ProviderError::Authentication(_)
                | ProviderError::NotSupported(_)
        )
    }
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Fixed tag appended to every upload's tag list by provider convention.
pub const SENTINEL_TAG: &str = "medialift";

/// Returns the caller's tags plus the sentinel tag.
///
/// Never mutates the input and never duplicates the sentinel, so repeated
/// uploads of the same asset cannot accumulate it.
pub fn tags_with_sentinel(tags: &[String]) -> Vec<String> {
    let mut out = tags.to_vec();
    if !out.iter().any(|t| t == SENTINEL_TAG) {
        out.push(SENTINEL_TAG.to_string());
    }
    out
}

/// Remote media-hosting service abstraction.
///
/// The default method bodies express the abstract-base contract: mutating
/// operations fail with `NotSupported`, and `get_info` hands back an
/// all-null placeholder. Concrete providers override all four.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Establish a session with the remote provider using the client's
    /// configured credentials.
    async fn authenticate(&self) -> ProviderResult<()> {
        Err(ProviderError::NotSupported("authenticate"))
    }

    /// Transmit the local file and metadata, blocking until the provider
    /// acknowledges receipt (not necessarily until remote processing ends).
    /// Appends the sentinel tag to a copy of `tags` before transmission.
    async fn upload(
        &self,
        _kind: MediaKind,
        _path: &str,
        _title: &str,
        _description: &str,
        _tags: &[String],
    ) -> ProviderResult<MediaInfo> {
        Err(ProviderError::NotSupported("upload"))
    }

    /// Request remote removal of a media id.
    async fn delete(&self, _media_id: &str) -> ProviderResult<()> {
        Err(ProviderError::NotSupported("delete"))
    }

    /// Query current remote state. Concrete providers always populate the
    /// status as one of ok / error / deleted, never leaving it null.
    async fn get_info(&self, media_id: &str) -> ProviderResult<MediaInfo> {
        Ok(MediaInfo::placeholder(media_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BareProvider;

    impl ProviderClient for BareProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::MediaHub
        }
    }

    #[tokio::test]
    async fn base_operations_are_not_supported() {
        let provider = BareProvider;

        assert!(matches!(
            provider.authenticate().await,
            Err(ProviderError::NotSupported("authenticate"))
        ));
        assert!(matches!(
            provider
                .upload(MediaKind::Video, "/tmp/f.mp4", "t", "d", &[])
                .await,
            Err(ProviderError::NotSupported("upload"))
        ));
        assert!(matches!(
            provider.delete("m1").await,
            Err(ProviderError::NotSupported("delete"))
        ));
    }

    #[tokio::test]
    async fn base_get_info_is_an_all_null_placeholder() {
        let provider = BareProvider;
        let info = provider.get_info("m1").await.unwrap();
        assert_eq!(info.id.as_deref(), Some("m1"));
        assert!(info.status.is_none());
        assert!(info.url.is_none());
        assert!(info.tags.is_none());
    }

    #[test]
    fn sentinel_appended_exactly_once() {
        let tags = vec!["news".to_string(), "sports".to_string()];
        let with = tags_with_sentinel(&tags);

        assert_eq!(with.len(), 3);
        assert_eq!(with.last().map(String::as_str), Some(SENTINEL_TAG));
        // caller's list untouched
        assert_eq!(tags.len(), 2);

        // re-tagging an already-tagged list does not accumulate
        let again = tags_with_sentinel(&with);
        assert_eq!(again, with);
    }

    #[test]
    fn sentinel_on_empty_tag_list() {
        let with = tags_with_sentinel(&[]);
        assert_eq!(with, vec![SENTINEL_TAG.to_string()]);
    }

    #[test]
    fn recoverability_split() {
        assert!(!ProviderError::Configuration("x".into()).is_recoverable());
        assert!(!ProviderError::Authentication("x".into()).is_recoverable());
        assert!(!ProviderError::NotSupported("upload").is_recoverable());
        assert!(ProviderError::Upload("x".into()).is_recoverable());
        assert!(ProviderError::NotFound("x".into()).is_recoverable());
    }
}
