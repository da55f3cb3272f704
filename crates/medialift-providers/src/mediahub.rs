//! MediaHub client
//!
//! Commercial media host with a session-token REST API and multipart
//! uploads. Every upload is published with the same fixed visibility,
//! comment, and promotion settings; there is no per-call override.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use medialift_core::config::MediaHubConfig;
use medialift_core::models::{HostStatus, MediaInfo, MediaKind, ProviderKind};

use crate::embed::audio_embed;
use crate::traits::{tags_with_sentinel, ProviderClient, ProviderError, ProviderResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

// Fixed publication settings applied to every upload.
const VISIBILITY: &str = "anyone";
const COMMENTS: &str = "none";
const PROMOTED: &str = "false";

pub struct MediaHubClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MediaHubTag {
    description: String,
}

/// Remote media record as MediaHub reports it.
#[derive(Debug, Deserialize)]
struct MediaHubMedia {
    id: String,
    title: Option<String>,
    description: Option<String>,
    media_type: String,
    thumb_large: Option<String>,
    embed_code: Option<String>,
    url: Option<String>,
    #[serde(default)]
    tags: Vec<MediaHubTag>,
}

/// Map a found remote record to `MediaInfo`. Audio embeds render our own
/// player template; video embeds use MediaHub's supplied code verbatim.
/// A record without a playback URL is not yet resolved and must not report
/// `ok` (ok always carries a URL).
fn media_to_info(media: MediaHubMedia) -> MediaInfo {
    let tags = media
        .tags
        .iter()
        .map(|t| t.description.as_str())
        .collect::<Vec<_>>()
        .join(",");

    let embed = if media.media_type == "audio" {
        Some(audio_embed(&media.id))
    } else {
        media.embed_code
    };

    let status = if media.url.is_some() {
        HostStatus::Ok
    } else {
        HostStatus::Error
    };

    MediaInfo {
        id: Some(media.id),
        title: media.title,
        description: media.description,
        thumbnail_url: media.thumb_large,
        tags: Some(tags),
        embed,
        url: media.url,
        status: Some(status),
        status_message: None,
    }
}

impl MediaHubClient {
    /// Build a client from its credential block, validating eagerly: a
    /// blank credential fails here, not on first use.
    pub fn new(config: MediaHubConfig) -> ProviderResult<Self> {
        if config.username.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "MEDIAHUB_USERNAME is not set".to_string(),
            ));
        }
        if config.password.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "MEDIAHUB_PASSWORD is not set".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username,
            password: config.password,
        })
    }

    async fn session_token(&self) -> ProviderResult<String> {
        let response = self
            .http
            .post(format!("{}/auth/sessions", self.base_url))
            .json(&serde_json::json!({
                "username": self.username,
                "password": self.password,
            }))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ProviderError::Authentication(
                "MediaHub rejected the configured credentials".to_string(),
            ));
        }

        let session: SessionResponse = response.error_for_status()?.json().await?;
        Ok(session.token)
    }
}

#[async_trait]
impl ProviderClient for MediaHubClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::MediaHub
    }

    #[tracing::instrument(skip(self))]
    async fn authenticate(&self) -> ProviderResult<()> {
        self.session_token().await.map(|_| ())
    }

    #[tracing::instrument(skip(self, description, tags), fields(provider = "mediahub"))]
    async fn upload(
        &self,
        kind: MediaKind,
        path: &str,
        title: &str,
        description: &str,
        tags: &[String],
    ) -> ProviderResult<MediaInfo> {
        let token = self.session_token().await?;
        let tags = tags_with_sentinel(tags);
        let data = tokio::fs::read(path).await?;

        let file_name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media".to_string());

        let form = multipart::Form::new()
            .text("title", title.to_string())
            .text("description", description.to_string())
            .text("tags", tags.join(","))
            .text("pub_date", chrono::Utc::now().to_rfc3339())
            .text("visibility", VISIBILITY)
            .text("comments", COMMENTS)
            .text("promoted", PROMOTED)
            .part("file", multipart::Part::bytes(data).file_name(file_name));

        let endpoint = match kind {
            MediaKind::Video => "videos",
            MediaKind::Audio => "audios",
        };

        let response = self
            .http
            .post(format!("{}/{}", self.base_url, endpoint))
            .bearer_auth(&token)
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upload(format!(
                "MediaHub rejected the upload ({}): {}",
                status, body
            )));
        }

        let uploaded: UploadResponse = response.json().await?;
        tracing::info!(media_id = %uploaded.id, "MediaHub acknowledged upload");

        self.get_info(&uploaded.id).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, media_id: &str) -> ProviderResult<()> {
        let token = self.session_token().await?;
        let response = self
            .http
            .delete(format!("{}/media/{}", self.base_url, media_id))
            .bearer_auth(&token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(media_id.to_string()));
        }
        response.error_for_status()?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_info(&self, media_id: &str) -> ProviderResult<MediaInfo> {
        let token = self.session_token().await?;
        let response = self
            .http
            .get(format!("{}/media/{}", self.base_url, media_id))
            .bearer_auth(&token)
            .send()
            .await?;

        // MediaHub gives no way to tell "gone" from "never processed",
        // so a missing record maps to error, not deleted.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(MediaInfo::with_status(media_id, HostStatus::Error, None));
        }

        let media: MediaHubMedia = response.error_for_status()?.json().await?;
        Ok(media_to_info(media))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MediaHubConfig {
        MediaHubConfig {
            username: "editor".to_string(),
            password: "secret".to_string(),
            base_url: "https://api.mediahub.tv/v2/".to_string(),
        }
    }

    #[test]
    fn construction_validates_credentials_eagerly() {
        assert!(MediaHubClient::new(config()).is_ok());

        let mut blank_user = config();
        blank_user.username = "  ".to_string();
        assert!(matches!(
            MediaHubClient::new(blank_user),
            Err(ProviderError::Configuration(msg)) if msg.contains("MEDIAHUB_USERNAME")
        ));

        let mut blank_password = config();
        blank_password.password = String::new();
        assert!(matches!(
            MediaHubClient::new(blank_password),
            Err(ProviderError::Configuration(msg)) if msg.contains("MEDIAHUB_PASSWORD")
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = MediaHubClient::new(config()).unwrap();
        assert_eq!(client.base_url, "https://api.mediahub.tv/v2");
    }

    #[test]
    fn audio_record_renders_our_player_template() {
        let media: MediaHubMedia = serde_json::from_str(
            r#"{
                "id": "m77",
                "title": "Morning brief",
                "description": "daily",
                "media_type": "audio",
                "thumb_large": "https://img.mediahub.tv/m77.jpg",
                "embed_code": "<embed provider-side>",
                "url": "https://mediahub.tv/m77",
                "tags": [{"description": "news"}, {"description": "medialift"}]
            }"#,
        )
        .unwrap();

        let info = media_to_info(media);
        assert_eq!(info.status, Some(HostStatus::Ok));
        assert_eq!(info.id.as_deref(), Some("m77"));
        assert_eq!(info.tags.as_deref(), Some("news,medialift"));
        assert_eq!(info.url.as_deref(), Some("https://mediahub.tv/m77"));
        // audio ignores the provider's embed code
        assert!(info.embed.unwrap().contains("/audio/m77"));
    }

    #[test]
    fn video_record_uses_provider_embed_verbatim() {
        let media: MediaHubMedia = serde_json::from_str(
            r#"{
                "id": "m78",
                "media_type": "video",
                "embed_code": "<object data=\"m78\"></object>",
                "url": "https://mediahub.tv/m78"
            }"#,
        )
        .unwrap();

        let info = media_to_info(media);
        assert_eq!(info.embed.as_deref(), Some("<object data=\"m78\"></object>"));
        assert_eq!(info.tags.as_deref(), Some(""));
        assert!(info.thumbnail_url.is_none());
    }

    #[test]
    fn record_without_url_is_not_ok() {
        let media: MediaHubMedia = serde_json::from_str(
            r#"{
                "id": "m79",
                "media_type": "video",
                "embed_code": "<object data=\"m79\"></object>"
            }"#,
        )
        .unwrap();

        let info = media_to_info(media);
        assert!(info.url.is_none());
        assert_eq!(info.status, Some(HostStatus::Error));
        assert!(info.status_message.is_none());
    }

    #[test]
    fn missing_record_maps_to_error_status() {
        let info = MediaInfo::with_status("m404", HostStatus::Error, None);
        assert_eq!(info.status, Some(HostStatus::Error));
        assert!(info.url.is_none());
        assert!(info.thumbnail_url.is_none());
    }
}
