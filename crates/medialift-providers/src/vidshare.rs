//! VidShare client
//!
//! Video-sharing platform. Uploads carry a metadata envelope (title,
//! description, fixed category, comma-joined keywords) beside the file
//! part. Remote ids arrive atom-style and are extracted from the last path
//! segment; embed markup is always synthesized from that extracted id via
//! the fixed video template, never taken from the provider's own fields.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::{Deserialize, Serialize};

use medialift_core::config::VidShareConfig;
use medialift_core::models::{HostStatus, MediaInfo, MediaKind, ProviderKind};

use crate::embed::video_embed;
use crate::traits::{tags_with_sentinel, ProviderClient, ProviderError, ProviderResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

// Every upload lands in the same fixed category.
const CATEGORY: &str = "Entertainment";

pub struct VidShareClient {
    http: reqwest::Client,
    base_url: String,
    email: String,
    password: String,
    developer_key: String,
}

/// Metadata envelope transmitted with every upload.
#[derive(Debug, Serialize)]
struct MediaEnvelope {
    title: String,
    description: String,
    category: String,
    keywords: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ProcessingFailure {
    state: String,
    message: Option<String>,
}

/// Remote video entry. `id` is atom-style
/// (`tag:vidshare.tv,2008:video/<id>` or a feed URL); the bare id is the
/// last `/` segment.
#[derive(Debug, Deserialize)]
struct VidShareEntry {
    id: String,
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    thumbnails: Vec<String>,
    keywords: Option<String>,
    player_url: Option<String>,
    processing_failure: Option<ProcessingFailure>,
}

/// Failure body returned by query endpoints.
#[derive(Debug, Deserialize)]
struct FailureResponse {
    reason: String,
}

fn extract_media_id(raw: &str) -> &str {
    raw.rsplit('/').next().unwrap_or(raw)
}

/// Upload/entry status: no failure element means the video is fine.
fn entry_status(entry: &VidShareEntry) -> (HostStatus, Option<String>) {
    match &entry.processing_failure {
        None => (HostStatus::Ok, None),
        Some(failure) => (
            HostStatus::Error,
            failure.message.clone().or_else(|| Some(failure.state.clone())),
        ),
    }
}

/// Query-failure status: "Not Found" means the remote object is gone;
/// anything else is a generic error carrying the reason.
fn failure_status(reason: &str) -> (HostStatus, Option<String>) {
    if reason == "Not Found" {
        (HostStatus::Deleted, None)
    } else {
        (HostStatus::Error, Some(reason.to_string()))
    }
}

fn entry_to_info(entry: VidShareEntry) -> MediaInfo {
    let media_id = extract_media_id(&entry.id).to_string();
    let (status, status_message) = entry_status(&entry);

    // ok always carries a URL; an entry without a player URL is still
    // processing and stays unresolved.
    let status = if status == HostStatus::Ok && entry.player_url.is_none() {
        HostStatus::Error
    } else {
        status
    };

    MediaInfo {
        title: entry.title,
        description: entry.description,
        thumbnail_url: entry.thumbnails.last().cloned(),
        tags: entry.keywords,
        embed: Some(video_embed(&media_id)),
        url: entry.player_url,
        id: Some(media_id),
        status: Some(status),
        status_message,
    }
}

impl VidShareClient {
    /// Build a client from its credential block, validating all three
    /// credentials eagerly.
    pub fn new(config: VidShareConfig) -> ProviderResult<Self> {
        if config.email.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "VIDSHARE_EMAIL is not set".to_string(),
            ));
        }
        if config.password.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "VIDSHARE_PASSWORD is not set".to_string(),
            ));
        }
        if config.developer_key.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "VIDSHARE_DEVELOPER_KEY is not set".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            email: config.email,
            password: config.password,
            developer_key: config.developer_key,
        })
    }

    async fn session_token(&self) -> ProviderResult<String> {
        let response = self
            .http
            .post(format!("{}/sessions", self.base_url))
            .header("X-Developer-Key", &self.developer_key)
            .json(&serde_json::json!({
                "email": self.email,
                "password": self.password,
            }))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ProviderError::Authentication(
                "Incorrect VidShare email or password".to_string(),
            ));
        }

        let session: SessionResponse = response.error_for_status()?.json().await?;
        Ok(session.token)
    }
}

#[async_trait]
impl ProviderClient for VidShareClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::VidShare
    }

    #[tracing::instrument(skip(self))]
    async fn authenticate(&self) -> ProviderResult<()> {
        self.session_token().await.map(|_| ())
    }

    // VidShare hosts video only; audio files are accepted and published
    // through the same video pipeline, as the platform treats them.
    #[tracing::instrument(skip(self, description, tags), fields(provider = "vidshare"))]
    async fn upload(
        &self,
        _kind: MediaKind,
        path: &str,
        title: &str,
        description: &str,
        tags: &[String],
    ) -> ProviderResult<MediaInfo> {
        let token = self.session_token().await?;

        let envelope = MediaEnvelope {
            title: title.to_string(),
            description: description.to_string(),
            category: CATEGORY.to_string(),
            keywords: tags_with_sentinel(tags).join(","),
        };
        let envelope = serde_json::to_string(&envelope).map_err(|e| {
            ProviderError::Upload(format!("failed to encode metadata envelope: {}", e))
        })?;

        let data = tokio::fs::read(path).await?;
        let file_name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());

        let form = multipart::Form::new()
            .text("envelope", envelope)
            .part("file", multipart::Part::bytes(data).file_name(file_name));

        let response = self
            .http
            .post(format!("{}/videos", self.base_url))
            .bearer_auth(&token)
            .header("X-Developer-Key", &self.developer_key)
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upload(format!(
                "VidShare rejected the upload ({}): {}",
                status, body
            )));
        }

        let entry: VidShareEntry = response.json().await?;
        let info = entry_to_info(entry);
        tracing::info!(media_id = ?info.id, status = ?info.status, "VidShare acknowledged upload");
        Ok(info)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, media_id: &str) -> ProviderResult<()> {
        let token = self.session_token().await?;
        let response = self
            .http
            .delete(format!("{}/videos/{}", self.base_url, media_id))
            .bearer_auth(&token)
            .header("X-Developer-Key", &self.developer_key)
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
            .get(format!("{}/videos/{}", self.base_url, media_id))
            .bearer_auth(&token)
            .header("X-Developer-Key", &self.developer_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<FailureResponse>(&body)
                .map(|f| f.reason)
                .unwrap_or(body);
            let (status, message) = failure_status(&reason);
            return Ok(MediaInfo::with_status(media_id, status, message));
        }

        let entry: VidShareEntry = response.json().await?;
        Ok(entry_to_info(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::SENTINEL_TAG;

    fn config() -> VidShareConfig {
        VidShareConfig {
            email: "uploads@example.com".to_string(),
            password: "secret".to_string(),
            developer_key: "dk-123".to_string(),
            base_url: "https://api.vidshare.tv/v1".to_string(),
        }
    }

    #[test]
    fn construction_validates_all_credentials() {
        assert!(VidShareClient::new(config()).is_ok());

        for blank in ["email", "password", "developer_key"] {
            let mut cfg = config();
            match blank {
                "email" => cfg.email = String::new(),
                "password" => cfg.password = String::new(),
                _ => cfg.developer_key = "  ".to_string(),
            }
            assert!(matches!(
                VidShareClient::new(cfg),
                Err(ProviderError::Configuration(_))
            ));
        }
    }

    #[test]
    fn media_id_extracted_from_atom_style_id() {
        assert_eq!(
            extract_media_id("https://api.vidshare.tv/v1/feeds/videos/AbC-123"),
            "AbC-123"
        );
        assert_eq!(extract_media_id("tag:vidshare.tv,2008:video/XyZ9"), "XyZ9");
        assert_eq!(extract_media_id("plain-id"), "plain-id");
    }

    #[test]
    fn healthy_entry_maps_to_ok_with_synthesized_embed() {
        let entry: VidShareEntry = serde_json::from_str(
            r#"{
                "id": "https://api.vidshare.tv/v1/feeds/videos/AbC-123",
                "title": "Launch day",
                "description": "highlights",
                "thumbnails": ["https://img.vidshare.tv/s.jpg", "https://img.vidshare.tv/l.jpg"],
                "keywords": "news,medialift",
                "player_url": "https://vidshare.tv/v/AbC-123",
                "embed_html": "<provider embed, ignored>"
            }"#,
        )
        .unwrap();

        let info = entry_to_info(entry);
        assert_eq!(info.id.as_deref(), Some("AbC-123"));
        assert_eq!(info.status, Some(HostStatus::Ok));
        assert!(info.status_message.is_none());
        // embed synthesized from the extracted id, not the provider's field
        assert!(info.embed.unwrap().contains("/embed/AbC-123"));
        // last (largest) thumbnail wins
        assert_eq!(
            info.thumbnail_url.as_deref(),
            Some("https://img.vidshare.tv/l.jpg")
        );
        assert_eq!(info.url.as_deref(), Some("https://vidshare.tv/v/AbC-123"));
    }

    #[test]
    fn entry_without_player_url_is_not_ok() {
        let entry: VidShareEntry = serde_json::from_str(
            r#"{
                "id": "tag:vidshare.tv,2008:video/Fresh1",
                "title": "still processing"
            }"#,
        )
        .unwrap();

        let info = entry_to_info(entry);
        assert!(info.url.is_none());
        assert_eq!(info.status, Some(HostStatus::Error));
        assert!(info.status_message.is_none());
    }

    #[test]
    fn failed_processing_maps_to_error_with_message() {
        let entry: VidShareEntry = serde_json::from_str(
            r#"{
                "id": "tag:vidshare.tv,2008:video/Bad1",
                "processing_failure": {"state": "rejected", "message": "duplicate upload"}
            }"#,
        )
        .unwrap();

        let info = entry_to_info(entry);
        assert_eq!(info.status, Some(HostStatus::Error));
        assert_eq!(info.status_message.as_deref(), Some("duplicate upload"));
    }

    #[test]
    fn failure_without_message_falls_back_to_state() {
        let entry: VidShareEntry = serde_json::from_str(
            r#"{
                "id": "tag:vidshare.tv,2008:video/Bad2",
                "processing_failure": {"state": "failed"}
            }"#,
        )
        .unwrap();

        let (status, message) = entry_status(&entry);
        assert_eq!(status, HostStatus::Error);
        assert_eq!(message.as_deref(), Some("failed"));
    }

    #[test]
    fn not_found_reason_maps_to_deleted() {
        let (status, message) = failure_status("Not Found");
        assert_eq!(status, HostStatus::Deleted);
        assert!(message.is_none());

        let (status, message) = failure_status("Internal Error");
        assert_eq!(status, HostStatus::Error);
        assert_eq!(message.as_deref(), Some("Internal Error"));
    }

    #[test]
    fn envelope_carries_fixed_category_and_sentinel() {
        let envelope = MediaEnvelope {
            title: "t".to_string(),
            description: "d".to_string(),
            category: CATEGORY.to_string(),
            keywords: tags_with_sentinel(&["news".to_string()]).join(","),
        };
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["category"], "Entertainment");
        assert_eq!(value["keywords"], format!("news,{}", SENTINEL_TAG));
    }
}
