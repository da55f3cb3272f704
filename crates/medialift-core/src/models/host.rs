use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use super::media_info::MediaInfo;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "provider_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    MediaHub,
    VidShare,
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ProviderKind::MediaHub => write!(f, "mediahub"),
            ProviderKind::VidShare => write!(f, "vidshare"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mediahub" => Ok(ProviderKind::MediaHub),
            "vidshare" => Ok(ProviderKind::VidShare),
            _ => Err(anyhow::anyhow!("Invalid provider kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "host_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    Pending,
    Ok,
    Error,
    Deleted,
}

impl Display for HostStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            HostStatus::Pending => write!(f, "pending"),
            HostStatus::Ok => write!(f, "ok"),
            HostStatus::Error => write!(f, "error"),
            HostStatus::Deleted => write!(f, "deleted"),
        }
    }
}

impl FromStr for HostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(HostStatus::Pending),
            "ok" => Ok(HostStatus::Ok),
            "error" => Ok(HostStatus::Error),
            "deleted" => Ok(HostStatus::Deleted),
            _ => Err(anyhow::anyhow!("Invalid host status: {}", s)),
        }
    }
}

/// Per-asset record tracking one provider's copy of a media upload and its
/// remote status. One row per (asset, provider); destroyed with the asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProviderHost {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub provider: ProviderKind,
    pub host_id: Option<String>,
    pub status: HostStatus,
    pub status_message: Option<String>,
    pub job_id: Option<Uuid>,
    pub url: Option<String>,
    pub embed: Option<String>,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderHost {
    /// An `ok` host must carry a remote id and URL; a `pending` host must
    /// carry a job handle and no remote id yet.
    pub fn invariants_hold(&self) -> bool {
        match self.status {
            HostStatus::Ok => self.host_id.is_some() && self.url.is_some(),
            HostStatus::Pending => self.job_id.is_some() && self.host_id.is_none(),
            _ => true,
        }
    }

    /// Reconciliation trigger: an error without a recorded reason, or a
    /// missing URL, each independently selects the host for re-query.
    pub fn needs_requery(&self) -> bool {
        (self.status == HostStatus::Error && self.status_message.is_none()) || self.url.is_none()
    }

    /// Overwrite this record from a provider query result.
    ///
    /// `host_id` and `status` are only replaced when the result carries
    /// them; `status_message`, `url`, `embed` and `thumbnail_url` are taken
    /// verbatim. The repository UPDATE and the in-memory test stores both
    /// route through this so the merge semantics live in one place.
    pub fn apply_info(&mut self, info: &MediaInfo) {
        if let Some(id) = &info.id {
            self.host_id = Some(id.clone());
        }
        if let Some(status) = info.status {
            self.status = status;
        }
        self.status_message = info.status_message.clone();
        self.url = info.url.clone();
        self.embed = info.embed.clone();
        self.thumbnail_url = info.thumbnail_url.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_host() -> ProviderHost {
        ProviderHost {
            id: Uuid::new_v4(),
            asset_id: Uuid::new_v4(),
            provider: ProviderKind::VidShare,
            host_id: None,
            status: HostStatus::Pending,
            status_message: None,
            job_id: Some(Uuid::new_v4()),
            url: None,
            embed: None,
            thumbnail_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn provider_kind_roundtrip() {
        assert_eq!(ProviderKind::MediaHub.to_string(), "mediahub");
        assert_eq!(
            "vidshare".parse::<ProviderKind>().unwrap(),
            ProviderKind::VidShare
        );
        assert!("dailymotion".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn host_status_roundtrip() {
        for status in ["pending", "ok", "error", "deleted"] {
            assert_eq!(status.parse::<HostStatus>().unwrap().to_string(), status);
        }
        assert!("done".parse::<HostStatus>().is_err());
    }

    #[test]
    fn pending_invariant_requires_job_without_host_id() {
        let mut host = pending_host();
        assert!(host.invariants_hold());

        host.host_id = Some("m123".to_string());
        assert!(!host.invariants_hold());

        host.host_id = None;
        host.job_id = None;
        assert!(!host.invariants_hold());
    }

    #[test]
    fn ok_invariant_requires_host_id_and_url() {
        let mut host = pending_host();
        host.status = HostStatus::Ok;
        assert!(!host.invariants_hold());

        host.host_id = Some("m123".to_string());
        host.url = Some("https://mediahub.tv/m123".to_string());
        assert!(host.invariants_hold());
    }

    #[test]
    fn requery_triggers_are_a_union() {
        let mut host = pending_host();
        host.status = HostStatus::Error;

        // error without a reason, url missing: selected
        assert!(host.needs_requery());

        // reason recorded but url still missing: still selected
        host.status_message = Some("remote rejected".to_string());
        assert!(host.needs_requery());

        // reason and url both present: resolved
        host.url = Some("https://vidshare.tv/v/abc".to_string());
        assert!(!host.needs_requery());

        // ok with a url: resolved
        host.status = HostStatus::Ok;
        host.status_message = None;
        assert!(!host.needs_requery());
    }

    #[test]
    fn apply_info_overwrites_from_query_result() {
        let mut host = pending_host();
        host.status = HostStatus::Error;

        let info = MediaInfo {
            id: Some("v9".to_string()),
            title: Some("t".to_string()),
            description: None,
            thumbnail_url: Some("https://img.vidshare.tv/v9.jpg".to_string()),
            tags: Some("a,b".to_string()),
            embed: Some("<iframe/>".to_string()),
            url: Some("https://vidshare.tv/v/v9".to_string()),
            status: Some(HostStatus::Ok),
            status_message: None,
        };

        host.apply_info(&info);
        assert_eq!(host.host_id.as_deref(), Some("v9"));
        assert_eq!(host.status, HostStatus::Ok);
        assert_eq!(host.url.as_deref(), Some("https://vidshare.tv/v/v9"));
        assert_eq!(host.embed.as_deref(), Some("<iframe/>"));
        assert!(host.invariants_hold());
    }

    #[test]
    fn apply_info_keeps_status_and_host_id_when_absent() {
        let mut host = pending_host();
        host.host_id = Some("m1".to_string());
        host.status = HostStatus::Error;

        host.apply_info(&MediaInfo::placeholder("m1"));
        assert_eq!(host.status, HostStatus::Error);
        assert_eq!(host.host_id.as_deref(), Some("m1"));
        assert!(host.url.is_none());
    }
}
