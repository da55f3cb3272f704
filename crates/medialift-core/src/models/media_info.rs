use serde::{Deserialize, Serialize};

use super::host::HostStatus;

/// Snapshot of a remote media record as reported by a provider.
///
/// Returned by both `upload` and `get_info`. Every field is nullable: the
/// abstract provider contract hands back an all-null record carrying only
/// the echoed id, and concrete providers populate what they know. `tags`
/// is the provider's comma-joined form, not the local tag list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub tags: Option<String>,
    pub embed: Option<String>,
    pub url: Option<String>,
    pub status: Option<HostStatus>,
    pub status_message: Option<String>,
}

impl MediaInfo {
    /// All-null record carrying only the queried id.
    pub fn placeholder(media_id: &str) -> Self {
        Self {
            id: Some(media_id.to_string()),
            ..Self::default()
        }
    }

    /// Placeholder with a terminal status, for lookups that failed remotely.
    pub fn with_status(media_id: &str, status: HostStatus, message: Option<String>) -> Self {
        Self {
            status: Some(status),
            status_message: message,
            ..Self::placeholder(media_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_carries_only_the_id() {
        let info = MediaInfo::placeholder("m42");
        assert_eq!(info.id.as_deref(), Some("m42"));
        assert!(info.status.is_none());
        assert!(info.url.is_none());
        assert!(info.embed.is_none());
    }

    #[test]
    fn with_status_sets_terminal_state() {
        let info = MediaInfo::with_status("m42", HostStatus::Deleted, None);
        assert_eq!(info.status, Some(HostStatus::Deleted));
        assert!(info.status_message.is_none());

        let info = MediaInfo::with_status("m42", HostStatus::Error, Some("boom".to_string()));
        assert_eq!(info.status, Some(HostStatus::Error));
        assert_eq!(info.status_message.as_deref(), Some("boom"));
    }
}
