use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use super::host::ProviderKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Scheduled,
    Running,
    Completed,
    Failed,
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Scheduled => write!(f, "scheduled"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "scheduled" => Ok(JobStatus::Scheduled),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// Background execution record for one upload attempt.
///
/// Referenced (not owned) by a `ProviderHost` via `job_id`; the queue owns
/// its lifecycle. The reconciliation pass filters on `status = completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UploadJob {
    pub id: Uuid,
    pub status: JobStatus,
    pub payload: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub timeout_seconds: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UploadJob {
    pub fn is_ready_to_run(&self) -> bool {
        matches!(self.status, JobStatus::Pending | JobStatus::Scheduled)
            && self.scheduled_at <= Utc::now()
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Extract the payload as a typed struct, returning an error on failure.
    pub fn try_payload_as<P: for<'de> Deserialize<'de>>(&self) -> Result<P, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Typed payload carried by every upload job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UploadJobPayload {
    pub asset_id: Uuid,
    pub provider: ProviderKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: JobStatus, retry_count: i32) -> UploadJob {
        UploadJob {
            id: Uuid::new_v4(),
            status,
            payload: serde_json::json!({}),
            result: None,
            scheduled_at: Utc::now() - chrono::Duration::seconds(10),
            started_at: None,
            completed_at: None,
            retry_count,
            max_retries: 3,
            timeout_seconds: Some(3600),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn job_status_roundtrip() {
        for status in ["pending", "scheduled", "running", "completed", "failed"] {
            assert_eq!(status.parse::<JobStatus>().unwrap().to_string(), status);
        }
        assert!("cancelled".parse::<JobStatus>().is_err());
    }

    #[test]
    fn pending_and_scheduled_jobs_are_ready() {
        assert!(job(JobStatus::Pending, 0).is_ready_to_run());
        assert!(job(JobStatus::Scheduled, 0).is_ready_to_run());
        assert!(!job(JobStatus::Running, 0).is_ready_to_run());
        assert!(!job(JobStatus::Completed, 0).is_ready_to_run());
    }

    #[test]
    fn future_scheduled_job_is_not_ready() {
        let mut j = job(JobStatus::Scheduled, 0);
        j.scheduled_at = Utc::now() + chrono::Duration::seconds(3600);
        assert!(!j.is_ready_to_run());
    }

    #[test]
    fn retry_allowed_only_under_limit() {
        assert!(job(JobStatus::Failed, 2).can_retry());
        assert!(!job(JobStatus::Failed, 3).can_retry());
        assert!(!job(JobStatus::Failed, 5).can_retry());
    }

    #[test]
    fn typed_payload_roundtrip() {
        let payload = UploadJobPayload {
            asset_id: Uuid::new_v4(),
            provider: ProviderKind::MediaHub,
        };
        let mut j = job(JobStatus::Pending, 0);
        j.payload = serde_json::to_value(payload).unwrap();

        let decoded: UploadJobPayload = j.try_payload_as().unwrap();
        assert_eq!(decoded.asset_id, payload.asset_id);
        assert_eq!(decoded.provider, ProviderKind::MediaHub);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let j = job(JobStatus::Pending, 0);
        assert!(j.try_payload_as::<UploadJobPayload>().is_err());
    }
}
