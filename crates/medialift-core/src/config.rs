//! Configuration module
//!
//! Env-based configuration for the worker and both provider clients.
//! Provider credential blocks are optional here: a missing block simply
//! means that provider is not configured, and constructing its client
//! fails eagerly with a configuration error (never at first use).

use std::env;
use std::str::FromStr;

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_MAX_WORKERS: usize = 4;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_JOB_TIMEOUT_SECONDS: i32 = 3600;
const DEFAULT_MAX_RETRIES: i32 = 3;
const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 300;

const DEFAULT_MEDIAHUB_BASE_URL: &str = "https://api.mediahub.tv/v2";
const DEFAULT_VIDSHARE_BASE_URL: &str = "https://api.vidshare.tv/v1";

/// Upload queue and reconciliation cadence.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub max_workers: usize,
    pub poll_interval_ms: u64,
    pub default_timeout_seconds: i32,
    pub max_retries: i32,
    pub reconcile_interval_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            default_timeout_seconds: DEFAULT_JOB_TIMEOUT_SECONDS,
            max_retries: DEFAULT_MAX_RETRIES,
            reconcile_interval_secs: DEFAULT_RECONCILE_INTERVAL_SECS,
        }
    }
}

/// MediaHub (commercial media host) credentials.
#[derive(Clone, Debug)]
pub struct MediaHubConfig {
    pub username: String,
    pub password: String,
    pub base_url: String,
}

/// VidShare (video-sharing platform) credentials.
#[derive(Clone, Debug)]
pub struct VidShareConfig {
    pub email: String,
    pub password: String,
    pub developer_key: String,
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub environment: String,
    pub worker: WorkerConfig,
    pub mediahub: Option<MediaHubConfig>,
    pub vidshare: Option<VidShareConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let worker = WorkerConfig {
            max_workers: env_parse("UPLOAD_QUEUE_MAX_WORKERS", DEFAULT_MAX_WORKERS),
            poll_interval_ms: env_parse("UPLOAD_QUEUE_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS),
            default_timeout_seconds: env_parse(
                "UPLOAD_QUEUE_TIMEOUT_SECONDS",
                DEFAULT_JOB_TIMEOUT_SECONDS,
            ),
            max_retries: env_parse("UPLOAD_QUEUE_MAX_RETRIES", DEFAULT_MAX_RETRIES),
            reconcile_interval_secs: env_parse(
                "RECONCILE_INTERVAL_SECS",
                DEFAULT_RECONCILE_INTERVAL_SECS,
            ),
        };

        let mediahub = match (env_opt("MEDIAHUB_USERNAME"), env_opt("MEDIAHUB_PASSWORD")) {
            (Some(username), Some(password)) => Some(MediaHubConfig {
                username,
                password,
                base_url: env_opt("MEDIAHUB_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_MEDIAHUB_BASE_URL.to_string()),
            }),
            _ => None,
        };

        let vidshare = match (
            env_opt("VIDSHARE_EMAIL"),
            env_opt("VIDSHARE_PASSWORD"),
            env_opt("VIDSHARE_DEVELOPER_KEY"),
        ) {
            (Some(email), Some(password), Some(developer_key)) => Some(VidShareConfig {
                email,
                password,
                developer_key,
                base_url: env_opt("VIDSHARE_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_VIDSHARE_BASE_URL.to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            environment,
            worker,
            mediahub,
            vidshare,
        })
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

/// Parse an env var, falling back to `default` when absent or malformed.
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read an env var, treating blank values as absent.
fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_on_missing_or_malformed() {
        assert_eq!(env_parse("MEDIALIFT_TEST_UNSET_U64", 7u64), 7);

        env::set_var("MEDIALIFT_TEST_MALFORMED_U64", "not-a-number");
        assert_eq!(env_parse("MEDIALIFT_TEST_MALFORMED_U64", 7u64), 7);

        env::set_var("MEDIALIFT_TEST_VALID_U64", "42");
        assert_eq!(env_parse("MEDIALIFT_TEST_VALID_U64", 7u64), 42);
    }

    #[test]
    fn env_opt_treats_blank_as_absent() {
        assert_eq!(env_opt("MEDIALIFT_TEST_UNSET_OPT"), None);

        env::set_var("MEDIALIFT_TEST_BLANK_OPT", "   ");
        assert_eq!(env_opt("MEDIALIFT_TEST_BLANK_OPT"), None);

        env::set_var("MEDIALIFT_TEST_SET_OPT", "value");
        assert_eq!(env_opt("MEDIALIFT_TEST_SET_OPT"), Some("value".to_string()));
    }

    #[test]
    fn worker_defaults() {
        let worker = WorkerConfig::default();
        assert_eq!(worker.max_workers, 4);
        assert_eq!(worker.poll_interval_ms, 1000);
        assert_eq!(worker.max_retries, 3);
        assert_eq!(worker.reconcile_interval_secs, 300);
    }
}
