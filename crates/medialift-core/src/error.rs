//! Error types module
//!
//! Core error type used by the repositories and the worker. Provider-side
//! failures (configuration, authentication, upload, remote not-found) have
//! their own taxonomy next to the `ProviderClient` trait; `AppError` covers
//! everything that happens on our side of the wire.

use std::io;

use sqlx::Error as SqlxError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl AppError {
    /// Get the error type name for detailed error reporting
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::NotFound(_) => "NotFound",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Get detailed error information including the source chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_error_from_sqlx() {
        let err = AppError::from(sqlx::Error::PoolClosed);
        assert_eq!(err.error_type(), "Database");
        assert!(err.to_string().starts_with("Database error"));
    }

    #[test]
    fn not_found_message_preserved() {
        let err = AppError::NotFound("host 42".to_string());
        assert_eq!(err.error_type(), "NotFound");
        assert_eq!(err.to_string(), "Not found: host 42");
    }

    #[test]
    fn json_error_maps_to_invalid_input() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = AppError::from(json_err);
        assert_eq!(err.error_type(), "InvalidInput");
    }

    #[test]
    fn detailed_message_includes_source() {
        let err = AppError::Database(sqlx::Error::PoolClosed);
        let details = err.detailed_message();
        assert!(details.contains("Database error"));
    }
}
