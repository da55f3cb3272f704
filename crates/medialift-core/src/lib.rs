//! Medialift Core
//!
//! Domain types, error types, and configuration shared by every Medialift
//! crate: media assets, provider host records, upload jobs, and the
//! `MediaInfo` record exchanged with remote hosting providers.

pub mod config;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::AppError;
