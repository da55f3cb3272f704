pub mod asset;
pub mod host;
pub mod job;
