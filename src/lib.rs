//! Media metadata extraction
//!
//! Periodically reconciles the file store against the `media_metadata` table:
//! probes media files that have no metadata yet and removes metadata rows whose
//! files are gone.

pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod services;

pub use error::{ExtractError, ExtractResult};
