//! Application configuration management

use std::env;

use anyhow::{Context, Result};

/// Default number of files pulled from the file table per run
pub const DEFAULT_MAX_FILES: i64 = 5000;

/// Default cron expression (every 15 minutes, seconds field first)
pub const DEFAULT_SCHEDULE: &str = "0 */15 * * * *";

/// Component that owns files this job generates itself; never probed
pub const DEFAULT_EXCLUDED_COMPONENT: &str = "local_smartmedia";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (PostgreSQL)
    pub database_url: String,

    /// Maximum pool size
    pub database_max_connections: u32,

    /// Root of the content-addressed file store
    pub file_store_path: String,

    /// Path to the ffprobe executable
    pub ffprobe_path: String,

    /// Maximum candidates selected per run
    pub max_files: i64,

    /// Cron expression for the scheduler
    pub schedule: String,

    /// Run a single pass and exit instead of scheduling
    pub run_once: bool,

    /// Component excluded from candidate selection
    pub excluded_component: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is required")?;

        let max_files: i64 = lookup("EXTRACT_MAX_FILES")
            .unwrap_or_else(|| DEFAULT_MAX_FILES.to_string())
            .parse()
            .context("Invalid EXTRACT_MAX_FILES")?;
        if max_files <= 0 {
            anyhow::bail!("EXTRACT_MAX_FILES must be positive, got {}", max_files);
        }

        Ok(Self {
            database_url,

            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),

            file_store_path: lookup("FILE_STORE_PATH")
                .unwrap_or_else(|| "./data/filedir".to_string()),

            ffprobe_path: lookup("FFPROBE_PATH").unwrap_or_else(|| "ffprobe".to_string()),

            max_files,

            schedule: lookup("EXTRACT_SCHEDULE").unwrap_or_else(|| DEFAULT_SCHEDULE.to_string()),

            run_once: lookup("EXTRACT_RUN_ONCE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),

            excluded_component: lookup("EXCLUDED_COMPONENT")
                .unwrap_or_else(|| DEFAULT_EXCLUDED_COMPONENT.to_string()),
        })
    }
}
