//! Mediameta - media file metadata extraction service
//!
//! Runs the extraction job on a cron schedule, or once when `EXTRACT_RUN_ONCE` is set.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediameta::config::Config;
use mediameta::db::{CandidateQuery, Database};
use mediameta::jobs::{self, ExtractMetadataJob};
use mediameta::services::{FfprobeService, LocalFileStore, TracingReporter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediameta=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("Starting mediameta");

    let config = Config::from_env()?;
    tracing::info!(
        file_store = %config.file_store_path,
        max_files = config.max_files,
        "Configuration loaded"
    );

    let db = Database::connect(&config.database_url, config.database_max_connections).await?;
    db.ensure_schema().await?;
    tracing::info!("Database connected");

    let prober = FfprobeService::with_ffprobe_path(config.ffprobe_path.clone());
    let version = prober.ensure_available().await?;
    tracing::info!(version = %version, "ffprobe available");

    let job = Arc::new(ExtractMetadataJob::new(
        Arc::new(db.clone()),
        Arc::new(LocalFileStore::new(&config.file_store_path, db.files())),
        Arc::new(prober),
        Arc::new(TracingReporter),
        CandidateQuery::new(&config.excluded_component, config.max_files),
    ));

    if config.run_once {
        let report = job.execute().await?;
        tracing::info!(
            selected = report.selected,
            succeeded = report.result.success_count,
            failed = report.result.fail_count,
            orphans_removed = report.orphans_removed,
            "Metadata extraction completed"
        );
        return Ok(());
    }

    let mut scheduler = jobs::start_scheduler(job, &config.schedule).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    scheduler.shutdown().await?;

    Ok(())
}
