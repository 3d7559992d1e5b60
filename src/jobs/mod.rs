//! Background job scheduling

pub mod extract_metadata;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

pub use extract_metadata::{ExtractMetadataJob, RunReport, RunStage};

/// Initialize and start the job scheduler
///
/// A tick that fires while the previous run is still going is skipped.
pub async fn start_scheduler(
    job: Arc<ExtractMetadataJob>,
    schedule: &str,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    let running = Arc::new(AtomicBool::new(false));

    let extract_job = Job::new_async(schedule, move |_uuid, _l| {
        let job = job.clone();
        let running = running.clone();
        Box::pin(async move {
            let Some(_guard) = RunGuard::acquire(&running) else {
                warn!(job = "extract_metadata", "Previous run still active, skipping");
                return;
            };

            info!(job = "extract_metadata", "Running metadata extraction");
            match job.execute().await {
                Ok(report) => info!(
                    job = "extract_metadata",
                    selected = report.selected,
                    succeeded = report.result.success_count,
                    failed = report.result.fail_count,
                    orphans_removed = report.orphans_removed,
                    "Metadata extraction completed"
                ),
                Err(e) => error!(job = "extract_metadata", error = %e, "Metadata extraction failed"),
            }
        })
    })?;
    scheduler.add(extract_job).await?;

    scheduler.start().await?;

    info!(schedule = %schedule, "Job scheduler started");
    Ok(scheduler)
}

/// Holds the running flag for one tick; clears it on drop, unwinding included
struct RunGuard(Arc<AtomicBool>);

impl RunGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        if flag.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(Self(flag.clone()))
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
