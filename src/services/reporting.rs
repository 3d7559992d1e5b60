//! Run reporting sink

use tracing::info;

/// Line-oriented progress and summary output for a run; never fails
pub trait RunReporter: Send + Sync {
    fn report(&self, line: &str);
}

/// Writes report lines as tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl RunReporter for TracingReporter {
    fn report(&self, line: &str) {
        info!(job = "extract_metadata", "{}", line);
    }
}
