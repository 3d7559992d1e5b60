//! Metadata extraction job
//!
//! One invocation walks five stages in order:
//! 1. SELECT: pull up to `limit` files that still lack metadata
//! 2. EXTRACT: probe them and bulk-insert the results
//! 3. REPORT: emit counters and failed path hashes
//! 4. FIND_ORPHANS: find metadata rows whose file is gone
//! 5. CLEAN: delete those rows
//!
//! There is no retry inside a run. A fatal error stops the remaining stages and is
//! returned to the caller; the next scheduled run starts from whatever state the
//! database is in, which is safe because every stage is idempotent.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error};

use crate::db::{CandidateQuery, MetadataStore};
use crate::error::ExtractResult;
use crate::services::{ExtractionPipeline, FileStore, Prober, RunReporter, RunResult};

const JOB_NAME: &str = "extract_metadata";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Select,
    Extract,
    Report,
    FindOrphans,
    Clean,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Select => "select",
            RunStage::Extract => "extract",
            RunStage::Report => "report",
            RunStage::FindOrphans => "find_orphans",
            RunStage::Clean => "clean",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Candidates returned by selection, duplicates included
    pub selected: usize,
    pub result: RunResult,
    pub orphans_removed: usize,
}

pub struct ExtractMetadataJob {
    store: Arc<dyn MetadataStore>,
    pipeline: ExtractionPipeline,
    reporter: Arc<dyn RunReporter>,
    query: CandidateQuery,
}

impl ExtractMetadataJob {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        files: Arc<dyn FileStore>,
        prober: Arc<dyn Prober>,
        reporter: Arc<dyn RunReporter>,
        query: CandidateQuery,
    ) -> Self {
        let pipeline = ExtractionPipeline::new(files, prober, store.clone());
        Self {
            store,
            pipeline,
            reporter,
            query,
        }
    }

    /// Run one full reconciliation pass
    pub async fn execute(&self) -> ExtractResult<RunReport> {
        self.reporter.report("Processing media file metadata");

        let candidates = self
            .stage(RunStage::Select, self.store.select_candidates(&self.query))
            .await?;
        debug!(job = JOB_NAME, candidates = candidates.len(), limit = self.query.limit, "Selected candidates");

        let result = self
            .stage(RunStage::Extract, self.pipeline.process(&candidates))
            .await?;

        self.report(&result);

        self.reporter.report("Cleaning metadata table");
        let orphans = self
            .stage(RunStage::FindOrphans, self.store.find_orphans())
            .await?;

        if !orphans.is_empty() {
            self.reporter.report(&format!(
                "Count of metadata records to remove: {}",
                orphans.len()
            ));
            self.stage(RunStage::Clean, self.store.delete_metadata(&orphans))
                .await?;
        }

        Ok(RunReport {
            selected: candidates.len(),
            result,
            orphans_removed: orphans.len(),
        })
    }

    fn report(&self, result: &RunResult) {
        debug!(job = JOB_NAME, stage = %RunStage::Report, "Entering stage");
        self.reporter.report(&format!(
            "Number files successfully processed: {}",
            result.success_count
        ));
        self.reporter.report(&format!(
            "Number files with process failures: {}",
            result.fail_count
        ));
        for hash in &result.failed_hashes {
            self.reporter
                .report(&format!("Failed to process file with hash: {}", hash));
        }
    }

    async fn stage<T, F>(&self, stage: RunStage, work: F) -> ExtractResult<T>
    where
        F: Future<Output = ExtractResult<T>>,
    {
        debug!(job = JOB_NAME, stage = %stage, "Entering stage");
        work.await.inspect_err(|e| {
            error!(job = JOB_NAME, stage = %stage, error = %e, "Run aborted");
        })
    }
}
