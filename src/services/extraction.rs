//! Metadata extraction pipeline
//!
//! Probes each candidate once per distinct content hash, collects successful
//! results, and writes them with a single bulk insert after the loop. A probe
//! failure only marks that file as failed; resolution, prober and storage errors
//! abort the whole batch before anything is inserted.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::db::{CandidateRef, MetadataRecord, MetadataStore};
use crate::error::ExtractResult;
use crate::services::file_store::{FileStore, StoredFile};
use crate::services::prober::{ProbeData, ProbeOutcome, Prober};

/// Outcome counters for one pass over the candidates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    pub success_count: usize,
    pub fail_count: usize,
    /// Path hashes of files whose probe failed, in processing order
    pub failed_hashes: Vec<String>,
}

pub struct ExtractionPipeline {
    files: Arc<dyn FileStore>,
    prober: Arc<dyn Prober>,
    store: Arc<dyn MetadataStore>,
}

impl ExtractionPipeline {
    pub fn new(
        files: Arc<dyn FileStore>,
        prober: Arc<dyn Prober>,
        store: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            files,
            prober,
            store,
        }
    }

    /// Extract and store metadata for `candidates`, in order
    pub async fn process(&self, candidates: &[CandidateRef]) -> ExtractResult<RunResult> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(candidates.len());
        let mut pending: Vec<MetadataRecord> = Vec::new();
        let mut result = RunResult::default();

        for candidate in candidates {
            // The same bytes can sit behind many path hashes; probe them once
            if !seen.insert(candidate.content_hash.as_str()) {
                debug!(
                    content_hash = %candidate.content_hash,
                    path_hash = %candidate.path_hash,
                    "Skipping duplicate content hash"
                );
                continue;
            }

            let file = self.files.get_by_path_hash(&candidate.path_hash).await?;

            match self.prober.probe(&file).await? {
                ProbeOutcome::Success(data) => {
                    pending.push(build_record(candidate, &file, &data)?);
                    result.success_count += 1;
                }
                ProbeOutcome::Failure(reason) => {
                    warn!(
                        path_hash = %candidate.path_hash,
                        content_hash = %candidate.content_hash,
                        reason = %reason,
                        "Metadata extraction failed"
                    );
                    result.fail_count += 1;
                    result.failed_hashes.push(candidate.path_hash.clone());
                }
            }
        }

        if !pending.is_empty() {
            self.store.insert_metadata(&pending).await?;
            info!(records = pending.len(), "Stored media metadata");
        }

        Ok(result)
    }
}

/// Map a successful probe onto a metadata row
pub fn build_record(
    candidate: &CandidateRef,
    file: &StoredFile,
    data: &ProbeData,
) -> ExtractResult<MetadataRecord> {
    let (width, height) = data.primary_dimensions();

    Ok(MetadataRecord {
        content_hash: file.content_hash.clone(),
        path_hash: file.path_hash.clone(),
        duration: data.duration,
        bitrate: data.bitrate,
        size: data.size,
        video_streams: data.total_video_streams,
        audio_streams: data.total_audio_streams,
        width,
        height,
        metadata: serde_json::to_string(data)?,
        time_created: candidate.time_created,
    })
}
