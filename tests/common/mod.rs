//! In-memory collaborators for driving extraction runs without PostgreSQL or ffprobe

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mediameta::db::{CandidateQuery, CandidateRef, MetadataRecord, MetadataStore};
use mediameta::jobs::ExtractMetadataJob;
use mediameta::services::{
    FileStore, ProbeData, ProbeOutcome, Prober, RunReporter, StoredFile, VideoStreamInfo,
};
use mediameta::{ExtractError, ExtractResult};

// ============================================================================
// File table rows
// ============================================================================

#[derive(Debug, Clone)]
pub struct FileRow {
    pub content_hash: String,
    pub path_hash: String,
    pub component: String,
    pub filearea: String,
    pub filename: String,
    pub mime_type: Option<String>,
    pub time_created: i64,
}

impl FileRow {
    /// A plain course video
    pub fn video(content_hash: &str, path_hash: &str) -> Self {
        Self {
            content_hash: content_hash.to_string(),
            path_hash: path_hash.to_string(),
            component: "mod_resource".to_string(),
            filearea: "content".to_string(),
            filename: format!("{}.mp4", path_hash),
            mime_type: Some("video/mp4".to_string()),
            time_created: 1_700_000_000,
        }
    }

    pub fn with_mime(mut self, mime: &str) -> Self {
        self.mime_type = Some(mime.to_string());
        self
    }

    pub fn with_component(mut self, component: &str) -> Self {
        self.component = component.to_string();
        self
    }

    pub fn with_filearea(mut self, filearea: &str) -> Self {
        self.filearea = filearea.to_string();
        self
    }

    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = filename.to_string();
        self
    }

    pub fn created_at(mut self, time_created: i64) -> Self {
        self.time_created = time_created;
        self
    }
}

// ============================================================================
// Store
// ============================================================================

/// Files and metadata tables in memory, with the same filtering the SQL applies
#[derive(Default)]
pub struct InMemoryStore {
    files: Mutex<Vec<FileRow>>,
    metadata: Mutex<Vec<MetadataRecord>>,
    insert_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_insert: AtomicBool,
    fail_find_orphans: AtomicBool,
    fail_delete: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, row: FileRow) {
        self.files.lock().unwrap().push(row);
    }

    pub fn remove_file(&self, path_hash: &str) {
        self.files
            .lock()
            .unwrap()
            .retain(|f| f.path_hash != path_hash);
    }

    /// Seed a metadata row directly, as if written by an earlier run
    pub fn add_metadata(&self, content_hash: &str, path_hash: &str) {
        self.metadata.lock().unwrap().push(MetadataRecord {
            content_hash: content_hash.to_string(),
            path_hash: path_hash.to_string(),
            duration: 1.0,
            bitrate: 0,
            size: 0,
            video_streams: 0,
            audio_streams: 1,
            width: 0,
            height: 0,
            metadata: "{}".to_string(),
            time_created: 1_600_000_000,
        });
    }

    pub fn metadata(&self) -> Vec<MetadataRecord> {
        self.metadata.lock().unwrap().clone()
    }

    pub fn metadata_hashes(&self) -> HashSet<String> {
        self.metadata
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.content_hash.clone())
            .collect()
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn fail_insert(&self) {
        self.fail_insert.store(true, Ordering::SeqCst);
    }

    pub fn fail_find_orphans(&self) {
        self.fail_find_orphans.store(true, Ordering::SeqCst);
    }

    pub fn fail_delete(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }
}

fn storage_error() -> ExtractError {
    ExtractError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl MetadataStore for InMemoryStore {
    async fn select_candidates(&self, query: &CandidateQuery) -> ExtractResult<Vec<CandidateRef>> {
        let known = self.metadata_hashes();
        let files = self.files.lock().unwrap();

        Ok(files
            .iter()
            .filter(|f| {
                f.mime_type
                    .as_ref()
                    .is_some_and(|m| query.mime_types.iter().any(|q| q == m))
            })
            .filter(|f| f.component != query.excluded_component)
            .filter(|f| f.filearea != query.excluded_filearea)
            .filter(|f| f.filename != query.excluded_filename)
            .filter(|f| !known.contains(&f.content_hash))
            .take(query.limit as usize)
            .map(|f| CandidateRef {
                content_hash: f.content_hash.clone(),
                path_hash: f.path_hash.clone(),
                time_created: f.time_created,
            })
            .collect())
    }

    async fn insert_metadata(&self, records: &[MetadataRecord]) -> ExtractResult<()> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(storage_error());
        }

        let mut metadata = self.metadata.lock().unwrap();
        let mut existing: HashSet<String> =
            metadata.iter().map(|r| r.content_hash.clone()).collect();
        for record in records {
            // Unique index on content hash; the whole batch is rejected
            if !existing.insert(record.content_hash.clone()) {
                return Err(storage_error());
            }
        }
        metadata.extend_from_slice(records);
        Ok(())
    }

    async fn find_orphans(&self) -> ExtractResult<HashSet<String>> {
        if self.fail_find_orphans.load(Ordering::SeqCst) {
            return Err(storage_error());
        }

        let present: HashSet<String> = self
            .files
            .lock()
            .unwrap()
            .iter()
            .map(|f| f.content_hash.clone())
            .collect();

        Ok(self
            .metadata_hashes()
            .into_iter()
            .filter(|h| !present.contains(h))
            .collect())
    }

    async fn delete_metadata(&self, content_hashes: &HashSet<String>) -> ExtractResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(storage_error());
        }

        self.metadata
            .lock()
            .unwrap()
            .retain(|r| !content_hashes.contains(&r.content_hash));
        Ok(())
    }
}

#[async_trait]
impl FileStore for InMemoryStore {
    async fn get_by_path_hash(&self, path_hash: &str) -> ExtractResult<StoredFile> {
        let files = self.files.lock().unwrap();
        let row = files
            .iter()
            .find(|f| f.path_hash == path_hash)
            .ok_or_else(|| ExtractError::resolution(path_hash, "no file record"))?;

        Ok(StoredFile {
            content_hash: row.content_hash.clone(),
            path_hash: row.path_hash.clone(),
            filename: row.filename.clone(),
            mime_type: row.mime_type.clone(),
            path: PathBuf::from("/filedir").join(&row.content_hash),
        })
    }
}

// ============================================================================
// Prober
// ============================================================================

/// Returns a scripted outcome per content hash, 720p video otherwise
#[derive(Default)]
pub struct ScriptedProber {
    outcomes: Mutex<HashMap<String, ProbeOutcome>>,
    probed: Mutex<Vec<String>>,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, content_hash: &str, outcome: ProbeOutcome) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(content_hash.to_string(), outcome);
    }

    pub fn fail(&self, content_hash: &str) {
        self.script(
            content_hash,
            ProbeOutcome::Failure("Invalid data found when processing input".to_string()),
        );
    }

    /// Content hashes probed so far, in order
    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

pub fn video_720p() -> ProbeData {
    ProbeData {
        format: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
        duration: 12.0,
        bitrate: 2_000_000,
        size: 3_000_000,
        total_video_streams: 1,
        total_audio_streams: 1,
        video_streams: vec![VideoStreamInfo {
            codec: "h264".to_string(),
            width: 1280,
            height: 720,
            ..Default::default()
        }],
        audio_streams: Vec::new(),
    }
}

pub fn audio_only() -> ProbeData {
    ProbeData {
        format: "mp3".to_string(),
        duration: 200.0,
        bitrate: 128_000,
        size: 3_200_000,
        total_video_streams: 0,
        total_audio_streams: 1,
        ..Default::default()
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, file: &StoredFile) -> ExtractResult<ProbeOutcome> {
        self.probed.lock().unwrap().push(file.content_hash.clone());
        Ok(self
            .outcomes
            .lock()
            .unwrap()
            .get(&file.content_hash)
            .cloned()
            .unwrap_or_else(|| ProbeOutcome::Success(video_720p())))
    }
}

// ============================================================================
// Reporter
// ============================================================================

#[derive(Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl RunReporter for RecordingReporter {
    fn report(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

// ============================================================================
// Wiring
// ============================================================================

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub prober: Arc<ScriptedProber>,
    pub reporter: Arc<RecordingReporter>,
    pub job: ExtractMetadataJob,
}

pub fn harness(limit: i64) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let prober = Arc::new(ScriptedProber::new());
    let reporter = Arc::new(RecordingReporter::default());

    let job = ExtractMetadataJob::new(
        store.clone(),
        store.clone(),
        prober.clone(),
        reporter.clone(),
        CandidateQuery::new("local_smartmedia", limit),
    );

    Harness {
        store,
        prober,
        reporter,
        job,
    }
}
