//! Extraction services and external tool integrations

pub mod extraction;
pub mod ffprobe;
pub mod file_store;
pub mod mime_types;
pub mod prober;
pub mod reporting;

pub use extraction::{ExtractionPipeline, RunResult, build_record};
pub use ffprobe::FfprobeService;
pub use file_store::{FileStore, LocalFileStore, StoredFile};
pub use mime_types::{MimeListFormat, MimeTypes, supported_mime_types};
pub use prober::{AudioStreamInfo, ProbeData, ProbeOutcome, Prober, VideoStreamInfo};
pub use reporting::{RunReporter, TracingReporter};
