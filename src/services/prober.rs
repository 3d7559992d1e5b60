//! Probe result types and the prober seam
//!
//! A [`Prober`] inspects one stored file and reports either structured
//! [`ProbeData`] or an opaque failure. Failures are expected for damaged or
//! unsupported media and never abort a run; an `Err` from [`Prober::probe`] means
//! the prober itself could not run and is fatal.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExtractResult;
use crate::services::file_store::StoredFile;

/// Structured metadata for one media file
///
/// Serialized as-is into the `metadata` column, so the field names double as the
/// stored JSON keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeData {
    /// Container format (e.g., "mov,mp4,m4a,3gp,3g2,mj2")
    pub format: String,

    /// Total duration in seconds
    pub duration: f64,

    /// Overall bitrate in bits per second
    pub bitrate: i64,

    /// File size in bytes
    pub size: i64,

    #[serde(rename = "totalvideostreams")]
    pub total_video_streams: i32,

    #[serde(rename = "totalaudiostreams")]
    pub total_audio_streams: i32,

    /// Video streams in container order
    #[serde(rename = "videostreams")]
    pub video_streams: Vec<VideoStreamInfo>,

    /// Audio streams in container order
    #[serde(rename = "audiostreams")]
    pub audio_streams: Vec<AudioStreamInfo>,
}

impl ProbeData {
    /// Width and height of the primary video stream, `(0, 0)` without one
    pub fn primary_dimensions(&self) -> (i32, i32) {
        if self.total_video_streams > 0 {
            self.video_streams
                .first()
                .map(|s| (s.width as i32, s.height as i32))
                .unwrap_or((0, 0))
        } else {
            (0, 0)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoStreamInfo {
    pub index: usize,
    pub codec: String,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "framerate")]
    pub frame_rate: Option<String>,
    pub bitrate: Option<i64>,
    #[serde(rename = "pixelformat")]
    pub pixel_format: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioStreamInfo {
    pub index: usize,
    pub codec: String,
    pub channels: u16,
    #[serde(rename = "channellayout")]
    pub channel_layout: Option<String>,
    #[serde(rename = "samplerate")]
    pub sample_rate: u32,
    pub bitrate: Option<i64>,
    pub language: Option<String>,
}

/// Outcome of probing a single file
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Success(ProbeData),
    Failure(String),
}

#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, file: &StoredFile) -> ExtractResult<ProbeOutcome>;
}
