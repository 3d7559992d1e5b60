//! ffprobe-backed prober
//!
//! Runs the ffprobe command line against a stored file and converts its JSON
//! output into [`ProbeData`].

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{ExtractError, ExtractResult};
use crate::services::file_store::StoredFile;
use crate::services::prober::{AudioStreamInfo, ProbeData, ProbeOutcome, Prober, VideoStreamInfo};

/// FFprobe JSON output structures
mod raw {
    use super::*;

    #[derive(Debug, Deserialize)]
    pub struct FfprobeOutput {
        pub format: Option<Format>,
        pub streams: Option<Vec<Stream>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Format {
        pub format_name: Option<String>,
        pub duration: Option<String>,
        pub size: Option<String>,
        pub bit_rate: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Stream {
        pub index: usize,
        pub codec_name: Option<String>,
        pub codec_type: Option<String>,

        // Video specific
        pub width: Option<u32>,
        pub height: Option<u32>,
        pub coded_width: Option<u32>,
        pub coded_height: Option<u32>,
        pub pix_fmt: Option<String>,
        pub r_frame_rate: Option<String>,

        // Audio specific
        pub channels: Option<u16>,
        pub channel_layout: Option<String>,
        pub sample_rate: Option<String>,

        // Common
        pub bit_rate: Option<String>,
        pub disposition: Option<Disposition>,
        pub tags: Option<HashMap<String, String>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Disposition {
        pub attached_pic: Option<i32>,
    }
}

/// Media prober using the ffprobe executable
pub struct FfprobeService {
    /// Path to ffprobe executable
    ffprobe_path: String,
}

impl FfprobeService {
    pub fn with_ffprobe_path(ffprobe_path: String) -> Self {
        Self { ffprobe_path }
    }

    /// Run `ffprobe -version`, returning its first output line
    ///
    /// Fails with [`ExtractError::ProberUnavailable`] when the binary cannot be
    /// started or reports an error.
    pub async fn ensure_available(&self) -> ExtractResult<String> {
        let output = Command::new(&self.ffprobe_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ExtractError::ProberUnavailable(format!("{}: {}", self.ffprobe_path, e)))?;

        if !output.status.success() {
            return Err(ExtractError::ProberUnavailable(format!(
                "{} -version exited with {}",
                self.ffprobe_path, output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    /// Run ffprobe against a path and classify the result
    pub async fn analyze(&self, path: &Path) -> ExtractResult<ProbeOutcome> {
        debug!(path = %path.display(), "Probing media file with ffprobe");

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error"])
            .args(["-print_format", "json"])
            .args(["-show_format", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                ExtractError::ProberUnavailable(format!(
                    "failed to execute {}: {}",
                    self.ffprobe_path, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let reason = format!(
                "ffprobe exited with code {}: {}",
                exit_code,
                if stderr.trim().is_empty() {
                    "no error output"
                } else {
                    stderr.trim()
                }
            );
            warn!(path = %path.display(), reason = %reason, "ffprobe failed");
            return Ok(ProbeOutcome::Failure(reason));
        }

        let outcome = match parse_output(&output.stdout) {
            Ok(data) => {
                info!(
                    path = %path.display(),
                    video_streams = data.total_video_streams,
                    audio_streams = data.total_audio_streams,
                    duration = data.duration,
                    "Media probe complete"
                );
                ProbeOutcome::Success(data)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable ffprobe output");
                ProbeOutcome::Failure(format!("Failed to parse ffprobe JSON output: {}", e))
            }
        };

        Ok(outcome)
    }
}

#[async_trait]
impl Prober for FfprobeService {
    async fn probe(&self, file: &StoredFile) -> ExtractResult<ProbeOutcome> {
        self.analyze(&file.path).await
    }
}

/// Convert raw ffprobe JSON into [`ProbeData`]
pub fn parse_output(stdout: &[u8]) -> Result<ProbeData, serde_json::Error> {
    let probe: raw::FfprobeOutput = serde_json::from_slice(stdout)?;
    Ok(convert_probe_output(probe))
}

fn convert_probe_output(probe: raw::FfprobeOutput) -> ProbeData {
    let format = probe.format.unwrap_or(raw::Format {
        format_name: None,
        duration: None,
        size: None,
        bit_rate: None,
    });

    let container_format = format.format_name.unwrap_or_default();
    let duration = format
        .duration
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);
    let bitrate = format
        .bit_rate
        .and_then(|b| b.parse::<i64>().ok())
        .unwrap_or(0);
    let size = format
        .size
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0);

    let mut video_streams = Vec::new();
    let mut audio_streams = Vec::new();

    for stream in probe.streams.unwrap_or_default() {
        match stream.codec_type.as_deref().unwrap_or("") {
            "video" => {
                if let Some(video) = convert_video_stream(&stream) {
                    video_streams.push(video);
                }
            }
            "audio" => {
                if let Some(audio) = convert_audio_stream(&stream) {
                    audio_streams.push(audio);
                }
            }
            _ => {}
        }
    }

    ProbeData {
        format: container_format,
        duration,
        bitrate,
        size,
        total_video_streams: video_streams.len() as i32,
        total_audio_streams: audio_streams.len() as i32,
        video_streams,
        audio_streams,
    }
}

fn convert_video_stream(stream: &raw::Stream) -> Option<VideoStreamInfo> {
    // Cover art embedded in audio containers is reported as a video stream
    let attached_pic = stream
        .disposition
        .as_ref()
        .and_then(|d| d.attached_pic)
        .unwrap_or(0)
        == 1;
    if attached_pic {
        return None;
    }

    let width = stream.width.or(stream.coded_width)?;
    let height = stream.height.or(stream.coded_height)?;
    if width == 0 || height == 0 {
        return None;
    }

    Some(VideoStreamInfo {
        index: stream.index,
        codec: stream.codec_name.clone().unwrap_or_default(),
        width,
        height,
        frame_rate: stream.r_frame_rate.clone(),
        bitrate: stream.bit_rate.as_ref().and_then(|b| b.parse::<i64>().ok()),
        pixel_format: stream.pix_fmt.clone(),
        language: stream.tags.as_ref().and_then(|t| t.get("language").cloned()),
    })
}

fn convert_audio_stream(stream: &raw::Stream) -> Option<AudioStreamInfo> {
    let channels = stream.channels.unwrap_or(0);
    if channels == 0 {
        return None;
    }

    Some(AudioStreamInfo {
        index: stream.index,
        codec: stream.codec_name.clone().unwrap_or_default(),
        channels,
        channel_layout: stream.channel_layout.clone(),
        sample_rate: stream
            .sample_rate
            .as_ref()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0),
        bitrate: stream.bit_rate.as_ref().and_then(|b| b.parse::<i64>().ok()),
        language: stream.tags.as_ref().and_then(|t| t.get("language").cloned()),
    })
}
