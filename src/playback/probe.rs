//! Session metadata via ffprobe
//!
//! A Kinect MKV recording carries three video streams: color (0),
//! depth (1) and IR (2). ffprobe's JSON output gives per-stream
//! dimensions, the frame rate and the container duration.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use serde::Deserialize;

use crate::error::PlayerError;
use crate::frame::TrackKind;

/// Dimensions of one track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackInfo {
    pub width: usize,
    pub height: usize,
}

impl TrackInfo {
    /// Size in bytes of one raw frame of this track
    pub fn frame_bytes(&self, kind: TrackKind) -> usize {
        self.width * self.height * kind.bytes_per_pixel()
    }
}

/// Metadata of an opened recording
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub path: PathBuf,
    /// Frame rate of the color track, shared by all tracks
    pub frame_rate: f64,
    pub color: TrackInfo,
    pub depth: TrackInfo,
    pub ir: TrackInfo,
    pub duration: Option<Duration>,
}

impl SessionInfo {
    pub fn track(&self, kind: TrackKind) -> &TrackInfo {
        match kind {
            TrackKind::Color => &self.color,
            TrackKind::Depth => &self.depth,
            TrackKind::Ir => &self.ir,
        }
    }

    /// Recording timestamp of the given frame index
    pub fn frame_timestamp(&self, frame_index: u64) -> Duration {
        Duration::from_secs_f64(frame_index as f64 / self.frame_rate)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<usize>,
    height: Option<usize>,
    r_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Verify that FFmpeg is installed and on the path
pub fn check_ffmpeg() -> Result<(), PlayerError> {
    let status = Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| {
            PlayerError::Ffmpeg(format!(
                "unable to find ffmpeg in the path ({}); install FFmpeg and add it to the path",
                e
            ))
        })?;

    if !status.success() {
        return Err(PlayerError::Ffmpeg(format!(
            "ffmpeg -version exited with {}",
            status
        )));
    }
    Ok(())
}

/// Probe a recording and extract track metadata
///
/// Fatal on any failure: missing file, wrong container type, ffprobe
/// errors, or fewer than three streams.
pub fn probe_session(path: &Path) -> Result<SessionInfo, PlayerError> {
    if !path.exists() {
        return Err(PlayerError::InvalidRecording(format!(
            "unable to find video file: {}",
            path.display()
        )));
    }
    if path.extension().map(|e| e != "mkv").unwrap_or(true) {
        return Err(PlayerError::InvalidRecording(format!(
            "video file must be an mkv file: {}",
            path.display()
        )));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_streams",
            "-show_format",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| PlayerError::Probe(format!("failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PlayerError::Probe(format!(
            "ffprobe failed for {}: {}",
            path.display(),
            stderr.trim()
        )));
    }

    let probe: ProbeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|e| PlayerError::Probe(format!("unexpected ffprobe output: {}", e)))?;

    session_from_probe(path, probe)
}

fn session_from_probe(path: &Path, probe: ProbeOutput) -> Result<SessionInfo, PlayerError> {
    if probe.streams.len() < 3 {
        return Err(PlayerError::InvalidRecording(format!(
            "video file must contain at least 3 streams, found {}: {}",
            probe.streams.len(),
            path.display()
        )));
    }

    let track = |index: usize| -> Result<TrackInfo, PlayerError> {
        let stream = &probe.streams[index];
        match (stream.width, stream.height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => {
                Ok(TrackInfo { width, height })
            }
            _ => Err(PlayerError::Probe(format!(
                "stream {} has no valid dimensions",
                index
            ))),
        }
    };

    let frame_rate = probe.streams[0]
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .ok_or_else(|| PlayerError::Probe("stream 0 has no valid frame rate".to_string()))?;

    let duration = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|secs| *secs >= 0.0)
        .map(Duration::from_secs_f64);

    Ok(SessionInfo {
        path: path.to_path_buf(),
        frame_rate,
        color: track(TrackKind::Color.stream_index())?,
        depth: track(TrackKind::Depth.stream_index())?,
        ir: track(TrackKind::Ir.stream_index())?,
        duration,
    })
}

/// Parse ffprobe's rational frame rate, e.g. "30/1" or "30000/1001"
fn parse_frame_rate(raw: &str) -> Option<f64> {
    let (num, den) = match raw.split_once('/') {
        Some((num, den)) => (num.parse::<f64>().ok()?, den.parse::<f64>().ok()?),
        None => (raw.parse::<f64>().ok()?, 1.0),
    };
    if den == 0.0 || num <= 0.0 {
        return None;
    }
    Some(num / den)
}
