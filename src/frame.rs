//! Frame and pixel buffer types
//!
//! A recording carries three tracks: color at stream index 0, depth at 1
//! and infrared at 2. Color decodes to 8-bit BGR, depth and IR to 16-bit
//! grayscale (depth values are millimeters).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The three tracks of a Kinect recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Color,
    Depth,
    Ir,
}

impl TrackKind {
    /// Human-readable track name
    pub fn label(&self) -> &'static str {
        match self {
            TrackKind::Color => "color",
            TrackKind::Depth => "depth",
            TrackKind::Ir => "ir",
        }
    }

    /// Stream index inside the MKV container
    pub fn stream_index(&self) -> usize {
        match self {
            TrackKind::Color => 0,
            TrackKind::Depth => 1,
            TrackKind::Ir => 2,
        }
    }

    /// Raw pixel format requested from FFmpeg for this track
    pub fn pix_fmt(&self) -> &'static str {
        match self {
            TrackKind::Color => "bgr24",
            TrackKind::Depth | TrackKind::Ir => "gray16le",
        }
    }

    /// Bytes per pixel in the raw pipe format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            TrackKind::Color => 3,
            TrackKind::Depth | TrackKind::Ir => 2,
        }
    }

    /// Sample bit depth
    pub fn bit_depth(&self) -> u8 {
        match self {
            TrackKind::Color => 8,
            TrackKind::Depth | TrackKind::Ir => 16,
        }
    }
}

/// Decoded sample data for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pixels {
    /// Packed 3-channel 8-bit, BGR byte order
    Bgr8(Vec<u8>),
    /// Single-channel 16-bit unsigned
    Gray16(Vec<u16>),
}

/// One decoded frame of a single track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: TrackKind,
    /// Time since the start of the recording
    pub timestamp: Duration,
    pub width: usize,
    pub height: usize,
    pub pixels: Pixels,
}

impl Frame {
    pub fn bit_depth(&self) -> u8 {
        self.kind.bit_depth()
    }
}

/// Synchronized per-track result of one dispatch call
///
/// A `None` slot means the track is disabled, already exhausted, or its
/// packet for this tick was malformed.
#[derive(Debug, Clone, Default)]
pub struct FrameSet {
    pub color: Option<Frame>,
    pub depth: Option<Frame>,
    pub ir: Option<Frame>,
}

impl FrameSet {
    /// True when no track produced a frame this tick
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.depth.is_none() && self.ir.is_none()
    }

    pub fn get(&self, kind: TrackKind) -> Option<&Frame> {
        match kind {
            TrackKind::Color => self.color.as_ref(),
            TrackKind::Depth => self.depth.as_ref(),
            TrackKind::Ir => self.ir.as_ref(),
        }
    }
}

/// Packed 8-bit BGR image used for display and encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgrImage {
    pub width: usize,
    pub height: usize,
    /// `width * height * 3` bytes, row-major, BGR order
    pub data: Vec<u8>,
}

impl BgrImage {
    /// All-black image of the given size
    pub fn black(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 3],
        }
    }

    pub fn from_bgr(width: usize, height: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width * height * 3);
        Self {
            width,
            height,
            data,
        }
    }

    /// Expand single-channel 8-bit samples to BGR by channel replication
    pub fn from_gray(width: usize, height: usize, gray: &[u8]) -> Self {
        debug_assert_eq!(gray.len(), width * height);
        let mut data = Vec::with_capacity(gray.len() * 3);
        for &v in gray {
            data.extend_from_slice(&[v, v, v]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Copy `src` into this image with its top-left corner at `(x, y)`
    ///
    /// The source must fit entirely inside this image.
    pub fn blit(&mut self, src: &BgrImage, x: usize, y: usize) {
        debug_assert!(x + src.width <= self.width && y + src.height <= self.height);
        for row in 0..src.height {
            let dst_start = ((y + row) * self.width + x) * 3;
            let src_start = row * src.width * 3;
            let len = src.width * 3;
            self.data[dst_start..dst_start + len]
                .copy_from_slice(&src.data[src_start..src_start + len]);
        }
    }
}
