//! Run parameters
//!
//! `PlayerOptions` carries everything the CLI (or an embedding program)
//! can configure about a playback run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::frame::TrackKind;

/// Configuration for one playback run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerOptions {
    /// Pace dispatch to the recorded timestamps; off means drain as fast
    /// as possible (batch re-encoding)
    pub realtime_wait: bool,
    /// Decode and show the color stream
    pub rgb: bool,
    /// Decode and show the depth stream
    pub depth: bool,
    /// Decode and show the IR stream
    pub ir: bool,
    /// Depth value mapped to black (None = per-frame minimum)
    pub depth_min: Option<u16>,
    /// Depth value mapped to white (None = per-frame maximum)
    pub depth_max: Option<u16>,
    /// IR value mapped to black (None = per-frame minimum)
    pub ir_min: Option<u16>,
    /// IR value mapped to white (None = per-frame maximum)
    pub ir_max: Option<u16>,
    /// Re-encode the composed view into this file
    pub save_video: Option<PathBuf>,
    /// x264 preset used when `save_video` is set
    pub encoding_preset: String,
    /// One window per stream instead of the combined view
    pub separate_windows: bool,
    /// Open display windows at all; off for headless re-encoding
    pub display: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            realtime_wait: true,
            rgb: true,
            depth: true,
            ir: true,
            depth_min: None,
            depth_max: None,
            ir_min: None,
            ir_max: None,
            save_video: None,
            encoding_preset: "medium".to_string(),
            separate_windows: false,
            display: true,
        }
    }
}

impl PlayerOptions {
    pub fn selection(&self) -> TrackSelection {
        TrackSelection {
            rgb: self.rgb,
            depth: self.depth,
            ir: self.ir,
        }
    }

    /// Explicit normalization bounds for a 16-bit track, if configured
    pub fn bounds(&self, kind: TrackKind) -> (Option<u16>, Option<u16>) {
        match kind {
            TrackKind::Depth => (self.depth_min, self.depth_max),
            TrackKind::Ir => (self.ir_min, self.ir_max),
            TrackKind::Color => (None, None),
        }
    }
}

/// Which tracks a run decodes, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSelection {
    pub rgb: bool,
    pub depth: bool,
    pub ir: bool,
}

impl TrackSelection {
    pub fn contains(&self, kind: TrackKind) -> bool {
        match kind {
            TrackKind::Color => self.rgb,
            TrackKind::Depth => self.depth,
            TrackKind::Ir => self.ir,
        }
    }

    pub fn any(&self) -> bool {
        self.rgb || self.depth || self.ir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selects_all_tracks() {
        let options = PlayerOptions::default();
        let selection = options.selection();
        assert!(selection.rgb && selection.depth && selection.ir);
        assert!(selection.any());
    }

    #[test]
    fn test_bounds_per_track() {
        let options = PlayerOptions {
            depth_min: Some(500),
            depth_max: Some(2000),
            ..Default::default()
        };
        assert_eq!(options.bounds(TrackKind::Depth), (Some(500), Some(2000)));
        assert_eq!(options.bounds(TrackKind::Ir), (None, None));
    }
}
