//! Playback pacing and frame dispatch
//!
//! `PlaybackWrapper` delivers one synchronized frame set per call. With
//! real-time pacing enabled, each call blocks until the frame's recorded
//! timestamp has elapsed on the wall clock; frames are never skipped to
//! catch up, so a slow consumer sees every frame late rather than a
//! subset on time.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::PlayerOptions;
use crate::error::PlayerError;
use crate::frame::FrameSet;
use crate::playback::clock::{Clock, SystemClock};
use crate::playback::decoder::TrackDecoder;
use crate::playback::probe::{check_ffmpeg, probe_session, SessionInfo};

/// Playback wrapper for Kinect MKV recordings
pub struct PlaybackWrapper {
    session: SessionInfo,
    decoder: TrackDecoder,
    clock: Box<dyn Clock>,
    realtime_wait: bool,
    /// Wall-clock instant aligned with the first dispatched frame
    start_reference: Option<Instant>,
    current_frame: u64,
    finished: bool,
}

impl PlaybackWrapper {
    /// Open a recording and spawn decoders for the selected tracks
    ///
    /// Any failure here (missing FFmpeg, unreadable container, missing
    /// streams) is fatal and reported before playback begins.
    pub fn open(path: &Path, options: &PlayerOptions) -> Result<Self, PlayerError> {
        let selection = options.selection();
        if !selection.any() {
            return Err(PlayerError::InvalidConfig(
                "at least one of rgb, depth and ir must be enabled".to_string(),
            ));
        }

        check_ffmpeg()?;
        let session = probe_session(path)?;
        tracing::info!(
            "opened {}: color {}x{}, depth {}x{}, ir {}x{} @ {:.2}fps",
            path.display(),
            session.color.width,
            session.color.height,
            session.depth.width,
            session.depth.height,
            session.ir.width,
            session.ir.height,
            session.frame_rate,
        );

        let decoder = TrackDecoder::open(&session, selection)?;
        Ok(Self::from_parts(
            session,
            decoder,
            Box::new(SystemClock),
            options.realtime_wait,
        ))
    }

    pub(crate) fn from_parts(
        session: SessionInfo,
        decoder: TrackDecoder,
        clock: Box<dyn Clock>,
        realtime_wait: bool,
    ) -> Self {
        Self {
            session,
            decoder,
            clock,
            realtime_wait,
            start_reference: None,
            current_frame: 0,
            finished: false,
        }
    }

    pub fn session(&self) -> &SessionInfo {
        &self.session
    }

    /// Dispatch the next synchronized frame set
    ///
    /// Returns `Ok(None)` exactly once when every selected track has
    /// independently reached end of stream; any call after that is a
    /// programmer error and fails with `StreamClosed`. A set may still
    /// have absent slots mid-stream: disabled tracks, tracks that ended
    /// before the others, or a malformed packet on this tick.
    pub fn next_frames(&mut self) -> Result<Option<FrameSet>, PlayerError> {
        if self.finished {
            return Err(PlayerError::StreamClosed);
        }

        let timestamp = self.session.frame_timestamp(self.current_frame);
        let frames = self.decoder.decode_next(timestamp);

        if frames.is_empty() && self.decoder.all_exhausted() {
            self.finished = true;
            tracing::debug!("end of stream after {} frames", self.current_frame);
            return Ok(None);
        }

        if self.realtime_wait {
            self.wait_until(timestamp);
        }
        self.current_frame += 1;
        Ok(Some(frames))
    }

    /// Block until `reference + timestamp`, latching the reference on the
    /// first call so the first frame is delivered immediately
    fn wait_until(&mut self, timestamp: Duration) {
        let reference = match self.start_reference {
            Some(reference) => reference,
            None => {
                let now = self.clock.now();
                self.start_reference = Some(now);
                now
            }
        };
        let target = reference + timestamp;
        let now = self.clock.now();
        if now < target {
            self.clock.sleep(target - now);
        }
    }
}
