//! kinect-replay - replay multi-track Azure Kinect MKV recordings.
//!
//! A recording carries color, depth and IR tracks; this crate decodes
//! them through FFmpeg pipes, paces dispatch against the recorded
//! timestamps, and arranges the streams into display windows and/or a
//! re-encoded combined video.

pub mod config;
pub mod error;
pub mod frame;
pub mod playback;
pub mod scale;
pub mod viz;

use std::path::Path;
use std::time::Instant;

pub use config::{PlayerOptions, TrackSelection};
pub use error::{PlayerError, PlayerResult};
pub use frame::{BgrImage, Frame, FrameSet, Pixels, TrackKind};
pub use playback::{PlaybackWrapper, SessionInfo};
pub use viz::Compositor;

/// Observed sample range of one 16-bit track across a run
#[derive(Debug, Clone, Copy)]
struct ObservedRange {
    min: u16,
    max: u16,
    seen: bool,
}

impl ObservedRange {
    fn new() -> Self {
        Self {
            min: u16::MAX,
            max: 0,
            seen: false,
        }
    }

    fn update(&mut self, frame: Option<&Frame>) {
        let Some(Frame {
            pixels: Pixels::Gray16(samples),
            ..
        }) = frame
        else {
            return;
        };
        for &s in samples {
            self.min = self.min.min(s);
            self.max = self.max.max(s);
        }
        self.seen = true;
    }

    fn log(&self, label: &str) {
        if self.seen {
            tracing::info!("{} min: {}, max: {}", label, self.min, self.max);
        }
    }
}

/// Replay a recording with the given options
///
/// Drives dispatch, composition and display/encoding until end of
/// stream, a quit key, or a fatal error; windows and the encoding sink
/// are released on every exit path.
pub fn run(video: &Path, options: &PlayerOptions) -> Result<(), PlayerError> {
    let start = Instant::now();

    let mut wrapper = PlaybackWrapper::open(video, options)?;
    let mut compositor = Compositor::new(wrapper.session(), options);

    let mut depth_range = ObservedRange::new();
    let mut ir_range = ObservedRange::new();

    let result = (|| -> Result<(), PlayerError> {
        while let Some(frames) = wrapper.next_frames()? {
            depth_range.update(frames.depth.as_ref());
            ir_range.update(frames.ir.as_ref());

            compositor.process(&frames)?;

            if !compositor.windows_open() {
                tracing::info!("display closed, stopping playback");
                break;
            }
        }
        Ok(())
    })();

    // teardown must run whether the loop ended cleanly or not
    let stopped = compositor.stop();
    result?;
    stopped?;

    tracing::info!("time taken: {:.2}s", start.elapsed().as_secs_f64());
    depth_range.log("depth");
    ir_range.log("ir");
    Ok(())
}
