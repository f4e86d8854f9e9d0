//! Recording playback
//!
//! Probes session metadata, decodes raw frames from the container via
//! FFmpeg pipes, and dispatches synchronized frame sets paced against
//! the recorded timestamps.

pub mod clock;
pub mod decoder;
pub mod probe;
pub mod wrapper;

pub use probe::{probe_session, SessionInfo, TrackInfo};
pub use wrapper::PlaybackWrapper;
