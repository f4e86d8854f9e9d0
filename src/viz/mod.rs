//! Visualization and recording
//!
//! Arranges decoded streams into display windows and/or an FFmpeg
//! encoding sink.

pub mod compose;
pub mod compositor;
pub mod window;
pub mod writer;

pub use compositor::Compositor;
pub use window::{Display, DisplayWindow, MinifbDisplay};
pub use writer::VideoWriter;
