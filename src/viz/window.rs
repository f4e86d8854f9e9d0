//! Display window abstraction
//!
//! The compositor talks to windows through these traits so tests can
//! count window creation without a display server. The real backend is
//! minifb.

use minifb::{Key, Window, WindowOptions};

use crate::error::PlayerError;
use crate::frame::BgrImage;

/// A single named display window
pub trait DisplayWindow {
    fn present(&mut self, image: &BgrImage) -> Result<(), PlayerError>;

    /// False once the user closed the window or pressed a quit key
    fn is_open(&self) -> bool;
}

/// Factory for display windows
pub trait Display {
    type Window: DisplayWindow;

    fn open_window(
        &mut self,
        title: &str,
        width: usize,
        height: usize,
    ) -> Result<Self::Window, PlayerError>;
}

/// minifb-backed display
#[derive(Debug, Default)]
pub struct MinifbDisplay;

pub struct MinifbWindow {
    window: Window,
    /// Reused 0RGB conversion buffer
    buffer: Vec<u32>,
}

impl Display for MinifbDisplay {
    type Window = MinifbWindow;

    fn open_window(
        &mut self,
        title: &str,
        width: usize,
        height: usize,
    ) -> Result<MinifbWindow, PlayerError> {
        tracing::debug!("opening window '{}' ({}x{})", title, width, height);
        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| PlayerError::Display(format!("failed to open window '{}': {}", title, e)))?;

        Ok(MinifbWindow {
            window,
            buffer: Vec::with_capacity(width * height),
        })
    }
}

impl DisplayWindow for MinifbWindow {
    fn present(&mut self, image: &BgrImage) -> Result<(), PlayerError> {
        self.buffer.clear();
        self.buffer.extend(
            image
                .data
                .chunks_exact(3)
                .map(|p| u32::from(p[2]) << 16 | u32::from(p[1]) << 8 | u32::from(p[0])),
        );
        self.window
            .update_with_buffer(&self.buffer, image.width, image.height)
            .map_err(|e| PlayerError::Display(format!("failed to present frame: {}", e)))
    }

    fn is_open(&self) -> bool {
        self.window.is_open()
            && !self.window.is_key_down(Key::Escape)
            && !self.window.is_key_down(Key::Q)
    }
}
