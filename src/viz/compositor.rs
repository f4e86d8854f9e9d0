//! Stream visualization state machine
//!
//! The compositor runs INIT -> RUNNING -> STOPPED. Windows and the
//! encoding sink are opened lazily on the first processed frame set and
//! owned by the compositor instance, never process-global; stop releases
//! them on every exit path and is terminal.

use std::path::PathBuf;

use crate::config::PlayerOptions;
use crate::error::PlayerError;
use crate::frame::{BgrImage, FrameSet, TrackKind};
use crate::playback::probe::SessionInfo;
use crate::viz::compose::{compose_frame, frame_to_bgr, CombinedLayout};
use crate::viz::window::{Display, DisplayWindow, MinifbDisplay};
use crate::viz::writer::VideoWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    Running,
    Stopped,
}

/// Arranges frame sets into windows and/or the encoding sink
pub struct Compositor<D: Display = MinifbDisplay> {
    state: State,
    /// None in headless mode
    display: Option<D>,
    separate_windows: bool,
    depth_bounds: (Option<u16>, Option<u16>),
    ir_bounds: (Option<u16>, Option<u16>),
    save_video: Option<PathBuf>,
    encoding_preset: String,
    frame_rate: f64,
    layout: CombinedLayout,
    combined_title: String,
    combined_window: Option<D::Window>,
    color_window: Option<D::Window>,
    depth_window: Option<D::Window>,
    ir_window: Option<D::Window>,
    writer: Option<VideoWriter>,
}

impl Compositor<MinifbDisplay> {
    pub fn new(session: &SessionInfo, options: &PlayerOptions) -> Self {
        let display = options.display.then(MinifbDisplay::default);
        Self::with_display(session, options, display)
    }
}

impl<D: Display> Compositor<D> {
    /// Build a compositor over an explicit display backend
    pub fn with_display(
        session: &SessionInfo,
        options: &PlayerOptions,
        display: Option<D>,
    ) -> Self {
        let name = session
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            state: State::Init,
            display,
            separate_windows: options.separate_windows,
            depth_bounds: options.bounds(TrackKind::Depth),
            ir_bounds: options.bounds(TrackKind::Ir),
            save_video: options.save_video.clone(),
            encoding_preset: options.encoding_preset.clone(),
            frame_rate: session.frame_rate,
            layout: CombinedLayout::new(session, options.selection()),
            combined_title: format!("Combined Kinect Video: [{}]", name),
            combined_window: None,
            color_window: None,
            depth_window: None,
            ir_window: None,
            writer: None,
        }
    }

    /// Process one dispatched frame set
    ///
    /// Fails with `StreamClosed` once stopped.
    pub fn process(&mut self, frames: &FrameSet) -> Result<(), PlayerError> {
        match self.state {
            State::Stopped => return Err(PlayerError::StreamClosed),
            State::Init => self.state = State::Running,
            State::Running => {}
        }

        let composed = if self.save_video.is_some()
            || (self.display.is_some() && !self.separate_windows)
        {
            Some(compose_frame(
                &self.layout,
                frames,
                self.depth_bounds,
                self.ir_bounds,
            )?)
        } else {
            None
        };

        if self.display.is_some() {
            if self.separate_windows {
                self.present_separate(frames)?;
            } else if let Some(image) = &composed {
                self.present_combined(image)?;
            }
        }

        if let Some(image) = &composed {
            if let Some(path) = self.save_video.clone() {
                if self.writer.is_none() {
                    self.writer = Some(VideoWriter::create(
                        &path,
                        image.width,
                        image.height,
                        self.frame_rate,
                        &self.encoding_preset,
                    )?);
                }
                if let Some(writer) = self.writer.as_mut() {
                    writer.write_frame(image)?;
                }
            }
        }

        Ok(())
    }

    /// Show the composed view in the single combined window
    ///
    /// The window is created once for the whole run and reused; a second
    /// window for the same logical view must never appear.
    fn present_combined(&mut self, image: &BgrImage) -> Result<(), PlayerError> {
        let Some(display) = self.display.as_mut() else {
            return Ok(());
        };
        if self.combined_window.is_none() {
            self.combined_window =
                Some(display.open_window(&self.combined_title, image.width, image.height)?);
        }
        if let Some(window) = self.combined_window.as_mut() {
            window.present(image)?;
        }
        Ok(())
    }

    /// Show each present stream in its own persistently-named window
    fn present_separate(&mut self, frames: &FrameSet) -> Result<(), PlayerError> {
        for (kind, title) in [
            (TrackKind::Color, "Colour"),
            (TrackKind::Depth, "Depth"),
            (TrackKind::Ir, "IR"),
        ] {
            let Some(frame) = frames.get(kind) else {
                continue;
            };
            let bounds = match kind {
                TrackKind::Depth => self.depth_bounds,
                TrackKind::Ir => self.ir_bounds,
                TrackKind::Color => (None, None),
            };
            let image = frame_to_bgr(frame, bounds)?;

            let Some(display) = self.display.as_mut() else {
                return Ok(());
            };
            let slot = match kind {
                TrackKind::Color => &mut self.color_window,
                TrackKind::Depth => &mut self.depth_window,
                TrackKind::Ir => &mut self.ir_window,
            };
            if slot.is_none() {
                *slot = Some(display.open_window(title, image.width, image.height)?);
            }
            if let Some(window) = slot.as_mut() {
                window.present(&image)?;
            }
        }
        Ok(())
    }

    /// True while playback should keep going as far as the display is
    /// concerned: headless runs never stop here, and a run with windows
    /// stops once any of them was closed or received a quit key
    pub fn windows_open(&self) -> bool {
        if self.display.is_none() {
            return true;
        }
        let open = |window: &Option<D::Window>| {
            window.as_ref().map(DisplayWindow::is_open).unwrap_or(true)
        };
        open(&self.combined_window)
            && open(&self.color_window)
            && open(&self.depth_window)
            && open(&self.ir_window)
    }

    /// Release windows and finalize the encoding sink; terminal and
    /// idempotent
    pub fn stop(&mut self) -> Result<(), PlayerError> {
        if self.state == State::Stopped {
            return Ok(());
        }
        self.state = State::Stopped;

        self.combined_window = None;
        self.color_window = None;
        self.depth_window = None;
        self.ir_window = None;

        if let Some(mut writer) = self.writer.take() {
            writer.finish()?;
        }
        Ok(())
    }
}

impl<D: Display> Drop for Compositor<D> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("failed to stop compositor cleanly: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackSelection;
    use crate::frame::{Frame, Pixels};
    use crate::playback::probe::TrackInfo;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;
    use std::time::Duration;

    struct NullWindow;

    impl DisplayWindow for NullWindow {
        fn present(&mut self, _image: &BgrImage) -> Result<(), PlayerError> {
            Ok(())
        }

        fn is_open(&self) -> bool {
            true
        }
    }

    /// Display backend that records every window title it was asked for
    struct CountingDisplay {
        opened: Rc<RefCell<Vec<String>>>,
    }

    impl Display for CountingDisplay {
        type Window = NullWindow;

        fn open_window(
            &mut self,
            title: &str,
            _width: usize,
            _height: usize,
        ) -> Result<NullWindow, PlayerError> {
            self.opened.borrow_mut().push(title.to_string());
            Ok(NullWindow)
        }
    }

    fn session() -> SessionInfo {
        SessionInfo {
            path: PathBuf::from("recording.mkv"),
            frame_rate: 30.0,
            color: TrackInfo { width: 4, height: 2 },
            depth: TrackInfo { width: 2, height: 2 },
            ir: TrackInfo { width: 2, height: 2 },
            duration: None,
        }
    }

    fn options(separate: bool, selection: TrackSelection) -> PlayerOptions {
        PlayerOptions {
            rgb: selection.rgb,
            depth: selection.depth,
            ir: selection.ir,
            separate_windows: separate,
            depth_min: Some(500),
            depth_max: Some(2000),
            ir_min: Some(0),
            ir_max: Some(1000),
            ..Default::default()
        }
    }

    fn frames(selection: TrackSelection) -> FrameSet {
        let gray = |kind: TrackKind| Frame {
            kind,
            timestamp: Duration::ZERO,
            width: 2,
            height: 2,
            pixels: Pixels::Gray16(vec![600, 700, 800, 900]),
        };
        FrameSet {
            color: selection.rgb.then(|| Frame {
                kind: TrackKind::Color,
                timestamp: Duration::ZERO,
                width: 4,
                height: 2,
                pixels: Pixels::Bgr8(vec![128; 4 * 2 * 3]),
            }),
            depth: selection.depth.then(|| gray(TrackKind::Depth)),
            ir: selection.ir.then(|| gray(TrackKind::Ir)),
        }
    }

    fn counting_compositor(
        separate: bool,
        selection: TrackSelection,
    ) -> (Compositor<CountingDisplay>, Rc<RefCell<Vec<String>>>) {
        let opened = Rc::new(RefCell::new(Vec::new()));
        let display = CountingDisplay {
            opened: opened.clone(),
        };
        let compositor =
            Compositor::with_display(&session(), &options(separate, selection), Some(display));
        (compositor, opened)
    }

    const ALL: TrackSelection = TrackSelection {
        rgb: true,
        depth: true,
        ir: true,
    };

    #[test]
    fn test_combined_mode_creates_exactly_one_window() {
        let (mut compositor, opened) = counting_compositor(false, ALL);
        for _ in 0..10 {
            compositor.process(&frames(ALL)).unwrap();
        }
        compositor.stop().unwrap();
        assert_eq!(opened.borrow().len(), 1);
        assert!(opened.borrow()[0].starts_with("Combined Kinect Video"));
    }

    #[test]
    fn test_separate_mode_reuses_one_window_per_stream() {
        let (mut compositor, opened) = counting_compositor(true, ALL);
        for _ in 0..5 {
            compositor.process(&frames(ALL)).unwrap();
        }
        assert_eq!(
            *opened.borrow(),
            vec!["Colour".to_string(), "Depth".to_string(), "IR".to_string()]
        );
    }

    #[test]
    fn test_separate_mode_skips_absent_streams() {
        let only_depth = TrackSelection {
            rgb: false,
            depth: true,
            ir: false,
        };
        let (mut compositor, opened) = counting_compositor(true, only_depth);
        compositor.process(&frames(only_depth)).unwrap();
        assert_eq!(*opened.borrow(), vec!["Depth".to_string()]);
    }

    #[test]
    fn test_process_after_stop_fails() {
        let (mut compositor, _) = counting_compositor(false, ALL);
        compositor.process(&frames(ALL)).unwrap();
        compositor.stop().unwrap();
        assert!(matches!(
            compositor.process(&frames(ALL)),
            Err(PlayerError::StreamClosed)
        ));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (mut compositor, _) = counting_compositor(false, ALL);
        compositor.process(&frames(ALL)).unwrap();
        compositor.stop().unwrap();
        compositor.stop().unwrap();
    }

    #[test]
    fn test_headless_never_opens_windows() {
        let mut compositor: Compositor<CountingDisplay> =
            Compositor::with_display(&session(), &options(false, ALL), None);
        compositor.process(&frames(ALL)).unwrap();
        assert!(compositor.windows_open());
    }

    #[test]
    fn test_empty_frame_set_keeps_running() {
        let (mut compositor, opened) = counting_compositor(false, ALL);
        compositor.process(&FrameSet::default()).unwrap();
        compositor.process(&frames(ALL)).unwrap();
        assert_eq!(opened.borrow().len(), 1);
    }
}
