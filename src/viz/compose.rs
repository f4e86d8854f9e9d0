//! Combined-view layout
//!
//! The combined view stacks color on top with depth bottom-left and IR
//! bottom-right. Placement is computed once from the session metadata so
//! the composed image keeps fixed dimensions for the whole run even when
//! a slot is momentarily absent; missing regions stay black.

use crate::config::TrackSelection;
use crate::error::PlayerError;
use crate::frame::{BgrImage, Frame, FrameSet, Pixels, TrackKind};
use crate::playback::probe::SessionInfo;
use crate::scale::normalize_u16;

/// Top-left placement of one stream inside the combined canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    x: usize,
    y: usize,
}

/// Fixed placement of the enabled streams inside the combined canvas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedLayout {
    pub width: usize,
    pub height: usize,
    color: Option<Slot>,
    depth: Option<Slot>,
    ir: Option<Slot>,
}

impl CombinedLayout {
    /// Compute the layout for the enabled streams
    ///
    /// Color sits centered on top; depth and IR sit below it, depth on
    /// the left edge and IR on the right. With color disabled, depth and
    /// IR sit side by side. A single enabled stream fills the canvas.
    pub fn new(session: &SessionInfo, selection: TrackSelection) -> Self {
        let color = selection.rgb.then_some(session.color);
        let depth = selection.depth.then_some(session.depth);
        let ir = selection.ir.then_some(session.ir);

        let bottom_width = depth.map(|t| t.width).unwrap_or(0) + ir.map(|t| t.width).unwrap_or(0);
        let bottom_height = depth
            .map(|t| t.height)
            .unwrap_or(0)
            .max(ir.map(|t| t.height).unwrap_or(0));
        let width = color.map(|t| t.width).unwrap_or(0).max(bottom_width);
        let height = color.map(|t| t.height).unwrap_or(0) + bottom_height;
        let bottom_y = color.map(|t| t.height).unwrap_or(0);

        let single_bottom = depth.is_some() != ir.is_some();

        Self {
            width,
            height,
            color: color.map(|t| Slot {
                x: (width - t.width) / 2,
                y: 0,
            }),
            depth: depth.map(|t| Slot {
                // a lone bottom stream is centered under the color image
                x: if single_bottom { (width - t.width) / 2 } else { 0 },
                y: bottom_y,
            }),
            ir: ir.map(|t| Slot {
                x: if single_bottom {
                    (width - t.width) / 2
                } else {
                    width - t.width
                },
                y: bottom_y,
            }),
        }
    }

    fn slot(&self, kind: TrackKind) -> Option<Slot> {
        match kind {
            TrackKind::Color => self.color,
            TrackKind::Depth => self.depth,
            TrackKind::Ir => self.ir,
        }
    }
}

/// Convert one frame to an 8-bit BGR tile, normalizing 16-bit tracks
pub fn frame_to_bgr(
    frame: &Frame,
    bounds: (Option<u16>, Option<u16>),
) -> Result<BgrImage, PlayerError> {
    match &frame.pixels {
        Pixels::Bgr8(data) => Ok(BgrImage::from_bgr(frame.width, frame.height, data.clone())),
        Pixels::Gray16(samples) => {
            let gray = normalize_u16(samples, bounds.0, bounds.1)?;
            Ok(BgrImage::from_gray(frame.width, frame.height, &gray))
        }
    }
}

/// Compose one frame set onto a black canvas following `layout`
pub fn compose_frame(
    layout: &CombinedLayout,
    frames: &FrameSet,
    depth_bounds: (Option<u16>, Option<u16>),
    ir_bounds: (Option<u16>, Option<u16>),
) -> Result<BgrImage, PlayerError> {
    let mut canvas = BgrImage::black(layout.width, layout.height);
    for kind in [TrackKind::Color, TrackKind::Depth, TrackKind::Ir] {
        let (Some(slot), Some(frame)) = (layout.slot(kind), frames.get(kind)) else {
            continue;
        };
        let bounds = match kind {
            TrackKind::Depth => depth_bounds,
            TrackKind::Ir => ir_bounds,
            TrackKind::Color => (None, None),
        };
        let tile = frame_to_bgr(frame, bounds)?;
        canvas.blit(&tile, slot.x, slot.y);
    }
    Ok(canvas)
}
