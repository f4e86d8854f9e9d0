//! Per-track raw frame decoding
//!
//! One FFmpeg child is spawned per selected track, demuxing that stream
//! to fixed-size raw frames on its stdout (`bgr24` for color, `gray16le`
//! for depth and IR). A short read mid-frame is a malformed packet and
//! drops that tick; a clean EOF at a frame boundary permanently exhausts
//! the track.

use std::io::{BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use crate::config::TrackSelection;
use crate::error::PlayerError;
use crate::frame::{Frame, FrameSet, Pixels, TrackKind};
use crate::playback::probe::SessionInfo;

/// Raw frame reader for a single track
pub(crate) struct TrackReader {
    kind: TrackKind,
    width: usize,
    height: usize,
    frame_bytes: usize,
    source: Box<dyn Read + Send>,
    child: Option<Child>,
    exhausted: bool,
}

impl TrackReader {
    fn spawn(session: &SessionInfo, kind: TrackKind) -> Result<Self, PlayerError> {
        let info = session.track(kind);
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(&session.path)
            .arg("-map")
            .arg(format!("0:{}", kind.stream_index()))
            .args([
                "-f",
                "image2pipe",
                "-pix_fmt",
                kind.pix_fmt(),
                "-vcodec",
                "rawvideo",
                "-",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                PlayerError::Ffmpeg(format!(
                    "failed to start FFmpeg decoder for {} track: {}",
                    kind.label(),
                    e
                ))
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            PlayerError::Ffmpeg("failed to capture FFmpeg stdout".to_string())
        })?;

        let frame_bytes = info.frame_bytes(kind);
        Ok(Self {
            kind,
            width: info.width,
            height: info.height,
            frame_bytes,
            source: Box::new(BufReader::with_capacity(frame_bytes, stdout)),
            child: Some(child),
            exhausted: false,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_reader(
        kind: TrackKind,
        width: usize,
        height: usize,
        source: Box<dyn Read + Send>,
    ) -> Self {
        Self {
            kind,
            width,
            height,
            frame_bytes: width * height * kind.bytes_per_pixel(),
            source,
            child: None,
            exhausted: false,
        }
    }

    /// Decode the next frame of this track, absent on exhaustion or a
    /// malformed packet
    fn next_frame(&mut self, timestamp: Duration) -> Option<Frame> {
        if self.exhausted {
            return None;
        }
        match self.read_packet() {
            Ok(Some(data)) => Some(self.to_frame(data, timestamp)),
            Ok(None) => {
                tracing::debug!("{} track exhausted", self.kind.label());
                self.exhausted = true;
                None
            }
            Err(e) => {
                tracing::warn!("dropping malformed {} packet: {}", self.kind.label(), e);
                None
            }
        }
    }

    /// Read exactly one raw frame worth of bytes
    ///
    /// `Ok(None)` on a clean EOF at a frame boundary.
    fn read_packet(&mut self) -> Result<Option<Vec<u8>>, PlayerError> {
        let mut buf = vec![0u8; self.frame_bytes];
        let mut filled = 0;
        while filled < buf.len() {
            match self.source.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(PlayerError::Decoding(format!(
                        "failed to read frame: {}",
                        e
                    )))
                }
            }
        }

        if filled == 0 {
            Ok(None)
        } else if filled < buf.len() {
            Err(PlayerError::Decoding(format!(
                "short packet: {} of {} bytes",
                filled, self.frame_bytes
            )))
        } else {
            Ok(Some(buf))
        }
    }

    fn to_frame(&self, data: Vec<u8>, timestamp: Duration) -> Frame {
        let pixels = match self.kind {
            TrackKind::Color => Pixels::Bgr8(data),
            TrackKind::Depth | TrackKind::Ir => Pixels::Gray16(
                data.chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect(),
            ),
        };
        Frame {
            kind: self.kind,
            timestamp,
            width: self.width,
            height: self.height,
            pixels,
        }
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl Drop for TrackReader {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Decodes the next packet of every selected track
pub struct TrackDecoder {
    color: Option<TrackReader>,
    depth: Option<TrackReader>,
    ir: Option<TrackReader>,
}

impl TrackDecoder {
    /// Spawn FFmpeg decoders for every selected track
    pub fn open(session: &SessionInfo, selection: TrackSelection) -> Result<Self, PlayerError> {
        let reader = |kind: TrackKind| -> Result<Option<TrackReader>, PlayerError> {
            if selection.contains(kind) {
                TrackReader::spawn(session, kind).map(Some)
            } else {
                Ok(None)
            }
        };
        Ok(Self {
            color: reader(TrackKind::Color)?,
            depth: reader(TrackKind::Depth)?,
            ir: reader(TrackKind::Ir)?,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_readers(
        color: Option<TrackReader>,
        depth: Option<TrackReader>,
        ir: Option<TrackReader>,
    ) -> Self {
        Self { color, depth, ir }
    }

    /// Decode the next frame of every selected track
    ///
    /// Unselected tracks always yield an absent slot.
    pub fn decode_next(&mut self, timestamp: Duration) -> FrameSet {
        FrameSet {
            color: self.color.as_mut().and_then(|t| t.next_frame(timestamp)),
            depth: self.depth.as_mut().and_then(|t| t.next_frame(timestamp)),
            ir: self.ir.as_mut().and_then(|t| t.next_frame(timestamp)),
        }
    }

    /// True once every selected track has hit end of stream
    pub fn all_exhausted(&self) -> bool {
        let done = |track: &Option<TrackReader>| {
            track.as_ref().map(TrackReader::is_exhausted).unwrap_or(true)
        };
        done(&self.color) && done(&self.depth) && done(&self.ir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Raw gray16le track bytes, one frame of constant samples per value
    fn gray16_track(width: usize, height: usize, values: &[u16]) -> Vec<u8> {
        let mut data = Vec::new();
        for &value in values {
            for _ in 0..width * height {
                data.extend_from_slice(&value.to_le_bytes());
            }
        }
        data
    }

    fn reader_from(kind: TrackKind, width: usize, height: usize, data: Vec<u8>) -> TrackReader {
        TrackReader::from_reader(kind, width, height, Box::new(Cursor::new(data)))
    }

    #[test]
    fn test_decodes_gray16_samples() {
        let data = gray16_track(2, 2, &[1234]);
        let mut decoder = TrackDecoder::from_readers(
            None,
            Some(reader_from(TrackKind::Depth, 2, 2, data)),
            None,
        );
        let set = decoder.decode_next(Duration::ZERO);
        let frame = set.depth.expect("one depth frame");
        assert_eq!(frame.width, 2);
        assert_eq!(frame.height, 2);
        assert_eq!(frame.pixels, Pixels::Gray16(vec![1234; 4]));
    }

    #[test]
    fn test_track_exhausts_permanently() {
        let data = gray16_track(2, 1, &[7]);
        let mut decoder = TrackDecoder::from_readers(
            None,
            Some(reader_from(TrackKind::Depth, 2, 1, data)),
            None,
        );
        assert!(decoder.decode_next(Duration::ZERO).depth.is_some());
        assert!(!decoder.all_exhausted());
        assert!(decoder.decode_next(Duration::ZERO).depth.is_none());
        assert!(decoder.all_exhausted());
        assert!(decoder.decode_next(Duration::ZERO).depth.is_none());
    }

    #[test]
    fn test_short_packet_drops_tick_only() {
        let mut data = gray16_track(2, 2, &[42]);
        // half of a second frame
        data.extend_from_slice(&gray16_track(2, 1, &[42]));
        let mut decoder = TrackDecoder::from_readers(
            None,
            Some(reader_from(TrackKind::Depth, 2, 2, data)),
            None,
        );
        assert!(decoder.decode_next(Duration::ZERO).depth.is_some());
        // malformed packet: absent this tick, not yet exhausted
        assert!(decoder.decode_next(Duration::ZERO).depth.is_none());
        assert!(!decoder.all_exhausted());
        // the stream then ends cleanly
        assert!(decoder.decode_next(Duration::ZERO).depth.is_none());
        assert!(decoder.all_exhausted());
    }

    #[test]
    fn test_unselected_tracks_always_absent() {
        let data = gray16_track(2, 1, &[9, 9]);
        let mut decoder = TrackDecoder::from_readers(
            None,
            Some(reader_from(TrackKind::Depth, 2, 1, data)),
            None,
        );
        let set = decoder.decode_next(Duration::ZERO);
        assert!(set.color.is_none());
        assert!(set.ir.is_none());
        assert!(set.depth.is_some());
    }

    #[test]
    fn test_color_decodes_to_bgr8() {
        let data = vec![10u8, 20, 30, 40, 50, 60];
        let mut decoder = TrackDecoder::from_readers(
            Some(reader_from(TrackKind::Color, 2, 1, data.clone())),
            None,
            None,
        );
        let frame = decoder.decode_next(Duration::ZERO).color.unwrap();
        assert_eq!(frame.pixels, Pixels::Bgr8(data));
    }
}
