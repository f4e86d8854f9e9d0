//! FFmpeg encoding sink
//!
//! Composed 8-bit BGR frames are piped into an FFmpeg child encoding
//! H.264 at the session frame rate. The sink must be finished on every
//! exit path so the container is finalized; dropping an unfinished
//! writer closes it best-effort.

use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::error::PlayerError;
use crate::frame::BgrImage;

pub struct VideoWriter {
    process: Child,
    /// Taken on finish; EOF on this pipe tells FFmpeg to finalize
    stdin: Option<ChildStdin>,
    width: usize,
    height: usize,
    frame_count: u64,
}

impl VideoWriter {
    /// Start an FFmpeg encoder writing to `path`
    pub fn create(
        path: &Path,
        width: usize,
        height: usize,
        frame_rate: f64,
        preset: &str,
    ) -> Result<Self, PlayerError> {
        tracing::info!(
            "starting FFmpeg encoder: {} ({}x{} @ {:.2}fps, preset {})",
            path.display(),
            width,
            height,
            frame_rate,
            preset
        );

        let mut process = Command::new("ffmpeg")
            .args(["-y", "-v", "error", "-f", "rawvideo", "-vcodec", "rawvideo"])
            .arg("-s")
            .arg(format!("{}x{}", width, height))
            .args(["-pix_fmt", "bgr24", "-r"])
            .arg(frame_rate.to_string())
            .args([
                "-i",
                "-",
                "-an",
                "-vcodec",
                "libx264",
                "-preset",
                preset,
                "-pix_fmt",
                "yuv420p",
            ])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PlayerError::Ffmpeg(format!("failed to start FFmpeg encoder: {}", e)))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| PlayerError::Ffmpeg("failed to capture FFmpeg stdin".to_string()))?;

        Ok(Self {
            process,
            stdin: Some(stdin),
            width,
            height,
            frame_count: 0,
        })
    }

    /// Append one composed frame; its dimensions must match the writer's
    pub fn write_frame(&mut self, image: &BgrImage) -> Result<(), PlayerError> {
        if image.width != self.width || image.height != self.height {
            return Err(PlayerError::Encoding(format!(
                "frame size {}x{} does not match encoder size {}x{}",
                image.width, image.height, self.width, self.height
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| PlayerError::Encoding("encoder already finished".to_string()))?;
        stdin
            .write_all(&image.data)
            .map_err(|e| PlayerError::Encoding(format!("failed to write frame: {}", e)))?;
        self.frame_count += 1;
        Ok(())
    }

    /// Close the pipe and wait for FFmpeg to finalize the file
    ///
    /// Idempotent; the drop path calls this too.
    pub fn finish(&mut self) -> Result<(), PlayerError> {
        let Some(stdin) = self.stdin.take() else {
            return Ok(());
        };
        drop(stdin);

        let status = self
            .process
            .wait()
            .map_err(|e| PlayerError::Ffmpeg(format!("failed to wait for encoder: {}", e)))?;
        if !status.success() {
            return Err(PlayerError::Ffmpeg(format!(
                "FFmpeg encoder exited with {}",
                status
            )));
        }
        tracing::info!("encoded {} frames", self.frame_count);
        Ok(())
    }
}

impl Drop for VideoWriter {
    fn drop(&mut self) {
        if self.stdin.is_some() {
            if let Err(e) = self.finish() {
                tracing::warn!("failed to finalize video on drop: {}", e);
            }
        }
    }
}
