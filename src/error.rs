//! Error types and handling
//!
//! Common error types used across the player.

use thiserror::Error;

/// Player-wide error type
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ffprobe error: {0}")]
    Probe(String),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    #[error("invalid recording: {0}")]
    InvalidRecording(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("decoding error: {0}")]
    Decoding(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid normalization range: {0}")]
    InvalidRange(String),

    #[error("playback already finished")]
    StreamClosed,

    #[error("display error: {0}")]
    Display(String),
}

/// Result type alias using PlayerError
pub type PlayerResult<T> = Result<T, PlayerError>;
