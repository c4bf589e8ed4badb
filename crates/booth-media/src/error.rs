//! Error types for media pipeline operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur in the capture/compositing pipeline.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("Camera unavailable: {message}")]
    CameraDenied { message: String },

    #[error("No supported recording encoder available")]
    CodecUnsupported,

    #[error("Segmentation model unavailable: {0}")]
    SegmenterUnavailable(String),

    #[error("Segmentation inference failed: {0}")]
    Inference(String),

    #[error("Failed to decode asset {path}: {message}")]
    AssetDecode { path: PathBuf, message: String },

    #[error("Asset load timed out after {0} seconds")]
    AssetTimeout(u64),

    #[error("Asset cache already released")]
    AssetsReleased,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Recorder is not running")]
    RecorderClosed,

    #[error(transparent)]
    InvalidTransition(#[from] booth_models::TransitionError),

    #[error("Frame size mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    FrameSizeMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a camera failure error.
    pub fn camera_denied(message: impl Into<String>) -> Self {
        Self::CameraDenied {
            message: message.into(),
        }
    }

    /// Create an inference failure error.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Create an asset decode error.
    pub fn asset_decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::AssetDecode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
