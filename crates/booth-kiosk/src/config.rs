//! Kiosk configuration.

use std::path::PathBuf;
use std::time::Duration;

use booth_models::MediaKind;

use crate::error::{KioskError, KioskResult};

/// One session's configuration, environment-driven.
#[derive(Debug, Clone)]
pub struct KioskConfig {
    /// Analytics API base URL
    pub api_base_url: String,
    /// Raw encrypted query string from the scanned QR code
    pub session_query: String,
    /// Root of the frame/background asset packs
    pub assets_root: PathBuf,
    /// Where captures are written
    pub output_dir: PathBuf,
    /// Segmentation model path
    pub model_path: PathBuf,
    /// Camera device path
    pub camera_device: String,
    /// Camera input format (`v4l2`, `avfoundation`)
    pub camera_format: String,
    /// Preview canvas size
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Secret outcome probability override
    pub secret_probability: f64,
    /// What this session captures
    pub capture_kind: MediaKind,
    /// How long the visitor previews before capture
    pub preview_duration: Duration,
    /// Recording length for video sessions
    pub record_duration: Duration,
}

impl KioskConfig {
    /// Create config from environment variables.
    pub fn from_env() -> KioskResult<Self> {
        let session_query = std::env::var("BOOTH_SESSION_QUERY")
            .map_err(|_| KioskError::config("BOOTH_SESSION_QUERY not set"))?;

        let capture_kind = match std::env::var("BOOTH_CAPTURE").as_deref() {
            Ok("video") => MediaKind::Video,
            _ => MediaKind::Image,
        };

        Ok(Self {
            api_base_url: std::env::var("BOOTH_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            session_query,
            assets_root: std::env::var("BOOTH_ASSETS_ROOT")
                .unwrap_or_else(|_| "assets".to_string())
                .into(),
            output_dir: std::env::var("BOOTH_OUTPUT_DIR")
                .unwrap_or_else(|_| "captures".to_string())
                .into(),
            model_path: std::env::var("BOOTH_SEGMENTATION_MODEL")
                .unwrap_or_else(|_| "models/person_segmentation.onnx".to_string())
                .into(),
            camera_device: std::env::var("BOOTH_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            camera_format: std::env::var("BOOTH_CAMERA_FORMAT")
                .unwrap_or_else(|_| "v4l2".to_string()),
            canvas_width: env_parse("BOOTH_CANVAS_WIDTH", 350),
            canvas_height: env_parse("BOOTH_CANVAS_HEIGHT", 600),
            secret_probability: env_parse("BOOTH_SECRET_PROBABILITY", 0.2),
            capture_kind,
            preview_duration: Duration::from_secs(env_parse("BOOTH_PREVIEW_SECS", 5)),
            record_duration: Duration::from_secs(env_parse("BOOTH_RECORD_SECS", 10)),
        })
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_falls_back() {
        assert_eq!(env_parse("BOOTH_TEST_UNSET_VAR", 42u32), 42);
    }
}
