//! Recording format candidates.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Fixed recording frame rate.
pub const RECORD_FPS: u32 = 30;

/// A candidate recording encoding.
///
/// The recorder probes these in order and uses the first one the local
/// ffmpeg build supports, mirroring how browsers probe MediaRecorder
/// mime types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RecordingFormat {
    /// FFmpeg encoder name
    pub encoder: &'static str,
    /// Container file extension
    pub extension: &'static str,
    /// Mime type of the finished file
    pub mime: &'static str,
}

impl RecordingFormat {
    pub const VP9_WEBM: RecordingFormat = RecordingFormat {
        encoder: "libvpx-vp9",
        extension: "webm",
        mime: "video/webm",
    };

    pub const VP8_WEBM: RecordingFormat = RecordingFormat {
        encoder: "libvpx",
        extension: "webm",
        mime: "video/webm",
    };

    pub const H264_MP4: RecordingFormat = RecordingFormat {
        encoder: "libx264",
        extension: "mp4",
        mime: "video/mp4",
    };

    /// Capability probe order: best quality first.
    pub const PROBE_ORDER: &'static [RecordingFormat] = &[
        RecordingFormat::VP9_WEBM,
        RecordingFormat::VP8_WEBM,
        RecordingFormat::H264_MP4,
    ];
}
