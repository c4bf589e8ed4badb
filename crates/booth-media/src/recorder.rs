//! Canvas recording via FFmpeg.
//!
//! The recorder consumes the same composited frames the preview presents,
//! so the finished file is pixel-identical to what the visitor watched.
//! Raw RGBA frames are piped into ffmpeg's stdin at a fixed 30 fps; the
//! encoder is chosen by a capability probe over the candidate formats, the
//! way a browser probes MediaRecorder mime types.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use image::RgbaImage;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, info};
use uuid::Uuid;

use booth_models::{RecordingFormat, RECORD_FPS};

use crate::error::{MediaError, MediaResult};

/// Pick the first probe-order format the local ffmpeg supports.
pub async fn probe_recording_format() -> MediaResult<RecordingFormat> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| MediaError::ffmpeg_failed(format!("probe encoders: {e}"), None, None))?;

    let listing = String::from_utf8_lossy(&output.stdout);
    select_format(&listing).ok_or(MediaError::CodecUnsupported)
}

/// Format selection from an `ffmpeg -encoders` listing.
fn select_format(encoder_listing: &str) -> Option<RecordingFormat> {
    RecordingFormat::PROBE_ORDER
        .iter()
        .copied()
        .find(|format| {
            encoder_listing
                .lines()
                .any(|line| line.split_whitespace().nth(1) == Some(format.encoder))
        })
}

/// A finished recording.
#[derive(Debug)]
pub struct RecordedVideo {
    pub path: PathBuf,
    pub format: RecordingFormat,
    pub frames: u64,
}

/// Streams composited frames into an ffmpeg encoder.
pub struct CanvasRecorder {
    child: Child,
    stdin: Option<ChildStdin>,
    format: RecordingFormat,
    width: u32,
    height: u32,
    frames_written: u64,
    output: PathBuf,
}

impl CanvasRecorder {
    /// Probe for an encoder and start recording into `output_dir`.
    pub async fn start(width: u32, height: u32, output_dir: &Path) -> MediaResult<Self> {
        let format = probe_recording_format().await?;
        Self::start_with_format(width, height, output_dir, format).await
    }

    /// Start recording with a known-supported format.
    pub async fn start_with_format(
        width: u32,
        height: u32,
        output_dir: &Path,
        format: RecordingFormat,
    ) -> MediaResult<Self> {
        tokio::fs::create_dir_all(output_dir).await?;
        let output = output_dir.join(format!("recording-{}.{}", Uuid::new_v4(), format.extension));

        let size = format!("{width}x{height}");
        let mut child = Command::new("ffmpeg")
            .args([
                "-y",
                "-hide_banner",
                "-v",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &size,
                "-r",
                &RECORD_FPS.to_string(),
                "-i",
                "pipe:0",
                "-c:v",
                format.encoder,
                "-pix_fmt",
                "yuv420p",
            ])
            .arg(&output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MediaError::ffmpeg_failed(format!("spawn encoder: {e}"), None, None))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MediaError::internal("encoder stdin not captured"))?;

        info!(
            output = %output.display(),
            encoder = format.encoder,
            size = %size,
            "Recording started"
        );

        Ok(Self {
            child,
            stdin: Some(stdin),
            format,
            width,
            height,
            frames_written: 0,
            output,
        })
    }

    pub fn format(&self) -> RecordingFormat {
        self.format
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Append one composited frame.
    pub async fn write_frame(&mut self, frame: &RgbaImage) -> MediaResult<()> {
        let (w, h) = frame.dimensions();
        if (w, h) != (self.width, self.height) {
            return Err(MediaError::FrameSizeMismatch {
                expected_width: self.width,
                expected_height: self.height,
                width: w,
                height: h,
            });
        }

        let stdin = self.stdin.as_mut().ok_or(MediaError::RecorderClosed)?;
        stdin.write_all(frame.as_raw()).await?;
        self.frames_written += 1;
        Ok(())
    }

    /// Close the stream and finalize the file.
    pub async fn finish(mut self) -> MediaResult<RecordedVideo> {
        // Closing stdin signals end-of-stream to the encoder
        drop(self.stdin.take());

        let output = self
            .child
            .wait_with_output()
            .await
            .map_err(|e| MediaError::ffmpeg_failed(format!("wait encoder: {e}"), None, None))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(MediaError::ffmpeg_failed(
                "encoder exited with non-zero status",
                Some(stderr),
                output.status.code(),
            ));
        }

        debug!(frames = self.frames_written, path = %self.output.display(), "Recording finalized");

        Ok(RecordedVideo {
            path: self.output,
            format: self.format,
            frames: self.frames_written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_ALL: &str = "\
 Encoders:
 V....D libvpx               libvpx VP8 (codec vp8)
 V....D libvpx-vp9           libvpx VP9 (codec vp9)
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC
";

    const LISTING_H264_ONLY: &str = "\
 Encoders:
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC
";

    #[test]
    fn test_select_prefers_vp9() {
        assert_eq!(select_format(LISTING_ALL), Some(RecordingFormat::VP9_WEBM));
    }

    #[test]
    fn test_select_falls_back_in_order() {
        assert_eq!(
            select_format(LISTING_H264_ONLY),
            Some(RecordingFormat::H264_MP4)
        );
    }

    #[test]
    fn test_select_none_supported() {
        assert_eq!(select_format(" Encoders:\n V....D mjpeg  Motion JPEG\n"), None);
    }

    #[test]
    fn test_encoder_name_matches_whole_word() {
        // "libvpx-vp9" must not satisfy a probe for "libvpx"
        let vp9_only = " V....D libvpx-vp9           libvpx VP9 (codec vp9)\n";
        assert_eq!(select_format(vp9_only), Some(RecordingFormat::VP9_WEBM));
    }

    // End-to-end encode, skipped when ffmpeg is not installed.
    #[tokio::test]
    async fn test_record_and_finalize() {
        if which::which("ffmpeg").is_err() {
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let mut recorder = match CanvasRecorder::start(64, 48, dir.path()).await {
            Ok(r) => r,
            Err(MediaError::CodecUnsupported) => return,
            Err(e) => panic!("start failed: {e}"),
        };

        let frame = RgbaImage::from_pixel(64, 48, image::Rgba([120, 40, 220, 255]));
        for _ in 0..10 {
            recorder.write_frame(&frame).await.unwrap();
        }

        let video = recorder.finish().await.unwrap();
        assert_eq!(video.frames, 10);
        assert!(video.path.exists());
        assert!(std::fs::metadata(&video.path).unwrap().len() > 0);
    }

    #[tokio::test]
    async fn test_frame_size_mismatch_rejected() {
        if which::which("ffmpeg").is_err() {
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let mut recorder = match CanvasRecorder::start(64, 48, dir.path()).await {
            Ok(r) => r,
            Err(_) => return,
        };

        let wrong = RgbaImage::new(32, 32);
        assert!(matches!(
            recorder.write_frame(&wrong).await,
            Err(MediaError::FrameSizeMismatch { .. })
        ));
        let _ = recorder.finish().await;
    }
}
