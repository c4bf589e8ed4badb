//! Camera frame sources.
//!
//! The kiosk reads its camera through ffmpeg's device demuxers, so the same
//! binary works against V4L2 on the kiosk hardware and AVFoundation during
//! development. Frames arrive as raw RGBA planes on stdout and are sliced by
//! the known frame byte size.

use std::process::Stdio;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// A source of camera frames.
///
/// The capture controller is the only mutator: it stops the stream when a
/// session ends and restarts it on retake. `restart` must reuse a stream
/// that is still running rather than re-opening the device.
#[async_trait]
pub trait FrameSource: Send {
    /// Frame dimensions (width, height).
    fn dimensions(&self) -> (u32, u32);

    /// Read the next frame. Blocks (asynchronously) until one is available.
    async fn next_frame(&mut self) -> MediaResult<RgbaImage>;

    /// Stop the stream and release the device.
    async fn stop(&mut self) -> MediaResult<()>;

    /// Re-acquire the stream if it was stopped; a running stream is reused.
    async fn restart(&mut self) -> MediaResult<()>;

    /// Whether the stream is currently open.
    fn is_running(&self) -> bool;
}

/// Camera configuration for the ffmpeg-backed source.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Device path (e.g. `/dev/video0`)
    pub device: String,
    /// Input format passed to `-f` (e.g. `v4l2`, `avfoundation`)
    pub input_format: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            input_format: "v4l2".to_string(),
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

/// FFmpeg-backed camera source emitting raw RGBA frames.
pub struct FfmpegCameraSource {
    config: CameraConfig,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    buf: Vec<u8>,
}

impl FfmpegCameraSource {
    pub fn new(config: CameraConfig) -> Self {
        let frame_bytes = (config.width * config.height * 4) as usize;
        Self {
            config,
            child: None,
            stdout: None,
            buf: vec![0u8; frame_bytes],
        }
    }

    /// Open the device and start streaming.
    pub async fn open(&mut self) -> MediaResult<()> {
        if self.child.is_some() {
            return Ok(());
        }

        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let size = format!("{}x{}", self.config.width, self.config.height);
        let mut child = Command::new("ffmpeg")
            .args([
                "-hide_banner",
                "-v",
                "error",
                "-f",
                &self.config.input_format,
                "-video_size",
                &size,
                "-framerate",
                &self.config.fps.to_string(),
                "-i",
                &self.config.device,
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MediaError::camera_denied(format!("spawn ffmpeg: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::camera_denied("camera stream has no stdout"))?;

        info!(device = %self.config.device, size = %size, "Camera stream opened");
        self.child = Some(child);
        self.stdout = Some(stdout);
        Ok(())
    }
}

#[async_trait]
impl FrameSource for FfmpegCameraSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    async fn next_frame(&mut self) -> MediaResult<RgbaImage> {
        let stdout = self
            .stdout
            .as_mut()
            .ok_or_else(|| MediaError::camera_denied("camera stream not open"))?;

        if let Err(e) = stdout.read_exact(&mut self.buf).await {
            // EOF means the device closed underneath us (unplugged, or
            // permission revoked mid-session)
            return Err(MediaError::camera_denied(format!("camera read: {e}")));
        }

        RgbaImage::from_raw(self.config.width, self.config.height, self.buf.clone())
            .ok_or_else(|| MediaError::internal("camera frame buffer size mismatch"))
    }

    async fn stop(&mut self) -> MediaResult<()> {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill camera process: {e}");
            }
            let _ = child.wait().await;
            debug!("Camera stream stopped");
        }
        Ok(())
    }

    async fn restart(&mut self) -> MediaResult<()> {
        if self.is_running() {
            debug!("Camera stream still running, reusing");
            return Ok(());
        }
        self.open().await
    }

    fn is_running(&self) -> bool {
        self.child.is_some()
    }
}

/// Deterministic frame source for tests: a dark field with a bright square
/// that advances one pixel per frame.
pub struct SyntheticFrameSource {
    width: u32,
    height: u32,
    tick: u32,
    running: bool,
}

impl SyntheticFrameSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tick: 0,
            running: true,
        }
    }

    /// The frame that `next_frame` would produce at a given tick.
    pub fn frame_at(&self, tick: u32) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(self.width, self.height, Rgba([10, 10, 10, 255]));
        let size = (self.width / 4).max(1);
        let x0 = (tick % self.width.saturating_sub(size).max(1)) as i64;
        let y0 = (self.height / 3) as i64;
        for y in 0..size as i64 {
            for x in 0..size as i64 {
                let (px, py) = ((x0 + x) as u32, (y0 + y) as u32);
                if px < self.width && py < self.height {
                    img.put_pixel(px, py, Rgba([230, 200, 150, 255]));
                }
            }
        }
        img
    }
}

#[async_trait]
impl FrameSource for SyntheticFrameSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    async fn next_frame(&mut self) -> MediaResult<RgbaImage> {
        if !self.running {
            return Err(MediaError::camera_denied("synthetic stream stopped"));
        }
        let frame = self.frame_at(self.tick);
        self.tick = self.tick.wrapping_add(1);
        Ok(frame)
    }

    async fn stop(&mut self) -> MediaResult<()> {
        self.running = false;
        Ok(())
    }

    async fn restart(&mut self) -> MediaResult<()> {
        self.running = true;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_synthetic_frames_are_deterministic() {
        let mut source = SyntheticFrameSource::new(64, 48);
        let expected = source.frame_at(0);
        let frame = source.next_frame().await.unwrap();
        assert_eq!(frame.as_raw(), expected.as_raw());
    }

    #[tokio::test]
    async fn test_stop_then_restart() {
        let mut source = SyntheticFrameSource::new(16, 16);
        source.stop().await.unwrap();
        assert!(!source.is_running());
        assert!(source.next_frame().await.is_err());

        source.restart().await.unwrap();
        assert!(source.is_running());
        assert!(source.next_frame().await.is_ok());
    }
}
