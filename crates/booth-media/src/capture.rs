//! Capture controller: photo/video capture, review, and retake.
//!
//! Owns the capture state machine, the live capture artifact, and the
//! camera stream. At most one captured artifact exists at a time: retake
//! deletes the previous file before the pipeline can produce a new one.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::imageops::FilterType;
use image::RgbaImage;
use tracing::{debug, info, warn};
use uuid::Uuid;

use booth_models::{CaptureState, MediaKind};

use crate::assets::FrameSet;
use crate::camera::FrameSource;
use crate::clock::FrameCursor;
use crate::compositor::Compositor;
use crate::error::{MediaError, MediaResult};
use crate::recorder::CanvasRecorder;
use crate::segmentation::Segmenter;

/// Capture configuration.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Snapshot target resolution, independent of the preview canvas
    pub photo_width: u32,
    pub photo_height: u32,
    /// Settle delay before a snapshot so the newest composited frame
    /// (including the current overlay frame) is the one captured
    pub settle: Duration,
    /// Where capture artifacts are written
    pub output_dir: PathBuf,
}

impl CaptureConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            photo_width: 350,
            photo_height: 600,
            settle: Duration::from_millis(50),
            output_dir: output_dir.into(),
        }
    }

    pub fn with_photo_size(mut self, width: u32, height: u32) -> Self {
        self.photo_width = width;
        self.photo_height = height;
        self
    }
}

/// A captured artifact under review.
#[derive(Debug)]
pub struct CapturedMedia {
    pub kind: MediaKind,
    pub path: PathBuf,
    /// Encoded video frame count; 0 for photos
    pub frames: u64,
}

impl CapturedMedia {
    pub fn mime(&self) -> &'static str {
        self.kind.mime()
    }

    /// Delete the backing file. The filesystem analogue of revoking a
    /// blob URL: must happen before the next capture is created.
    pub fn release(self) -> MediaResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        debug!(path = %self.path.display(), "Capture artifact released");
        Ok(())
    }
}

/// Drives one session's capture phase.
pub struct CaptureController {
    config: CaptureConfig,
    state: CaptureState,
    camera: Box<dyn FrameSource>,
    segmenter: Arc<dyn Segmenter>,
    compositor: Compositor,
    overlay: FrameSet,
    cursor: Arc<FrameCursor>,
    /// Last successfully composited frame; held across no-detection ticks
    last_frame: Option<RgbaImage>,
    recorder: Option<CanvasRecorder>,
    captured: Option<CapturedMedia>,
}

impl CaptureController {
    pub fn new(
        config: CaptureConfig,
        camera: Box<dyn FrameSource>,
        segmenter: Arc<dyn Segmenter>,
        compositor: Compositor,
        overlay: FrameSet,
        cursor: Arc<FrameCursor>,
    ) -> Self {
        Self {
            config,
            state: CaptureState::Idle,
            camera,
            segmenter,
            compositor,
            overlay,
            cursor,
            last_frame: None,
            recorder: None,
            captured: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn captured(&self) -> Option<&CapturedMedia> {
        self.captured.as_ref()
    }

    pub fn cursor(&self) -> Arc<FrameCursor> {
        Arc::clone(&self.cursor)
    }

    fn set_state(&mut self, to: CaptureState) -> MediaResult<()> {
        self.state = self.state.transition_to(to)?;
        debug!(state = self.state.as_str(), "Capture state");
        Ok(())
    }

    /// Enter the live preview.
    pub fn begin_preview(&mut self) -> MediaResult<()> {
        self.set_state(CaptureState::Previewing)
    }

    /// Compose one tick: camera frame, mask, overlay. Returns the frame to
    /// present (and, while recording, to encode). On a no-detection tick
    /// the previous frame is returned unchanged; before the first
    /// detection, a person-less composite keeps the preview alive.
    pub async fn tick(&mut self) -> MediaResult<RgbaImage> {
        let frame = self.camera.next_frame().await?;
        let overlay_index = self.cursor.current(self.overlay.len());
        let overlay = (!self.overlay.is_empty()).then(|| self.overlay.frame(overlay_index).as_ref());

        if let Some(composed) = self
            .compositor
            .compose(&frame, self.segmenter.as_ref(), overlay)
            .await?
        {
            self.last_frame = Some(composed);
        }

        let frame = match &self.last_frame {
            Some(frame) => frame.clone(),
            None => self.compositor.background_only(overlay),
        };

        if let Some(recorder) = self.recorder.as_mut() {
            recorder.write_frame(&frame).await?;
        }

        Ok(frame)
    }

    /// Snapshot the live composite at the photo target resolution.
    pub async fn capture_photo(&mut self) -> MediaResult<&CapturedMedia> {
        self.set_state(CaptureState::CapturingPhoto)?;

        // Let the newest overlay frame land before freezing the image
        tokio::time::sleep(self.config.settle).await;
        let frame = match self.tick().await {
            Ok(frame) => frame,
            Err(e) => {
                self.state = CaptureState::Previewing;
                return Err(e);
            }
        };

        let snapshot = if frame.dimensions() == (self.config.photo_width, self.config.photo_height)
        {
            frame
        } else {
            image::imageops::resize(
                &frame,
                self.config.photo_width,
                self.config.photo_height,
                FilterType::Triangle,
            )
        };

        std::fs::create_dir_all(&self.config.output_dir)?;
        let path = self
            .config
            .output_dir
            .join(format!("photo-{}.png", Uuid::new_v4()));
        snapshot
            .save(&path)
            .map_err(|e| MediaError::internal(format!("encode snapshot: {e}")))?;

        info!(path = %path.display(), "Photo captured");
        self.captured = Some(CapturedMedia {
            kind: MediaKind::Image,
            path,
            frames: 0,
        });
        self.set_state(CaptureState::Reviewing)?;
        Ok(self.captured.as_ref().expect("just captured"))
    }

    /// Start encoding the composited stream.
    pub async fn start_recording(&mut self) -> MediaResult<()> {
        self.set_state(CaptureState::Recording)?;

        let (width, height) = self.compositor.dimensions();
        match CanvasRecorder::start(width, height, &self.config.output_dir).await {
            Ok(recorder) => {
                self.recorder = Some(recorder);
                Ok(())
            }
            Err(e) => {
                // Codec/ffmpeg trouble leaves the preview usable
                self.state = CaptureState::Previewing;
                Err(e)
            }
        }
    }

    /// Stop recording and finalize the file.
    pub async fn stop_recording(&mut self) -> MediaResult<&CapturedMedia> {
        let recorder = self.recorder.take().ok_or(MediaError::RecorderClosed)?;
        let video = recorder.finish().await?;

        info!(path = %video.path.display(), frames = video.frames, "Recording captured");
        self.captured = Some(CapturedMedia {
            kind: MediaKind::Video,
            path: video.path,
            frames: video.frames,
        });
        self.set_state(CaptureState::Reviewing)?;
        Ok(self.captured.as_ref().expect("just captured"))
    }

    /// Discard the reviewed capture and return to the live preview.
    pub async fn retake(&mut self) -> MediaResult<()> {
        self.set_state(CaptureState::Previewing)?;

        // Release the previous artifact before anything new can exist
        if let Some(media) = self.captured.take() {
            if let Err(e) = media.release() {
                warn!("Failed to release capture artifact: {e}");
            }
        }

        self.cursor.reset();
        self.last_frame = None;

        // Re-acquire the camera only if the stream was actually stopped
        if !self.camera.is_running() {
            self.camera.restart().await?;
        }
        Ok(())
    }

    /// Finish the session, handing the artifact to the share path and
    /// stopping the camera.
    pub async fn finish(&mut self) -> MediaResult<CapturedMedia> {
        self.set_state(CaptureState::Done)?;
        self.camera.stop().await?;
        self.captured
            .take()
            .ok_or_else(|| MediaError::internal("finished without a capture"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::SyntheticFrameSource;
    use crate::compositor::SceneConfig;
    use crate::segmentation::PersonMask;
    use async_trait::async_trait;
    use image::GrayImage;

    struct FullMaskSegmenter;

    #[async_trait]
    impl Segmenter for FullMaskSegmenter {
        async fn segment(&self, frame: &RgbaImage) -> MediaResult<Option<PersonMask>> {
            let (w, h) = frame.dimensions();
            let mut alpha = GrayImage::new(w, h);
            alpha.fill(255);
            Ok(Some(PersonMask::from_alpha(alpha)))
        }
    }

    struct BlindSegmenter;

    #[async_trait]
    impl Segmenter for BlindSegmenter {
        async fn segment(&self, _frame: &RgbaImage) -> MediaResult<Option<PersonMask>> {
            Ok(None)
        }
    }

    fn overlay_set(count: usize) -> FrameSet {
        let frames = (0..count)
            .map(|i| {
                Arc::new(RgbaImage::from_pixel(
                    8,
                    8,
                    image::Rgba([i as u8, 0, 0, 0]),
                ))
            })
            .collect::<Vec<_>>();
        FrameSet::from_frames(frames)
    }

    fn controller(
        dir: &std::path::Path,
        segmenter: Arc<dyn Segmenter>,
    ) -> CaptureController {
        let compositor =
            Compositor::new(8, 8, SceneConfig::default(), None).unwrap();
        CaptureController::new(
            CaptureConfig::new(dir).with_photo_size(8, 8),
            Box::new(SyntheticFrameSource::new(8, 8)),
            segmenter,
            compositor,
            overlay_set(4),
            FrameCursor::new(),
        )
    }

    #[tokio::test]
    async fn test_photo_capture_creates_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(dir.path(), Arc::new(FullMaskSegmenter));
        ctl.begin_preview().unwrap();

        let media = ctl.capture_photo().await.unwrap();
        assert_eq!(media.kind, MediaKind::Image);
        assert!(media.path.exists());
        assert_eq!(ctl.state(), CaptureState::Reviewing);
    }

    #[tokio::test]
    async fn test_retake_releases_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(dir.path(), Arc::new(FullMaskSegmenter));
        ctl.begin_preview().unwrap();

        let mut previous: Option<PathBuf> = None;
        for _ in 0..3 {
            let path = ctl.capture_photo().await.unwrap().path.clone();
            if let Some(old) = previous.replace(path.clone()) {
                assert!(!old.exists(), "previous artifact must be deleted");
            }
            assert!(path.exists());
            ctl.retake().await.unwrap();
            assert!(!path.exists(), "retake must release the artifact");
        }

        // After N retake cycles no artifacts remain on disk
        let remaining = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_retake_resets_cursor_and_restarts_camera() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(dir.path(), Arc::new(FullMaskSegmenter));
        ctl.begin_preview().unwrap();

        let cursor = ctl.cursor();
        cursor.advance(4);
        cursor.advance(4);

        ctl.capture_photo().await.unwrap();
        ctl.retake().await.unwrap();
        assert_eq!(cursor.current(4), 0);
        assert_eq!(ctl.state(), CaptureState::Previewing);
    }

    #[tokio::test]
    async fn test_no_detection_holds_last_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(dir.path(), Arc::new(BlindSegmenter));
        ctl.begin_preview().unwrap();

        // Never a blank frame: background-only composite before the first
        // detection, and identical output across consecutive blind ticks
        let first = ctl.tick().await.unwrap();
        let second = ctl.tick().await.unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
        assert!(first.pixels().all(|p| p[3] == 255));
    }

    #[tokio::test]
    async fn test_cannot_record_while_reviewing() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(dir.path(), Arc::new(FullMaskSegmenter));
        ctl.begin_preview().unwrap();
        ctl.capture_photo().await.unwrap();

        assert!(matches!(
            ctl.start_recording().await,
            Err(MediaError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_finish_stops_camera_and_yields_media() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(dir.path(), Arc::new(FullMaskSegmenter));
        ctl.begin_preview().unwrap();
        ctl.capture_photo().await.unwrap();

        let media = ctl.finish().await.unwrap();
        assert!(media.path.exists());
        assert_eq!(ctl.state(), CaptureState::Done);
        media.release().unwrap();
    }
}
