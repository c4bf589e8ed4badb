#![deny(unreachable_patterns)]
//! Live compositing and capture pipeline for the FanBooth kiosk.
//!
//! This crate provides:
//! - Preloaded overlay/background asset cache with an explicit lifecycle
//! - Camera frame sources (ffmpeg rawvideo ingestion, synthetic for tests)
//! - Person segmentation behind a trait (ONNX Runtime implementation)
//! - The per-tick compositor (background, masked person, overlay layers)
//! - A ~30 Hz tick scheduler with cooperative cancellation
//! - The spin-phase outcome randomizer
//! - Canvas recording via FFmpeg with encoder capability probing
//! - The capture controller state machine (photo / video / retake)

pub mod assets;
pub mod camera;
pub mod capture;
pub mod clock;
pub mod compositor;
pub mod error;
pub mod recorder;
pub mod segmentation;
pub mod spin;
pub mod surface;

pub use assets::{AssetCache, AssetCacheConfig, FrameSet};
pub use camera::{CameraConfig, FfmpegCameraSource, FrameSource, SyntheticFrameSource};
pub use capture::{CaptureConfig, CaptureController, CapturedMedia};
pub use clock::{FrameCursor, Scheduler, TICK_PERIOD};
pub use compositor::{Compositor, SceneConfig};
pub use error::{MediaError, MediaResult};
pub use recorder::{probe_recording_format, CanvasRecorder, RecordedVideo};
pub use segmentation::{
    InternalResolution, OrtSegmenter, PersonMask, Segmenter, SegmenterConfig,
};
pub use spin::{Outcome, SpinPolicy, SpinRunner};
pub use surface::{NullSurface, Surface};
