//! Output surface seam.
//!
//! Wherever the pipeline shows a frame (kiosk display, debug dump, test
//! capture), it goes through `Surface`.

use async_trait::async_trait;
use image::RgbaImage;

use crate::error::MediaResult;

/// A place composited frames are presented.
#[async_trait]
pub trait Surface: Send {
    async fn present(&mut self, frame: &RgbaImage) -> MediaResult<()>;
}

/// Discards frames. Useful when only the recorded/captured output matters.
#[derive(Debug, Default)]
pub struct NullSurface;

#[async_trait]
impl Surface for NullSurface {
    async fn present(&mut self, _frame: &RgbaImage) -> MediaResult<()> {
        Ok(())
    }
}

/// Test surface that keeps every presented frame.
#[derive(Debug, Default)]
pub struct CollectingSurface {
    pub frames: Vec<RgbaImage>,
}

#[async_trait]
impl Surface for CollectingSurface {
    async fn present(&mut self, frame: &RgbaImage) -> MediaResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}
