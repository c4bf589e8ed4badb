//! Person segmentation behind a trait seam.
//!
//! The compositor only sees `Segmenter`; the production implementation wraps
//! a pretrained person-segmentation ONNX model through ONNX Runtime.
//! Inference runs under `spawn_blocking` so a slow model never stalls the
//! tick loop.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::imageops::FilterType;
use image::{GrayImage, RgbaImage};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Internal inference resolution: the accuracy/latency trade-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalResolution {
    Low,
    Medium,
    High,
}

impl InternalResolution {
    /// Longest side of the frame handed to the model.
    fn max_side(&self) -> u32 {
        match self {
            InternalResolution::Low => 256,
            InternalResolution::Medium => 512,
            InternalResolution::High => 768,
        }
    }

    /// Inference dimensions for a frame, aspect preserved.
    fn infer_size(&self, width: u32, height: u32) -> (u32, u32) {
        let max_side = self.max_side();
        let longest = width.max(height);
        if longest <= max_side {
            return (width, height);
        }
        let scale = max_side as f64 / longest as f64;
        (
            ((width as f64 * scale).round() as u32).max(1),
            ((height as f64 * scale).round() as u32).max(1),
        )
    }
}

/// Segmenter configuration.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    pub resolution: InternalResolution,
    /// Probability above which a pixel counts as person
    pub threshold: f32,
    /// Minimum person-pixel fraction below which the result is treated as
    /// "no confident detection"
    pub min_coverage: f32,
    /// Name of the model's probability-map output
    pub output_name: String,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            resolution: InternalResolution::High,
            threshold: 0.8,
            min_coverage: 0.01,
            output_name: "output".to_string(),
        }
    }
}

impl SegmenterConfig {
    pub fn with_resolution(mut self, resolution: InternalResolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }
}

/// A per-frame person mask at frame resolution.
///
/// Transient: produced for one tick, consumed by the compositor in the same
/// tick, never persisted.
#[derive(Debug, Clone)]
pub struct PersonMask {
    alpha: GrayImage,
}

impl PersonMask {
    pub fn from_alpha(alpha: GrayImage) -> Self {
        Self { alpha }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.alpha.dimensions()
    }

    /// Mask opacity at a pixel, 0 = background, 255 = person.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.alpha.get_pixel(x, y)[0]
    }

    /// Fraction of pixels classified as person.
    pub fn coverage(&self) -> f64 {
        let total = self.alpha.len() as f64;
        if total == 0.0 {
            return 0.0;
        }
        let person = self.alpha.pixels().filter(|p| p[0] > 0).count() as f64;
        person / total
    }

    /// Mirror the mask horizontally. Must be applied whenever the frame it
    /// belongs to is mirrored, or the composite misaligns.
    pub fn flip_horizontal(&self) -> Self {
        Self {
            alpha: image::imageops::flip_horizontal(&self.alpha),
        }
    }
}

/// `segment(frame) -> mask` seam.
#[async_trait]
pub trait Segmenter: Send + Sync {
    /// Segment a frame. `Ok(None)` means no confident person detection; the
    /// caller should hold its previous composited output rather than render
    /// a blank frame.
    async fn segment(&self, frame: &RgbaImage) -> MediaResult<Option<PersonMask>>;
}

/// ONNX Runtime-backed person segmenter.
///
/// Expects a single-input model producing a probability map shaped
/// `[1, 1, H, W]` (or `[1, H, W]`), person = high.
pub struct OrtSegmenter {
    session: Arc<Mutex<Session>>,
    config: SegmenterConfig,
}

impl OrtSegmenter {
    /// Load the model from disk.
    pub fn load(model_path: &Path, config: SegmenterConfig) -> MediaResult<Self> {
        if !model_path.exists() {
            return Err(MediaError::SegmenterUnavailable(format!(
                "model not found at {}",
                model_path.display()
            )));
        }

        let model_bytes = std::fs::read(model_path)
            .map_err(|e| MediaError::SegmenterUnavailable(format!("read model file: {e}")))?;

        let session = Session::builder()
            .map_err(|e| MediaError::SegmenterUnavailable(format!("session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| MediaError::SegmenterUnavailable(format!("opt level: {e}")))?
            .commit_from_memory(model_bytes.as_slice())
            .map_err(|e| MediaError::SegmenterUnavailable(format!("load model: {e}")))?;

        info!(
            model = %model_path.display(),
            resolution = ?config.resolution,
            threshold = config.threshold,
            "Segmentation model loaded"
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            config,
        })
    }

    fn run_inference(
        session: &Arc<Mutex<Session>>,
        config: &SegmenterConfig,
        frame: RgbaImage,
    ) -> MediaResult<Option<PersonMask>> {
        let (frame_w, frame_h) = frame.dimensions();
        let (inf_w, inf_h) = config.resolution.infer_size(frame_w, frame_h);

        let resized = if (inf_w, inf_h) == (frame_w, frame_h) {
            frame
        } else {
            image::imageops::resize(&frame, inf_w, inf_h, FilterType::Triangle)
        };

        let tensor = rgba_to_nchw_tensor(&resized)?;

        let mut session = session
            .lock()
            .map_err(|_| MediaError::inference("segmentation session poisoned"))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| MediaError::inference(format!("run failed: {e}")))?;

        let output = outputs
            .get(config.output_name.as_str())
            .ok_or_else(|| {
                MediaError::inference(format!("model has no output named {}", config.output_name))
            })?;

        let probability = extract_probability_map(output, inf_w, inf_h)?;

        // Threshold to a hard mask at inference resolution
        let mut mask = GrayImage::new(inf_w, inf_h);
        for (i, p) in probability.iter().enumerate() {
            if *p >= config.threshold {
                let (x, y) = (i as u32 % inf_w, i as u32 / inf_w);
                mask.put_pixel(x, y, image::Luma([255]));
            }
        }

        let mask = if (inf_w, inf_h) == (frame_w, frame_h) {
            mask
        } else {
            image::imageops::resize(&mask, frame_w, frame_h, FilterType::Nearest)
        };

        let mask = PersonMask::from_alpha(mask);
        if mask.coverage() < config.min_coverage as f64 {
            debug!(coverage = mask.coverage(), "No confident person detection");
            return Ok(None);
        }

        Ok(Some(mask))
    }
}

#[async_trait]
impl Segmenter for OrtSegmenter {
    async fn segment(&self, frame: &RgbaImage) -> MediaResult<Option<PersonMask>> {
        let session = Arc::clone(&self.session);
        let config = self.config.clone();
        let frame = frame.clone();

        tokio::task::spawn_blocking(move || Self::run_inference(&session, &config, frame))
            .await
            .map_err(|e| MediaError::inference(format!("inference task: {e}")))?
    }
}

/// Convert an RGBA frame to a `[1, 3, H, W]` tensor normalized to [0, 1].
fn rgba_to_nchw_tensor(frame: &RgbaImage) -> MediaResult<Value> {
    let (w, h) = frame.dimensions();
    let (w, h) = (w as usize, h as usize);

    let mut chw = Vec::with_capacity(3 * h * w);
    let data = frame.as_raw();
    // HWC (RGBA) -> CHW (RGB), alpha dropped
    for c in 0..3 {
        for y in 0..h {
            for x in 0..w {
                let idx = (y * w + x) * 4 + c;
                chw.push(data[idx] as f32 / 255.0);
            }
        }
    }

    let shape = vec![1usize, 3, h, w];
    Tensor::from_array((shape, chw.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| MediaError::inference(format!("tensor: {e}")))
}

/// Pull a `width * height` probability map out of the model output.
fn extract_probability_map(output: &Value, width: u32, height: u32) -> MediaResult<Vec<f32>> {
    let (shape, data) = output
        .try_extract_tensor::<f32>()
        .map_err(|e| MediaError::inference(format!("extract: {e}")))?;

    let expected = (width * height) as usize;
    // Accept [1,1,H,W], [1,H,W], or [H,W]
    let total: usize = (0..shape.len()).map(|i| shape[i] as usize).product();
    if total != expected || data.len() < expected {
        return Err(MediaError::inference(format!(
            "unexpected mask shape {:?} for {}x{}",
            shape, width, height
        )));
    }

    Ok(data[..expected].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_size_caps_longest_side() {
        let (w, h) = InternalResolution::Low.infer_size(1280, 720);
        assert_eq!(w, 256);
        assert_eq!(h, 144);

        // Already small frames pass through
        assert_eq!(InternalResolution::High.infer_size(320, 240), (320, 240));
    }

    #[test]
    fn test_mask_coverage() {
        let mut alpha = GrayImage::new(10, 10);
        for x in 0..5 {
            for y in 0..10 {
                alpha.put_pixel(x, y, image::Luma([255]));
            }
        }
        let mask = PersonMask::from_alpha(alpha);
        assert!((mask.coverage() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_mask_flip_tracks_frame_mirroring() {
        let mut alpha = GrayImage::new(4, 1);
        alpha.put_pixel(0, 0, image::Luma([255]));
        let mask = PersonMask::from_alpha(alpha);
        let flipped = mask.flip_horizontal();
        assert_eq!(flipped.alpha_at(3, 0), 255);
        assert_eq!(flipped.alpha_at(0, 0), 0);
    }

    #[test]
    fn test_threshold_clamped() {
        let config = SegmenterConfig::default().with_threshold(1.7);
        assert!((config.threshold - 1.0).abs() < f32::EPSILON);
    }
}
