//! Per-tick frame compositor.
//!
//! One call composes one output frame: background layer, segmented camera
//! layer, overlay animation frame on top. The compositor holds no playback
//! state; the overlay cursor is advanced by its own clock task.
//!
//! Alignment invariants:
//! - The segmenter sees exactly the pixels that get drawn (same crop, same
//!   scale, same mirroring), so the mask can never slide off the person.
//! - The background buffer is opaque before the person is drawn, so mask
//!   edge noise can never punch transparent holes in the output.

use std::sync::Arc;

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use tracing::trace;

use booth_models::{BackgroundKind, NormalizedRect, Placement};

use crate::error::{MediaError, MediaResult};
use crate::segmentation::Segmenter;

/// Scene configuration for one session.
///
/// The per-artist/background-mode variations are all expressed here instead
/// of in separate pipeline implementations.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub background: BackgroundKind,
    /// Mirror the camera horizontally for a selfie feel. Applies to frame
    /// and mask together.
    pub mirror: bool,
    /// Camera layer scale + anchor
    pub placement: Placement,
    /// Optional sub-region of the camera frame to use; `None` means the
    /// full frame.
    pub mask_region: Option<NormalizedRect>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: BackgroundKind::studio_gray(),
            mirror: true,
            placement: Placement::default(),
            mask_region: None,
        }
    }
}

/// Composes camera frames into output frames.
pub struct Compositor {
    width: u32,
    height: u32,
    scene: SceneConfig,
    /// Background plate pre-resized to canvas size
    plate: Option<Arc<RgbaImage>>,
}

impl Compositor {
    /// Create a compositor for a fixed canvas size.
    ///
    /// `plate` must be provided when the scene background is
    /// `BackgroundKind::Image` and is resized to the canvas once, here,
    /// rather than per tick.
    pub fn new(
        width: u32,
        height: u32,
        scene: SceneConfig,
        plate: Option<Arc<RgbaImage>>,
    ) -> MediaResult<Self> {
        let plate = match (&scene.background, plate) {
            (BackgroundKind::Image(path), None) => {
                return Err(MediaError::internal(format!(
                    "scene wants background image {path} but no plate was loaded"
                )))
            }
            (BackgroundKind::Image(_), Some(img)) => {
                if img.dimensions() == (width, height) {
                    Some(img)
                } else {
                    Some(Arc::new(image::imageops::resize(
                        img.as_ref(),
                        width,
                        height,
                        FilterType::Triangle,
                    )))
                }
            }
            (_, _) => None,
        };

        Ok(Self {
            width,
            height,
            scene,
            plate,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Compose one frame.
    ///
    /// Returns `Ok(None)` when segmentation found no person this tick; the
    /// caller keeps its previous output instead of rendering a blank frame.
    pub async fn compose(
        &self,
        camera_frame: &RgbaImage,
        segmenter: &dyn Segmenter,
        overlay: Option<&RgbaImage>,
    ) -> MediaResult<Option<RgbaImage>> {
        let mut canvas = self.background_layer();

        // Crop, mirror, then scale the camera layer. Order matters: the
        // mask is computed from the final pixels.
        let mut cam = match self.scene.mask_region {
            Some(region) => crop_region(camera_frame, &region),
            None => camera_frame.clone(),
        };
        if self.scene.mirror {
            cam = image::imageops::flip_horizontal(&cam);
        }

        let (cam_w, cam_h) = cam.dimensions();
        let rect = self
            .scene
            .placement
            .resolve(self.width, self.height, cam_w, cam_h);
        let cam = if (cam_w, cam_h) == (rect.width, rect.height) {
            cam
        } else {
            image::imageops::resize(&cam, rect.width, rect.height, FilterType::Triangle)
        };

        if self.scene.background.replaces_background() {
            let mask = match segmenter.segment(&cam).await? {
                Some(mask) => mask,
                None => {
                    trace!("No person this tick, holding previous frame");
                    return Ok(None);
                }
            };
            draw_masked(&mut canvas, &cam, &mask, rect.x, rect.y);
        } else {
            image::imageops::overlay(&mut canvas, &cam, rect.x as i64, rect.y as i64);
        }

        if let Some(overlay) = overlay {
            if overlay.dimensions() == (self.width, self.height) {
                image::imageops::overlay(&mut canvas, overlay, 0, 0);
            } else {
                let scaled =
                    image::imageops::resize(overlay, self.width, self.height, FilterType::Triangle);
                image::imageops::overlay(&mut canvas, &scaled, 0, 0);
            }
        }

        Ok(Some(canvas))
    }

    /// The scene without a person: background plus overlay. Used before the
    /// first successful segmentation so the preview is never blank.
    pub fn background_only(&self, overlay: Option<&RgbaImage>) -> RgbaImage {
        let mut canvas = self.background_layer();
        if let Some(overlay) = overlay {
            if overlay.dimensions() == (self.width, self.height) {
                image::imageops::overlay(&mut canvas, overlay, 0, 0);
            } else {
                let scaled =
                    image::imageops::resize(overlay, self.width, self.height, FilterType::Triangle);
                image::imageops::overlay(&mut canvas, &scaled, 0, 0);
            }
        }
        canvas
    }

    /// Opaque background covering the whole canvas.
    fn background_layer(&self) -> RgbaImage {
        match &self.scene.background {
            BackgroundKind::Color([r, g, b]) => {
                RgbaImage::from_pixel(self.width, self.height, Rgba([*r, *g, *b, 255]))
            }
            BackgroundKind::Image(_) => {
                let plate = self.plate.as_ref().expect("plate checked at construction");
                plate.as_ref().clone()
            }
            BackgroundKind::None => {
                RgbaImage::from_pixel(self.width, self.height, Rgba([0, 0, 0, 255]))
            }
        }
    }
}

/// Crop a normalized sub-region out of a frame.
fn crop_region(frame: &RgbaImage, region: &NormalizedRect) -> RgbaImage {
    let (w, h) = frame.dimensions();
    let px = region.to_pixels(w, h);
    let x = px.x.min(w.saturating_sub(1));
    let y = px.y.min(h.saturating_sub(1));
    let width = px.width.min(w - x);
    let height = px.height.min(h - y);
    image::imageops::crop_imm(frame, x, y, width, height).to_image()
}

/// Draw `src` onto `dst` at `(x0, y0)`, keeping only pixels the mask marks
/// as person. The destination stays opaque everywhere because it starts as
/// an opaque background.
fn draw_masked(dst: &mut RgbaImage, src: &RgbaImage, mask: &crate::PersonMask, x0: u32, y0: u32) {
    let (src_w, src_h) = src.dimensions();
    let (dst_w, dst_h) = dst.dimensions();
    let (mask_w, mask_h) = mask.dimensions();
    debug_assert_eq!((src_w, src_h), (mask_w, mask_h));

    for y in 0..src_h.min(mask_h) {
        let dy = y0 + y;
        if dy >= dst_h {
            break;
        }
        for x in 0..src_w.min(mask_w) {
            let dx = x0 + x;
            if dx >= dst_w {
                break;
            }
            let alpha = mask.alpha_at(x, y) as u32;
            if alpha == 0 {
                continue;
            }
            let sp = src.get_pixel(x, y);
            if alpha == 255 {
                dst.put_pixel(dx, dy, Rgba([sp[0], sp[1], sp[2], 255]));
            } else {
                let dp = dst.get_pixel(dx, dy);
                let blend = |s: u8, d: u8| ((s as u32 * alpha + d as u32 * (255 - alpha)) / 255) as u8;
                dst.put_pixel(
                    dx,
                    dy,
                    Rgba([blend(sp[0], dp[0]), blend(sp[1], dp[1]), blend(sp[2], dp[2]), 255]),
                );
            }
        }
    }
}
