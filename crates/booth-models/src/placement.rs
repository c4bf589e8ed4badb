//! Compositor scene geometry: backgrounds, anchors, and placements.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A normalized rectangle (0.0 to 1.0) representing a relative region of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NormalizedRect {
    /// X coordinate of the top-left corner (0.0 = left, 1.0 = right)
    pub x: f64,
    /// Y coordinate of the top-left corner (0.0 = top, 1.0 = bottom)
    pub y: f64,
    /// Width of the rectangle (0.0 to 1.0)
    pub width: f64,
    /// Height of the rectangle (0.0 to 1.0)
    pub height: f64,
}

impl NormalizedRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// The whole frame.
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Check if the rectangle is valid (within 0.0-1.0 range).
    pub fn is_valid(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.x + self.width <= 1.001 // Allow small epsilon for float precision
            && self.y + self.height <= 1.001
    }

    /// Resolve to pixel coordinates within a `width` x `height` frame.
    pub fn to_pixels(&self, width: u32, height: u32) -> PixelRect {
        PixelRect {
            x: (self.x * width as f64).round() as u32,
            y: (self.y * height as f64).round() as u32,
            width: (self.width * width as f64).round().max(1.0) as u32,
            height: (self.height * height as f64).round().max(1.0) as u32,
        }
    }
}

/// A pixel-space rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Where a scaled layer is pinned within the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    #[default]
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    TopCenter,
    BottomCenter,
}

/// Scale + anchor for the camera layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Placement {
    /// Uniform scale relative to a fit-to-canvas size (1.0 = fill)
    pub scale: f64,
    pub anchor: Anchor,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            scale: 1.0,
            anchor: Anchor::Center,
        }
    }
}

impl Placement {
    pub fn new(scale: f64, anchor: Anchor) -> Self {
        Self { scale, anchor }
    }

    /// Resolve the destination rect for a `src_width` x `src_height` layer on
    /// a `canvas_width` x `canvas_height` canvas. The source aspect ratio is
    /// preserved; `scale` is applied to the fitted size.
    pub fn resolve(
        &self,
        canvas_width: u32,
        canvas_height: u32,
        src_width: u32,
        src_height: u32,
    ) -> PixelRect {
        let fit = (canvas_width as f64 / src_width as f64)
            .min(canvas_height as f64 / src_height as f64);
        let scale = fit * self.scale;
        let width = ((src_width as f64 * scale).round() as u32).max(1);
        let height = ((src_height as f64 * scale).round() as u32).max(1);

        let max_x = canvas_width.saturating_sub(width);
        let max_y = canvas_height.saturating_sub(height);
        let (x, y) = match self.anchor {
            Anchor::Center => (max_x / 2, max_y / 2),
            Anchor::TopLeft => (0, 0),
            Anchor::TopRight => (max_x, 0),
            Anchor::BottomLeft => (0, max_y),
            Anchor::BottomRight => (max_x, max_y),
            Anchor::TopCenter => (max_x / 2, 0),
            Anchor::BottomCenter => (max_x / 2, max_y),
        };

        PixelRect { x, y, width, height }
    }
}

/// Background layer behind the segmented person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundKind {
    /// Flat fill color (RGB)
    Color([u8; 3]),
    /// Static decoded image, path relative to the assets root
    Image(String),
    /// Keep the raw camera frame, no replacement
    None,
}

impl BackgroundKind {
    /// The booth's default studio backdrop.
    pub fn studio_gray() -> Self {
        BackgroundKind::Color([0x2d, 0x2d, 0x2d])
    }

    /// Whether this background needs segmentation at all.
    pub fn replaces_background(&self) -> bool {
        !matches!(self, BackgroundKind::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_rect_to_pixels() {
        let rect = NormalizedRect::new(0.25, 0.5, 0.5, 0.25);
        let px = rect.to_pixels(400, 800);
        assert_eq!(px, PixelRect { x: 100, y: 400, width: 200, height: 200 });
    }

    #[test]
    fn test_placement_fill_centered() {
        let rect = Placement::default().resolve(350, 600, 350, 600);
        assert_eq!(rect, PixelRect { x: 0, y: 0, width: 350, height: 600 });
    }

    #[test]
    fn test_placement_bottom_left_downscaled() {
        let placement = Placement::new(0.5, Anchor::BottomLeft);
        let rect = placement.resolve(400, 400, 200, 200);
        assert_eq!(rect.width, 200);
        assert_eq!(rect.height, 200);
        assert_eq!(rect.x, 0);
        assert_eq!(rect.y, 200);
    }

    #[test]
    fn test_background_kinds() {
        assert!(BackgroundKind::studio_gray().replaces_background());
        assert!(BackgroundKind::Image("bg.png".into()).replaces_background());
        assert!(!BackgroundKind::None.replaces_background());
    }
}
