//! Bounding box geometry.
//!
//! Detection services report boxes as fractions of the image size. Cropping
//! needs absolute pixels, so [`BoundingBox::to_pixel_rect`] does the
//! conversion and [`PixelRect::fits_within`] decides whether the result can be
//! extracted at all.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A rectangle locating an object within an image.
///
/// Coordinates are normalized (0.0 to 1.0) when produced by a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    /// X coordinate of the top-left corner
    pub x: f64,
    /// Y coordinate of the top-left corner
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build a box from corner coordinates.
    pub fn from_corners(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x: x_min,
            y: y_min,
            width: x_max - x_min,
            height: y_max - y_min,
        }
    }

    /// Center point `(x, y)` in the box's own coordinate space.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Convert a normalized box into absolute pixel geometry.
    ///
    /// Each edge is floored independently, so width and height are the
    /// distance between floored edges rather than a floored width. Edges
    /// beyond `i64` saturate, and such boxes never fit an image.
    pub fn to_pixel_rect(&self, image_width: u32, image_height: u32) -> PixelRect {
        let w = f64::from(image_width);
        let h = f64::from(image_height);

        let left = (self.x * w).floor() as i64;
        let top = (self.y * h).floor() as i64;
        let right = ((self.x + self.width) * w).floor() as i64;
        let bottom = ((self.y + self.height) * h).floor() as i64;

        PixelRect {
            left,
            top,
            width: right.saturating_sub(left),
            height: bottom.saturating_sub(top),
        }
    }
}

/// Absolute crop rectangle in pixels.
///
/// Signed so that boxes falling off the top/left edge stay representable and
/// can be rejected instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PixelRect {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl PixelRect {
    /// True when the rectangle is non-empty and lies entirely inside the image.
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.left >= 0
            && self.top >= 0
            && self.left.saturating_add(self.width) <= i64::from(image_width)
            && self.top.saturating_add(self.height) <= i64::from(image_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_and_area() {
        let bbox = BoundingBox::new(0.3, 0.2, 0.1, 0.2);
        let (cx, cy) = bbox.center();
        assert!((cx - 0.35).abs() < 1e-9);
        assert!((cy - 0.3).abs() < 1e-9);
        assert!((bbox.area() - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_from_corners() {
        let bbox = BoundingBox::from_corners(0.1, 0.2, 0.5, 0.6);
        assert!((bbox.width - 0.4).abs() < 1e-9);
        assert!((bbox.height - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_to_pixel_rect_floors_edges() {
        let rect = BoundingBox::new(0.3, 0.2, 0.1, 0.2).to_pixel_rect(100, 50);
        assert_eq!(rect.left, 30);
        assert_eq!(rect.top, 10);
        assert_eq!(rect.width, 10);
        assert_eq!(rect.height, 10);
    }

    #[test]
    fn test_extreme_boxes_saturate() {
        let rect = BoundingBox::new(-1e300, 0.1, 2e300, 0.2).to_pixel_rect(100, 100);
        assert_eq!(rect.left, i64::MIN);
        assert_eq!(rect.width, i64::MAX);
        assert!(!rect.fits_within(100, 100));

        let far = BoundingBox::new(1e300, 1e300, 1e300, 1e300).to_pixel_rect(100, 100);
        assert!(!far.fits_within(100, 100));

        let nan = BoundingBox::new(f64::NAN, 0.1, 0.2, 0.2).to_pixel_rect(100, 100);
        assert!(!nan.fits_within(100, 100));
    }

    #[test]
    fn test_pixel_rect_bounds() {
        let inside = PixelRect { left: 0, top: 0, width: 100, height: 50 };
        assert!(inside.fits_within(100, 50));

        let overflow = PixelRect { left: 10, top: 0, width: 100, height: 50 };
        assert!(!overflow.fits_within(100, 50));

        let negative = PixelRect { left: -1, top: 0, width: 10, height: 10 };
        assert!(!negative.fits_within(100, 50));

        let empty = PixelRect { left: 5, top: 5, width: 0, height: 10 };
        assert!(!empty.fits_within(100, 50));
    }
}
