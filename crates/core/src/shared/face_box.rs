use serde::{Deserialize, Serialize};

/// Face bounding box in pixel coordinates, stored as `(top, right, bottom, left)`.
///
/// `right` and `bottom` are exclusive, so `width = right - left`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl FaceBox {
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Builds a box from corner coordinates `(x1, y1, x2, y2)`, rounding outward.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            top: y1.floor() as i32,
            right: x2.ceil() as i32,
            bottom: y2.ceil() as i32,
            left: x1.floor() as i32,
        }
    }

    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    pub fn area(&self) -> f64 {
        self.width() as f64 * self.height() as f64
    }

    /// Re-projects a box found at a reduced detection resolution.
    ///
    /// A box detected on a frame scaled by `s` maps back to full resolution
    /// through `factor = 1 / s`.
    pub fn scaled(&self, factor: f64) -> FaceBox {
        FaceBox {
            top: (self.top as f64 * factor) as i32,
            right: (self.right as f64 * factor) as i32,
            bottom: (self.bottom as f64 * factor) as i32,
            left: (self.left as f64 * factor) as i32,
        }
    }

    /// Clamps every edge into `[0, width] x [0, height]`.
    pub fn clamped(&self, width: u32, height: u32) -> FaceBox {
        let w = width as i32;
        let h = height as i32;
        FaceBox {
            top: self.top.clamp(0, h),
            right: self.right.clamp(0, w),
            bottom: self.bottom.clamp(0, h),
            left: self.left.clamp(0, w),
        }
    }

    /// Grows the box by `padding` pixels on every side, clamped to the frame.
    pub fn padded(&self, padding: u32, width: u32, height: u32) -> FaceBox {
        let p = padding as i32;
        FaceBox {
            top: self.top - p,
            right: self.right + p,
            bottom: self.bottom + p,
            left: self.left - p,
        }
        .clamped(width, height)
    }
}
