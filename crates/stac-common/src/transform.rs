//! Affine pixel-to-CRS transforms and raster shapes.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Raster dimensions in pixels, in `proj:shape` order (rows first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub rows: u64,
    pub cols: u64,
}

impl Shape {
    pub fn new(rows: u64, cols: u64) -> Self {
        Self { rows, cols }
    }

    /// Parse a `proj:shape` pair `[rows, cols]`.
    pub fn from_slice(values: &[u64]) -> Option<Self> {
        match *values {
            [rows, cols] => Some(Self::new(rows, cols)),
            _ => None,
        }
    }

    /// Check if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

/// Affine transform from pixel (col, row) to CRS (x, y):
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
///
/// Coefficient order follows `proj:transform` (and the `affine` convention),
/// not GDAL's `GeoTransform` order. Use [`GeoTransform::to_gdal`] for the latter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl GeoTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Parse a 6-element `(a, b, c, d, e, f)` or 9-element (full 3x3 matrix)
    /// sequence. The last row of a 3x3 matrix must be `(0, 0, 1)`.
    pub fn from_slice(values: &[f64]) -> Result<Self, TransformError> {
        match *values {
            [a, b, c, d, e, f] => Ok(Self::new(a, b, c, d, e, f)),
            [a, b, c, d, e, f, g, h, i] => {
                if g != 0.0 || h != 0.0 || i != 1.0 {
                    return Err(TransformError::NotAffine([g, h, i]));
                }
                Ok(Self::new(a, b, c, d, e, f))
            }
            _ => Err(TransformError::InvalidLength(values.len())),
        }
    }

    /// North-up transform that stretches `shape` over `bbox`.
    pub fn from_bbox(bbox: &BoundingBox, shape: Shape) -> Self {
        let res_x = bbox.width() / shape.cols as f64;
        let res_y = bbox.height() / shape.rows as f64;
        Self::new(res_x, 0.0, bbox.min_x, 0.0, -res_y, bbox.max_y)
    }

    /// Map a pixel-space position to CRS coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// CRS bounding box of a raster of `shape` under this transform.
    ///
    /// All four corners are transformed, so flipped axes and rotations are
    /// handled without assuming north-up.
    pub fn footprint(&self, shape: Shape) -> BoundingBox {
        let cols = shape.cols as f64;
        let rows = shape.rows as f64;
        let corners = [(0.0, 0.0), (cols, 0.0), (0.0, rows), (cols, rows)];

        let (x0, y0) = self.apply(0.0, 0.0);
        BoundingBox::from_points(corners.iter().map(|&(col, row)| self.apply(col, row)))
            .unwrap_or_else(|| BoundingBox::new(x0, y0, x0, y0))
    }

    /// Whether the rotation terms vanish relative to the pixel size.
    pub fn is_axis_aligned(&self, tolerance: f64) -> bool {
        let scale = self.a.abs().max(self.e.abs());
        self.b.abs() <= tolerance * scale && self.d.abs() <= tolerance * scale
    }

    /// Coefficients in GDAL `GeoTransform` order: `(c, a, b, f, d, e)`.
    pub fn to_gdal(&self) -> [f64; 6] {
        [self.c, self.a, self.b, self.f, self.d, self.e]
    }

    /// Inverse of [`GeoTransform::to_gdal`].
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self::new(gt[1], gt[2], gt[0], gt[4], gt[5], gt[3])
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("expected 6 or 9 transform coefficients, got {0}")]
    InvalidLength(usize),

    #[error("last matrix row must be (0, 0, 1), got {0:?}")]
    NotAffine([f64; 3]),
}
