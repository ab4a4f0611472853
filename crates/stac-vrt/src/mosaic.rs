//! Mosaic grid computation.
//!
//! Reduces per-item geometry into one pixel grid that contains every item.
//! The reduction is over min/max, so the result does not depend on item order.

use tracing::{info, warn};

use stac_common::{BoundingBox, Epsg, GeoTransform, Result, VrtError};

use crate::georef::GeoReference;
use crate::options::VrtOptions;

/// The output raster grid shared by all items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MosaicGrid {
    pub epsg: Epsg,
    /// CRS x of the grid corner at pixel (0, 0).
    pub origin_x: f64,
    /// CRS y of the grid corner at pixel (0, 0).
    pub origin_y: f64,
    /// Signed pixel width (`a`); positive for west-to-east columns.
    pub pixel_width: f64,
    /// Signed pixel height (`e`); negative for north-up rasters.
    pub pixel_height: f64,
    pub width_px: u64,
    pub height_px: u64,
}

impl MosaicGrid {
    /// Affine transform of the mosaic (axis-aligned).
    pub fn geo_transform(&self) -> GeoTransform {
        GeoTransform::new(
            self.pixel_width,
            0.0,
            self.origin_x,
            0.0,
            self.pixel_height,
            self.origin_y,
        )
    }

    /// CRS extent covered by the grid, including any trailing partial pixel.
    pub fn bbox(&self) -> BoundingBox {
        let (x1, y1) = (self.origin_x, self.origin_y);
        let (x2, y2) = self
            .geo_transform()
            .apply(self.width_px as f64, self.height_px as f64);
        BoundingBox::new(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
    }
}

/// Union of all item bounding boxes, or `None` when `refs` is empty.
pub fn union_bbox(refs: &[GeoReference]) -> Option<BoundingBox> {
    refs.iter()
        .map(|r| r.bbox)
        .reduce(|acc, bbox| acc.union(&bbox))
}

/// Compute the mosaic grid for a set of resolved items.
///
/// The first item fixes the CRS and the pixel size unless `options.epsg` or
/// `options.resolution` set them; every item must match both.
pub fn compute_grid(refs: &[GeoReference], options: &VrtOptions) -> Result<MosaicGrid> {
    let first = refs.first().ok_or(VrtError::EmptyInput)?;
    let tolerance = options.tolerance;

    let epsg = options.epsg.map(Epsg).unwrap_or(first.epsg);
    let (first_x, first_y) = first.resolution();
    let (pixel_width, pixel_height) = match options.resolution {
        Some((res_x, res_y)) => (res_x.copysign(first_x), res_y.copysign(first_y)),
        None => (first_x, first_y),
    };

    for georef in refs {
        if georef.epsg != epsg {
            return Err(VrtError::CrsMismatch {
                item: georef.item.clone(),
                expected: epsg,
                found: georef.epsg,
            });
        }

        let transform = &georef.transform;
        if !transform.is_axis_aligned(tolerance.rotation) {
            return Err(VrtError::RotatedTransform {
                item: georef.item.clone(),
                b: transform.b,
                d: transform.d,
            });
        }

        let (res_x, res_y) = georef.resolution();
        if !same_resolution(res_x, pixel_width, tolerance.resolution)
            || !same_resolution(res_y, pixel_height, tolerance.resolution)
        {
            return Err(VrtError::ResolutionMismatch {
                item: georef.item.clone(),
                expected_x: pixel_width,
                expected_y: pixel_height,
                found_x: res_x,
                found_y: res_y,
            });
        }

        // A bbox override can disagree with shape * pixel size; such an item
        // would not fit the window the assembler gives it.
        let cols = georef.bbox.width() / pixel_width.abs();
        let rows = georef.bbox.height() / pixel_height.abs();
        if (cols - georef.shape.cols as f64).abs() > tolerance.alignment
            || (rows - georef.shape.rows as f64).abs() > tolerance.alignment
        {
            return Err(VrtError::ResolutionMismatch {
                item: georef.item.clone(),
                expected_x: pixel_width,
                expected_y: pixel_height,
                found_x: georef.bbox.width() / georef.shape.cols as f64,
                found_y: georef.bbox.height() / georef.shape.rows as f64,
            });
        }
    }

    let union = union_bbox(refs).ok_or(VrtError::EmptyInput)?;

    // Anchor at the corner every item lies "after" along both pixel axes, so
    // all offsets come out non-negative.
    let origin_x = if pixel_width > 0.0 {
        union.min_x
    } else {
        union.max_x
    };
    let origin_y = if pixel_height < 0.0 {
        union.max_y
    } else {
        union.min_y
    };

    let width_px = pixel_count(union.width(), pixel_width, tolerance.alignment);
    let height_px = pixel_count(union.height(), pixel_height, tolerance.alignment);

    if epsg.is_geographic() {
        warn!(%epsg, "Building a mosaic in a geographic CRS; pixel sizes are in degrees");
    }

    info!(
        %epsg,
        items = refs.len(),
        origin_x,
        origin_y,
        pixel_width,
        pixel_height,
        width_px,
        height_px,
        "Computed mosaic grid"
    );

    Ok(MosaicGrid {
        epsg,
        origin_x,
        origin_y,
        pixel_width,
        pixel_height,
        width_px,
        height_px,
    })
}

fn same_resolution(found: f64, expected: f64, relative: f64) -> bool {
    (found - expected).abs() <= relative * expected.abs()
}

/// Pixels needed to cover `span`, rounding outward.
///
/// Overshoot within `tolerance` pixels is floating-point noise, not a partial
/// pixel.
fn pixel_count(span: f64, pixel_size: f64, tolerance: f64) -> u64 {
    let pixels = span / pixel_size.abs();
    (pixels - tolerance).ceil().max(0.0) as u64
}
