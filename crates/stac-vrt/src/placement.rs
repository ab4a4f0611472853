//! Pixel-space placement of items inside the mosaic grid.

use stac_common::{ItemRef, Result, VrtError};

use crate::georef::GeoReference;
use crate::mosaic::MosaicGrid;

/// Where one item lands in the mosaic.
///
/// The destination window is in mosaic pixels; the source window is the whole
/// item, since nothing is cropped or resampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub item: ItemRef,
    pub dst_offset_x: u64,
    pub dst_offset_y: u64,
    pub dst_width: u64,
    pub dst_height: u64,
    pub src_width: u64,
    pub src_height: u64,
}

impl Placement {
    /// Exclusive right edge of the destination window.
    pub fn dst_right(&self) -> u64 {
        self.dst_offset_x + self.dst_width
    }

    /// Exclusive bottom edge of the destination window.
    pub fn dst_bottom(&self) -> u64 {
        self.dst_offset_y + self.dst_height
    }
}

/// Place one item on the grid.
///
/// Fails with `MisalignedGrid` when the item's corner does not fall on a grid
/// line within `alignment` pixels.
pub fn place(georef: &GeoReference, grid: &MosaicGrid, alignment: f64) -> Result<Placement> {
    let bbox = &georef.bbox;

    let corner_x = if grid.pixel_width > 0.0 {
        bbox.min_x
    } else {
        bbox.max_x
    };
    let corner_y = if grid.pixel_height < 0.0 {
        bbox.max_y
    } else {
        bbox.min_y
    };

    let offset_x = (corner_x - grid.origin_x) / grid.pixel_width;
    let offset_y = (corner_y - grid.origin_y) / grid.pixel_height;

    let rounded_x = offset_x.round();
    let rounded_y = offset_y.round();
    if (offset_x - rounded_x).abs() > alignment || (offset_y - rounded_y).abs() > alignment {
        return Err(VrtError::MisalignedGrid {
            item: georef.item.clone(),
            offset_x,
            offset_y,
        });
    }

    let placement = Placement {
        item: georef.item.clone(),
        dst_offset_x: rounded_x.max(0.0) as u64,
        dst_offset_y: rounded_y.max(0.0) as u64,
        dst_width: georef.shape.cols,
        dst_height: georef.shape.rows,
        src_width: georef.shape.cols,
        src_height: georef.shape.rows,
    };

    debug_assert!(
        placement.dst_right() <= grid.width_px && placement.dst_bottom() <= grid.height_px,
        "{} placed outside the mosaic grid",
        placement.item
    );

    Ok(placement)
}

/// Place every item, in input order.
pub fn place_all(
    refs: &[GeoReference],
    grid: &MosaicGrid,
    alignment: f64,
) -> Result<Vec<Placement>> {
    refs.iter().map(|r| place(r, grid, alignment)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mosaic::compute_grid;
    use crate::options::VrtOptions;
    use stac_common::{Epsg, GeoTransform, Shape};

    fn georef(index: usize, transform: GeoTransform, shape: Shape) -> GeoReference {
        GeoReference {
            item: ItemRef::new(index, format!("item-{index}")),
            epsg: Epsg(26917),
            transform,
            shape,
            bbox: transform.footprint(shape),
        }
    }

    #[test]
    fn test_adjacent_naip_items() {
        let refs = [
            georef(
                0,
                GeoTransform::new(0.6, 0.0, 530802.0, 0.0, -0.6, 2986692.0),
                Shape::new(512, 512),
            ),
            georef(
                1,
                GeoTransform::new(0.6, 0.0, 524604.0, 0.0, -0.6, 2986674.0),
                Shape::new(512, 512),
            ),
        ];
        let grid = compute_grid(&refs, &VrtOptions::default()).unwrap();
        let placements = place_all(&refs, &grid, 0.01).unwrap();

        assert_eq!(
            (placements[0].dst_offset_x, placements[0].dst_offset_y),
            (10330, 0)
        );
        assert_eq!(
            (placements[1].dst_offset_x, placements[1].dst_offset_y),
            (0, 30)
        );
        assert_eq!(placements[1].dst_width, 512);
        assert_eq!(placements[1].src_height, 512);
    }

    #[test]
    fn test_flipped_axes_offsets_are_non_negative() {
        // West-to-east columns reversed and south-up rows.
        let refs = [
            georef(
                0,
                GeoTransform::new(-2.0, 0.0, 100.0, 0.0, 2.0, 0.0),
                Shape::new(5, 5),
            ),
            georef(
                1,
                GeoTransform::new(-2.0, 0.0, 90.0, 0.0, 2.0, 10.0),
                Shape::new(5, 5),
            ),
        ];
        let grid = compute_grid(&refs, &VrtOptions::default()).unwrap();
        assert_eq!(grid.origin_x, 100.0);
        assert_eq!(grid.origin_y, 0.0);
        assert_eq!((grid.width_px, grid.height_px), (10, 10));

        let placements = place_all(&refs, &grid, 0.01).unwrap();
        assert_eq!((placements[0].dst_offset_x, placements[0].dst_offset_y), (0, 0));
        assert_eq!((placements[1].dst_offset_x, placements[1].dst_offset_y), (5, 5));
    }

    #[test]
    fn test_misaligned_item() {
        let refs = [
            georef(
                0,
                GeoTransform::new(1.0, 0.0, 0.0, 0.0, -1.0, 10.0),
                Shape::new(10, 10),
            ),
            georef(
                1,
                GeoTransform::new(1.0, 0.0, 5.25, 0.0, -1.0, 10.0),
                Shape::new(10, 10),
            ),
        ];
        let grid = compute_grid(&refs, &VrtOptions::default()).unwrap();

        let err = place_all(&refs, &grid, 0.01).unwrap_err();
        match err {
            VrtError::MisalignedGrid { item, offset_x, .. } => {
                assert_eq!(item.index, 1);
                assert!((offset_x - 5.25).abs() < 1e-9);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_windows_stay_inside_grid() {
        let refs = [
            georef(
                0,
                GeoTransform::new(0.6, 0.0, 530802.0, 0.0, -0.6, 2986692.0),
                Shape::new(12240, 11040),
            ),
            georef(
                1,
                GeoTransform::new(0.6, 0.0, 524604.0, 0.0, -0.6, 2986674.0),
                Shape::new(12230, 11030),
            ),
        ];
        let grid = compute_grid(&refs, &VrtOptions::default()).unwrap();
        for placement in place_all(&refs, &grid, 0.01).unwrap() {
            assert!(placement.dst_right() <= grid.width_px);
            assert!(placement.dst_bottom() <= grid.height_px);
        }
    }
}
