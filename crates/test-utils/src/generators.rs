//! Generators for synthetic, grid-aligned STAC item layouts.
//!
//! Items are laid out as a `tiles_y` x `tiles_x` checkerboard of equal
//! north-up tiles, so every expected pixel offset is known exactly.

use stac_common::StacItem;

use crate::fixtures::ItemBuilder;

/// Layout of a tiled item set.
#[derive(Debug, Clone, Copy)]
pub struct TileLayout {
    pub epsg: u32,
    /// CRS x of the top-left corner of tile (0, 0).
    pub origin_x: f64,
    /// CRS y of the top-left corner of tile (0, 0).
    pub origin_y: f64,
    pub resolution: f64,
    /// Tile size in pixels (square).
    pub tile_px: u64,
    pub tiles_x: u64,
    pub tiles_y: u64,
}

impl Default for TileLayout {
    fn default() -> Self {
        Self {
            epsg: 32617,
            origin_x: 500000.0,
            origin_y: 4000000.0,
            resolution: 10.0,
            tile_px: 256,
            tiles_x: 3,
            tiles_y: 2,
        }
    }
}

impl TileLayout {
    /// Pixel offset of tile (`tx`, `ty`) in the full mosaic.
    pub fn tile_offset(&self, tx: u64, ty: u64) -> (u64, u64) {
        (tx * self.tile_px, ty * self.tile_px)
    }

    /// Expected mosaic size in pixels.
    pub fn mosaic_size(&self) -> (u64, u64) {
        (self.tiles_x * self.tile_px, self.tiles_y * self.tile_px)
    }

    /// Affine transform of tile (`tx`, `ty`).
    pub fn tile_transform(&self, tx: u64, ty: u64) -> [f64; 6] {
        let span = self.tile_px as f64 * self.resolution;
        [
            self.resolution,
            0.0,
            self.origin_x + tx as f64 * span,
            0.0,
            -self.resolution,
            self.origin_y - ty as f64 * span,
        ]
    }
}

/// Creates one item per tile, in row-major order (`tile_{ty}_{tx}`).
///
/// # Example
///
/// ```
/// use test_utils::{create_tiled_items, TileLayout};
///
/// let items = create_tiled_items(&TileLayout::default());
/// assert_eq!(items.len(), 6);
/// assert_eq!(items[4].id, "tile_1_1");
/// ```
pub fn create_tiled_items(layout: &TileLayout) -> Vec<StacItem> {
    let mut items = Vec::with_capacity((layout.tiles_x * layout.tiles_y) as usize);
    for ty in 0..layout.tiles_y {
        for tx in 0..layout.tiles_x {
            let item = ItemBuilder::new(&format!("tile_{}_{}", ty, tx))
                .epsg(layout.epsg)
                .transform(layout.tile_transform(tx, ty))
                .shape(layout.tile_px, layout.tile_px)
                .build();
            items.push(item);
        }
    }
    items
}
