//! Build GDAL VRT mosaics from STAC items.
//!
//! The mosaic is derived purely from each item's projection extension
//! metadata (`proj:epsg`, `proj:transform`, `proj:shape`, `proj:bbox`); no
//! imagery is read and nothing is fetched.
//!
//! # Pipeline
//!
//! 1. [`georef`] resolves each item into a typed [`GeoReference`].
//! 2. [`mosaic`] reduces them into one [`MosaicGrid`].
//! 3. [`placement`] maps every item onto that grid.
//! 4. [`vrt`] renders the XML document.
//!
//! # Example
//!
//! ```ignore
//! let collection = StacItemCollection::from_json(&response_body)?;
//! let xml = stac_vrt::build_vrt(&collection.features, "Byte", Some(512), Some(512), None)?;
//! ```

pub mod georef;
pub mod mosaic;
pub mod options;
pub mod placement;
pub mod vrt;

pub use georef::{GeoOverrides, GeoReference};
pub use mosaic::{union_bbox, MosaicGrid};
pub use options::{Tolerance, VrtOptions};
pub use placement::Placement;
pub use stac_common::{
    BoundingBox, Epsg, GeoTransform, ItemRef, Result, Shape, StacItem, StacItemCollection,
    VrtError,
};

/// Build a VRT document for `items`.
///
/// Items paint in input order: where windows overlap, later items win.
pub fn build_vrt(
    items: &[StacItem],
    data_type: &str,
    block_width: Option<u32>,
    block_height: Option<u32>,
    nodata: Option<f64>,
) -> Result<String> {
    let options = VrtOptions {
        data_type: data_type.to_string(),
        block_width,
        block_height,
        nodata,
        ..VrtOptions::default()
    };
    build_vrt_with(items, &options)
}

/// Build a VRT document with full control over the options.
pub fn build_vrt_with(items: &[StacItem], options: &VrtOptions) -> Result<String> {
    build_vrt_with_overrides(items, options, &GeoOverrides::default())
}

/// Build a VRT document, replacing item geometry with caller-supplied values.
pub fn build_vrt_with_overrides(
    items: &[StacItem],
    options: &VrtOptions,
    overrides: &GeoOverrides,
) -> Result<String> {
    VrtPlan::new(items, options, overrides)?.render(items, options)
}

/// The geometry of a mosaic, computed but not yet rendered.
#[derive(Debug, Clone)]
pub struct VrtPlan {
    pub georefs: Vec<GeoReference>,
    pub grid: MosaicGrid,
    pub placements: Vec<Placement>,
}

impl VrtPlan {
    /// Resolve, reduce and place `items`.
    pub fn new(items: &[StacItem], options: &VrtOptions, overrides: &GeoOverrides) -> Result<Self> {
        if items.is_empty() {
            return Err(VrtError::EmptyInput);
        }
        options.validate()?;

        let georefs = georef::resolve_all(items, options, overrides)?;
        let grid = mosaic::compute_grid(&georefs, options)?;
        let placements = placement::place_all(&georefs, &grid, options.tolerance.alignment)?;

        Ok(Self {
            georefs,
            grid,
            placements,
        })
    }

    /// Render the plan for the same `items` it was built from.
    ///
    /// `options` are validated here too; they may differ from the ones the
    /// plan was built with.
    pub fn render(&self, items: &[StacItem], options: &VrtOptions) -> Result<String> {
        options.validate()?;
        if items.len() != self.placements.len() {
            return Err(VrtError::InvalidOptions(format!(
                "plan was built for {} items, got {}",
                self.placements.len(),
                items.len()
            )));
        }
        vrt::render(items, &self.placements, &self.grid, options)
    }

    /// CRS extent of all items.
    pub fn bbox(&self) -> Option<BoundingBox> {
        union_bbox(&self.georefs)
    }
}
