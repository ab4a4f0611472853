//! Configuration for VRT construction.

use serde::{Deserialize, Serialize};
use stac_common::{Result, VrtError};

/// Options controlling how the mosaic and its VRT document are built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VrtOptions {
    /// GDAL data type name (e.g. "Byte", "UInt16", "Float32"), written verbatim.
    pub data_type: String,

    /// Block width of the output bands. Defaults to the mosaic width.
    pub block_width: Option<u32>,

    /// Block height of the output bands. Defaults to the mosaic height.
    pub block_height: Option<u32>,

    /// NoData value. When set, sources are written as `ComplexSource` with
    /// `NODATA` so nodata pixels of later items leave earlier ones visible.
    pub nodata: Option<f64>,

    /// Key of the asset holding the raster in every item.
    pub asset_key: String,

    /// 1-based source band indices, in output order. Defaults to every band
    /// described by `eo:bands` (one band if no item describes any).
    pub bands: Option<Vec<u32>>,

    /// Expected EPSG code for all items. Defaults to the first item's.
    pub epsg: Option<u32>,

    /// Expected pixel size `(x, y)` as positive magnitudes. Defaults to the
    /// first item's. Axis directions still come from the first item.
    pub resolution: Option<(f64, f64)>,

    /// Prefix `http://` and `https://` hrefs with `/vsicurl/`.
    pub vsicurl_prefix: bool,

    /// Numeric tolerances for the grid checks.
    pub tolerance: Tolerance,

    /// Item count from which projection metadata is resolved in parallel.
    pub parallel_threshold: usize,
}

impl Default for VrtOptions {
    fn default() -> Self {
        Self {
            data_type: "Byte".to_string(),
            block_width: None,
            block_height: None,
            nodata: None,
            asset_key: "image".to_string(),
            bands: None,
            epsg: None,
            resolution: None,
            vsicurl_prefix: true,
            tolerance: Tolerance::default(),
            parallel_threshold: 256,
        }
    }
}

impl VrtOptions {
    /// Options with the given data type and everything else defaulted.
    pub fn with_data_type(data_type: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
            ..Self::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.data_type.trim().is_empty() {
            return Err(VrtError::InvalidOptions("data_type must not be empty".to_string()));
        }

        if self.block_width == Some(0) || self.block_height == Some(0) {
            return Err(VrtError::InvalidOptions("block sizes must be > 0".to_string()));
        }

        if self.asset_key.is_empty() {
            return Err(VrtError::InvalidOptions("asset_key must not be empty".to_string()));
        }

        if let Some(bands) = &self.bands {
            if bands.is_empty() {
                return Err(VrtError::InvalidOptions("bands must not be empty".to_string()));
            }
            if bands.contains(&0) {
                return Err(VrtError::InvalidOptions("band indices are 1-based".to_string()));
            }
        }

        if let Some((res_x, res_y)) = self.resolution {
            if !(res_x.is_finite() && res_y.is_finite() && res_x > 0.0 && res_y > 0.0) {
                return Err(VrtError::InvalidOptions(format!(
                    "resolution must be finite and > 0, got ({}, {})",
                    res_x, res_y
                )));
            }
        }

        self.tolerance.validate()
    }
}

/// Tolerances for the resolution, alignment and rotation checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Maximum relative pixel size difference between items.
    pub resolution: f64,

    /// Maximum distance, in pixels, of an item offset from an integer.
    pub alignment: f64,

    /// Maximum rotation/shear term relative to the pixel size.
    pub rotation: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            resolution: 1e-6,
            alignment: 0.01,
            rotation: 1e-12,
        }
    }
}

impl Tolerance {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("resolution", self.resolution),
            ("alignment", self.alignment),
            ("rotation", self.rotation),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(VrtError::InvalidOptions(format!(
                    "tolerance.{} must be a finite value >= 0, got {}",
                    name, value
                )));
            }
        }

        if self.alignment >= 0.5 {
            return Err(VrtError::InvalidOptions(
                "tolerance.alignment must be < 0.5 pixel".to_string(),
            ));
        }

        Ok(())
    }
}
