//! STAC (SpatioTemporal Asset Catalog) data types.
//!
//! Lightweight serde models covering what a mosaic needs: item ids, the
//! projection extension properties, and asset hrefs with their `eo:bands`.
//! Projection fields stay untyped here; `stac_vrt::georef` builds the typed
//! view and reports missing or wrong-typed fields.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A STAC Item Collection (GeoJSON FeatureCollection), as returned by a
/// STAC API search.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacItemCollection {
    #[serde(rename = "type", default = "feature_collection_type")]
    pub type_: String,

    pub features: Vec<StacItem>,

    #[serde(default)]
    pub links: Vec<StacLink>,
}

impl StacItemCollection {
    /// Parse a FeatureCollection from JSON text.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A single STAC Item (GeoJSON Feature).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacItem {
    #[serde(rename = "type", default = "feature_type")]
    pub type_: String,

    /// Unique item identifier.
    pub id: String,

    /// Geometry as raw JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<serde_json::Value>,

    /// WGS84 bounding box `[west, south, east, north]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    pub properties: StacItemProperties,

    #[serde(default)]
    pub assets: HashMap<String, StacAsset>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    #[serde(default)]
    pub links: Vec<StacLink>,
}

impl StacItem {
    /// Get an asset by key.
    pub fn asset(&self, key: &str) -> Option<&StacAsset> {
        self.assets.get(key)
    }

    /// Get a property by name, treating JSON `null` as absent.
    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.extra.get(name).filter(|v| !v.is_null())
    }
}

/// STAC Item properties.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StacItemProperties {
    /// ISO 8601 datetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    /// Everything else, including the `proj:*` extension fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A single STAC Asset (file reference).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacAsset {
    /// URL or path of the asset file.
    pub href: String,

    /// Media type (e.g., `"image/tiff; application=geotiff; profile=cloud-optimized"`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,

    /// Per-band descriptions from the EO extension.
    #[serde(rename = "eo:bands", default, skip_serializing_if = "Option::is_none")]
    pub eo_bands: Option<Vec<EoBand>>,

    /// All other asset fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl StacAsset {
    /// Number of bands described by `eo:bands`, if the asset declares them.
    pub fn band_count(&self) -> Option<usize> {
        self.eo_bands.as_ref().map(Vec::len)
    }

    /// The `eo:bands` entry for a 1-based band index.
    pub fn band(&self, band: u32) -> Option<&EoBand> {
        let idx = usize::try_from(band).ok()?.checked_sub(1)?;
        self.eo_bands.as_ref()?.get(idx)
    }
}

/// One entry of an asset's `eo:bands` list.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EoBand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Common band name (`"red"`, `"nir"`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A STAC Link.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacLink {
    pub rel: String,

    pub href: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

fn feature_type() -> String {
    "Feature".to_string()
}

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}
