//! Common test fixtures for stac-vrt tests.
//!
//! Items are built as JSON and deserialized, so fixtures exercise the same
//! serde path as real STAC API responses.

use serde_json::{json, Map, Value};
use stac_common::StacItem;

/// Two NAIP tiles (EPSG:26917, 0.6 m) that overlap by a few hundred meters.
pub mod naip {
    pub const EPSG: u32 = 26917;

    /// `m_2608005_ne_17_060_20191215`
    pub const NE_TRANSFORM: [f64; 6] = [0.6, 0.0, 530802.0, 0.0, -0.6, 2986692.0];
    pub const NE_SHAPE: (u64, u64) = (12240, 11040);
    pub const NE_BBOX: [f64; 4] = [530802.0, 2979348.0, 537426.0, 2986692.0];

    /// `m_2608005_nw_17_060_20191215`
    pub const NW_TRANSFORM: [f64; 6] = [0.6, 0.0, 524604.0, 0.0, -0.6, 2986674.0];
    pub const NW_SHAPE: (u64, u64) = (12230, 11030);
    pub const NW_BBOX: [f64; 4] = [524604.0, 2979336.0, 531222.0, 2986674.0];

    pub const BAND_NAMES: [&str; 4] = ["Red", "Green", "Blue", "NIR"];
}

/// Builder for a single STAC item with projection metadata.
///
/// Defaults to a 4-band NAIP-like `image` asset at
/// `https://example.com/{id}.tif`.
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    id: String,
    properties: Map<String, Value>,
    assets: Map<String, Value>,
}

impl ItemBuilder {
    pub fn new(id: &str) -> Self {
        let mut builder = Self {
            id: id.to_string(),
            properties: Map::new(),
            assets: Map::new(),
        };
        builder.properties.insert(
            "datetime".to_string(),
            json!("2019-12-15T00:00:00Z"),
        );
        builder.image(&format!("https://example.com/{}.tif", id), &naip::BAND_NAMES)
    }

    /// Start from one of the NAIP fixture tiles.
    pub fn naip_ne() -> Self {
        Self::new("m_2608005_ne_17_060_20191215")
            .epsg(naip::EPSG)
            .transform(naip::NE_TRANSFORM)
            .shape(naip::NE_SHAPE.0, naip::NE_SHAPE.1)
    }

    pub fn naip_nw() -> Self {
        Self::new("m_2608005_nw_17_060_20191215")
            .epsg(naip::EPSG)
            .transform(naip::NW_TRANSFORM)
            .shape(naip::NW_SHAPE.0, naip::NW_SHAPE.1)
    }

    pub fn epsg(self, code: u32) -> Self {
        self.property("proj:epsg", json!(code))
    }

    pub fn transform(self, transform: [f64; 6]) -> Self {
        self.property("proj:transform", json!(transform))
    }

    pub fn shape(self, rows: u64, cols: u64) -> Self {
        self.property("proj:shape", json!([rows, cols]))
    }

    pub fn proj_bbox(self, bbox: [f64; 4]) -> Self {
        self.property("proj:bbox", json!(bbox))
    }

    /// Set an arbitrary property.
    pub fn property(mut self, name: &str, value: Value) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    /// Remove a property.
    pub fn without(mut self, name: &str) -> Self {
        self.properties.remove(name);
        self
    }

    /// Replace the `image` asset.
    pub fn image(self, href: &str, band_names: &[&str]) -> Self {
        self.asset("image", href, band_names)
    }

    /// Add or replace an asset. An empty `band_names` omits `eo:bands`.
    pub fn asset(mut self, key: &str, href: &str, band_names: &[&str]) -> Self {
        let mut asset = json!({
            "href": href,
            "type": "image/tiff; application=geotiff; profile=cloud-optimized",
            "roles": ["data"],
        });
        if !band_names.is_empty() {
            let bands: Vec<Value> = band_names
                .iter()
                .map(|name| json!({"name": name, "common_name": name.to_lowercase()}))
                .collect();
            asset["eo:bands"] = Value::Array(bands);
        }
        self.assets.insert(key.to_string(), asset);
        self
    }

    pub fn without_asset(mut self, key: &str) -> Self {
        self.assets.remove(key);
        self
    }

    pub fn to_json(&self) -> Value {
        json!({
            "type": "Feature",
            "stac_version": "1.0.0",
            "id": self.id,
            "properties": Value::Object(self.properties.clone()),
            "assets": Value::Object(self.assets.clone()),
            "links": [],
        })
    }

    pub fn build(&self) -> StacItem {
        serde_json::from_value(self.to_json()).expect("fixture item should deserialize")
    }
}

/// The two NAIP fixture tiles, NE first.
pub fn naip_items() -> Vec<StacItem> {
    vec![ItemBuilder::naip_ne().build(), ItemBuilder::naip_nw().build()]
}
