//! Common types shared across the stac-vrt workspace.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod item;
pub mod transform;

pub use bbox::BoundingBox;
pub use crs::{CrsParseError, Epsg};
pub use error::{ItemRef, Result, VrtError};
pub use item::{EoBand, StacAsset, StacItem, StacItemCollection, StacItemProperties, StacLink};
pub use transform::{GeoTransform, Shape, TransformError};
