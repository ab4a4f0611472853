//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in projected CRS units.
///
/// Unlike the STAC `bbox` field (always WGS84 degrees), boxes here are in the
/// item's own projection, e.g. meters for UTM zones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Build from a `[minx, miny, maxx, maxy]` slice such as `proj:bbox`.
    ///
    /// Three-dimensional boxes (`[minx, miny, minz, maxx, maxy, maxz]`) drop
    /// their z range.
    pub fn from_slice(values: &[f64]) -> Result<Self, BboxParseError> {
        match *values {
            [min_x, min_y, max_x, max_y] => Ok(Self::new(min_x, min_y, max_x, max_y)),
            [min_x, min_y, _, max_x, max_y, _] => Ok(Self::new(min_x, min_y, max_x, max_y)),
            _ => Err(BboxParseError::InvalidLength(values.len())),
        }
    }

    /// Smallest box containing every point in `points`.
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        points.into_iter().fold(None, |acc, (x, y)| {
            let point = Self::new(x, y, x, y);
            Some(match acc {
                Some(bbox) => bbox.union(&point),
                None => point,
            })
        })
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Check if `other` lies within this bbox, allowing `tolerance` slack on
    /// every edge.
    pub fn contains(&self, other: &BoundingBox, tolerance: f64) -> bool {
        other.min_x >= self.min_x - tolerance
            && other.min_y >= self.min_y - tolerance
            && other.max_x <= self.max_x + tolerance
            && other.max_y <= self.max_y + tolerance
    }

    /// Largest absolute difference between corresponding edges.
    pub fn max_edge_distance(&self, other: &BoundingBox) -> f64 {
        (self.min_x - other.min_x)
            .abs()
            .max((self.min_y - other.min_y).abs())
            .max((self.max_x - other.max_x).abs())
            .max((self.max_y - other.max_y).abs())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("expected 4 or 6 bbox values, got {0}")]
    InvalidLength(usize),
}
