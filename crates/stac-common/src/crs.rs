//! Coordinate Reference System identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An EPSG coordinate reference system code.
///
/// Only the code is carried: mosaics never reproject, so equality of codes is
/// all the pipeline needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epsg(pub u32);

impl Epsg {
    pub fn new(code: u32) -> Self {
        Self(code)
    }

    pub fn code(&self) -> u32 {
        self.0
    }

    /// Parse an authority string as used by `proj:code` and GDAL.
    ///
    /// Accepts formats like:
    /// - "EPSG:26917"
    /// - "epsg:26917"
    pub fn from_authority_string(s: &str) -> Result<Self, CrsParseError> {
        let (authority, code) = s
            .split_once(':')
            .ok_or_else(|| CrsParseError::InvalidFormat(s.to_string()))?;

        if !authority.trim().eq_ignore_ascii_case("EPSG") {
            return Err(CrsParseError::UnsupportedAuthority(s.to_string()));
        }

        code.trim()
            .parse()
            .map(Epsg)
            .map_err(|_| CrsParseError::InvalidFormat(s.to_string()))
    }

    /// Check if this is a geographic (lat/lon) CRS.
    ///
    /// Only the common geographic codes are recognised; anything else is
    /// assumed projected.
    pub fn is_geographic(&self) -> bool {
        matches!(self.0, 4326 | 4269 | 4258 | 4674)
    }
}

impl fmt::Display for Epsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Invalid CRS string: {0}. Expected 'EPSG:<code>'")]
    InvalidFormat(String),

    #[error("Unsupported CRS authority: {0}")]
    UnsupportedAuthority(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_authority_string() {
        assert_eq!(
            Epsg::from_authority_string("EPSG:26917").unwrap(),
            Epsg(26917)
        );
        assert_eq!(
            Epsg::from_authority_string("epsg:4326").unwrap(),
            Epsg(4326)
        );
        assert!(matches!(
            Epsg::from_authority_string("ESRI:102003"),
            Err(CrsParseError::UnsupportedAuthority(_))
        ));
        assert!(matches!(
            Epsg::from_authority_string("26917"),
            Err(CrsParseError::InvalidFormat(_))
        ));
        assert!(Epsg::from_authority_string("EPSG:abc").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Epsg(26917).to_string(), "EPSG:26917");
    }

    #[test]
    fn test_is_geographic() {
        assert!(Epsg(4326).is_geographic());
        assert!(!Epsg(32630).is_geographic());
    }
}
