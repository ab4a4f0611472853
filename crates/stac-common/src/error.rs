//! Error types for VRT construction.

use std::fmt;

use thiserror::Error;

use crate::Epsg;

/// Result type alias using VrtError.
pub type Result<T> = std::result::Result<T, VrtError>;

/// Identifies one input item in error messages: its position in the input
/// sequence and its STAC id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub index: usize,
    pub id: String,
}

impl ItemRef {
    pub fn new(index: usize, id: impl Into<String>) -> Self {
        Self {
            index,
            id: id.into(),
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item '{}' (position {})", self.id, self.index)
    }
}

/// Primary error type for VRT construction.
///
/// Every failure is fatal to the call; no partial document is produced.
#[derive(Debug, Error)]
pub enum VrtError {
    // === Input Errors ===
    #[error("Must provide at least one STAC item to build a VRT")]
    EmptyInput,

    #[error("{item} has no projection: 'proj:epsg' (or 'proj:code') is missing or null")]
    MissingProjection { item: ItemRef },

    #[error("{item} has no 'proj:shape'")]
    MissingShape { item: ItemRef },

    #[error("{item} has a malformed transform: {reason}")]
    MalformedTransform { item: ItemRef, reason: String },

    #[error("{item} has an invalid '{field}': {message}")]
    InvalidField {
        item: ItemRef,
        field: String,
        message: String,
    },

    #[error("{item} has no asset named '{asset}'")]
    MissingAsset { item: ItemRef, asset: String },

    #[error("Number of user-provided '{what}' does not match the number of items ({given} != {expected})")]
    OverrideLengthMismatch {
        what: &'static str,
        given: usize,
        expected: usize,
    },

    // === Geometry Errors ===
    #[error("{item} does not have the same CRS: {found} != {expected}")]
    CrsMismatch {
        item: ItemRef,
        expected: Epsg,
        found: Epsg,
    },

    #[error(
        "{item} has pixel size ({found_x}, {found_y}), mosaic uses ({expected_x}, {expected_y})"
    )]
    ResolutionMismatch {
        item: ItemRef,
        expected_x: f64,
        expected_y: f64,
        found_x: f64,
        found_y: f64,
    },

    #[error("{item} has a rotated or sheared transform (b = {b}, d = {d})")]
    RotatedTransform { item: ItemRef, b: f64, d: f64 },

    #[error("{item} is not aligned to the mosaic grid: pixel offset ({offset_x}, {offset_y}) is not integral")]
    MisalignedGrid {
        item: ItemRef,
        offset_x: f64,
        offset_y: f64,
    },

    // === Configuration / Output Errors ===
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Failed to write VRT XML: {0}")]
    Xml(String),

    #[error("Failed to parse STAC JSON: {0}")]
    Json(String),
}

impl VrtError {
    /// The offending item, for errors caused by a single input item.
    pub fn item(&self) -> Option<&ItemRef> {
        match self {
            VrtError::MissingProjection { item }
            | VrtError::MissingShape { item }
            | VrtError::MalformedTransform { item, .. }
            | VrtError::InvalidField { item, .. }
            | VrtError::MissingAsset { item, .. }
            | VrtError::CrsMismatch { item, .. }
            | VrtError::ResolutionMismatch { item, .. }
            | VrtError::RotatedTransform { item, .. }
            | VrtError::MisalignedGrid { item, .. } => Some(item),
            _ => None,
        }
    }

    pub fn invalid_field(
        item: &ItemRef,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            item: item.clone(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn malformed_transform(item: &ItemRef, reason: impl Into<String>) -> Self {
        Self::MalformedTransform {
            item: item.clone(),
            reason: reason.into(),
        }
    }
}

impl From<quick_xml::Error> for VrtError {
    fn from(err: quick_xml::Error) -> Self {
        VrtError::Xml(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for VrtError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        VrtError::Xml(format!("output is not UTF-8: {}", err))
    }
}

impl From<serde_json::Error> for VrtError {
    fn from(err: serde_json::Error) -> Self {
        VrtError::Json(err.to_string())
    }
}
