//! Typed projection metadata for STAC items.
//!
//! Each item's `proj:*` properties are read once into a [`GeoReference`].
//! Missing or wrong-typed fields fail here, naming the item, so later stages
//! only ever see complete, typed geometry.

use rayon::prelude::*;
use serde_json::Value;
use tracing::debug;

use stac_common::{
    BoundingBox, Epsg, GeoTransform, ItemRef, Result, Shape, StacItem, VrtError,
};

use crate::options::VrtOptions;

/// Projection metadata of one item, in the item's own CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoReference {
    pub item: ItemRef,
    pub epsg: Epsg,
    pub transform: GeoTransform,
    pub shape: Shape,
    pub bbox: BoundingBox,
}

impl GeoReference {
    /// Pixel size as `(a, e)`, signed.
    pub fn resolution(&self) -> (f64, f64) {
        (self.transform.a, self.transform.e)
    }
}

/// Caller-supplied per-item geometry that replaces what the items declare.
///
/// Each list, when present, must have one entry per item.
#[derive(Debug, Clone, Default)]
pub struct GeoOverrides {
    pub bboxes: Option<Vec<BoundingBox>>,
    pub shapes: Option<Vec<Shape>>,
}

impl GeoOverrides {
    fn check_lengths(&self, expected: usize) -> Result<()> {
        if let Some(bboxes) = &self.bboxes {
            if bboxes.len() != expected {
                return Err(VrtError::OverrideLengthMismatch {
                    what: "bboxes",
                    given: bboxes.len(),
                    expected,
                });
            }
        }
        if let Some(shapes) = &self.shapes {
            if shapes.len() != expected {
                return Err(VrtError::OverrideLengthMismatch {
                    what: "shapes",
                    given: shapes.len(),
                    expected,
                });
            }
        }
        Ok(())
    }

    fn bbox(&self, index: usize) -> Option<BoundingBox> {
        self.bboxes.as_ref().and_then(|b| b.get(index).copied())
    }

    fn shape(&self, index: usize) -> Option<Shape> {
        self.shapes.as_ref().and_then(|s| s.get(index).copied())
    }
}

/// Resolve every item, preserving input order.
///
/// Large inputs are resolved on the rayon pool; the reported error is always
/// the one of the earliest failing item.
pub fn resolve_all(
    items: &[StacItem],
    options: &VrtOptions,
    overrides: &GeoOverrides,
) -> Result<Vec<GeoReference>> {
    if items.is_empty() {
        return Err(VrtError::EmptyInput);
    }
    overrides.check_lengths(items.len())?;

    let resolve_one = |(index, item): (usize, &StacItem)| {
        resolve(index, item, overrides.bbox(index), overrides.shape(index))
    };

    let resolved: Vec<Result<GeoReference>> = if items.len() >= options.parallel_threshold {
        items.par_iter().enumerate().map(resolve_one).collect()
    } else {
        items.iter().enumerate().map(resolve_one).collect()
    };

    resolved.into_iter().collect()
}

/// Resolve one item's projection metadata.
///
/// `bbox_override` and `shape_override` take precedence over the item's own
/// `proj:bbox` and `proj:shape`.
pub fn resolve(
    index: usize,
    item: &StacItem,
    bbox_override: Option<BoundingBox>,
    shape_override: Option<Shape>,
) -> Result<GeoReference> {
    let item_ref = ItemRef::new(index, item.id.as_str());

    let epsg = read_epsg(item, &item_ref)?;
    let shape = match shape_override {
        Some(shape) => shape,
        None => read_shape(item, &item_ref)?,
    };
    if shape.is_empty() {
        return Err(VrtError::invalid_field(
            &item_ref,
            "proj:shape",
            format!("shape must be non-empty, got [{}, {}]", shape.rows, shape.cols),
        ));
    }

    let proj_bbox = read_proj_bbox(item, &item_ref)?;
    let declared_bbox = bbox_override.or(proj_bbox);

    let transform = match item.property("proj:transform") {
        Some(value) => parse_transform(value, &item_ref)?,
        None => match declared_bbox {
            Some(bbox) => GeoTransform::from_bbox(&bbox, shape),
            None => {
                return Err(VrtError::malformed_transform(
                    &item_ref,
                    "missing 'proj:transform' and no 'proj:bbox' to derive it from",
                ))
            }
        },
    };
    check_transform(&transform, &item_ref)?;

    let footprint = transform.footprint(shape);
    let bbox = match bbox_override {
        Some(bbox) => bbox,
        None => {
            if let Some(declared) = proj_bbox {
                let half_pixel = 0.5 * pixel_extent(&transform);
                if declared.max_edge_distance(&footprint) > half_pixel {
                    return Err(VrtError::malformed_transform(
                        &item_ref,
                        format!(
                            "'proj:bbox' {:?} disagrees with the extent {:?} implied by 'proj:transform' and 'proj:shape'",
                            declared, footprint
                        ),
                    ));
                }
            }
            footprint
        }
    };

    debug!(
        index,
        id = %item.id,
        epsg = epsg.code(),
        rows = shape.rows,
        cols = shape.cols,
        "Resolved item projection"
    );

    Ok(GeoReference {
        item: item_ref,
        epsg,
        transform,
        shape,
        bbox,
    })
}

fn read_epsg(item: &StacItem, item_ref: &ItemRef) -> Result<Epsg> {
    if let Some(value) = item.property("proj:epsg") {
        let code = json_u64(value)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                VrtError::invalid_field(
                    item_ref,
                    "proj:epsg",
                    format!("expected an integer EPSG code, got {}", value),
                )
            })?;
        return Ok(Epsg(code));
    }

    // Projection extension v2 replaced `proj:epsg` with `proj:code`.
    if let Some(value) = item.property("proj:code") {
        let code = value.as_str().ok_or_else(|| {
            VrtError::invalid_field(item_ref, "proj:code", format!("expected a string, got {}", value))
        })?;
        return Epsg::from_authority_string(code)
            .map_err(|e| VrtError::invalid_field(item_ref, "proj:code", e.to_string()));
    }

    Err(VrtError::MissingProjection {
        item: item_ref.clone(),
    })
}

fn read_shape(item: &StacItem, item_ref: &ItemRef) -> Result<Shape> {
    let value = item.property("proj:shape").ok_or_else(|| VrtError::MissingShape {
        item: item_ref.clone(),
    })?;

    value
        .as_array()
        .and_then(|values| values.iter().map(json_u64).collect::<Option<Vec<_>>>())
        .and_then(|values| Shape::from_slice(&values))
        .ok_or_else(|| {
            VrtError::invalid_field(
                item_ref,
                "proj:shape",
                format!("expected [rows, cols] as non-negative integers, got {}", value),
            )
        })
}

fn read_proj_bbox(item: &StacItem, item_ref: &ItemRef) -> Result<Option<BoundingBox>> {
    let Some(value) = item.property("proj:bbox") else {
        return Ok(None);
    };

    let values = json_f64_array(value).ok_or_else(|| {
        VrtError::invalid_field(item_ref, "proj:bbox", format!("expected numbers, got {}", value))
    })?;

    BoundingBox::from_slice(&values)
        .map(Some)
        .map_err(|e| VrtError::invalid_field(item_ref, "proj:bbox", e.to_string()))
}

fn parse_transform(value: &Value, item_ref: &ItemRef) -> Result<GeoTransform> {
    let values = json_f64_array(value).ok_or_else(|| {
        VrtError::malformed_transform(item_ref, format!("expected a sequence of numbers, got {}", value))
    })?;

    GeoTransform::from_slice(&values).map_err(|e| VrtError::malformed_transform(item_ref, e.to_string()))
}

fn check_transform(transform: &GeoTransform, item_ref: &ItemRef) -> Result<()> {
    let coefficients = [
        transform.a,
        transform.b,
        transform.c,
        transform.d,
        transform.e,
        transform.f,
    ];
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(VrtError::malformed_transform(
            item_ref,
            format!("non-finite coefficient in {:?}", coefficients),
        ));
    }

    let determinant = transform.a * transform.e - transform.b * transform.d;
    if determinant == 0.0 {
        return Err(VrtError::malformed_transform(
            item_ref,
            "transform is singular (zero pixel size)",
        ));
    }

    Ok(())
}

/// Largest CRS distance covered by one pixel along either axis.
fn pixel_extent(transform: &GeoTransform) -> f64 {
    (transform.a.abs() + transform.b.abs()).max(transform.d.abs() + transform.e.abs())
}

/// Integer from JSON, accepting integral floats such as `512.0`.
fn json_u64(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u64::MAX as f64)
            .map(|v| v as u64)
    })
}

fn json_f64_array(value: &Value) -> Option<Vec<f64>> {
    value.as_array()?.iter().map(Value::as_f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(properties: Value) -> StacItem {
        serde_json::from_value(json!({
            "id": "test-item",
            "properties": properties,
            "assets": {"image": {"href": "a.tif"}}
        }))
        .unwrap()
    }

    #[test]
    fn test_resolve_nine_element_transform() {
        let item = item(json!({
            "proj:epsg": 26917,
            "proj:shape": [12240, 11040],
            "proj:transform": [0.6, 0.0, 530802.0, 0.0, -0.6, 2986692.0, 0.0, 0.0, 1.0]
        }));

        let georef = resolve(0, &item, None, None).unwrap();
        assert_eq!(georef.epsg, Epsg(26917));
        assert_eq!(georef.shape, Shape::new(12240, 11040));
        assert_eq!(georef.resolution(), (0.6, -0.6));
        assert!((georef.bbox.min_x - 530802.0).abs() < 1e-6);
        assert!((georef.bbox.min_y - 2979348.0).abs() < 1e-6);
        assert!((georef.bbox.max_x - 537426.0).abs() < 1e-6);
        assert_eq!(georef.bbox.max_y, 2986692.0);
    }

    #[test]
    fn test_missing_epsg_names_item() {
        let item = item(json!({
            "proj:shape": [10, 10],
            "proj:transform": [1.0, 0.0, 0.0, 0.0, -1.0, 10.0]
        }));

        let err = resolve(4, &item, None, None).unwrap_err();
        match err {
            VrtError::MissingProjection { item } => {
                assert_eq!(item.index, 4);
                assert_eq!(item.id, "test-item");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_epsg_is_missing() {
        let item = item(json!({
            "proj:epsg": null,
            "proj:shape": [10, 10],
            "proj:transform": [1.0, 0.0, 0.0, 0.0, -1.0, 10.0]
        }));
        assert!(matches!(
            resolve(0, &item, None, None),
            Err(VrtError::MissingProjection { .. })
        ));
    }

    #[test]
    fn test_proj_code_fallback() {
        let item = item(json!({
            "proj:code": "EPSG:32630",
            "proj:shape": [10, 10],
            "proj:transform": [10.0, 0.0, 500000.0, 0.0, -10.0, 4500000.0]
        }));
        assert_eq!(resolve(0, &item, None, None).unwrap().epsg, Epsg(32630));
    }

    #[test]
    fn test_wrong_typed_epsg() {
        let item = item(json!({
            "proj:epsg": "26917",
            "proj:shape": [10, 10],
            "proj:transform": [1.0, 0.0, 0.0, 0.0, -1.0, 10.0]
        }));
        assert!(matches!(
            resolve(0, &item, None, None),
            Err(VrtError::InvalidField { ref field, .. }) if field == "proj:epsg"
        ));
    }

    #[test]
    fn test_missing_shape() {
        let item = item(json!({
            "proj:epsg": 26917,
            "proj:transform": [1.0, 0.0, 0.0, 0.0, -1.0, 10.0]
        }));
        assert!(matches!(
            resolve(0, &item, None, None),
            Err(VrtError::MissingShape { .. })
        ));
    }

    #[test]
    fn test_float_shape_accepted() {
        let item = item(json!({
            "proj:epsg": 26917,
            "proj:shape": [512.0, 256.0],
            "proj:transform": [1.0, 0.0, 0.0, 0.0, -1.0, 512.0]
        }));
        assert_eq!(resolve(0, &item, None, None).unwrap().shape, Shape::new(512, 256));
    }

    #[test]
    fn test_bad_transform_length() {
        let item = item(json!({
            "proj:epsg": 26917,
            "proj:shape": [10, 10],
            "proj:transform": [1.0, 0.0, 0.0, 0.0, -1.0, 10.0, 0.0]
        }));
        let err = resolve(0, &item, None, None).unwrap_err();
        assert!(matches!(err, VrtError::MalformedTransform { .. }));
        assert!(err.to_string().contains("got 7"));
    }

    #[test]
    fn test_singular_transform() {
        let item = item(json!({
            "proj:epsg": 26917,
            "proj:shape": [10, 10],
            "proj:transform": [0.0, 0.0, 0.0, 0.0, -1.0, 10.0]
        }));
        assert!(matches!(
            resolve(0, &item, None, None),
            Err(VrtError::MalformedTransform { .. })
        ));
    }

    #[test]
    fn test_transform_derived_from_proj_bbox() {
        let item = item(json!({
            "proj:epsg": 26917,
            "proj:shape": [100, 200],
            "proj:bbox": [1000.0, 2000.0, 1400.0, 2200.0]
        }));
        let georef = resolve(0, &item, None, None).unwrap();
        assert_eq!(
            georef.transform,
            GeoTransform::new(2.0, 0.0, 1000.0, 0.0, -2.0, 2200.0)
        );
        assert_eq!(georef.bbox, BoundingBox::new(1000.0, 2000.0, 1400.0, 2200.0));
    }

    #[test]
    fn test_missing_transform_and_bbox() {
        let item = item(json!({"proj:epsg": 26917, "proj:shape": [10, 10]}));
        assert!(matches!(
            resolve(0, &item, None, None),
            Err(VrtError::MalformedTransform { .. })
        ));
    }

    #[test]
    fn test_inconsistent_proj_bbox() {
        let item = item(json!({
            "proj:epsg": 26917,
            "proj:shape": [10, 10],
            "proj:transform": [1.0, 0.0, 0.0, 0.0, -1.0, 10.0],
            "proj:bbox": [0.0, 0.0, 20.0, 10.0]
        }));
        assert!(matches!(
            resolve(0, &item, None, None),
            Err(VrtError::MalformedTransform { .. })
        ));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let item = item(json!({"proj:epsg": 26917}));
        let bbox = BoundingBox::new(0.0, 0.0, 30.0, 20.0);
        let georef = resolve(0, &item, Some(bbox), Some(Shape::new(2, 3))).unwrap();
        assert_eq!(georef.bbox, bbox);
        assert_eq!(georef.resolution(), (10.0, -10.0));
    }

    #[test]
    fn test_override_length_mismatch() {
        let items = vec![item(json!({"proj:epsg": 26917}))];
        let overrides = GeoOverrides {
            bboxes: Some(vec![
                BoundingBox::new(1.0, 2.0, 3.0, 4.0),
                BoundingBox::new(5.0, 6.0, 7.0, 8.0),
            ]),
            shapes: None,
        };
        let err = resolve_all(&items, &VrtOptions::default(), &overrides).unwrap_err();
        assert!(err.to_string().contains("2 != 1"));
    }

    #[test]
    fn test_resolve_all_reports_first_failure_in_parallel() {
        let good = item(json!({
            "proj:epsg": 26917,
            "proj:shape": [10, 10],
            "proj:transform": [1.0, 0.0, 0.0, 0.0, -1.0, 10.0]
        }));
        let bad = item(json!({"proj:shape": [10, 10]}));

        let mut items = vec![good.clone(); 20];
        items[7] = bad.clone();
        items[13] = bad;

        let options = VrtOptions {
            parallel_threshold: 1,
            ..VrtOptions::default()
        };
        let err = resolve_all(&items, &options, &GeoOverrides::default()).unwrap_err();
        assert_eq!(err.item().map(|i| i.index), Some(7));
    }

    #[test]
    fn test_resolve_all_empty() {
        assert!(matches!(
            resolve_all(&[], &VrtOptions::default(), &GeoOverrides::default()),
            Err(VrtError::EmptyInput)
        ));
    }
}
