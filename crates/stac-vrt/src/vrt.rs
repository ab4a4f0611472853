//! GDAL VRT document rendering.
//!
//! The document is written through `quick_xml`'s event writer, so hrefs and
//! other text are escaped by construction. Layout:
//!
//! ```text
//! VRTDataset rasterXSize rasterYSize
//! ├── SRS
//! ├── GeoTransform
//! └── VRTRasterBand (one per output band)
//!     ├── NoDataValue?
//!     ├── ColorInterp?
//!     └── SimpleSource | ComplexSource (one per item, input order = paint order)
//! ```

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::{info, warn};

use stac_common::{Result, StacAsset, StacItem, VrtError};

use crate::mosaic::MosaicGrid;
use crate::options::VrtOptions;
use crate::placement::Placement;

/// A source raster of one item: the asset to read and where it lands.
struct ItemSource<'a> {
    filename: String,
    asset: &'a StacAsset,
    placement: &'a Placement,
}

/// Render the VRT document.
///
/// `items` and `placements` must be in the same order; that order is the
/// paint order within each band (later sources cover earlier ones).
pub fn render(
    items: &[StacItem],
    placements: &[Placement],
    grid: &MosaicGrid,
    options: &VrtOptions,
) -> Result<String> {
    let sources = item_sources(items, placements, options)?;
    let bands = output_bands(&sources, options);
    if let Some(&band) = bands
        .iter()
        .find(|&&band| !sources.iter().any(|s| provides_band(s.asset, band)))
    {
        return Err(VrtError::InvalidOptions(format!(
            "no item provides source band {}",
            band
        )));
    }

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let mut dataset = BytesStart::new("VRTDataset");
    dataset.push_attribute(("rasterXSize", grid.width_px.to_string().as_str()));
    dataset.push_attribute(("rasterYSize", grid.height_px.to_string().as_str()));
    writer.write_event(Event::Start(dataset))?;

    let mut srs = BytesStart::new("SRS");
    srs.push_attribute(("dataAxisToSRSAxisMapping", "1,2"));
    write_text_element(&mut writer, srs, &grid.epsg.to_string())?;

    write_text_element(
        &mut writer,
        BytesStart::new("GeoTransform"),
        &format_geo_transform(grid),
    )?;

    let block_width = options.block_width.map_or(grid.width_px, u64::from);
    let block_height = options.block_height.map_or(grid.height_px, u64::from);

    let mut source_count = 0;
    for (band_number, &source_band) in (1u32..).zip(bands.iter()) {
        let mut band = BytesStart::new("VRTRasterBand");
        band.push_attribute(("dataType", options.data_type.as_str()));
        band.push_attribute(("band", band_number.to_string().as_str()));
        band.push_attribute(("blockXSize", block_width.to_string().as_str()));
        band.push_attribute(("blockYSize", block_height.to_string().as_str()));
        writer.write_event(Event::Start(band))?;

        if let Some(nodata) = options.nodata {
            write_text_element(
                &mut writer,
                BytesStart::new("NoDataValue"),
                &format_nodata(nodata),
            )?;
        }

        if let Some(interp) = band_color_interp(&sources, source_band) {
            write_text_element(&mut writer, BytesStart::new("ColorInterp"), interp)?;
        }

        for source in &sources {
            if !provides_band(source.asset, source_band) {
                warn!(
                    item = %source.placement.item,
                    source_band,
                    available = ?source.asset.band_count(),
                    "Item has no such band, leaving it out of this band"
                );
                continue;
            }
            write_source(&mut writer, source, source_band, options)?;
            source_count += 1;
        }

        writer.write_event(Event::End(BytesEnd::new("VRTRasterBand")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("VRTDataset")))?;

    let xml = String::from_utf8(writer.into_inner())?;

    info!(
        width = grid.width_px,
        height = grid.height_px,
        bands = bands.len(),
        sources = source_count,
        bytes = xml.len(),
        "Rendered VRT"
    );

    Ok(xml)
}

fn item_sources<'a>(
    items: &'a [StacItem],
    placements: &'a [Placement],
    options: &VrtOptions,
) -> Result<Vec<ItemSource<'a>>> {
    items
        .iter()
        .zip(placements)
        .map(|(item, placement)| {
            let asset = item
                .asset(&options.asset_key)
                .ok_or_else(|| VrtError::MissingAsset {
                    item: placement.item.clone(),
                    asset: options.asset_key.clone(),
                })?;
            Ok(ItemSource {
                filename: source_filename(&asset.href, options.vsicurl_prefix),
                asset,
                placement,
            })
        })
        .collect()
}

/// Source band indices in output order.
fn output_bands(sources: &[ItemSource<'_>], options: &VrtOptions) -> Vec<u32> {
    if let Some(bands) = &options.bands {
        return bands.clone();
    }

    let count = sources
        .iter()
        .filter_map(|s| s.asset.band_count())
        .max()
        .unwrap_or(1)
        .max(1);
    (1..=count as u32).collect()
}

/// Assets without `eo:bands` are assumed to carry every band.
fn provides_band(asset: &StacAsset, source_band: u32) -> bool {
    match asset.band_count() {
        Some(available) if available > 0 => source_band as usize <= available,
        _ => true,
    }
}

/// `ColorInterp` of the first item that describes `source_band`.
fn band_color_interp(sources: &[ItemSource<'_>], source_band: u32) -> Option<&'static str> {
    sources
        .iter()
        .filter_map(|s| s.asset.band(source_band))
        .find_map(|band| {
            band.common_name
                .as_deref()
                .and_then(color_interp)
                .or_else(|| band.name.as_deref().and_then(color_interp))
        })
}

/// Map an `eo:bands` name onto GDAL's color interpretation vocabulary.
pub fn color_interp(name: &str) -> Option<&'static str> {
    let interp = match name.trim().to_ascii_lowercase().as_str() {
        "gray" | "grey" | "pan" | "panchromatic" => "Gray",
        "palette" => "Palette",
        "red" => "Red",
        "green" => "Green",
        "blue" => "Blue",
        "alpha" => "Alpha",
        "hue" => "Hue",
        "saturation" => "Saturation",
        "lightness" => "Lightness",
        "cyan" => "Cyan",
        "magenta" => "Magenta",
        "yellow" => "Yellow",
        "black" => "Black",
        "undefined" => "Undefined",
        _ => return None,
    };
    Some(interp)
}

/// Path GDAL should open for an asset href.
pub fn source_filename(href: &str, vsicurl_prefix: bool) -> String {
    let is_http = href.starts_with("http://") || href.starts_with("https://");
    if vsicurl_prefix && is_http {
        format!("/vsicurl/{}", href)
    } else {
        href.to_string()
    }
}

fn write_source(
    writer: &mut Writer<Vec<u8>>,
    source: &ItemSource<'_>,
    source_band: u32,
    options: &VrtOptions,
) -> Result<()> {
    let placement = source.placement;
    let element = if options.nodata.is_some() {
        "ComplexSource"
    } else {
        "SimpleSource"
    };
    writer.write_event(Event::Start(BytesStart::new(element)))?;

    let mut filename = BytesStart::new("SourceFilename");
    filename.push_attribute(("relativeToVRT", "0"));
    write_text_element(writer, filename, &source.filename)?;

    write_text_element(
        writer,
        BytesStart::new("SourceBand"),
        &source_band.to_string(),
    )?;

    let block_width = options.block_width.map_or(placement.src_width, u64::from);
    let block_height = options.block_height.map_or(placement.src_height, u64::from);
    write_empty_element(
        writer,
        "SourceProperties",
        &[
            ("RasterXSize", placement.src_width.to_string()),
            ("RasterYSize", placement.src_height.to_string()),
            ("DataType", options.data_type.clone()),
            ("BlockXSize", block_width.to_string()),
            ("BlockYSize", block_height.to_string()),
        ],
    )?;

    write_empty_element(
        writer,
        "SrcRect",
        &[
            ("xOff", "0".to_string()),
            ("yOff", "0".to_string()),
            ("xSize", placement.src_width.to_string()),
            ("ySize", placement.src_height.to_string()),
        ],
    )?;

    write_empty_element(
        writer,
        "DstRect",
        &[
            ("xOff", placement.dst_offset_x.to_string()),
            ("yOff", placement.dst_offset_y.to_string()),
            ("xSize", placement.dst_width.to_string()),
            ("ySize", placement.dst_height.to_string()),
        ],
    )?;

    if let Some(nodata) = options.nodata {
        write_text_element(writer, BytesStart::new("NODATA"), &format_nodata(nodata))?;
    }

    writer.write_event(Event::End(BytesEnd::new(element)))?;
    Ok(())
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    start: BytesStart<'_>,
    text: &str,
) -> Result<()> {
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

fn write_empty_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    attributes: &[(&str, String)],
) -> Result<()> {
    let mut element = BytesStart::new(name);
    for (key, value) in attributes {
        element.push_attribute((*key, value.as_str()));
    }
    writer.write_event(Event::Empty(element))?;
    Ok(())
}

/// GDAL-order geotransform, 17 significant digits per coefficient.
fn format_geo_transform(grid: &MosaicGrid) -> String {
    grid.geo_transform()
        .to_gdal()
        .iter()
        .map(|v| format!("{:.16e}", v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_nodata(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        value.to_string()
    }
}
