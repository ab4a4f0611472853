//! Common test utilities for stac-vrt tests
//!
//! Provides a small VRT reader so tests assert on parsed structure rather
//! than on string fragments.

#![allow(dead_code)]

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Default, Clone)]
pub struct ParsedSource {
    pub kind: String,
    pub filename: String,
    pub source_band: u32,
    pub src_rect: [u64; 4],
    pub dst_rect: [u64; 4],
    pub nodata: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ParsedBand {
    pub band: u32,
    pub data_type: String,
    pub block_x: u64,
    pub block_y: u64,
    pub nodata: Option<String>,
    pub color_interp: Option<String>,
    pub sources: Vec<ParsedSource>,
}

#[derive(Debug, Default, Clone)]
pub struct ParsedVrt {
    pub width: u64,
    pub height: u64,
    pub srs: String,
    pub geo_transform: Vec<f64>,
    pub bands: Vec<ParsedBand>,
}

impl ParsedVrt {
    /// CRS extent implied by the GeoTransform and raster size.
    pub fn extent(&self) -> [f64; 4] {
        let gt = &self.geo_transform;
        let x0 = gt[0];
        let x1 = gt[0] + gt[1] * self.width as f64;
        let y0 = gt[3];
        let y1 = gt[3] + gt[5] * self.height as f64;
        [x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)]
    }

    /// Filenames of band 1's sources in paint order.
    pub fn source_files(&self) -> Vec<String> {
        self.bands[0]
            .sources
            .iter()
            .map(|s| s.filename.clone())
            .collect()
    }
}

fn attr(e: &BytesStart<'_>, name: &str) -> String {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name.as_bytes())
        .map(|a| a.unescape_value().expect("attribute unescapes").into_owned())
        .unwrap_or_default()
}

fn num(e: &BytesStart<'_>, name: &str) -> u64 {
    attr(e, name)
        .parse()
        .unwrap_or_else(|_| panic!("attribute {} should be an integer", name))
}

fn rect(e: &BytesStart<'_>) -> [u64; 4] {
    [
        num(e, "xOff"),
        num(e, "yOff"),
        num(e, "xSize"),
        num(e, "ySize"),
    ]
}

fn open(vrt: &mut ParsedVrt, name: &str, e: &BytesStart<'_>) {
    match name {
        "VRTDataset" => {
            vrt.width = num(e, "rasterXSize");
            vrt.height = num(e, "rasterYSize");
        }
        "VRTRasterBand" => vrt.bands.push(ParsedBand {
            band: num(e, "band") as u32,
            data_type: attr(e, "dataType"),
            block_x: num(e, "blockXSize"),
            block_y: num(e, "blockYSize"),
            ..ParsedBand::default()
        }),
        "SimpleSource" | "ComplexSource" => {
            if let Some(band) = vrt.bands.last_mut() {
                band.sources.push(ParsedSource {
                    kind: name.to_string(),
                    ..ParsedSource::default()
                });
            }
        }
        "SrcRect" => {
            if let Some(source) = last_source(vrt) {
                source.src_rect = rect(e);
            }
        }
        "DstRect" => {
            if let Some(source) = last_source(vrt) {
                source.dst_rect = rect(e);
            }
        }
        _ => {}
    }
}

fn last_source(vrt: &mut ParsedVrt) -> Option<&mut ParsedSource> {
    vrt.bands.last_mut().and_then(|b| b.sources.last_mut())
}

fn text(vrt: &mut ParsedVrt, element: &str, value: String) {
    match element {
        "SRS" => vrt.srs = value,
        "GeoTransform" => {
            vrt.geo_transform = value
                .split(',')
                .map(|v| v.trim().parse().expect("GeoTransform value is a float"))
                .collect();
        }
        "NoDataValue" => {
            if let Some(band) = vrt.bands.last_mut() {
                band.nodata = Some(value);
            }
        }
        "ColorInterp" => {
            if let Some(band) = vrt.bands.last_mut() {
                band.color_interp = Some(value);
            }
        }
        "SourceFilename" => {
            if let Some(source) = last_source(vrt) {
                source.filename = value;
            }
        }
        "SourceBand" => {
            if let Some(source) = last_source(vrt) {
                source.source_band = value.parse().expect("SourceBand is an integer");
            }
        }
        "NODATA" => {
            if let Some(source) = last_source(vrt) {
                source.nodata = Some(value);
            }
        }
        _ => {}
    }
}

/// Parse a VRT document, panicking on malformed XML.
pub fn parse_vrt(xml: &str) -> ParsedVrt {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut vrt = ParsedVrt::default();
    let mut path: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                open(&mut vrt, &name, &e);
                path.push(name);
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                open(&mut vrt, &name, &e);
            }
            Ok(Event::Text(t)) => {
                let value = t.unescape().expect("text unescapes").into_owned();
                let element = path.last().cloned().unwrap_or_default();
                text(&mut vrt, &element, value);
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => panic!("VRT is not well-formed XML: {}", e),
        }
        buf.clear();
    }

    assert!(path.is_empty(), "unclosed elements: {:?}", path);
    vrt
}
