//! Integration test: encode an image in memory, run it through decode,
//! the full pipeline, and both exporters.

#![allow(clippy::unwrap_used)]

use image::{ImageEncoder, Rgba, RgbaImage};
use regiontrace_export::{JsonEmitter, SvgEmitter, SvgMetadata};
use regiontrace_pipeline::{PipelineConfig, decode::decode_rgba, process, process_into};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// 4x3 image: a red C shape on the left, a blue reversed C on the
/// right, and a green bar between them.
fn encoded_png() -> Vec<u8> {
    let rows = [
        [RED, RED, BLUE, BLUE],
        [RED, GREEN, GREEN, BLUE],
        [RED, RED, BLUE, BLUE],
    ];
    let img = RgbaImage::from_fn(4, 3, |x, y| rows[y as usize][x as usize]);
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), 4, 3, image::ExtendedColorType::Rgba8)
        .unwrap();
    buf
}

#[test]
fn png_to_region_records() {
    let img = decode_rgba(&encoded_png()).unwrap();
    let result = process(&img, &PipelineConfig::default()).unwrap();

    assert_eq!(result.records.len(), 3);
    assert!(result.skipped.is_empty());

    let colors: Vec<_> = result.records.iter().map(|r| r.color).collect();
    assert_eq!(colors, vec![RED.0, BLUE.0, GREEN.0]);

    let areas: Vec<_> = result.records.iter().map(|r| r.polygon.area()).collect();
    assert_eq!(areas, vec![5, 5, 2]);
}

#[test]
fn png_to_svg() {
    let img = decode_rgba(&encoded_png()).unwrap();
    let mut emitter = SvgEmitter {
        metadata: SvgMetadata {
            title: Some("three-regions"),
            description: None,
        },
    };
    let svg = process_into(&img, &PipelineConfig::default(), &mut emitter).unwrap();

    assert!(svg.contains("<svg"));
    assert!(svg.contains("</svg>"));
    assert!(svg.contains("<title>three-regions</title>"));
    assert!(svg.contains(r#"viewBox="0 0 4 3""#));
    assert_eq!(svg.matches("<path").count(), 3);

    let red = svg.find(r##"fill="#ff0000""##).unwrap();
    let blue = svg.find(r##"fill="#0000ff""##).unwrap();
    let green = svg.find(r##"fill="#00ff00""##).unwrap();
    assert!(red < blue && blue < green);
}

#[test]
fn png_to_json() {
    let img = decode_rgba(&encoded_png()).unwrap();
    let json = process_into(&img, &PipelineConfig::default(), &mut JsonEmitter).unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["width"], 4);
    assert_eq!(value["height"], 3);
    let regions = value["regions"].as_array().unwrap();
    assert_eq!(regions.len(), 3);
    assert_eq!(regions[0]["color"], serde_json::json!([255, 0, 0, 255]));
    assert_eq!(regions[0]["bounding_box_area"], 6);
    assert_eq!(regions[2]["bounding_box_area"], 2);
}

#[test]
fn corrupt_bytes_fail_before_export() {
    assert!(decode_rgba(b"not an image").is_err());
}
