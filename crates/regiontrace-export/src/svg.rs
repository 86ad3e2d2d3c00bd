//! SVG export serializer.
//!
//! Converts traced regions into an SVG string with one filled `<path>`
//! element per region, using the [`svg`] crate for document
//! construction, XML escaping, and path data formatting.
//!
//! Polygons arrive in Cartesian coordinates (origin bottom-left) and are
//! mirrored back into SVG's y-down space. Records are drawn in the order
//! given; the pipeline orders largest first, so smaller regions paint on
//! top of the regions that enclose them.
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements for
//! accessibility and to help file managers identify exported files.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Path, Title};
use svg::node::{Text, Value};

use regiontrace_pipeline::{Dimensions, Emitter, OutputRecord, Polygon};

use crate::ExportError;

/// Metadata to embed in the SVG document.
///
/// Both fields are optional.  When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,
}

/// A grid color that can be used as an SVG fill.
pub trait CssColor {
    /// `#rrggbb` form of the color.
    fn css_color(&self) -> String;

    /// Fill opacity in `0.0..=1.0`; `None` when fully opaque.
    fn fill_opacity(&self) -> Option<f64> {
        None
    }
}

impl CssColor for [u8; 4] {
    fn css_color(&self) -> String {
        [self[0], self[1], self[2]].css_color()
    }

    fn fill_opacity(&self) -> Option<f64> {
        (self[3] < u8::MAX).then(|| f64::from(self[3]) / f64::from(u8::MAX))
    }
}

impl CssColor for [u8; 3] {
    fn css_color(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self[0], self[1], self[2])
    }
}

/// Grayscale luma.
impl CssColor for u8 {
    fn css_color(&self) -> String {
        [*self; 3].css_color()
    }
}

/// Build an SVG path `d` attribute string from a Cartesian polygon.
///
/// Each vertex is mirrored into y-down space for a grid `height` pixels
/// tall. Uses `M` for the first vertex, `L` for the rest, and closes the
/// path. Returns an empty string for polygons with fewer than 3
/// vertices.
///
/// # Examples
///
/// ```
/// use regiontrace_pipeline::{Coordinate, Polygon};
/// use regiontrace_export::build_path_data;
///
/// let square = Polygon::new(vec![
///     Coordinate::new(0, 0),
///     Coordinate::new(1, 0),
///     Coordinate::new(1, 1),
///     Coordinate::new(0, 1),
/// ]);
/// let d = build_path_data(&square, 1);
/// assert!(d.starts_with("M0,1 L1,1 L1,0 L0,0"));
/// ```
#[must_use]
pub fn build_path_data(polygon: &Polygon, height: u32) -> String {
    if polygon.len() < 3 {
        return String::new();
    }

    let flipped = polygon.flip_y(height);
    #[allow(clippy::cast_precision_loss)]
    let point = |c: &regiontrace_pipeline::Coordinate| (c.x as f64, c.y as f64);

    let vertices = flipped.vertices();
    let mut data = Data::new().move_to(point(&vertices[0]));
    for v in &vertices[1..] {
        data = data.line_to(point(v));
    }
    String::from(Value::from(data.close()))
}

/// Serialize traced regions into an SVG document string.
///
/// The document's `width`, `height`, and `viewBox` match the source grid
/// so one user unit equals one pixel. Each record becomes a `<path>`
/// filled with its region color and tagged with `id="region-N"`.
/// Records whose polygon has fewer than 3 vertices are omitted.
///
/// # Examples
///
/// ```
/// use regiontrace_pipeline::{Coordinate, Dimensions, OutputRecord, Polygon};
/// use regiontrace_export::{SvgMetadata, to_svg};
///
/// let record = OutputRecord {
///     region: 0,
///     color: [255u8, 0, 0, 255],
///     polygon: Polygon::new(vec![
///         Coordinate::new(0, 0),
///         Coordinate::new(2, 0),
///         Coordinate::new(2, 2),
///         Coordinate::new(0, 2),
///     ]),
/// };
/// let metadata = SvgMetadata {
///     title: Some("square"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&[record], Dimensions { width: 2, height: 2 }, &metadata);
/// assert!(svg.contains("<title>square</title>"));
/// assert!(svg.contains(r##"fill="#ff0000""##));
/// ```
#[must_use]
pub fn to_svg<C: CssColor>(
    records: &[OutputRecord<C>],
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    // Optional <title> element
    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    // Optional <desc> element
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    for record in records {
        let d = build_path_data(&record.polygon, h);
        if d.is_empty() {
            continue;
        }

        let mut path = Path::new()
            .set("id", format!("region-{}", record.region))
            .set("d", d)
            .set("fill", record.color.css_color())
            .set("stroke", "none");
        if let Some(opacity) = record.color.fill_opacity() {
            path = path.set("fill-opacity", format!("{opacity:.3}"));
        }
        doc = doc.add(path);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

/// [`Emitter`] producing an SVG document string.
#[derive(Debug, Clone, Default)]
pub struct SvgEmitter<'a> {
    /// Title and description embedded in every emitted document.
    pub metadata: SvgMetadata<'a>,
}

impl<C: CssColor> Emitter<C> for SvgEmitter<'_> {
    type Output = String;
    type Error = ExportError;

    fn emit(
        &mut self,
        records: &[OutputRecord<C>],
        dimensions: Dimensions,
    ) -> Result<String, ExportError> {
        Ok(to_svg(records, dimensions, &self.metadata))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use regiontrace_pipeline::Coordinate;

    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    /// Shorthand: no metadata (most tests don't care about it).
    fn no_meta() -> SvgMetadata<'static> {
        SvgMetadata::default()
    }

    fn polygon(list: &[(i64, i64)]) -> Polygon {
        Polygon::new(list.iter().map(|&c| Coordinate::from(c)).collect())
    }

    fn record(region: usize, color: [u8; 4], list: &[(i64, i64)]) -> OutputRecord<[u8; 4]> {
        OutputRecord {
            region,
            color,
            polygon: polygon(list),
        }
    }

    // --- CssColor ---

    #[test]
    fn rgb_formats_as_hex() {
        assert_eq!([255u8, 128, 0].css_color(), "#ff8000");
        assert_eq!([0u8, 0, 0].css_color(), "#000000");
    }

    #[test]
    fn rgba_opaque_has_no_opacity() {
        assert_eq!([1u8, 2, 3, 255].css_color(), "#010203");
        assert_eq!([1u8, 2, 3, 255].fill_opacity(), None);
    }

    #[test]
    fn rgba_translucent_reports_opacity() {
        let opacity = [0u8, 0, 0, 51].fill_opacity().unwrap();
        assert!((opacity - 0.2).abs() < 1e-9);
    }

    #[test]
    fn gray_repeats_luma() {
        assert_eq!(0x7fu8.css_color(), "#7f7f7f");
    }

    // --- build_path_data ---

    #[test]
    fn build_path_data_flips_into_y_down() {
        let d = build_path_data(&polygon(&[(0, 0), (2, 0), (2, 2), (0, 2)]), 2);
        assert!(d.starts_with("M0,2 L2,2 L2,0 L0,0"), "{d}");
        assert!(d.to_ascii_lowercase().ends_with('z'), "{d}");
    }

    #[test]
    fn build_path_data_uses_grid_height() {
        let d = build_path_data(&polygon(&[(1, 0), (2, 0), (2, 1), (1, 1)]), 3);
        assert!(d.starts_with("M1,3 L2,3 L2,2 L1,2"), "{d}");
    }

    #[test]
    fn build_path_data_degenerate_polygon() {
        assert_eq!(build_path_data(&polygon(&[]), 4), "");
        assert_eq!(build_path_data(&polygon(&[(0, 0), (1, 0)]), 4), "");
    }

    // --- to_svg ---

    #[test]
    fn empty_records_produce_valid_svg_with_no_paths() {
        let svg = to_svg::<[u8; 4]>(&[], dims(100, 50), &no_meta());
        assert!(svg.contains(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(svg.contains(r#"width="100""#));
        assert!(svg.contains(r#"height="50""#));
        assert!(svg.contains(r#"viewBox="0 0 100 50""#));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn one_path_per_record_in_order() {
        let records = vec![
            record(1, [0, 0, 255, 255], &[(0, 0), (3, 0), (3, 3), (0, 3)]),
            record(0, [255, 0, 0, 255], &[(1, 1), (2, 1), (2, 2), (1, 2)]),
        ];
        let svg = to_svg(&records, dims(3, 3), &no_meta());

        assert_eq!(svg.matches("<path").count(), 2);
        let blue = svg.find(r#"id="region-1""#).unwrap();
        let red = svg.find(r#"id="region-0""#).unwrap();
        assert!(blue < red, "records must be drawn in the given order");
        assert!(svg.contains(r##"fill="#0000ff""##));
        assert!(svg.contains(r##"fill="#ff0000""##));
        assert!(svg.contains(r#"stroke="none""#));
        assert!(!svg.contains("fill-opacity"));
    }

    #[test]
    fn translucent_color_sets_fill_opacity() {
        let records = vec![record(0, [0, 0, 0, 0], &[(0, 0), (1, 0), (1, 1), (0, 1)])];
        let svg = to_svg(&records, dims(1, 1), &no_meta());
        assert!(svg.contains(r#"fill-opacity="0.000""#));
    }

    #[test]
    fn degenerate_record_is_skipped() {
        let records = vec![record(0, [0, 0, 0, 255], &[(0, 0)])];
        let svg = to_svg(&records, dims(1, 1), &no_meta());
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn metadata_is_embedded_and_escaped() {
        let metadata = SvgMetadata {
            title: Some("a < b"),
            description: Some("regions & outlines"),
        };
        let svg = to_svg::<u8>(&[], dims(1, 1), &metadata);
        assert!(svg.contains("<title>a &lt; b</title>"));
        assert!(svg.contains("<desc>regions &amp; outlines</desc>"));
    }

    #[test]
    fn metadata_absent_by_default() {
        let svg = to_svg::<u8>(&[], dims(1, 1), &no_meta());
        assert!(!svg.contains("<title>"));
        assert!(!svg.contains("<desc>"));
    }

    #[test]
    fn emitter_matches_function() {
        let records = vec![record(0, [9, 9, 9, 255], &[(0, 0), (1, 0), (1, 1), (0, 1)])];
        let mut emitter = SvgEmitter::default();
        let emitted = emitter.emit(&records, dims(1, 1)).unwrap();
        assert_eq!(emitted, to_svg(&records, dims(1, 1), &no_meta()));
    }
}
