//! Shared types for the regiontrace pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contour::ContourTracerKind;

/// Re-export `RgbaImage` so downstream crates can hand decoded images
/// to the pipeline without depending on `image` directly.
pub use image::RgbaImage;

/// An integer grid coordinate.
///
/// Used both as a pixel address (`0 <= x < width`, `0 <= y < height`)
/// and as a polygon vertex on the pixel-corner lattice
/// (`0 <= x <= width`, `0 <= y <= height`). Signed so that neighbor
/// arithmetic may step one cell outside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    /// Horizontal position (column).
    pub x: i64,
    /// Vertical position (row in image space, height in output space).
    pub y: i64,
}

impl Coordinate {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// This coordinate shifted by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The four 4-connected neighbors: right, down, left, up (image space).
    ///
    /// Neighbors may lie outside the grid; callers bounds-check.
    #[must_use]
    pub const fn neighbors(self) -> [Self; 4] {
        [
            self.offset(1, 0),
            self.offset(0, 1),
            self.offset(-1, 0),
            self.offset(0, -1),
        ]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i64, i64)> for Coordinate {
    fn from((x, y): (i64, i64)) -> Self {
        Self::new(x, y)
    }
}

/// Axis-aligned extent of a set of coordinates (inclusive on both ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Smallest x.
    pub min_x: i64,
    /// Smallest y.
    pub min_y: i64,
    /// Largest x.
    pub max_x: i64,
    /// Largest y.
    pub max_y: i64,
}

impl BoundingBox {
    /// `max_x - min_x`.
    #[must_use]
    pub const fn width(&self) -> i64 {
        self.max_x - self.min_x
    }

    /// `max_y - min_y`.
    #[must_use]
    pub const fn height(&self) -> i64 {
        self.max_y - self.min_y
    }

    /// `width * height`, the layering key used by the region orderer.
    #[must_use]
    pub const fn area(&self) -> i64 {
        self.width() * self.height()
    }
}

/// A closed polygon: an ordered vertex sequence whose last vertex
/// connects back to the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon(Vec<Coordinate>);

impl Polygon {
    /// Create a new polygon from its vertices.
    #[must_use]
    pub const fn new(vertices: Vec<Coordinate>) -> Self {
        Self(vertices)
    }

    /// Returns `true` if the polygon has no vertices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of vertices.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Coordinate] {
        &self.0
    }

    /// Consumes the polygon and returns the underlying vertices.
    #[must_use]
    pub fn into_vertices(self) -> Vec<Coordinate> {
        self.0
    }

    /// The bounding box of all vertices, or `None` for an empty polygon.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.0.first()?;
        let init = BoundingBox {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(self.0.iter().fold(init, |bb, v| BoundingBox {
            min_x: bb.min_x.min(v.x),
            min_y: bb.min_y.min(v.y),
            max_x: bb.max_x.max(v.x),
            max_y: bb.max_y.max(v.y),
        }))
    }

    /// Bounding-box area, `0` for an empty polygon.
    #[must_use]
    pub fn bounding_box_area(&self) -> i64 {
        self.bounding_box().map_or(0, |bb| bb.area())
    }

    /// Twice the signed shoelace area.
    ///
    /// Positive for counter-clockwise winding in a y-up system.
    #[must_use]
    pub fn twice_signed_area(&self) -> i64 {
        let n = self.0.len();
        (0..n)
            .map(|i| {
                let a = self.0[i];
                let b = self.0[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum()
    }

    /// Enclosed area. Exact for lattice polygons with axis-aligned edges.
    #[must_use]
    pub fn area(&self) -> i64 {
        self.twice_signed_area().abs() / 2
    }

    /// Mirror every vertex about the horizontal axis: `y -> height - y`.
    ///
    /// Converts between image space (origin top-left, y down) and
    /// Cartesian space (origin bottom-left, y up). Applying it twice
    /// with the same height is the identity.
    #[must_use]
    pub fn flip_y(&self, height: u32) -> Self {
        let h = i64::from(height);
        Self(
            self.0
                .iter()
                .map(|v| Coordinate::new(v.x, h - v.y))
                .collect(),
        )
    }
}

/// Grid dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total number of pixels.
    #[must_use]
    pub const fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether `c` addresses a pixel inside the grid.
    #[must_use]
    pub fn contains(&self, c: Coordinate) -> bool {
        c.x >= 0 && c.y >= 0 && c.x < i64::from(self.width) && c.y < i64::from(self.height)
    }
}

/// What to do with a region whose outline cannot form a polygon of at
/// least three vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DegeneratePolicy {
    /// Drop the region and record its id in
    /// [`ProcessResult::skipped`].
    #[default]
    Skip,
    /// Emit whatever vertices were traced.
    Keep,
    /// Abort the run with [`PipelineError::DegenerateRegion`].
    Fail,
}

/// Configuration for the region tracing pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Which contour tracing algorithm to use.
    pub contour_tracer: ContourTracerKind,

    /// Upper bound on wall-follow steps per region.
    ///
    /// `None` uses the size of the tracing state space
    /// (`4 * boundary_pixels + 4`), past which a walk can never return
    /// to its start. Must not be `Some(0)`.
    pub max_trace_steps: Option<usize>,

    /// Handling of regions that trace to fewer than three vertices.
    pub degenerate: DegeneratePolicy,

    /// Trace regions on the rayon thread pool.
    ///
    /// Output is identical either way; regions are independent and the
    /// collected results keep discovery order.
    pub parallel: bool,
}

impl PipelineConfig {
    /// Default for [`max_trace_steps`](Self::max_trace_steps).
    pub const DEFAULT_MAX_TRACE_STEPS: Option<usize> = None;

    /// Check the invariants documented on each field.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] describing the first
    /// violated invariant.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_trace_steps == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "max_trace_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            contour_tracer: ContourTracerKind::default(),
            max_trace_steps: Self::DEFAULT_MAX_TRACE_STEPS,
            degenerate: DegeneratePolicy::default(),
            parallel: true,
        }
    }
}

/// One traced region: its color and its outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord<C> {
    /// Discovery index of the region (row-major position of its first
    /// pixel among all region seeds).
    pub region: usize,
    /// The region's color.
    pub color: C,
    /// Closed outline in Cartesian coordinates (origin bottom-left).
    pub polygon: Polygon,
}

/// Result of running the full pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult<C> {
    /// Records ordered by descending bounding-box area.
    pub records: Vec<OutputRecord<C>>,

    /// Ids of degenerate regions dropped under
    /// [`DegeneratePolicy::Skip`].
    pub skipped: Vec<usize>,

    /// Dimensions of the source grid in pixels.
    ///
    /// Emitters use this to set coordinate spaces (e.g., SVG `viewBox`)
    /// and to map Cartesian output back to image space.
    pub dimensions: Dimensions,
}

/// Errors that can occur during pipeline processing.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// The grid has no pixels.
    #[error("grid is empty ({width}x{height})")]
    EmptyGrid {
        /// Grid width in pixels.
        width: u32,
        /// Grid height in pixels.
        height: u32,
    },

    /// A region's outline has fewer than three vertices.
    #[error("region {region} ({color}) traced to a degenerate outline of {vertex_count} vertices")]
    DegenerateRegion {
        /// Discovery index of the region.
        region: usize,
        /// `Debug` rendering of the region color.
        color: String,
        /// Number of vertices the tracer produced.
        vertex_count: usize,
    },

    /// The wall-follow walk did not return to its start state.
    #[error(
        "contour trace of region {region} ({color}) did not return to {start} within {steps} steps ({count} pixels)",
        count = .pixels.len()
    )]
    NonTerminatingTrace {
        /// Discovery index of the region.
        region: usize,
        /// `Debug` rendering of the region color.
        color: String,
        /// Start pixel of the walk (image space).
        start: Coordinate,
        /// Steps taken before giving up.
        steps: usize,
        /// Every pixel of the offending region (image space).
        pixels: Vec<Coordinate>,
    },
}

/// Serde-compatible proxy for `PipelineError`.
///
/// `image::ImageError` does not implement serde, so the `ImageDecode`
/// variant stores its `Display` string instead.
#[derive(Serialize, Deserialize)]
enum PipelineErrorProxy {
    ImageDecode(String),
    EmptyInput,
    InvalidConfig(String),
    EmptyGrid {
        width: u32,
        height: u32,
    },
    DegenerateRegion {
        region: usize,
        color: String,
        vertex_count: usize,
    },
    NonTerminatingTrace {
        region: usize,
        color: String,
        start: Coordinate,
        steps: usize,
        pixels: Vec<Coordinate>,
    },
}

impl Serialize for PipelineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::ImageDecode(e) => PipelineErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => PipelineErrorProxy::EmptyInput,
            Self::InvalidConfig(s) => PipelineErrorProxy::InvalidConfig(s.clone()),
            Self::EmptyGrid { width, height } => PipelineErrorProxy::EmptyGrid {
                width: *width,
                height: *height,
            },
            Self::DegenerateRegion {
                region,
                color,
                vertex_count,
            } => PipelineErrorProxy::DegenerateRegion {
                region: *region,
                color: color.clone(),
                vertex_count: *vertex_count,
            },
            Self::NonTerminatingTrace {
                region,
                color,
                start,
                steps,
                pixels,
            } => PipelineErrorProxy::NonTerminatingTrace {
                region: *region,
                color: color.clone(),
                start: *start,
                steps: *steps,
                pixels: pixels.clone(),
            },
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PipelineError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = PipelineErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            // The typed image::ImageError cannot be rebuilt; keep the message.
            PipelineErrorProxy::ImageDecode(msg) => {
                Self::InvalidConfig(format!("image decode error: {msg}"))
            }
            PipelineErrorProxy::EmptyInput => Self::EmptyInput,
            PipelineErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
            PipelineErrorProxy::EmptyGrid { width, height } => Self::EmptyGrid { width, height },
            PipelineErrorProxy::DegenerateRegion {
                region,
                color,
                vertex_count,
            } => Self::DegenerateRegion {
                region,
                color,
                vertex_count,
            },
            PipelineErrorProxy::NonTerminatingTrace {
                region,
                color,
                start,
                steps,
                pixels,
            } => Self::NonTerminatingTrace {
                region,
                color,
                start,
                steps,
                pixels,
            },
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square(x0: i64, y0: i64, side: i64) -> Polygon {
        Polygon::new(vec![
            Coordinate::new(x0, y0),
            Coordinate::new(x0 + side, y0),
            Coordinate::new(x0 + side, y0 + side),
            Coordinate::new(x0, y0 + side),
        ])
    }

    // --- Coordinate tests ---

    #[test]
    fn coordinate_offset() {
        assert_eq!(Coordinate::new(1, 2).offset(-1, 3), Coordinate::new(0, 5));
    }

    #[test]
    fn coordinate_neighbors_are_four_connected() {
        let n = Coordinate::new(0, 0).neighbors();
        assert_eq!(n.len(), 4);
        for c in n {
            assert_eq!(c.x.abs() + c.y.abs(), 1);
        }
    }

    #[test]
    fn coordinate_display() {
        assert_eq!(Coordinate::new(3, -1).to_string(), "(3, -1)");
    }

    // --- Polygon tests ---

    #[test]
    fn polygon_empty() {
        let p = Polygon::new(vec![]);
        assert!(p.is_empty());
        assert!(p.bounding_box().is_none());
        assert_eq!(p.bounding_box_area(), 0);
        assert_eq!(p.area(), 0);
    }

    #[test]
    fn polygon_bounding_box() {
        let p = Polygon::new(vec![
            Coordinate::new(1, 5),
            Coordinate::new(4, 2),
            Coordinate::new(3, 7),
        ]);
        let bb = p.bounding_box().unwrap();
        assert_eq!(
            bb,
            BoundingBox {
                min_x: 1,
                min_y: 2,
                max_x: 4,
                max_y: 7
            }
        );
        assert_eq!(bb.area(), 15);
        assert_eq!(p.bounding_box_area(), 15);
    }

    #[test]
    fn counter_clockwise_square_has_positive_area() {
        let p = square(0, 0, 3);
        assert_eq!(p.twice_signed_area(), 18);
        assert_eq!(p.area(), 9);
    }

    #[test]
    fn clockwise_square_has_negative_signed_area() {
        let mut v = square(0, 0, 2).into_vertices();
        v.reverse();
        let p = Polygon::new(v);
        assert_eq!(p.twice_signed_area(), -8);
        assert_eq!(p.area(), 4);
    }

    #[test]
    fn flip_y_mirrors_and_is_involutive() {
        let p = square(1, 0, 1);
        let flipped = p.flip_y(4);
        assert_eq!(
            flipped.vertices(),
            &[
                Coordinate::new(1, 4),
                Coordinate::new(2, 4),
                Coordinate::new(2, 3),
                Coordinate::new(1, 3),
            ]
        );
        assert_eq!(flipped.flip_y(4), p);
        assert_eq!(flipped.area(), p.area());
    }

    // --- Dimensions tests ---

    #[test]
    fn dimensions_contains() {
        let d = Dimensions {
            width: 3,
            height: 2,
        };
        assert!(d.contains(Coordinate::new(0, 0)));
        assert!(d.contains(Coordinate::new(2, 1)));
        assert!(!d.contains(Coordinate::new(3, 1)));
        assert!(!d.contains(Coordinate::new(0, 2)));
        assert!(!d.contains(Coordinate::new(-1, 0)));
        assert_eq!(d.pixel_count(), 6);
    }

    // --- PipelineConfig tests ---

    #[test]
    fn pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.contour_tracer, ContourTracerKind::WallFollow);
        assert_eq!(config.max_trace_steps, None);
        assert_eq!(config.degenerate, DegeneratePolicy::Skip);
        assert!(config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_step_budget_is_invalid() {
        let config = PipelineConfig {
            max_trace_steps: Some(0),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    // --- PipelineError tests ---

    #[test]
    fn error_empty_grid_display() {
        let err = PipelineError::EmptyGrid {
            width: 0,
            height: 5,
        };
        assert_eq!(err.to_string(), "grid is empty (0x5)");
    }

    #[test]
    fn error_non_terminating_display_mentions_region_and_pixels() {
        let err = PipelineError::NonTerminatingTrace {
            region: 3,
            color: "[1, 2, 3, 255]".to_string(),
            start: Coordinate::new(4, 9),
            steps: 12,
            pixels: vec![Coordinate::new(4, 9), Coordinate::new(5, 9)],
        };
        assert_eq!(
            err.to_string(),
            "contour trace of region 3 ([1, 2, 3, 255]) did not return to (4, 9) within 12 steps (2 pixels)",
        );
    }

    // --- Serde tests ---

    #[test]
    fn pipeline_config_serde_round_trip() {
        let config = PipelineConfig {
            contour_tracer: ContourTracerKind::WallFollow,
            max_trace_steps: Some(500),
            degenerate: DegeneratePolicy::Fail,
            parallel: false,
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn process_result_serde_round_trip() {
        let result = ProcessResult {
            records: vec![OutputRecord {
                region: 0,
                color: [10_u8, 20, 30, 255],
                polygon: square(0, 0, 1),
            }],
            skipped: vec![2],
            dimensions: Dimensions {
                width: 1,
                height: 1,
            },
        };
        let json = serde_json::to_string(&result).unwrap();
        let deserialized: ProcessResult<[u8; 4]> = serde_json::from_str(&json).unwrap();
        assert_eq!(result, deserialized);
    }

    #[test]
    fn non_terminating_error_serde_keeps_region_pixels() {
        let err = PipelineError::NonTerminatingTrace {
            region: 1,
            color: "7".to_string(),
            start: Coordinate::new(0, 1),
            steps: 8,
            pixels: vec![Coordinate::new(0, 1)],
        };
        let json = serde_json::to_string(&err).unwrap();
        let deserialized: PipelineError = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            deserialized,
            PipelineError::NonTerminatingTrace { region: 1, steps: 8, ref pixels, .. }
                if pixels == &[Coordinate::new(0, 1)]
        ));
    }

    #[test]
    fn pipeline_error_serde_round_trip_empty_grid() {
        let err = PipelineError::EmptyGrid {
            width: 0,
            height: 0,
        };
        let json = serde_json::to_string(&err).unwrap();
        let deserialized: PipelineError = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            deserialized,
            PipelineError::EmptyGrid {
                width: 0,
                height: 0
            }
        ));
    }
}
