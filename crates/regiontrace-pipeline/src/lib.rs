//! regiontrace-pipeline: Region segmentation and contour tracing (sans-IO).
//!
//! Converts a raster grid of colors into one closed polygon per
//! connected same-color region through:
//! segment -> boundary extraction -> contour tracing -> ordering.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! grids and returns structured data. Rendering to files lives in
//! `regiontrace-export`; reading from disk lives in the `regiontrace`
//! binary.
//!
//! ```rust
//! use regiontrace_pipeline::{Coordinate, PipelineConfig, VecGrid, process};
//!
//! let grid = VecGrid::from_text(&["aa", "aa"]).unwrap();
//! let result = process(&grid, &PipelineConfig::default()).unwrap();
//!
//! assert_eq!(result.records.len(), 1);
//! assert_eq!(
//!     result.records[0].polygon.vertices(),
//!     &[
//!         Coordinate::new(0, 0),
//!         Coordinate::new(2, 0),
//!         Coordinate::new(2, 2),
//!         Coordinate::new(0, 2),
//!     ],
//! );
//! ```

pub mod boundary;
pub mod contour;
pub mod decode;
pub mod diagnostics;
pub mod direction;
pub mod emit;
pub mod grid;
pub mod order;
pub mod pipeline;
pub mod segment;
pub mod types;

pub use boundary::BoundaryPixelSet;
pub use contour::{ContourTracer, ContourTracerKind};
pub use emit::Emitter;
pub use grid::{PixelGrid, VecGrid};
pub use pipeline::{Pipeline, PipelineStage};
pub use segment::{Region, Segmentation};
pub use types::{
    BoundingBox, Coordinate, DegeneratePolicy, Dimensions, OutputRecord, PipelineConfig,
    PipelineError, Polygon, ProcessResult, RgbaImage,
};

/// Run the full region tracing pipeline.
///
/// Takes any [`PixelGrid`] and a configuration, then produces a
/// [`ProcessResult`] with one [`OutputRecord`] per region, largest
/// bounding box first, plus the grid dimensions. The dimensions are
/// needed by export serializers to set coordinate spaces (e.g., SVG
/// `viewBox`) and to undo the Cartesian flip.
///
/// # Pipeline steps
///
/// 1. Segment the grid into 4-connected same-color regions
/// 2. Extract each region's boundary pixels
/// 3. Trace each boundary into a closed polygon (pluggable strategy)
/// 4. Order polygons by descending bounding-box area
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
/// Returns [`PipelineError::EmptyGrid`] if the grid has no pixels.
/// Returns [`PipelineError::NonTerminatingTrace`] if a walk exceeds its
/// step budget.
/// Returns [`PipelineError::DegenerateRegion`] for a degenerate outline
/// under [`DegeneratePolicy::Fail`].
pub fn process<G: PixelGrid>(
    grid: G,
    config: &PipelineConfig,
) -> Result<ProcessResult<G::Color>, PipelineError> {
    Ok(Pipeline::new(grid, config.clone())
        .segment()?
        .extract_boundaries()
        .trace_contours()?
        .order()
        .into_result())
}

/// Run the pipeline and hand the ordered records to `emitter`.
///
/// # Errors
///
/// Pipeline failures are converted into the emitter's error type;
/// emitter failures are returned as-is. Nothing is emitted if the
/// pipeline fails.
pub fn process_into<G, E>(
    grid: G,
    config: &PipelineConfig,
    emitter: &mut E,
) -> Result<E::Output, E::Error>
where
    G: PixelGrid,
    E: Emitter<G::Color>,
    E::Error: From<PipelineError>,
{
    let ordered = Pipeline::new(grid, config.clone())
        .segment()?
        .extract_boundaries()
        .trace_contours()?
        .order();
    ordered.emit(emitter)
}
