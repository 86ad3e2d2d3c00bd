//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::process`] which runs the entire pipeline in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use regiontrace_pipeline::{Pipeline, PipelineConfig, PipelineError, VecGrid};
//! # fn run() -> Result<(), PipelineError> {
//! let grid = VecGrid::from_text(&["ab", "aa"]).unwrap();
//! let ordered = Pipeline::new(grid, PipelineConfig::default())
//!     .segment()?
//!     .extract_boundaries()
//!     .trace_contours()?
//!     .order();
//!
//! assert_eq!(ordered.records().len(), 2);
//! let result = ordered.into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages), carrying what later stages and the
//! caller still need. The caller can inspect the current stage's output
//! via accessor methods at any point.
//!
//! # Concurrency
//!
//! Boundary extraction and tracing are independent per region. With
//! `config.parallel` they run on the rayon global pool; indexed
//! collection keeps results in discovery order, so output does not
//! depend on scheduling. When several regions fail, the error of the
//! region discovered first is reported.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use rayon::prelude::*;

use crate::boundary::{BoundaryPixelSet, extract_boundary};
use crate::contour::{ContourTracer, TraceError, TraceOptions};
use crate::diagnostics::StageMetrics;
use crate::emit::Emitter;
use crate::grid::PixelGrid;
use crate::segment::{Region, Segmentation};
use crate::types::{
    DegeneratePolicy, Dimensions, OutputRecord, PipelineConfig, PipelineError, ProcessResult,
};

/// Entry point of the staged API.
pub struct Pipeline;

impl Pipeline {
    /// Start a pipeline over `grid`.
    ///
    /// Nothing is computed until [`Pending::segment`] is called.
    pub const fn new<G: PixelGrid>(grid: G, config: PipelineConfig) -> Pending<G> {
        Pending { config, grid }
    }
}

/// Apply `f` to `0..len`, on the rayon pool when `parallel` is set.
///
/// The result is in index order either way.
fn map_indices<R, F>(len: usize, parallel: bool, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    if parallel {
        (0..len).into_par_iter().map(&f).collect()
    } else {
        (0..len).map(&f).collect()
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`segment`](Self::segment) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing (call .segment() to continue)"]
pub struct Pending<G> {
    config: PipelineConfig,
    grid: G,
}

impl<G: PixelGrid> Pending<G> {
    /// The source grid.
    #[must_use]
    pub const fn grid(&self) -> &G {
        &self.grid
    }

    /// Validate the config and partition the grid into regions.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for an invalid config and
    /// [`PipelineError::EmptyGrid`] for a grid without pixels.
    pub fn segment(self) -> Result<Segmented<G::Color>, PipelineError> {
        self.config.validate()?;
        let segmentation = crate::segment::segment(&self.grid)?;
        Ok(Segmented {
            config: self.config,
            segmentation,
        })
    }
}

// ───────────────────────── Stage 1: Segmented ────────────────────────

/// Pipeline state after region segmentation.
///
/// Call [`extract_boundaries`](Self::extract_boundaries) to advance.
#[must_use = "pipeline stages are consumed by advancing (call .extract_boundaries() to continue)"]
pub struct Segmented<C> {
    config: PipelineConfig,
    segmentation: Segmentation<C>,
}

impl<C: Send + Sync> Segmented<C> {
    /// The region partition.
    #[must_use]
    pub const fn segmentation(&self) -> &Segmentation<C> {
        &self.segmentation
    }

    /// Find each region's boundary pixels.
    pub fn extract_boundaries(self) -> BoundariesExtracted<C> {
        let regions = self.segmentation.regions();
        let boundaries = map_indices(regions.len(), self.config.parallel, |i| {
            extract_boundary(&regions[i])
        });
        tracing::debug!(
            regions = boundaries.len(),
            boundary_pixels = boundaries.iter().map(BoundaryPixelSet::len).sum::<usize>(),
            "extracted boundaries"
        );
        BoundariesExtracted {
            config: self.config,
            segmentation: self.segmentation,
            boundaries,
        }
    }
}

// ───────────────────────── Stage 2: BoundariesExtracted ──────────────

/// Pipeline state after boundary extraction.
///
/// `boundaries()[i]` belongs to `segmentation().regions()[i]`. Call
/// [`trace_contours`](Self::trace_contours) to advance; this is a
/// fallible step.
#[must_use = "pipeline stages are consumed by advancing (call .trace_contours() to continue)"]
pub struct BoundariesExtracted<C> {
    config: PipelineConfig,
    segmentation: Segmentation<C>,
    boundaries: Vec<BoundaryPixelSet>,
}

/// What tracing made of one region.
enum RegionOutcome<C> {
    Traced(OutputRecord<C>),
    Skipped(usize),
}

impl<C: Clone + Debug + Send + Sync> BoundariesExtracted<C> {
    /// The region partition.
    #[must_use]
    pub const fn segmentation(&self) -> &Segmentation<C> {
        &self.segmentation
    }

    /// Boundary pixel sets, parallel to the regions.
    #[must_use]
    pub fn boundaries(&self) -> &[BoundaryPixelSet] {
        &self.boundaries
    }

    /// Trace every region's outline.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NonTerminatingTrace`] if a walk exceeds
    /// its step budget, and [`PipelineError::DegenerateRegion`] for an
    /// outline of fewer than three vertices under
    /// [`DegeneratePolicy::Fail`].
    pub fn trace_contours(self) -> Result<Traced<C>, PipelineError> {
        let dimensions = self.segmentation.dimensions();
        let options = TraceOptions {
            height: dimensions.height,
            max_steps: self.config.max_trace_steps,
        };
        let regions = self.segmentation.regions();
        let outcomes = map_indices(regions.len(), self.config.parallel, |i| {
            trace_region(&regions[i], &self.boundaries[i], &self.config, &options)
        });

        let mut records = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome? {
                RegionOutcome::Traced(record) => records.push(record),
                RegionOutcome::Skipped(id) => skipped.push(id),
            }
        }

        tracing::debug!(
            traced = records.len(),
            skipped = skipped.len(),
            "traced contours"
        );

        Ok(Traced {
            config: self.config,
            dimensions,
            records,
            skipped,
        })
    }
}

/// Trace one region and apply the degenerate-outline policy.
fn trace_region<C: Clone + Debug>(
    region: &Region<C>,
    boundary: &BoundaryPixelSet,
    config: &PipelineConfig,
    options: &TraceOptions,
) -> Result<RegionOutcome<C>, PipelineError> {
    let polygon = match config.contour_tracer.trace(boundary, options) {
        Ok(polygon) => polygon,
        Err(TraceError::EmptyBoundary) => crate::types::Polygon::new(Vec::new()),
        Err(TraceError::NonTerminating { start, steps }) => {
            return Err(PipelineError::NonTerminatingTrace {
                region: region.id(),
                color: format!("{:?}", region.color()),
                start,
                steps,
                pixels: region.pixels().iter().copied().collect(),
            });
        }
    };

    if polygon.len() < 3 {
        match config.degenerate {
            DegeneratePolicy::Skip => {
                tracing::warn!(
                    region = region.id(),
                    color = ?region.color(),
                    vertices = polygon.len(),
                    "skipping degenerate region"
                );
                return Ok(RegionOutcome::Skipped(region.id()));
            }
            DegeneratePolicy::Fail => {
                return Err(PipelineError::DegenerateRegion {
                    region: region.id(),
                    color: format!("{:?}", region.color()),
                    vertex_count: polygon.len(),
                });
            }
            DegeneratePolicy::Keep => {}
        }
    }

    Ok(RegionOutcome::Traced(OutputRecord {
        region: region.id(),
        color: region.color().clone(),
        polygon,
    }))
}

// ───────────────────────── Stage 3: Traced ───────────────────────────

/// Pipeline state after contour tracing; records are in discovery order.
///
/// Call [`order`](Self::order) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing (call .order() to continue)"]
pub struct Traced<C> {
    config: PipelineConfig,
    dimensions: Dimensions,
    records: Vec<OutputRecord<C>>,
    skipped: Vec<usize>,
}

impl<C> Traced<C> {
    /// Traced records in discovery order.
    #[must_use]
    pub fn records(&self) -> &[OutputRecord<C>] {
        &self.records
    }

    /// Ids of regions dropped as degenerate.
    #[must_use]
    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    /// The configuration this run uses.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Sort records by descending bounding-box area (stable).
    pub fn order(self) -> Ordered<C> {
        let records = crate::order::order_records(self.records);
        Ordered {
            dimensions: self.dimensions,
            records,
            skipped: self.skipped,
        }
    }
}

// ───────────────────────── Stage 4: Ordered ──────────────────────────

/// Pipeline state after ordering, the final stage.
///
/// Call [`into_result`](Self::into_result) to extract the
/// [`ProcessResult`], or [`emit`](Self::emit) to hand the records to an
/// [`Emitter`].
#[must_use = "call .into_result() or .emit() to use the ordered records"]
pub struct Ordered<C> {
    dimensions: Dimensions,
    records: Vec<OutputRecord<C>>,
    skipped: Vec<usize>,
}

impl<C> Ordered<C> {
    /// Records ordered by descending bounding-box area.
    #[must_use]
    pub fn records(&self) -> &[OutputRecord<C>] {
        &self.records
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Render the ordered records with `emitter`.
    ///
    /// # Errors
    ///
    /// Propagates the emitter's error.
    pub fn emit<E: Emitter<C>>(&self, emitter: &mut E) -> Result<E::Output, E::Error> {
        emitter.emit(&self.records, self.dimensions)
    }

    /// Consume the pipeline and return the [`ProcessResult`].
    #[must_use]
    pub fn into_result(self) -> ProcessResult<C> {
        ProcessResult {
            records: self.records,
            skipped: self.skipped,
            dimensions: self.dimensions,
        }
    }
}

// ──────────────────────────── PipelineStage ──────────────────────────

/// Total number of stages in the pipeline.
pub const STAGE_COUNT: usize = 5;

/// Trait implemented by every pipeline stage, giving uniform access to
/// its name, position, and diagnostics.
pub trait PipelineStage {
    /// Human-readable name of this stage (e.g. `"segment"`).
    const NAME: &str;

    /// Zero-based index of this stage (`0` for Pending through `4` for
    /// Ordered).
    const INDEX: usize;

    /// Stage-specific metrics for diagnostics.
    ///
    /// Returns `None` for the initial [`Pending`] stage which has not
    /// yet performed any processing.
    fn metrics(&self) -> Option<StageMetrics>;
}

impl<G: PixelGrid> PipelineStage for Pending<G> {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn metrics(&self) -> Option<StageMetrics> {
        None
    }
}

impl<C: Eq + Hash> PipelineStage for Segmented<C> {
    const NAME: &str = "segment";
    const INDEX: usize = 1;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }
}

impl<C: Eq + Hash> Segmented<C> {
    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        let dimensions = self.segmentation.dimensions();
        let regions = self.segmentation.regions();
        let colors: HashSet<&C> = regions.iter().map(Region::color).collect();
        StageMetrics::Segment {
            width: dimensions.width,
            height: dimensions.height,
            pixel_count: dimensions.pixel_count(),
            region_count: regions.len(),
            color_count: colors.len(),
            largest_region_pixels: regions.iter().map(Region::len).max().unwrap_or(0),
        }
    }
}

impl<C> PipelineStage for BoundariesExtracted<C> {
    const NAME: &str = "boundary";
    const INDEX: usize = 2;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }
}

impl<C> BoundariesExtracted<C> {
    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        let boundary_pixel_count: usize = self.boundaries.iter().map(BoundaryPixelSet::len).sum();
        let pixel_count = self.segmentation.dimensions().pixel_count();
        StageMetrics::Boundary {
            region_count: self.boundaries.len(),
            boundary_pixel_count,
            interior_pixel_count: pixel_count
                .saturating_sub(u64::try_from(boundary_pixel_count).unwrap_or(u64::MAX)),
        }
    }
}

impl<C> PipelineStage for Traced<C> {
    const NAME: &str = "trace";
    const INDEX: usize = 3;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }
}

impl<C> Traced<C> {
    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        let stats = crate::diagnostics::vertex_stats(&self.records);
        StageMetrics::Trace {
            traced_count: self.records.len(),
            skipped_count: self.skipped.len(),
            total_vertex_count: stats.total,
            min_vertices: stats.min,
            max_vertices: stats.max,
            mean_vertices: stats.mean,
        }
    }
}

impl<C> PipelineStage for Ordered<C> {
    const NAME: &str = "order";
    const INDEX: usize = 4;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }
}

impl<C> Ordered<C> {
    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        let areas = self.records.iter().map(|r| r.polygon.bounding_box_area());
        StageMetrics::Order {
            record_count: self.records.len(),
            largest_area: areas.clone().max().unwrap_or(0),
            smallest_area: areas.min().unwrap_or(0),
        }
    }
}
