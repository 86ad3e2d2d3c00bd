//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! [`process_with_diagnostics`] runs the staged pipeline and records a
//! [`StageDiagnostics`] entry per stage. Timestamps come from an injected
//! [`Clock`] so the core stays free of platform time sources; the CLI
//! supplies one backed by `std::time::Instant`.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::grid::PixelGrid;
use crate::pipeline::{BoundariesExtracted, Ordered, Pipeline, PipelineStage, Segmented, Traced};
use crate::types::{OutputRecord, PipelineConfig, PipelineError, ProcessResult};

/// Source of monotonic timestamps.
pub trait Clock {
    /// Opaque timestamp.
    type Instant;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: region segmentation.
    pub segment: StageDiagnostics,
    /// Stage 2: boundary extraction.
    pub boundary: StageDiagnostics,
    /// Stage 3: contour tracing.
    pub trace: StageDiagnostics,
    /// Stage 4: ordering by bounding-box area.
    pub order: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Region segmentation metrics.
    Segment {
        /// Grid width in pixels.
        width: u32,
        /// Grid height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
        /// Number of regions found.
        region_count: usize,
        /// Number of distinct colors among the regions.
        color_count: usize,
        /// Pixel count of the largest region.
        largest_region_pixels: usize,
    },
    /// Boundary extraction metrics.
    Boundary {
        /// Number of boundary sets (one per region).
        region_count: usize,
        /// Boundary pixels summed over all regions.
        boundary_pixel_count: usize,
        /// Pixels with all four neighbors in their own region.
        interior_pixel_count: u64,
    },
    /// Contour tracing metrics.
    Trace {
        /// Number of regions that produced a record.
        traced_count: usize,
        /// Number of degenerate regions dropped.
        skipped_count: usize,
        /// Total vertices across all outlines.
        total_vertex_count: usize,
        /// Fewest vertices in any outline.
        min_vertices: usize,
        /// Most vertices in any outline.
        max_vertices: usize,
        /// Mean vertices per outline.
        mean_vertices: f64,
    },
    /// Ordering metrics.
    Order {
        /// Number of records ordered.
        record_count: usize,
        /// Largest bounding-box area.
        largest_area: i64,
        /// Smallest bounding-box area.
        smallest_area: i64,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source grid width in pixels.
    pub image_width: u32,
    /// Source grid height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Number of regions found.
    pub region_count: usize,
    /// Number of records produced.
    pub record_count: usize,
    /// Number of degenerate regions dropped.
    pub skipped_count: usize,
    /// Vertices across all output polygons.
    pub total_vertex_count: usize,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let stages = [
            ("Segment", &self.segment),
            ("Boundary", &self.boundary),
            ("Trace", &self.trace),
            ("Order", &self.order),
        ];

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Regions: {}  |  Records: {}  |  Skipped: {}  |  Vertices: {}",
            self.summary.region_count,
            self.summary.record_count,
            self.summary.skipped_count,
            self.summary.total_vertex_count,
        ));

        lines.join("\n")
    }
}

/// Run the full pipeline, timing each stage with `clock`.
///
/// Produces the same [`ProcessResult`] as [`crate::process`].
///
/// # Errors
///
/// Returns the first [`PipelineError`] raised by any stage.
pub fn process_with_diagnostics<G: PixelGrid, K: Clock>(
    grid: G,
    config: &PipelineConfig,
    clock: &K,
) -> Result<(ProcessResult<G::Color>, PipelineDiagnostics), PipelineError> {
    let total_start = clock.now();
    let pending = Pipeline::new(grid, config.clone());

    let start = clock.now();
    let segmented = pending.segment()?;
    let segment = stage(
        Segmented::<G::Color>::NAME,
        clock.elapsed(&start),
        segmented.stage_metrics(),
    );
    let dimensions = segmented.segmentation().dimensions();
    let region_count = segmented.segmentation().regions().len();

    let start = clock.now();
    let extracted = segmented.extract_boundaries();
    let boundary = stage(
        BoundariesExtracted::<G::Color>::NAME,
        clock.elapsed(&start),
        extracted.stage_metrics(),
    );

    let start = clock.now();
    let traced = extracted.trace_contours()?;
    let trace = stage(
        Traced::<G::Color>::NAME,
        clock.elapsed(&start),
        traced.stage_metrics(),
    );

    let start = clock.now();
    let ordered = traced.order();
    let order = stage(
        Ordered::<G::Color>::NAME,
        clock.elapsed(&start),
        ordered.stage_metrics(),
    );

    let result = ordered.into_result();
    let total_duration = clock.elapsed(&total_start);

    let summary = PipelineSummary {
        image_width: dimensions.width,
        image_height: dimensions.height,
        pixel_count: dimensions.pixel_count(),
        region_count,
        record_count: result.records.len(),
        skipped_count: result.skipped.len(),
        total_vertex_count: vertex_stats(&result.records).total,
    };

    Ok((
        result,
        PipelineDiagnostics {
            segment,
            boundary,
            trace,
            order,
            total_duration,
            summary,
        },
    ))
}

/// Package one stage's timing and metrics.
fn stage(name: &str, duration: Duration, metrics: StageMetrics) -> StageDiagnostics {
    tracing::debug!(stage = name, ?duration, "stage complete");
    StageDiagnostics { duration, metrics }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Segment {
            width,
            height,
            region_count,
            color_count,
            largest_region_pixels,
            ..
        } => format!(
            "{width}x{height} -> {region_count} regions, {color_count} colors (largest={largest_region_pixels} px)"
        ),
        StageMetrics::Boundary {
            boundary_pixel_count,
            interior_pixel_count,
            ..
        } => format!("boundary={boundary_pixel_count} interior={interior_pixel_count}"),
        StageMetrics::Trace {
            traced_count,
            skipped_count,
            total_vertex_count,
            min_vertices,
            max_vertices,
            mean_vertices,
        } => format!(
            "{traced_count} polygons ({skipped_count} skipped), {total_vertex_count} vertices (min={min_vertices} max={max_vertices} mean={mean_vertices:.1})"
        ),
        StageMetrics::Order {
            record_count,
            largest_area,
            smallest_area,
        } => format!("{record_count} records, bbox area {largest_area}..{smallest_area}"),
    }
}

/// Vertex-count statistics over a set of records.
pub(crate) struct VertexStats {
    /// Total vertices across all polygons.
    pub total: usize,
    /// Fewest vertices in any polygon.
    pub min: usize,
    /// Most vertices in any polygon.
    pub max: usize,
    /// Mean vertices per polygon.
    pub mean: f64,
}

/// Compute vertex statistics from a set of records.
pub(crate) fn vertex_stats<C>(records: &[OutputRecord<C>]) -> VertexStats {
    let counts = || records.iter().map(|r| r.polygon.len());
    let total: usize = counts().sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = if records.is_empty() {
        0.0
    } else {
        total as f64 / records.len() as f64
    };
    VertexStats {
        total,
        min: counts().min().unwrap_or(0),
        max: counts().max().unwrap_or(0),
        mean,
    }
}
