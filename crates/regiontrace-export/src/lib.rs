//! regiontrace-export: Pure format serializers (sans-IO)
//!
//! Converts traced region records into output formats. Currently
//! supports SVG and JSON. Both are available as plain functions and as
//! [`Emitter`](regiontrace_pipeline::Emitter) implementations.

pub mod json;
pub mod svg;

pub use json::{JsonEmitter, to_json};
pub use svg::{CssColor, SvgEmitter, SvgMetadata, build_path_data, to_svg};

use regiontrace_pipeline::PipelineError;

/// Errors from running the pipeline into an exporter.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The pipeline failed before anything was emitted.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// JSON serialization failed.
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}
