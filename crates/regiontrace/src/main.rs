//! regiontrace: trace every same-color region of an image into a polygon.
//!
//! Reads an image file, partitions it into 4-connected regions of
//! identical color, traces each region's outline, and prints per-stage
//! diagnostics. Optionally writes the ordered polygons as SVG and/or
//! JSON.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin regiontrace -- [OPTIONS] <IMAGE_PATH>
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use regiontrace_pipeline::diagnostics::{Clock, PipelineDiagnostics, process_with_diagnostics};
use regiontrace_pipeline::{DegeneratePolicy, PipelineConfig, ProcessResult};
use tracing_subscriber::EnvFilter;

/// Trace same-color regions of an image into polygons.
///
/// Runs the region tracing pipeline on a given image and prints
/// per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "regiontrace", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Upper bound on wall-follow steps per region (default: derived
    /// from the region's boundary size).
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    max_trace_steps: Option<usize>,

    /// What to do with regions whose outline has fewer than 3 vertices.
    #[arg(long, value_enum, default_value_t = Degenerate::Skip)]
    degenerate: Degenerate,

    /// Trace regions on the current thread only.
    #[arg(long)]
    sequential: bool,

    /// Write SVG output to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write region polygons as JSON to file.
    #[arg(long)]
    output_json: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Degenerate region handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Degenerate {
    /// Drop the region and keep going.
    Skip,
    /// Emit the region with whatever vertices were traced.
    Keep,
    /// Abort with an error.
    Fail,
}

impl From<Degenerate> for DegeneratePolicy {
    fn from(d: Degenerate) -> Self {
        match d {
            Degenerate::Skip => Self::Skip,
            Degenerate::Keep => Self::Keep,
            Degenerate::Fail => Self::Fail,
        }
    }
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.  Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        PipelineConfig {
            max_trace_steps: cli.max_trace_steps,
            degenerate: cli.degenerate.into(),
            parallel: !cli.sequential,
            ..PipelineConfig::default()
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let image = match regiontrace_pipeline::decode::decode_rgba(&image_bytes) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error decoding {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        path = %cli.image_path.display(),
        bytes = image_bytes.len(),
        width = image.width(),
        height = image.height(),
        runs = cli.runs,
        "loaded image"
    );
    tracing::debug!(?config, "pipeline config");

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        let (result, diagnostics) = match process_with_diagnostics(&image, &config, &StdClock) {
            Ok(pair) => pair,
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        };

        if cli.json {
            match serde_json::to_string_pretty(&diagnostics) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!("{}", diagnostics.report());
        }

        // Write outputs on the first run only.
        if run == 0
            && let Err(msg) = write_outputs(&cli, &config, &result)
        {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }

        all_diagnostics.push(diagnostics);

        if cli.runs > 1 {
            eprintln!();
        }
    }

    // Print summary when multiple runs.
    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Write the `--svg` and `--output-json` files requested on the command
/// line.
fn write_outputs(
    cli: &Cli,
    config: &PipelineConfig,
    result: &ProcessResult<[u8; 4]>,
) -> Result<(), String> {
    if let Some(ref svg_path) = cli.svg {
        let title = cli
            .image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("regiontrace");
        let desc = format!("{config:?}");
        let metadata = regiontrace_export::SvgMetadata {
            title: Some(title),
            description: Some(&desc),
        };
        let svg = regiontrace_export::to_svg(&result.records, result.dimensions, &metadata);
        write_file(svg_path, &svg, "SVG")?;
    }

    if let Some(ref json_path) = cli.output_json {
        let json = regiontrace_export::to_json(&result.records, result.dimensions)
            .map_err(|e| format!("Error serializing regions: {e}"))?;
        write_file(json_path, &json, "JSON")?;
    }

    Ok(())
}

fn write_file(path: &Path, contents: &str, kind: &str) -> Result<(), String> {
    std::fs::write(path, contents)
        .map_err(|e| format!("Error writing {kind} to {}: {e}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        bytes = contents.len(),
        "{kind} written"
    );
    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Min, mean, and max of `samples`; all zero when there are none.
#[allow(clippy::cast_precision_loss)]
fn spread(samples: &[f64]) -> (f64, f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    (min, mean, max)
}

/// Print per-stage timing spread across repeated runs.
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    if all_diagnostics.is_empty() {
        return;
    }

    let rows: [(&str, fn(&PipelineDiagnostics) -> Duration); 5] = [
        ("segment", |d| d.segment.duration),
        ("boundary", |d| d.boundary.duration),
        ("trace", |d| d.trace.duration),
        ("order", |d| d.order.duration),
        ("total", |d| d.total_duration),
    ];

    println!();
    println!("Timing over {} runs", all_diagnostics.len());
    println!("{:<10} {:>12} {:>12} {:>12}", "stage", "min", "mean", "max");
    println!("{}", "-".repeat(49));
    for (name, duration_of) in rows {
        let samples: Vec<f64> = all_diagnostics
            .iter()
            .map(|d| duration_of(d).as_secs_f64() * 1000.0)
            .collect();
        let (min, mean, max) = spread(&samples);
        println!("{name:<10} {min:>10.3}ms {mean:>10.3}ms {max:>10.3}ms");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("regiontrace").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&["in.png"]);
        assert_eq!(cli.image_path, PathBuf::from("in.png"));
        assert_eq!(cli.degenerate, Degenerate::Skip);
        assert_eq!(cli.runs, 1);
        assert!(!cli.sequential);
        assert!(!cli.json);
        assert!(cli.svg.is_none());
        assert!(cli.output_json.is_none());
        assert_eq!(config_from_cli(&cli).unwrap(), PipelineConfig::default());
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = parse(&[
            "in.png",
            "--max-trace-steps",
            "500",
            "--degenerate",
            "fail",
            "--sequential",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.max_trace_steps, Some(500));
        assert_eq!(config.degenerate, DegeneratePolicy::Fail);
        assert!(!config.parallel);
    }

    #[test]
    fn output_paths() {
        let cli = parse(&["in.png", "--svg", "out.svg", "--output-json", "out.json"]);
        assert_eq!(cli.svg, Some(PathBuf::from("out.svg")));
        assert_eq!(cli.output_json, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn zero_trace_steps_rejected_by_parser() {
        let result = Cli::try_parse_from(["regiontrace", "in.png", "--max-trace-steps", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn image_path_is_required() {
        assert!(Cli::try_parse_from(["regiontrace"]).is_err());
    }

    #[test]
    fn unknown_degenerate_policy_rejected() {
        let result = Cli::try_parse_from(["regiontrace", "in.png", "--degenerate", "maybe"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_json_overrides_flags() {
        let json = serde_json::to_string(&PipelineConfig {
            degenerate: DegeneratePolicy::Keep,
            ..PipelineConfig::default()
        })
        .unwrap();
        let cli = parse(&["in.png", "--sequential", "--config-json", &json]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.degenerate, DegeneratePolicy::Keep);
        assert!(config.parallel);
    }

    #[test]
    fn malformed_config_json_is_an_error() {
        let cli = parse(&["in.png", "--config-json", "{not json"]);
        let err = config_from_cli(&cli).unwrap_err();
        assert!(err.starts_with("Error parsing --config-json"));
    }

    #[test]
    fn invalid_config_json_is_rejected() {
        let mut config = serde_json::to_value(PipelineConfig::default()).unwrap();
        config["max_trace_steps"] = serde_json::json!(0);
        let cli = parse(&["in.png", "--config-json", &config.to_string()]);
        let err = config_from_cli(&cli).unwrap_err();
        assert!(err.contains("max_trace_steps"));
    }

    #[test]
    fn spread_of_run_timings() {
        assert_eq!(spread(&[]), (0.0, 0.0, 0.0));
        assert_eq!(spread(&[3.0, 1.0, 2.0]), (1.0, 2.0, 3.0));
    }
}
