//! rubble: command-line front end for crushed-stone particle analysis.
//!
//! Analyzes photographs of crushed stone, reports particle size
//! measurements and a crusher health estimate, and keeps a bounded history
//! of past runs in a data directory.
//!
//! # Usage
//!
//! ```text
//! rubble analyze sample.jpg --csv contours.csv --annotate overlay.png
//! rubble batch samples/*.jpg --strategy hybrid
//! rubble demo --output demo.png --analyze
//! rubble history --limit 5
//! rubble config show
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod demo;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::DynamicImage;
use rubble_export::{BatchSummary, ScaleRatio, Units};
use rubble_io::DataStore;
use rubble_pipeline::diagnostics::Clock;
use rubble_pipeline::{
    AlgorithmChoice, AnalysisConfig, AnalysisOutcome, AnalysisResult, SecondRank, ThresholdMode,
};

/// Crushed-stone particle analysis.
///
/// Extracts particle outlines from an image, ranks them by area, and
/// estimates crusher health from the size distribution.
#[derive(Parser)]
#[command(name = "rubble", version)]
struct Cli {
    /// Directory holding `config.json` and `analysis_history.json`.
    #[arg(long, global = true, default_value = "analysis_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one image.
    Analyze(AnalyzeArgs),

    /// Analyze several images in sequence and summarize them.
    Batch(BatchArgs),

    /// Write the synthetic demo image, optionally analyzing it.
    Demo(DemoArgs),

    /// Show or clear the analysis history.
    History(HistoryArgs),

    /// Manage the stored configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Write per-contour CSV to this file.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the annotated overlay image to this file.
    #[arg(long)]
    annotate: Option<PathBuf>,

    /// Print per-stage diagnostics.
    #[arg(long)]
    diagnostics: bool,
}

#[derive(Args)]
struct BatchArgs {
    /// Input images.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Write one `<stem>_contours.csv` per image into this directory.
    #[arg(long)]
    csv_dir: Option<PathBuf>,
}

#[derive(Args)]
struct DemoArgs {
    /// Where to write the demo image.
    #[arg(long, default_value = "demo_rubble.png")]
    output: PathBuf,

    /// Analyze the generated image with the stored configuration.
    #[arg(long)]
    analyze: bool,
}

#[derive(Args)]
struct HistoryArgs {
    /// Number of most recent entries to show.
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Print entries as JSON.
    #[arg(long)]
    json: bool,

    /// Delete the stored history.
    #[arg(long)]
    clear: bool,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the stored configuration as JSON.
    Show,
    /// Restore the default configuration.
    Reset,
    /// Apply parameter flags to the stored configuration and save it.
    Set(ConfigArgs),
}

/// Analysis parameter overrides.
///
/// Unset flags keep the value from the stored configuration (or from
/// `--config-json` when given).
#[derive(Args)]
struct ConfigArgs {
    /// Full analysis config as a JSON string, replacing the stored one.
    #[arg(long)]
    config_json: Option<String>,

    /// Minimum contour area in square pixels.
    #[arg(long)]
    min_area: Option<u32>,

    /// Gaussian blur kernel size (0 disables blurring).
    #[arg(long)]
    blur_kernel: Option<u32>,

    /// Canny low threshold.
    #[arg(long)]
    canny_low: Option<u8>,

    /// Canny high threshold.
    #[arg(long)]
    canny_high: Option<u8>,

    /// Morphology kernel size for the edge mask.
    #[arg(long)]
    morphology_kernel: Option<u32>,

    /// Detection strategy.
    #[arg(long, value_enum)]
    strategy: Option<Algorithm>,

    /// Binary threshold level for the overview pass.
    #[arg(long, conflicts_with = "otsu")]
    threshold: Option<u8>,

    /// Choose the overview threshold with Otsu's method.
    #[arg(long)]
    otsu: bool,

    /// Which ranked contour counts as the second particle.
    #[arg(long, value_enum)]
    second_rank: Option<Rank>,
}

#[derive(Args)]
struct OutputArgs {
    /// Print the record as JSON instead of a text report.
    #[arg(long)]
    json: bool,

    /// Pixels per millimeter for physical units in reports and CSV.
    #[arg(long)]
    scale_ratio: Option<f64>,

    /// Derive the scale from a reference object: its length in pixels,
    /// then in millimeters.
    #[arg(long, num_args = 2, value_names = ["PX", "MM"], conflicts_with = "scale_ratio")]
    reference: Option<Vec<f64>>,

    /// Do not append results to the history.
    #[arg(long)]
    no_history: bool,
}

/// Detection strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Algorithm {
    /// Pick from the image's color profile.
    Auto,
    /// Canny edge detection.
    Edge,
    /// HSV color segmentation.
    Color,
    /// Both detectors, merged.
    Hybrid,
}

/// Second-particle rank rule.
#[derive(Clone, Copy, ValueEnum)]
enum Rank {
    /// Skip small satellite fragments when there are enough contours.
    SkipSatellites,
    /// Always the second-largest contour.
    Adjacent,
}

impl ConfigArgs {
    /// Apply the overrides on top of `base`.
    fn apply(&self, base: AnalysisConfig) -> Result<AnalysisConfig, String> {
        let mut config = match self.config_json {
            Some(ref json) => serde_json::from_str(json)
                .map_err(|e| format!("Error parsing --config-json: {e}"))?,
            None => base,
        };

        if let Some(v) = self.min_area {
            config.min_contour_area = v;
        }
        if let Some(v) = self.blur_kernel {
            config.blur_kernel = v;
        }
        if let Some(v) = self.canny_low {
            config.canny_low = v;
        }
        if let Some(v) = self.canny_high {
            config.canny_high = v;
        }
        if let Some(v) = self.morphology_kernel {
            config.morphology_kernel = v;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = match strategy {
                Algorithm::Auto => AlgorithmChoice::Auto,
                Algorithm::Edge => AlgorithmChoice::EdgeDetection,
                Algorithm::Color => AlgorithmChoice::ColorSegmentation,
                Algorithm::Hybrid => AlgorithmChoice::Hybrid,
            };
        }
        if let Some(level) = self.threshold {
            config.threshold = ThresholdMode::Fixed(level);
        }
        if self.otsu {
            config.threshold = ThresholdMode::Otsu;
        }
        if let Some(rank) = self.second_rank {
            config.second_rank = match rank {
                Rank::SkipSatellites => SecondRank::SkipSatellites,
                Rank::Adjacent => SecondRank::Adjacent,
            };
        }
        Ok(config)
    }
}

impl OutputArgs {
    fn units(&self) -> Result<Units, String> {
        let scale = match (self.scale_ratio, self.reference.as_deref()) {
            (Some(ratio), _) => {
                Some(ScaleRatio::new(ratio).map_err(|e| format!("Invalid --scale-ratio: {e}"))?)
            }
            (None, Some(&[px, mm])) => {
                Some(ScaleRatio::calibrate(px, mm).map_err(|e| format!("Invalid --reference: {e}"))?)
            }
            (None, _) => None,
        };
        Ok(scale.map_or(Units::Pixels, Units::Millimeters))
    }

    fn scale(&self) -> Result<ScaleRatio, String> {
        Ok(match self.units()? {
            Units::Pixels => ScaleRatio::UNIT,
            Units::Millimeters(scale) => scale,
        })
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let store = match DataStore::open(&cli.data_dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error opening data directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Analyze(ref args) => run_analyze(&store, args),
        Command::Batch(ref args) => run_batch(&store, args),
        Command::Demo(ref args) => run_demo(&store, args),
        Command::History(ref args) => run_history(&store, args),
        Command::Config { ref action } => run_config(&store, action),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

/// [`Clock`] backed by [`std::time::Instant`] and the system wall clock.
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }

    fn wall_time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

fn load_config(store: &DataStore, args: &ConfigArgs) -> Result<AnalysisConfig, String> {
    let stored = store
        .load_config()
        .map_err(|e| format!("Error loading configuration: {e}"))?;
    let config = args.apply(stored)?;
    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

/// Load and analyze one image, tagging the record with its path.
fn analyze_file(
    path: &Path,
    config: &AnalysisConfig,
) -> Result<(DynamicImage, AnalysisOutcome), String> {
    let image = rubble_io::load_image(path).map_err(|e| format!("Error loading image: {e}"))?;
    let mut outcome = rubble_pipeline::analyze_staged(&image, config, &StdClock)
        .map_err(|e| format!("Analysis error: {e}"))?;
    outcome.record = outcome.record.with_image_path(path.display().to_string());
    Ok((image, outcome))
}

fn record_history(store: &DataStore, record: &AnalysisResult, skip: bool) {
    if skip {
        return;
    }
    if let Err(e) = store.append(record.clone()) {
        eprintln!("Error saving history: {e}");
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| format!("Error serializing JSON: {e}"))?;
    println!("{json}");
    Ok(())
}

fn write_file(path: &Path, contents: &str, what: &str) -> Result<(), String> {
    std::fs::write(path, contents)
        .map_err(|e| format!("Error writing {what} to {}: {e}", path.display()))?;
    eprintln!("{what} written to {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

fn run_analyze(store: &DataStore, args: &AnalyzeArgs) -> Result<(), String> {
    let config = load_config(store, &args.config)?;
    let units = args.output.units()?;
    let (image, outcome) = analyze_file(&args.image_path, &config)?;
    let record = &outcome.record;

    if args.output.json {
        print_json(record)?;
    } else {
        println!("{}", rubble_export::text_report(record, units));
    }

    if args.diagnostics {
        match outcome.diagnostics {
            Some(ref diagnostics) => eprintln!("{}", diagnostics.report()),
            None => eprintln!("No diagnostics: analysis stage failed"),
        }
    }

    if let Some(ref csv_path) = args.csv {
        let csv = rubble_export::to_csv(&record.detailed_contours, args.output.scale()?);
        write_file(csv_path, &csv, "CSV")?;
    }

    if let Some(ref overlay_path) = args.annotate {
        let overlay = rubble_export::annotate(&image.to_rgb8(), &outcome.overview, &outcome.ranked);
        rubble_io::save_image(&overlay, overlay_path)
            .map_err(|e| format!("Error writing overlay: {e}"))?;
        eprintln!("Overlay written to {}", overlay_path.display());
    }

    record_history(store, record, args.output.no_history);
    Ok(())
}

fn run_batch(store: &DataStore, args: &BatchArgs) -> Result<(), String> {
    let config = load_config(store, &args.config)?;
    let scale = args.output.scale()?;
    if let Some(ref dir) = args.csv_dir {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Error creating {}: {e}", dir.display()))?;
    }

    let mut records = Vec::with_capacity(args.images.len());
    for (i, path) in args.images.iter().enumerate() {
        eprintln!("[{}/{}] {}", i + 1, args.images.len(), path.display());
        let outcome = match analyze_file(path, &config) {
            Ok((_, outcome)) => outcome,
            Err(msg) => {
                eprintln!("  skipped: {msg}");
                continue;
            }
        };

        if let Some(ref dir) = args.csv_dir {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("image");
            let csv = rubble_export::to_csv(&outcome.record.detailed_contours, scale);
            write_file(&dir.join(format!("{stem}_contours.csv")), &csv, "CSV")?;
        }

        record_history(store, &outcome.record, args.output.no_history);
        records.push(outcome.record);
    }

    if args.output.json {
        print_json(&records)?;
    } else {
        println!("{}", BatchSummary::new(&records).report());
    }

    if records.is_empty() {
        return Err("No images could be analyzed".to_owned());
    }
    tracing::info!(
        analyzed = records.len(),
        skipped = args.images.len() - records.len(),
        "batch complete",
    );
    Ok(())
}

fn run_demo(store: &DataStore, args: &DemoArgs) -> Result<(), String> {
    let img = demo::generate();
    rubble_io::save_image(&img, &args.output)
        .map_err(|e| format!("Error writing demo image: {e}"))?;
    eprintln!(
        "Demo image written to {} ({}x{}, {} particles)",
        args.output.display(),
        demo::WIDTH,
        demo::HEIGHT,
        demo::PARTICLES,
    );

    if args.analyze {
        let config = store
            .load_config()
            .map_err(|e| format!("Error loading configuration: {e}"))?;
        let record = rubble_pipeline::analyze(&DynamicImage::ImageRgb8(img), &config, &StdClock)
            .map_err(|e| format!("Analysis error: {e}"))?
            .with_image_path(args.output.display().to_string());
        println!("{}", rubble_export::text_report(&record, Units::Pixels));
    }
    Ok(())
}

fn run_history(store: &DataStore, args: &HistoryArgs) -> Result<(), String> {
    if args.clear {
        store
            .clear_history()
            .map_err(|e| format!("Error clearing history: {e}"))?;
        eprintln!("History cleared");
        return Ok(());
    }

    let history = store
        .load_history()
        .map_err(|e| format!("Error loading history: {e}"))?;
    let skip = history.len().saturating_sub(args.limit);
    let recent: Vec<&AnalysisResult> = history.iter().skip(skip).collect();

    if args.json {
        return print_json(&recent);
    }

    println!(
        "History ({} of {} entries)\n{}",
        recent.len(),
        history.len(),
        "=".repeat(60),
    );
    for r in recent {
        println!(
            "{}  {:<18} {:>5} {:>12.2} {:>6.2}%  {:<15} {}",
            r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            r.algorithm_used,
            r.contour_count,
            r.largest_area,
            r.area_ratio,
            r.assessment.status,
            r.image_path.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

fn run_config(store: &DataStore, action: &ConfigAction) -> Result<(), String> {
    match *action {
        ConfigAction::Show => {
            let config = store
                .load_config()
                .map_err(|e| format!("Error loading configuration: {e}"))?;
            print_json(&config)
        }
        ConfigAction::Reset => {
            store
                .reset_config()
                .map_err(|e| format!("Error resetting configuration: {e}"))?;
            eprintln!("Configuration reset to defaults");
            Ok(())
        }
        ConfigAction::Set(ref args) => {
            let config = load_config(store, args)?;
            config
                .validate()
                .map_err(|e| format!("Refusing to save: {e}"))?;
            store
                .save_config(&config)
                .map_err(|e| format!("Error saving configuration: {e}"))?;
            print_json(&config)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rubble").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_stored_config() {
        let cli = parse(&[
            "analyze",
            "a.png",
            "--min-area",
            "120",
            "--strategy",
            "color",
            "--otsu",
            "--second-rank",
            "adjacent",
        ]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        let config = args.config.apply(AnalysisConfig::default()).unwrap();
        assert_eq!(config.min_contour_area, 120);
        assert_eq!(config.strategy, AlgorithmChoice::ColorSegmentation);
        assert_eq!(config.threshold, ThresholdMode::Otsu);
        assert_eq!(config.second_rank, SecondRank::Adjacent);
        assert_eq!(config.canny_high, AnalysisConfig::DEFAULT_CANNY_HIGH);
    }

    #[test]
    fn config_json_replaces_base_then_flags_apply() {
        let cli = parse(&[
            "config",
            "set",
            "--config-json",
            r#"{"min_contour_area": 10, "blur_kernel": 0}"#,
            "--canny-low",
            "20",
        ]);
        let Command::Config {
            action: ConfigAction::Set(args),
        } = cli.command
        else {
            panic!("expected config set");
        };
        let base = AnalysisConfig {
            min_contour_area: 999,
            ..AnalysisConfig::default()
        };
        let config = args.apply(base).unwrap();
        assert_eq!(config.min_contour_area, 10);
        assert_eq!(config.blur_kernel, 0);
        assert_eq!(config.canny_low, 20);
    }

    #[test]
    fn bad_config_json_is_reported() {
        let cli = parse(&["analyze", "a.png", "--config-json", "{"]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        let err = args.config.apply(AnalysisConfig::default()).unwrap_err();
        assert!(err.contains("--config-json"));
    }

    #[test]
    fn scale_ratio_selects_units() {
        let cli = parse(&["analyze", "a.png", "--scale-ratio", "4"]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert!(matches!(args.output.units().unwrap(), Units::Millimeters(_)));

        let cli = parse(&["analyze", "a.png", "--scale-ratio", "0"]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert!(args.output.units().is_err());
    }

    #[test]
    fn reference_object_calibrates_scale() {
        let cli = parse(&["analyze", "a.png", "--reference", "250", "50"]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert!((args.output.scale().unwrap().get() - 5.0).abs() < f64::EPSILON);

        let cli = parse(&["batch", "a.png", "--reference", "250", "0"]);
        let Command::Batch(args) = cli.command else {
            panic!("expected batch");
        };
        assert!(args.output.units().unwrap_err().contains("--reference"));

        let both = ["rubble", "analyze", "a.png", "--scale-ratio", "4", "--reference", "250", "50"];
        assert!(Cli::try_parse_from(both).is_err());
    }

    #[test]
    fn threshold_conflicts_with_otsu() {
        let result = Cli::try_parse_from(["rubble", "analyze", "a.png", "--threshold", "90", "--otsu"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
