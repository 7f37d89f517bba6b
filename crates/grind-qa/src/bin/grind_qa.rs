//! `grind-qa`: generate synthetic grind scenes and score particle detectors.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use grind_qa::core::GrindType;
use grind_qa::detect::{ThresholdDetector, ThresholdDetectorParams, ThresholdMode};
use grind_qa::synth::{GridParams, GridSpacing, ScatterParams};
use grind_qa::validate::DEFAULT_TOLERANCE_PX;
use grind_qa::workflow::{detect_file, score_files, validate_config, write_scene, ScoreRequest};
use grind_qa::{generate_grid, generate_scatter};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "grind-qa", version, about = "Validation tools for coffee-grind particle detectors")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit JSON tracing events on stderr.
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    json_log: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SceneOutputs {
    /// Output PNG.
    #[arg(long)]
    image: PathBuf,

    /// Output ground-truth JSON.
    #[arg(long)]
    truth: PathBuf,

    /// Draw each particle's index inside it.
    #[arg(long)]
    labels: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a scene of randomly placed circles.
    Scatter {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(long)]
        count: usize,
        #[arg(long)]
        min_radius: u32,
        #[arg(long)]
        max_radius: u32,
        #[arg(long, default_value_t = 1.0)]
        microns_per_pixel: f32,
        /// Fixed seed; a built-in default is used when omitted.
        #[arg(long, conflicts_with = "random")]
        seed: Option<u64>,
        /// Seed from OS entropy.
        #[arg(long)]
        random: bool,
        #[command(flatten)]
        out: SceneOutputs,
    },

    /// Generate a scene of equal circles on a regular lattice.
    Grid {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(long)]
        rows: u32,
        #[arg(long)]
        cols: u32,
        #[arg(long)]
        radius: u32,
        #[arg(long, default_value_t = 1.0)]
        microns_per_pixel: f32,
        /// Gap between neighbouring circles in pixels.
        #[arg(long, default_value_t = 40, conflicts_with = "fill")]
        gap: u32,
        /// Spread the lattice evenly over the whole canvas.
        #[arg(long)]
        fill: bool,
        #[command(flatten)]
        out: SceneOutputs,
    },

    /// Run the reference threshold detector on an image.
    Detect {
        #[arg(long)]
        image: PathBuf,
        /// Output detections JSON.
        #[arg(long)]
        detections: PathBuf,
        #[arg(long, default_value = "filter")]
        grind_type: GrindType,
        #[arg(long, default_value_t = 1.0)]
        microns_per_pixel: f32,
        /// Fixed threshold level instead of Otsu.
        #[arg(long)]
        threshold: Option<u8>,
    },

    /// Score a detections file against ground truth.
    Score {
        #[arg(long)]
        truth: PathBuf,
        #[arg(long)]
        detections: PathBuf,
        #[arg(long, default_value_t = DEFAULT_TOLERANCE_PX)]
        tolerance: f32,
        /// Background image for the overlay.
        #[arg(long)]
        image: Option<PathBuf>,
        /// Write a diagnostic overlay PNG.
        #[arg(long)]
        overlay: Option<PathBuf>,
        /// Write the full report as JSON.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run every scenario of a JSON config with the reference detector.
    Validate {
        config: PathBuf,
    },
}

fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init();
        grind_qa::core::init_tracing(cli.json_log);
        // `log` records still honour -v; spans follow RUST_LOG.
        log::set_max_level(level);
    }
    #[cfg(not(feature = "tracing"))]
    grind_qa::core::init_with_level(level)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    match cli.command {
        Command::Scatter {
            width,
            height,
            count,
            min_radius,
            max_radius,
            microns_per_pixel,
            seed,
            random,
            out,
        } => {
            let mut params = ScatterParams::new(
                width,
                height,
                count,
                (min_radius, max_radius),
                microns_per_pixel,
            )
            .with_labels(out.labels);
            if let Some(seed) = seed {
                params = params.with_seed(seed);
            }
            if random {
                params = params.with_entropy();
            }
            let scene = generate_scatter(&params);
            write_scene(&scene, &out.image, &out.truth)?;
            println!("{} particles", scene.ground_truth.len());
        }
        Command::Grid {
            width,
            height,
            rows,
            cols,
            radius,
            microns_per_pixel,
            gap,
            fill,
            out,
        } => {
            let spacing = if fill {
                GridSpacing::Fill
            } else {
                GridSpacing::Packed { gap_px: gap }
            };
            let params = GridParams::new(width, height, rows, cols, radius, microns_per_pixel)
                .with_spacing(spacing)
                .with_labels(out.labels);
            let scene = generate_grid(&params);
            write_scene(&scene, &out.image, &out.truth)?;
            println!("{} particles", scene.ground_truth.len());
        }
        Command::Detect {
            image,
            detections,
            grind_type,
            microns_per_pixel,
            threshold,
        } => {
            let detector = ThresholdDetector::new(ThresholdDetectorParams {
                threshold: threshold.map_or(ThresholdMode::Otsu, ThresholdMode::Fixed),
                ..ThresholdDetectorParams::default()
            });
            let file = detect_file(&detector, &image, grind_type, microns_per_pixel, &detections)?;
            println!("{} particles", file.particles.len());
        }
        Command::Score {
            truth,
            detections,
            tolerance,
            image,
            overlay,
            output,
        } => {
            let report = score_files(&ScoreRequest {
                truth,
                detections,
                tolerance_px: tolerance,
                image,
                overlay,
                output,
            })?;
            println!("{report}");
        }
        Command::Validate { config } => {
            let run = validate_config(&config)?;
            for record in &run.scenarios {
                match (&record.report, &record.error) {
                    (Some(report), _) => println!("{}: {}", record.name, report.summary()),
                    (None, Some(err)) => println!("{}: FAILED {err}", record.name),
                    (None, None) => println!("{}: no result", record.name),
                }
            }
            println!(
                "{} scenarios, {} failed",
                run.scenarios.len(),
                run.failures()
            );
        }
    }
    Ok(())
}
