//! High-level facade crate for the `grind-qa-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the underlying crates
//! - file-level workflows used by the `grind-qa` binary: write a synthetic
//!   scene to disk, run the reference detector on an image, score a detection
//!   file against ground truth, and run a JSON batch of scenarios.
//!
//! ## Quickstart
//!
//! ```no_run
//! use grind_qa::detect::ThresholdDetector;
//! use grind_qa::synth::{generate_grid, GridParams};
//! use grind_qa::validate::match_and_score;
//! use grind_qa::core::{AnalysisSettings, GrindType};
//!
//! let scene = generate_grid(&GridParams::new(1000, 1000, 5, 5, 30, 10.0));
//! let out = ThresholdDetector::default()
//!     .detect_blocking(
//!         &scene.image,
//!         &GrindType::Filter.targets(),
//!         &AnalysisSettings::with_calibration(10.0),
//!     )
//!     .expect("detection");
//! let report = match_and_score(&out.particles, &scene.ground_truth, 5.0);
//! println!("{}", report.summary());
//! ```
//!
//! ## API map
//! - `grind_qa::core`: particles, calibration, grind targets, size statistics.
//! - `grind_qa::synth`: scatter and grid scene generators.
//! - `grind_qa::detect`: the detector contract and the reference detector.
//! - `grind_qa::validate`: matcher, metrics, overlay, scenario harness, JSON io.
//! - `grind_qa::workflow`: file-in / file-out helpers behind the CLI.

pub use grind_qa_core as core;
pub use grind_qa_detect as detect;
pub use grind_qa_synth as synth;
pub use grind_qa_validate as validate;

pub use grind_qa_core::{AggregateStats, DetectedParticle, GrindType, GroundTruthParticle};
pub use grind_qa_detect::{DetectionError, ParticleDetector, ThresholdDetector};
pub use grind_qa_synth::{generate_grid, generate_scatter, SyntheticScene};
pub use grind_qa_validate::{match_and_score, render_overlay, run_validation, ValidationReport};

pub mod workflow;
