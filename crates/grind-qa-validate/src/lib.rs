//! Accuracy validation for coffee-grind particle detectors.
//!
//! The pipeline is:
//! - generate a synthetic scene with known particles (`grind-qa-synth`),
//! - run a [`ParticleDetector`](grind_qa_detect::ParticleDetector) on it,
//! - pair detections with ground truth ([`match_particles`]),
//! - derive precision, recall, F1 and error means ([`match_and_score`]),
//! - optionally render a diagnostic overlay ([`render_overlay`]).
//!
//! [`run_scenarios`] runs a batch in parallel and [`run_config`] does the
//! same from a JSON [`ValidationConfig`], writing a report to disk.

mod harness;
mod io;
mod matcher;
mod metrics;
mod overlay;

pub use harness::{
    run_detection, run_scenario, run_scenarios, run_validation, ScenarioOutcome, SceneSpec,
    ValidationScenario, DEFAULT_TOLERANCE_PX,
};
pub use io::{
    check_scenes, load_gray_image, run_config, save_gray_image, save_rgb_image, DetectionsFile,
    GroundTruthFile, IoError, ScenarioRecord, ValidationConfig, ValidationRunReport,
};
pub use matcher::{match_particles, MatchedPair, ParticleMatching};
pub use metrics::{match_and_score, ValidationReport};
pub use overlay::{
    render_overlay, FALSE_NEGATIVE_COLOR, FALSE_POSITIVE_COLOR, LEGEND_BACKGROUND, LEGEND_HEIGHT,
    LEGEND_TEXT, MATCHED_COLOR,
};
