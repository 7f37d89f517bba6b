//! JSON configuration, reports and image files for validation runs.

use std::fs;
use std::path::{Path, PathBuf};

use grind_qa_core::{AggregateStats, CalibrationInfo, DetectedParticle, GroundTruthParticle};
use grind_qa_detect::{DetectionOutput, ParticleDetector, ThresholdDetectorParams};
use grind_qa_synth::{SceneError, SyntheticScene};
use image::{GrayImage, RgbImage};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::harness::{run_scenarios, ScenarioOutcome, ValidationScenario};
use crate::metrics::ValidationReport;
use crate::overlay::render_overlay;

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, IoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

fn default_output_dir() -> String {
    "validation_out".to_string()
}

/// A batch of scenarios for the `validate` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub scenarios: Vec<ValidationScenario>,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub write_overlays: bool,
    /// Reference detector tuning.
    #[serde(default)]
    pub detector: ThresholdDetectorParams,
}

impl ValidationConfig {
    pub fn new(scenarios: Vec<ValidationScenario>) -> Self {
        Self {
            scenarios,
            output_dir: default_output_dir(),
            write_overlays: false,
            detector: ThresholdDetectorParams::default(),
        }
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        read_json(path)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        write_json(self, path)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }
}

/// Per-scenario entry of a run report. Exactly one of `report` and `error`
/// is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub name: String,
    #[serde(default)]
    pub report: Option<ValidationReport>,
    #[serde(default)]
    pub stats: Option<AggregateStats>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub overlay_path: Option<String>,
}

impl ScenarioRecord {
    pub fn from_outcome(outcome: &ScenarioOutcome) -> Self {
        Self {
            name: outcome.name.clone(),
            report: Some(outcome.report.clone()),
            stats: Some(outcome.detection.stats.clone()),
            error: None,
            overlay_path: None,
        }
    }

    pub fn from_error(name: impl Into<String>, err: &impl std::fmt::Display) -> Self {
        Self {
            name: name.into(),
            report: None,
            stats: None,
            error: Some(err.to_string()),
            overlay_path: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Output of a full `validate` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRunReport {
    pub detector: String,
    pub scenarios: Vec<ScenarioRecord>,
}

impl ValidationRunReport {
    pub fn failures(&self) -> usize {
        self.scenarios.iter().filter(|s| !s.succeeded()).count()
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        read_json(path)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        write_json(self, path)
    }
}

impl ValidationReport {
    /// Load a scored report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        read_json(path)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        write_json(self, path)
    }
}

/// Ground truth written next to a generated scene image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthFile {
    pub width: u32,
    pub height: u32,
    pub calibration: CalibrationInfo,
    pub particles: Vec<GroundTruthParticle>,
}

impl GroundTruthFile {
    pub fn from_scene(scene: &SyntheticScene) -> Self {
        Self {
            width: scene.width(),
            height: scene.height(),
            calibration: scene.calibration,
            particles: scene.ground_truth.clone(),
        }
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        read_json(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        write_json(self, path)
    }
}

/// Detections produced by an external detector, scored by `grind-qa score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionsFile {
    pub particles: Vec<DetectedParticle>,
    #[serde(default)]
    pub stats: Option<AggregateStats>,
}

impl From<DetectionOutput> for DetectionsFile {
    fn from(out: DetectionOutput) -> Self {
        Self {
            particles: out.particles,
            stats: Some(out.stats),
        }
    }
}

impl DetectionsFile {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        read_json(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        write_json(self, path)
    }
}

pub fn load_gray_image(path: impl AsRef<Path>) -> Result<GrayImage, IoError> {
    Ok(image::open(path)?.to_luma8())
}

pub fn save_gray_image(img: &GrayImage, path: impl AsRef<Path>) -> Result<(), IoError> {
    img.save(path)?;
    Ok(())
}

pub fn save_rgb_image(img: &RgbImage, path: impl AsRef<Path>) -> Result<(), IoError> {
    img.save(path)?;
    Ok(())
}

fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "scenario".to_string()
    } else {
        stem
    }
}

/// Check every scenario's scene parameters, in order.
pub fn check_scenes(config: &ValidationConfig) -> Vec<Result<(), SceneError>> {
    config.scenarios.iter().map(|s| s.scene.validate()).collect()
}

/// Run every scenario of `config` and write `report.json` (plus overlays when
/// enabled) into the output directory.
///
/// Scenarios with invalid scene parameters and detector failures are recorded
/// per scenario; only filesystem and encoding problems abort the run.
pub fn run_config<D: ParticleDetector + ?Sized>(
    detector: &D,
    config: &ValidationConfig,
) -> Result<ValidationRunReport, IoError> {
    let out_dir = config.output_dir();
    fs::create_dir_all(&out_dir)?;

    let checks = check_scenes(config);
    let runnable: Vec<ValidationScenario> = config
        .scenarios
        .iter()
        .zip(&checks)
        .filter(|(_, check)| check.is_ok())
        .map(|(scenario, _)| scenario.clone())
        .collect();
    let mut results = run_scenarios(detector, &runnable).into_iter();

    let mut records = Vec::with_capacity(config.scenarios.len());
    for (idx, (scenario, check)) in config.scenarios.iter().zip(checks).enumerate() {
        if let Err(err) = check {
            warn!("scenario '{}': invalid scene: {err}", scenario.name);
            records.push(ScenarioRecord::from_error(&scenario.name, &err));
            continue;
        }
        let Some(result) = results.next() else {
            break;
        };
        let record = match result {
            Ok(outcome) => {
                let mut record = ScenarioRecord::from_outcome(&outcome);
                if config.write_overlays {
                    let path =
                        out_dir.join(format!("{idx:02}_{}_overlay.png", file_stem(&outcome.name)));
                    let overlay = render_overlay(&outcome.scene.image, &outcome.report);
                    save_rgb_image(&overlay, &path)?;
                    record.overlay_path = Some(path.to_string_lossy().into_owned());
                }
                record
            }
            Err(err) => ScenarioRecord::from_error(&scenario.name, &err),
        };
        records.push(record);
    }

    let report = ValidationRunReport {
        detector: detector.name().to_string(),
        scenarios: records,
    };
    let report_path = out_dir.join("report.json");
    report.write_json(&report_path)?;
    info!(
        "wrote {} ({} scenarios, {} failed)",
        report_path.display(),
        report.scenarios.len(),
        report.failures()
    );
    Ok(report)
}
