//! Drive a detector over synthetic scenes and score it.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use grind_qa_core::{AggregateStats, AnalysisSettings, GrindType, GrindTypeTargets};
use grind_qa_detect::{DetectionError, DetectionOutput, DetectionRequest, ParticleDetector};
use grind_qa_synth::{
    generate_grid, generate_scatter, GridParams, ScatterParams, SceneError, SyntheticScene,
};
use image::GrayImage;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::metrics::{match_and_score, ValidationReport};

/// Default match tolerance in pixels.
pub const DEFAULT_TOLERANCE_PX: f32 = 5.0;

fn default_tolerance() -> f32 {
    DEFAULT_TOLERANCE_PX
}

/// Analyse one image and return only the aggregate statistics.
///
/// Issues a single request with default size filters and the given
/// calibration, then blocks until the detector reports. There is no timeout
/// and detector errors come back unchanged.
pub fn run_validation<D: ParticleDetector + ?Sized>(
    detector: &D,
    image: &GrayImage,
    targets: GrindTypeTargets,
    calibration_factor: f32,
) -> Result<AggregateStats, DetectionError> {
    let settings = AnalysisSettings::with_calibration(calibration_factor);
    run_detection(detector, image.clone(), targets, settings, None).map(|out| out.stats)
}

/// Submit one request and wait for the full detector output.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(detector = detector.name()))
)]
pub fn run_detection<D: ParticleDetector + ?Sized>(
    detector: &D,
    image: impl Into<Arc<GrayImage>>,
    targets: GrindTypeTargets,
    settings: AnalysisSettings,
    timeout: Option<Duration>,
) -> Result<DetectionOutput, DetectionError> {
    let request = DetectionRequest::new(image, targets, settings);
    debug!(
        "submitting {}x{} image to '{}'",
        request.image.width(),
        request.image.height(),
        detector.name()
    );
    detector.detect(request).wait_for(timeout)
}

/// Scene layout of a scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum SceneSpec {
    Scatter(ScatterParams),
    Grid(GridParams),
}

impl SceneSpec {
    pub fn validate(&self) -> Result<(), SceneError> {
        match self {
            SceneSpec::Scatter(p) => p.validate(),
            SceneSpec::Grid(p) => p.validate(),
        }
    }

    /// # Panics
    ///
    /// Panics if [`validate`](Self::validate) fails.
    pub fn generate(&self) -> SyntheticScene {
        match self {
            SceneSpec::Scatter(p) => generate_scatter(p),
            SceneSpec::Grid(p) => generate_grid(p),
        }
    }

    pub fn microns_per_pixel(&self) -> f32 {
        match self {
            SceneSpec::Scatter(p) => p.microns_per_pixel,
            SceneSpec::Grid(p) => p.microns_per_pixel,
        }
    }
}

/// One named synthetic test case.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationScenario {
    pub name: String,
    pub scene: SceneSpec,
    #[serde(default)]
    pub grind_type: GrindType,
    /// Defaults to the stock filters with the scene's calibration.
    #[serde(default)]
    pub settings: Option<AnalysisSettings>,
    #[serde(default = "default_tolerance")]
    pub tolerance_px: f32,
    /// Give up waiting for the detector after this long.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl ValidationScenario {
    pub fn new(name: impl Into<String>, scene: SceneSpec) -> Self {
        Self {
            name: name.into(),
            scene,
            grind_type: GrindType::default(),
            settings: None,
            tolerance_px: DEFAULT_TOLERANCE_PX,
            timeout_ms: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance_px: f32) -> Self {
        self.tolerance_px = tolerance_px;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn effective_settings(&self) -> AnalysisSettings {
        self.settings
            .unwrap_or_else(|| AnalysisSettings::with_calibration(self.scene.microns_per_pixel()))
    }
}

/// Everything produced by a successful scenario run.
#[derive(Clone, Debug)]
pub struct ScenarioOutcome {
    pub name: String,
    pub scene: SyntheticScene,
    pub detection: DetectionOutput,
    pub report: ValidationReport,
}

/// Generate the scenario's scene, run the detector on it and score the result.
///
/// # Panics
///
/// Panics if the scene parameters are invalid; see [`SceneSpec::validate`].
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(scenario = %scenario.name))
)]
pub fn run_scenario<D: ParticleDetector + ?Sized>(
    detector: &D,
    scenario: &ValidationScenario,
) -> Result<ScenarioOutcome, DetectionError> {
    let scene = scenario.scene.generate();
    debug!(
        "scenario '{}': {} ground-truth particles on {}x{}",
        scenario.name,
        scene.ground_truth.len(),
        scene.width(),
        scene.height()
    );

    let detection = run_detection(
        detector,
        scene.image.clone(),
        scenario.grind_type.targets(),
        scenario.effective_settings(),
        scenario.timeout_ms.map(Duration::from_millis),
    )
    .inspect_err(|err| {
        warn!(
            "scenario '{}': detector '{}' failed: {err}",
            scenario.name,
            detector.name()
        )
    })?;

    let report = match_and_score(&detection.particles, &scene.ground_truth, scenario.tolerance_px);
    info!("scenario '{}': {}", scenario.name, report.summary());

    Ok(ScenarioOutcome {
        name: scenario.name.clone(),
        scene,
        detection,
        report,
    })
}

/// Run every scenario on its own scoped thread. Results keep input order.
///
/// A panicking scenario is re-raised on the calling thread.
pub fn run_scenarios<D: ParticleDetector + ?Sized>(
    detector: &D,
    scenarios: &[ValidationScenario],
) -> Vec<Result<ScenarioOutcome, DetectionError>> {
    thread::scope(|s| {
        let handles: Vec<_> = scenarios
            .iter()
            .map(|scenario| s.spawn(move || run_scenario(detector, scenario)))
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use grind_qa_detect::{PendingDetection, ThresholdDetector};
    use grind_qa_synth::GridSpacing;

    struct Failing;

    impl ParticleDetector for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn detect(&self, _request: DetectionRequest) -> PendingDetection {
            PendingDetection::ready(Err(DetectionError::NoParticlesFound { threshold: 7 }))
        }
    }

    fn grid_scenario() -> ValidationScenario {
        ValidationScenario::new("grid", SceneSpec::Grid(GridParams::new(400, 400, 3, 3, 15, 20.0)))
    }

    #[test]
    fn run_validation_returns_stats() {
        let scene = generate_grid(&GridParams::new(1000, 1000, 5, 5, 30, 10.0));
        let stats = run_validation(
            &ThresholdDetector::default(),
            &scene.image,
            GrindType::Filter.targets(),
            10.0,
        )
        .expect("stats");
        assert_eq!(stats.particle_count, 25);
        assert!((stats.mean_size_microns - 600.0).abs() < 12.0);
    }

    #[test]
    fn run_validation_propagates_errors() {
        let img = GrayImage::new(64, 64);
        let err = run_validation(&Failing, &img, GrindType::Espresso.targets(), 1.0).unwrap_err();
        assert_eq!(err, DetectionError::NoParticlesFound { threshold: 7 });
    }

    #[test]
    fn scenario_settings_default_to_scene_calibration() {
        let s = grid_scenario();
        assert_eq!(s.effective_settings(), AnalysisSettings::with_calibration(20.0));
        assert_eq!(s.tolerance_px, DEFAULT_TOLERANCE_PX);
    }

    #[test]
    fn scenario_scores_reference_detector() {
        let outcome = run_scenario(&ThresholdDetector::default(), &grid_scenario()).expect("run");
        assert_eq!(outcome.report.total_expected, 9);
        assert_eq!(outcome.report.correctly_detected, 9);
        assert_eq!(outcome.report.f1_score, 1.0);
        assert_eq!(outcome.detection.stats.particle_count, 9);
    }

    #[test]
    fn scenarios_keep_input_order() {
        let scenarios = vec![
            grid_scenario(),
            ValidationScenario::new(
                "fill",
                SceneSpec::Grid(
                    GridParams::new(300, 200, 2, 3, 12, 5.0).with_spacing(GridSpacing::Fill),
                ),
            ),
            ValidationScenario::new(
                "scatter",
                SceneSpec::Scatter(ScatterParams::new(300, 300, 1, (10, 12), 8.0)),
            ),
        ];
        let results = run_scenarios(&ThresholdDetector::default(), &scenarios);
        let names: Vec<&str> = results
            .iter()
            .map(|r| r.as_ref().expect("scenario").name.as_str())
            .collect();
        assert_eq!(names, ["grid", "fill", "scatter"]);
    }

    #[test]
    fn scenario_json_uses_defaults() {
        let json = r#"{
            "name": "espresso",
            "scene": {"layout": "grid", "width": 400, "height": 400, "rows": 2, "cols": 2,
                      "radius": 10, "microns_per_pixel": 15.0},
            "grind_type": "espresso"
        }"#;
        let s: ValidationScenario = serde_json::from_str(json).expect("parse");
        assert_eq!(s.grind_type, GrindType::Espresso);
        assert_eq!(s.tolerance_px, DEFAULT_TOLERANCE_PX);
        assert!(s.timeout_ms.is_none());
        assert!(matches!(s.scene, SceneSpec::Grid(ref g) if g.rows == 2 && g.radius == 10));
    }
}
