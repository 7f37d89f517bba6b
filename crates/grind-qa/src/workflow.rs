//! File-level workflows behind the `grind-qa` binary.

use std::path::{Path, PathBuf};

use grind_qa_core::{AnalysisSettings, GrindType};
use grind_qa_detect::{DetectionError, ThresholdDetector};
use grind_qa_synth::SyntheticScene;
use grind_qa_validate::{
    load_gray_image, match_and_score, render_overlay, run_config, run_detection, save_gray_image,
    save_rgb_image, DetectionsFile, GroundTruthFile, IoError, ValidationConfig, ValidationReport,
    ValidationRunReport,
};
use image::{GrayImage, Luma};
use log::{info, warn};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the workflow helpers.
#[derive(thiserror::Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error("--overlay requires ground truth with a non-empty canvas or an --image")]
    NoOverlayCanvas,
}

/// Write a generated scene as a PNG plus its ground-truth JSON.
pub fn write_scene(
    scene: &SyntheticScene,
    image_path: impl AsRef<Path>,
    truth_path: impl AsRef<Path>,
) -> Result<(), WorkflowError> {
    save_gray_image(&scene.image, image_path.as_ref())?;
    GroundTruthFile::from_scene(scene).write_json(truth_path.as_ref())?;
    info!(
        "wrote {} particles to {} and {}",
        scene.ground_truth.len(),
        image_path.as_ref().display(),
        truth_path.as_ref().display()
    );
    Ok(())
}

/// Run the reference detector on an image file and write a detections file.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(detector)))]
pub fn detect_file(
    detector: &ThresholdDetector,
    image_path: &Path,
    grind_type: GrindType,
    microns_per_pixel: f32,
    output_path: &Path,
) -> Result<DetectionsFile, WorkflowError> {
    let img = load_gray_image(image_path)?;
    let output = run_detection(
        detector,
        img,
        grind_type.targets(),
        AnalysisSettings::with_calibration(microns_per_pixel),
        None,
    )?;
    info!(
        "{}: {} particles, mean {:.1} µm",
        image_path.display(),
        output.stats.particle_count,
        output.stats.mean_size_microns
    );
    let file = DetectionsFile::from(output);
    file.write_json(output_path)?;
    Ok(file)
}

/// Inputs of [`score_files`].
#[derive(Clone, Debug)]
pub struct ScoreRequest {
    pub truth: PathBuf,
    pub detections: PathBuf,
    pub tolerance_px: f32,
    /// Background for the overlay; a blank canvas of the truth size otherwise.
    pub image: Option<PathBuf>,
    pub overlay: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Score a detections file against a ground-truth file.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn score_files(request: &ScoreRequest) -> Result<ValidationReport, WorkflowError> {
    let truth = GroundTruthFile::load_json(&request.truth)?;
    let detections = DetectionsFile::load_json(&request.detections)?;
    let report = match_and_score(&detections.particles, &truth.particles, request.tolerance_px);
    info!("{}", report.summary());

    if let Some(overlay_path) = &request.overlay {
        let base = match &request.image {
            Some(path) => load_gray_image(path)?,
            None if truth.width > 0 && truth.height > 0 => {
                GrayImage::from_pixel(truth.width, truth.height, Luma([255]))
            }
            None => return Err(WorkflowError::NoOverlayCanvas),
        };
        if base.dimensions() != (truth.width, truth.height) {
            warn!(
                "overlay image is {}x{} but ground truth was generated on {}x{}",
                base.width(),
                base.height(),
                truth.width,
                truth.height
            );
        }
        save_rgb_image(&render_overlay(&base, &report), overlay_path)?;
    }

    if let Some(output) = &request.output {
        report.write_json(output)?;
    }
    Ok(report)
}

/// Run a JSON batch config with the reference detector.
pub fn validate_config(config_path: &Path) -> Result<ValidationRunReport, WorkflowError> {
    let config = ValidationConfig::load_json(config_path)?;
    info!(
        "{}: {} scenarios -> {}",
        config_path.display(),
        config.scenarios.len(),
        config.output_dir().display()
    );
    let detector = ThresholdDetector::new(config.detector.clone());
    Ok(run_config(&detector, &config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grind_qa_synth::{generate_grid, GridParams};

    #[test]
    fn scene_detect_score_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image = dir.path().join("scene.png");
        let truth = dir.path().join("truth.json");
        let detections = dir.path().join("det.json");
        let scene = generate_grid(&GridParams::new(400, 400, 3, 3, 15, 10.0));
        write_scene(&scene, &image, &truth).expect("write scene");

        let file = detect_file(
            &ThresholdDetector::default(),
            &image,
            GrindType::Espresso,
            10.0,
            &detections,
        )
        .expect("detect");
        assert_eq!(file.particles.len(), 9);
        assert_eq!(file.stats.as_ref().map(|s| s.particle_count), Some(9));

        let report = score_files(&ScoreRequest {
            truth,
            detections,
            tolerance_px: 1.0,
            image: None,
            overlay: Some(dir.path().join("overlay.png")),
            output: Some(dir.path().join("report.json")),
        })
        .expect("score");
        assert_eq!(report.f1_score, 1.0);
        assert!(dir.path().join("overlay.png").exists());
        let back = ValidationReport::load_json(dir.path().join("report.json")).expect("report");
        assert_eq!(back, report);
    }

    #[test]
    fn detector_errors_surface() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image = dir.path().join("flat.png");
        save_gray_image(&GrayImage::from_pixel(64, 64, Luma([200])), &image).expect("save");
        let err = detect_file(
            &ThresholdDetector::default(),
            &image,
            GrindType::Filter,
            1.0,
            &dir.path().join("d.json"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Detection(DetectionError::NoParticlesFound { threshold: 200 })
        ));
    }
}
