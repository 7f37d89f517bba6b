//! Reference detector: global threshold + connected components.
//!
//! Dark pixels (`<= threshold`) are foreground. Each 8-connected foreground
//! component becomes one particle positioned at the mean of its pixel centers,
//! with area equal to its pixel count. Touching particles merge into one
//! component; this detector makes no attempt to split them.
//!
//! `AnalysisSettings::min_particle_size` / `max_particle_size` are applied as
//! an inclusive filter on **pixel area**.

use grind_qa_core::{AggregateStats, AnalysisSettings, DetectedParticle, GrindTypeTargets};
use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use log::{debug, warn};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::detector::{DetectionOutput, DetectionRequest, ParticleDetector};
use crate::error::DetectionError;
use crate::pending::{detection_channel, PendingDetection};
use crate::threshold::otsu_threshold;

/// How the foreground threshold is chosen.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "level", rename_all = "snake_case")]
pub enum ThresholdMode {
    #[default]
    Otsu,
    Fixed(u8),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdDetectorParams {
    pub threshold: ThresholdMode,
    /// Images with a side shorter than this are rejected.
    pub min_image_side: u32,
    /// Run each request on its own thread instead of inside `detect`.
    pub background_worker: bool,
}

impl Default for ThresholdDetectorParams {
    fn default() -> Self {
        Self {
            threshold: ThresholdMode::Otsu,
            min_image_side: 16,
            background_worker: true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ThresholdDetector {
    params: ThresholdDetectorParams,
}

#[derive(Clone, Copy, Default)]
struct Moments {
    count: u64,
    sum_x: u64,
    sum_y: u64,
}

impl ThresholdDetector {
    pub fn new(params: ThresholdDetectorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ThresholdDetectorParams {
        &self.params
    }

    /// Run the whole detection on the calling thread.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "debug",
            skip(self, image, targets, settings),
            fields(width = image.width(), height = image.height())
        )
    )]
    pub fn detect_blocking(
        &self,
        image: &GrayImage,
        targets: &GrindTypeTargets,
        settings: &AnalysisSettings,
    ) -> Result<DetectionOutput, DetectionError> {
        settings.validate()?;

        let (w, h) = image.dimensions();
        let min_side = self.params.min_image_side;
        if w.min(h) < min_side {
            return Err(DetectionError::ImageTooSmall {
                width: w,
                height: h,
                min_side,
            });
        }

        let threshold = match self.params.threshold {
            ThresholdMode::Otsu => otsu_threshold(image),
            ThresholdMode::Fixed(t) => t,
        };

        let mut foreground = 0usize;
        let mask = GrayImage::from_fn(w, h, |x, y| {
            if image.get_pixel(x, y)[0] <= threshold {
                foreground += 1;
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        // A mask that is all background or all foreground has no particles.
        if foreground == 0 || foreground == (w as usize) * (h as usize) {
            return Err(DetectionError::NoParticlesFound { threshold });
        }

        let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));
        let num_labels = labels.pixels().map(|p| p[0]).max().unwrap_or(0) as usize;
        let mut moments = vec![Moments::default(); num_labels + 1];
        for (x, y, label) in labels.enumerate_pixels() {
            let l = label[0] as usize;
            if l == 0 {
                continue;
            }
            let m = &mut moments[l];
            m.count += 1;
            m.sum_x += x as u64;
            m.sum_y += y as u64;
        }

        let particles: Vec<DetectedParticle> = moments
            .iter()
            .skip(1)
            .filter(|m| m.count > 0)
            .filter(|m| settings.accepts_size(u32::try_from(m.count).unwrap_or(u32::MAX)))
            .map(|m| {
                let n = m.count as f64;
                let cx = m.sum_x as f64 / n + 0.5;
                let cy = m.sum_y as f64 / n + 0.5;
                DetectedParticle::new(Point2::new(cx as f32, cy as f32), m.count as f32)
            })
            .collect();

        debug!(
            "threshold {threshold}: {num_labels} components, {} within size range {}..={} px",
            particles.len(),
            settings.min_particle_size,
            settings.max_particle_size
        );

        if particles.is_empty() {
            return Err(DetectionError::NoParticlesFound { threshold });
        }

        let diameters: Vec<f32> = particles
            .iter()
            .map(|p| p.diameter_microns(settings.calibration_factor))
            .collect();
        let stats = AggregateStats::from_diameters(&diameters, targets);
        Ok(DetectionOutput { particles, stats })
    }
}

impl ParticleDetector for ThresholdDetector {
    fn name(&self) -> &str {
        "threshold"
    }

    fn detect(&self, request: DetectionRequest) -> PendingDetection {
        if !self.params.background_worker {
            return PendingDetection::ready(self.detect_blocking(
                &request.image,
                &request.targets,
                &request.settings,
            ));
        }

        let (completer, pending) = detection_channel();
        let detector = self.clone();
        let spawned = std::thread::Builder::new()
            .name("threshold-detector".into())
            .spawn(move || {
                let result =
                    detector.detect_blocking(&request.image, &request.targets, &request.settings);
                completer.complete(result);
            });
        if let Err(err) = spawned {
            // The completer went down with the closure; the caller sees `Abandoned`.
            warn!("failed to spawn detector worker: {err}");
        }
        pending
    }
}
