use std::sync::Arc;

use grind_qa_core::{AggregateStats, AnalysisSettings, DetectedParticle, GrindTypeTargets};
use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::pending::PendingDetection;

/// Everything a detector needs for one analysis.
#[derive(Clone, Debug)]
pub struct DetectionRequest {
    pub image: Arc<GrayImage>,
    pub targets: GrindTypeTargets,
    pub settings: AnalysisSettings,
}

impl DetectionRequest {
    pub fn new(
        image: impl Into<Arc<GrayImage>>,
        targets: GrindTypeTargets,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            image: image.into(),
            targets,
            settings,
        }
    }
}

/// Successful detector answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionOutput {
    pub particles: Vec<DetectedParticle>,
    pub stats: AggregateStats,
}

/// A particle detector the validation harness can drive.
///
/// `detect` must return promptly; the work may continue elsewhere and report
/// through the returned [`PendingDetection`]. Identical requests must yield
/// identical outputs. The `Sync` bound means one instance may serve
/// concurrent requests.
pub trait ParticleDetector: Send + Sync {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &str;

    fn detect(&self, request: DetectionRequest) -> PendingDetection;
}

impl<D: ParticleDetector + ?Sized> ParticleDetector for Arc<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn detect(&self, request: DetectionRequest) -> PendingDetection {
        (**self).detect(request)
    }
}
