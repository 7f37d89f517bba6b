//! Accuracy metrics derived from a particle matching.

use std::fmt;

use grind_qa_core::{CalibrationInfo, DetectedParticle, GroundTruthParticle};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::matcher::{match_particles, MatchedPair, ParticleMatching};

/// Scored comparison of one detector output against ground truth.
///
/// Every input particle lands in exactly one of `matched`,
/// `unmatched_detected` or `unmatched_expected`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub tolerance_px: f32,
    pub total_expected: usize,
    pub total_detected: usize,
    pub correctly_detected: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub precision: f32,
    pub recall: f32,
    pub f1_score: f32,
    /// Mean center distance over matched pairs, px; 0 without matches.
    pub avg_position_error: f32,
    /// Mean `|equivalent radius - radius|` over matched pairs, px; 0 without matches.
    pub avg_size_error: f32,
    pub matched: Vec<MatchedPair>,
    pub unmatched_detected: Vec<DetectedParticle>,
    pub unmatched_expected: Vec<GroundTruthParticle>,
}

impl ValidationReport {
    /// Derive metrics from a matching.
    ///
    /// Precision and recall divide by `max(total, 1)`, so empty inputs score 0
    /// rather than NaN. Error means are 0 on an empty match set.
    pub fn from_matching(matching: ParticleMatching, tolerance_px: f32) -> Self {
        let correct = matching.matched.len();
        let total_detected = correct + matching.unmatched_detected.len();
        let total_expected = correct + matching.unmatched_expected.len();

        let precision = correct as f32 / total_detected.max(1) as f32;
        let recall = correct as f32 / total_expected.max(1) as f32;
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        let avg_position_error = mean(matching.matched.iter().map(|m| m.distance));
        let avg_size_error = mean(matching.matched.iter().map(MatchedPair::size_error));

        Self {
            tolerance_px,
            total_expected,
            total_detected,
            correctly_detected: correct,
            false_positives: matching.unmatched_detected.len(),
            false_negatives: matching.unmatched_expected.len(),
            precision,
            recall,
            f1_score,
            avg_position_error,
            avg_size_error,
            matched: matching.matched,
            unmatched_detected: matching.unmatched_detected,
            unmatched_expected: matching.unmatched_expected,
        }
    }

    /// Mean size error converted to microns.
    pub fn size_error_microns(&self, calibration: &CalibrationInfo) -> f32 {
        calibration.px_to_microns(self.avg_size_error)
    }

    /// Mean position error converted to microns.
    pub fn position_error_microns(&self, calibration: &CalibrationInfo) -> f32 {
        calibration.px_to_microns(self.avg_position_error)
    }

    /// Check the bucket-count invariants.
    pub fn is_consistent(&self) -> bool {
        self.correctly_detected == self.matched.len()
            && self.false_positives == self.unmatched_detected.len()
            && self.false_negatives == self.unmatched_expected.len()
            && self.matched.len() + self.unmatched_detected.len() == self.total_detected
            && self.matched.len() + self.unmatched_expected.len() == self.total_expected
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "tp={} fp={} fn={} precision={:.3} recall={:.3} f1={:.3} pos_err={:.2}px size_err={:.2}px",
            self.correctly_detected,
            self.false_positives,
            self.false_negatives,
            self.precision,
            self.recall,
            self.f1_score,
            self.avg_position_error,
            self.avg_size_error
        )
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tolerance:        {:.2} px", self.tolerance_px)?;
        writeln!(f, "expected:         {}", self.total_expected)?;
        writeln!(f, "detected:         {}", self.total_detected)?;
        writeln!(f, "matched:          {}", self.correctly_detected)?;
        writeln!(f, "false positives:  {}", self.false_positives)?;
        writeln!(f, "false negatives:  {}", self.false_negatives)?;
        writeln!(f, "precision:        {:.3}", self.precision)?;
        writeln!(f, "recall:           {:.3}", self.recall)?;
        writeln!(f, "f1:               {:.3}", self.f1_score)?;
        writeln!(f, "position error:   {:.3} px", self.avg_position_error)?;
        write!(f, "size error:       {:.3} px", self.avg_size_error)
    }
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, n) = values.fold((0.0f64, 0usize), |(s, n), v| (s + v as f64, n + 1));
    if n == 0 {
        0.0
    } else {
        (sum / n as f64) as f32
    }
}

/// Match detections to ground truth and score the result. Never fails.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(detected, expected),
        fields(detected = detected.len(), expected = expected.len())
    )
)]
pub fn match_and_score(
    detected: &[DetectedParticle],
    expected: &[GroundTruthParticle],
    tolerance_px: f32,
) -> ValidationReport {
    ValidationReport::from_matching(match_particles(detected, expected, tolerance_px), tolerance_px)
}
