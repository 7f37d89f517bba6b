//! Greedy nearest-available matching of detections to ground truth.

use grind_qa_core::{DetectedParticle, GroundTruthParticle};
use serde::{Deserialize, Serialize};

/// One detection paired with the ground-truth particle it claimed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    /// Index into the detected input slice.
    pub detected_index: usize,
    /// Index into the expected input slice.
    pub expected_index: usize,
    pub detected: DetectedParticle,
    pub expected: GroundTruthParticle,
    /// Center distance in pixels.
    pub distance: f32,
}

impl MatchedPair {
    /// `|sqrt(area/π) - radius|` in pixels.
    pub fn size_error(&self) -> f32 {
        (self.detected.equivalent_radius() - self.expected.radius).abs()
    }
}

/// Disjoint partition of the matcher inputs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticleMatching {
    pub matched: Vec<MatchedPair>,
    /// False positives, in input order.
    pub unmatched_detected: Vec<DetectedParticle>,
    /// False negatives, in input order.
    pub unmatched_expected: Vec<GroundTruthParticle>,
}

/// Pair detected particles with ground-truth particles.
///
/// Detected particles are visited in the given order. Each one claims the
/// closest still-unclaimed expected particle whose center lies within
/// `tolerance_px`; on equal distances the earlier expected particle wins.
/// Detections with no candidate are false positives, expected particles never
/// claimed are false negatives.
///
/// This is a greedy first-come-first-served assignment, not a globally optimal
/// one: an early detection may take a particle that a later, closer detection
/// would have matched. Cost is `O(detected × expected)`.
///
/// A NaN tolerance or coordinate never satisfies the distance test.
pub fn match_particles(
    detected: &[DetectedParticle],
    expected: &[GroundTruthParticle],
    tolerance_px: f32,
) -> ParticleMatching {
    let mut used = vec![false; expected.len()];
    let mut matched = Vec::new();
    let mut unmatched_detected = Vec::new();

    for (detected_index, det) in detected.iter().enumerate() {
        let mut best: Option<(usize, f32)> = None;
        for (expected_index, exp) in expected.iter().enumerate() {
            if used[expected_index] {
                continue;
            }
            let distance = det.distance_to(&exp.center);
            // Written as `!(d <= t)` so NaN is rejected.
            if !(distance <= tolerance_px) {
                continue;
            }
            if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                best = Some((expected_index, distance));
            }
        }

        match best {
            Some((expected_index, distance)) => {
                used[expected_index] = true;
                matched.push(MatchedPair {
                    detected_index,
                    expected_index,
                    detected: *det,
                    expected: expected[expected_index],
                    distance,
                });
            }
            None => unmatched_detected.push(*det),
        }
    }

    let unmatched_expected = expected
        .iter()
        .zip(&used)
        .filter(|(_, claimed)| !**claimed)
        .map(|(p, _)| *p)
        .collect();

    ParticleMatching {
        matched,
        unmatched_detected,
        unmatched_expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn gt(id: usize, x: f32, y: f32, r: f32) -> GroundTruthParticle {
        GroundTruthParticle::new(id, Point2::new(x, y), r)
    }

    fn det(x: f32, y: f32, area: f32) -> DetectedParticle {
        DetectedParticle::new(Point2::new(x, y), area)
    }

    #[test]
    fn first_detection_claims_shared_candidate() {
        let expected = [gt(0, 100.0, 100.0, 10.0)];
        // The second detection is closer but arrives later.
        let detected = [det(104.0, 100.0, 300.0), det(101.0, 100.0, 300.0)];
        let m = match_particles(&detected, &expected, 5.0);

        assert_eq!(m.matched.len(), 1);
        assert_eq!(m.matched[0].detected_index, 0);
        assert_eq!(m.matched[0].expected_index, 0);
        assert_eq!(m.matched[0].distance, 4.0);
        assert_eq!(m.unmatched_detected, vec![detected[1]]);
        assert!(m.unmatched_expected.is_empty());
    }

    #[test]
    fn greedy_is_not_globally_optimal() {
        // A sits between X and Y and is nearer to Y; B only reaches Y.
        let expected = [gt(0, 0.0, 0.0, 5.0), gt(1, 6.0, 0.0, 5.0)];
        let detected = [det(4.0, 0.0, 80.0), det(9.0, 0.0, 80.0)];
        let m = match_particles(&detected, &expected, 5.0);

        assert_eq!(m.matched.len(), 1);
        assert_eq!(m.matched[0].expected_index, 1);
        assert_eq!(m.unmatched_detected.len(), 1);
        assert_eq!(m.unmatched_expected, vec![expected[0]]);
    }

    #[test]
    fn picks_nearest_candidate_with_first_on_ties() {
        let expected = [
            gt(0, 10.0, 0.0, 3.0),
            gt(1, 0.0, 3.0, 3.0),
            gt(2, 3.0, 0.0, 3.0),
        ];
        let detected = [det(0.0, 0.0, 20.0)];
        let m = match_particles(&detected, &expected, 20.0);
        // Expected 1 and 2 are both at distance 3; 1 comes first.
        assert_eq!(m.matched[0].expected_index, 1);
        assert_eq!(m.unmatched_expected.len(), 2);
    }

    #[test]
    fn tolerance_is_inclusive() {
        let expected = [gt(0, 0.0, 0.0, 2.0)];
        let detected = [det(3.0, 4.0, 12.0)];
        assert_eq!(match_particles(&detected, &expected, 5.0).matched.len(), 1);
        assert_eq!(match_particles(&detected, &expected, 4.999).matched.len(), 0);
    }

    #[test]
    fn zero_tolerance_matches_exact_positions() {
        let expected = [gt(0, 7.5, 2.25, 2.0), gt(1, 30.0, 30.0, 4.0)];
        let detected: Vec<DetectedParticle> = expected.iter().map(DetectedParticle::from).collect();
        let m = match_particles(&detected, &expected, 0.0);
        assert_eq!(m.matched.len(), 2);
        assert!(m.matched.iter().all(|p| p.distance == 0.0 && p.size_error() < 1e-4));
    }

    #[test]
    fn nan_never_matches() {
        let expected = [gt(0, 0.0, 0.0, 2.0)];
        let detected = [det(0.0, 0.0, 12.0), det(f32::NAN, 0.0, 12.0)];
        assert!(match_particles(&detected, &expected, f32::NAN).matched.is_empty());
        let m = match_particles(&detected[1..], &expected, 10.0);
        assert!(m.matched.is_empty());
        assert_eq!(m.unmatched_detected.len(), 1);
    }

    #[test]
    fn empty_inputs() {
        let m = match_particles(&[], &[], 5.0);
        assert_eq!(m, ParticleMatching::default());

        let expected = [gt(0, 1.0, 1.0, 1.0)];
        let m = match_particles(&[], &expected, 5.0);
        assert_eq!(m.unmatched_expected.len(), 1);

        let detected = [det(1.0, 1.0, 3.0)];
        let m = match_particles(&detected, &[], 5.0);
        assert_eq!(m.unmatched_detected.len(), 1);
    }
}
