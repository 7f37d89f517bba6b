use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Radius of the circle with the given area.
///
/// Non-positive areas map to a zero radius.
#[inline]
pub fn equivalent_radius(area: f32) -> f32 {
    if area > 0.0 {
        (area / PI).sqrt()
    } else {
        0.0
    }
}

/// A particle placed into a synthetic scene with exactly known geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthParticle {
    /// Draw index inside the scene.
    pub id: usize,
    /// Circle center in pixel space.
    pub center: Point2<f32>,
    /// Circle radius in pixels.
    pub radius: f32,
    /// `π·radius²`, in px².
    pub area: f32,
}

impl GroundTruthParticle {
    pub fn new(id: usize, center: Point2<f32>, radius: f32) -> Self {
        Self {
            id,
            center,
            radius,
            area: PI * radius * radius,
        }
    }

    /// Diameter converted to microns.
    pub fn diameter_microns(&self, microns_per_pixel: f32) -> f32 {
        2.0 * self.radius * microns_per_pixel
    }
}

/// A particle reported by a detector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedParticle {
    /// Particle centroid in pixel space.
    pub position: Point2<f32>,
    /// Area in px².
    pub area: f32,
}

impl DetectedParticle {
    pub fn new(position: Point2<f32>, area: f32) -> Self {
        Self { position, area }
    }

    /// Radius of the circle with the same area.
    pub fn equivalent_radius(&self) -> f32 {
        equivalent_radius(self.area)
    }

    /// Equivalent diameter converted to microns.
    pub fn diameter_microns(&self, microns_per_pixel: f32) -> f32 {
        2.0 * self.equivalent_radius() * microns_per_pixel
    }

    pub fn distance_to(&self, point: &Point2<f32>) -> f32 {
        nalgebra::distance(&self.position, point)
    }
}

impl From<&GroundTruthParticle> for DetectedParticle {
    /// A detection that reproduces the ground-truth circle exactly.
    fn from(gt: &GroundTruthParticle) -> Self {
        Self {
            position: gt.center,
            area: gt.area,
        }
    }
}
