//! Particle-size statistics reported alongside a detection.
//!
//! Sizes are equivalent diameters in microns.

use serde::{Deserialize, Serialize};

use crate::grind::GrindTypeTargets;

/// Width of one histogram bin.
pub const SIZE_BIN_WIDTH_MICRONS: f32 = 100.0;

/// One histogram bin covering `[lower_microns, upper_microns)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeBin {
    pub lower_microns: f32,
    pub upper_microns: f32,
    pub count: usize,
}

/// Aggregate size distribution of one analysis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub particle_count: usize,
    pub mean_size_microns: f32,
    pub median_size_microns: f32,
    pub std_dev_microns: f32,
    pub min_size_microns: f32,
    pub max_size_microns: f32,
    /// `1 - std/mean`, clamped to `[0, 1]`; 1 means perfectly uniform.
    pub uniformity_coefficient: f32,
    pub fines_percentage: f32,
    pub boulders_percentage: f32,
    pub in_target_percentage: f32,
    /// Contiguous bins from the smallest to the largest occupied one.
    pub distribution: Vec<SizeBin>,
}

impl AggregateStats {
    /// Summarize a set of particle diameters.
    ///
    /// Non-finite or negative sizes are ignored. An empty input yields the
    /// all-zero value.
    pub fn from_diameters(sizes_microns: &[f32], targets: &GrindTypeTargets) -> Self {
        let mut sizes: Vec<f32> = sizes_microns
            .iter()
            .copied()
            .filter(|s| s.is_finite() && *s >= 0.0)
            .collect();
        if sizes.is_empty() {
            return Self::default();
        }
        sizes.sort_by(f32::total_cmp);

        let n = sizes.len();
        let nf = n as f32;
        let mean = sizes.iter().sum::<f32>() / nf;
        let var = sizes.iter().map(|s| (s - mean) * (s - mean)).sum::<f32>() / nf;
        let std_dev = var.sqrt();
        let median = if n % 2 == 1 {
            sizes[n / 2]
        } else {
            0.5 * (sizes[n / 2 - 1] + sizes[n / 2])
        };
        let uniformity = if mean > 0.0 {
            (1.0 - std_dev / mean).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let pct = |count: usize| 100.0 * count as f32 / nf;
        let fines = sizes.iter().filter(|&&s| targets.is_fine(s)).count();
        let boulders = sizes.iter().filter(|&&s| targets.is_boulder(s)).count();
        let in_target = sizes.iter().filter(|&&s| targets.in_target(s)).count();

        Self {
            particle_count: n,
            mean_size_microns: mean,
            median_size_microns: median,
            std_dev_microns: std_dev,
            min_size_microns: sizes[0],
            max_size_microns: sizes[n - 1],
            uniformity_coefficient: uniformity,
            fines_percentage: pct(fines),
            boulders_percentage: pct(boulders),
            in_target_percentage: pct(in_target),
            distribution: histogram(&sizes),
        }
    }
}

/// `sorted` must be ascending and non-empty.
fn histogram(sorted: &[f32]) -> Vec<SizeBin> {
    let bin_of = |s: f32| (s / SIZE_BIN_WIDTH_MICRONS).floor() as usize;
    let first = bin_of(sorted[0]);
    let last = bin_of(sorted[sorted.len() - 1]);

    let mut bins: Vec<SizeBin> = (first..=last)
        .map(|b| SizeBin {
            lower_microns: b as f32 * SIZE_BIN_WIDTH_MICRONS,
            upper_microns: (b + 1) as f32 * SIZE_BIN_WIDTH_MICRONS,
            count: 0,
        })
        .collect();
    for &s in sorted {
        bins[bin_of(s) - first].count += 1;
    }
    bins
}
