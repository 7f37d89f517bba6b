use grind_qa_core::{CalibrationInfo, DetectedParticle, GroundTruthParticle};
use image::{GrayImage, Luma};
use log::debug;
use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::{GridParams, ScatterParams, SceneStyle};
use crate::raster::{draw_label, fill_disk};

/// A rendered scene plus the exact geometry used to draw it.
#[derive(Clone, Debug)]
pub struct SyntheticScene {
    pub image: GrayImage,
    /// Particles in draw order; `ground_truth[i].id == i`.
    pub ground_truth: Vec<GroundTruthParticle>,
    pub calibration: CalibrationInfo,
}

impl SyntheticScene {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Detections that reproduce the ground truth exactly.
    pub fn perfect_detections(&self) -> Vec<DetectedParticle> {
        self.ground_truth.iter().map(DetectedParticle::from).collect()
    }

    /// Ground-truth diameters in microns.
    pub fn diameters_microns(&self) -> Vec<f32> {
        self.ground_truth
            .iter()
            .map(|p| p.diameter_microns(self.calibration.microns_per_pixel))
            .collect()
    }
}

fn scene_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

struct Painter {
    image: GrayImage,
    style: SceneStyle,
    labels: bool,
    particles: Vec<GroundTruthParticle>,
}

impl Painter {
    fn new(width: u32, height: u32, style: SceneStyle, labels: bool, capacity: usize) -> Self {
        Self {
            image: GrayImage::from_pixel(width, height, Luma([style.background])),
            style,
            labels,
            particles: Vec::with_capacity(capacity),
        }
    }

    fn paint(&mut self, center: Point2<f32>, radius: f32) {
        let id = self.particles.len();
        fill_disk(&mut self.image, center, radius, self.style.particle);
        if self.labels {
            draw_label(&mut self.image, center, radius, id, self.style.label);
        }
        self.particles
            .push(GroundTruthParticle::new(id, center, radius));
    }

    fn finish(self, calibration: CalibrationInfo) -> SyntheticScene {
        SyntheticScene {
            image: self.image,
            ground_truth: self.particles,
            calibration,
        }
    }
}

/// Scatter `count` particles with uniformly random radii and positions.
///
/// Each center is drawn so the full circle stays inside the canvas. Particles
/// may overlap; nothing corrects that.
///
/// # Panics
///
/// Panics if [`ScatterParams::validate`] fails.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(params),
        fields(width = params.width, height = params.height, count = params.count)
    )
)]
pub fn generate_scatter(params: &ScatterParams) -> SyntheticScene {
    if let Err(err) = params.validate() {
        panic!("{err}");
    }
    let (r_min, r_max) = params.radius_range;
    let calibration = CalibrationInfo {
        microns_per_pixel: params.microns_per_pixel,
    };

    let mut rng = scene_rng(params.seed);
    let mut painter = Painter::new(
        params.width,
        params.height,
        params.style,
        params.label_particles,
        params.count,
    );
    let (w, h) = (params.width as f32, params.height as f32);

    for _ in 0..params.count {
        let radius = rng.gen_range(r_min as f32..=r_max as f32);
        let x = rng.gen_range(radius..=w - radius);
        let y = rng.gen_range(radius..=h - radius);
        painter.paint(Point2::new(x, y), radius);
    }

    debug!(
        "scatter scene {}x{}: {} particles, radius {}..={} px, seed {:?}",
        params.width, params.height, params.count, r_min, r_max, params.seed
    );
    painter.finish(calibration)
}

/// Place `rows × cols` equal circles on a regular lattice.
///
/// Centers sit at `(pitch_x·(c + ½), pitch_y·(r + ½))`, see
/// [`GridParams::pitch`]. Particles are emitted row by row.
///
/// # Panics
///
/// Panics if [`GridParams::validate`] fails.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(params),
        fields(rows = params.rows, cols = params.cols, radius = params.radius)
    )
)]
pub fn generate_grid(params: &GridParams) -> SyntheticScene {
    if let Err(err) = params.validate() {
        panic!("{err}");
    }
    let calibration = CalibrationInfo {
        microns_per_pixel: params.microns_per_pixel,
    };
    let (pitch_x, pitch_y) = params.pitch();
    let radius = params.radius as f32;

    let mut painter = Painter::new(
        params.width,
        params.height,
        params.style,
        params.label_particles,
        params.rows as usize * params.cols as usize,
    );
    for r in 0..params.rows {
        for c in 0..params.cols {
            let center = Point2::new(
                pitch_x * (c as f32 + 0.5),
                pitch_y * (r as f32 + 0.5),
            );
            painter.paint(center, radius);
        }
    }

    debug!(
        "grid scene {}x{}: {}x{} lattice, pitch ({pitch_x}, {pitch_y}), radius {}",
        params.width, params.height, params.rows, params.cols, params.radius
    );
    painter.finish(calibration)
}
