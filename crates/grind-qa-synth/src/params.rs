use serde::{Deserialize, Serialize};

/// Scene parameters that cannot be rendered.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum SceneError {
    #[error("canvas must be non-empty ({width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("radius range must satisfy 1 <= min <= max (got {min}..={max})")]
    InvalidRadiusRange { min: u32, max: u32 },
    #[error("max radius {radius} exceeds half of the {width}x{height} canvas")]
    RadiusExceedsCanvas { radius: u32, width: u32, height: u32 },
    #[error("grid must have at least one cell ({rows}x{cols})")]
    EmptyGrid { rows: u32, cols: u32 },
    #[error("grid radius must be positive")]
    ZeroRadius,
    #[error("{rows}x{cols} lattice with pitch ({pitch_x}, {pitch_y}) exceeds the {width}x{height} canvas")]
    LatticeExceedsCanvas {
        rows: u32,
        cols: u32,
        pitch_x: f32,
        pitch_y: f32,
        width: u32,
        height: u32,
    },
    #[error("radius {radius} does not fit lattice pitch ({pitch_x}, {pitch_y})")]
    RadiusExceedsPitch { radius: u32, pitch_x: f32, pitch_y: f32 },
    #[error("microns per pixel must be positive (got {0})")]
    InvalidCalibration(f32),
}

fn check_canvas(width: u32, height: u32) -> Result<(), SceneError> {
    if width == 0 || height == 0 {
        return Err(SceneError::EmptyCanvas { width, height });
    }
    Ok(())
}

fn check_calibration(microns_per_pixel: f32) -> Result<(), SceneError> {
    if !(microns_per_pixel.is_finite() && microns_per_pixel > 0.0) {
        return Err(SceneError::InvalidCalibration(microns_per_pixel));
    }
    Ok(())
}

/// Seed used when a scatter scene does not specify one.
pub const DEFAULT_SCENE_SEED: u64 = 0x5eed_c0ffee;

fn default_seed() -> Option<u64> {
    Some(DEFAULT_SCENE_SEED)
}

/// Gray levels used to paint a scene.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SceneStyle {
    pub background: u8,
    pub particle: u8,
    /// Tone of the optional index labels; must stay darker than any
    /// foreground threshold so labels read as particle pixels.
    pub label: u8,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            background: 240,
            particle: 30,
            label: 90,
        }
    }
}

/// Random-scatter scene parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScatterParams {
    pub width: u32,
    pub height: u32,
    pub count: usize,
    /// Inclusive radius range in pixels.
    pub radius_range: (u32, u32),
    pub microns_per_pixel: f32,
    /// `None` seeds from OS entropy.
    #[serde(default = "default_seed")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub label_particles: bool,
    #[serde(default)]
    pub style: SceneStyle,
}

impl ScatterParams {
    pub fn new(
        width: u32,
        height: u32,
        count: usize,
        radius_range: (u32, u32),
        microns_per_pixel: f32,
    ) -> Self {
        Self {
            width,
            height,
            count,
            radius_range,
            microns_per_pixel,
            seed: default_seed(),
            label_particles: false,
            style: SceneStyle::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Opt into a nondeterministic scene.
    pub fn with_entropy(mut self) -> Self {
        self.seed = None;
        self
    }

    pub fn with_labels(mut self, label_particles: bool) -> Self {
        self.label_particles = label_particles;
        self
    }

    /// Check that every circle fits the canvas.
    pub fn validate(&self) -> Result<(), SceneError> {
        let (min, max) = self.radius_range;
        check_canvas(self.width, self.height)?;
        if min == 0 || min > max {
            return Err(SceneError::InvalidRadiusRange { min, max });
        }
        if 2 * u64::from(max) > u64::from(self.width.min(self.height)) {
            return Err(SceneError::RadiusExceedsCanvas {
                radius: max,
                width: self.width,
                height: self.height,
            });
        }
        check_calibration(self.microns_per_pixel)
    }
}

/// How grid lattice pitch is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GridSpacing {
    /// Pitch `2·radius + gap_px` on both axes, lattice anchored at the top-left.
    Packed { gap_px: u32 },
    /// Pitch `width / cols` and `height / rows`: cells evenly partition the canvas.
    Fill,
}

impl Default for GridSpacing {
    fn default() -> Self {
        GridSpacing::Packed { gap_px: 40 }
    }
}

/// Regular-grid scene parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    pub width: u32,
    pub height: u32,
    pub rows: u32,
    pub cols: u32,
    pub radius: u32,
    pub microns_per_pixel: f32,
    #[serde(default)]
    pub spacing: GridSpacing,
    #[serde(default)]
    pub label_particles: bool,
    #[serde(default)]
    pub style: SceneStyle,
}

impl GridParams {
    pub fn new(
        width: u32,
        height: u32,
        rows: u32,
        cols: u32,
        radius: u32,
        microns_per_pixel: f32,
    ) -> Self {
        Self {
            width,
            height,
            rows,
            cols,
            radius,
            microns_per_pixel,
            spacing: GridSpacing::default(),
            label_particles: false,
            style: SceneStyle::default(),
        }
    }

    pub fn with_spacing(mut self, spacing: GridSpacing) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_labels(mut self, label_particles: bool) -> Self {
        self.label_particles = label_particles;
        self
    }

    /// Lattice pitch `(x, y)` in pixels.
    pub fn pitch(&self) -> (f32, f32) {
        match self.spacing {
            GridSpacing::Packed { gap_px } => {
                let p = 2.0 * self.radius as f32 + gap_px as f32;
                (p, p)
            }
            GridSpacing::Fill => (
                self.width as f32 / self.cols.max(1) as f32,
                self.height as f32 / self.rows.max(1) as f32,
            ),
        }
    }

    /// Check that the lattice fits the canvas and each circle fits its cell.
    pub fn validate(&self) -> Result<(), SceneError> {
        check_canvas(self.width, self.height)?;
        if self.rows == 0 || self.cols == 0 {
            return Err(SceneError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.radius == 0 {
            return Err(SceneError::ZeroRadius);
        }
        check_calibration(self.microns_per_pixel)?;

        let (pitch_x, pitch_y) = self.pitch();
        if pitch_x * self.cols as f32 > self.width as f32
            || pitch_y * self.rows as f32 > self.height as f32
        {
            return Err(SceneError::LatticeExceedsCanvas {
                rows: self.rows,
                cols: self.cols,
                pitch_x,
                pitch_y,
                width: self.width,
                height: self.height,
            });
        }
        if 2.0 * self.radius as f32 > pitch_x.min(pitch_y) {
            return Err(SceneError::RadiusExceedsPitch {
                radius: self.radius,
                pitch_x,
                pitch_y,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scatter_defaults_to_fixed_seed() {
        let p = ScatterParams::new(100, 100, 3, (2, 4), 10.0);
        assert_eq!(p.seed, Some(DEFAULT_SCENE_SEED));
        assert_eq!(p.clone().with_entropy().seed, None);
        assert_eq!(p.with_seed(7).seed, Some(7));
    }

    #[test]
    fn scatter_json_fills_defaults() {
        let raw = r#"{"width":64,"height":48,"count":5,"radius_range":[3,6],"microns_per_pixel":12.5}"#;
        let p: ScatterParams = serde_json::from_str(raw).expect("parse");
        assert_eq!(p, ScatterParams::new(64, 48, 5, (3, 6), 12.5));
    }

    #[test]
    fn grid_pitch_by_spacing_mode() {
        let g = GridParams::new(1000, 800, 5, 4, 30, 1.0);
        assert_eq!(g.pitch(), (100.0, 100.0));
        let g = g.with_spacing(GridSpacing::Fill);
        assert_eq!(g.pitch(), (250.0, 160.0));
    }

    #[test]
    fn scatter_validation_reports_bad_ranges() {
        assert_eq!(ScatterParams::new(100, 80, 3, (2, 40), 1.0).validate(), Ok(()));
        assert_eq!(
            ScatterParams::new(0, 80, 3, (2, 4), 1.0).validate(),
            Err(SceneError::EmptyCanvas { width: 0, height: 80 })
        );
        assert_eq!(
            ScatterParams::new(100, 80, 3, (5, 4), 1.0).validate(),
            Err(SceneError::InvalidRadiusRange { min: 5, max: 4 })
        );
        assert_eq!(
            ScatterParams::new(100, 80, 3, (2, 41), 1.0).validate(),
            Err(SceneError::RadiusExceedsCanvas { radius: 41, width: 100, height: 80 })
        );
        assert_eq!(
            ScatterParams::new(100, 80, 3, (2, u32::MAX), 1.0).validate(),
            Err(SceneError::RadiusExceedsCanvas { radius: u32::MAX, width: 100, height: 80 })
        );
        assert_eq!(
            ScatterParams::new(100, 80, 3, (2, 4), 0.0).validate(),
            Err(SceneError::InvalidCalibration(0.0))
        );
    }

    #[test]
    fn grid_validation_reports_bad_lattices() {
        assert_eq!(GridParams::new(1000, 1000, 5, 5, 30, 10.0).validate(), Ok(()));
        assert_eq!(
            GridParams::new(300, 300, 0, 5, 30, 1.0).validate(),
            Err(SceneError::EmptyGrid { rows: 0, cols: 5 })
        );
        assert_eq!(
            GridParams::new(300, 300, 1, 1, 0, 1.0).validate(),
            Err(SceneError::ZeroRadius)
        );
        assert!(matches!(
            GridParams::new(300, 300, 5, 5, 30, 1.0).validate(),
            Err(SceneError::LatticeExceedsCanvas { rows: 5, cols: 5, .. })
        ));
        assert!(matches!(
            GridParams::new(100, 100, 2, 2, 30, 1.0)
                .with_spacing(GridSpacing::Fill)
                .validate(),
            Err(SceneError::RadiusExceedsPitch { radius: 30, .. })
        ));
        assert!(matches!(
            GridParams::new(100, 100, 1, 1, u32::MAX, 1.0).validate(),
            Err(SceneError::LatticeExceedsCanvas { .. })
        ));
    }

    #[test]
    fn grid_spacing_is_tagged() {
        let json = serde_json::to_string(&GridSpacing::Packed { gap_px: 8 }).expect("ser");
        assert_eq!(json, r#"{"mode":"packed","gap_px":8}"#);
        let fill: GridSpacing = serde_json::from_str(r#"{"mode":"fill"}"#).expect("de");
        assert_eq!(fill, GridSpacing::Fill);
    }
}
