use serde::{Deserialize, Serialize};

/// Errors raised when calibration or analysis settings are out of range.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum SettingsError {
    #[error("microns per pixel must be positive and finite (got {0})")]
    InvalidCalibration(f32),
    #[error("minimum particle size must be positive")]
    ZeroMinParticleSize,
    #[error("particle size range is empty (min={min}, max={max})")]
    EmptySizeRange { min: u32, max: u32 },
}

/// Pixel-to-micron conversion for one run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationInfo {
    pub microns_per_pixel: f32,
}

impl CalibrationInfo {
    pub fn new(microns_per_pixel: f32) -> Result<Self, SettingsError> {
        if !(microns_per_pixel.is_finite() && microns_per_pixel > 0.0) {
            return Err(SettingsError::InvalidCalibration(microns_per_pixel));
        }
        Ok(Self { microns_per_pixel })
    }

    #[inline]
    pub fn px_to_microns(&self, px: f32) -> f32 {
        px * self.microns_per_pixel
    }

    #[inline]
    pub fn area_px_to_microns2(&self, area_px: f32) -> f32 {
        area_px * self.microns_per_pixel * self.microns_per_pixel
    }
}

impl Default for CalibrationInfo {
    fn default() -> Self {
        Self {
            microns_per_pixel: 1.0,
        }
    }
}

/// Settings handed to a detector for one analysis.
///
/// Size limits are inclusive. Whether they bound pixel area or pixel radius is
/// up to the detector, which must document its choice.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Microns per pixel.
    pub calibration_factor: f32,
    pub min_particle_size: u32,
    pub max_particle_size: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            calibration_factor: 1.0,
            min_particle_size: 10,
            max_particle_size: 50_000,
        }
    }
}

impl AnalysisSettings {
    /// Default size limits with the given calibration.
    pub fn with_calibration(calibration_factor: f32) -> Self {
        Self {
            calibration_factor,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        CalibrationInfo::new(self.calibration_factor)?;
        if self.min_particle_size == 0 {
            return Err(SettingsError::ZeroMinParticleSize);
        }
        if self.min_particle_size >= self.max_particle_size {
            return Err(SettingsError::EmptySizeRange {
                min: self.min_particle_size,
                max: self.max_particle_size,
            });
        }
        Ok(())
    }

    pub fn calibration(&self) -> Result<CalibrationInfo, SettingsError> {
        CalibrationInfo::new(self.calibration_factor)
    }

    /// Inclusive size-range check.
    #[inline]
    pub fn accepts_size(&self, size: u32) -> bool {
        (self.min_particle_size..=self.max_particle_size).contains(&size)
    }
}
