//! Core types and utilities for grind-analysis validation.
//!
//! This crate is intentionally small. It holds the particle model shared by the
//! scene generator, the detector contract, and the scoring code, plus the size
//! statistics every detector reports. It does *not* depend on any concrete
//! detector.

mod glyphs;
mod grind;
mod logger;
mod particle;
mod settings;
mod stats;

pub use glyphs::{draw_text_mut, text_width, GLYPH_HEIGHT, GLYPH_WIDTH};
pub use grind::{GrindType, GrindTypeTargets, UnknownGrindType};
pub use particle::{equivalent_radius, DetectedParticle, GroundTruthParticle};
pub use settings::{AnalysisSettings, CalibrationInfo, SettingsError};
pub use stats::{AggregateStats, SizeBin, SIZE_BIN_WIDTH_MICRONS};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
