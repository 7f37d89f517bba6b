//! Particle-detector contract used by the validation harness.
//!
//! The harness never calls a segmentation algorithm directly. It talks to a
//! [`ParticleDetector`], which accepts a [`DetectionRequest`] and answers
//! through a one-shot [`PendingDetection`] the caller blocks on.
//!
//! [`ThresholdDetector`] is a small reference implementation (global
//! threshold + connected components) so the pipeline can be exercised end to
//! end on synthetic scenes.

mod detector;
mod error;
mod pending;
mod reference;
mod threshold;

pub use detector::{DetectionOutput, DetectionRequest, ParticleDetector};
pub use error::DetectionError;
pub use pending::{detection_channel, DetectionCompleter, PendingDetection};
pub use reference::{ThresholdDetector, ThresholdDetectorParams, ThresholdMode};
pub use threshold::otsu_threshold;
