use grind_qa_core::SettingsError;

/// Errors reported by a particle detector.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum DetectionError {
    #[error("image too small ({width}x{height}, need at least {min_side} px per side)")]
    ImageTooSmall {
        width: u32,
        height: u32,
        min_side: u32,
    },
    #[error("no particles found above threshold {threshold}")]
    NoParticlesFound { threshold: u8 },
    #[error(transparent)]
    InvalidSettings(#[from] SettingsError),
    #[error("detector dropped the request without reporting a result")]
    Abandoned,
    #[error("detection did not complete within {timeout_ms} ms")]
    TimedOut { timeout_ms: u64 },
}
