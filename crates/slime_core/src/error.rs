use thiserror::Error;

/// Invalid tuning values found while validating a [`crate::SlimeConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("{field}: minimum {min} exceeds maximum {max}")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// A preset name that does not match any [`crate::EmotionPreset`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown emotion preset: {0}")]
pub struct UnknownPreset(pub String);
