//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ConfigValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("Weight '{0}' must be between 0 and 1")]
    WeightOutOfRange(&'static str),

    #[error("Threshold '{0}' must be between 0 and 1")]
    ThresholdOutOfRange(&'static str),

    #[error("Window '{0}' must be at least one day")]
    WindowTooShort(&'static str),

    #[error("'{0}' must be at least 1")]
    MustBePositive(&'static str),

    #[error("recent_events must be at least min_events")]
    RecentBelowMinimum,

    #[error("Session timeout must be at least one minute")]
    SessionTimeoutTooShort,

    #[error("Filter time budget must be at least one millisecond")]
    FilterBudgetTooShort,
}
