//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `WELLSPRING`
//! prefix and nested sections use double underscores as separators; every
//! section falls back to its calibrated defaults, so an empty environment
//! yields a fully working configuration.
//!
//! # Example
//!
//! ```no_run
//! use wellspring::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod error;

pub use error::{ConfigError, ConfigValidationError};

use serde::Deserialize;

use crate::application::{IngestConfig, PartitionConfig};
use crate::domain::aggregation::AggregationConfig;
use crate::domain::guardian::GuardianConfig;
use crate::domain::protocol::SessionConfig;
use crate::domain::trigger::TriggerConfig;

/// Root application configuration
///
/// Contains all tunable sections of the core. Load using
/// [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Sliding-window and burnout-heuristic settings
    pub aggregation: AggregationConfig,

    /// Trigger-analysis weights and thresholds
    pub trigger: TriggerConfig,

    /// Guardian thresholds and time budget
    pub guardian: GuardianConfig,

    /// Conversation-session lifecycle
    pub session: SessionConfig,

    /// Ingestion and dedup limits
    pub ingest: IngestConfig,

    /// Worker sharding
    pub partitions: PartitionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads a `.env` file if present, then reads environment variables
    /// with the `WELLSPRING` prefix, using `__` to separate nested values:
    ///
    /// - `WELLSPRING__TRIGGER__TRIGGER_THRESHOLD=0.65`
    /// - `WELLSPRING__PARTITIONS__PARTITIONS=8`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value cannot be parsed into its
    /// expected type.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("WELLSPRING")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ConfigValidationError` if any value falls outside its
    /// legal range.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.validate_aggregation()?;
        self.validate_trigger()?;
        self.validate_guardian()?;
        self.validate_runtime()?;
        Ok(())
    }

    fn validate_aggregation(&self) -> Result<(), ConfigValidationError> {
        let agg = &self.aggregation;
        if agg.mood_window_days < 1 {
            return Err(ConfigValidationError::WindowTooShort("mood_window_days"));
        }
        if agg.confidence_window_days < 1 {
            return Err(ConfigValidationError::WindowTooShort(
                "confidence_window_days",
            ));
        }
        if agg.activity_window_days < 1 {
            return Err(ConfigValidationError::WindowTooShort("activity_window_days"));
        }
        if agg.trend_samples < 1 {
            return Err(ConfigValidationError::MustBePositive("trend_samples"));
        }
        if agg.keyword_hit_capacity < 1 {
            return Err(ConfigValidationError::MustBePositive("keyword_hit_capacity"));
        }
        for (name, weight) in [
            ("low_mood_weight", agg.burnout.low_mood_weight),
            (
                "declining_confidence_weight",
                agg.burnout.declining_confidence_weight,
            ),
            ("low_activity_weight", agg.burnout.low_activity_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigValidationError::WeightOutOfRange(name));
            }
        }
        Ok(())
    }

    fn validate_trigger(&self) -> Result<(), ConfigValidationError> {
        let trigger = &self.trigger;
        for (name, weight) in [
            ("mood_weight", trigger.mood_weight),
            ("confidence_weight", trigger.confidence_weight),
            ("keyword_weight", trigger.keyword_weight),
            ("temporal_weight", trigger.temporal_weight),
            ("decline_bonus", trigger.decline_bonus),
            ("keyword_bonus", trigger.keyword_bonus),
            ("temporal_bonus", trigger.temporal_bonus),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigValidationError::WeightOutOfRange(name));
            }
        }
        for (name, threshold) in [
            ("trigger_threshold", trigger.trigger_threshold),
            (
                "keyword_secondary_frequency",
                trigger.keyword_secondary_frequency,
            ),
        ] {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigValidationError::ThresholdOutOfRange(name));
            }
        }
        if trigger.min_events < 1 {
            return Err(ConfigValidationError::MustBePositive("min_events"));
        }
        if trigger.recent_events < trigger.min_events {
            return Err(ConfigValidationError::RecentBelowMinimum);
        }
        Ok(())
    }

    fn validate_guardian(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.guardian.burnout_disclaimer_threshold) {
            return Err(ConfigValidationError::ThresholdOutOfRange(
                "burnout_disclaimer_threshold",
            ));
        }
        if self.guardian.filter_timeout_ms < 1 {
            return Err(ConfigValidationError::FilterBudgetTooShort);
        }
        Ok(())
    }

    fn validate_runtime(&self) -> Result<(), ConfigValidationError> {
        if self.session.timeout_minutes < 1 {
            return Err(ConfigValidationError::SessionTimeoutTooShort);
        }
        if self.ingest.dedup_capacity < 1 {
            return Err(ConfigValidationError::MustBePositive("dedup_capacity"));
        }
        if self.ingest.dedup_retention_hours < 1 {
            return Err(ConfigValidationError::MustBePositive(
                "dedup_retention_hours",
            ));
        }
        if self.partitions.partitions < 1 {
            return Err(ConfigValidationError::MustBePositive("partitions"));
        }
        if self.partitions.queue_depth < 1 {
            return Err(ConfigValidationError::MustBePositive("queue_depth"));
        }
        Ok(())
    }
}
