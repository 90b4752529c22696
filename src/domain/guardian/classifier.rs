//! Pluggable text-classification capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::DomainError;

/// Boolean rule flags produced by text classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFlags {
    /// Text reads as medical or diagnostic advice.
    pub medical_advice: bool,
    /// Text carries a judgmental or blaming tone.
    pub judgmental_tone: bool,
    /// Text touches crisis or self-harm territory.
    pub sensitive_topic: bool,
}

impl RuleFlags {
    /// True when no rule flag is raised.
    pub fn is_clean(&self) -> bool {
        !self.medical_advice && !self.judgmental_tone && !self.sensitive_topic
    }
}

/// Capability interface for the underlying NLP signal detection.
///
/// Keeps the guardian decoupled from any specific model: production hosts
/// may back this with a hosted classifier, while tests substitute the
/// deterministic rule-based adapter. Implementations report failure through
/// the error channel; the guardian treats any error as filter-unavailable
/// and fails closed.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Classifies a candidate response into boolean rule flags.
    async fn classify(&self, text: &str) -> Result<RuleFlags, DomainError>;
}
