//! The guardian filter pipeline.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::classifier::TextClassifier;
use super::responses::{
    FALLBACK_RESPONSE, JUDGMENTAL_CORRECTIVE, MEDICAL_CORRECTIVE, SAFETY_DISCLAIMER,
};

/// Guardian thresholds and budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardianConfig {
    /// Burnout risk at or above this gets the mandatory disclaimer even
    /// when the text itself is neutral.
    pub burnout_disclaimer_threshold: f64,
    /// Hot-path budget for one filter pass, in milliseconds. The dispatcher
    /// fails closed to the fallback response when it elapses.
    pub filter_timeout_ms: u64,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            burnout_disclaimer_threshold: 0.70,
            filter_timeout_ms: 50,
        }
    }
}

/// A compliance rule the candidate response violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    MedicalAdvice,
    JudgmentalTone,
    SensitiveTopic,
}

/// Outcome of filtering one candidate response. Ephemeral, one per candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDecision {
    pub is_compliant: bool,
    pub final_response: String,
    pub violations: Vec<Violation>,
}

impl FilterDecision {
    /// The fail-closed decision: generic safe fallback, marked non-compliant
    /// so the host never mistakes it for a vetted candidate.
    pub fn fail_closed() -> Self {
        Self {
            is_compliant: false,
            final_response: FALLBACK_RESPONSE.to_string(),
            violations: Vec::new(),
        }
    }
}

/// Inspects every candidate outbound message and rewrites or blocks
/// non-compliant content.
///
/// Rules run in fixed order: medical advice, judgmental tone, then the
/// sensitive-topic/burnout disclaimer. Content is rewritten, never silently
/// dropped. One pass is O(length of the response) and never panics on
/// malformed input.
pub struct EthicalGuardian {
    classifier: Arc<dyn TextClassifier>,
    config: GuardianConfig,
}

impl EthicalGuardian {
    pub fn new(classifier: Arc<dyn TextClassifier>, config: GuardianConfig) -> Self {
        Self { classifier, config }
    }

    /// The configured hot-path budget, for the dispatcher's timeout.
    pub fn time_budget(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.config.filter_timeout_ms)
    }

    /// Filters one candidate response against the user's burnout risk.
    ///
    /// Always returns a decision: classification failure yields the
    /// fail-closed fallback, never the unfiltered candidate and never an
    /// error surfaced to the caller.
    pub async fn filter(&self, candidate: &str, burnout_risk: f64) -> FilterDecision {
        let flags = match self.classifier.classify(candidate).await {
            Ok(flags) => flags,
            Err(err) => {
                tracing::warn!(error = %err, "text classifier unavailable, failing closed");
                return FilterDecision::fail_closed();
            }
        };

        let mut final_response = candidate.to_string();
        let mut violations = Vec::new();

        if flags.medical_advice {
            final_response = format!("{} {}", MEDICAL_CORRECTIVE, final_response);
            violations.push(Violation::MedicalAdvice);
        }

        if flags.judgmental_tone {
            final_response = format!("{} {}", JUDGMENTAL_CORRECTIVE, final_response);
            violations.push(Violation::JudgmentalTone);
        }

        if flags.sensitive_topic || burnout_risk >= self.config.burnout_disclaimer_threshold {
            if flags.sensitive_topic {
                violations.push(Violation::SensitiveTopic);
            }
            // Idempotent: a disclaimer already present is never duplicated.
            if !final_response.contains(SAFETY_DISCLAIMER) {
                final_response = format!("{} {}", SAFETY_DISCLAIMER, final_response);
            }
        }

        FilterDecision {
            is_compliant: !flags.medical_advice && !flags.judgmental_tone,
            final_response,
            violations,
        }
    }
}
