//! Deterministic phrase-table classifier.
//!
//! The default `TextClassifier` implementation: case-insensitive substring
//! matching against small curated phrase tables. Hosts with a hosted NLP
//! model plug it in behind the same trait; this adapter keeps the guardian
//! fully functional, deterministic, and fast without one.

use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::domain::foundation::DomainError;
use crate::domain::guardian::{RuleFlags, TextClassifier};

/// Phrases that read as medical or diagnostic advice.
static MEDICAL_PHRASES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "you should take",
        "stop taking",
        "increase your dose",
        "your dosage",
        "mg of",
        "you have depression",
        "you are depressed",
        "you have anxiety disorder",
        "diagnose",
        "diagnosis",
        "prescription",
        "prescribe",
        "medication you need",
        "see a doctor is unnecessary",
    ]
});

/// Phrases that carry a judgmental or blaming tone.
static JUDGMENTAL_PHRASES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "your own fault",
        "you failed",
        "you're lazy",
        "you are lazy",
        "you should have known",
        "you brought this on",
        "stop complaining",
        "just get over it",
        "you're overreacting",
        "you are overreacting",
        "that was stupid",
        "a real failure",
    ]
});

/// Phrases that touch crisis or self-harm territory.
static SENSITIVE_PHRASES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "hurt myself",
        "hurt yourself",
        "self-harm",
        "self harm",
        "end it all",
        "not worth living",
        "no reason to live",
        "kill myself",
        "suicide",
        "suicidal",
        "disappear forever",
        "better off without me",
    ]
});

/// Deterministic classifier over curated phrase tables.
///
/// One pass lowercases the input and checks each table with substring
/// matching, so a call is O(length of the text) and cannot fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedClassifier;

impl RuleBasedClassifier {
    pub fn new() -> Self {
        Self
    }

    fn matches_any(text: &str, phrases: &[&str]) -> bool {
        phrases.iter().any(|phrase| text.contains(phrase))
    }
}

#[async_trait]
impl TextClassifier for RuleBasedClassifier {
    async fn classify(&self, text: &str) -> Result<RuleFlags, DomainError> {
        let lowered = text.to_lowercase();
        Ok(RuleFlags {
            medical_advice: Self::matches_any(&lowered, &MEDICAL_PHRASES),
            judgmental_tone: Self::matches_any(&lowered, &JUDGMENTAL_PHRASES),
            sensitive_topic: Self::matches_any(&lowered, &SENSITIVE_PHRASES),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn classify(text: &str) -> RuleFlags {
        RuleBasedClassifier::new().classify(text).await.unwrap()
    }

    #[tokio::test]
    async fn neutral_text_raises_no_flags() {
        let flags = classify("Sounds like a tough week. Want to talk it through?").await;
        assert!(flags.is_clean());
    }

    #[tokio::test]
    async fn dosage_advice_is_flagged_medical() {
        let flags = classify("You should take 20mg of melatonin before bed.").await;
        assert!(flags.medical_advice);
        assert!(!flags.judgmental_tone);
    }

    #[tokio::test]
    async fn blaming_tone_is_flagged_judgmental() {
        let flags = classify("Honestly, that was your own fault.").await;
        assert!(flags.judgmental_tone);
    }

    #[tokio::test]
    async fn crisis_language_is_flagged_sensitive() {
        let flags = classify("Sometimes I think about ending it all. Life feels not worth living.").await;
        assert!(flags.sensitive_topic);
    }

    #[tokio::test]
    async fn matching_is_case_insensitive() {
        let flags = classify("YOU FAILED and it was YOUR OWN FAULT.").await;
        assert!(flags.judgmental_tone);
    }

    #[tokio::test]
    async fn multiple_tables_can_match_at_once() {
        let flags = classify("You have depression, and frankly you brought this on.").await;
        assert!(flags.medical_advice);
        assert!(flags.judgmental_tone);
    }

    #[tokio::test]
    async fn empty_text_is_clean() {
        assert!(classify("").await.is_clean());
    }
}
