//! Trigger analysis - the heightened-support decision.
//!
//! A pure, deterministic scorer over the most recent events and the current
//! behavioral vector state. No hidden state: identical inputs always produce
//! identical output, which is what makes the decision unit-testable.

mod analyzer;

pub use analyzer::{
    Recommendation, SubScores, TriggerAnalysis, TriggerAnalyzer, TriggerConfig,
};
