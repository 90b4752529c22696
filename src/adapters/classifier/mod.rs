//! Text-classifier adapters.

mod rule_based;

pub use rule_based::RuleBasedClassifier;
