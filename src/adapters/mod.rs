//! Adapters - concrete implementations of the ports.
//!
//! Everything here is in-process: a deterministic rule-based classifier,
//! an in-memory event store, and a recording sink. Production hosts swap
//! in their own implementations behind the same traits.

pub mod classifier;
pub mod sink;
pub mod store;

pub use classifier::RuleBasedClassifier;
pub use sink::RecordingSink;
pub use store::InMemoryEventStore;
