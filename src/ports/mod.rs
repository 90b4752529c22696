//! Ports - interfaces between the domain and the outside world.
//!
//! The host application implements these traits; the in-memory adapters
//! under `crate::adapters` serve development and tests.

mod event_store;
mod response_sink;

pub use event_store::EventStore;
pub use response_sink::ResponseSink;

// The classifier capability lives with the guardian; re-exported here so
// hosts find every pluggable seam in one place.
pub use crate::domain::guardian::{RuleFlags, TextClassifier};
