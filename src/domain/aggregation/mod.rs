//! Aggregation module - the behavioral vector engine.
//!
//! Maintains per-user sliding-window aggregates over the event stream:
//! trailing mood and confidence averages, activity counts, negative-lexicon
//! hits, and the derived burnout risk. Updates are O(1) amortized because
//! each sample is pushed and evicted exactly once.

mod lexicon;
mod vector_state;
mod window;

pub use lexicon::{scan_for_negative_terms, NEGATIVE_LEXICON};
pub use vector_state::{AggregationConfig, BehavioralVectorState, BurnoutWeights, KeywordHit};
pub use window::SlidingWindow;
