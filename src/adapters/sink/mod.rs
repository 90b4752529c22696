//! Response-sink adapters.

mod recording;

pub use recording::RecordingSink;
