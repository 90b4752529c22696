//! Application layer - orchestration over the domain.
//!
//! The ingestor turns raw events into aggregation-state updates, the
//! partition router serializes all per-user work onto sharded workers,
//! and the dispatcher gates every outbound response through the guardian.

mod dispatcher;
mod ingestor;
mod partitions;

pub use dispatcher::OutputDispatcher;
pub use ingestor::{EventIngestor, IngestConfig, IngestOutcome};
pub use partitions::{PartitionConfig, PartitionRouter};
