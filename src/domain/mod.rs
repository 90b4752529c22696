//! Domain layer - pure business logic.
//!
//! No I/O happens here. Aggregation, trigger analysis, the conversation
//! protocol, and the guardian filter are all deterministic over their
//! inputs; the application layer wires them to the ports.

pub mod aggregation;
pub mod events;
pub mod foundation;
pub mod guardian;
pub mod protocol;
pub mod trigger;
