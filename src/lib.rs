//! Wellspring - Behavioral Event Aggregation and Conversational Safety Core
//!
//! This crate implements the aggregation, trigger-analysis, dialogue-protocol,
//! and output-filtering logic that powers a supportive AI assistant. The host
//! application supplies lifecycle events and candidate responses; this core
//! guarantees bounded sliding-window aggregation, deterministic trigger
//! decisions, and a safety filter that gates every outbound message.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

/// Initializes a tracing subscriber for host binaries and integration tests.
///
/// Respects `RUST_LOG` via an env filter. Safe to call more than once; later
/// registrations are ignored.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
