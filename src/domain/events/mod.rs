//! Inbound behavioral events.
//!
//! Events arrive from the external event bus as immutable, append-only
//! records. This module defines the wire shape, payload interpretation,
//! and the normalized content hash used as the idempotency key.

mod event;

pub use event::{BehavioralEvent, EventKind, SCORE_MAX, SCORE_MIN};
