//! Ethical Guardian - the mandatory outbound safety filter.
//!
//! Every candidate response passes through `EthicalGuardian::filter` before
//! delivery; the output dispatcher owns the only path to the response sink,
//! so there is structurally no way around it. On any internal failure the
//! filter fails closed to a generic safe fallback rather than letting an
//! unchecked candidate through.

mod classifier;
mod filter;
mod responses;

pub use classifier::{RuleFlags, TextClassifier};
pub use filter::{EthicalGuardian, FilterDecision, GuardianConfig, Violation};
pub use responses::{
    FALLBACK_RESPONSE, JUDGMENTAL_CORRECTIVE, MEDICAL_CORRECTIVE, SAFETY_DISCLAIMER,
};
