//! Conversation protocol - the structured multi-turn dialogue.
//!
//! A finite-state machine sequences each supportive interaction. Backward
//! edges fire only on explicit rejection signals, retry budgets force
//! progression after repeated rejections, and the EthicalAlert interrupt
//! is bounded to one re-entry per turn.

mod engine;
mod session;
mod state;

pub use engine::{ProtocolEngine, TurnOutcome, TurnSignal, NEUTRAL_CLOSING};
pub use session::{ConversationSession, SessionConfig};
pub use state::ProtocolState;
