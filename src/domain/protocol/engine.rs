//! Turn-by-turn driver for the conversation protocol.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, StateMachine};

use super::session::{ConversationSession, SessionConfig};
use super::state::ProtocolState;

/// Closing line used when the protocol ends a conversation on its own.
pub const NEUTRAL_CLOSING: &str =
    "Thank you for sharing today. I'm here whenever you want to pick this up again.";

/// What the user's turn communicated to the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnSignal {
    /// The user engaged; move forward along the happy path.
    Advance,
    /// The user rejected the proposed reframe.
    ReframeRejected,
    /// The user rejected the suggested micro-action.
    ActionRejected,
    /// The user wants to stop; end the session.
    Close,
}

/// Result of applying one turn to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub state: ProtocolState,
    /// Directive guiding the host's next response.
    pub prompt: String,
    /// True when the retry budget forced progression past a rejection loop.
    pub forced_progression: bool,
}

impl TurnOutcome {
    fn entered(state: ProtocolState) -> Self {
        Self {
            state,
            prompt: state.directive().to_string(),
            forced_progression: false,
        }
    }
}

/// Applies turn signals and safety interrupts to conversation sessions.
///
/// The engine owns every session mutation: backward edges fire only on the
/// matching rejection signal, each rejection loop is bounded by the retry
/// budget, and the EthicalAlert interrupt enters at most once per turn. An
/// invalid signal leaves the session untouched.
pub struct ProtocolEngine {
    config: SessionConfig,
}

impl ProtocolEngine {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Applies one user turn to the session.
    pub fn advance(
        &self,
        session: &mut ConversationSession,
        signal: TurnSignal,
    ) -> Result<TurnOutcome, DomainError> {
        let current = session.current_state();
        if current == ProtocolState::Idle {
            return Err(Self::invalid_signal(current, signal));
        }
        if current == ProtocolState::EthicalAlert {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "session is in a safety interrupt, resume it before advancing",
            ));
        }
        session.begin_turn();

        match signal {
            TurnSignal::Close => {
                self.move_to(session, ProtocolState::Idle)?;
                Ok(TurnOutcome {
                    state: ProtocolState::Idle,
                    prompt: NEUTRAL_CLOSING.to_string(),
                    forced_progression: false,
                })
            }
            TurnSignal::Advance => {
                let next = current.forward_next().ok_or_else(|| {
                    Self::invalid_signal(current, signal)
                })?;
                self.move_to(session, next)?;
                Ok(TurnOutcome::entered(next))
            }
            TurnSignal::ReframeRejected => self.handle_rejection(
                session,
                signal,
                ProtocolState::ProposeReframe,
                ProtocolState::IdentifyNegativeThought,
            ),
            TurnSignal::ActionRejected => self.handle_rejection(
                session,
                signal,
                ProtocolState::SuggestMicroAction,
                ProtocolState::ProposeReframe,
            ),
        }
    }

    /// Interrupts the session with the safety alert.
    ///
    /// At most one entry per turn; a second attempt in the same turn is
    /// rejected so the alert cannot loop.
    pub fn enter_ethical_alert(
        &self,
        session: &mut ConversationSession,
    ) -> Result<TurnOutcome, DomainError> {
        let current = session.current_state();
        if current == ProtocolState::EthicalAlert {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "session is already in the safety interrupt",
            ));
        }
        if session.alert_entries_this_turn() >= 1 {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "safety interrupt already entered this turn",
            ));
        }
        if !current.can_transition_to(&ProtocolState::EthicalAlert) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("cannot interrupt a session in {current:?}"),
            ));
        }

        session.set_interrupted(Some(current));
        session.set_state(ProtocolState::EthicalAlert);
        session.record_alert_entry();
        Ok(TurnOutcome::entered(ProtocolState::EthicalAlert))
    }

    /// Returns the session from the safety alert to the interrupted state.
    pub fn resume_from_alert(
        &self,
        session: &mut ConversationSession,
    ) -> Result<TurnOutcome, DomainError> {
        if session.current_state() != ProtocolState::EthicalAlert {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "session is not in the safety interrupt",
            ));
        }
        let resumed = session.interrupted_state().ok_or_else(|| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                "safety interrupt has no state to resume",
            )
        })?;

        session.set_interrupted(None);
        session.set_state(resumed);
        Ok(TurnOutcome::entered(resumed))
    }

    fn handle_rejection(
        &self,
        session: &mut ConversationSession,
        signal: TurnSignal,
        expected: ProtocolState,
        backward: ProtocolState,
    ) -> Result<TurnOutcome, DomainError> {
        let current = session.current_state();
        if current != expected {
            return Err(Self::invalid_signal(current, signal));
        }

        if session.retries_for(expected) < self.config.retry_budget {
            session.record_retry(expected);
            self.move_to(session, backward)?;
            return Ok(TurnOutcome::entered(backward));
        }

        // Budget spent: progress forward rather than loop again.
        tracing::warn!(
            user_id = %session.user_id,
            state = ?expected,
            budget = self.config.retry_budget,
            "retry budget exhausted, forcing progression"
        );
        self.move_to(session, ProtocolState::Reinforce)?;
        let mut outcome = TurnOutcome::entered(ProtocolState::Reinforce);
        outcome.forced_progression = true;
        Ok(outcome)
    }

    fn move_to(
        &self,
        session: &mut ConversationSession,
        target: ProtocolState,
    ) -> Result<(), DomainError> {
        let current = session.current_state();
        let next = current.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("cannot transition from {current:?} to {target:?}"),
            )
        })?;
        session.set_state(next);
        if next == ProtocolState::Reinforce {
            session.clear_retries();
        }
        Ok(())
    }

    fn invalid_signal(current: ProtocolState, signal: TurnSignal) -> DomainError {
        DomainError::new(
            ErrorCode::InvalidStateTransition,
            format!("signal {signal:?} is not valid in {current:?}"),
        )
    }
}
