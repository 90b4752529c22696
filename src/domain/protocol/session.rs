//! Per-user conversation session.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::foundation::{SessionId, Timestamp, UserId};

use super::state::ProtocolState;

/// Session lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions idle longer than this are expired and recreated.
    pub timeout_minutes: i64,
    /// Maximum backward-edge retries per state before forced progression.
    pub retry_budget: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: 30,
            retry_budget: 2,
        }
    }
}

/// Explicit per-user session state for the conversation protocol.
///
/// Created on the first turn, reset on explicit "forget me", expired after
/// the session timeout. Never ambient: the session is passed through the
/// engine by the partition worker that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: SessionId,
    pub user_id: UserId,
    current_state: ProtocolState,
    /// State the EthicalAlert interrupt will return to.
    interrupted_state: Option<ProtocolState>,
    /// Alert entries taken this turn; bounded to one.
    alert_entries_this_turn: u8,
    retry_counters: HashMap<ProtocolState, u8>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ConversationSession {
    /// Creates a fresh session in the Listening state.
    pub fn new(user_id: UserId) -> Self {
        let now = Timestamp::now();
        Self {
            session_id: SessionId::new(),
            user_id,
            current_state: ProtocolState::Listening,
            interrupted_state: None,
            alert_entries_this_turn: 0,
            retry_counters: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn current_state(&self) -> ProtocolState {
        self.current_state
    }

    pub fn interrupted_state(&self) -> Option<ProtocolState> {
        self.interrupted_state
    }

    /// Starts a new turn: the alert re-entry bound resets here.
    pub fn begin_turn(&mut self) {
        self.alert_entries_this_turn = 0;
    }

    pub fn alert_entries_this_turn(&self) -> u8 {
        self.alert_entries_this_turn
    }

    /// Retries consumed so far for a state's backward edge.
    pub fn retries_for(&self, state: ProtocolState) -> u8 {
        self.retry_counters.get(&state).copied().unwrap_or(0)
    }

    /// True when the session has been idle past the timeout.
    pub fn is_expired(&self, config: &SessionConfig, now: Timestamp) -> bool {
        now.duration_since(&self.updated_at) > chrono::Duration::minutes(config.timeout_minutes)
    }

    /// Resets to a fresh Listening state, keeping identity and creation time.
    pub fn reset(&mut self) {
        self.current_state = ProtocolState::Listening;
        self.interrupted_state = None;
        self.alert_entries_this_turn = 0;
        self.retry_counters.clear();
        self.updated_at = Timestamp::now();
    }

    // Mutators below are crate-internal so only the protocol engine can
    // move a session; hosts go through `ProtocolEngine`.

    pub(super) fn set_state(&mut self, state: ProtocolState) {
        self.current_state = state;
        self.updated_at = Timestamp::now();
    }

    pub(super) fn set_interrupted(&mut self, state: Option<ProtocolState>) {
        self.interrupted_state = state;
    }

    pub(super) fn record_alert_entry(&mut self) {
        self.alert_entries_this_turn += 1;
    }

    pub(super) fn record_retry(&mut self, state: ProtocolState) {
        *self.retry_counters.entry(state).or_insert(0) += 1;
    }

    pub(super) fn clear_retries(&mut self) {
        self.retry_counters.clear();
    }
}
