//! Protocol states and their transition table.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;
use crate::domain::guardian::SAFETY_DISCLAIMER;

/// The current state of a supportive conversation.
///
/// The happy path runs
/// `Listening → ValidateEmotion → IdentifyNegativeThought → ProposeReframe →
/// SuggestMicroAction → Reinforce`, with Reinforce looping back to Listening.
/// `Idle` is the terminal reset. `EthicalAlert` is a cross-cutting interrupt
/// reachable from any active state; it returns to the interrupted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolState {
    /// Waiting for the user's next turn. Initial state.
    Listening,

    /// Acknowledge and validate what the user is feeling.
    /// Every path out of Listening passes through here.
    ValidateEmotion,

    /// Help the user name the negative thought behind the feeling.
    IdentifyNegativeThought,

    /// Offer a kinder, more balanced framing of that thought.
    ProposeReframe,

    /// Suggest one small, concrete next action.
    SuggestMicroAction,

    /// Reinforce the effort and close the loop.
    Reinforce,

    /// Terminal reset; the session is over.
    Idle,

    /// Safety interrupt raised by the guardian; emits the mandatory
    /// disclaimer and returns to the interrupted state.
    EthicalAlert,
}

impl ProtocolState {
    /// The next state along the happy path, if one exists.
    pub fn forward_next(&self) -> Option<Self> {
        match self {
            Self::Listening => Some(Self::ValidateEmotion),
            Self::ValidateEmotion => Some(Self::IdentifyNegativeThought),
            Self::IdentifyNegativeThought => Some(Self::ProposeReframe),
            Self::ProposeReframe => Some(Self::SuggestMicroAction),
            Self::SuggestMicroAction => Some(Self::Reinforce),
            Self::Reinforce => Some(Self::Listening),
            Self::Idle | Self::EthicalAlert => None,
        }
    }

    /// True for states that deliver supportive content to the user.
    ///
    /// The structural safety invariant is that none of these is reachable
    /// from Listening without passing ValidateEmotion first.
    pub fn is_content_bearing(&self) -> bool {
        matches!(
            self,
            Self::IdentifyNegativeThought
                | Self::ProposeReframe
                | Self::SuggestMicroAction
                | Self::Reinforce
        )
    }

    /// Directive guiding the host's response generation in this state.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Listening => "Listen. Let the user set the topic and pace.",
            Self::ValidateEmotion => {
                "Acknowledge the feeling without judgment before anything else."
            }
            Self::IdentifyNegativeThought => {
                "Gently help the user put the underlying thought into words."
            }
            Self::ProposeReframe => "Offer one kinder, more balanced way to see it.",
            Self::SuggestMicroAction => "Suggest a single small step the user could take today.",
            Self::Reinforce => "Recognize the effort made and close warmly.",
            Self::Idle => "The session has ended; do not initiate.",
            Self::EthicalAlert => SAFETY_DISCLAIMER,
        }
    }
}

impl StateMachine for ProtocolState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ProtocolState::*;
        match self {
            Listening => vec![ValidateEmotion, Idle, EthicalAlert],
            ValidateEmotion => vec![IdentifyNegativeThought, Idle, EthicalAlert],
            IdentifyNegativeThought => vec![ProposeReframe, Idle, EthicalAlert],
            // Reinforce is reachable directly for forced progression after
            // the retry budget is exhausted.
            ProposeReframe => vec![
                SuggestMicroAction,
                IdentifyNegativeThought,
                Reinforce,
                Idle,
                EthicalAlert,
            ],
            SuggestMicroAction => vec![Reinforce, ProposeReframe, Idle, EthicalAlert],
            Reinforce => vec![Listening, Idle, EthicalAlert],
            Idle => vec![],
            // The alert returns to whichever state it interrupted.
            EthicalAlert => vec![
                Listening,
                ValidateEmotion,
                IdentifyNegativeThought,
                ProposeReframe,
                SuggestMicroAction,
                Reinforce,
                Idle,
            ],
        }
    }
}

impl Default for ProtocolState {
    fn default() -> Self {
        Self::Listening
    }
}
