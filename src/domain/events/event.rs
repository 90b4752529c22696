//! Behavioral event record and payload interpretation.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::domain::foundation::{EventId, Timestamp, UserId, ValidationError};

/// Lowest and highest accepted values for mood and confidence scores.
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 10.0;

/// An inbound per-user lifecycle event.
///
/// Immutable once constructed. The `event_type` is carried as a raw string
/// so unrecognized types flow through validation and are ignored downstream
/// rather than rejected; `kind()` interprets the payload for the types this
/// core understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralEvent {
    pub event_id: EventId,
    pub user_id: UserId,
    pub event_type: String,
    pub occurred_at: Timestamp,
    #[serde(default)]
    pub payload: JsonValue,
}

/// Interpreted payload of a behavioral event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Self-reported mood on the 0-10 scale.
    Mood(f64),
    /// Self-reported confidence on the 0-10 scale.
    Confidence(f64),
    /// A completed action, identified by its action type.
    Action(String),
    /// Free-text note, scanned for negative-lexicon hits.
    Note(String),
    /// Event type this core does not understand. Logged and ignored,
    /// never an error.
    Unrecognized,
}

impl BehavioralEvent {
    /// Constructs a validated event.
    pub fn new(
        event_id: EventId,
        user_id: UserId,
        event_type: impl Into<String>,
        occurred_at: Timestamp,
        payload: JsonValue,
    ) -> Result<Self, ValidationError> {
        let event = Self {
            event_id,
            user_id,
            event_type: event_type.into(),
            occurred_at,
            payload,
        };
        event.validate()?;
        Ok(event)
    }

    /// Validates the wire schema.
    ///
    /// Recognized event types must carry a well-formed payload; scores must
    /// sit inside the 0-10 range. Unrecognized types pass validation so they
    /// can be counted and dropped downstream instead of poisoning the stream.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.event_type.trim().is_empty() {
            return Err(ValidationError::empty_field("event_type"));
        }

        match self.event_type.as_str() {
            "MoodLogged" => validate_score(&self.payload, "score")?,
            "ConfidenceScoreLogged" => validate_score(&self.payload, "score")?,
            "ActionPerformed" => {
                if extract_str(&self.payload, "action_type").is_none() {
                    return Err(ValidationError::invalid_format(
                        "payload.action_type",
                        "ActionPerformed requires a string action_type",
                    ));
                }
            }
            "NoteAdded" => {
                if extract_str(&self.payload, "text").is_none() {
                    return Err(ValidationError::invalid_format(
                        "payload.text",
                        "NoteAdded requires a string text",
                    ));
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Interprets the payload according to the event type.
    ///
    /// Assumes `validate()` has passed; malformed payloads on recognized
    /// types degrade to `Unrecognized` rather than panicking.
    pub fn kind(&self) -> EventKind {
        match self.event_type.as_str() {
            "MoodLogged" => extract_f64(&self.payload, "score")
                .map(EventKind::Mood)
                .unwrap_or(EventKind::Unrecognized),
            "ConfidenceScoreLogged" => extract_f64(&self.payload, "score")
                .map(EventKind::Confidence)
                .unwrap_or(EventKind::Unrecognized),
            "ActionPerformed" => extract_str(&self.payload, "action_type")
                .map(|s| EventKind::Action(s.to_string()))
                .unwrap_or(EventKind::Unrecognized),
            "NoteAdded" => extract_str(&self.payload, "text")
                .map(|s| EventKind::Note(s.to_string()))
                .unwrap_or(EventKind::Unrecognized),
            _ => EventKind::Unrecognized,
        }
    }

    /// Computes the stable content hash used as the idempotency key.
    ///
    /// Hashes the normalized fields: user id, trimmed event type, RFC 3339
    /// timestamp, and the canonical JSON payload. The producer-assigned
    /// `event_id` is deliberately excluded so that a resend with a fresh id
    /// but identical content still deduplicates.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.user_id.as_str().as_bytes());
        hasher.update(b"\x1f");
        hasher.update(self.event_type.trim().as_bytes());
        hasher.update(b"\x1f");
        hasher.update(self.occurred_at.to_rfc3339().as_bytes());
        hasher.update(b"\x1f");
        // serde_json orders map keys, so this serialization is canonical.
        hasher.update(self.payload.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn extract_f64(payload: &JsonValue, field: &str) -> Option<f64> {
    payload.get(field).and_then(JsonValue::as_f64)
}

fn extract_str<'a>(payload: &'a JsonValue, field: &str) -> Option<&'a str> {
    payload.get(field).and_then(JsonValue::as_str)
}

fn validate_score(payload: &JsonValue, field: &str) -> Result<(), ValidationError> {
    let score = extract_f64(payload, field).ok_or_else(|| {
        ValidationError::invalid_format(
            format!("payload.{}", field),
            "expected a numeric score",
        )
    })?;
    if !(SCORE_MIN..=SCORE_MAX).contains(&score) || !score.is_finite() {
        return Err(ValidationError::out_of_range(
            format!("payload.{}", field),
            SCORE_MIN,
            SCORE_MAX,
            score,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn mood_event(score: f64) -> BehavioralEvent {
        BehavioralEvent::new(
            EventId::new(),
            user(),
            "MoodLogged",
            Timestamp::now(),
            json!({ "score": score }),
        )
        .unwrap()
    }

    mod validation {
        use super::*;

        #[test]
        fn accepts_well_formed_mood_event() {
            assert!(BehavioralEvent::new(
                EventId::new(),
                user(),
                "MoodLogged",
                Timestamp::now(),
                json!({ "score": 7.0 }),
            )
            .is_ok());
        }

        #[test]
        fn rejects_out_of_range_score() {
            let result = BehavioralEvent::new(
                EventId::new(),
                user(),
                "MoodLogged",
                Timestamp::now(),
                json!({ "score": 42.0 }),
            );
            assert!(matches!(result, Err(ValidationError::OutOfRange { .. })));
        }

        #[test]
        fn rejects_missing_score() {
            let result = BehavioralEvent::new(
                EventId::new(),
                user(),
                "ConfidenceScoreLogged",
                Timestamp::now(),
                json!({}),
            );
            assert!(matches!(result, Err(ValidationError::InvalidFormat { .. })));
        }

        #[test]
        fn rejects_empty_event_type() {
            let result = BehavioralEvent::new(
                EventId::new(),
                user(),
                "  ",
                Timestamp::now(),
                json!({}),
            );
            assert!(result.is_err());
        }

        #[test]
        fn rejects_action_without_action_type() {
            let result = BehavioralEvent::new(
                EventId::new(),
                user(),
                "ActionPerformed",
                Timestamp::now(),
                json!({ "action_type": 3 }),
            );
            assert!(result.is_err());
        }

        #[test]
        fn accepts_unrecognized_event_type() {
            let result = BehavioralEvent::new(
                EventId::new(),
                user(),
                "SomethingNew",
                Timestamp::now(),
                json!({ "anything": true }),
            );
            assert!(result.is_ok());
        }
    }

    mod kind {
        use super::*;

        #[test]
        fn interprets_mood() {
            assert_eq!(mood_event(6.5).kind(), EventKind::Mood(6.5));
        }

        #[test]
        fn interprets_action() {
            let event = BehavioralEvent::new(
                EventId::new(),
                user(),
                "ActionPerformed",
                Timestamp::now(),
                json!({ "action_type": "journal" }),
            )
            .unwrap();
            assert_eq!(event.kind(), EventKind::Action("journal".to_string()));
        }

        #[test]
        fn interprets_note() {
            let event = BehavioralEvent::new(
                EventId::new(),
                user(),
                "NoteAdded",
                Timestamp::now(),
                json!({ "text": "feeling drained" }),
            )
            .unwrap();
            assert_eq!(event.kind(), EventKind::Note("feeling drained".to_string()));
        }

        #[test]
        fn unknown_type_is_unrecognized() {
            let event = BehavioralEvent::new(
                EventId::new(),
                user(),
                "Telemetry",
                Timestamp::now(),
                json!({}),
            )
            .unwrap();
            assert_eq!(event.kind(), EventKind::Unrecognized);
        }
    }

    mod content_hash {
        use super::*;

        #[test]
        fn identical_content_hashes_equal() {
            let ts = Timestamp::now();
            let a = BehavioralEvent::new(
                EventId::new(),
                user(),
                "MoodLogged",
                ts,
                json!({ "score": 5.0 }),
            )
            .unwrap();
            let b = BehavioralEvent::new(
                EventId::new(),
                user(),
                "MoodLogged",
                ts,
                json!({ "score": 5.0 }),
            )
            .unwrap();

            // Different event ids, same content.
            assert_ne!(a.event_id, b.event_id);
            assert_eq!(a.content_hash(), b.content_hash());
        }

        #[test]
        fn different_payload_hashes_differ() {
            let ts = Timestamp::now();
            let a = BehavioralEvent::new(
                EventId::new(),
                user(),
                "MoodLogged",
                ts,
                json!({ "score": 5.0 }),
            )
            .unwrap();
            let b = BehavioralEvent::new(
                EventId::new(),
                user(),
                "MoodLogged",
                ts,
                json!({ "score": 6.0 }),
            )
            .unwrap();
            assert_ne!(a.content_hash(), b.content_hash());
        }

        #[test]
        fn different_user_hashes_differ() {
            let ts = Timestamp::now();
            let a = BehavioralEvent::new(
                EventId::new(),
                UserId::new("alpha").unwrap(),
                "MoodLogged",
                ts,
                json!({ "score": 5.0 }),
            )
            .unwrap();
            let b = BehavioralEvent::new(
                EventId::new(),
                UserId::new("beta").unwrap(),
                "MoodLogged",
                ts,
                json!({ "score": 5.0 }),
            )
            .unwrap();
            assert_ne!(a.content_hash(), b.content_hash());
        }

        #[test]
        fn hash_is_hex_sha256() {
            let event = mood_event(5.0);
            let hash = event.content_hash();
            assert_eq!(hash.len(), 64);
            assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn serializes_round_trip() {
        let event = mood_event(4.0);
        let json = serde_json::to_string(&event).unwrap();
        let back: BehavioralEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
