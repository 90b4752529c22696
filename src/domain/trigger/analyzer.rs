//! Weighted risk scoring over recent events and aggregates.

use serde::{Deserialize, Serialize};

use crate::domain::aggregation::BehavioralVectorState;
use crate::domain::events::{BehavioralEvent, EventKind, SCORE_MAX};
use crate::domain::foundation::Timestamp;

/// Weights, bonuses, and thresholds for trigger analysis.
///
/// The defaults are calibrated against the difference-of-means trend
/// heuristic; treat them as tunable configuration, not invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Weight of the mood component.
    pub mood_weight: f64,
    /// Weight of the confidence component.
    pub confidence_weight: f64,
    /// Weight of the negative-keyword component.
    pub keyword_weight: f64,
    /// Weight of the temporal-engagement component.
    pub temporal_weight: f64,

    /// Bonus added when mood or confidence is strictly decreasing.
    pub decline_bonus: f64,
    /// Bonus added above the secondary keyword frequency threshold.
    pub keyword_bonus: f64,
    /// Bonus added when action frequency is decreasing.
    pub temporal_bonus: f64,

    /// Total at or above this triggers heightened support.
    pub trigger_threshold: f64,
    /// Keyword hit frequency at or above this earns the keyword bonus.
    pub keyword_secondary_frequency: f64,

    /// Minimum events required before any inference is made.
    pub min_events: usize,
    /// How many recent events callers should supply.
    pub recent_events: usize,

    /// Per-component contributions above these thresholds produce a
    /// recommendation for that component.
    pub mood_alert_threshold: f64,
    pub confidence_alert_threshold: f64,
    pub keyword_alert_threshold: f64,
    pub temporal_alert_threshold: f64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            mood_weight: 0.35,
            confidence_weight: 0.35,
            keyword_weight: 0.20,
            temporal_weight: 0.10,
            decline_bonus: 0.10,
            keyword_bonus: 0.05,
            temporal_bonus: 0.05,
            trigger_threshold: 0.70,
            keyword_secondary_frequency: 0.50,
            min_events: 5,
            recent_events: 5,
            mood_alert_threshold: 0.25,
            confidence_alert_threshold: 0.25,
            keyword_alert_threshold: 0.10,
            temporal_alert_threshold: 0.08,
        }
    }
}

/// Per-component contributions, bonuses included.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubScores {
    pub mood: f64,
    pub confidence: f64,
    pub keyword: f64,
    pub temporal: f64,
}

/// Interventions suggested by which sub-scores crossed their thresholds.
///
/// Ordering is fixed priority: mood > confidence > keyword > temporal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    MoodCheckIn,
    ConfidenceRebuilding,
    LanguageConcernReview,
    ReEngagement,
}

impl Recommendation {
    /// Human-readable guidance for the host UI.
    pub fn message(&self) -> &'static str {
        match self {
            Self::MoodCheckIn => "Mood has been persistently low; offer a gentle check-in.",
            Self::ConfidenceRebuilding => {
                "Confidence signals are weakening; suggest a small, winnable task."
            }
            Self::LanguageConcernReview => {
                "Recent notes contain concerning language; review with extra care."
            }
            Self::ReEngagement => "Engagement is dropping off; invite the user back in lightly.",
        }
    }
}

/// Outcome of one trigger analysis. Ephemeral, recomputed per decision point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerAnalysis {
    pub should_trigger: bool,
    pub confidence_level: f64,
    pub sub_scores: SubScores,
    pub recommendations: Vec<Recommendation>,
    pub insufficient_data: bool,
}

impl TriggerAnalysis {
    /// The neutral result returned when too few events are available.
    ///
    /// Never infer from partial data: no trigger, zero confidence, and the
    /// insufficiency stated explicitly.
    pub fn insufficient() -> Self {
        Self {
            should_trigger: false,
            confidence_level: 0.0,
            sub_scores: SubScores::default(),
            recommendations: Vec::new(),
            insufficient_data: true,
        }
    }
}

/// Pure scorer; construct-free, all inputs passed explicitly.
pub struct TriggerAnalyzer;

impl TriggerAnalyzer {
    /// Scores the given recent events against the current vector state.
    ///
    /// Callers pass the most recent `config.recent_events` relevant events
    /// (or more); fewer than `config.min_events` yields the explicit
    /// insufficient-data result.
    pub fn analyze(
        events: &[BehavioralEvent],
        state: &BehavioralVectorState,
        config: &TriggerConfig,
    ) -> TriggerAnalysis {
        if events.len() < config.min_events {
            return TriggerAnalysis::insufficient();
        }

        let mut ordered: Vec<&BehavioralEvent> = events.iter().collect();
        ordered.sort_by_key(|e| e.occurred_at);

        let mood_series = series(&ordered, |k| match k {
            EventKind::Mood(score) => Some(score),
            _ => None,
        });
        let confidence_series = series(&ordered, |k| match k {
            EventKind::Confidence(score) => Some(score),
            _ => None,
        });
        let action_times: Vec<Timestamp> = ordered
            .iter()
            .filter(|e| matches!(e.kind(), EventKind::Action(_)))
            .map(|e| e.occurred_at)
            .collect();

        let mood = scored_decline_component(
            &mood_series,
            state.mood_average(),
            config.mood_weight,
            config.decline_bonus,
        );

        let confidence = scored_decline_component(
            &confidence_series,
            state.confidence_average(),
            config.confidence_weight,
            config.decline_bonus,
        );

        // Hit frequency of the aggregator's retained lexicon hits relative
        // to the size of the analyzed slice.
        let hit_frequency = state.keyword_hit_count() as f64 / events.len() as f64;
        let mut keyword = config.keyword_weight * hit_frequency.min(1.0);
        if hit_frequency >= config.keyword_secondary_frequency {
            keyword += config.keyword_bonus;
        }

        let engagement = action_times.len() as f64 / events.len() as f64;
        let mut temporal = config.temporal_weight * (1.0 - engagement).clamp(0.0, 1.0);
        if gaps_strictly_increasing(&action_times) {
            temporal += config.temporal_bonus;
        }

        let sub_scores = SubScores {
            mood,
            confidence,
            keyword,
            temporal,
        };
        let total = mood + confidence + keyword + temporal;
        let confidence_level = total.clamp(0.0, 1.0);

        let mut recommendations = Vec::new();
        if mood > config.mood_alert_threshold {
            recommendations.push(Recommendation::MoodCheckIn);
        }
        if confidence > config.confidence_alert_threshold {
            recommendations.push(Recommendation::ConfidenceRebuilding);
        }
        if keyword > config.keyword_alert_threshold {
            recommendations.push(Recommendation::LanguageConcernReview);
        }
        if temporal > config.temporal_alert_threshold {
            recommendations.push(Recommendation::ReEngagement);
        }

        TriggerAnalysis {
            should_trigger: total >= config.trigger_threshold,
            confidence_level,
            sub_scores,
            recommendations,
            insufficient_data: false,
        }
    }
}

/// Extracts a metric series from time-ordered events.
fn series(ordered: &[&BehavioralEvent], pick: impl Fn(EventKind) -> Option<f64>) -> Vec<f64> {
    ordered.iter().filter_map(|e| pick(e.kind())).collect()
}

/// Component score for a declining-is-risky metric.
///
/// The base severity is how far the series average sits below the top of
/// the scale; the bonus applies when the series is strictly decreasing.
/// Falls back to the window average when the slice carries no samples of
/// this metric.
fn scored_decline_component(
    series: &[f64],
    window_average: Option<f64>,
    weight: f64,
    decline_bonus: f64,
) -> f64 {
    let average = if series.is_empty() {
        window_average
    } else {
        Some(series.iter().sum::<f64>() / series.len() as f64)
    };

    let Some(average) = average else {
        return 0.0;
    };

    let severity = (1.0 - average / SCORE_MAX).clamp(0.0, 1.0);
    let mut score = weight * severity;
    if strictly_decreasing(series) {
        score += decline_bonus;
    }
    score
}

fn strictly_decreasing(series: &[f64]) -> bool {
    series.len() >= 2 && series.windows(2).all(|pair| pair[0] > pair[1])
}

/// True when at least three actions exist and every inter-action gap is
/// longer than the one before it (action frequency decreasing).
fn gaps_strictly_increasing(times: &[Timestamp]) -> bool {
    if times.len() < 3 {
        return false;
    }
    let gaps: Vec<chrono::Duration> = times
        .windows(2)
        .map(|pair| pair[1].duration_since(&pair[0]))
        .collect();
    gaps.windows(2).all(|pair| pair[1] > pair[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregation::AggregationConfig;
    use crate::domain::foundation::{EventId, UserId};
    use serde_json::json;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn ts(day: i64) -> Timestamp {
        "2024-03-01T00:00:00Z".parse::<Timestamp>().unwrap().plus_days(day)
    }

    fn event(event_type: &str, day: i64, payload: serde_json::Value) -> BehavioralEvent {
        BehavioralEvent::new(EventId::new(), user(), event_type, ts(day), payload).unwrap()
    }

    fn mood(day: i64, score: f64) -> BehavioralEvent {
        event("MoodLogged", day, json!({ "score": score }))
    }

    fn confidence(day: i64, score: f64) -> BehavioralEvent {
        event("ConfidenceScoreLogged", day, json!({ "score": score }))
    }

    fn note(day: i64, text: &str) -> BehavioralEvent {
        event("NoteAdded", day, json!({ "text": text }))
    }

    fn state_from(events: &[BehavioralEvent]) -> BehavioralVectorState {
        let mut state = BehavioralVectorState::new(user(), &AggregationConfig::default());
        for event in events {
            state.update_from_event(event);
        }
        state
    }

    #[test]
    fn too_few_events_is_explicit_insufficient_data() {
        let events = vec![mood(0, 3.0), mood(1, 2.0)];
        let state = state_from(&events);

        let analysis = TriggerAnalyzer::analyze(&events, &state, &TriggerConfig::default());

        assert!(!analysis.should_trigger);
        assert_eq!(analysis.confidence_level, 0.0);
        assert!(analysis.insufficient_data);
        assert!(analysis.recommendations.is_empty());
    }

    #[test]
    fn analysis_is_deterministic() {
        let events = vec![
            mood(0, 8.0),
            mood(2, 6.0),
            confidence(1, 7.0),
            confidence(3, 5.0),
            note(4, "feeling drained"),
        ];
        let state = state_from(&events);
        let config = TriggerConfig::default();

        let first = TriggerAnalyzer::analyze(&events, &state, &config);
        let second = TriggerAnalyzer::analyze(&events, &state, &config);

        assert_eq!(first, second);
    }

    #[test]
    fn declining_profile_triggers() {
        // Mood linearly declining 8 -> 1, confidence 7 -> 1, two lexicon
        // hits over ten events and ten days.
        let events = vec![
            mood(0, 8.0),
            confidence(1, 7.0),
            mood(2, 6.0),
            confidence(3, 5.0),
            mood(4, 3.0),
            confidence(5, 3.0),
            mood(6, 1.0),
            confidence(7, 1.0),
            note(8, "completely exhausted"),
            note(9, "everything feels hopeless"),
        ];
        let state = state_from(&events);

        let analysis = TriggerAnalyzer::analyze(&events, &state, &TriggerConfig::default());

        assert!(analysis.should_trigger);
        assert!(analysis.confidence_level >= 0.70);
        assert!(!analysis.insufficient_data);
    }

    #[test]
    fn mixed_profile_stays_below_threshold() {
        // Oscillating mood and confidence: no decline bonuses, mid scores.
        let events = vec![
            mood(0, 2.0),
            mood(1, 8.0),
            mood(2, 5.0),
            confidence(0, 8.0),
            confidence(1, 2.0),
            confidence(2, 5.0),
        ];
        let state = state_from(&events);

        let analysis = TriggerAnalyzer::analyze(&events, &state, &TriggerConfig::default());

        assert!(!analysis.should_trigger);
        assert!(analysis.confidence_level >= 0.30);
        assert!(analysis.confidence_level <= 0.70);
    }

    #[test]
    fn decline_bonus_requires_strict_decrease() {
        let flat = vec![
            mood(0, 4.0),
            mood(1, 4.0),
            mood(2, 4.0),
            mood(3, 4.0),
            mood(4, 4.0),
        ];
        let declining = vec![
            mood(0, 6.0),
            mood(1, 5.0),
            mood(2, 4.0),
            mood(3, 3.0),
            mood(4, 2.0),
        ];
        let config = TriggerConfig::default();

        let flat_analysis =
            TriggerAnalyzer::analyze(&flat, &state_from(&flat), &config);
        let declining_analysis =
            TriggerAnalyzer::analyze(&declining, &state_from(&declining), &config);

        // Same average (4.0): the difference is exactly the decline bonus.
        let diff = declining_analysis.sub_scores.mood - flat_analysis.sub_scores.mood;
        assert!((diff - config.decline_bonus).abs() < 1e-9);
    }

    #[test]
    fn keyword_bonus_applies_above_secondary_frequency() {
        let events = vec![
            note(0, "exhausted"),
            note(1, "hopeless"),
            note(2, "worthless"),
            mood(3, 5.0),
            mood(4, 5.0),
        ];
        let state = state_from(&events);
        let config = TriggerConfig::default();

        let analysis = TriggerAnalyzer::analyze(&events, &state, &config);

        // 3 hits over 5 events = 0.6 >= 0.5 secondary threshold.
        let expected = config.keyword_weight * 0.6 + config.keyword_bonus;
        assert!((analysis.sub_scores.keyword - expected).abs() < 1e-9);
        assert!(analysis
            .recommendations
            .contains(&Recommendation::LanguageConcernReview));
    }

    #[test]
    fn widening_action_gaps_earn_temporal_bonus() {
        let mut events = vec![
            event("ActionPerformed", 0, json!({ "action_type": "walk" })),
            event("ActionPerformed", 1, json!({ "action_type": "walk" })),
            event("ActionPerformed", 4, json!({ "action_type": "walk" })),
        ];
        events.push(mood(5, 5.0));
        events.push(mood(6, 5.0));
        let state = state_from(&events);
        let config = TriggerConfig::default();

        let analysis = TriggerAnalyzer::analyze(&events, &state, &config);

        // Gaps 1d then 3d: strictly increasing.
        let engagement = 3.0 / 5.0;
        let expected = config.temporal_weight * (1.0 - engagement) + config.temporal_bonus;
        assert!((analysis.sub_scores.temporal - expected).abs() < 1e-9);
    }

    #[test]
    fn recommendations_follow_fixed_priority_order() {
        let events = vec![
            mood(0, 2.0),
            mood(1, 1.0),
            confidence(2, 2.0),
            confidence(3, 1.0),
            note(4, "exhausted and hopeless and worthless"),
        ];
        let state = state_from(&events);

        let analysis = TriggerAnalyzer::analyze(&events, &state, &TriggerConfig::default());

        // Every component is elevated; order must be mood > confidence >
        // keyword > temporal.
        assert_eq!(
            analysis.recommendations,
            vec![
                Recommendation::MoodCheckIn,
                Recommendation::ConfidenceRebuilding,
                Recommendation::LanguageConcernReview,
                Recommendation::ReEngagement,
            ]
        );
    }

    #[test]
    fn arrival_order_does_not_change_the_analysis() {
        let forward = vec![
            mood(0, 8.0),
            mood(1, 6.0),
            mood(2, 4.0),
            confidence(3, 5.0),
            confidence(4, 3.0),
        ];
        let mut backward = forward.clone();
        backward.reverse();
        let state = state_from(&forward);
        let config = TriggerConfig::default();

        assert_eq!(
            TriggerAnalyzer::analyze(&forward, &state, &config),
            TriggerAnalyzer::analyze(&backward, &state, &config)
        );
    }

    #[test]
    fn analysis_serializes_to_json() {
        let analysis = TriggerAnalysis::insufficient();
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["should_trigger"], false);
        assert_eq!(json["insufficient_data"], true);
    }
}
