//! Per-user behavioral vector state.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::domain::events::{BehavioralEvent, EventKind};
use crate::domain::foundation::{Timestamp, UserId};

use super::lexicon::scan_for_negative_terms;
use super::window::SlidingWindow;

/// Window sizes and capacities for the behavioral vector engine.
///
/// All values are tunable configuration; the defaults match the calibrated
/// trigger thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Trailing window for the mood average, in days.
    pub mood_window_days: i64,
    /// Trailing window for the confidence average and trend, in days.
    pub confidence_window_days: i64,
    /// Trailing window for the activity count, in days.
    pub activity_window_days: i64,
    /// K used by the difference-of-means trend (newest K vs oldest K).
    pub trend_samples: usize,
    /// Maximum retained negative-lexicon hits (oldest dropped first).
    pub keyword_hit_capacity: usize,
    /// Burnout heuristic weights and thresholds.
    pub burnout: BurnoutWeights,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            mood_window_days: default_mood_window_days(),
            confidence_window_days: default_confidence_window_days(),
            activity_window_days: default_activity_window_days(),
            trend_samples: default_trend_samples(),
            keyword_hit_capacity: default_keyword_hit_capacity(),
            burnout: BurnoutWeights::default(),
        }
    }
}

fn default_mood_window_days() -> i64 {
    7
}

fn default_confidence_window_days() -> i64 {
    30
}

fn default_activity_window_days() -> i64 {
    7
}

fn default_trend_samples() -> usize {
    3
}

fn default_keyword_hit_capacity() -> usize {
    20
}

/// Weights and thresholds for the burnout risk heuristic.
///
/// Each condition that holds contributes its weight; the sum is clipped to
/// [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurnoutWeights {
    /// Mood averages below this floor count as low mood.
    pub mood_floor: f64,
    /// Contribution of a below-floor mood average.
    pub low_mood_weight: f64,
    /// Contribution of a negative confidence trend.
    pub declining_confidence_weight: f64,
    /// Contribution of a low in-window activity count.
    pub low_activity_weight: f64,
    /// Activity counts below this are considered low.
    pub min_window_actions: usize,
}

impl Default for BurnoutWeights {
    fn default() -> Self {
        Self {
            mood_floor: 4.0,
            low_mood_weight: 0.40,
            declining_confidence_weight: 0.35,
            low_activity_weight: 0.25,
            min_window_actions: 3,
        }
    }
}

/// A retained negative-lexicon hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordHit {
    pub term: String,
    pub at: Timestamp,
}

/// Aggregated behavioral summary for one user.
///
/// Mutated only by `update_from_event`; everything else reads. The struct is
/// cheap to clone, which is how cross-partition readers take copy-on-read
/// snapshots without blocking the writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralVectorState {
    pub user_id: UserId,
    mood: SlidingWindow,
    confidence: SlidingWindow,
    activity: SlidingWindow,
    action_counts: HashMap<String, u64>,
    keyword_hits: VecDeque<KeywordHit>,
    trend_samples: usize,
    keyword_hit_capacity: usize,
    pub last_updated: Timestamp,
}

impl BehavioralVectorState {
    /// Creates an empty state for a user.
    pub fn new(user_id: UserId, config: &AggregationConfig) -> Self {
        Self {
            user_id,
            mood: SlidingWindow::over_days(config.mood_window_days),
            confidence: SlidingWindow::over_days(config.confidence_window_days),
            activity: SlidingWindow::over_days(config.activity_window_days),
            action_counts: HashMap::new(),
            keyword_hits: VecDeque::new(),
            trend_samples: config.trend_samples,
            keyword_hit_capacity: config.keyword_hit_capacity,
            last_updated: Timestamp::now(),
        }
    }

    /// Applies one accepted event to the aggregates.
    ///
    /// Dispatches by event kind; unrecognized kinds are logged and ignored,
    /// never an error. Idempotency is the ingestor's job - this method
    /// assumes the event already passed deduplication.
    pub fn update_from_event(&mut self, event: &BehavioralEvent) {
        match event.kind() {
            EventKind::Mood(score) => {
                self.mood.push(event.occurred_at, score);
            }
            EventKind::Confidence(score) => {
                self.confidence.push(event.occurred_at, score);
            }
            EventKind::Action(action_type) => {
                self.activity.push(event.occurred_at, 1.0);
                *self.action_counts.entry(action_type).or_insert(0) += 1;
            }
            EventKind::Note(text) => {
                for term in scan_for_negative_terms(&text) {
                    if self.keyword_hits.len() == self.keyword_hit_capacity {
                        self.keyword_hits.pop_front();
                    }
                    self.keyword_hits.push_back(KeywordHit {
                        term: term.to_string(),
                        at: event.occurred_at,
                    });
                }
            }
            EventKind::Unrecognized => {
                tracing::debug!(
                    event_type = %event.event_type,
                    user_id = %event.user_id,
                    "ignoring unrecognized event type"
                );
                return;
            }
        }
        self.last_updated = Timestamp::now();
    }

    /// Trailing mood average.
    pub fn mood_average(&self) -> Option<f64> {
        self.mood.average()
    }

    /// Trailing confidence average.
    pub fn confidence_average(&self) -> Option<f64> {
        self.confidence.average()
    }

    /// Confidence trend: newest-K mean minus oldest-K mean, 0 under 2K samples.
    pub fn confidence_trend(&self) -> f64 {
        self.confidence.trend(self.trend_samples)
    }

    /// Number of actions inside the activity window.
    pub fn activity_count(&self) -> usize {
        self.activity.count()
    }

    /// All-time count per action type.
    pub fn action_count(&self, action_type: &str) -> u64 {
        self.action_counts.get(action_type).copied().unwrap_or(0)
    }

    /// Retained negative-lexicon hits, oldest first.
    pub fn keyword_hits(&self) -> impl Iterator<Item = &KeywordHit> {
        self.keyword_hits.iter()
    }

    /// Number of retained negative-lexicon hits.
    pub fn keyword_hit_count(&self) -> usize {
        self.keyword_hits.len()
    }

    /// Weighted burnout heuristic, clipped to [0, 1].
    pub fn burnout_risk(&self, weights: &BurnoutWeights) -> f64 {
        let mut risk = 0.0;

        if let Some(avg) = self.mood.average() {
            if avg < weights.mood_floor {
                risk += weights.low_mood_weight;
            }
        }
        if self.confidence_trend() < 0.0 {
            risk += weights.declining_confidence_weight;
        }
        if self.activity.count() < weights.min_window_actions {
            risk += weights.low_activity_weight;
        }

        risk.clamp(0.0, 1.0)
    }
}
