//! Event ingestion: validation, dedup, aggregation, persistence.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::domain::aggregation::{AggregationConfig, BehavioralVectorState};
use crate::domain::events::BehavioralEvent;
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::EventStore;

/// Ingestion limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum content hashes retained for duplicate detection.
    pub dedup_capacity: usize,
    /// Hours a content hash stays in the dedup cache.
    pub dedup_retention_hours: i64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            dedup_capacity: 10_000,
            dedup_retention_hours: 24,
        }
    }
}

/// What happened to one submitted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
    /// Event accepted, aggregated, and persisted.
    Accepted,
    /// Same content already seen within the retention horizon; dropped.
    Duplicate,
    /// Event failed schema validation; dropped with the reason.
    Rejected { reason: String },
}

/// Bounded content-hash cache for duplicate suppression.
///
/// Keyed by the event's content hash; evicts oldest-first at capacity and
/// drops entries past the retention horizon. Hash ownership is tracked so
/// a user's entries can be purged on "forget me".
struct DedupCache {
    entries: HashMap<String, (UserId, Timestamp)>,
    insertion_order: VecDeque<String>,
    capacity: usize,
    retention_hours: i64,
}

impl DedupCache {
    fn new(config: &IngestConfig) -> Self {
        Self {
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
            capacity: config.dedup_capacity.max(1),
            retention_hours: config.dedup_retention_hours,
        }
    }

    fn contains(&mut self, hash: &str, now: Timestamp) -> bool {
        self.evict_expired(now);
        self.entries.contains_key(hash)
    }

    fn insert(&mut self, hash: String, user_id: UserId, now: Timestamp) {
        if self.entries.contains_key(&hash) {
            return;
        }
        while self.entries.len() >= self.capacity {
            if let Some(oldest) = self.insertion_order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
        self.insertion_order.push_back(hash.clone());
        self.entries.insert(hash, (user_id, now));
    }

    fn evict_expired(&mut self, now: Timestamp) {
        let horizon = chrono::Duration::hours(self.retention_hours);
        while let Some(front) = self.insertion_order.front() {
            match self.entries.get(front) {
                Some((_, inserted)) if now.duration_since(inserted) > horizon => {
                    let hash = self.insertion_order.pop_front();
                    if let Some(hash) = hash {
                        self.entries.remove(&hash);
                    }
                }
                _ => break,
            }
        }
    }

    fn forget_user(&mut self, user_id: &UserId) {
        self.entries.retain(|_, (owner, _)| owner != user_id);
        let entries = &self.entries;
        self.insertion_order.retain(|hash| entries.contains_key(hash));
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Validates, deduplicates, aggregates, and persists behavioral events.
///
/// Owns the per-user aggregation state. Not internally synchronized: each
/// partition worker owns one ingestor, so all access is single-threaded
/// by construction.
pub struct EventIngestor {
    store: Arc<dyn EventStore>,
    states: HashMap<UserId, BehavioralVectorState>,
    dedup: DedupCache,
    aggregation: AggregationConfig,
}

impl EventIngestor {
    pub fn new(
        store: Arc<dyn EventStore>,
        aggregation: AggregationConfig,
        ingest: &IngestConfig,
    ) -> Self {
        Self {
            store,
            states: HashMap::new(),
            dedup: DedupCache::new(ingest),
            aggregation,
        }
    }

    /// Processes one submitted event end to end.
    ///
    /// Invalid events are dropped with a logged reason, duplicates are
    /// dropped silently; neither is an error. Only storage failure
    /// propagates, and aggregation state is not updated in that case.
    pub async fn ingest(&mut self, event: BehavioralEvent) -> Result<IngestOutcome, DomainError> {
        if let Err(err) = event.validate() {
            tracing::warn!(
                user_id = %event.user_id,
                event_type = %event.event_type,
                error = %err,
                "rejecting invalid event"
            );
            return Ok(IngestOutcome::Rejected {
                reason: err.to_string(),
            });
        }

        let hash = event.content_hash();
        let now = Timestamp::now();
        if self.dedup.contains(&hash, now) {
            tracing::debug!(user_id = %event.user_id, "dropping duplicate event");
            return Ok(IngestOutcome::Duplicate);
        }

        // Persist first; a failed append leaves no dedup or state trace,
        // so the caller can retry the same event.
        self.store.append(event.clone()).await?;
        self.dedup.insert(hash, event.user_id.clone(), now);
        self.state_mut(&event.user_id).update_from_event(&event);
        Ok(IngestOutcome::Accepted)
    }

    /// Rebuilds aggregation state from the event log.
    ///
    /// Replays the full log in order, keeping only events whose user the
    /// `owns` predicate claims; lifetime aggregates such as action counts
    /// survive a restart, and the windows self-trim on replay. Dedup
    /// entries within the retention horizon are restored so a restart does
    /// not reopen the duplicate window. Returns the number of events
    /// replayed into this ingestor.
    pub async fn rebuild_from_store(
        &mut self,
        owns: impl Fn(&UserId) -> bool,
    ) -> Result<usize, DomainError> {
        let since = Timestamp::from_datetime(chrono::DateTime::<chrono::Utc>::MIN_UTC);
        let events = self.store.read_since(since).await?;

        self.states.clear();
        let now = Timestamp::now();
        let retention = chrono::Duration::hours(self.dedup.retention_hours);
        let mut replayed = 0;
        for event in events {
            if !owns(&event.user_id) {
                continue;
            }
            self.state_mut(&event.user_id).update_from_event(&event);
            if now.duration_since(&event.occurred_at) <= retention {
                self.dedup
                    .insert(event.content_hash(), event.user_id.clone(), now);
            }
            replayed += 1;
        }

        tracing::debug!(replayed, users = self.states.len(), "rebuilt state from event log");
        Ok(replayed)
    }

    /// Removes every trace of the user: state, dedup entries, stored events.
    pub async fn forget_user(&mut self, user_id: &UserId) -> Result<usize, DomainError> {
        self.states.remove(user_id);
        self.dedup.forget_user(user_id);
        let removed = self.store.remove_user(user_id).await?;
        tracing::debug!(user_id = %user_id, removed, "forgot user");
        Ok(removed)
    }

    /// The user's aggregation state, if any events have been accepted.
    pub fn state(&self, user_id: &UserId) -> Option<&BehavioralVectorState> {
        self.states.get(user_id)
    }

    pub fn tracked_users(&self) -> usize {
        self.states.len()
    }

    #[cfg(test)]
    pub(crate) fn dedup_len(&self) -> usize {
        self.dedup.len()
    }

    fn state_mut(&mut self, user_id: &UserId) -> &mut BehavioralVectorState {
        self.states
            .entry(user_id.clone())
            .or_insert_with(|| BehavioralVectorState::new(user_id.clone(), &self.aggregation))
    }
}
