//! In-memory event store for development and tests.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::events::BehavioralEvent;
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::EventStore;

/// Append-only event log held in memory.
///
/// Events are kept sorted by `occurred_at` on insert so reads need no
/// re-sorting. Suitable for tests and single-process hosts; production
/// deployments back the port with durable storage.
pub struct InMemoryEventStore {
    events: RwLock<Vec<BehavioralEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    /// Total number of stored events, for test assertions.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: BehavioralEvent) -> Result<(), DomainError> {
        let mut events = self.events.write().await;
        // Insert keeping occurred_at order; late arrivals land mid-log.
        let position = events
            .iter()
            .rposition(|e| e.occurred_at <= event.occurred_at)
            .map(|i| i + 1)
            .unwrap_or(0);
        events.insert(position, event);
        Ok(())
    }

    async fn read_since(&self, since: Timestamp) -> Result<Vec<BehavioralEvent>, DomainError> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|e| e.occurred_at >= since)
            .cloned()
            .collect())
    }

    async fn read_user_recent(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<BehavioralEvent>, DomainError> {
        let events = self.events.read().await;
        let mut recent: Vec<BehavioralEvent> = events
            .iter()
            .rev()
            .filter(|e| &e.user_id == user_id)
            .take(limit)
            .cloned()
            .collect();
        recent.reverse();
        Ok(recent)
    }

    async fn remove_user(&self, user_id: &UserId) -> Result<usize, DomainError> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|e| &e.user_id != user_id);
        Ok(before - events.len())
    }
}
