//! EventStore port - durable append-only log of accepted events.

use async_trait::async_trait;

use crate::domain::events::BehavioralEvent;
use crate::domain::foundation::{DomainError, Timestamp, UserId};

/// Port for persisting accepted behavioral events.
///
/// Implementations must ensure:
/// - `append` is durable before it returns
/// - reads return events ordered by `occurred_at`, oldest first
/// - `remove_user` deletes every event for the user, returning the count
///
/// The ingestor replays this log on startup to rebuild aggregation state,
/// so ordering guarantees matter more than read latency.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends one accepted event to the log.
    async fn append(&self, event: BehavioralEvent) -> Result<(), DomainError>;

    /// Reads every stored event occurring at or after `since`.
    async fn read_since(&self, since: Timestamp) -> Result<Vec<BehavioralEvent>, DomainError>;

    /// Reads the most recent `limit` events for one user, oldest first.
    async fn read_user_recent(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<BehavioralEvent>, DomainError>;

    /// Deletes all events belonging to `user_id`.
    async fn remove_user(&self, user_id: &UserId) -> Result<usize, DomainError>;
}
