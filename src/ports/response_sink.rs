//! ResponseSink port - the host's channel for delivering filtered responses.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

/// Port for delivering a filtered response to the user.
///
/// The output dispatcher owns the only reference to the sink, so every
/// message passing through an implementation has already cleared the
/// guardian filter. Implementations surface delivery failure through the
/// error channel and must not retry internally.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Delivers one response to the user.
    async fn deliver(&self, user_id: &UserId, response: &str) -> Result<(), DomainError>;
}
