//! Recording sink for tests and development hosts.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::ResponseSink;

/// Captures every delivered response for later assertions.
pub struct RecordingSink {
    delivered: RwLock<Vec<(UserId, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            delivered: RwLock::new(Vec::new()),
        }
    }

    /// All deliveries so far, in order.
    pub async fn deliveries(&self) -> Vec<(UserId, String)> {
        self.delivered.read().await.clone()
    }

    /// Responses delivered to one user, in order.
    pub async fn responses_for(&self, user_id: &UserId) -> Vec<String> {
        self.delivered
            .read()
            .await
            .iter()
            .filter(|(u, _)| u == user_id)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub async fn delivery_count(&self) -> usize {
        self.delivered.read().await.len()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseSink for RecordingSink {
    async fn deliver(&self, user_id: &UserId, response: &str) -> Result<(), DomainError> {
        self.delivered
            .write()
            .await
            .push((user_id.clone(), response.to_string()));
        Ok(())
    }
}
