//! Output dispatch: the single gate between candidates and delivery.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::guardian::{EthicalGuardian, FilterDecision};
use crate::ports::ResponseSink;

/// Routes every candidate response through the guardian filter and then
/// to the sink.
///
/// The dispatcher holds the only reference to the sink, so filtered
/// delivery is the only delivery. A filter pass that exceeds the
/// guardian's time budget fails closed to the generic fallback.
pub struct OutputDispatcher {
    guardian: EthicalGuardian,
    sink: Arc<dyn ResponseSink>,
}

impl OutputDispatcher {
    pub fn new(guardian: EthicalGuardian, sink: Arc<dyn ResponseSink>) -> Self {
        Self { guardian, sink }
    }

    /// Filters and delivers one candidate response.
    ///
    /// Returns the decision that was delivered. Only sink failure
    /// propagates; filter failure and timeout both degrade to the
    /// fail-closed fallback, which is still delivered.
    pub async fn dispatch(
        &self,
        user_id: &UserId,
        candidate: &str,
        burnout_risk: f64,
    ) -> Result<FilterDecision, DomainError> {
        let budget = self.guardian.time_budget();
        let decision =
            match tokio::time::timeout(budget, self.guardian.filter(candidate, burnout_risk))
                .await
            {
                Ok(decision) => decision,
                Err(_) => {
                    tracing::warn!(
                        user_id = %user_id,
                        budget_ms = budget.as_millis() as u64,
                        "guardian filter exceeded its time budget, failing closed"
                    );
                    FilterDecision::fail_closed()
                }
            };

        if !decision.is_compliant {
            tracing::warn!(
                user_id = %user_id,
                violations = ?decision.violations,
                "candidate response required rewriting"
            );
        } else {
            tracing::debug!(user_id = %user_id, "candidate response passed the filter");
        }

        self.sink.deliver(user_id, &decision.final_response).await?;
        Ok(decision)
    }
}
