//! Partitioned workers - per-user serialization without per-user locks.
//!
//! Users are sharded by hash onto a fixed set of workers, each owning its
//! slice of aggregation state and sessions outright. All work for one user
//! lands on one worker, so per-user operations are serialized by
//! construction; "forget me" in particular clears state, session, dedup
//! entries, and stored events with nothing else interleaving.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::domain::aggregation::AggregationConfig;
use crate::domain::events::BehavioralEvent;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::protocol::{
    ConversationSession, ProtocolEngine, SessionConfig, TurnOutcome, TurnSignal,
};
use crate::domain::trigger::{TriggerAnalysis, TriggerAnalyzer, TriggerConfig};
use crate::ports::EventStore;

use super::ingestor::{EventIngestor, IngestConfig, IngestOutcome};

/// Sharding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Number of worker tasks; users are hashed across them.
    pub partitions: usize,
    /// Bounded depth of each worker's command queue.
    pub queue_depth: usize,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            partitions: 4,
            queue_depth: 256,
        }
    }
}

enum PartitionCommand {
    Ingest {
        event: BehavioralEvent,
        reply: oneshot::Sender<Result<IngestOutcome, DomainError>>,
    },
    Analyze {
        user_id: UserId,
        reply: oneshot::Sender<Result<TriggerAnalysis, DomainError>>,
    },
    BurnoutRisk {
        user_id: UserId,
        reply: oneshot::Sender<f64>,
    },
    Turn {
        user_id: UserId,
        signal: TurnSignal,
        reply: oneshot::Sender<Result<TurnOutcome, DomainError>>,
    },
    RaiseAlert {
        user_id: UserId,
        reply: oneshot::Sender<Result<TurnOutcome, DomainError>>,
    },
    ResumeAlert {
        user_id: UserId,
        reply: oneshot::Sender<Result<TurnOutcome, DomainError>>,
    },
    Forget {
        user_id: UserId,
        reply: oneshot::Sender<Result<usize, DomainError>>,
    },
    Rebuild {
        reply: oneshot::Sender<Result<usize, DomainError>>,
    },
}

/// Stable shard assignment for a user.
fn shard_for(user_id: &UserId, shards: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    user_id.hash(&mut hasher);
    (hasher.finish() as usize) % shards
}

/// One worker's owned state.
struct PartitionWorker {
    shard: usize,
    shard_count: usize,
    ingestor: EventIngestor,
    sessions: HashMap<UserId, ConversationSession>,
    engine: ProtocolEngine,
    store: Arc<dyn EventStore>,
    aggregation: AggregationConfig,
    trigger: TriggerConfig,
    session_config: SessionConfig,
}

impl PartitionWorker {
    async fn run(mut self, mut rx: mpsc::Receiver<PartitionCommand>) {
        while let Some(command) = rx.recv().await {
            match command {
                PartitionCommand::Ingest { event, reply } => {
                    let _ = reply.send(self.ingestor.ingest(event).await);
                }
                PartitionCommand::Analyze { user_id, reply } => {
                    let _ = reply.send(self.analyze(&user_id).await);
                }
                PartitionCommand::BurnoutRisk { user_id, reply } => {
                    let risk = self
                        .ingestor
                        .state(&user_id)
                        .map(|state| state.burnout_risk(&self.aggregation.burnout))
                        .unwrap_or(0.0);
                    let _ = reply.send(risk);
                }
                PartitionCommand::Turn {
                    user_id,
                    signal,
                    reply,
                } => {
                    let session = Self::session_entry(
                        &mut self.sessions,
                        &self.session_config,
                        &user_id,
                    );
                    let _ = reply.send(self.engine.advance(session, signal));
                }
                PartitionCommand::RaiseAlert { user_id, reply } => {
                    let session = Self::session_entry(
                        &mut self.sessions,
                        &self.session_config,
                        &user_id,
                    );
                    let _ = reply.send(self.engine.enter_ethical_alert(session));
                }
                PartitionCommand::ResumeAlert { user_id, reply } => {
                    let outcome = match self.sessions.get_mut(&user_id) {
                        Some(session) => self.engine.resume_from_alert(session),
                        None => Err(DomainError::new(
                            ErrorCode::SessionNotFound,
                            format!("no session for user {}", user_id),
                        )),
                    };
                    let _ = reply.send(outcome);
                }
                PartitionCommand::Forget { user_id, reply } => {
                    self.sessions.remove(&user_id);
                    let _ = reply.send(self.ingestor.forget_user(&user_id).await);
                }
                PartitionCommand::Rebuild { reply } => {
                    // Replay only this worker's shard so no user's state
                    // ever materializes outside its owning partition.
                    let (shard, shard_count) = (self.shard, self.shard_count);
                    let _ = reply.send(
                        self.ingestor
                            .rebuild_from_store(|user| shard_for(user, shard_count) == shard)
                            .await,
                    );
                }
            }
        }
    }

    async fn analyze(&mut self, user_id: &UserId) -> Result<TriggerAnalysis, DomainError> {
        let state = match self.ingestor.state(user_id) {
            Some(state) => state,
            None => return Ok(TriggerAnalysis::insufficient()),
        };
        let events = self
            .store
            .read_user_recent(user_id, self.trigger.recent_events)
            .await?;
        Ok(TriggerAnalyzer::analyze(&events, state, &self.trigger))
    }

    /// The user's session, recreated fresh when missing or expired.
    fn session_entry<'a>(
        sessions: &'a mut HashMap<UserId, ConversationSession>,
        config: &SessionConfig,
        user_id: &UserId,
    ) -> &'a mut ConversationSession {
        let now = Timestamp::now();
        let expired = sessions
            .get(user_id)
            .map(|s| s.is_expired(config, now))
            .unwrap_or(false);
        if expired {
            tracing::debug!(user_id = %user_id, "session expired, starting fresh");
            sessions.remove(user_id);
        }
        sessions
            .entry(user_id.clone())
            .or_insert_with(|| ConversationSession::new(user_id.clone()))
    }
}

/// Routes per-user commands to sharded workers.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct PartitionRouter {
    senders: Vec<mpsc::Sender<PartitionCommand>>,
    handles: Vec<JoinHandle<()>>,
}

impl PartitionRouter {
    /// Spawns the worker tasks and returns the router.
    pub fn new(
        store: Arc<dyn EventStore>,
        partitions: &PartitionConfig,
        aggregation: AggregationConfig,
        trigger: TriggerConfig,
        ingest: IngestConfig,
        session: SessionConfig,
    ) -> Self {
        let count = partitions.partitions.max(1);
        let mut senders = Vec::with_capacity(count);
        let mut handles = Vec::with_capacity(count);

        for shard in 0..count {
            let (tx, rx) = mpsc::channel(partitions.queue_depth.max(1));
            let worker = PartitionWorker {
                shard,
                shard_count: count,
                ingestor: EventIngestor::new(store.clone(), aggregation.clone(), &ingest),
                sessions: HashMap::new(),
                engine: ProtocolEngine::new(session.clone()),
                store: store.clone(),
                aggregation: aggregation.clone(),
                trigger: trigger.clone(),
                session_config: session.clone(),
            };
            handles.push(tokio::spawn(worker.run(rx)));
            senders.push(tx);
        }

        Self { senders, handles }
    }

    /// Submits one event to its owning partition.
    pub async fn ingest(&self, event: BehavioralEvent) -> Result<IngestOutcome, DomainError> {
        let partition = self.partition_for(&event.user_id);
        let (reply, rx) = oneshot::channel();
        self.send(partition, PartitionCommand::Ingest { event, reply })
            .await?;
        Self::receive(rx).await?
    }

    /// Runs trigger analysis for the user on their partition.
    pub async fn analyze_user(&self, user_id: UserId) -> Result<TriggerAnalysis, DomainError> {
        let partition = self.partition_for(&user_id);
        let (reply, rx) = oneshot::channel();
        self.send(partition, PartitionCommand::Analyze { user_id, reply })
            .await?;
        Self::receive(rx).await?
    }

    /// The user's current burnout risk; zero when no state exists.
    pub async fn burnout_risk(&self, user_id: UserId) -> Result<f64, DomainError> {
        let partition = self.partition_for(&user_id);
        let (reply, rx) = oneshot::channel();
        self.send(partition, PartitionCommand::BurnoutRisk { user_id, reply })
            .await?;
        Self::receive(rx).await
    }

    /// Applies one conversation turn for the user.
    pub async fn apply_turn(
        &self,
        user_id: UserId,
        signal: TurnSignal,
    ) -> Result<TurnOutcome, DomainError> {
        let partition = self.partition_for(&user_id);
        let (reply, rx) = oneshot::channel();
        self.send(
            partition,
            PartitionCommand::Turn {
                user_id,
                signal,
                reply,
            },
        )
        .await?;
        Self::receive(rx).await?
    }

    /// Interrupts the user's session with the safety alert.
    pub async fn raise_alert(&self, user_id: UserId) -> Result<TurnOutcome, DomainError> {
        let partition = self.partition_for(&user_id);
        let (reply, rx) = oneshot::channel();
        self.send(partition, PartitionCommand::RaiseAlert { user_id, reply })
            .await?;
        Self::receive(rx).await?
    }

    /// Returns the user's session from the safety alert.
    pub async fn resume_alert(&self, user_id: UserId) -> Result<TurnOutcome, DomainError> {
        let partition = self.partition_for(&user_id);
        let (reply, rx) = oneshot::channel();
        self.send(partition, PartitionCommand::ResumeAlert { user_id, reply })
            .await?;
        Self::receive(rx).await?
    }

    /// Removes every trace of the user. Serialized on their partition, so
    /// no concurrent ingest or turn can interleave with the wipe.
    pub async fn forget_user(&self, user_id: UserId) -> Result<usize, DomainError> {
        let partition = self.partition_for(&user_id);
        let (reply, rx) = oneshot::channel();
        self.send(partition, PartitionCommand::Forget { user_id, reply })
            .await?;
        Self::receive(rx).await?
    }

    /// Rebuilds every partition's state from the event log.
    pub async fn rebuild_from_store(&self) -> Result<usize, DomainError> {
        let mut total = 0;
        for partition in 0..self.senders.len() {
            let (reply, rx) = oneshot::channel();
            self.send(partition, PartitionCommand::Rebuild { reply })
                .await?;
            total += Self::receive(rx).await??;
        }
        Ok(total)
    }

    /// Drains the workers and waits for them to finish.
    pub async fn shutdown(self) {
        drop(self.senders);
        for handle in self.handles {
            let _ = handle.await;
        }
    }

    fn partition_for(&self, user_id: &UserId) -> usize {
        shard_for(user_id, self.senders.len())
    }

    async fn send(&self, partition: usize, command: PartitionCommand) -> Result<(), DomainError> {
        self.senders[partition]
            .send(command)
            .await
            .map_err(|_| DomainError::new(ErrorCode::InternalError, "partition worker stopped"))
    }

    async fn receive<T>(rx: oneshot::Receiver<T>) -> Result<T, DomainError> {
        rx.await
            .map_err(|_| DomainError::new(ErrorCode::InternalError, "partition worker dropped reply"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryEventStore;
    use crate::domain::foundation::EventId;
    use crate::domain::protocol::ProtocolState;
    use serde_json::json;

    fn router(store: Arc<InMemoryEventStore>) -> PartitionRouter {
        PartitionRouter::new(
            store,
            &PartitionConfig::default(),
            AggregationConfig::default(),
            TriggerConfig::default(),
            IngestConfig::default(),
            SessionConfig::default(),
        )
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn mood_event(user_id: &UserId, offset_secs: i64, score: f64) -> BehavioralEvent {
        BehavioralEvent {
            event_id: EventId::new(),
            user_id: user_id.clone(),
            event_type: "MoodLogged".to_string(),
            occurred_at: Timestamp::now().minus_secs(3600).plus_secs(offset_secs),
            payload: json!({ "score": score }),
        }
    }

    #[tokio::test]
    async fn ingest_routes_to_a_worker_and_persists() {
        let store = Arc::new(InMemoryEventStore::new());
        let router = router(store.clone());

        let outcome = router.ingest(mood_event(&user("u1"), 0, 6.0)).await.unwrap();

        assert_eq!(outcome, IngestOutcome::Accepted);
        assert_eq!(store.len().await, 1);
        router.shutdown().await;
    }

    #[tokio::test]
    async fn analysis_without_state_is_insufficient() {
        let store = Arc::new(InMemoryEventStore::new());
        let router = router(store);

        let analysis = router.analyze_user(user("nobody")).await.unwrap();

        assert!(analysis.insufficient_data);
        assert!(!analysis.should_trigger);
        router.shutdown().await;
    }

    #[tokio::test]
    async fn turns_are_serialized_per_user() {
        let store = Arc::new(InMemoryEventStore::new());
        let router = router(store);
        let alice = user("alice");

        let first = router
            .apply_turn(alice.clone(), TurnSignal::Advance)
            .await
            .unwrap();
        let second = router
            .apply_turn(alice.clone(), TurnSignal::Advance)
            .await
            .unwrap();

        assert_eq!(first.state, ProtocolState::ValidateEmotion);
        assert_eq!(second.state, ProtocolState::IdentifyNegativeThought);
        router.shutdown().await;
    }

    #[tokio::test]
    async fn alert_round_trip_through_the_router() {
        let store = Arc::new(InMemoryEventStore::new());
        let router = router(store);
        let alice = user("alice");

        router
            .apply_turn(alice.clone(), TurnSignal::Advance)
            .await
            .unwrap();
        let alert = router.raise_alert(alice.clone()).await.unwrap();
        assert_eq!(alert.state, ProtocolState::EthicalAlert);

        let resumed = router.resume_alert(alice.clone()).await.unwrap();
        assert_eq!(resumed.state, ProtocolState::ValidateEmotion);
        router.shutdown().await;
    }

    #[tokio::test]
    async fn resume_without_a_session_is_an_error() {
        let store = Arc::new(InMemoryEventStore::new());
        let router = router(store);

        let err = router.resume_alert(user("ghost")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionNotFound);
        router.shutdown().await;
    }

    #[tokio::test]
    async fn forget_wipes_state_session_and_log() {
        let store = Arc::new(InMemoryEventStore::new());
        let router = router(store.clone());
        let alice = user("alice");

        router.ingest(mood_event(&alice, 0, 3.0)).await.unwrap();
        router
            .apply_turn(alice.clone(), TurnSignal::Advance)
            .await
            .unwrap();

        let removed = router.forget_user(alice.clone()).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 0);
        assert_eq!(router.burnout_risk(alice.clone()).await.unwrap(), 0.0);

        // The next turn starts a fresh session from Listening.
        let outcome = router
            .apply_turn(alice.clone(), TurnSignal::Advance)
            .await
            .unwrap();
        assert_eq!(outcome.state, ProtocolState::ValidateEmotion);
        router.shutdown().await;
    }

    #[tokio::test]
    async fn rebuild_restores_state_across_partitions() {
        let store = Arc::new(InMemoryEventStore::new());
        let first = router(store.clone());
        for name in ["alice", "bob", "carol"] {
            let u = user(name);
            first.ingest(mood_event(&u, 0, 2.0)).await.unwrap();
            first.ingest(mood_event(&u, 60, 2.0)).await.unwrap();
        }
        first.shutdown().await;

        let second = router(store.clone());
        let replayed = second.rebuild_from_store().await.unwrap();

        // Each event is replayed exactly once, by its owning partition.
        assert_eq!(replayed, store.len().await);
        assert_eq!(replayed, 6);
        assert!(second.burnout_risk(user("alice")).await.unwrap() > 0.0);
        second.shutdown().await;
    }

    #[tokio::test]
    async fn users_shard_deterministically() {
        let store = Arc::new(InMemoryEventStore::new());
        let router = router(store);

        let a = router.partition_for(&user("alice"));
        for _ in 0..10 {
            assert_eq!(router.partition_for(&user("alice")), a);
        }
        router.shutdown().await;
    }
}
