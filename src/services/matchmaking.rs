use std::collections::HashSet;
use std::sync::Arc;

use rand::{Rng, seq::IndexedRandom};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        debate_store::DebateStore,
        models::{NewDebate, NewQueueEntry, NewTopic, QueueEntryEntity, TopicEntity},
    },
    error::ServiceError,
    services::ws_events,
    state::SharedState,
};

const DEFAULT_MIN_LEVEL: u32 = 1;
const DEFAULT_MAX_LEVEL: u32 = 100;
/// Topic synthesized when matchmaking finds an empty topic pool.
const DEFAULT_TOPIC_TITLE: &str = "Should AI be regulated?";
const DEFAULT_TOPIC_DIFFICULTY: u8 = 3;

/// Preferences supplied when a user joins the queue.
///
/// The level window is recorded with the entry but not enforced during
/// pairing, which is strictly FIFO.
#[derive(Debug, Clone, Default)]
pub struct QueueOptions {
    /// Lowest opponent level the user asks for.
    pub min_level: Option<u32>,
    /// Highest opponent level the user asks for.
    pub max_level: Option<u32>,
    /// Topics the user would prefer to debate.
    pub preferred_topic_ids: Vec<Uuid>,
}

/// Enter the matchmaking queue, replacing any existing entry for the user,
/// then attempt to pair waiting users.
///
/// The enqueue itself runs under the queue gate so it cannot interleave
/// with a pairing already in flight.
pub async fn join(
    state: &SharedState,
    user_id: Uuid,
    options: QueueOptions,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;

    {
        let _gate = state.matchmaking_gate().lock().await;
        store
            .enqueue(NewQueueEntry {
                user_id,
                min_level: options.min_level.unwrap_or(DEFAULT_MIN_LEVEL),
                max_level: options.max_level.unwrap_or(DEFAULT_MAX_LEVEL),
                preferred_topic_ids: options.preferred_topic_ids,
            })
            .await?;
    }

    let queue_size = store.queue_snapshot().await?.len();
    info!(%user_id, queue_size, "user joined matchmaking");
    ws_events::broadcast_queue_size(state, queue_size);

    try_pair(state).await
}

/// Leave the matchmaking queue; a no-op when the user is not queued, since
/// disconnects race with explicit leaves.
///
/// Takes the queue gate so a leave ordered behind an in-flight pairing only
/// runs once that pairing has settled; the user is either paired or gone
/// afterwards, never both.
pub async fn leave(state: &SharedState, user_id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;

    {
        let _gate = state.matchmaking_gate().lock().await;
        store.dequeue(user_id).await?;
    }

    let queue_size = store.queue_snapshot().await?.len();
    info!(%user_id, queue_size, "user left matchmaking");
    ws_events::broadcast_queue_size(state, queue_size);

    Ok(())
}

/// Pair the two earliest waiting users while at least two are queued.
///
/// Runs under the queue-wide gate so concurrent joins cannot pop
/// overlapping entries. If debate creation fails after the two entries were
/// removed, both users are re-enqueued with their original options and the
/// error is surfaced as retryable.
pub async fn try_pair(state: &SharedState) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    let _gate = state.matchmaking_gate().lock().await;

    loop {
        let queue = store.queue_snapshot().await?;
        if queue.len() < 2 {
            return Ok(());
        }

        let first = queue[0].clone();
        let second = queue[1].clone();

        store.dequeue(first.user_id).await?;
        store.dequeue(second.user_id).await?;

        if let Err(err) = pair(state, &store, &first, &second).await {
            warn!(
                first = %first.user_id,
                second = %second.user_id,
                error = %err,
                "pairing failed after dequeue; requeueing both users"
            );
            store.enqueue(NewQueueEntry::from(&first)).await?;
            store.enqueue(NewQueueEntry::from(&second)).await?;
            return Err(err);
        }

        let queue_size = store.queue_snapshot().await?.len();
        ws_events::broadcast_queue_size(state, queue_size);
    }
}

/// Create a debate for two dequeued users and notify both sides.
async fn pair(
    state: &SharedState,
    store: &Arc<dyn DebateStore>,
    first: &QueueEntryEntity,
    second: &QueueEntryEntity,
) -> Result<(), ServiceError> {
    let topic = select_topic(state, store, first.user_id, second.user_id).await?;

    let rules = state.config().debate();
    let (affirmative_user_id, opposition_user_id) = {
        let mut rng = rand::rng();
        if rng.random_bool(0.5) {
            (first.user_id, second.user_id)
        } else {
            (second.user_id, first.user_id)
        }
    };
    let background_index = rand::rng().random_range(1..=rules.background_count);

    let debate = store
        .create_debate(NewDebate {
            topic_id: topic.id,
            affirmative_user_id,
            opposition_user_id,
            max_rounds: rules.max_rounds,
            time_per_turn: rules.time_per_turn_secs,
            background_index,
        })
        .await?;

    info!(
        debate_id = %debate.id,
        affirmative = %affirmative_user_id,
        opposition = %opposition_user_id,
        topic = %topic.title,
        "paired users into a new debate"
    );

    ws_events::notify_match_found(state, first.user_id, &debate, second.user_id, &topic);
    ws_events::notify_match_found(state, second.user_id, &debate, first.user_id, &topic);

    Ok(())
}

/// Pick a topic for a fresh pairing.
///
/// Topics either user debated within their recent window are excluded; when
/// that empties the pool, any topic is acceptable again. An empty topic
/// table is repaired by synthesizing one default topic.
async fn select_topic(
    state: &SharedState,
    store: &Arc<dyn DebateStore>,
    first_user_id: Uuid,
    second_user_id: Uuid,
) -> Result<TopicEntity, ServiceError> {
    let mut topics = store.list_topics().await?;
    if topics.is_empty() {
        info!("no topics found; creating a default topic");
        topics.push(
            store
                .create_topic(NewTopic {
                    title: DEFAULT_TOPIC_TITLE.into(),
                    difficulty: DEFAULT_TOPIC_DIFFICULTY,
                })
                .await?,
        );
    }

    let window = state.config().debate().recent_topic_window;
    let mut excluded = HashSet::new();
    for user_id in [first_user_id, second_user_id] {
        for debate in store.debates_by_user(user_id).await?.into_iter().take(window) {
            excluded.insert(debate.topic_id);
        }
    }

    let candidates: Vec<&TopicEntity> = topics
        .iter()
        .filter(|topic| !excluded.contains(&topic.id))
        .collect();
    let pool = if candidates.is_empty() {
        topics.iter().collect()
    } else {
        candidates
    };

    pool.choose(&mut rand::rng())
        .map(|topic| (*topic).clone())
        .ok_or_else(|| ServiceError::InvalidState("topic pool is empty".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures::future::BoxFuture;

    use crate::{
        config::AppConfig,
        dao::{
            memory::MemoryStore,
            models::{
                AchievementEntity, ArgumentEntity, DebateEntity, NewAchievement, NewArgument,
                NewUser, UserEntity,
            },
            storage::{StorageError, StorageResult},
        },
        state::{
            AppState,
            debate::{DebateStatus, Side},
        },
    };

    async fn test_state(store: Arc<dyn DebateStore>) -> SharedState {
        let state = AppState::new(AppConfig::default(), None);
        state.install_store(store).await;
        state
    }

    async fn new_user(store: &MemoryStore, name: &str) -> Uuid {
        store
            .create_user(NewUser {
                display_name: name.into(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn joining_twice_keeps_one_entry_with_later_options() {
        let store = MemoryStore::new();
        let state = test_state(Arc::new(store.clone())).await;
        let alice = new_user(&store, "alice").await;

        join(&state, alice, QueueOptions::default()).await.unwrap();
        join(
            &state,
            alice,
            QueueOptions {
                min_level: Some(7),
                ..QueueOptions::default()
            },
        )
        .await
        .unwrap();

        let queue = store.queue_snapshot().await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].user_id, alice);
        assert_eq!(queue[0].min_level, 7);
    }

    #[tokio::test]
    async fn pairing_removes_two_entries_and_creates_one_debate() {
        let store = MemoryStore::with_seed_topics().await;
        let state = test_state(Arc::new(store.clone())).await;
        let alice = new_user(&store, "alice").await;
        let bob = new_user(&store, "bob").await;

        join(&state, alice, QueueOptions::default()).await.unwrap();
        join(&state, bob, QueueOptions::default()).await.unwrap();

        assert!(store.queue_snapshot().await.unwrap().is_empty());

        let debates = store.debates_by_user(alice).await.unwrap();
        assert_eq!(debates.len(), 1);
        let debate = &debates[0];
        assert_eq!(debate.status, DebateStatus::Active);
        assert_eq!(debate.current_turn, Side::Affirmative);
        assert_eq!(debate.current_round, 1);
        assert!(debate.side_of(alice).is_some());
        assert!(debate.side_of(bob).is_some());
        assert!((1..=4).contains(&debate.background_index));
    }

    #[tokio::test]
    async fn leave_is_a_noop_for_unqueued_users() {
        let store = MemoryStore::new();
        let state = test_state(Arc::new(store.clone())).await;

        leave(&state, Uuid::new_v4()).await.unwrap();
        assert!(store.queue_snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn topic_used_recently_by_either_user_is_excluded() {
        let store = MemoryStore::new();
        let state = test_state(Arc::new(store.clone())).await;
        let alice = new_user(&store, "alice").await;
        let bob = new_user(&store, "bob").await;

        let mut topics = Vec::new();
        for index in 0..4 {
            topics.push(
                store
                    .create_topic(NewTopic {
                        title: format!("topic {index}"),
                        difficulty: 3,
                    })
                    .await
                    .unwrap(),
            );
        }

        // Alice recently debated topics 0 and 1, Bob topic 2; only topic 3
        // remains as a candidate.
        let stranger = new_user(&store, "stranger").await;
        for (user, topic) in [(alice, &topics[0]), (alice, &topics[1]), (bob, &topics[2])] {
            store
                .create_debate(NewDebate {
                    topic_id: topic.id,
                    affirmative_user_id: user,
                    opposition_user_id: stranger,
                    max_rounds: 3,
                    time_per_turn: 300,
                    background_index: 1,
                })
                .await
                .unwrap();
        }

        join(&state, alice, QueueOptions::default()).await.unwrap();
        join(&state, bob, QueueOptions::default()).await.unwrap();

        let debate = store
            .debates_by_user(alice)
            .await
            .unwrap()
            .into_iter()
            .find(|debate| debate.side_of(bob).is_some())
            .expect("paired debate");
        assert_eq!(debate.topic_id, topics[3].id);
    }

    #[tokio::test]
    async fn exhausted_topic_pool_falls_back_to_all_topics() {
        let store = MemoryStore::new();
        let state = test_state(Arc::new(store.clone())).await;
        let alice = new_user(&store, "alice").await;
        let bob = new_user(&store, "bob").await;

        let topic = store
            .create_topic(NewTopic {
                title: "the only topic".into(),
                difficulty: 2,
            })
            .await
            .unwrap();
        let stranger = new_user(&store, "stranger").await;
        store
            .create_debate(NewDebate {
                topic_id: topic.id,
                affirmative_user_id: alice,
                opposition_user_id: stranger,
                max_rounds: 3,
                time_per_turn: 300,
                background_index: 1,
            })
            .await
            .unwrap();

        join(&state, alice, QueueOptions::default()).await.unwrap();
        join(&state, bob, QueueOptions::default()).await.unwrap();

        let debate = store
            .debates_by_user(bob)
            .await
            .unwrap()
            .into_iter()
            .find(|debate| debate.side_of(alice).is_some())
            .expect("paired debate");
        assert_eq!(debate.topic_id, topic.id);
    }

    #[tokio::test]
    async fn empty_topic_table_synthesizes_a_default_topic() {
        let store = MemoryStore::new();
        let state = test_state(Arc::new(store.clone())).await;
        let alice = new_user(&store, "alice").await;
        let bob = new_user(&store, "bob").await;

        join(&state, alice, QueueOptions::default()).await.unwrap();
        join(&state, bob, QueueOptions::default()).await.unwrap();

        let topics = store.list_topics().await.unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].title, DEFAULT_TOPIC_TITLE);
    }

    /// Store that fails debate creation but delegates everything else.
    #[derive(Clone)]
    struct FailingDebateCreate {
        inner: MemoryStore,
    }

    impl DebateStore for FailingDebateCreate {
        fn find_user(
            &self,
            id: Uuid,
        ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
            self.inner.find_user(id)
        }

        fn create_user(&self, user: NewUser) -> BoxFuture<'static, StorageResult<UserEntity>> {
            self.inner.create_user(user)
        }

        fn update_user_stats(
            &self,
            user_id: Uuid,
            wins: u32,
            losses: u32,
            points: u32,
        ) -> BoxFuture<'static, StorageResult<UserEntity>> {
            self.inner.update_user_stats(user_id, wins, losses, points)
        }

        fn find_topic(
            &self,
            id: Uuid,
        ) -> BoxFuture<'static, StorageResult<Option<TopicEntity>>> {
            self.inner.find_topic(id)
        }

        fn list_topics(&self) -> BoxFuture<'static, StorageResult<Vec<TopicEntity>>> {
            self.inner.list_topics()
        }

        fn create_topic(
            &self,
            topic: NewTopic,
        ) -> BoxFuture<'static, StorageResult<TopicEntity>> {
            self.inner.create_topic(topic)
        }

        fn find_debate(
            &self,
            id: Uuid,
        ) -> BoxFuture<'static, StorageResult<Option<DebateEntity>>> {
            self.inner.find_debate(id)
        }

        fn debates_by_user(
            &self,
            user_id: Uuid,
        ) -> BoxFuture<'static, StorageResult<Vec<DebateEntity>>> {
            self.inner.debates_by_user(user_id)
        }

        fn create_debate(
            &self,
            _debate: NewDebate,
        ) -> BoxFuture<'static, StorageResult<DebateEntity>> {
            Box::pin(async {
                Err(StorageError::unavailable(
                    "debate table unavailable".into(),
                    std::io::Error::other("induced failure"),
                ))
            })
        }

        fn update_debate_progress(
            &self,
            id: Uuid,
            status: DebateStatus,
            current_turn: Side,
            current_round: u32,
        ) -> BoxFuture<'static, StorageResult<DebateEntity>> {
            self.inner
                .update_debate_progress(id, status, current_turn, current_round)
        }

        fn complete_debate(
            &self,
            id: Uuid,
            winner_id: Uuid,
            judging_feedback: String,
        ) -> BoxFuture<'static, StorageResult<DebateEntity>> {
            self.inner.complete_debate(id, winner_id, judging_feedback)
        }

        fn arguments_by_debate(
            &self,
            debate_id: Uuid,
        ) -> BoxFuture<'static, StorageResult<Vec<ArgumentEntity>>> {
            self.inner.arguments_by_debate(debate_id)
        }

        fn create_argument(
            &self,
            argument: NewArgument,
        ) -> BoxFuture<'static, StorageResult<ArgumentEntity>> {
            self.inner.create_argument(argument)
        }

        fn enqueue(
            &self,
            entry: NewQueueEntry,
        ) -> BoxFuture<'static, StorageResult<QueueEntryEntity>> {
            self.inner.enqueue(entry)
        }

        fn dequeue(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.dequeue(user_id)
        }

        fn queue_snapshot(&self) -> BoxFuture<'static, StorageResult<Vec<QueueEntryEntity>>> {
            self.inner.queue_snapshot()
        }

        fn achievements_by_user(
            &self,
            user_id: Uuid,
        ) -> BoxFuture<'static, StorageResult<Vec<AchievementEntity>>> {
            self.inner.achievements_by_user(user_id)
        }

        fn create_achievement(
            &self,
            achievement: NewAchievement,
        ) -> BoxFuture<'static, StorageResult<AchievementEntity>> {
            self.inner.create_achievement(achievement)
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }
    }

    #[tokio::test]
    async fn failed_debate_creation_requeues_both_users() {
        let inner = MemoryStore::with_seed_topics().await;
        let failing = FailingDebateCreate {
            inner: inner.clone(),
        };
        let state = test_state(Arc::new(failing)).await;
        let alice = new_user(&inner, "alice").await;
        let bob = new_user(&inner, "bob").await;

        join(&state, alice, QueueOptions::default()).await.unwrap();
        let err = join(&state, bob, QueueOptions::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));

        let queue = inner.queue_snapshot().await.unwrap();
        let queued: Vec<Uuid> = queue.iter().map(|entry| entry.user_id).collect();
        assert_eq!(queued, vec![alice, bob]);
    }
}
