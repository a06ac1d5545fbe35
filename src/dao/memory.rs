//! In-memory storage backend.
//!
//! Keeps every entity in insertion-ordered maps behind a single async lock,
//! which makes it both the default runtime backend and the test substrate.
//! Durable relational storage stays behind the same [`DebateStore`] trait.

use std::{sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::dao::{
    debate_store::DebateStore,
    models::{
        AchievementEntity, ArgumentEntity, DebateEntity, NewAchievement, NewArgument, NewDebate,
        NewQueueEntry, NewTopic, NewUser, QueueEntryEntity, TopicEntity, UserEntity,
    },
    storage::{StorageError, StorageResult},
};
use crate::state::debate::{DebateStatus, Side};

/// Topics seeded into a fresh store so matchmaking always has a pool to
/// draw from.
const SEED_TOPICS: [(&str, u8); 8] = [
    ("Should AI be regulated?", 3),
    ("Is universal basic income a viable economic policy?", 4),
    (
        "Should social media platforms be held responsible for user content?",
        3,
    ),
    ("Is nuclear energy the solution to climate change?", 4),
    ("Should voting be mandatory in democratic countries?", 2),
    (
        "Are standardized tests an effective measure of student ability?",
        3,
    ),
    (
        "Should cryptocurrencies be regulated like traditional currencies?",
        4,
    ),
    (
        "Is space exploration a worthwhile investment of public resources?",
        3,
    ),
];

#[derive(Default)]
struct Inner {
    users: IndexMap<Uuid, UserEntity>,
    topics: IndexMap<Uuid, TopicEntity>,
    debates: IndexMap<Uuid, DebateEntity>,
    arguments: Vec<ArgumentEntity>,
    achievements: Vec<AchievementEntity>,
    queue: IndexMap<Uuid, QueueEntryEntity>,
}

/// Insertion-ordered in-memory implementation of [`DebateStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the default topic pool.
    pub async fn with_seed_topics() -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock().await;
            for (title, difficulty) in SEED_TOPICS {
                let topic = TopicEntity {
                    id: Uuid::new_v4(),
                    title: title.to_string(),
                    difficulty,
                };
                inner.topics.insert(topic.id, topic);
            }
        }
        store
    }
}

impl DebateStore for MemoryStore {
    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.lock().await.users.get(&id).cloned()) })
    }

    fn create_user(&self, user: NewUser) -> BoxFuture<'static, StorageResult<UserEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entity = UserEntity {
                id: Uuid::new_v4(),
                display_name: user.display_name,
                wins: 0,
                losses: 0,
                debates: 0,
                points: 0,
                level: 1,
            };
            inner.lock().await.users.insert(entity.id, entity.clone());
            Ok(entity)
        })
    }

    fn update_user_stats(
        &self,
        user_id: Uuid,
        wins: u32,
        losses: u32,
        points: u32,
    ) -> BoxFuture<'static, StorageResult<UserEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.lock().await;
            let user = guard
                .users
                .get_mut(&user_id)
                .ok_or_else(|| StorageError::not_found("user", user_id))?;

            user.wins += wins;
            user.losses += losses;
            user.points += points;
            if wins + losses > 0 {
                user.debates += 1;
            }
            user.level = (user.points / 100 + 1).max(1);

            Ok(user.clone())
        })
    }

    fn find_topic(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TopicEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.lock().await.topics.get(&id).cloned()) })
    }

    fn list_topics(&self) -> BoxFuture<'static, StorageResult<Vec<TopicEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.lock().await.topics.values().cloned().collect()) })
    }

    fn create_topic(&self, topic: NewTopic) -> BoxFuture<'static, StorageResult<TopicEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entity = TopicEntity {
                id: Uuid::new_v4(),
                title: topic.title,
                difficulty: topic.difficulty,
            };
            inner
                .lock()
                .await
                .topics
                .insert(entity.id, entity.clone());
            Ok(entity)
        })
    }

    fn find_debate(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<DebateEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.lock().await.debates.get(&id).cloned()) })
    }

    fn debates_by_user(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<DebateEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            // Debates are inserted in creation order, so reversing the map
            // iteration yields most-recent-first.
            Ok(inner
                .lock()
                .await
                .debates
                .values()
                .rev()
                .filter(|debate| {
                    debate.affirmative_user_id == user_id || debate.opposition_user_id == user_id
                })
                .cloned()
                .collect())
        })
    }

    fn create_debate(&self, debate: NewDebate) -> BoxFuture<'static, StorageResult<DebateEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entity = DebateEntity {
                id: Uuid::new_v4(),
                topic_id: debate.topic_id,
                affirmative_user_id: debate.affirmative_user_id,
                opposition_user_id: debate.opposition_user_id,
                status: DebateStatus::Active,
                current_turn: Side::Affirmative,
                current_round: 1,
                max_rounds: debate.max_rounds,
                time_per_turn: debate.time_per_turn,
                winner_id: None,
                start_time: SystemTime::now(),
                end_time: None,
                judging_feedback: None,
                background_index: debate.background_index,
            };
            inner
                .lock()
                .await
                .debates
                .insert(entity.id, entity.clone());
            Ok(entity)
        })
    }

    fn update_debate_progress(
        &self,
        id: Uuid,
        status: DebateStatus,
        current_turn: Side,
        current_round: u32,
    ) -> BoxFuture<'static, StorageResult<DebateEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.lock().await;
            let debate = guard
                .debates
                .get_mut(&id)
                .ok_or_else(|| StorageError::not_found("debate", id))?;

            debate.status = status;
            debate.current_turn = current_turn;
            debate.current_round = current_round;

            Ok(debate.clone())
        })
    }

    fn complete_debate(
        &self,
        id: Uuid,
        winner_id: Uuid,
        judging_feedback: String,
    ) -> BoxFuture<'static, StorageResult<DebateEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.lock().await;
            let debate = guard
                .debates
                .get_mut(&id)
                .ok_or_else(|| StorageError::not_found("debate", id))?;

            debate.status = DebateStatus::Completed;
            debate.end_time = Some(SystemTime::now());
            debate.winner_id = Some(winner_id);
            debate.judging_feedback = Some(judging_feedback);

            Ok(debate.clone())
        })
    }

    fn arguments_by_debate(
        &self,
        debate_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ArgumentEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut arguments: Vec<ArgumentEntity> = inner
                .lock()
                .await
                .arguments
                .iter()
                .filter(|argument| argument.debate_id == debate_id)
                .cloned()
                .collect();

            arguments.sort_by_key(|argument| {
                let side_rank = match argument.side {
                    Side::Affirmative => 0,
                    Side::Opposition => 1,
                };
                (argument.round, side_rank)
            });

            Ok(arguments)
        })
    }

    fn create_argument(
        &self,
        argument: NewArgument,
    ) -> BoxFuture<'static, StorageResult<ArgumentEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entity = ArgumentEntity {
                id: Uuid::new_v4(),
                debate_id: argument.debate_id,
                user_id: argument.user_id,
                round: argument.round,
                side: argument.side,
                content: argument.content,
                submitted_at: SystemTime::now(),
            };
            inner.lock().await.arguments.push(entity.clone());
            Ok(entity)
        })
    }

    fn enqueue(
        &self,
        entry: NewQueueEntry,
    ) -> BoxFuture<'static, StorageResult<QueueEntryEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entity = QueueEntryEntity {
                user_id: entry.user_id,
                joined_at: SystemTime::now(),
                min_level: entry.min_level,
                max_level: entry.max_level,
                preferred_topic_ids: entry.preferred_topic_ids,
            };

            let mut guard = inner.lock().await;
            // Re-joining replaces the previous entry and moves the user to
            // the queue tail.
            guard.queue.shift_remove(&entity.user_id);
            guard.queue.insert(entity.user_id, entity.clone());

            Ok(entity)
        })
    }

    fn dequeue(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.lock().await.queue.shift_remove(&user_id);
            Ok(())
        })
    }

    fn queue_snapshot(&self) -> BoxFuture<'static, StorageResult<Vec<QueueEntryEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.lock().await.queue.values().cloned().collect()) })
    }

    fn achievements_by_user(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AchievementEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .lock()
                .await
                .achievements
                .iter()
                .rev()
                .filter(|achievement| achievement.user_id == user_id)
                .cloned()
                .collect())
        })
    }

    fn create_achievement(
        &self,
        achievement: NewAchievement,
    ) -> BoxFuture<'static, StorageResult<AchievementEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let entity = AchievementEntity {
                id: Uuid::new_v4(),
                user_id: achievement.user_id,
                title: achievement.title,
                earned_at: SystemTime::now(),
            };
            inner.lock().await.achievements.push(entity.clone());
            Ok(entity)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
