use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    AchievementEntity, ArgumentEntity, DebateEntity, NewAchievement, NewArgument, NewDebate,
    NewQueueEntry, NewTopic, NewUser, QueueEntryEntity, TopicEntity, UserEntity,
};
use crate::dao::storage::StorageResult;
use crate::state::debate::{DebateStatus, Side};

/// Abstraction over the persistence layer for users, topics, debates,
/// arguments, achievements, and the matchmaking queue.
pub trait DebateStore: Send + Sync {
    /// Fetch a user by id.
    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Register a new user with zeroed stats.
    fn create_user(&self, user: NewUser) -> BoxFuture<'static, StorageResult<UserEntity>>;
    /// Apply win/loss/point deltas to a user and recompute the level.
    fn update_user_stats(
        &self,
        user_id: Uuid,
        wins: u32,
        losses: u32,
        points: u32,
    ) -> BoxFuture<'static, StorageResult<UserEntity>>;

    /// Fetch a topic by id.
    fn find_topic(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TopicEntity>>>;
    /// List all known topics.
    fn list_topics(&self) -> BoxFuture<'static, StorageResult<Vec<TopicEntity>>>;
    /// Create a topic.
    fn create_topic(&self, topic: NewTopic) -> BoxFuture<'static, StorageResult<TopicEntity>>;

    /// Fetch a debate by id.
    fn find_debate(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<DebateEntity>>>;
    /// Debates the user participated in, most recent first.
    fn debates_by_user(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<DebateEntity>>>;
    /// Create a debate opened into round 1 with the affirmative to speak.
    fn create_debate(&self, debate: NewDebate) -> BoxFuture<'static, StorageResult<DebateEntity>>;
    /// Persist the turn/round progression computed by the state machine.
    fn update_debate_progress(
        &self,
        id: Uuid,
        status: DebateStatus,
        current_turn: Side,
        current_round: u32,
    ) -> BoxFuture<'static, StorageResult<DebateEntity>>;
    /// Mark a debate completed, stamping the end time, winner, and feedback.
    fn complete_debate(
        &self,
        id: Uuid,
        winner_id: Uuid,
        judging_feedback: String,
    ) -> BoxFuture<'static, StorageResult<DebateEntity>>;

    /// Arguments of a debate, ordered by round ascending with the
    /// affirmative argument first within each round.
    fn arguments_by_debate(
        &self,
        debate_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ArgumentEntity>>>;
    /// Append an argument.
    fn create_argument(
        &self,
        argument: NewArgument,
    ) -> BoxFuture<'static, StorageResult<ArgumentEntity>>;

    /// Add a matchmaking entry at the queue tail, replacing any existing
    /// entry for the same user.
    fn enqueue(&self, entry: NewQueueEntry)
    -> BoxFuture<'static, StorageResult<QueueEntryEntity>>;
    /// Remove a user's matchmaking entry; a no-op when absent.
    fn dequeue(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<()>>;
    /// Current queue contents in FIFO order.
    fn queue_snapshot(&self) -> BoxFuture<'static, StorageResult<Vec<QueueEntryEntity>>>;

    /// Achievements granted to a user, most recent first.
    fn achievements_by_user(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AchievementEntity>>>;
    /// Grant an achievement.
    fn create_achievement(
        &self,
        achievement: NewAchievement,
    ) -> BoxFuture<'static, StorageResult<AchievementEntity>>;

    /// Probe backend connectivity.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
