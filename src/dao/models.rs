use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::debate::{DebateStatus, Side};

/// Account entity referenced by debates and the matchmaking queue.
///
/// Stats are mutated only by debate completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Stable identifier for the user.
    pub id: Uuid,
    /// Name shown to opponents.
    pub display_name: String,
    /// Debates won.
    pub wins: u32,
    /// Debates lost.
    pub losses: u32,
    /// Total debates completed.
    pub debates: u32,
    /// Accumulated ranking points.
    pub points: u32,
    /// Derived level, `max(1, points / 100 + 1)`.
    pub level: u32,
}

/// Fields required to register a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Name shown to opponents.
    pub display_name: String,
}

/// Debate motion selected by matchmaking. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicEntity {
    /// Stable identifier for the topic.
    pub id: Uuid,
    /// The motion participants argue over.
    pub title: String,
    /// Difficulty rating from 1 (easy) to 5 (hard).
    pub difficulty: u8,
}

/// Fields required to create a topic.
#[derive(Debug, Clone)]
pub struct NewTopic {
    /// The motion participants argue over.
    pub title: String,
    /// Difficulty rating from 1 (easy) to 5 (hard).
    pub difficulty: u8,
}

/// Aggregate debate entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DebateEntity {
    /// Primary key of the debate.
    pub id: Uuid,
    /// Topic both sides argue over.
    pub topic_id: Uuid,
    /// User arguing in favour of the motion.
    pub affirmative_user_id: Uuid,
    /// User arguing against the motion.
    pub opposition_user_id: Uuid,
    /// Lifecycle status; `completed` is terminal.
    pub status: DebateStatus,
    /// Side expected to submit the next argument.
    pub current_turn: Side,
    /// Round currently in progress, starting at 1.
    pub current_round: u32,
    /// Number of rounds before the debate is judged.
    pub max_rounds: u32,
    /// Seconds granted per turn.
    pub time_per_turn: u32,
    /// Winning user, set on completion.
    pub winner_id: Option<Uuid>,
    /// When the debate was created.
    pub start_time: SystemTime,
    /// When the verdict was recorded.
    pub end_time: Option<SystemTime>,
    /// Composed judging feedback, set on completion.
    pub judging_feedback: Option<String>,
    /// Index of the background variant clients render for this debate.
    pub background_index: u8,
}

impl DebateEntity {
    /// Side assigned to `user_id`, if the user participates in this debate.
    pub fn side_of(&self, user_id: Uuid) -> Option<Side> {
        if self.affirmative_user_id == user_id {
            Some(Side::Affirmative)
        } else if self.opposition_user_id == user_id {
            Some(Side::Opposition)
        } else {
            None
        }
    }

    /// User id on the given side.
    pub fn user_on(&self, side: Side) -> Uuid {
        match side {
            Side::Affirmative => self.affirmative_user_id,
            Side::Opposition => self.opposition_user_id,
        }
    }
}

/// Fields required to create a debate; the store stamps status, turn,
/// round, and start time.
#[derive(Debug, Clone)]
pub struct NewDebate {
    /// Topic both sides argue over.
    pub topic_id: Uuid,
    /// User assigned the affirmative side.
    pub affirmative_user_id: Uuid,
    /// User assigned the opposition side.
    pub opposition_user_id: Uuid,
    /// Number of rounds before judging.
    pub max_rounds: u32,
    /// Seconds granted per turn.
    pub time_per_turn: u32,
    /// Background variant index for clients.
    pub background_index: u8,
}

/// A single argument inside a debate. Append-only; at most one exists per
/// (debate, round, side).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArgumentEntity {
    /// Stable identifier for the argument.
    pub id: Uuid,
    /// Debate this argument belongs to.
    pub debate_id: Uuid,
    /// Author of the argument.
    pub user_id: Uuid,
    /// Round the argument was submitted in.
    pub round: u32,
    /// Side the argument was submitted for.
    pub side: Side,
    /// Argument text.
    pub content: String,
    /// When the argument was accepted.
    pub submitted_at: SystemTime,
}

/// Fields required to append an argument.
#[derive(Debug, Clone)]
pub struct NewArgument {
    /// Debate this argument belongs to.
    pub debate_id: Uuid,
    /// Author of the argument.
    pub user_id: Uuid,
    /// Round the argument is submitted in.
    pub round: u32,
    /// Side the argument is submitted for.
    pub side: Side,
    /// Argument text.
    pub content: String,
}

/// Append-only record of an award granted to a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AchievementEntity {
    /// Stable identifier for the achievement.
    pub id: Uuid,
    /// User the achievement was granted to.
    pub user_id: Uuid,
    /// Display title of the achievement.
    pub title: String,
    /// When the achievement was earned.
    pub earned_at: SystemTime,
}

/// Fields required to grant an achievement.
#[derive(Debug, Clone)]
pub struct NewAchievement {
    /// User the achievement is granted to.
    pub user_id: Uuid,
    /// Display title of the achievement.
    pub title: String,
}

/// A pending matchmaking request. At most one exists per user; queue order
/// is `joined_at` ascending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueEntryEntity {
    /// User waiting to be paired.
    pub user_id: Uuid,
    /// When the user joined the queue.
    pub joined_at: SystemTime,
    /// Lowest opponent level the user asked for.
    pub min_level: u32,
    /// Highest opponent level the user asked for.
    pub max_level: u32,
    /// Topics the user would prefer to debate.
    pub preferred_topic_ids: Vec<Uuid>,
}

/// Fields required to enqueue a matchmaking request; the store stamps
/// `joined_at` and replaces any existing entry for the same user.
#[derive(Debug, Clone)]
pub struct NewQueueEntry {
    /// User joining the queue.
    pub user_id: Uuid,
    /// Lowest opponent level the user asks for.
    pub min_level: u32,
    /// Highest opponent level the user asks for.
    pub max_level: u32,
    /// Topics the user would prefer to debate.
    pub preferred_topic_ids: Vec<Uuid>,
}

impl From<&QueueEntryEntity> for NewQueueEntry {
    fn from(entry: &QueueEntryEntity) -> Self {
        Self {
            user_id: entry.user_id,
            min_level: entry.min_level,
            max_level: entry.max_level,
            preferred_topic_ids: entry.preferred_topic_ids.clone(),
        }
    }
}
