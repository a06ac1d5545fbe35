use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{ArgumentEntity, DebateEntity, TopicEntity},
    dto::{format_system_time, validation::validate_not_blank},
    state::debate::{DebateStatus, Side},
};

/// Public projection of a topic.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TopicSummary {
    /// Stable identifier for the topic.
    pub id: Uuid,
    /// The motion participants argue over.
    pub title: String,
    /// Difficulty rating from 1 (easy) to 5 (hard).
    pub difficulty: u8,
}

impl From<TopicEntity> for TopicSummary {
    fn from(topic: TopicEntity) -> Self {
        Self {
            id: topic.id,
            title: topic.title,
            difficulty: topic.difficulty,
        }
    }
}

/// Payload accepted by the argument submission endpoint.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitArgumentRequest {
    /// Debate the argument targets.
    pub debate_id: Uuid,
    /// Submitting user.
    pub user_id: Uuid,
    /// Round the client believes is in progress. The server's round counter
    /// is authoritative; a stale value here is tolerated.
    pub round: u32,
    /// Side the user claims to argue for; must match their assignment.
    pub side: Side,
    /// Argument text; the word-count minimum is enforced by the debate
    /// service so the error can report the actual count.
    #[validate(custom(function = validate_not_blank))]
    pub content: String,
}

/// Public projection of a stored argument.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentSummary {
    /// Stable identifier for the argument.
    pub id: Uuid,
    /// Debate the argument belongs to.
    pub debate_id: Uuid,
    /// Author of the argument.
    pub user_id: Uuid,
    /// Round the argument was submitted in.
    pub round: u32,
    /// Side the argument was submitted for.
    pub side: Side,
    /// Argument text.
    pub content: String,
    /// RFC 3339 timestamp of acceptance.
    pub submitted_at: String,
}

impl From<ArgumentEntity> for ArgumentSummary {
    fn from(argument: ArgumentEntity) -> Self {
        Self {
            id: argument.id,
            debate_id: argument.debate_id,
            user_id: argument.user_id,
            round: argument.round,
            side: argument.side,
            content: argument.content,
            submitted_at: format_system_time(argument.submitted_at),
        }
    }
}

/// Full debate snapshot served to polling clients.
///
/// Reading this is side-effect free; clients poll it as redundancy against
/// missed push events.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DebateDetail {
    /// Stable identifier for the debate.
    pub id: Uuid,
    /// Topic being argued, when it still resolves.
    pub topic: Option<TopicSummary>,
    /// Lifecycle status.
    pub status: DebateStatus,
    /// Side expected to submit next.
    pub current_turn: Side,
    /// Round currently in progress.
    pub current_round: u32,
    /// Number of rounds before judging.
    pub max_rounds: u32,
    /// Seconds granted per turn.
    pub time_per_turn: u32,
    /// User arguing the affirmative side.
    pub affirmative_user_id: Uuid,
    /// User arguing the opposition side.
    pub opposition_user_id: Uuid,
    /// Winning user, present once completed.
    pub winner_id: Option<Uuid>,
    /// RFC 3339 creation timestamp.
    pub start_time: String,
    /// RFC 3339 completion timestamp.
    pub end_time: Option<String>,
    /// Composed judging feedback, present once completed.
    pub judging_feedback: Option<String>,
    /// Background variant index for clients.
    pub background_index: u8,
    /// Arguments in round order, affirmative first within each round.
    pub arguments: Vec<ArgumentSummary>,
}

impl DebateDetail {
    /// Assemble the snapshot from its stored parts.
    pub fn from_parts(
        debate: DebateEntity,
        topic: Option<TopicEntity>,
        arguments: Vec<ArgumentEntity>,
    ) -> Self {
        Self {
            id: debate.id,
            topic: topic.map(Into::into),
            status: debate.status,
            current_turn: debate.current_turn,
            current_round: debate.current_round,
            max_rounds: debate.max_rounds,
            time_per_turn: debate.time_per_turn,
            affirmative_user_id: debate.affirmative_user_id,
            opposition_user_id: debate.opposition_user_id,
            winner_id: debate.winner_id,
            start_time: format_system_time(debate.start_time),
            end_time: debate.end_time.map(format_system_time),
            judging_feedback: debate.judging_feedback,
            background_index: debate.background_index,
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }
}
