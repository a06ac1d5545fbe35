use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::debate::TopicSummary, state::debate::Side};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from WebSocket clients, wrapped in a
/// `{"type": ..., "payload": ...}` envelope.
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Bind a user to this connection. Must be re-sent after every
    /// physical reconnect.
    Authenticate {
        /// User to bind.
        user_id: Uuid,
    },
    /// Enter the matchmaking queue and subscribe to queue-size updates.
    JoinMatchmaking {
        /// User joining the queue.
        user_id: Uuid,
        /// Lowest opponent level the user asks for; defaults to 1.
        #[serde(default)]
        min_level: Option<u32>,
        /// Highest opponent level the user asks for; defaults to 100.
        #[serde(default)]
        max_level: Option<u32>,
        /// Topics the user would prefer to debate.
        #[serde(default)]
        preferred_topic_ids: Vec<Uuid>,
    },
    /// Leave the matchmaking queue; a no-op when not queued.
    LeaveMatchmaking {
        /// User leaving the queue.
        user_id: Uuid,
    },
    /// Register interest in push updates for a debate.
    SubscribeToDebate {
        /// Debate to follow.
        debate_id: Uuid,
    },
    /// Any message type this server version does not understand.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize, ToSchema)]
/// Messages pushed to WebSocket clients, wrapped in the same
/// `{"type": ..., "payload": ...}` envelope as inbound traffic.
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// First frame after the upgrade, confirming the connection identity.
    ConnectionAck {
        /// Opaque identifier of this connection.
        connection_id: Uuid,
    },
    /// Queue-size update sent to matchmaking subscribers.
    Matchmaking {
        /// Number of users currently waiting.
        queue_size: usize,
    },
    /// A pairing succeeded; tailored per receiver.
    MatchFound {
        /// Newly created debate.
        debate_id: Uuid,
        /// The other participant.
        opponent_id: Uuid,
        /// Whether the receiver argues the affirmative side.
        is_affirmative: bool,
        /// Topic selected for the debate.
        topic: TopicSummary,
    },
    /// The opponent has spoken and it is now the receiver's turn.
    YourTurn {
        /// Debate the turn belongs to.
        debate_id: Uuid,
        /// Round now in progress.
        current_round: u32,
        /// Copy of the argument the opponent just submitted.
        argument: ArgumentSnapshot,
    },
    /// The debate has been judged and completed.
    DebateComplete {
        /// Debate that completed.
        debate_id: Uuid,
        /// Winning user.
        winner_id: Uuid,
        /// Overall evaluation of the exchange.
        feedback: String,
        /// Explanation of why the winner was chosen.
        reasoning: String,
        /// Per-side scores.
        score: ScorePair,
        /// Concrete suggestions for both participants.
        improvement_points: Vec<String>,
    },
}

/// Copy of a just-submitted argument carried inside a turn notification.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ArgumentSnapshot {
    /// Argument text.
    pub content: String,
    /// Side the argument was submitted for.
    pub side: Side,
    /// Round the argument was submitted in.
    pub round: u32,
}

/// Scores awarded to each side by the verdict.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct ScorePair {
    /// Affirmative score in 1..=100.
    pub affirmative: u8,
    /// Opposition score in 1..=100.
    pub opposition: u8,
}

impl ClientMessage {
    /// Parse and minimally validate an inbound envelope.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_envelope_round_trips() {
        let user_id = Uuid::new_v4();
        let raw = format!(
            r#"{{"type":"joinMatchmaking","payload":{{"userId":"{user_id}","minLevel":3}}}}"#
        );

        match ClientMessage::from_json_str(&raw).unwrap() {
            ClientMessage::JoinMatchmaking {
                user_id: parsed,
                min_level,
                max_level,
                preferred_topic_ids,
            } => {
                assert_eq!(parsed, user_id);
                assert_eq!(min_level, Some(3));
                assert_eq!(max_level, None);
                assert!(preferred_topic_ids.is_empty());
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn unknown_message_types_parse_to_unknown() {
        let raw = r#"{"type":"startDancing","payload":{}}"#;
        assert!(matches!(
            ClientMessage::from_json_str(raw).unwrap(),
            ClientMessage::Unknown
        ));
    }

    #[test]
    fn outbound_envelope_uses_type_and_payload() {
        let message = ServerMessage::Matchmaking { queue_size: 4 };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "matchmaking");
        assert_eq!(json["payload"]["queueSize"], 4);
    }
}
