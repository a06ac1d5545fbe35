use uuid::Uuid;

use crate::{
    dao::models::{ArgumentEntity, DebateEntity, TopicEntity},
    dto::ws::{ArgumentSnapshot, ScorePair, ServerMessage},
    judge::Verdict,
    services::websocket_service::{broadcast_matchmaking, send_to_user},
    state::SharedState,
};

/// Broadcast the current queue size to all matchmaking subscribers.
pub fn broadcast_queue_size(state: &SharedState, queue_size: usize) {
    broadcast_matchmaking(
        state,
        &ServerMessage::Matchmaking { queue_size },
        "queue size update",
    );
}

/// Tell one half of a fresh pairing about their new debate.
pub fn notify_match_found(
    state: &SharedState,
    user_id: Uuid,
    debate: &DebateEntity,
    opponent_id: Uuid,
    topic: &TopicEntity,
) {
    let message = ServerMessage::MatchFound {
        debate_id: debate.id,
        opponent_id,
        is_affirmative: debate.affirmative_user_id == user_id,
        topic: topic.clone().into(),
    };
    send_to_user(state, user_id, &message, "match found");
}

/// Tell the waiting participant that the opponent has spoken.
pub fn notify_your_turn(
    state: &SharedState,
    user_id: Uuid,
    current_round: u32,
    argument: &ArgumentEntity,
) {
    let message = ServerMessage::YourTurn {
        debate_id: argument.debate_id,
        current_round,
        argument: ArgumentSnapshot {
            content: argument.content.clone(),
            side: argument.side,
            round: argument.round,
        },
    };
    send_to_user(state, user_id, &message, "your turn");
}

/// Tell both participants the debate has been judged.
pub fn notify_debate_complete(
    state: &SharedState,
    debate: &DebateEntity,
    winner_id: Uuid,
    verdict: &Verdict,
) {
    for user_id in [debate.affirmative_user_id, debate.opposition_user_id] {
        let message = ServerMessage::DebateComplete {
            debate_id: debate.id,
            winner_id,
            feedback: verdict.feedback.clone(),
            reasoning: verdict.reasoning.clone(),
            score: ScorePair {
                affirmative: verdict.affirmative_score,
                opposition: verdict.opposition_score,
            },
            improvement_points: verdict.improvement_points.clone(),
        };
        send_to_user(state, user_id, &message, "debate complete");
    }
}
