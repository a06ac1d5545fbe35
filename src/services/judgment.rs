use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    dao::{debate_store::DebateStore, models::DebateEntity},
    error::ServiceError,
    judge::Verdict,
    services::ws_events,
    state::{
        SharedState,
        debate::{DebateEvent, DebateMachine, Side},
    },
};

/// Points awarded to the winning side of a completed debate.
const WINNER_POINTS: u32 = 20;
/// Points awarded to the losing side of a completed debate.
const LOSER_POINTS: u32 = 5;

/// Judge a debate that has exhausted its rounds and drive it to completion.
///
/// Runs exactly once per debate, synchronously from the final argument
/// submission. Provider failures are absorbed by the fallback verdict, so
/// the debate always leaves the judging state.
pub async fn run(
    state: &SharedState,
    store: &Arc<dyn DebateStore>,
    debate: &DebateEntity,
) -> Result<(), ServiceError> {
    let mut machine = DebateMachine::from_entity(debate);
    machine.advance(DebateEvent::VerdictRecorded)?;

    let topic_title = store
        .find_topic(debate.topic_id)
        .await?
        .map(|topic| topic.title)
        .unwrap_or_else(|| "Unknown Topic".into());

    let arguments = store.arguments_by_debate(debate.id).await?;
    let mut affirmative = Vec::new();
    let mut opposition = Vec::new();
    for argument in arguments {
        match argument.side {
            Side::Affirmative => affirmative.push(argument.content),
            Side::Opposition => opposition.push(argument.content),
        }
    }

    let verdict = render_verdict(state, &topic_title, &affirmative, &opposition).await;

    let winner_id = debate.user_on(verdict.winner);
    let loser_id = debate.user_on(verdict.winner.opponent());

    store
        .complete_debate(debate.id, winner_id, compose_feedback(&verdict))
        .await?;
    store
        .update_user_stats(winner_id, 1, 0, WINNER_POINTS)
        .await?;
    store.update_user_stats(loser_id, 0, 1, LOSER_POINTS).await?;

    info!(
        debate_id = %debate.id,
        winner = %winner_id,
        affirmative_score = verdict.affirmative_score,
        opposition_score = verdict.opposition_score,
        "debate judged and completed"
    );

    ws_events::notify_debate_complete(state, debate, winner_id, &verdict);
    state.release_submission_gate(debate.id);

    Ok(())
}

/// Obtain a verdict from the provider chain: primary first, fallback last.
///
/// The fallback synthesizes locally and cannot fail, so this function is
/// total; judging errors never surface to participants.
async fn render_verdict(
    state: &SharedState,
    topic_title: &str,
    affirmative: &[String],
    opposition: &[String],
) -> Verdict {
    if let Some(primary) = state.primary_judge() {
        match primary.judge(topic_title, affirmative, opposition).await {
            Ok(verdict) => return verdict,
            Err(err) => {
                warn!(
                    judge = primary.name(),
                    error = %err,
                    "primary judge failed; degrading to fallback verdict"
                );
            }
        }
    }

    state.fallback_judge().render()
}

/// Compose the persisted feedback text from a verdict.
pub fn compose_feedback(verdict: &Verdict) -> String {
    let mut text = format!(
        "{}\n\n{}\n\nKey Points for Improvement:",
        verdict.feedback, verdict.reasoning
    );
    for point in &verdict.improvement_points {
        text.push_str("\n- ");
        text.push_str(point);
    }
    text
}
