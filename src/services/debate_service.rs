use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::models::NewArgument,
    dto::{
        debate::{ArgumentSummary, DebateDetail, SubmitArgumentRequest},
        validation::word_count,
    },
    error::{ServiceError, SubmitError},
    services::{judgment, ws_events},
    state::{
        SharedState,
        debate::{DebateEvent, DebateMachine, DebatePhase, DebateStatus},
    },
};

/// Validate and persist an argument, advancing the debate state machine.
///
/// This is the single entry point for argument submission, reached from the
/// REST layer. Preconditions are checked in order and nothing is persisted
/// when any of them fails. Submissions for one debate are serialized by its
/// gate, so concurrent submissions cannot race the turn counters.
///
/// When the accepted argument exhausts the final round the judgment
/// workflow runs synchronously before this function returns.
pub async fn submit_argument(
    state: &SharedState,
    request: SubmitArgumentRequest,
) -> Result<ArgumentSummary, SubmitError> {
    let store = state.require_store().await.map_err(SubmitError::Service)?;

    let gate = state.submission_gate(request.debate_id);
    let _guard = gate.lock().await;

    let debate = store
        .find_debate(request.debate_id)
        .await?
        .ok_or(SubmitError::DebateNotFound(request.debate_id))?;

    let side = debate
        .side_of(request.user_id)
        .ok_or(SubmitError::NotParticipant(request.user_id))?;

    if request.side != side {
        return Err(SubmitError::SideMismatch);
    }

    if debate.current_turn != side {
        return Err(SubmitError::NotYourTurn);
    }

    let required = state.config().debate().min_argument_words;
    let actual = word_count(&request.content);
    if actual < required {
        return Err(SubmitError::ArgumentTooShort { actual, required });
    }

    if request.round != debate.current_round {
        debug!(
            debate_id = %debate.id,
            client_round = request.round,
            server_round = debate.current_round,
            "client round out of date; using the server round"
        );
    }

    let mut machine = DebateMachine::from_entity(&debate);
    let next = machine
        .advance(DebateEvent::ArgumentAccepted { side })
        .map_err(|err| SubmitError::Service(err.into()))?;

    let argument = store
        .create_argument(NewArgument {
            debate_id: debate.id,
            user_id: request.user_id,
            round: debate.current_round,
            side,
            content: request.content,
        })
        .await?;

    match next {
        DebatePhase::Active { turn, round } => {
            store
                .update_debate_progress(debate.id, DebateStatus::Active, turn, round)
                .await?;
            let opponent = debate.user_on(side.opponent());
            ws_events::notify_your_turn(state, opponent, round, &argument);
        }
        DebatePhase::Judging { turn, round } => {
            let judging = store
                .update_debate_progress(debate.id, DebateStatus::Judging, turn, round)
                .await?;
            judgment::run(state, &store, &judging)
                .await
                .map_err(SubmitError::Service)?;
        }
        DebatePhase::Pending | DebatePhase::Completed => {
            return Err(SubmitError::Service(ServiceError::InvalidState(
                "argument acceptance cannot leave a debate pending or completed".into(),
            )));
        }
    }

    Ok(argument.into())
}

/// Fetch the full, side-effect-free snapshot of a debate.
pub async fn debate_detail(state: &SharedState, id: Uuid) -> Result<DebateDetail, ServiceError> {
    let store = state.require_store().await?;

    let debate = store
        .find_debate(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("debate `{id}` not found")))?;
    let topic = store.find_topic(debate.topic_id).await?;
    let arguments = store.arguments_by_debate(id).await?;

    Ok(DebateDetail::from_parts(debate, topic, arguments))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use futures::future::BoxFuture;

    use crate::{
        config::AppConfig,
        dao::{
            debate_store::DebateStore,
            memory::MemoryStore,
            models::{DebateEntity, NewDebate, NewTopic, NewUser},
        },
        judge::{Judge, JudgeError, JudgeResult, Verdict},
        state::{AppState, debate::Side},
    };

    fn words(count: usize) -> String {
        (0..count)
            .map(|index| format!("word{index}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn request(debate_id: Uuid, user_id: Uuid, side: Side, content: String) -> SubmitArgumentRequest {
        SubmitArgumentRequest {
            debate_id,
            user_id,
            round: 1,
            side,
            content,
        }
    }

    struct Fixture {
        state: SharedState,
        store: MemoryStore,
        debate: DebateEntity,
        affirmative: Uuid,
        opposition: Uuid,
    }

    async fn fixture(max_rounds: u32, primary: Option<Arc<dyn Judge>>) -> Fixture {
        let store = MemoryStore::new();
        let state = AppState::new(AppConfig::default(), primary);
        state.install_store(Arc::new(store.clone())).await;

        let affirmative = store
            .create_user(NewUser {
                display_name: "alice".into(),
            })
            .await
            .unwrap()
            .id;
        let opposition = store
            .create_user(NewUser {
                display_name: "bob".into(),
            })
            .await
            .unwrap()
            .id;
        let topic = store
            .create_topic(NewTopic {
                title: "Should AI be regulated?".into(),
                difficulty: 3,
            })
            .await
            .unwrap();
        let debate = store
            .create_debate(NewDebate {
                topic_id: topic.id,
                affirmative_user_id: affirmative,
                opposition_user_id: opposition,
                max_rounds,
                time_per_turn: 300,
                background_index: 1,
            })
            .await
            .unwrap();

        Fixture {
            state,
            store,
            debate,
            affirmative,
            opposition,
        }
    }

    #[tokio::test]
    async fn accepted_argument_flips_turn_without_advancing_round() {
        let f = fixture(3, None).await;

        let summary = submit_argument(
            &f.state,
            request(f.debate.id, f.affirmative, Side::Affirmative, words(60)),
        )
        .await
        .unwrap();
        assert_eq!(summary.round, 1);
        assert_eq!(summary.side, Side::Affirmative);

        let debate = f.store.find_debate(f.debate.id).await.unwrap().unwrap();
        assert_eq!(debate.status, DebateStatus::Active);
        assert_eq!(debate.current_turn, Side::Opposition);
        assert_eq!(debate.current_round, 1);
    }

    #[tokio::test]
    async fn round_advances_after_both_sides_speak() {
        let f = fixture(3, None).await;

        submit_argument(
            &f.state,
            request(f.debate.id, f.affirmative, Side::Affirmative, words(60)),
        )
        .await
        .unwrap();
        submit_argument(
            &f.state,
            request(f.debate.id, f.opposition, Side::Opposition, words(60)),
        )
        .await
        .unwrap();

        let debate = f.store.find_debate(f.debate.id).await.unwrap().unwrap();
        assert_eq!(debate.current_turn, Side::Affirmative);
        assert_eq!(debate.current_round, 2);
    }

    #[tokio::test]
    async fn fifty_nine_words_are_rejected_with_the_actual_count() {
        let f = fixture(3, None).await;

        let err = submit_argument(
            &f.state,
            request(f.debate.id, f.affirmative, Side::Affirmative, words(59)),
        )
        .await
        .unwrap_err();

        match err {
            SubmitError::ArgumentTooShort { actual, required } => {
                assert_eq!(actual, 59);
                assert_eq!(required, 60);
            }
            other => panic!("unexpected error {other:?}"),
        }

        // Nothing was persisted and the turn did not advance.
        assert!(
            f.store
                .arguments_by_debate(f.debate.id)
                .await
                .unwrap()
                .is_empty()
        );
        let debate = f.store.find_debate(f.debate.id).await.unwrap().unwrap();
        assert_eq!(debate.current_turn, Side::Affirmative);
    }

    #[tokio::test]
    async fn exactly_sixty_words_are_accepted() {
        let f = fixture(3, None).await;

        submit_argument(
            &f.state,
            request(f.debate.id, f.affirmative, Side::Affirmative, words(60)),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn stale_client_round_is_tolerated() {
        let f = fixture(3, None).await;

        submit_argument(
            &f.state,
            request(f.debate.id, f.affirmative, Side::Affirmative, words(60)),
        )
        .await
        .unwrap();
        submit_argument(
            &f.state,
            request(f.debate.id, f.opposition, Side::Opposition, words(60)),
        )
        .await
        .unwrap();

        // The helper still claims round 1; the server is on round 2 and its
        // counter wins.
        let summary = submit_argument(
            &f.state,
            request(f.debate.id, f.affirmative, Side::Affirmative, words(60)),
        )
        .await
        .unwrap();
        assert_eq!(summary.round, 2);
    }

    #[tokio::test]
    async fn outsiders_cannot_submit() {
        let f = fixture(3, None).await;

        let err = submit_argument(
            &f.state,
            request(f.debate.id, Uuid::new_v4(), Side::Affirmative, words(60)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SubmitError::NotParticipant(_)));
    }

    #[tokio::test]
    async fn declared_side_must_match_assignment() {
        let f = fixture(3, None).await;

        let err = submit_argument(
            &f.state,
            request(f.debate.id, f.affirmative, Side::Opposition, words(60)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SubmitError::SideMismatch));
    }

    #[tokio::test]
    async fn submitting_out_of_turn_fails_regardless_of_content() {
        let f = fixture(3, None).await;

        let err = submit_argument(
            &f.state,
            request(f.debate.id, f.opposition, Side::Opposition, words(200)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SubmitError::NotYourTurn));
    }

    #[tokio::test]
    async fn missing_debate_is_reported() {
        let f = fixture(3, None).await;

        let err = submit_argument(
            &f.state,
            request(Uuid::new_v4(), f.affirmative, Side::Affirmative, words(60)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SubmitError::DebateNotFound(_)));
    }

    async fn assert_completed_with_stats(f: &Fixture) {
        let debate = f.store.find_debate(f.debate.id).await.unwrap().unwrap();
        assert_eq!(debate.status, DebateStatus::Completed);
        assert!(debate.end_time.is_some());
        let winner_id = debate.winner_id.expect("winner recorded");
        let feedback = debate.judging_feedback.expect("feedback recorded");
        assert!(feedback.contains("Key Points for Improvement:"));

        let loser_id = if winner_id == f.affirmative {
            f.opposition
        } else {
            f.affirmative
        };
        let winner = f.store.find_user(winner_id).await.unwrap().unwrap();
        let loser = f.store.find_user(loser_id).await.unwrap().unwrap();
        assert_eq!((winner.wins, winner.losses, winner.points), (1, 0, 20));
        assert_eq!((loser.wins, loser.losses, loser.points), (0, 1, 5));
        assert_eq!(winner.debates, 1);
        assert_eq!(loser.debates, 1);
    }

    #[tokio::test]
    async fn final_submission_judges_and_completes_the_debate() {
        let f = fixture(1, None).await;

        submit_argument(
            &f.state,
            request(f.debate.id, f.affirmative, Side::Affirmative, words(60)),
        )
        .await
        .unwrap();
        submit_argument(
            &f.state,
            request(f.debate.id, f.opposition, Side::Opposition, words(60)),
        )
        .await
        .unwrap();

        assert_completed_with_stats(&f).await;
    }

    /// Judge that always errors, standing in for an unreachable provider.
    struct FailingJudge;

    impl Judge for FailingJudge {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn judge(
            &self,
            _topic_title: &str,
            _affirmative: &[String],
            _opposition: &[String],
        ) -> BoxFuture<'static, JudgeResult<Verdict>> {
            Box::pin(async { Err(JudgeError::Rejected(429)) })
        }
    }

    #[tokio::test]
    async fn debate_completes_even_when_the_primary_judge_fails() {
        let f = fixture(1, Some(Arc::new(FailingJudge))).await;

        submit_argument(
            &f.state,
            request(f.debate.id, f.affirmative, Side::Affirmative, words(60)),
        )
        .await
        .unwrap();
        submit_argument(
            &f.state,
            request(f.debate.id, f.opposition, Side::Opposition, words(60)),
        )
        .await
        .unwrap();

        assert_completed_with_stats(&f).await;
    }

    #[tokio::test]
    async fn completed_debates_reject_further_submissions() {
        let f = fixture(1, None).await;

        submit_argument(
            &f.state,
            request(f.debate.id, f.affirmative, Side::Affirmative, words(60)),
        )
        .await
        .unwrap();
        submit_argument(
            &f.state,
            request(f.debate.id, f.opposition, Side::Opposition, words(60)),
        )
        .await
        .unwrap();

        // After completion the turn points at the affirmative, so the
        // precondition chain falls through to the state machine backstop.
        let err = submit_argument(
            &f.state,
            request(f.debate.id, f.affirmative, Side::Affirmative, words(60)),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Service(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn detail_read_is_side_effect_free() {
        let f = fixture(3, None).await;

        submit_argument(
            &f.state,
            request(f.debate.id, f.affirmative, Side::Affirmative, words(60)),
        )
        .await
        .unwrap();

        let first = debate_detail(&f.state, f.debate.id).await.unwrap();
        let second = debate_detail(&f.state, f.debate.id).await.unwrap();
        assert_eq!(first.arguments.len(), 1);
        assert_eq!(second.arguments.len(), 1);
        assert_eq!(first.current_turn, second.current_turn);
        assert_eq!(first.current_round, second.current_round);
    }
}
