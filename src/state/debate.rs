use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::dao::models::DebateEntity;

/// A debate participant's assigned role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Argues in favour of the motion; always opens a round.
    Affirmative,
    /// Argues against the motion; always closes a round.
    Opposition,
}

impl Side {
    /// The side that speaks after this one.
    pub fn opponent(self) -> Side {
        match self {
            Side::Affirmative => Side::Opposition,
            Side::Opposition => Side::Affirmative,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Affirmative => write!(f, "affirmative"),
            Side::Opposition => write!(f, "opposition"),
        }
    }
}

/// Lifecycle states a debate row moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DebateStatus {
    /// Created but not yet opened. Unused by matchmaking, which opens
    /// debates directly into [`DebateStatus::Active`].
    Pending,
    /// Participants are exchanging arguments.
    Active,
    /// All rounds exhausted; a verdict is being produced.
    Judging,
    /// Verdict recorded. Terminal; the row is immutable from here on.
    Completed,
}

/// High-level phases of the per-debate state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebatePhase {
    /// Debate exists but has not been opened.
    Pending,
    /// Arguments are being exchanged; `turn` names the side expected to
    /// speak next and `round` the exchange currently in progress.
    Active {
        /// Side whose turn it is.
        turn: Side,
        /// Current round, starting at 1.
        round: u32,
    },
    /// Rounds are exhausted and the verdict workflow owns the debate. The
    /// counters keep their last computed values; they carry no further
    /// meaning in this phase.
    Judging {
        /// Turn as last computed by the final flip.
        turn: Side,
        /// Round as last computed (always `max_rounds + 1`).
        round: u32,
    },
    /// Verdict recorded; no event leaves this phase.
    Completed,
}

/// Events that can be applied to the debate state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebateEvent {
    /// Open a pending debate into its first round.
    Opened,
    /// An argument from `side` passed validation and was persisted.
    ArgumentAccepted {
        /// Side the accepted argument was submitted for.
        side: Side,
    },
    /// The judgment workflow produced and stored a verdict.
    VerdictRecorded,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: DebatePhase,
    /// The event that cannot be applied from this phase.
    pub event: DebateEvent,
}

/// State machine owning turn and round progression for a single debate.
///
/// The machine is rebuilt from the persisted row for every submission and
/// validates all transitions centrally; callers persist the resulting phase
/// only after a transition has been accepted.
#[derive(Debug, Clone)]
pub struct DebateMachine {
    phase: DebatePhase,
    max_rounds: u32,
}

impl DebateMachine {
    /// Create a machine already opened into round 1 with the affirmative
    /// side to speak, matching how matchmaking creates debates.
    pub fn open(max_rounds: u32) -> Self {
        Self {
            phase: DebatePhase::Active {
                turn: Side::Affirmative,
                round: 1,
            },
            max_rounds,
        }
    }

    /// Rebuild the machine from a persisted debate row.
    pub fn from_entity(debate: &DebateEntity) -> Self {
        let phase = match debate.status {
            DebateStatus::Pending => DebatePhase::Pending,
            DebateStatus::Active => DebatePhase::Active {
                turn: debate.current_turn,
                round: debate.current_round,
            },
            DebateStatus::Judging => DebatePhase::Judging {
                turn: debate.current_turn,
                round: debate.current_round,
            },
            DebateStatus::Completed => DebatePhase::Completed,
        };

        Self {
            phase,
            max_rounds: debate.max_rounds,
        }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> DebatePhase {
        self.phase.clone()
    }

    /// Apply an event, moving the machine to the next phase.
    pub fn advance(&mut self, event: DebateEvent) -> Result<DebatePhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next.clone();
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: DebateEvent) -> Result<DebatePhase, InvalidTransition> {
        let next = match (self.phase.clone(), event) {
            (DebatePhase::Pending, DebateEvent::Opened) => DebatePhase::Active {
                turn: Side::Affirmative,
                round: 1,
            },
            (DebatePhase::Active { turn, round }, DebateEvent::ArgumentAccepted { side })
                if side == turn =>
            {
                let next_turn = side.opponent();
                // The round counter advances only once both sides have
                // spoken, i.e. on the opposition -> affirmative flip.
                let next_round = match side {
                    Side::Opposition => round + 1,
                    Side::Affirmative => round,
                };

                if next_round > self.max_rounds {
                    DebatePhase::Judging {
                        turn: next_turn,
                        round: next_round,
                    }
                } else {
                    DebatePhase::Active {
                        turn: next_turn,
                        round: next_round,
                    }
                }
            }
            (DebatePhase::Judging { .. }, DebateEvent::VerdictRecorded) => DebatePhase::Completed,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance(machine: &mut DebateMachine, side: Side) -> DebatePhase {
        machine
            .advance(DebateEvent::ArgumentAccepted { side })
            .unwrap()
    }

    #[test]
    fn opens_into_round_one_affirmative() {
        let machine = DebateMachine::open(3);
        assert_eq!(
            machine.phase(),
            DebatePhase::Active {
                turn: Side::Affirmative,
                round: 1
            }
        );
    }

    #[test]
    fn full_three_round_progression() {
        let mut machine = DebateMachine::open(3);

        for round in 1..=3u32 {
            assert_eq!(
                advance(&mut machine, Side::Affirmative),
                DebatePhase::Active {
                    turn: Side::Opposition,
                    round
                }
            );

            let after_opposition = advance(&mut machine, Side::Opposition);
            if round < 3 {
                assert_eq!(
                    after_opposition,
                    DebatePhase::Active {
                        turn: Side::Affirmative,
                        round: round + 1
                    }
                );
            } else {
                assert_eq!(
                    after_opposition,
                    DebatePhase::Judging {
                        turn: Side::Affirmative,
                        round: 4
                    }
                );
            }
        }

        assert_eq!(
            machine.advance(DebateEvent::VerdictRecorded).unwrap(),
            DebatePhase::Completed
        );
    }

    #[test]
    fn single_round_debate_reaches_judging_after_two_arguments() {
        let mut machine = DebateMachine::open(1);

        assert_eq!(
            advance(&mut machine, Side::Affirmative),
            DebatePhase::Active {
                turn: Side::Opposition,
                round: 1
            }
        );
        assert_eq!(
            advance(&mut machine, Side::Opposition),
            DebatePhase::Judging {
                turn: Side::Affirmative,
                round: 2
            }
        );
    }

    #[test]
    fn round_never_exceeds_max_while_active() {
        let mut machine = DebateMachine::open(2);

        loop {
            match machine.phase() {
                DebatePhase::Active { turn, round } => {
                    assert!(round <= 2);
                    advance(&mut machine, turn);
                }
                DebatePhase::Judging { .. } => break,
                other => panic!("unexpected phase {other:?}"),
            }
        }
    }

    #[test]
    fn out_of_turn_argument_is_rejected() {
        let mut machine = DebateMachine::open(3);
        let err = machine
            .advance(DebateEvent::ArgumentAccepted {
                side: Side::Opposition,
            })
            .unwrap_err();

        assert_eq!(
            err.from,
            DebatePhase::Active {
                turn: Side::Affirmative,
                round: 1
            }
        );
    }

    #[test]
    fn completed_is_terminal() {
        let mut machine = DebateMachine::open(1);
        advance(&mut machine, Side::Affirmative);
        advance(&mut machine, Side::Opposition);
        machine.advance(DebateEvent::VerdictRecorded).unwrap();

        for event in [
            DebateEvent::Opened,
            DebateEvent::ArgumentAccepted {
                side: Side::Affirmative,
            },
            DebateEvent::VerdictRecorded,
        ] {
            assert!(machine.advance(event).is_err());
        }
    }

    #[test]
    fn verdict_cannot_be_recorded_while_active() {
        let mut machine = DebateMachine::open(3);
        let err = machine.advance(DebateEvent::VerdictRecorded).unwrap_err();
        assert_eq!(err.event, DebateEvent::VerdictRecorded);
    }

    #[test]
    fn pending_debate_opens() {
        let mut machine = DebateMachine {
            phase: DebatePhase::Pending,
            max_rounds: 3,
        };

        assert_eq!(
            machine.advance(DebateEvent::Opened).unwrap(),
            DebatePhase::Active {
                turn: Side::Affirmative,
                round: 1
            }
        );
    }
}
