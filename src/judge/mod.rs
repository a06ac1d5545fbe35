//! Verdict providers for completed debates.
//!
//! Providers implement the same [`Judge`] interface so the judgment workflow
//! can walk a chain: the AI-backed primary first, then the templated
//! [`fallback::FallbackJudge`] which never fails. A debate therefore always
//! receives a verdict, even when the external provider is unreachable.

/// Templated verdict provider used when the primary judge is unavailable.
pub mod fallback;
/// Chat-completions backed primary judge.
#[cfg(feature = "openai-judge")]
pub mod openai;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::state::debate::Side;

/// Result alias for judging operations.
pub type JudgeResult<T> = Result<T, JudgeError>;

/// Structured outcome of judging a debate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Side that won the debate.
    pub winner: Side,
    /// Affirmative score, clamped into 1..=100.
    pub affirmative_score: u8,
    /// Opposition score, clamped into 1..=100.
    pub opposition_score: u8,
    /// Overall evaluation of the exchange.
    pub feedback: String,
    /// Explanation of why the winner was chosen.
    pub reasoning: String,
    /// Concrete suggestions for both participants.
    pub improvement_points: Vec<String>,
}

/// Errors raised by judge providers.
///
/// These never surface to debate participants; the workflow absorbs them by
/// moving on to the next provider in the chain.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// The provider could not be reached or timed out.
    #[error("judge provider unreachable: {0}")]
    Unreachable(String),
    /// The provider answered with a non-success status.
    #[error("judge provider rejected the request (status {0})")]
    Rejected(u16),
    /// The provider response could not be decoded into a verdict.
    #[error("judge response could not be decoded: {0}")]
    Decode(String),
    /// No provider is configured.
    #[error("no judge provider configured")]
    NotConfigured,
}

/// A verdict provider. Implementations must be cheap to clone internally so
/// the returned future can own its inputs.
pub trait Judge: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Judge a debate given the topic title and each side's arguments in
    /// round order.
    fn judge(
        &self,
        topic_title: &str,
        affirmative: &[String],
        opposition: &[String],
    ) -> BoxFuture<'static, JudgeResult<Verdict>>;
}

/// Clamp a raw provider score into the storable 1..=100 range.
pub fn clamp_score(raw: i64) -> u8 {
    raw.clamp(1, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_clamp_into_bounds() {
        assert_eq!(clamp_score(150), 100);
        assert_eq!(clamp_score(-5), 1);
        assert_eq!(clamp_score(0), 1);
        assert_eq!(clamp_score(1), 1);
        assert_eq!(clamp_score(100), 100);
        assert_eq!(clamp_score(73), 73);
    }
}
