use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::BoxFuture;
use rand::Rng;

use crate::judge::{Judge, JudgeResult, Verdict};
use crate::state::debate::Side;

/// Inclusive bounds for synthesized scores.
const SCORE_RANGE: std::ops::RangeInclusive<u8> = 60..=99;

/// Pre-written evaluation used when no provider verdict is available.
struct Template {
    feedback: &'static str,
    reasoning: &'static str,
    improvement_points: &'static [&'static str],
}

/// Rotation of templates so consecutive fallback verdicts do not read
/// identically.
const TEMPLATES: [Template; 3] = [
    Template {
        feedback: "Both participants engaged seriously with the motion across every round. \
            The affirmative built its case progressively, anchoring each new claim to the \
            framework established in the opening argument, while the opposition focused on \
            probing the assumptions underneath that framework and offering alternative \
            readings of the evidence. The exchanges stayed on topic throughout, and each \
            side showed awareness of the other's strongest material rather than arguing \
            past it. Some promising lines of reasoning were left underdeveloped in the \
            later rounds, but the overall standard of engagement was solid on both sides.",
        reasoning: "The winning side maintained a tighter connection between its individual \
            arguments and its overall position, which made the case easier to follow and \
            harder to dislodge. Its rebuttals addressed the opponent's central claims \
            directly instead of peripheral details, and its conclusions followed from \
            stated premises rather than assertion. The losing side presented capable \
            individual points but relied more often on claims that needed further support.",
        improvement_points: &[
            "Signpost the structure of your case early and refer back to it so each new argument lands in context.",
            "When citing evidence, spell out the link between the evidence and the conclusion you draw from it.",
            "Engage the strongest version of your opponent's position before critiquing it.",
            "Develop fewer arguments in more depth rather than touching many points briefly.",
            "Use concrete examples to ground abstract claims.",
        ],
    },
    Template {
        feedback: "This was a closely matched exchange in which both sides demonstrated \
            preparation and genuine engagement with the motion. The affirmative was most \
            effective when tying practical consequences back to its guiding principle, and \
            the opposition scored its best points by isolating specific claims for targeted \
            critique and proposing an alternative framing of the question. Both debaters \
            adapted as the rounds progressed instead of restating prepared material, which \
            kept the later rounds substantive. Each side occasionally missed a chance to \
            capitalise on a concession made by the other.",
        reasoning: "The decisive difference was strategic focus. The winning side kept the \
            debate centred on the questions where its position was strongest and answered \
            the opponent's best material head-on. Its case read as a single connected \
            argument rather than a list of points. The losing side showed comparable \
            skill in individual rounds but spread its attention across too many fronts to \
            build the same cumulative weight.",
        improvement_points: &[
            "Identify the two or three questions the debate actually turns on and keep returning to them.",
            "Make the implicit assumptions in your opponent's case explicit before attacking them.",
            "When you concede a point, say what your position loses and why it survives anyway.",
            "Close each round by stating what the exchange so far has established.",
            "Practise rebuttals against the strongest counter-argument you can construct, not the weakest.",
        ],
    },
    Template {
        feedback: "Both sides treated the motion with the depth it deserved. The \
            affirmative established clear criteria for evaluating the question early on \
            and applied them consistently, which gave its case a stable spine. The \
            opposition challenged those criteria rather than merely contesting individual \
            facts, and introduced perspectives that genuinely reframed parts of the \
            debate. The result was a discussion that developed over the rounds instead of \
            circling. Neither side fully exploited the openings the other left, and both \
            would benefit from tying their closing rounds back to their opening \
            commitments more explicitly.",
        reasoning: "The winner earned the decision through consistency: its evaluative \
            framework, evidence, and rebuttals pulled in the same direction from first \
            round to last. Where the opponent raised a strong objection, it was answered \
            within that framework rather than deflected. The losing side produced several \
            sharp individual arguments but allowed tension between its earlier and later \
            positions to go unaddressed.",
        improvement_points: &[
            "State up front how you think the debate should be judged, and argue to that standard.",
            "Track your own earlier claims so later rounds reinforce rather than contradict them.",
            "Respond to objections inside your own framework instead of changing the subject.",
            "Vary your rhetorical approach: analogies and worked scenarios can carry abstract points.",
            "Budget preparation time for anticipating the opponent's best case, not just building yours.",
        ],
    },
];

/// Judge of last resort: synthesizes a verdict locally.
///
/// The winner is a uniform coin flip, scores are drawn from a bounded range,
/// and the textual evaluation rotates through [`TEMPLATES`] so repeated
/// fallbacks stay readable. The rotation cursor is provider state, advancing
/// once per verdict.
pub struct FallbackJudge {
    cursor: AtomicUsize,
}

impl FallbackJudge {
    /// Create a fallback judge starting at the first template.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a fallback judge with the rotation cursor at `index`; useful
    /// for deterministic template selection in tests.
    pub fn starting_at(index: usize) -> Self {
        Self {
            cursor: AtomicUsize::new(index),
        }
    }

    /// Synthesize a verdict. Infallible, unlike the [`Judge`] trait surface.
    pub fn render(&self) -> Verdict {
        let template = &TEMPLATES[self.cursor.fetch_add(1, Ordering::Relaxed) % TEMPLATES.len()];
        let mut rng = rand::rng();

        let winner = if rng.random_bool(0.5) {
            Side::Affirmative
        } else {
            Side::Opposition
        };

        Verdict {
            winner,
            affirmative_score: rng.random_range(SCORE_RANGE),
            opposition_score: rng.random_range(SCORE_RANGE),
            feedback: template.feedback.to_string(),
            reasoning: template.reasoning.to_string(),
            improvement_points: template
                .improvement_points
                .iter()
                .map(|point| point.to_string())
                .collect(),
        }
    }
}

impl Default for FallbackJudge {
    fn default() -> Self {
        Self::new()
    }
}

impl Judge for FallbackJudge {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn judge(
        &self,
        _topic_title: &str,
        _affirmative: &[String],
        _opposition: &[String],
    ) -> BoxFuture<'static, JudgeResult<Verdict>> {
        let verdict = self.render();
        Box::pin(async move { Ok(verdict) })
    }
}
