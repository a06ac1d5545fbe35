use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    config::JudgeSettings,
    judge::{Judge, JudgeError, JudgeResult, Verdict, clamp_score},
    state::debate::Side,
};

/// Instructions given to the model before the debate transcript.
const SYSTEM_PROMPT: &str = "You are an experienced debate judge. Evaluate the debate \
    strictly on logical reasoning and evidence quality first, then on engagement with the \
    topic, rebuttal effectiveness, and clarity. Nonsensical, off-topic, or single-phrase \
    arguments lose automatically. Score each side from 1 to 100, pick a winner, and write \
    a detailed evaluation with concrete examples from the arguments. Vary your feedback \
    style between debates. Respond in JSON with this exact structure: \
    {\"winner\": \"affirmative\" or \"opposition\", \
    \"score\": {\"affirmative\": number, \"opposition\": number}, \
    \"feedback\": string, \"reasoning\": string, \
    \"improvement_points\": [3-6 strings]}";

/// Primary verdict provider backed by an OpenAI-compatible chat-completions API.
#[derive(Clone)]
pub struct OpenAiJudge {
    client: Client,
    api_base: Arc<str>,
    api_key: Arc<str>,
    model: Arc<str>,
}

impl OpenAiJudge {
    /// Build a judge from the runtime settings.
    ///
    /// Fails with [`JudgeError::NotConfigured`] when no API key is present,
    /// in which case the workflow runs on the fallback provider alone.
    pub fn from_settings(settings: &JudgeSettings) -> JudgeResult<Self> {
        let api_key = settings.api_key.as_deref().ok_or(JudgeError::NotConfigured)?;

        // The client-level timeout is the caller-visible bound on a judging
        // call; hitting it feeds the fallback provider.
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| JudgeError::Unreachable(err.to_string()))?;

        Ok(Self {
            client,
            api_base: Arc::from(settings.api_base.trim_end_matches('/')),
            api_key: Arc::from(api_key),
            model: Arc::from(settings.model.as_str()),
        })
    }

    async fn request_verdict(self, prompt: String) -> JudgeResult<Verdict> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = ChatRequest {
            model: self.model.as_ref(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.as_ref())
            .json(&body)
            .send()
            .await
            .map_err(|err| JudgeError::Unreachable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // Quota and rate-limit rejections land here as well; callers
            // degrade to the fallback verdict either way.
            return Err(JudgeError::Rejected(status.as_u16()));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|err| JudgeError::Decode(err.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| JudgeError::Decode("completion contained no choices".into()))?;

        let raw: RawVerdict = serde_json::from_str(&content)
            .map_err(|err| JudgeError::Decode(err.to_string()))?;

        raw.try_into()
    }
}

impl Judge for OpenAiJudge {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn judge(
        &self,
        topic_title: &str,
        affirmative: &[String],
        opposition: &[String],
    ) -> BoxFuture<'static, JudgeResult<Verdict>> {
        let judge = self.clone();
        let prompt = build_prompt(topic_title, affirmative, opposition);
        Box::pin(async move { judge.request_verdict(prompt).await })
    }
}

/// Render the debate transcript into the user message sent to the model.
fn build_prompt(topic_title: &str, affirmative: &[String], opposition: &[String]) -> String {
    format!(
        "DEBATE TOPIC: {topic_title}\n\nAFFIRMATIVE ARGUMENTS:\n{}\n\nOPPOSITION ARGUMENTS:\n{}\n\n\
         Judge this debate and determine the winner.",
        affirmative.join("\n\n"),
        opposition.join("\n\n"),
    )
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Verdict exactly as the model emits it, before clamping and validation.
#[derive(Deserialize)]
struct RawVerdict {
    winner: String,
    score: RawScore,
    feedback: String,
    reasoning: String,
    #[serde(default)]
    improvement_points: Vec<String>,
}

#[derive(Deserialize)]
struct RawScore {
    affirmative: i64,
    opposition: i64,
}

impl TryFrom<RawVerdict> for Verdict {
    type Error = JudgeError;

    fn try_from(raw: RawVerdict) -> Result<Self, Self::Error> {
        let winner = match raw.winner.as_str() {
            "affirmative" => Side::Affirmative,
            "opposition" => Side::Opposition,
            other => {
                return Err(JudgeError::Decode(format!(
                    "unexpected winner value `{other}`"
                )));
            }
        };

        Ok(Verdict {
            winner,
            affirmative_score: clamp_score(raw.score.affirmative),
            opposition_score: clamp_score(raw.score.opposition),
            feedback: raw.feedback,
            reasoning: raw.reasoning,
            improvement_points: raw.improvement_points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_verdict_scores_are_clamped() {
        let raw = RawVerdict {
            winner: "affirmative".into(),
            score: RawScore {
                affirmative: 150,
                opposition: -5,
            },
            feedback: "f".into(),
            reasoning: "r".into(),
            improvement_points: vec![],
        };

        let verdict: Verdict = raw.try_into().unwrap();
        assert_eq!(verdict.winner, Side::Affirmative);
        assert_eq!(verdict.affirmative_score, 100);
        assert_eq!(verdict.opposition_score, 1);
    }

    #[test]
    fn unknown_winner_is_a_decode_error() {
        let raw = RawVerdict {
            winner: "draw".into(),
            score: RawScore {
                affirmative: 70,
                opposition: 70,
            },
            feedback: "f".into(),
            reasoning: "r".into(),
            improvement_points: vec![],
        };

        assert!(matches!(
            Verdict::try_from(raw),
            Err(JudgeError::Decode(_))
        ));
    }

    #[test]
    fn prompt_contains_both_sides_in_order() {
        let prompt = build_prompt(
            "Should AI be regulated?",
            &["first aff".into(), "second aff".into()],
            &["first opp".into()],
        );

        assert!(prompt.contains("DEBATE TOPIC: Should AI be regulated?"));
        let aff_index = prompt.find("first aff").unwrap();
        let opp_index = prompt.find("first opp").unwrap();
        assert!(aff_index < opp_index);
    }
}
