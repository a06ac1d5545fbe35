//! Application-level configuration loading, covering debate rules and judge settings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "AGORA_BACK_CONFIG_PATH";
/// Environment variable holding the judge provider API key.
const JUDGE_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    debate: DebateRules,
    judge: JudgeSettings,
}

/// Rules applied to every debate created by matchmaking.
#[derive(Debug, Clone)]
pub struct DebateRules {
    /// Number of rounds each debate runs before judging.
    pub max_rounds: u32,
    /// Seconds granted to each participant per turn.
    pub time_per_turn_secs: u32,
    /// Minimum whitespace-delimited word count for an argument.
    pub min_argument_words: usize,
    /// Number of background variants clients can render (indices 1..=count).
    pub background_count: u8,
    /// How many recent debates per user are inspected for topic exclusion.
    pub recent_topic_window: usize,
}

/// Settings for the external judging provider.
#[derive(Debug, Clone)]
pub struct JudgeSettings {
    /// Base URL of the chat-completions API.
    pub api_base: String,
    /// Model identifier sent with every judging request.
    pub model: String,
    /// Upper bound for a single judging call before falling back.
    pub timeout: Duration,
    /// API key read from the environment; judging degrades to the fallback
    /// provider when absent.
    pub api_key: Option<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration from file");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.judge.api_key = env::var(JUDGE_API_KEY_ENV).ok().filter(|k| !k.is_empty());
        config
    }

    /// Rules applied to debates created by matchmaking.
    pub fn debate(&self) -> &DebateRules {
        &self.debate
    }

    /// Settings for the primary judging provider.
    pub fn judge(&self) -> &JudgeSettings {
        &self.judge
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debate: DebateRules::default(),
            judge: JudgeSettings::default(),
        }
    }
}

impl Default for DebateRules {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            time_per_turn_secs: 300,
            min_argument_words: 60,
            background_count: 4,
            recent_topic_window: 5,
        }
    }
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".into(),
            model: "gpt-4o".into(),
            timeout: Duration::from_secs(30),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    debate: RawDebateRules,
    #[serde(default)]
    judge: RawJudgeSettings,
}

#[derive(Debug, Default, Deserialize)]
struct RawDebateRules {
    max_rounds: Option<u32>,
    time_per_turn_secs: Option<u32>,
    min_argument_words: Option<usize>,
    background_count: Option<u8>,
    recent_topic_window: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawJudgeSettings {
    api_base: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            debate: DebateRules {
                max_rounds: value.debate.max_rounds.unwrap_or(defaults.debate.max_rounds),
                time_per_turn_secs: value
                    .debate
                    .time_per_turn_secs
                    .unwrap_or(defaults.debate.time_per_turn_secs),
                min_argument_words: value
                    .debate
                    .min_argument_words
                    .unwrap_or(defaults.debate.min_argument_words),
                background_count: value
                    .debate
                    .background_count
                    .unwrap_or(defaults.debate.background_count),
                recent_topic_window: value
                    .debate
                    .recent_topic_window
                    .unwrap_or(defaults.debate.recent_topic_window),
            },
            judge: JudgeSettings {
                api_base: value.judge.api_base.unwrap_or(defaults.judge.api_base),
                model: value.judge.model.unwrap_or(defaults.judge.model),
                timeout: value
                    .judge
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.judge.timeout),
                api_key: None,
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
