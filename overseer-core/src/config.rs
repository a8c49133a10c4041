//! Configuration for the Overseer engine.
//!
//! Maps directly to `overseer.toml`. Every field has a serde default so a
//! partial file (or none at all) yields a playable configuration.

use serde::{Deserialize, Serialize};

use crate::ratelimit::RateLimitConfig;

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverseerConfig {
    /// Reaction loop trigger policy.
    #[serde(default)]
    pub reaction: ReactionConfig,
    /// Phase/review lifecycle timing.
    #[serde(default)]
    pub phase: PhaseConfig,
    /// Terminal chat settings.
    #[serde(default)]
    pub chat: ChatConfig,
    /// Per-endpoint rate-limit budgets.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// LLM backend settings.
    #[serde(default)]
    pub llm: LlmSettings,
}

impl OverseerConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `CoreError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::CoreError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

/// Reaction loop trigger policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionConfig {
    /// How often the loop polls the global log.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Event count that triggers a fire regardless of elapsed time.
    #[serde(default = "default_min_events")]
    pub min_events: usize,
    /// Milliseconds since the last fire that trigger one regardless of count.
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
    /// How long ordinary speech stays on screen.
    #[serde(default = "default_speech_secs")]
    pub speech_secs: u64,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            min_events: 5,
            max_interval_ms: 30_000,
            speech_secs: 6,
        }
    }
}

/// Phase/review lifecycle timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Working time per phase, in seconds.
    #[serde(default = "default_work_secs")]
    pub work_secs: u64,
    /// Delay between a review's speech and the next job assignment.
    #[serde(default = "default_review_delay_secs")]
    pub review_display_delay_secs: u64,
    /// Total session length before an unconditional TIME_UP, in seconds.
    #[serde(default = "default_session_limit_secs")]
    pub session_limit_secs: u64,
    /// How long major (title-bearing) speech stays on screen.
    #[serde(default = "default_major_speech_secs")]
    pub major_speech_secs: u64,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            work_secs: 180,
            review_display_delay_secs: 6,
            session_limit_secs: 1_800,
            major_speech_secs: 12,
        }
    }
}

/// Terminal chat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Currency deducted per message, before the call.
    #[serde(default = "default_message_cost")]
    pub message_cost: i64,
    /// Conversation turns embedded in each request.
    #[serde(default = "default_history_len")]
    pub history_len: usize,
    /// Recent gameplay events embedded in each request.
    #[serde(default = "default_recent_events")]
    pub recent_events: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            message_cost: 5,
            history_len: 10,
            recent_events: 15,
        }
    }
}

/// Per-endpoint-class rate-limit budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Interaction resolution budget.
    #[serde(default = "default_resolve_limit")]
    pub resolve: RateLimitConfig,
    /// Reaction loop budget.
    #[serde(default = "default_reaction_limit")]
    pub reaction: RateLimitConfig,
    /// Phase review budget.
    #[serde(default = "default_review_limit")]
    pub review: RateLimitConfig,
    /// Terminal chat budget.
    #[serde(default = "default_chat_limit")]
    pub chat: RateLimitConfig,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            resolve: default_resolve_limit(),
            reaction: default_reaction_limit(),
            review: default_review_limit(),
            chat: default_chat_limit(),
        }
    }
}

/// LLM backend settings, consumed by the engine when it builds the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Backend kind: `"ollama"`, `"openai"`, or `"none"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Backend base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key for OpenAI-compatible backends.
    #[serde(default)]
    pub api_key: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Retry attempts beyond the first.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            max_retries: default_max_retries(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    2_000
}
fn default_min_events() -> usize {
    5
}
fn default_max_interval_ms() -> u64 {
    30_000
}
fn default_speech_secs() -> u64 {
    6
}
fn default_work_secs() -> u64 {
    180
}
fn default_review_delay_secs() -> u64 {
    6
}
fn default_session_limit_secs() -> u64 {
    1_800
}
fn default_major_speech_secs() -> u64 {
    12
}
fn default_message_cost() -> i64 {
    5
}
fn default_history_len() -> usize {
    10
}
fn default_recent_events() -> usize {
    15
}
fn default_resolve_limit() -> RateLimitConfig {
    RateLimitConfig::new(10, 60_000)
}
fn default_reaction_limit() -> RateLimitConfig {
    RateLimitConfig::new(12, 60_000)
}
fn default_review_limit() -> RateLimitConfig {
    RateLimitConfig::new(6, 60_000)
}
fn default_chat_limit() -> RateLimitConfig {
    RateLimitConfig::new(8, 60_000)
}
fn default_provider() -> String {
    "ollama".to_string()
}
fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "llama3.1:8b".to_string()
}
fn default_max_retries() -> u32 {
    1
}
fn default_timeout_ms() -> u64 {
    10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = OverseerConfig::from_toml("").expect("parse");
        assert_eq!(config.reaction.min_events, 5);
        assert_eq!(config.phase.work_secs, 180);
        assert_eq!(config.chat.message_cost, 5);
        assert_eq!(config.limits.chat.max_requests, 8);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let toml_str = r#"
            [reaction]
            min_events = 3

            [llm]
            provider = "none"
        "#;
        let config = OverseerConfig::from_toml(toml_str).expect("parse");
        assert_eq!(config.reaction.min_events, 3);
        assert_eq!(config.reaction.max_interval_ms, 30_000);
        assert_eq!(config.llm.provider, "none");
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        assert!(OverseerConfig::from_toml("reaction = 'nope").is_err());
    }
}
