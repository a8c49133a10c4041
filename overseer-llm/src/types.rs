//! Request contexts and raw wire DTOs for the four LLM call sites.
//!
//! Response shapes are deliberately string-typed: the model is untrusted
//! input, so mood names, conditions, tags, and `game_end` values travel as
//! raw strings here and are coerced into the closed vocabularies on the
//! engine side before touching shared state.

use serde::{Deserialize, Serialize};

/// A request to the LLM.
#[derive(Debug, Clone, Serialize)]
pub struct LlmRequest {
    /// System prompt (the Jacobs persona and output contract).
    pub system: String,
    /// User prompt (context, events, instructions).
    pub user: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl LlmRequest {
    /// Create a request with the default generation settings.
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: 300,
            temperature: 0.8,
            timeout_ms: 10_000,
        }
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// A response from the LLM.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmResponse {
    /// The generated text.
    pub text: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Which model was used.
    pub model: String,
}

// ---------------------------------------------------------------------------
// Call contexts (engine → model)
// ---------------------------------------------------------------------------

/// Player-visible running totals embedded in prompts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSnapshot {
    /// Player currency balance.
    pub currency: i64,
    /// In-game seconds elapsed.
    pub elapsed_secs: u64,
    /// Reviews completed so far.
    pub phases_completed: u32,
    /// Past review scores, oldest first.
    pub review_scores: Vec<u8>,
}

/// Context for an interaction resolve call. Names must already be
/// sanitized by the caller-facing path before they reach a prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveContext {
    /// Item used, or `None` for bare hands.
    pub item_name: Option<String>,
    /// Object acted on.
    pub object_name: String,
    /// Item tag names.
    pub item_tags: Vec<String>,
    /// Object tag names.
    pub object_tags: Vec<String>,
    /// Current object condition name, if any.
    pub object_state: Option<String>,
}

/// Context for a reaction call.
#[derive(Debug, Clone, Serialize)]
pub struct ReactionContext {
    /// Drained event summaries, oldest first.
    pub events: Vec<String>,
    /// Current mood name.
    pub current_mood: String,
    /// World object descriptions.
    pub world_state: Vec<String>,
    /// Current job summary, if a phase is active.
    pub current_job: Option<String>,
    /// Session totals.
    pub stats: SessionSnapshot,
}

/// Context for a phase review call.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewContext {
    /// Phase event summaries, oldest first.
    pub events: Vec<String>,
    /// Title of the assigned job.
    pub job_title: String,
    /// Description of the assigned job.
    pub job_description: String,
    /// Objects the job pointed at.
    pub object_hints: Vec<String>,
    /// Current mood name.
    pub current_mood: String,
    /// World object descriptions.
    pub world_state: Vec<String>,
    /// Session totals.
    pub stats: SessionSnapshot,
}

/// One prior conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// `"player"` or `"jacobs"`.
    pub role: String,
    /// What was said.
    pub text: String,
}

/// Context for a terminal chat call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatContext {
    /// The player's message (sanitized).
    pub message: String,
    /// Bounded recent conversation, oldest first.
    pub history: Vec<ChatTurn>,
    /// Current mood name.
    pub current_mood: String,
    /// Recent gameplay event summaries.
    pub recent_events: Vec<String>,
    /// Current job summary, if a phase is active.
    pub current_job: Option<String>,
    /// Session totals.
    pub stats: SessionSnapshot,
}

// ---------------------------------------------------------------------------
// Raw wire DTOs (model → engine)
// ---------------------------------------------------------------------------

/// Raw resolve output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawResolve {
    /// New object condition name, or null.
    #[serde(default)]
    pub result_state: Option<String>,
    /// Produced item name, or null.
    #[serde(default)]
    pub output_item: Option<String>,
    /// Produced item tag names, or null.
    #[serde(default)]
    pub output_item_tags: Option<Vec<String>>,
    /// Player-facing description of what happened.
    #[serde(default)]
    pub description: String,
}

/// One world effect requested by a reaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEffect {
    /// Effect type; only `"CHANGE_STATE"` is recognized.
    #[serde(rename = "type", default)]
    pub effect_type: String,
    /// Display name of the target object.
    #[serde(default, alias = "targetName")]
    pub target_name: String,
    /// New condition name.
    #[serde(default, alias = "newState")]
    pub new_state: String,
}

/// Raw reaction output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReaction {
    /// What Jacobs says.
    #[serde(default)]
    pub speech: String,
    /// Proposed mood name.
    #[serde(default)]
    pub mood: String,
    /// `"NONE"` or an end type.
    #[serde(default)]
    pub game_end: String,
    /// Requested world effects.
    #[serde(default)]
    pub effects: Vec<RawEffect>,
}

/// Raw review output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReview {
    /// What Jacobs says about the work.
    #[serde(default)]
    pub speech: String,
    /// Raw score; clamped to 0..=10 by the engine.
    #[serde(default)]
    pub score: i64,
    /// Proposed mood name.
    #[serde(default)]
    pub mood: String,
    /// `"NONE"` or an end type.
    #[serde(default)]
    pub game_end: String,
}

/// Raw chat output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawChat {
    /// Jacobs' reply.
    #[serde(default)]
    pub reply: String,
    /// Proposed mood name.
    #[serde(default)]
    pub mood: String,
    /// `"NONE"` or an end type.
    #[serde(default)]
    pub game_end: String,
}
