//! The `Director` seam between the engine's loops and the model.
//!
//! Engine components call these four operations and nothing else; tests
//! implement the trait with a mock so every loop can be driven without a
//! network. [`LlmDirector`] is the production implementation: it renders
//! the prompt, calls the client, and decodes the raw DTO — returning
//! `Err` on any failure so the caller applies its deterministic fallback.

use async_trait::async_trait;
use tracing::debug;

use crate::client::LlmClient;
use crate::error::LlmError;
use crate::prompt;
use crate::types::{
    ChatContext, LlmRequest, RawChat, RawReaction, RawResolve, RawReview, ReactionContext,
    ResolveContext, ReviewContext,
};

/// The four LLM call sites of the boss engine.
#[async_trait]
pub trait Director: Send + Sync {
    /// Decide the outcome of an item/object interaction.
    async fn resolve_interaction(&self, ctx: &ResolveContext) -> Result<RawResolve, LlmError>;

    /// React to a batch of gameplay events.
    async fn react(&self, ctx: &ReactionContext) -> Result<RawReaction, LlmError>;

    /// Grade a finished phase.
    async fn review(&self, ctx: &ReviewContext) -> Result<RawReview, LlmError>;

    /// Answer one terminal message.
    async fn chat(&self, ctx: &ChatContext) -> Result<RawChat, LlmError>;
}

/// Closed-vocabulary lists interpolated into system prompts.
///
/// Supplied by the engine from its domain enums; kept as strings here so
/// this crate stays independent of the domain crate.
#[derive(Debug, Clone)]
pub struct VocabLists {
    /// Comma-separated mood names.
    pub moods: String,
    /// Comma-separated condition names.
    pub states: String,
    /// Comma-separated tag names.
    pub tags: String,
}

/// Production director over an [`LlmClient`].
pub struct LlmDirector {
    client: LlmClient,
    vocab: VocabLists,
    timeout_ms: u64,
}

impl LlmDirector {
    /// Create a director.
    #[must_use]
    pub fn new(client: LlmClient, vocab: VocabLists, timeout_ms: u64) -> Self {
        Self {
            client,
            vocab,
            timeout_ms,
        }
    }

    fn system(&self, template: &str) -> String {
        prompt::render_template(
            template,
            &[
                ("moods", &self.vocab.moods),
                ("states", &self.vocab.states),
                ("tags", &self.vocab.tags),
            ],
        )
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        label: &str,
        system: String,
        user: String,
    ) -> Result<T, LlmError> {
        let request = LlmRequest::new(system, user).with_timeout(self.timeout_ms);
        let response = self.client.generate(&request).await?;
        debug!(
            call = label,
            latency_ms = response.latency_ms,
            model = %response.model,
            "LLM call completed"
        );
        LlmClient::parse_structured(&response)
    }
}

fn join_or(lines: &[String], empty: &str) -> String {
    if lines.is_empty() {
        empty.to_string()
    } else {
        lines.join("\n")
    }
}

fn stats_line(stats: &crate::types::SessionSnapshot) -> String {
    format!(
        "{} credits, {}s on the clock, {} reviews done, past scores {:?}",
        stats.currency, stats.elapsed_secs, stats.phases_completed, stats.review_scores
    )
}

#[async_trait]
impl Director for LlmDirector {
    async fn resolve_interaction(&self, ctx: &ResolveContext) -> Result<RawResolve, LlmError> {
        let user = prompt::render_template(
            prompt::RESOLVE_USER,
            &[
                ("item_name", ctx.item_name.as_deref().unwrap_or("bare hands")),
                ("object_name", &ctx.object_name),
                ("item_tags", &ctx.item_tags.join(", ")),
                ("object_tags", &ctx.object_tags.join(", ")),
                (
                    "object_state",
                    ctx.object_state.as_deref().unwrap_or("in its normal state"),
                ),
            ],
        );
        self.call("resolve", self.system(prompt::RESOLVE_SYSTEM), user)
            .await
    }

    async fn react(&self, ctx: &ReactionContext) -> Result<RawReaction, LlmError> {
        let user = prompt::render_template(
            prompt::REACTION_USER,
            &[
                ("current_mood", &ctx.current_mood),
                ("events", &join_or(&ctx.events, "(nothing notable)")),
                ("world_state", &join_or(&ctx.world_state, "(empty office)")),
                ("current_job", ctx.current_job.as_deref().unwrap_or("none")),
                ("stats", &stats_line(&ctx.stats)),
            ],
        );
        self.call("reaction", self.system(prompt::REACTION_SYSTEM), user)
            .await
    }

    async fn review(&self, ctx: &ReviewContext) -> Result<RawReview, LlmError> {
        let user = prompt::render_template(
            prompt::REVIEW_USER,
            &[
                ("current_mood", &ctx.current_mood),
                ("job_title", &ctx.job_title),
                ("job_description", &ctx.job_description),
                ("object_hints", &ctx.object_hints.join(", ")),
                ("events", &join_or(&ctx.events, "(the employee did nothing)")),
                ("world_state", &join_or(&ctx.world_state, "(empty office)")),
                ("stats", &stats_line(&ctx.stats)),
            ],
        );
        self.call("review", self.system(prompt::REVIEW_SYSTEM), user)
            .await
    }

    async fn chat(&self, ctx: &ChatContext) -> Result<RawChat, LlmError> {
        let history: Vec<String> = ctx
            .history
            .iter()
            .map(|turn| format!("{}: {}", turn.role, turn.text))
            .collect();
        let user = prompt::render_template(
            prompt::CHAT_USER,
            &[
                ("current_mood", &ctx.current_mood),
                ("history", &join_or(&history, "(no prior messages)")),
                (
                    "recent_events",
                    &join_or(&ctx.recent_events, "(nothing notable)"),
                ),
                ("current_job", ctx.current_job.as_deref().unwrap_or("none")),
                ("stats", &stats_line(&ctx.stats)),
                ("message", &ctx.message),
            ],
        );
        self.call("chat", self.system(prompt::CHAT_SYSTEM), user)
            .await
    }
}
