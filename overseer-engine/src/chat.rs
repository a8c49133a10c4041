//! The terminal chat channel.
//!
//! Each message costs currency up front, the deduction stands even when
//! the model falls over, and the reply can move the mood or end the
//! session just like a reaction. History is bounded and per-session.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, warn};

use overseer_core::config::ChatConfig;
use overseer_core::events::{EventHub, EventKind, GameplayEvent};
use overseer_core::mood::Mood;
use overseer_core::ratelimit::{RateLimitConfig, RateLimiter};
use overseer_core::session::GameEnd;
use overseer_llm::sanitize::sanitize;
use overseer_llm::types::{ChatContext, ChatTurn};
use overseer_llm::Director;

use crate::state::{
    to_snapshot, JobBoard, Ledger, MoodStore, ScoreEntry, ScoreSink, SessionHandle,
};
use crate::validate::{fallback_chat, validate_chat};

const PLAYER_ROLE: &str = "player";
const BOSS_ROLE: &str = "jacobs";

/// Why a message was not sent.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Balance below the per-message cost. Nothing was deducted.
    #[error("message costs {cost} but balance is {balance}")]
    InsufficientFunds {
        /// Per-message cost.
        cost: i64,
        /// Current balance.
        balance: i64,
    },
    /// Over the chat budget. Nothing was deducted.
    #[error("chat rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited {
        /// Whole seconds until the window resets.
        retry_after_secs: u64,
    },
    /// The session already ended.
    #[error("session is over")]
    SessionOver,
}

/// A delivered reply.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// What Jacobs wrote back.
    pub reply: String,
    /// Mood after the exchange.
    pub mood: Mood,
    /// Set when this exchange ended the session.
    pub ended: Option<GameEnd>,
}

/// The terminal chat endpoint. One instance per session.
pub struct TerminalChat {
    config: ChatConfig,
    limit: RateLimitConfig,
    limiter: Mutex<RateLimiter>,
    history: Mutex<VecDeque<ChatTurn>>,
    director: Arc<dyn Director>,
    hub: Arc<EventHub>,
    mood: Arc<MoodStore>,
    session: Arc<SessionHandle>,
    job: Arc<JobBoard>,
    ledger: Arc<Ledger>,
    sink: Arc<dyn ScoreSink>,
}

/// Constructor dependencies.
pub struct ChatDeps {
    /// Chat settings.
    pub config: ChatConfig,
    /// Chat budget.
    pub limit: RateLimitConfig,
    /// The model seam.
    pub director: Arc<dyn Director>,
    /// Event hub; chat messages are gameplay events too.
    pub hub: Arc<EventHub>,
    /// Mood handle.
    pub mood: Arc<MoodStore>,
    /// Session handle.
    pub session: Arc<SessionHandle>,
    /// Current job, embedded in prompts.
    pub job: Arc<JobBoard>,
    /// Currency and stats.
    pub ledger: Arc<Ledger>,
    /// Leaderboard port.
    pub sink: Arc<dyn ScoreSink>,
}

impl TerminalChat {
    /// Build the chat endpoint with empty history.
    #[must_use]
    pub fn new(deps: ChatDeps) -> Self {
        Self {
            config: deps.config,
            limit: deps.limit,
            limiter: Mutex::new(RateLimiter::new()),
            history: Mutex::new(VecDeque::new()),
            director: deps.director,
            hub: deps.hub,
            mood: deps.mood,
            session: deps.session,
            job: deps.job,
            ledger: deps.ledger,
            sink: deps.sink,
        }
    }

    /// Send one message as `caller` (the rate-limit identity).
    ///
    /// The cost is deducted before the call and is not refunded on a
    /// model failure; the player pays for Jacobs' attention, not his
    /// eloquence.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when the session is over, the caller is over
    /// budget, or the balance does not cover the cost. None of these
    /// deduct currency.
    pub async fn send(
        &self,
        message: &str,
        caller: &str,
        now_ms: u64,
    ) -> Result<ChatReply, ChatError> {
        if !self.session.is_playing() {
            return Err(ChatError::SessionOver);
        }

        let decision = self
            .limiter
            .lock()
            .check(&format!("chat:{caller}"), &self.limit, now_ms);
        if !decision.allowed {
            return Err(ChatError::RateLimited {
                retry_after_secs: decision.retry_after_secs(now_ms),
            });
        }

        if !self.ledger.try_debit(self.config.message_cost) {
            return Err(ChatError::InsufficientFunds {
                cost: self.config.message_cost,
                balance: self.ledger.balance(),
            });
        }

        let clean = sanitize(message);
        let current_mood = self.mood.get().as_str().to_string();

        let ctx = ChatContext {
            message: clean.clone(),
            history: self.history.lock().iter().cloned().collect(),
            current_mood: current_mood.clone(),
            recent_events: self
                .hub
                .recent_global(self.config.recent_events)
                .iter()
                .map(GameplayEvent::summary)
                .collect(),
            current_job: self.job.get().map(|j| j.summary()),
            stats: to_snapshot(&self.ledger.stats()),
        };

        let outcome = match self.director.chat(&ctx).await {
            Ok(raw) => validate_chat(raw),
            Err(error) => {
                warn!(%error, "Chat call failed, replying with fallback");
                fallback_chat(&current_mood)
            }
        };

        self.hub.record(
            GameplayEvent::new(EventKind::TerminalChat, PLAYER_ROLE, now_ms)
                .with_detail("message", clean.clone()),
        );

        {
            let mut history = self.history.lock();
            history.push_back(ChatTurn {
                role: PLAYER_ROLE.to_string(),
                text: clean,
            });
            history.push_back(ChatTurn {
                role: BOSS_ROLE.to_string(),
                text: outcome.reply.clone(),
            });
            while history.len() > self.config.history_len {
                history.pop_front();
            }
        }

        let mood = self.mood.propose(&outcome.mood);

        if let Some(end) = outcome.game_end {
            if self.session.end(end, Some(outcome.reply.clone())) {
                info!(end = end.as_str(), "Session ended by chat");
                let stats = self.ledger.stats();
                self.sink
                    .submit(ScoreEntry {
                        end_type: end,
                        currency: stats.currency,
                        elapsed_secs: stats.elapsed_secs,
                        phases_completed: stats.phases_completed,
                    })
                    .await;
            }
        }

        Ok(ChatReply {
            reply: outcome.reply,
            mood,
            ended: outcome.game_end,
        })
    }

    /// Conversation history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<ChatTurn> {
        self.history.lock().iter().cloned().collect()
    }
}

impl std::fmt::Debug for TerminalChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalChat")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
