//! The reaction loop: Jacobs watches the cameras.
//!
//! A polling tick checks the trigger policy and, when it fires, drains
//! the global event log, asks the model for a reaction, and commits the
//! surviving pieces (mood, speech, effects, possibly a session end). At
//! most one reaction is in flight at a time; a single-slot token makes a
//! slow model drop ticks instead of stacking calls.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use overseer_core::config::ReactionConfig;
use overseer_core::events::EventHub;
use overseer_core::ratelimit::{RateLimitConfig, RateLimiter};
use overseer_core::world::WorldStore;
use overseer_llm::types::ReactionContext;
use overseer_llm::Director;

use crate::state::{
    to_snapshot, JobBoard, Ledger, MoodStore, ScoreEntry, ScoreSink, SessionHandle, SpeechBoard,
    Speech,
};
use crate::validate::{fallback_reaction, validate_reaction, PLACEHOLDER_SPEECH};

/// What one tick of the loop did (or why it did nothing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTick {
    /// Session is over; the loop should stop.
    SessionOver,
    /// A phase review holds the gate; skipped.
    ReviewInProgress,
    /// A major speech is on screen; skipped.
    MajorSpeechActive,
    /// Trigger policy not met; skipped.
    NotReady,
    /// Over the reaction budget; events left in the log.
    RateLimited,
    /// A previous reaction is still in flight; skipped.
    InFlight,
    /// A reaction was produced and committed.
    Fired,
}

/// The periodic reaction driver. One instance per session.
pub struct ReactionLoop {
    config: ReactionConfig,
    limit: RateLimitConfig,
    limiter: Mutex<RateLimiter>,
    director: Arc<dyn Director>,
    hub: Arc<EventHub>,
    world: Arc<WorldStore>,
    mood: Arc<MoodStore>,
    session: Arc<SessionHandle>,
    speech: Arc<SpeechBoard>,
    job: Arc<JobBoard>,
    ledger: Arc<Ledger>,
    sink: Arc<dyn ScoreSink>,
    review_gate: Arc<AtomicBool>,
    processing: AtomicBool,
    last_fire_ms: AtomicU64,
}

/// Constructor dependencies, grouped to keep the signature readable.
pub struct ReactionDeps {
    /// Trigger policy.
    pub config: ReactionConfig,
    /// Reaction budget.
    pub limit: RateLimitConfig,
    /// The model seam.
    pub director: Arc<dyn Director>,
    /// Event source.
    pub hub: Arc<EventHub>,
    /// World objects, for state descriptions and effect targets.
    pub world: Arc<WorldStore>,
    /// Mood handle.
    pub mood: Arc<MoodStore>,
    /// Session handle.
    pub session: Arc<SessionHandle>,
    /// Speech display.
    pub speech: Arc<SpeechBoard>,
    /// Current job, embedded in prompts.
    pub job: Arc<JobBoard>,
    /// Stats source.
    pub ledger: Arc<Ledger>,
    /// Leaderboard port, called on a model-declared session end.
    pub sink: Arc<dyn ScoreSink>,
    /// Set by the phase lifecycle while a review is running.
    pub review_gate: Arc<AtomicBool>,
}

impl ReactionLoop {
    /// Build the loop. The elapsed-time trigger measures from the first
    /// tick, so a quiet session gets its first reaction once
    /// `max_interval_ms` has passed and never sooner.
    #[must_use]
    pub fn new(deps: ReactionDeps) -> Self {
        Self {
            config: deps.config,
            limit: deps.limit,
            limiter: Mutex::new(RateLimiter::new()),
            director: deps.director,
            hub: deps.hub,
            world: deps.world,
            mood: deps.mood,
            session: deps.session,
            speech: deps.speech,
            job: deps.job,
            ledger: deps.ledger,
            sink: deps.sink,
            review_gate: deps.review_gate,
            processing: AtomicBool::new(false),
            last_fire_ms: AtomicU64::new(0),
        }
    }

    /// Run one tick of the trigger policy at `now_ms`.
    pub async fn tick(&self, now_ms: u64) -> ReactionTick {
        if !self.session.is_playing() {
            return ReactionTick::SessionOver;
        }
        if self.review_gate.load(Ordering::Acquire) {
            return ReactionTick::ReviewInProgress;
        }
        if self.speech.major_active(now_ms) {
            return ReactionTick::MajorSpeechActive;
        }

        let pending = self.hub.global_len();
        if pending == 0 {
            return ReactionTick::NotReady;
        }
        // Zero means no tick has run yet; anchor the elapsed-time trigger
        // to this tick rather than the epoch.
        let last_fire = self.last_fire_ms.load(Ordering::Acquire);
        let since_last = if last_fire == 0 {
            self.last_fire_ms.store(now_ms, Ordering::Release);
            0
        } else {
            now_ms.saturating_sub(last_fire)
        };
        if pending < self.config.min_events && since_last < self.config.max_interval_ms {
            return ReactionTick::NotReady;
        }

        // Budget check happens before the drain so denied ticks leave the
        // events in place for a later attempt.
        let decision = self.limiter.lock().check("reaction", &self.limit, now_ms);
        if !decision.allowed {
            debug!(
                retry_after_secs = decision.retry_after_secs(now_ms),
                "Reaction over budget, deferring"
            );
            return ReactionTick::RateLimited;
        }

        if self
            .processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return ReactionTick::InFlight;
        }

        self.last_fire_ms.store(now_ms, Ordering::Release);
        self.fire(now_ms).await;
        self.processing.store(false, Ordering::Release);
        ReactionTick::Fired
    }

    async fn fire(&self, now_ms: u64) {
        let events: Vec<String> = self
            .hub
            .drain_global()
            .iter()
            .map(overseer_core::events::GameplayEvent::summary)
            .collect();
        let current_mood = self.mood.get().as_str().to_string();

        let ctx = ReactionContext {
            events,
            current_mood: current_mood.clone(),
            world_state: self
                .world
                .snapshot()
                .iter()
                .map(overseer_core::world::WorldObject::describe)
                .collect(),
            current_job: self.job.get().map(|j| j.summary()),
            stats: to_snapshot(&self.ledger.stats()),
        };

        let reaction = match self.director.react(&ctx).await {
            Ok(raw) => validate_reaction(raw),
            Err(error) => {
                warn!(%error, "Reaction call failed, using fallback");
                fallback_reaction(&current_mood)
            }
        };

        // The session may have ended during the await; stale reactions
        // are discarded whole.
        if !self.session.is_playing() {
            debug!("Session ended mid-reaction, discarding");
            return;
        }

        let mood = self.mood.propose(&reaction.mood);
        if reaction.speech != PLACEHOLDER_SPEECH {
            self.speech
                .publish(reaction.speech.clone(), now_ms, self.config.speech_secs);
        }

        for effect in &reaction.effects {
            match self.world.resolve_name(&effect.target_name) {
                Some(id) => {
                    self.world.set_states(id, vec![effect.new_state]);
                    debug!(
                        target = %effect.target_name,
                        state = effect.new_state.as_str(),
                        "Applied reaction effect"
                    );
                }
                None => {
                    warn!(target = %effect.target_name, "Reaction effect targets unknown object");
                }
            }
        }

        info!(
            mood = mood.as_str(),
            effects = reaction.effects.len(),
            "Reaction committed"
        );

        if let Some(end) = reaction.game_end {
            if self.session.end(end, Some(reaction.speech)) {
                info!(end = end.as_str(), "Session ended by reaction");
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
    }

    /// The speech currently on display, if any.
    #[must_use]
    pub fn current_speech(&self, now_ms: u64) -> Option<Speech> {
        self.speech.current(now_ms)
    }
}

impl std::fmt::Debug for ReactionLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionLoop")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
