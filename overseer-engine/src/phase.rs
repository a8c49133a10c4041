//! The phase and review lifecycle.
//!
//! A phase is a timed work assignment followed by a graded review. The
//! lifecycle runs on a one-second tick: it advances the session clock,
//! counts the phase timer down, runs the review at zero, and assigns the
//! next job after a short display delay. The session-length limit lives
//! here too, because this tick is the only place the clock advances.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use overseer_core::config::PhaseConfig;
use overseer_core::events::EventHub;
use overseer_core::jobs::JobGenerator;
use overseer_core::ratelimit::{RateLimitConfig, RateLimiter};
use overseer_core::session::GameEnd;
use overseer_core::world::WorldStore;
use overseer_llm::types::ReviewContext;
use overseer_llm::Director;

use crate::state::{
    to_snapshot, JobBoard, Ledger, MoodStore, ScoreEntry, ScoreSink, SessionHandle, SpeechBoard,
};
use crate::validate::{fallback_review, validate_review, Review};

const TIME_UP_SPEECH: &str = "That's the end of the day. Go home.";

/// Where the lifecycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    /// Before the first assignment.
    Idle,
    /// A job is assigned and the timer is running.
    Working,
    /// The review ran; waiting out the display delay.
    Reviewing,
}

/// Phase counter and timer, behind one lock so ticks see a consistent pair.
#[derive(Debug, Clone, Copy)]
pub struct Phase {
    /// One-based phase number.
    pub number: u32,
    /// Current status.
    pub status: PhaseStatus,
    /// Seconds left in the working window.
    pub time_remaining_secs: u64,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTick {
    /// Session is over; the loop should stop.
    Ended,
    /// Timer advanced, nothing else.
    Running,
    /// The review ran this tick.
    Reviewed,
    /// A new job was assigned this tick.
    Assigned,
}

/// The lifecycle driver. One instance per session.
pub struct PhaseLifecycle {
    config: PhaseConfig,
    limit: RateLimitConfig,
    limiter: Mutex<RateLimiter>,
    phase: Mutex<Phase>,
    generator: Mutex<JobGenerator>,
    rng: Mutex<StdRng>,
    next_assignment_at_ms: AtomicU64,
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
}

/// Constructor dependencies.
pub struct PhaseDeps {
    /// Lifecycle timing.
    pub config: PhaseConfig,
    /// Review budget.
    pub limit: RateLimitConfig,
    /// The model seam.
    pub director: Arc<dyn Director>,
    /// Event source (phase log).
    pub hub: Arc<EventHub>,
    /// World objects, for the job catalog and review context.
    pub world: Arc<WorldStore>,
    /// Mood handle.
    pub mood: Arc<MoodStore>,
    /// Session handle.
    pub session: Arc<SessionHandle>,
    /// Speech display.
    pub speech: Arc<SpeechBoard>,
    /// Current job slot.
    pub job: Arc<JobBoard>,
    /// Clock, currency, and review history.
    pub ledger: Arc<Ledger>,
    /// Leaderboard port.
    pub sink: Arc<dyn ScoreSink>,
    /// Shared with the reaction loop; held while a review runs.
    pub review_gate: Arc<AtomicBool>,
}

impl PhaseLifecycle {
    /// Build the lifecycle in the idle state.
    #[must_use]
    pub fn new(deps: PhaseDeps) -> Self {
        Self {
            config: deps.config,
            limit: deps.limit,
            limiter: Mutex::new(RateLimiter::new()),
            phase: Mutex::new(Phase {
                number: 0,
                status: PhaseStatus::Idle,
                time_remaining_secs: 0,
            }),
            generator: Mutex::new(JobGenerator::new()),
            rng: Mutex::new(StdRng::from_entropy()),
            next_assignment_at_ms: AtomicU64::new(0),
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
        }
    }

    /// Current phase snapshot.
    #[must_use]
    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    /// Assign the first job and start the first working window.
    pub fn start(&self, now_ms: u64) {
        self.assign_job(now_ms);
    }

    /// One second of game time. Call exactly once per second.
    pub async fn tick_second(&self, now_ms: u64) -> PhaseTick {
        if !self.session.is_playing() {
            return PhaseTick::Ended;
        }

        let elapsed = self.ledger.advance_clock(1);
        if elapsed >= self.config.session_limit_secs {
            if self.session.end(GameEnd::TimeUp, Some(TIME_UP_SPEECH.to_string())) {
                info!(elapsed_secs = elapsed, "Session time limit reached");
                self.submit_score(GameEnd::TimeUp).await;
            }
            return PhaseTick::Ended;
        }

        enum Step {
            TimerExpired,
            AwaitingAssignment,
            Running,
        }

        let step = {
            let mut phase = self.phase.lock();
            match phase.status {
                PhaseStatus::Working => {
                    phase.time_remaining_secs = phase.time_remaining_secs.saturating_sub(1);
                    if phase.time_remaining_secs == 0 {
                        phase.status = PhaseStatus::Reviewing;
                        Step::TimerExpired
                    } else {
                        Step::Running
                    }
                }
                PhaseStatus::Reviewing => Step::AwaitingAssignment,
                PhaseStatus::Idle => Step::Running,
            }
        };

        match step {
            Step::TimerExpired => {
                self.run_review(now_ms).await;
                PhaseTick::Reviewed
            }
            Step::AwaitingAssignment => {
                if now_ms >= self.next_assignment_at_ms.load(Ordering::Acquire) {
                    self.assign_job(now_ms);
                    PhaseTick::Assigned
                } else {
                    PhaseTick::Running
                }
            }
            Step::Running => PhaseTick::Running,
        }
    }

    async fn run_review(&self, now_ms: u64) {
        // Hold the gate so the reaction loop stays quiet while grading.
        if self
            .review_gate
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let review = self.grade(now_ms).await;

        if self.session.is_playing() {
            self.commit_review(review, now_ms).await;
        }

        self.review_gate.store(false, Ordering::Release);
    }

    async fn grade(&self, now_ms: u64) -> Review {
        let current_mood = self.mood.get().as_str().to_string();

        let decision = self.limiter.lock().check("review", &self.limit, now_ms);
        if !decision.allowed {
            warn!("Review over budget, grading with fallback");
            return fallback_review(&current_mood);
        }

        let (job_title, job_description, object_hints) = match self.job.get() {
            Some(job) => (job.title, job.description, job.object_hints),
            None => (
                "General upkeep".to_string(),
                "Keep the office in order.".to_string(),
                Vec::new(),
            ),
        };

        let ctx = ReviewContext {
            events: self
                .hub
                .drain_phase()
                .iter()
                .map(overseer_core::events::GameplayEvent::summary)
                .collect(),
            job_title,
            job_description,
            object_hints,
            current_mood: current_mood.clone(),
            world_state: self
                .world
                .snapshot()
                .iter()
                .map(overseer_core::world::WorldObject::describe)
                .collect(),
            stats: to_snapshot(&self.ledger.stats()),
        };

        match self.director.review(&ctx).await {
            Ok(raw) => validate_review(raw),
            Err(error) => {
                warn!(%error, "Review call failed, using fallback");
                fallback_review(&current_mood)
            }
        }
    }

    async fn commit_review(&self, review: Review, now_ms: u64) {
        self.ledger.record_review(review.score);
        let mood = self.mood.propose(&review.mood);
        let phase_number = self.phase.lock().number;

        self.speech.publish_major(
            format!("Performance review #{phase_number}"),
            review.speech.clone(),
            now_ms,
            self.config.major_speech_secs,
        );

        info!(
            phase = phase_number,
            score = review.score,
            mood = mood.as_str(),
            "Review committed"
        );

        if let Some(end) = review.game_end {
            if self.session.end(end, Some(review.speech)) {
                info!(end = end.as_str(), "Session ended by review");
                self.submit_score(end).await;
            }
        } else {
            self.next_assignment_at_ms.store(
                now_ms + self.config.review_display_delay_secs * 1000,
                Ordering::Release,
            );
        }
    }

    fn assign_job(&self, now_ms: u64) {
        let catalog = self.world.catalog();
        let job = {
            let mut rng = self.rng.lock();
            self.generator.lock().next_job(&catalog, &mut *rng)
        };

        let Some(job) = job else {
            warn!("Empty job catalog, staying idle");
            return;
        };

        self.hub.reset_phase();
        {
            let mut phase = self.phase.lock();
            phase.number += 1;
            phase.status = PhaseStatus::Working;
            phase.time_remaining_secs = self.config.work_secs;
        }

        self.speech.publish_major(
            job.title.clone(),
            job.description.clone(),
            now_ms,
            self.config.major_speech_secs,
        );
        info!(title = %job.title, "Job assigned");
        self.job.set(job);
    }

    async fn submit_score(&self, end: GameEnd) {
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

impl std::fmt::Debug for PhaseLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseLifecycle")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
