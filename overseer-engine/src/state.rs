//! Shared state handles injected into each loop.
//!
//! Each handle has a single conceptual writer, except the mood: both the
//! reaction loop and the review step write it through the same transition
//! gate, last write wins.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use overseer_core::jobs::Job;
use overseer_core::mood::Mood;
use overseer_core::session::{GameEnd, SessionState, SessionStats, SessionStatus};
use overseer_llm::types::SessionSnapshot;

// ---------------------------------------------------------------------------
// Mood
// ---------------------------------------------------------------------------

/// Process-wide current mood, mutated only through the transition gate.
#[derive(Debug)]
pub struct MoodStore {
    current: RwLock<Mood>,
}

impl MoodStore {
    /// Create a store with an initial mood.
    #[must_use]
    pub fn new(initial: Mood) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// The current mood.
    #[must_use]
    pub fn get(&self) -> Mood {
        *self.current.read()
    }

    /// Propose a raw mood name from the LLM. Unrecognized names and
    /// discontinuous jumps are silently rejected; returns the mood that is
    /// now current either way.
    pub fn propose(&self, name: &str) -> Mood {
        let mut current = self.current.write();
        let applied = Mood::gate(*current, name);
        if applied == *current && !name.trim().is_empty() {
            debug!(current = %current, proposed = name, "Mood proposal rejected");
        }
        *current = applied;
        applied
    }
}

impl Default for MoodStore {
    fn default() -> Self {
        Self::new(Mood::Neutral)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Sticky session state. Exactly one end transition ever succeeds.
#[derive(Debug, Default)]
pub struct SessionHandle {
    state: RwLock<SessionState>,
}

impl SessionHandle {
    /// Create a live session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.state.read().status
    }

    /// Whether the game loop is still live.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.status() == SessionStatus::Playing
    }

    /// End the session. Returns `true` only for the first caller; later
    /// attempts are no-ops (whichever loop fires first wins).
    pub fn end(&self, end_type: GameEnd, end_speech: Option<String>) -> bool {
        let mut state = self.state.write();
        if state.status != SessionStatus::Playing {
            return false;
        }
        state.status = end_type.outcome();
        state.end_type = Some(end_type);
        state.end_speech = end_speech;
        true
    }

    /// Full state snapshot (for the end screen).
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }
}

// ---------------------------------------------------------------------------
// Speech
// ---------------------------------------------------------------------------

/// A published line of boss speech.
#[derive(Debug, Clone)]
pub struct Speech {
    /// What Jacobs says.
    pub text: String,
    /// Headline for major (title-bearing) speech.
    pub title: Option<String>,
    /// Major speech back-pressures the reaction loop while displayed.
    pub major: bool,
    /// When the display window closes (milliseconds).
    pub expires_at_ms: u64,
}

/// Single-slot speech display. New speech replaces old.
#[derive(Debug, Default)]
pub struct SpeechBoard {
    current: RwLock<Option<Speech>>,
}

impl SpeechBoard {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish ordinary speech.
    pub fn publish(&self, text: impl Into<String>, now_ms: u64, duration_secs: u64) {
        *self.current.write() = Some(Speech {
            text: text.into(),
            title: None,
            major: false,
            expires_at_ms: now_ms + duration_secs * 1000,
        });
    }

    /// Publish major speech (job assignments, reviews).
    pub fn publish_major(
        &self,
        title: impl Into<String>,
        text: impl Into<String>,
        now_ms: u64,
        duration_secs: u64,
    ) {
        *self.current.write() = Some(Speech {
            text: text.into(),
            title: Some(title.into()),
            major: true,
            expires_at_ms: now_ms + duration_secs * 1000,
        });
    }

    /// The currently displayed speech, if its window is still open.
    #[must_use]
    pub fn current(&self, now_ms: u64) -> Option<Speech> {
        self.current
            .read()
            .clone()
            .filter(|s| s.expires_at_ms > now_ms)
    }

    /// Whether a major speech is on screen (reaction-loop back-pressure).
    #[must_use]
    pub fn major_active(&self, now_ms: u64) -> bool {
        self.current(now_ms).is_some_and(|s| s.major)
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// The currently assigned job, replaced each phase.
#[derive(Debug, Default)]
pub struct JobBoard {
    current: RwLock<Option<Job>>,
}

impl JobBoard {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current job.
    pub fn set(&self, job: Job) {
        *self.current.write() = Some(job);
    }

    /// The current job, if a phase is active.
    #[must_use]
    pub fn get(&self) -> Option<Job> {
        self.current.read().clone()
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct LedgerInner {
    currency: i64,
    elapsed_secs: u64,
    phases_completed: u32,
    review_scores: Vec<u8>,
}

/// Player currency, game clock, and review history.
#[derive(Debug, Default)]
pub struct Ledger {
    inner: Mutex<LedgerInner>,
}

impl Ledger {
    /// Create a ledger with a starting balance.
    #[must_use]
    pub fn with_balance(currency: i64) -> Self {
        Self {
            inner: Mutex::new(LedgerInner {
                currency,
                ..LedgerInner::default()
            }),
        }
    }

    /// Current balance.
    #[must_use]
    pub fn balance(&self) -> i64 {
        self.inner.lock().currency
    }

    /// Deduct `cost` if the balance covers it. Returns `false` (and leaves
    /// the balance untouched) otherwise.
    pub fn try_debit(&self, cost: i64) -> bool {
        let mut inner = self.inner.lock();
        if inner.currency < cost {
            return false;
        }
        inner.currency -= cost;
        true
    }

    /// Record a completed review: the score is added to currency and to
    /// the score history.
    pub fn record_review(&self, score: u8) {
        let mut inner = self.inner.lock();
        inner.currency += i64::from(score);
        inner.phases_completed += 1;
        inner.review_scores.push(score);
    }

    /// Advance the in-game clock by `secs`; returns the new elapsed total.
    pub fn advance_clock(&self, secs: u64) -> u64 {
        let mut inner = self.inner.lock();
        inner.elapsed_secs += secs;
        inner.elapsed_secs
    }

    /// Snapshot the running totals.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        let inner = self.inner.lock();
        SessionStats {
            currency: inner.currency,
            elapsed_secs: inner.elapsed_secs,
            phases_completed: inner.phases_completed,
            review_scores: inner.review_scores.clone(),
        }
    }
}

/// Convert ledger stats into the wire snapshot embedded in prompts.
#[must_use]
pub fn to_snapshot(stats: &SessionStats) -> SessionSnapshot {
    SessionSnapshot {
        currency: stats.currency,
        elapsed_secs: stats.elapsed_secs,
        phases_completed: stats.phases_completed,
        review_scores: stats.review_scores.clone(),
    }
}

// ---------------------------------------------------------------------------
// Leaderboard port
// ---------------------------------------------------------------------------

/// A finished session, as submitted to the leaderboard collaborator.
#[derive(Debug, Clone)]
pub struct ScoreEntry {
    /// How the session ended.
    pub end_type: GameEnd,
    /// Final currency balance.
    pub currency: i64,
    /// In-game seconds survived.
    pub elapsed_secs: u64,
    /// Reviews completed.
    pub phases_completed: u32,
}

/// External leaderboard persistence, consumed only at session end.
#[async_trait]
pub trait ScoreSink: Send + Sync {
    /// Submit a finished session.
    async fn submit(&self, entry: ScoreEntry);
}

/// Default sink that just logs the entry.
#[derive(Debug, Default)]
pub struct NullScoreSink;

#[async_trait]
impl ScoreSink for NullScoreSink {
    async fn submit(&self, entry: ScoreEntry) {
        debug!(?entry, "Session score recorded (no leaderboard configured)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_store_gates_proposals() {
        let store = MoodStore::new(Mood::Neutral);
        assert_eq!(store.propose("IRRITATED"), Mood::Irritated);
        assert_eq!(store.propose("UNHINGED"), Mood::Irritated, "two-tier jump");
        assert_eq!(store.propose("not a mood"), Mood::Irritated);
        assert_eq!(store.get(), Mood::Irritated);
    }

    #[test]
    fn session_end_is_sticky() {
        let session = SessionHandle::new();
        assert!(session.is_playing());
        assert!(session.end(GameEnd::Fired, Some("Clear your desk.".into())));
        assert!(!session.end(GameEnd::Promoted, None));

        let state = session.snapshot();
        assert_eq!(state.status, SessionStatus::Lost);
        assert_eq!(state.end_type, Some(GameEnd::Fired));
        assert_eq!(state.end_speech.as_deref(), Some("Clear your desk."));
    }

    #[test]
    fn speech_expires() {
        let board = SpeechBoard::new();
        board.publish("Back to work.", 1_000, 6);
        assert!(board.current(2_000).is_some());
        assert!(board.current(7_001).is_none());
        assert!(!board.major_active(2_000));

        board.publish_major("New assignment", "Fix the copier.", 1_000, 12);
        assert!(board.major_active(2_000));
        assert!(!board.major_active(13_001));
    }

    #[test]
    fn ledger_debit_blocks_overdraft() {
        let ledger = Ledger::with_balance(4);
        assert!(!ledger.try_debit(5));
        assert_eq!(ledger.balance(), 4);
        assert!(ledger.try_debit(4));
        assert_eq!(ledger.balance(), 0);
    }

    #[test]
    fn review_credits_currency_and_history() {
        let ledger = Ledger::default();
        ledger.record_review(8);
        ledger.record_review(3);

        let stats = ledger.stats();
        assert_eq!(stats.currency, 11);
        assert_eq!(stats.phases_completed, 2);
        assert_eq!(stats.review_scores, vec![8, 3]);
    }
}
