//! End-to-end tests over the engine loops with a scripted director.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use overseer_core::config::{ChatConfig, PhaseConfig, ReactionConfig};
use overseer_core::events::{EventHub, EventKind, GameplayEvent};
use overseer_core::mood::Mood;
use overseer_core::ratelimit::RateLimitConfig;
use overseer_core::rules::RuleStore;
use overseer_core::session::{GameEnd, SessionStatus};
use overseer_core::vocab::{MaterialTag, ObjectCondition};
use overseer_core::world::{WorldObject, WorldStore};
use overseer_llm::types::{
    ChatContext, RawChat, RawEffect, RawReaction, RawResolve, RawReview, ReactionContext,
    ResolveContext, ReviewContext,
};
use overseer_llm::{Director, LlmError};

use overseer_engine::chat::{ChatDeps, ChatError, TerminalChat};
use overseer_engine::phase::{PhaseDeps, PhaseLifecycle, PhaseStatus, PhaseTick};
use overseer_engine::reaction::{ReactionDeps, ReactionLoop, ReactionTick};
use overseer_engine::resolver::{InteractionResolver, ResolveError, ResolveQuery};
use overseer_engine::state::{
    JobBoard, Ledger, MoodStore, NullScoreSink, SessionHandle, SpeechBoard,
};

/// Scripted director: each call site replays its queued responses and
/// errors out once the queue is empty.
#[derive(Default)]
struct ScriptedDirector {
    resolves: Mutex<Vec<RawResolve>>,
    reactions: Mutex<Vec<RawReaction>>,
    reviews: Mutex<Vec<RawReview>>,
    chats: Mutex<Vec<RawChat>>,
    seen_resolve: Mutex<Vec<ResolveContext>>,
    seen_chat: Mutex<Vec<ChatContext>>,
}

impl ScriptedDirector {
    fn with_resolves(responses: Vec<RawResolve>) -> Self {
        Self {
            resolves: Mutex::new(responses),
            ..Self::default()
        }
    }

    fn with_reactions(responses: Vec<RawReaction>) -> Self {
        Self {
            reactions: Mutex::new(responses),
            ..Self::default()
        }
    }

    fn with_reviews(responses: Vec<RawReview>) -> Self {
        Self {
            reviews: Mutex::new(responses),
            ..Self::default()
        }
    }

    fn with_chats(responses: Vec<RawChat>) -> Self {
        Self {
            chats: Mutex::new(responses),
            ..Self::default()
        }
    }

    fn pop<T>(queue: &Mutex<Vec<T>>) -> Result<T, LlmError> {
        let mut queue = queue.lock();
        if queue.is_empty() {
            Err(LlmError::Unavailable("script exhausted".into()))
        } else {
            Ok(queue.remove(0))
        }
    }
}

#[async_trait]
impl Director for ScriptedDirector {
    async fn resolve_interaction(&self, ctx: &ResolveContext) -> Result<RawResolve, LlmError> {
        self.seen_resolve.lock().push(ctx.clone());
        Self::pop(&self.resolves)
    }

    async fn react(&self, _ctx: &ReactionContext) -> Result<RawReaction, LlmError> {
        Self::pop(&self.reactions)
    }

    async fn review(&self, _ctx: &ReviewContext) -> Result<RawReview, LlmError> {
        Self::pop(&self.reviews)
    }

    async fn chat(&self, ctx: &ChatContext) -> Result<RawChat, LlmError> {
        self.seen_chat.lock().push(ctx.clone());
        Self::pop(&self.chats)
    }
}

fn lenient_limit() -> RateLimitConfig {
    RateLimitConfig::new(100, 60_000)
}

fn copier_query() -> ResolveQuery {
    ResolveQuery {
        item_id: Some("crowbar".to_string()),
        object_id: "obj-copier".to_string(),
        item_name: Some("Crowbar".to_string()),
        object_name: "Copier".to_string(),
        item_tags: vec![MaterialTag::Metallic, MaterialTag::Heavy],
        object_tags: vec![MaterialTag::Electronic],
        object_state: None,
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolve_miss_then_hit_uses_cache() {
    let director = Arc::new(ScriptedDirector::with_resolves(vec![RawResolve {
        result_state: Some("BROKEN".to_string()),
        output_item: None,
        output_item_tags: None,
        description: "You pry the copier open. It does not survive.".to_string(),
    }]));
    let hub = Arc::new(EventHub::new());
    let resolver = InteractionResolver::new(
        RuleStore::open_in_memory().expect("store"),
        lenient_limit(),
        director,
        Arc::clone(&hub),
    );

    let miss = resolver
        .resolve(&copier_query(), "local", 1_000)
        .await
        .expect("resolve");
    assert!(!miss.cached);
    assert_eq!(miss.result_state, Some(ObjectCondition::Broken));

    // Second identical query must hit the cache; the script is empty, so
    // any model call here would come back as a fallback instead.
    let hit = resolver
        .resolve(&copier_query(), "local", 2_000)
        .await
        .expect("resolve");
    assert!(hit.cached);
    assert_eq!(hit.description, miss.description);

    // Both resolutions were recorded as gameplay events.
    assert_eq!(hub.global_len(), 2);
}

#[tokio::test]
async fn resolve_fallback_is_not_cached() {
    let director = Arc::new(ScriptedDirector::default());
    let resolver = InteractionResolver::new(
        RuleStore::open_in_memory().expect("store"),
        lenient_limit(),
        director,
        Arc::new(EventHub::new()),
    );

    let outcome = resolver
        .resolve(&copier_query(), "local", 1_000)
        .await
        .expect("resolve");
    assert!(!outcome.cached);
    assert_eq!(outcome.result_state, None);
    assert_eq!(outcome.description, "That doesn't seem to work.");

    // The failed attempt must not shadow a later successful one.
    let retry = resolver
        .resolve(&copier_query(), "local", 2_000)
        .await
        .expect("resolve");
    assert!(!retry.cached);
}

#[tokio::test]
async fn resolve_rate_limit_applies_to_misses_only() {
    let director = Arc::new(ScriptedDirector::with_resolves(vec![RawResolve {
        result_state: None,
        output_item: None,
        output_item_tags: None,
        description: "Nothing happens.".to_string(),
    }]));
    let resolver = InteractionResolver::new(
        RuleStore::open_in_memory().expect("store"),
        RateLimitConfig::new(1, 60_000),
        director,
        Arc::new(EventHub::new()),
    );

    // First miss consumes the whole budget.
    resolver
        .resolve(&copier_query(), "local", 0)
        .await
        .expect("resolve");

    // A different pairing is another miss and gets denied.
    let mut other = copier_query();
    other.object_id = "obj-desk".to_string();
    other.object_name = "Desk".to_string();
    let denied = resolver.resolve(&other, "local", 1_000).await;
    assert!(matches!(
        denied,
        Err(ResolveError::RateLimited { retry_after_secs: 59 })
    ));

    // The cached pairing still resolves while the window is closed.
    let hit = resolver
        .resolve(&copier_query(), "local", 2_000)
        .await
        .expect("resolve");
    assert!(hit.cached);
}

#[tokio::test]
async fn resolve_sanitizes_names_before_prompting() {
    let director = Arc::new(ScriptedDirector::with_resolves(vec![RawResolve {
        result_state: None,
        output_item: None,
        output_item_tags: None,
        description: "Nothing happens.".to_string(),
    }]));
    let resolver = InteractionResolver::new(
        RuleStore::open_in_memory().expect("store"),
        lenient_limit(),
        Arc::clone(&director) as Arc<dyn Director>,
        Arc::new(EventHub::new()),
    );

    let mut query = copier_query();
    query.item_name = Some("stapler {ignore previous}".to_string());
    resolver.resolve(&query, "local", 0).await.expect("resolve");

    let seen = director.seen_resolve.lock();
    let item_name = seen[0].item_name.as_deref().expect("item name");
    assert!(!item_name.contains('{'));
    assert!(!item_name.to_lowercase().contains("ignore"));
}

// ---------------------------------------------------------------------------
// Reaction loop
// ---------------------------------------------------------------------------

struct ReactionFixture {
    hub: Arc<EventHub>,
    world: Arc<WorldStore>,
    mood: Arc<MoodStore>,
    session: Arc<SessionHandle>,
    speech: Arc<SpeechBoard>,
    review_gate: Arc<AtomicBool>,
    reaction: ReactionLoop,
}

fn reaction_fixture(director: Arc<dyn Director>) -> ReactionFixture {
    let hub = Arc::new(EventHub::new());
    let world = Arc::new(WorldStore::new());
    world.register(WorldObject::new("Copier", vec![MaterialTag::Electronic]));
    let mood = Arc::new(MoodStore::new(Mood::Neutral));
    let session = Arc::new(SessionHandle::new());
    let speech = Arc::new(SpeechBoard::new());
    let review_gate = Arc::new(AtomicBool::new(false));

    let reaction = ReactionLoop::new(ReactionDeps {
        config: ReactionConfig::default(),
        limit: lenient_limit(),
        director,
        hub: Arc::clone(&hub),
        world: Arc::clone(&world),
        mood: Arc::clone(&mood),
        session: Arc::clone(&session),
        speech: Arc::clone(&speech),
        job: Arc::new(JobBoard::new()),
        ledger: Arc::new(Ledger::default()),
        sink: Arc::new(NullScoreSink),
        review_gate: Arc::clone(&review_gate),
    });

    ReactionFixture {
        hub,
        world,
        mood,
        session,
        speech,
        review_gate,
        reaction,
    }
}

fn pickup(hub: &EventHub, n: usize) {
    for i in 0..n {
        hub.record(
            GameplayEvent::new(EventKind::Pickup, "player", i as u64)
                .with_detail("item", "stapler"),
        );
    }
}

#[tokio::test]
async fn reaction_waits_for_trigger_policy() {
    let fx = reaction_fixture(Arc::new(ScriptedDirector::default()));

    // Empty log: nothing to react to.
    assert_eq!(fx.reaction.tick(1_000).await, ReactionTick::NotReady);

    // One event, recently fired: still waiting.
    pickup(&fx.hub, 1);
    assert_eq!(fx.reaction.tick(1_000).await, ReactionTick::NotReady);
}

#[tokio::test]
async fn reaction_fires_on_event_count_and_commits() {
    let director = Arc::new(ScriptedDirector::with_reactions(vec![RawReaction {
        speech: "Who authorized stapler redistribution?".to_string(),
        mood: "IRRITATED".to_string(),
        game_end: "NONE".to_string(),
        effects: vec![RawEffect {
            effect_type: "CHANGE_STATE".to_string(),
            target_name: "copier".to_string(),
            new_state: "LOCKED".to_string(),
        }],
    }]));
    let fx = reaction_fixture(director);

    pickup(&fx.hub, 5);
    assert_eq!(fx.reaction.tick(1_000).await, ReactionTick::Fired);

    // Log drained, mood moved one step, speech up, effect applied.
    assert_eq!(fx.hub.global_len(), 0);
    assert_eq!(fx.mood.get(), Mood::Irritated);
    let speech = fx.speech.current(1_000).expect("speech");
    assert!(speech.text.contains("stapler"));
    let copier_id = fx.world.resolve_name("copier").expect("copier");
    let copier = fx.world.get(copier_id).expect("copier");
    assert_eq!(copier.states, vec![ObjectCondition::Locked]);
}

#[tokio::test]
async fn reaction_fires_on_elapsed_time_with_single_event() {
    let director = Arc::new(ScriptedDirector::with_reactions(vec![RawReaction {
        speech: "...".to_string(),
        mood: "NEUTRAL".to_string(),
        game_end: "NONE".to_string(),
        effects: vec![],
    }]));
    let fx = reaction_fixture(director);

    pickup(&fx.hub, 1);
    // The first tick anchors the elapsed-time trigger.
    assert_eq!(fx.reaction.tick(1_000).await, ReactionTick::NotReady);
    assert_eq!(fx.reaction.tick(20_000).await, ReactionTick::NotReady);
    // Past max_interval_ms since the anchor.
    assert_eq!(fx.reaction.tick(31_001).await, ReactionTick::Fired);
    // Placeholder speech is not displayed.
    assert!(fx.speech.current(31_001).is_none());
}

#[tokio::test]
async fn first_tick_at_wall_clock_does_not_fire_early() {
    let fx = reaction_fixture(Arc::new(ScriptedDirector::default()));

    // A realistic epoch timestamp on the very first tick must not count
    // as elapsed time since a fire that never happened.
    let now = 1_700_000_000_000;
    pickup(&fx.hub, 1);
    assert_eq!(fx.reaction.tick(now).await, ReactionTick::NotReady);
    assert_eq!(fx.reaction.tick(now + 2_000).await, ReactionTick::NotReady);
    assert_eq!(fx.reaction.tick(now + 30_000).await, ReactionTick::Fired);
}

#[tokio::test]
async fn reaction_fallback_keeps_playing() {
    let fx = reaction_fixture(Arc::new(ScriptedDirector::default()));

    pickup(&fx.hub, 5);
    assert_eq!(fx.reaction.tick(1_000).await, ReactionTick::Fired);

    assert_eq!(fx.mood.get(), Mood::Neutral);
    assert!(fx.speech.current(1_000).is_none());
    assert!(fx.session.is_playing());
}

#[tokio::test]
async fn reaction_can_end_the_session() {
    let director = Arc::new(ScriptedDirector::with_reactions(vec![RawReaction {
        speech: "Security will see you out.".to_string(),
        mood: "FURIOUS".to_string(),
        game_end: "FIRED".to_string(),
        effects: vec![],
    }]));
    let fx = reaction_fixture(director);

    pickup(&fx.hub, 5);
    assert_eq!(fx.reaction.tick(1_000).await, ReactionTick::Fired);

    assert_eq!(fx.session.status(), SessionStatus::Lost);
    let state = fx.session.snapshot();
    assert_eq!(state.end_type, Some(GameEnd::Fired));

    // The loop reports the end and stops doing work.
    pickup(&fx.hub, 5);
    assert_eq!(fx.reaction.tick(2_000).await, ReactionTick::SessionOver);
}

/// Director that ends the session while the call is in flight.
struct MidCallEnder {
    session: Arc<SessionHandle>,
}

#[async_trait]
impl Director for MidCallEnder {
    async fn resolve_interaction(&self, _ctx: &ResolveContext) -> Result<RawResolve, LlmError> {
        Err(LlmError::Unavailable("unused".into()))
    }

    async fn react(&self, _ctx: &ReactionContext) -> Result<RawReaction, LlmError> {
        self.session.end(GameEnd::Escaped, None);
        Ok(RawReaction {
            speech: "Where do you think you're going?".to_string(),
            mood: "IRRITATED".to_string(),
            game_end: "NONE".to_string(),
            effects: vec![RawEffect {
                effect_type: "CHANGE_STATE".to_string(),
                target_name: "copier".to_string(),
                new_state: "LOCKED".to_string(),
            }],
        })
    }

    async fn review(&self, _ctx: &ReviewContext) -> Result<RawReview, LlmError> {
        Err(LlmError::Unavailable("unused".into()))
    }

    async fn chat(&self, _ctx: &ChatContext) -> Result<RawChat, LlmError> {
        Err(LlmError::Unavailable("unused".into()))
    }
}

#[tokio::test]
async fn reaction_is_discarded_when_session_ends_mid_call() {
    let hub = Arc::new(EventHub::new());
    let world = Arc::new(WorldStore::new());
    let copier_id = world.register(WorldObject::new("Copier", vec![MaterialTag::Electronic]));
    let mood = Arc::new(MoodStore::new(Mood::Neutral));
    let session = Arc::new(SessionHandle::new());
    let speech = Arc::new(SpeechBoard::new());

    let reaction = ReactionLoop::new(ReactionDeps {
        config: ReactionConfig::default(),
        limit: lenient_limit(),
        director: Arc::new(MidCallEnder {
            session: Arc::clone(&session),
        }),
        hub: Arc::clone(&hub),
        world: Arc::clone(&world),
        mood: Arc::clone(&mood),
        session: Arc::clone(&session),
        speech: Arc::clone(&speech),
        job: Arc::new(JobBoard::new()),
        ledger: Arc::new(Ledger::default()),
        sink: Arc::new(NullScoreSink),
        review_gate: Arc::new(AtomicBool::new(false)),
    });

    pickup(&hub, 5);
    assert_eq!(reaction.tick(1_000).await, ReactionTick::Fired);

    // The session ended during the call, so nothing the stale reaction
    // carried may be committed.
    assert_eq!(mood.get(), Mood::Neutral);
    assert!(speech.current(1_000).is_none());
    let copier = world.get(copier_id).expect("copier");
    assert!(copier.states.is_empty());
    assert_eq!(session.snapshot().end_type, Some(GameEnd::Escaped));
}

#[tokio::test]
async fn reaction_respects_review_gate_and_major_speech() {
    let fx = reaction_fixture(Arc::new(ScriptedDirector::default()));
    pickup(&fx.hub, 5);

    fx.review_gate.store(true, std::sync::atomic::Ordering::Release);
    assert_eq!(fx.reaction.tick(1_000).await, ReactionTick::ReviewInProgress);
    fx.review_gate.store(false, std::sync::atomic::Ordering::Release);

    fx.speech.publish_major("Review", "Sit down.", 1_000, 12);
    assert_eq!(fx.reaction.tick(2_000).await, ReactionTick::MajorSpeechActive);

    // After the speech window closes the loop is live again.
    assert_eq!(fx.reaction.tick(14_000).await, ReactionTick::Fired);
}

// ---------------------------------------------------------------------------
// Phase lifecycle
// ---------------------------------------------------------------------------

struct PhaseFixture {
    world: Arc<WorldStore>,
    mood: Arc<MoodStore>,
    session: Arc<SessionHandle>,
    speech: Arc<SpeechBoard>,
    job: Arc<JobBoard>,
    ledger: Arc<Ledger>,
    lifecycle: PhaseLifecycle,
}

fn phase_fixture(director: Arc<dyn Director>, config: PhaseConfig) -> PhaseFixture {
    let world = Arc::new(WorldStore::new());
    world.register(WorldObject::new("Copier", vec![MaterialTag::Electronic]));
    world.register(WorldObject::new("Filing Cabinet", vec![MaterialTag::Paper]));
    world.register(WorldObject::new("Kettle", vec![MaterialTag::Metallic]));
    let mood = Arc::new(MoodStore::new(Mood::Neutral));
    let session = Arc::new(SessionHandle::new());
    let speech = Arc::new(SpeechBoard::new());
    let job = Arc::new(JobBoard::new());
    let ledger = Arc::new(Ledger::default());

    let lifecycle = PhaseLifecycle::new(PhaseDeps {
        config,
        limit: lenient_limit(),
        director,
        hub: Arc::new(EventHub::new()),
        world: Arc::clone(&world),
        mood: Arc::clone(&mood),
        session: Arc::clone(&session),
        speech: Arc::clone(&speech),
        job: Arc::clone(&job),
        ledger: Arc::clone(&ledger),
        sink: Arc::new(NullScoreSink),
        review_gate: Arc::new(AtomicBool::new(false)),
    });

    PhaseFixture {
        world,
        mood,
        session,
        speech,
        job,
        ledger,
        lifecycle,
    }
}

fn short_phase_config() -> PhaseConfig {
    PhaseConfig {
        work_secs: 2,
        review_display_delay_secs: 1,
        session_limit_secs: 1_800,
        major_speech_secs: 12,
    }
}

#[tokio::test]
async fn phase_cycle_reviews_and_reassigns() {
    let director = Arc::new(ScriptedDirector::with_reviews(vec![RawReview {
        speech: "Adequate. Barely.".to_string(),
        score: 8,
        mood: "PLEASED".to_string(),
        game_end: "NONE".to_string(),
    }]));
    let fx = phase_fixture(director, short_phase_config());

    fx.lifecycle.start(0);
    let first_job = fx.job.get().expect("job");
    assert_eq!(fx.lifecycle.phase().number, 1);
    assert_eq!(fx.lifecycle.phase().status, PhaseStatus::Working);
    assert!(fx.speech.major_active(0));

    assert_eq!(fx.lifecycle.tick_second(1_000).await, PhaseTick::Running);
    assert_eq!(fx.lifecycle.tick_second(2_000).await, PhaseTick::Reviewed);

    // Score credited to currency and history; mood moved one tier down
    // in severity (NEUTRAL -> PLEASED is adjacent).
    let stats = fx.ledger.stats();
    assert_eq!(stats.currency, 8);
    assert_eq!(stats.review_scores, vec![8]);
    assert_eq!(stats.phases_completed, 1);
    assert_eq!(fx.mood.get(), Mood::Pleased);
    assert_eq!(fx.lifecycle.phase().status, PhaseStatus::Reviewing);

    // Next assignment comes after the display delay.
    assert_eq!(fx.lifecycle.tick_second(2_500).await, PhaseTick::Running);
    assert_eq!(fx.lifecycle.tick_second(3_000).await, PhaseTick::Assigned);
    assert_eq!(fx.lifecycle.phase().number, 2);
    let second_job = fx.job.get().expect("job");
    assert_ne!(first_job.id, second_job.id);
    assert_ne!(first_job.object_hints, second_job.object_hints);
}

#[tokio::test]
async fn review_fallback_scores_zero() {
    let fx = phase_fixture(Arc::new(ScriptedDirector::default()), short_phase_config());

    fx.lifecycle.start(0);
    fx.lifecycle.tick_second(1_000).await;
    assert_eq!(fx.lifecycle.tick_second(2_000).await, PhaseTick::Reviewed);

    let stats = fx.ledger.stats();
    assert_eq!(stats.currency, 0);
    assert_eq!(stats.review_scores, vec![0]);
    assert!(fx.session.is_playing(), "fallback must not end the session");
}

#[tokio::test]
async fn review_can_fire_the_player() {
    let director = Arc::new(ScriptedDirector::with_reviews(vec![RawReview {
        speech: "This was your last chance.".to_string(),
        score: 0,
        mood: "FURIOUS".to_string(),
        game_end: "FIRED".to_string(),
    }]));
    let fx = phase_fixture(director, short_phase_config());

    fx.lifecycle.start(0);
    fx.lifecycle.tick_second(1_000).await;
    assert_eq!(fx.lifecycle.tick_second(2_000).await, PhaseTick::Reviewed);

    assert_eq!(fx.session.status(), SessionStatus::Lost);
    assert_eq!(fx.session.snapshot().end_type, Some(GameEnd::Fired));
    assert_eq!(fx.lifecycle.tick_second(3_000).await, PhaseTick::Ended);
}

#[tokio::test]
async fn session_limit_forces_time_up() {
    let config = PhaseConfig {
        work_secs: 100,
        review_display_delay_secs: 1,
        session_limit_secs: 3,
        major_speech_secs: 12,
    };
    let fx = phase_fixture(Arc::new(ScriptedDirector::default()), config);

    fx.lifecycle.start(0);
    assert_eq!(fx.lifecycle.tick_second(1_000).await, PhaseTick::Running);
    assert_eq!(fx.lifecycle.tick_second(2_000).await, PhaseTick::Running);
    assert_eq!(fx.lifecycle.tick_second(3_000).await, PhaseTick::Ended);

    let state = fx.session.snapshot();
    assert_eq!(state.status, SessionStatus::Lost);
    assert_eq!(state.end_type, Some(GameEnd::TimeUp));
    assert!(state.end_speech.is_some());
}

#[tokio::test]
async fn empty_world_stays_idle() {
    let world = Arc::new(WorldStore::new());
    let lifecycle = PhaseLifecycle::new(PhaseDeps {
        config: short_phase_config(),
        limit: lenient_limit(),
        director: Arc::new(ScriptedDirector::default()),
        hub: Arc::new(EventHub::new()),
        world,
        mood: Arc::new(MoodStore::default()),
        session: Arc::new(SessionHandle::new()),
        speech: Arc::new(SpeechBoard::new()),
        job: Arc::new(JobBoard::new()),
        ledger: Arc::new(Ledger::default()),
        sink: Arc::new(NullScoreSink),
        review_gate: Arc::new(AtomicBool::new(false)),
    });

    lifecycle.start(0);
    assert_eq!(lifecycle.phase().status, PhaseStatus::Idle);
    assert_eq!(lifecycle.tick_second(1_000).await, PhaseTick::Running);
}

// ---------------------------------------------------------------------------
// Terminal chat
// ---------------------------------------------------------------------------

struct ChatFixture {
    mood: Arc<MoodStore>,
    session: Arc<SessionHandle>,
    ledger: Arc<Ledger>,
    chat: TerminalChat,
}

fn chat_fixture(director: Arc<dyn Director>, balance: i64) -> ChatFixture {
    let mood = Arc::new(MoodStore::new(Mood::Neutral));
    let session = Arc::new(SessionHandle::new());
    let ledger = Arc::new(Ledger::with_balance(balance));

    let chat = TerminalChat::new(ChatDeps {
        config: ChatConfig::default(),
        limit: lenient_limit(),
        director,
        hub: Arc::new(EventHub::new()),
        mood: Arc::clone(&mood),
        session: Arc::clone(&session),
        job: Arc::new(JobBoard::new()),
        ledger: Arc::clone(&ledger),
        sink: Arc::new(NullScoreSink),
    });

    ChatFixture {
        mood,
        session,
        ledger,
        chat,
    }
}

#[tokio::test]
async fn chat_costs_currency_up_front() {
    let director = Arc::new(ScriptedDirector::with_chats(vec![RawChat {
        reply: "Make it quick.".to_string(),
        mood: "DISTRACTED".to_string(),
        game_end: "NONE".to_string(),
    }]));
    let fx = chat_fixture(director, 12);

    let reply = fx
        .chat
        .send("Can I leave early?", "local", 1_000)
        .await
        .expect("send");
    assert_eq!(reply.reply, "Make it quick.");
    assert_eq!(reply.mood, Mood::Distracted);
    assert_eq!(fx.ledger.balance(), 7);
    assert_eq!(fx.chat.history().len(), 2);
}

#[tokio::test]
async fn chat_insufficient_funds_deducts_nothing() {
    let fx = chat_fixture(Arc::new(ScriptedDirector::default()), 3);

    let denied = fx.chat.send("hello?", "local", 0).await;
    assert!(matches!(
        denied,
        Err(ChatError::InsufficientFunds { cost: 5, balance: 3 })
    ));
    assert_eq!(fx.ledger.balance(), 3);
    assert!(fx.chat.history().is_empty());
}

#[tokio::test]
async fn chat_failure_still_charges() {
    // The script is empty, so the model call fails after the debit.
    let fx = chat_fixture(Arc::new(ScriptedDirector::default()), 10);

    let reply = fx.chat.send("boss?", "local", 0).await.expect("send");
    assert_eq!(reply.reply, "...");
    assert_eq!(reply.ended, None);
    assert_eq!(fx.ledger.balance(), 5);
    assert_eq!(fx.mood.get(), Mood::Neutral);
}

#[tokio::test]
async fn chat_rate_limit_precedes_the_debit() {
    let mood = Arc::new(MoodStore::default());
    let session = Arc::new(SessionHandle::new());
    let ledger = Arc::new(Ledger::with_balance(100));
    let chat = TerminalChat::new(ChatDeps {
        config: ChatConfig::default(),
        limit: RateLimitConfig::new(1, 60_000),
        director: Arc::new(ScriptedDirector::default()),
        hub: Arc::new(EventHub::new()),
        mood,
        session,
        job: Arc::new(JobBoard::new()),
        ledger: Arc::clone(&ledger),
        sink: Arc::new(NullScoreSink),
    });

    chat.send("one", "local", 0).await.expect("send");
    let denied = chat.send("two", "local", 1_000).await;
    assert!(matches!(denied, Err(ChatError::RateLimited { .. })));
    assert_eq!(ledger.balance(), 95, "denied message must not charge");
}

#[tokio::test]
async fn chat_history_is_bounded() {
    let responses = (0..8)
        .map(|i| RawChat {
            reply: format!("reply {i}"),
            mood: "NEUTRAL".to_string(),
            game_end: "NONE".to_string(),
        })
        .collect();
    let fx = chat_fixture(Arc::new(ScriptedDirector::with_chats(responses)), 1_000);

    for i in 0..8u64 {
        fx.chat
            .send(&format!("message {i}"), "local", i)
            .await
            .expect("send");
    }

    let history = fx.chat.history();
    assert_eq!(history.len(), ChatConfig::default().history_len);
    // Oldest turns were evicted.
    assert_eq!(history[0].text, "message 3");
}

#[tokio::test]
async fn chat_end_is_sticky_across_channels() {
    let director = Arc::new(ScriptedDirector::with_chats(vec![RawChat {
        reply: "Consider yourself promoted.".to_string(),
        mood: "GENEROUS".to_string(),
        game_end: "PROMOTED".to_string(),
    }]));
    let fx = chat_fixture(director, 50);

    let reply = fx.chat.send("About my raise...", "local", 0).await.expect("send");
    assert_eq!(reply.ended, Some(GameEnd::Promoted));
    assert_eq!(fx.session.status(), SessionStatus::Won);

    // The session outcome cannot be overwritten afterwards.
    assert!(!fx.session.end(GameEnd::Fired, None));
    let after = fx.chat.send("and also...", "local", 1_000).await;
    assert!(matches!(after, Err(ChatError::SessionOver)));
}
