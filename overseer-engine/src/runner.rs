//! Engine assembly and the async runner.
//!
//! [`Engine`] wires the shared state handles into the four subsystems and
//! spawns the two background loops (reaction polling and the one-second
//! phase tick). The host registers world objects, calls [`Engine::start`],
//! and then drives the resolver and chat from its input handling.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::task::JoinHandle;
use tracing::info;

use overseer_core::config::{LlmSettings, OverseerConfig};
use overseer_core::events::EventHub;
use overseer_core::mood::ALL_MOODS;
use overseer_core::rules::RuleStore;
use overseer_core::vocab::{ALL_CONDITIONS, ALL_TAGS};
use overseer_core::world::WorldStore;
use overseer_llm::client::LlmProvider;
use overseer_llm::director::VocabLists;
use overseer_llm::{Director, LlmClient, LlmDirector};

use crate::chat::{ChatDeps, TerminalChat};
use crate::phase::{PhaseDeps, PhaseLifecycle};
use crate::reaction::{ReactionDeps, ReactionLoop, ReactionTick};
use crate::resolver::InteractionResolver;
use crate::state::{JobBoard, Ledger, MoodStore, ScoreSink, SessionHandle, SpeechBoard};

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

/// Build the production director from backend settings.
#[must_use]
pub fn build_director(settings: &LlmSettings) -> Arc<dyn Director> {
    let provider = match settings.provider.as_str() {
        "ollama" => LlmProvider::Ollama {
            base_url: settings.base_url.clone(),
        },
        "openai" => LlmProvider::OpenAiCompatible {
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
        },
        other => {
            if other != "none" {
                info!(provider = other, "Unknown LLM provider, running without one");
            }
            LlmProvider::None
        }
    };

    let client = LlmClient::new(provider, settings.model.clone(), settings.max_retries);
    let vocab = VocabLists {
        moods: join_names(ALL_MOODS.iter().map(|m| m.as_str())),
        states: join_names(ALL_CONDITIONS.iter().map(|c| c.as_str())),
        tags: join_names(ALL_TAGS.iter().map(|t| t.as_str())),
    };

    Arc::new(LlmDirector::new(client, vocab, settings.timeout_ms))
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// The assembled boss engine. One instance per session.
pub struct Engine {
    /// Interaction resolution endpoint.
    pub resolver: Arc<InteractionResolver>,
    /// Terminal chat endpoint.
    pub chat: Arc<TerminalChat>,
    /// The periodic reaction driver.
    pub reaction: Arc<ReactionLoop>,
    /// The phase/review lifecycle.
    pub phase: Arc<PhaseLifecycle>,
    /// Event hub; the world layer records gameplay events here.
    pub hub: Arc<EventHub>,
    /// World object store.
    pub world: Arc<WorldStore>,
    /// Current mood.
    pub mood: Arc<MoodStore>,
    /// Session status.
    pub session: Arc<SessionHandle>,
    /// Speech display.
    pub speech: Arc<SpeechBoard>,
    /// Currency, clock, and review history.
    pub ledger: Arc<Ledger>,
    config: OverseerConfig,
}

impl Engine {
    /// Wire up an engine over an opened rule cache and a populated world.
    #[must_use]
    pub fn new(
        config: OverseerConfig,
        rules: RuleStore,
        world: Arc<WorldStore>,
        director: Arc<dyn Director>,
        sink: Arc<dyn ScoreSink>,
    ) -> Self {
        let hub = Arc::new(EventHub::new());
        let mood = Arc::new(MoodStore::default());
        let session = Arc::new(SessionHandle::new());
        let speech = Arc::new(SpeechBoard::new());
        let job = Arc::new(JobBoard::new());
        let ledger = Arc::new(Ledger::default());
        let review_gate = Arc::new(AtomicBool::new(false));

        let resolver = Arc::new(InteractionResolver::new(
            rules,
            config.limits.resolve,
            Arc::clone(&director),
            Arc::clone(&hub),
        ));

        let reaction = Arc::new(ReactionLoop::new(ReactionDeps {
            config: config.reaction.clone(),
            limit: config.limits.reaction,
            director: Arc::clone(&director),
            hub: Arc::clone(&hub),
            world: Arc::clone(&world),
            mood: Arc::clone(&mood),
            session: Arc::clone(&session),
            speech: Arc::clone(&speech),
            job: Arc::clone(&job),
            ledger: Arc::clone(&ledger),
            sink: Arc::clone(&sink),
            review_gate: Arc::clone(&review_gate),
        }));

        let phase = Arc::new(PhaseLifecycle::new(PhaseDeps {
            config: config.phase.clone(),
            limit: config.limits.review,
            director: Arc::clone(&director),
            hub: Arc::clone(&hub),
            world: Arc::clone(&world),
            mood: Arc::clone(&mood),
            session: Arc::clone(&session),
            speech: Arc::clone(&speech),
            job: Arc::clone(&job),
            ledger: Arc::clone(&ledger),
            sink: Arc::clone(&sink),
            review_gate,
        }));

        let chat = Arc::new(TerminalChat::new(ChatDeps {
            config: config.chat.clone(),
            limit: config.limits.chat,
            director,
            hub: Arc::clone(&hub),
            mood: Arc::clone(&mood),
            session: Arc::clone(&session),
            job,
            ledger: Arc::clone(&ledger),
            sink,
        }));

        Self {
            resolver,
            chat,
            reaction,
            phase,
            hub,
            world,
            mood,
            session,
            speech,
            ledger,
            config,
        }
    }

    /// Assign the first job. Call once after the world is registered.
    pub fn start(&self, now_ms: u64) {
        info!("Engine starting");
        self.phase.start(now_ms);
    }

    /// Spawn the background loops. Both exit on their own once the
    /// session ends.
    #[must_use]
    pub fn spawn(&self) -> Vec<JoinHandle<()>> {
        let reaction = Arc::clone(&self.reaction);
        let poll_interval = Duration::from_millis(self.config.reaction.poll_interval_ms);
        let reaction_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            loop {
                interval.tick().await;
                if reaction.tick(now_ms()).await == ReactionTick::SessionOver {
                    break;
                }
            }
            info!("Reaction loop stopped");
        });

        let phase = Arc::clone(&self.phase);
        let session = Arc::clone(&self.session);
        let phase_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                let _ = phase.tick_second(now_ms()).await;
                if !session.is_playing() {
                    break;
                }
            }
            info!("Phase loop stopped");
        });

        vec![reaction_task, phase_task]
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
