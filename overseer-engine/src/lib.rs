//! # overseer-engine — the boss behavior loops
//!
//! Wires the domain model (`overseer-core`) to the LLM boundary
//! (`overseer-llm`) and runs the four coupled subsystems:
//!
//! - **Interaction resolver** — cache-first, AI-fallback resolution of
//!   item/object pairings, invoked synchronously per player action.
//! - **Reaction loop** — batches gameplay events and periodically asks
//!   Jacobs for a mood, speech, and world effects.
//! - **Phase/review lifecycle** — the timed task-assignment and grading
//!   cycle that drives currency, mood, and win/loss conditions.
//! - **Terminal chat** — the turn-based conversational channel.
//!
//! Shared state (mood, session, speech, job, ledger) lives in explicitly
//! owned handles injected into each component; there are no globals. The
//! model is treated as untrusted and possibly unavailable: every call site
//! has a deterministic fallback, so gameplay never blocks on AI failure.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chat;
pub mod phase;
pub mod reaction;
pub mod resolver;
pub mod runner;
pub mod state;
pub mod validate;

pub use chat::{ChatError, ChatReply, TerminalChat};
pub use phase::PhaseLifecycle;
pub use reaction::ReactionLoop;
pub use resolver::{InteractionResolver, ResolveError};
pub use runner::Engine;
