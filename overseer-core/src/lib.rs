//! # Overseer Core Library
//!
//! Domain model for the Overseer boss engine: the AI-driven NPC ("Jacobs")
//! whose mood, speech, and world effects are generated by an LLM in response
//! to a stream of player actions.
//!
//! This crate is the pure/storage layer — no LLM calls happen here:
//!
//! - **Mood model** — 16 moods in 5 severity tiers, with a transition gate
//!   that rejects emotionally discontinuous jumps.
//! - **Vocabularies** — the closed sets of object conditions and material
//!   tags that every LLM output is coerced into.
//! - **Event hub** — gameplay events fanned out into the global and
//!   per-phase logs.
//! - **Rate limiter** — sliding-window request counter guarding AI calls.
//! - **Rule store** — SQLite-backed cache of resolved interactions.
//! - **World store** — object states, name registry, and the job catalog.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod events;
pub mod jobs;
pub mod mood;
pub mod ratelimit;
pub mod rules;
pub mod session;
pub mod vocab;
pub mod world;

pub use config::OverseerConfig;
pub use error::CoreError;
pub use mood::Mood;
pub use vocab::{MaterialTag, ObjectCondition};
