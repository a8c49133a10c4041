//! # overseer-llm — LLM boundary for the Overseer boss engine
//!
//! Every model call the boss NPC makes goes through this crate:
//!
//! - **Client** — unified interface over Ollama, OpenAI-compatible APIs,
//!   and a `None` backend (all calls error, triggering the engine's
//!   deterministic fallbacks).
//! - **Prompts** — versioned templates for the four call sites
//!   (interaction resolve, reaction, review, chat).
//! - **Sanitizer** — strips bracket characters and prompt-injection
//!   keywords from user-controllable names before they reach a prompt.
//! - **Wire DTOs** — raw, string-typed response shapes. Vocabulary
//!   coercion happens on the engine side; this crate treats model output
//!   as untrusted text, not a typed contract.
//! - **Director** — the trait seam the engine's loops call through, so
//!   tests can swap the model for a mock.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod director;
pub mod error;
pub mod prompt;
pub mod sanitize;
pub mod types;

pub use client::{LlmClient, LlmProvider};
pub use director::{Director, LlmDirector};
pub use error::LlmError;
