//! Coercion of raw model output into the closed domain vocabularies.
//!
//! Every field crossing the LLM boundary is re-validated here. Unknown
//! condition names, tag names, and end types are dropped rather than
//! propagated, so nothing outside the domain enums ever reaches shared
//! state. Mood names stay raw: the transition gate in
//! [`crate::state::MoodStore`] is their single point of entry.

use overseer_core::session::{parse_game_end, GameEnd};
use overseer_core::vocab::{MaterialTag, ObjectCondition};
use overseer_llm::types::{RawChat, RawReaction, RawResolve, RawReview};

/// Speech used when a call site falls back and has nothing to say.
pub const PLACEHOLDER_SPEECH: &str = "...";

/// Description used when resolution falls back or comes back empty.
pub const FALLBACK_DESCRIPTION: &str = "That doesn't seem to work.";

const CHANGE_STATE: &str = "CHANGE_STATE";
const MAX_SCORE: i64 = 10;

// ---------------------------------------------------------------------------
// Resolve
// ---------------------------------------------------------------------------

/// A validated interaction outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFields {
    /// New object condition, if the interaction changes it.
    pub result_state: Option<ObjectCondition>,
    /// Item produced by the interaction, if any.
    pub output_item: Option<String>,
    /// Tags on the produced item. `Some` only when an item is produced.
    pub output_item_tags: Option<Vec<MaterialTag>>,
    /// Player-facing description.
    pub description: String,
}

impl ResolvedFields {
    /// The no-op outcome used when resolution cannot be performed.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            result_state: None,
            output_item: None,
            output_item_tags: None,
            description: FALLBACK_DESCRIPTION.to_string(),
        }
    }
}

/// Coerce a raw resolve response.
///
/// Unknown states become `None`, unknown tags are filtered out, and the
/// output item and its tags are coupled: no item means no tags.
#[must_use]
pub fn validate_resolve(raw: RawResolve) -> ResolvedFields {
    let result_state = raw
        .result_state
        .as_deref()
        .and_then(ObjectCondition::from_name);

    let output_item = raw
        .output_item
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    let output_item_tags = if output_item.is_some() {
        raw.output_item_tags
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| MaterialTag::from_name(t))
                    .collect::<Vec<_>>()
            })
            .filter(|tags| !tags.is_empty())
    } else {
        None
    };

    let description = if raw.description.trim().is_empty() {
        FALLBACK_DESCRIPTION.to_string()
    } else {
        raw.description
    };

    ResolvedFields {
        result_state,
        output_item,
        output_item_tags,
        description,
    }
}

// ---------------------------------------------------------------------------
// Reaction
// ---------------------------------------------------------------------------

/// A validated world effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    /// Display name of the target object, matched case-insensitively.
    pub target_name: String,
    /// Condition to set.
    pub new_state: ObjectCondition,
}

/// A validated reaction.
#[derive(Debug, Clone)]
pub struct Reaction {
    /// What Jacobs says. May be the placeholder.
    pub speech: String,
    /// Proposed mood name, still subject to the transition gate.
    pub mood: String,
    /// Session end, if the model called one.
    pub game_end: Option<GameEnd>,
    /// Surviving world effects.
    pub effects: Vec<Effect>,
}

/// Coerce a raw reaction. Effects with an unrecognized type or condition
/// are dropped individually; the rest of the reaction survives.
#[must_use]
pub fn validate_reaction(raw: RawReaction) -> Reaction {
    let effects = raw
        .effects
        .into_iter()
        .filter(|e| e.effect_type == CHANGE_STATE)
        .filter_map(|e| {
            let new_state = ObjectCondition::from_name(&e.new_state)?;
            Some(Effect {
                target_name: e.target_name,
                new_state,
            })
        })
        .collect();

    Reaction {
        speech: nonempty_or_placeholder(raw.speech),
        mood: raw.mood,
        game_end: parse_game_end(&raw.game_end),
        effects,
    }
}

/// The reaction used when the model is unavailable: no speech, no mood
/// change, no effects.
#[must_use]
pub fn fallback_reaction(current_mood: &str) -> Reaction {
    Reaction {
        speech: PLACEHOLDER_SPEECH.to_string(),
        mood: current_mood.to_string(),
        game_end: None,
        effects: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

/// A validated phase review.
#[derive(Debug, Clone)]
pub struct Review {
    /// The review speech.
    pub speech: String,
    /// Score, clamped to 0..=10.
    pub score: u8,
    /// Proposed mood name.
    pub mood: String,
    /// Session end, if the review was decisive.
    pub game_end: Option<GameEnd>,
}

/// Coerce a raw review. Out-of-range scores are clamped, never rejected.
#[must_use]
pub fn validate_review(raw: RawReview) -> Review {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = raw.score.clamp(0, MAX_SCORE) as u8;
    Review {
        speech: nonempty_or_placeholder(raw.speech),
        score,
        mood: raw.mood,
        game_end: parse_game_end(&raw.game_end),
    }
}

/// The review used when the model is unavailable: zero score, placeholder
/// speech, no mood change.
#[must_use]
pub fn fallback_review(current_mood: &str) -> Review {
    Review {
        speech: PLACEHOLDER_SPEECH.to_string(),
        score: 0,
        mood: current_mood.to_string(),
        game_end: None,
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A validated chat reply.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Jacobs' reply text.
    pub reply: String,
    /// Proposed mood name.
    pub mood: String,
    /// Session end, if the exchange was decisive.
    pub game_end: Option<GameEnd>,
}

/// Coerce a raw chat response.
#[must_use]
pub fn validate_chat(raw: RawChat) -> ChatOutcome {
    ChatOutcome {
        reply: nonempty_or_placeholder(raw.reply),
        mood: raw.mood,
        game_end: parse_game_end(&raw.game_end),
    }
}

/// The chat reply used when the model is unavailable.
#[must_use]
pub fn fallback_chat(current_mood: &str) -> ChatOutcome {
    ChatOutcome {
        reply: PLACEHOLDER_SPEECH.to_string(),
        mood: current_mood.to_string(),
        game_end: None,
    }
}

fn nonempty_or_placeholder(text: String) -> String {
    if text.trim().is_empty() {
        PLACEHOLDER_SPEECH.to_string()
    } else {
        text
    }
}
