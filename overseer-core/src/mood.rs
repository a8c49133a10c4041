//! The boss mood model.
//!
//! Sixteen moods partitioned into five severity tiers (1 = positive,
//! 5 = chaotic). The LLM is free-running text generation, so the only
//! safety rail on its mood output is severity adjacency: a proposed mood
//! is accepted iff its tier is within ±1 of the current tier. Illegal
//! proposals are silently rejected and the current mood is retained —
//! the gate fails closed and never errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the sixteen moods Jacobs can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mood {
    // Tier 1 — positive.
    /// Genuinely happy with how things are going.
    Pleased,
    /// Caught off guard by competence.
    Impressed,
    /// Feeling magnanimous; raises and favors may happen.
    Generous,

    // Tier 2 — neutral.
    /// Baseline managerial indifference.
    Neutral,
    /// Attention elsewhere; half-listening.
    Distracted,
    /// Quietly pleased with himself, not with you.
    Smug,

    // Tier 3 — annoyed.
    /// Something is grating on him.
    Irritated,
    /// Wants results now.
    Impatient,
    /// Convinced something is being hidden from him.
    Suspicious,

    // Tier 4 — hostile.
    /// Openly angry.
    Angry,
    /// Planning consequences.
    Vindictive,
    /// Calm in the way that precedes a firing.
    Menacing,

    // Tier 5 — chaotic.
    /// Shouting range.
    Furious,
    /// Erratic bursts of enthusiasm and rage.
    Manic,
    /// Everyone is out to get him.
    Paranoid,
    /// All restraint gone.
    Unhinged,
}

/// All moods, in tier order. Useful for exhaustive property tests.
pub const ALL_MOODS: [Mood; 16] = [
    Mood::Pleased,
    Mood::Impressed,
    Mood::Generous,
    Mood::Neutral,
    Mood::Distracted,
    Mood::Smug,
    Mood::Irritated,
    Mood::Impatient,
    Mood::Suspicious,
    Mood::Angry,
    Mood::Vindictive,
    Mood::Menacing,
    Mood::Furious,
    Mood::Manic,
    Mood::Paranoid,
    Mood::Unhinged,
];

impl Mood {
    /// Severity tier of this mood (1 = positive … 5 = chaotic).
    #[must_use]
    pub fn severity(self) -> u8 {
        match self {
            Self::Pleased | Self::Impressed | Self::Generous => 1,
            Self::Neutral | Self::Distracted | Self::Smug => 2,
            Self::Irritated | Self::Impatient | Self::Suspicious => 3,
            Self::Angry | Self::Vindictive | Self::Menacing => 4,
            Self::Furious | Self::Manic | Self::Paranoid | Self::Unhinged => 5,
        }
    }

    /// Wire name of this mood (uppercase, as the LLM sees it).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pleased => "PLEASED",
            Self::Impressed => "IMPRESSED",
            Self::Generous => "GENEROUS",
            Self::Neutral => "NEUTRAL",
            Self::Distracted => "DISTRACTED",
            Self::Smug => "SMUG",
            Self::Irritated => "IRRITATED",
            Self::Impatient => "IMPATIENT",
            Self::Suspicious => "SUSPICIOUS",
            Self::Angry => "ANGRY",
            Self::Vindictive => "VINDICTIVE",
            Self::Menacing => "MENACING",
            Self::Furious => "FURIOUS",
            Self::Manic => "MANIC",
            Self::Paranoid => "PARANOID",
            Self::Unhinged => "UNHINGED",
        }
    }

    /// Parse a mood name, case-insensitively.
    ///
    /// Returns `None` for anything outside the sixteen-value vocabulary;
    /// callers fail closed to the current mood.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_uppercase();
        ALL_MOODS.into_iter().find(|m| m.as_str() == upper)
    }

    /// Validate a proposed transition against the severity-adjacency rule.
    ///
    /// Returns `proposed` if `|severity(proposed) - severity(current)| <= 1`,
    /// otherwise `current` unchanged. Pure; never errors.
    #[must_use]
    pub fn validate_transition(current: Self, proposed: Self) -> Self {
        let delta = i16::from(current.severity()) - i16::from(proposed.severity());
        if delta.abs() <= 1 { proposed } else { current }
    }

    /// Gate a raw mood name from the LLM against the current mood.
    ///
    /// Unrecognized names and illegal jumps both resolve to `current`.
    #[must_use]
    pub fn gate(current: Self, proposed_name: &str) -> Self {
        match Self::from_name(proposed_name) {
            Some(proposed) => Self::validate_transition(current, proposed),
            None => current,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
