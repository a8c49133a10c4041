//! Session lifecycle state.
//!
//! A session is `PLAYING` until exactly one terminal transition fires
//! (`PROMOTED`, `ESCAPED`, `FIRED`, `TIME_UP`). Terminal states are sticky:
//! no further mood or phase processing happens after one.

use serde::{Deserialize, Serialize};

/// Whether the session is live or finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// The game loop is live.
    Playing,
    /// Ended well for the player.
    Won,
    /// Ended badly for the player.
    Lost,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEnd {
    /// Jacobs promoted the player. A win.
    Promoted,
    /// The player got out. A win.
    Escaped,
    /// Jacobs fired the player. A loss.
    Fired,
    /// The in-game clock ran out. A loss.
    TimeUp,
}

impl GameEnd {
    /// Wire name of this end type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Promoted => "PROMOTED",
            Self::Escaped => "ESCAPED",
            Self::Fired => "FIRED",
            Self::TimeUp => "TIME_UP",
        }
    }

    /// Terminal status this end resolves to.
    #[must_use]
    pub fn outcome(self) -> SessionStatus {
        match self {
            Self::Promoted | Self::Escaped => SessionStatus::Won,
            Self::Fired | Self::TimeUp => SessionStatus::Lost,
        }
    }
}

/// Parse a `game_end` value from the LLM.
///
/// `"NONE"`, empty, and out-of-vocabulary values all mean "no end" — the
/// whitelist fails closed to continuing play.
#[must_use]
pub fn parse_game_end(value: &str) -> Option<GameEnd> {
    match value.trim().to_uppercase().as_str() {
        "PROMOTED" => Some(GameEnd::Promoted),
        "ESCAPED" => Some(GameEnd::Escaped),
        "FIRED" => Some(GameEnd::Fired),
        "TIME_UP" => Some(GameEnd::TimeUp),
        _ => None,
    }
}

/// Full session state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Live or terminal status.
    pub status: SessionStatus,
    /// How the session ended, once it has.
    pub end_type: Option<GameEnd>,
    /// Jacobs' final line, shown on the end screen.
    pub end_speech: Option<String>,
}

impl SessionState {
    /// A fresh, live session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Playing,
            end_type: None,
            end_speech: None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Player-visible running totals, embedded in review and chat prompts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    /// Player currency balance.
    pub currency: i64,
    /// In-game seconds elapsed.
    pub elapsed_secs: u64,
    /// Reviews completed so far.
    pub phases_completed: u32,
    /// Scores from past reviews, oldest first.
    pub review_scores: Vec<u8>,
}
