//! Gameplay events and the dual-log event hub.
//!
//! A single player action is recorded once and fanned out into two
//! independently-lifecycled logs over the same stream: the global log
//! (consumed by the reaction loop) and the phase log (consumed by the
//! review step). Draining one never touches the other.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use parking_lot::Mutex;

/// Kind of gameplay event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Player used an item on an object (or bare hands).
    Interaction,
    /// Player picked up an item.
    Pickup,
    /// Player dropped an item.
    Drop,
    /// A world object changed condition.
    StateChange,
    /// Player sent a message through the terminal.
    TerminalChat,
    /// Player moved between rooms.
    RoomChange,
}

impl EventKind {
    /// Wire name of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Interaction => "INTERACTION",
            Self::Pickup => "PICKUP",
            Self::Drop => "DROP",
            Self::StateChange => "STATE_CHANGE",
            Self::TerminalChat => "TERMINAL_CHAT",
            Self::RoomChange => "ROOM_CHANGE",
        }
    }
}

/// A structured gameplay event. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameplayEvent {
    /// What happened.
    pub kind: EventKind,
    /// Wall-clock milliseconds when it happened.
    pub timestamp_ms: u64,
    /// Who did it (the local player in practice).
    pub actor_id: String,
    /// Free-form scalar/list details ("item", "object", "room", …).
    pub details: BTreeMap<String, serde_json::Value>,
}

impl GameplayEvent {
    /// Create an event with no details.
    #[must_use]
    pub fn new(kind: EventKind, actor_id: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            kind,
            timestamp_ms,
            actor_id: actor_id.into(),
            details: BTreeMap::new(),
        }
    }

    /// Attach a detail field.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// One-line human-readable summary, used when embedding events in prompts.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.details.is_empty() {
            return format!("{} by {}", self.kind.as_str(), self.actor_id);
        }
        let detail_str = self
            .details
            .iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => format!("{k}={s}"),
                other => format!("{k}={other}"),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} by {}: {}", self.kind.as_str(), self.actor_id, detail_str)
    }
}

#[derive(Debug, Default)]
struct Logs {
    global: Vec<GameplayEvent>,
    phase: Vec<GameplayEvent>,
}

/// Fan-out event recorder over the global and phase logs.
///
/// Single-threaded producer; append order is the only ordering guarantee.
#[derive(Debug, Default)]
pub struct EventHub {
    logs: Mutex<Logs>,
}

impl EventHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event into every active log.
    pub fn record(&self, event: GameplayEvent) {
        let mut logs = self.logs.lock();
        logs.global.push(event.clone());
        logs.phase.push(event);
    }

    /// Number of events currently in the global log.
    #[must_use]
    pub fn global_len(&self) -> usize {
        self.logs.lock().global.len()
    }

    /// Drain and clear the global log.
    #[must_use]
    pub fn drain_global(&self) -> Vec<GameplayEvent> {
        std::mem::take(&mut self.logs.lock().global)
    }

    /// Drain and clear the phase log.
    #[must_use]
    pub fn drain_phase(&self) -> Vec<GameplayEvent> {
        std::mem::take(&mut self.logs.lock().phase)
    }

    /// Clear the phase log without reading it (new phase starting).
    pub fn reset_phase(&self) {
        self.logs.lock().phase.clear();
    }

    /// Last `n` events from the global log, oldest first, without draining.
    #[must_use]
    pub fn recent_global(&self, n: usize) -> Vec<GameplayEvent> {
        let logs = self.logs.lock();
        let start = logs.global.len().saturating_sub(n);
        logs.global[start..].to_vec()
    }
}
