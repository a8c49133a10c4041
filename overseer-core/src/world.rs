//! World object store and name registry.
//!
//! The world builder registers every interactable object at scene load;
//! the core reads snapshots and writes through a single `set_states`
//! operation. Name lookup is case-insensitive because effect targets come
//! back from the LLM as display names.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vocab::{MaterialTag, ObjectCondition};

/// Unique identifier for a world object instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    /// Create a new random object ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered world object: permanent tags, mutable conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldObject {
    /// Instance id.
    pub id: ObjectId,
    /// Display name ("Copier", "Break Room Door").
    pub name: String,
    /// Material tags, assigned at creation and never mutated.
    pub tags: Vec<MaterialTag>,
    /// Current conditions (single-valued in practice).
    pub states: Vec<ObjectCondition>,
    /// Structural doors are excluded from job assignment.
    pub is_door: bool,
}

impl WorldObject {
    /// Register-ready object with no initial conditions.
    #[must_use]
    pub fn new(name: impl Into<String>, tags: Vec<MaterialTag>) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            tags,
            states: Vec::new(),
            is_door: false,
        }
    }

    /// Mark this object as a structural door.
    #[must_use]
    pub fn door(mut self) -> Self {
        self.is_door = true;
        self
    }

    /// Set the initial conditions.
    #[must_use]
    pub fn with_states(mut self, states: Vec<ObjectCondition>) -> Self {
        self.states = states;
        self
    }

    /// One-line description for prompts: `name [tags] — STATES`.
    #[must_use]
    pub fn describe(&self) -> String {
        let tags = self
            .tags
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        if self.states.is_empty() {
            format!("{} [{}]", self.name, tags)
        } else {
            let states = self
                .states
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} [{}]: {}", self.name, tags, states)
        }
    }
}

#[derive(Debug, Default)]
struct WorldInner {
    objects: HashMap<ObjectId, WorldObject>,
    names: HashMap<String, ObjectId>,
}

/// Shared world object store.
#[derive(Debug, Default)]
pub struct WorldStore {
    inner: RwLock<WorldInner>,
}

impl WorldStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object; its name becomes resolvable case-insensitively.
    pub fn register(&self, object: WorldObject) -> ObjectId {
        let id = object.id;
        let mut inner = self.inner.write();
        inner.names.insert(object.name.to_lowercase(), id);
        inner.objects.insert(id, object);
        id
    }

    /// Resolve a display name to an object id, case-insensitively.
    #[must_use]
    pub fn resolve_name(&self, name: &str) -> Option<ObjectId> {
        self.inner.read().names.get(&name.to_lowercase()).copied()
    }

    /// Fetch a copy of one object.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<WorldObject> {
        self.inner.read().objects.get(&id).cloned()
    }

    /// Replace an object's conditions. Returns `false` for unknown ids.
    pub fn set_states(&self, id: ObjectId, states: Vec<ObjectCondition>) -> bool {
        let mut inner = self.inner.write();
        match inner.objects.get_mut(&id) {
            Some(object) => {
                object.states = states;
                true
            }
            None => false,
        }
    }

    /// Snapshot of every object, sorted by name for stable prompt output.
    #[must_use]
    pub fn snapshot(&self) -> Vec<WorldObject> {
        let mut objects: Vec<WorldObject> = self.inner.read().objects.values().cloned().collect();
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        objects
    }

    /// Snapshot restricted to non-door objects (the job catalog).
    #[must_use]
    pub fn catalog(&self) -> Vec<WorldObject> {
        self.snapshot().into_iter().filter(|o| !o.is_door).collect()
    }
}
