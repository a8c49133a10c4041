//! SQLite-backed cache of resolved interactions.
//!
//! Every (item, object) pairing the resolver has seen — whether authored by
//! an administrator or generated by the LLM — is stored as an
//! [`InteractionRule`] so the next identical query never reaches the model.
//! The schema is intentionally simple:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS interaction_rules (
//!     id               INTEGER PRIMARY KEY,
//!     item_id          TEXT,
//!     object_id        TEXT NOT NULL,
//!     required_state   TEXT,
//!     item_tags        TEXT NOT NULL,
//!     object_tags      TEXT NOT NULL,
//!     result_state     TEXT,
//!     output_item      TEXT,
//!     output_item_tags TEXT,
//!     description      TEXT NOT NULL,
//!     source           TEXT NOT NULL,
//!     created_at       TEXT NOT NULL
//! );
//! ```
//!
//! Tag lists are stored as sorted JSON arrays for stable lookup. WAL mode
//! keeps reads cheap during gameplay.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{Connection, OpenFlags, params};
use tracing::{debug, info};

use crate::error::{CoreError, Result};
use crate::vocab::ObjectCondition;

/// Who authored a cached rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSource {
    /// Hand-written by an administrator.
    Manual,
    /// Generated by the LLM on a cache miss.
    Ai,
}

impl RuleSource {
    /// Column value for this source.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Ai => "ai",
        }
    }

    fn from_column(value: &str) -> Self {
        if value == "manual" { Self::Manual } else { Self::Ai }
    }
}

/// One cached interaction outcome.
///
/// Lookup key is `(item_id, object_id)`; among matches, a rule whose
/// `required_state` equals the queried object's current state beats a
/// wildcard rule (`required_state = None`).
#[derive(Debug, Clone)]
pub struct InteractionRule {
    /// Item used, or `None` for bare hands.
    pub item_id: Option<String>,
    /// Object acted on.
    pub object_id: String,
    /// Object condition this rule applies to; `None` matches any.
    pub required_state: Option<ObjectCondition>,
    /// Sorted tag names of the item at resolution time.
    pub item_tags: Vec<String>,
    /// Sorted tag names of the object at resolution time.
    pub object_tags: Vec<String>,
    /// New condition to apply to the object, if any.
    pub result_state: Option<ObjectCondition>,
    /// Item produced by the interaction, if any.
    pub output_item: Option<String>,
    /// Tags of the produced item (empty when no item is produced).
    pub output_item_tags: Vec<String>,
    /// Player-facing description of what happened.
    pub description: String,
    /// Who authored this rule.
    pub source: RuleSource,
}

/// Select the best rule for a queried state: exact `required_state` match
/// first, wildcard second, otherwise none (cache miss).
#[must_use]
pub fn best_match<'a>(
    rules: &'a [InteractionRule],
    state: Option<ObjectCondition>,
) -> Option<&'a InteractionRule> {
    rules
        .iter()
        .find(|r| r.required_state.is_some() && r.required_state == state)
        .or_else(|| rules.iter().find(|r| r.required_state.is_none()))
}

/// Handle to the SQLite interaction-rule cache.
pub struct RuleStore {
    conn: Connection,
    db_path: PathBuf,
}

impl std::fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS interaction_rules (
    id               INTEGER PRIMARY KEY,
    item_id          TEXT,
    object_id        TEXT NOT NULL,
    required_state   TEXT,
    item_tags        TEXT NOT NULL,
    object_tags      TEXT NOT NULL,
    result_state     TEXT,
    output_item      TEXT,
    output_item_tags TEXT,
    description      TEXT NOT NULL,
    source           TEXT NOT NULL,
    created_at       TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_rules_pair ON interaction_rules (object_id, item_id);";

impl RuleStore {
    /// Open (or create) the rule cache at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %db_path.display(), "Interaction rule cache opened");

        Ok(Self { conn, db_path })
    }

    /// Open an in-memory cache (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Database`] on SQLite failures.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Insert a rule. Tag lists are sorted before storage.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Database`] or [`CoreError::Serialization`];
    /// callers on the resolve path treat failures as non-fatal.
    pub fn insert(&self, rule: &InteractionRule) -> Result<()> {
        let mut item_tags = rule.item_tags.clone();
        item_tags.sort();
        let mut object_tags = rule.object_tags.clone();
        object_tags.sort();
        let mut output_tags = rule.output_item_tags.clone();
        output_tags.sort();

        let encode = |tags: &Vec<String>| {
            serde_json::to_string(tags).map_err(|e| CoreError::Serialization(e.to_string()))
        };

        self.conn.execute(
            "INSERT INTO interaction_rules
                (item_id, object_id, required_state, item_tags, object_tags,
                 result_state, output_item, output_item_tags, description,
                 source, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                rule.item_id,
                rule.object_id,
                rule.required_state.map(ObjectCondition::as_str),
                encode(&item_tags)?,
                encode(&object_tags)?,
                rule.result_state.map(ObjectCondition::as_str),
                rule.output_item,
                encode(&output_tags)?,
                rule.description,
                rule.source.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        debug!(
            object = %rule.object_id,
            item = rule.item_id.as_deref().unwrap_or("<hands>"),
            source = rule.source.as_str(),
            "Cached interaction rule"
        );

        Ok(())
    }

    /// All rules matching the `(item_id, object_id)` lookup key.
    ///
    /// `item_id = None` matches only bare-hands rules.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Database`] on SQLite failures.
    pub fn find_matching(
        &self,
        item_id: Option<&str>,
        object_id: &str,
    ) -> Result<Vec<InteractionRule>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT item_id, object_id, required_state, item_tags, object_tags,
                    result_state, output_item, output_item_tags, description, source
             FROM interaction_rules
             WHERE object_id = ?1
               AND ((?2 IS NULL AND item_id IS NULL) OR item_id = ?2)
             ORDER BY id",
        )?;

        let rows = stmt.query_map(params![object_id, item_id], |row| {
            Ok(RawRow {
                item_id: row.get(0)?,
                object_id: row.get(1)?,
                required_state: row.get(2)?,
                item_tags: row.get(3)?,
                object_tags: row.get(4)?,
                result_state: row.get(5)?,
                output_item: row.get(6)?,
                output_item_tags: row.get(7)?,
                description: row.get(8)?,
                source: row.get(9)?,
            })
        })?;

        let mut rules = Vec::new();
        for row in rows {
            rules.push(row?.decode()?);
        }
        Ok(rules)
    }
}

struct RawRow {
    item_id: Option<String>,
    object_id: String,
    required_state: Option<String>,
    item_tags: String,
    object_tags: String,
    result_state: Option<String>,
    output_item: Option<String>,
    output_item_tags: Option<String>,
    description: String,
    source: String,
}

impl RawRow {
    fn decode(self) -> Result<InteractionRule> {
        let decode_tags = |text: Option<String>| -> Result<Vec<String>> {
            match text {
                None => Ok(Vec::new()),
                Some(t) => {
                    serde_json::from_str(&t).map_err(|e| CoreError::Serialization(e.to_string()))
                }
            }
        };

        Ok(InteractionRule {
            item_id: self.item_id,
            object_id: self.object_id,
            required_state: self.required_state.as_deref().and_then(ObjectCondition::from_name),
            item_tags: decode_tags(Some(self.item_tags))?,
            object_tags: decode_tags(Some(self.object_tags))?,
            result_state: self.result_state.as_deref().and_then(ObjectCondition::from_name),
            output_item: self.output_item,
            output_item_tags: decode_tags(self.output_item_tags)?,
            description: self.description,
            source: RuleSource::from_column(&self.source),
        })
    }
}
