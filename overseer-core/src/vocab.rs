//! Closed vocabularies shared with the LLM boundary.
//!
//! Every state or tag coming back from the model is parsed against these
//! enums; anything outside the vocabulary is coerced to `None` or dropped
//! before it crosses into core logic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mutable condition of a world object (the `states` list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectCondition {
    /// Cannot be opened or operated.
    Locked,
    /// Open for use.
    Unlocked,
    /// Receiving power.
    Powered,
    /// Power cut.
    Unpowered,
    /// Damaged beyond normal use.
    Broken,
    /// On fire.
    Burning,
    /// Under water.
    Flooded,
    /// Mechanically stuck.
    Jammed,
    /// Software compromised.
    Hacked,
    /// Unsafe to touch.
    Contaminated,
}

/// All object conditions.
pub const ALL_CONDITIONS: [ObjectCondition; 10] = [
    ObjectCondition::Locked,
    ObjectCondition::Unlocked,
    ObjectCondition::Powered,
    ObjectCondition::Unpowered,
    ObjectCondition::Broken,
    ObjectCondition::Burning,
    ObjectCondition::Flooded,
    ObjectCondition::Jammed,
    ObjectCondition::Hacked,
    ObjectCondition::Contaminated,
];

impl ObjectCondition {
    /// Wire name (uppercase).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "LOCKED",
            Self::Unlocked => "UNLOCKED",
            Self::Powered => "POWERED",
            Self::Unpowered => "UNPOWERED",
            Self::Broken => "BROKEN",
            Self::Burning => "BURNING",
            Self::Flooded => "FLOODED",
            Self::Jammed => "JAMMED",
            Self::Hacked => "HACKED",
            Self::Contaminated => "CONTAMINATED",
        }
    }

    /// Parse a condition name, case-insensitively. Total: out-of-vocabulary
    /// input yields `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_uppercase();
        ALL_CONDITIONS.into_iter().find(|c| c.as_str() == upper)
    }
}

impl fmt::Display for ObjectCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Permanent material/physical-property tag assigned to items and objects
/// at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialTag {
    /// Catches fire.
    Flammable,
    /// Carries current.
    Conductive,
    /// Breaks when dropped.
    Fragile,
    /// Hard to lift.
    Heavy,
    /// Made of metal.
    Metallic,
    /// Made of wood.
    Wooden,
    /// Made of glass.
    Glass,
    /// Is or holds liquid.
    Liquid,
    /// Has circuitry.
    Electronic,
    /// Cuts things.
    Sharp,
    /// Cushioned.
    Soft,
    /// Made of paper.
    Paper,
    /// Made of plastic.
    Plastic,
    /// Attracts metal.
    Magnetic,
    /// Soaks up liquid.
    Absorbent,
    /// Can be eaten.
    Edible,
}

/// All material tags.
pub const ALL_TAGS: [MaterialTag; 16] = [
    MaterialTag::Flammable,
    MaterialTag::Conductive,
    MaterialTag::Fragile,
    MaterialTag::Heavy,
    MaterialTag::Metallic,
    MaterialTag::Wooden,
    MaterialTag::Glass,
    MaterialTag::Liquid,
    MaterialTag::Electronic,
    MaterialTag::Sharp,
    MaterialTag::Soft,
    MaterialTag::Paper,
    MaterialTag::Plastic,
    MaterialTag::Magnetic,
    MaterialTag::Absorbent,
    MaterialTag::Edible,
];

impl MaterialTag {
    /// Wire name (lowercase).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flammable => "flammable",
            Self::Conductive => "conductive",
            Self::Fragile => "fragile",
            Self::Heavy => "heavy",
            Self::Metallic => "metallic",
            Self::Wooden => "wooden",
            Self::Glass => "glass",
            Self::Liquid => "liquid",
            Self::Electronic => "electronic",
            Self::Sharp => "sharp",
            Self::Soft => "soft",
            Self::Paper => "paper",
            Self::Plastic => "plastic",
            Self::Magnetic => "magnetic",
            Self::Absorbent => "absorbent",
            Self::Edible => "edible",
        }
    }

    /// Parse a tag name, case-insensitively. Out-of-vocabulary input yields
    /// `None` so callers can filter rather than fail.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        ALL_TAGS.into_iter().find(|t| t.as_str() == lower)
    }
}

impl fmt::Display for MaterialTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Format a tag list the way prompts and rule rows expect: sorted,
/// lowercase names.
#[must_use]
pub fn sorted_tag_names(tags: &[MaterialTag]) -> Vec<String> {
    let mut names: Vec<String> = tags.iter().map(|t| t.as_str().to_string()).collect();
    names.sort();
    names.dedup();
    names
}
