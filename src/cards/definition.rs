//! Card definitions - static card data.
//!
//! A card is a data record: printed stats, traits, keywords and the list of
//! ability descriptors the engine interprets uniformly. There are no per-card
//! types.
//!
//! Instance-specific data (current stats, counters, zone) is stored
//! separately in `CardInstance`.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::abilities::AbilityDescriptor;

/// Unique identifier for a card definition.
///
/// This identifies the "type" of card (e.g., "Hida Tomonatsu"),
/// not a specific instance in a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Card type identifier - games define their own types.
///
/// The engine doesn't interpret these. Games define what types exist
/// (Character, Attachment, Event, Holding, ...) and target descriptors
/// filter on them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardTypeId(pub u32);

impl CardTypeId {
    /// Create a new card type ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Static card definition.
///
/// ## Example
///
/// ```
/// use ccg_rules::cards::{CardDefinition, CardId, CardTypeId};
///
/// let card = CardDefinition::new(CardId::new(1), "Hida Guardian", CardTypeId::new(0))
///     .with_stat("military", 2)
///     .with_stat("political", 0)
///     .with_trait("bushi");
///
/// assert_eq!(card.stat("military"), 2);
/// assert!(card.has_trait("bushi"));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CardDefinition {
    /// Unique identifier for this card definition.
    pub id: CardId,

    /// Card name (for display and ability messages).
    pub name: String,

    /// Card type (game-specific, opaque to engine).
    pub card_type: CardTypeId,

    /// Printed numeric stats. Copied into each instance as its base values.
    #[serde(default)]
    pub stats: FxHashMap<String, i64>,

    #[serde(default)]
    pub traits: Vec<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    /// Printed abilities. Not serializable: descriptors may carry handlers.
    #[serde(skip)]
    pub abilities: Vec<Arc<AbilityDescriptor>>,
}

impl CardDefinition {
    /// Create a new card definition.
    #[must_use]
    pub fn new(id: CardId, name: impl Into<String>, card_type: CardTypeId) -> Self {
        Self {
            id,
            name: name.into(),
            card_type,
            stats: FxHashMap::default(),
            traits: Vec::new(),
            keywords: Vec::new(),
            abilities: Vec::new(),
        }
    }

    /// Add a printed stat (builder pattern).
    #[must_use]
    pub fn with_stat(mut self, key: impl Into<String>, value: i64) -> Self {
        self.stats.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_trait(mut self, name: impl Into<String>) -> Self {
        self.traits.push(name.into());
        self
    }

    #[must_use]
    pub fn with_keyword(mut self, name: impl Into<String>) -> Self {
        self.keywords.push(name.into());
        self
    }

    /// Add a printed ability (builder pattern).
    #[must_use]
    pub fn with_ability(mut self, ability: AbilityDescriptor) -> Self {
        self.abilities.push(Arc::new(ability));
        self
    }

    /// Printed value of a stat, 0 if absent.
    #[must_use]
    pub fn stat(&self, key: &str) -> i64 {
        self.stats.get(key).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| t == name)
    }
}
