//! Card instances - runtime card state.
//!
//! `CardInstance` represents a specific card in a game. It tracks the zone,
//! owner and controller, plus the mutable state map that holds every numeric
//! base value (printed stats are copied in at creation).
//!
//! ## Neutral Cards
//!
//! Cards can have no owner for game-controlled entities.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::definition::{CardDefinition, CardId, CardTypeId};
use crate::core::config::ZoneId;
use crate::core::entity::EntityId;
use crate::core::player::PlayerId;

/// A card instance in a game.
///
/// ## State Values (i64 only)
///
/// The `state` field is the single base-value map read by the effect engine:
/// - Printed stats (military, political, glory, cost)
/// - Status flags (bowed, honored, dishonored) as 0/1
/// - Counters (fate placed on the card)
///
/// Effects never write here; they are folded over these values on read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInstance {
    /// Unique entity ID for this instance.
    pub entity_id: EntityId,

    /// Reference to the card definition.
    pub card_id: CardId,

    pub name: String,

    pub card_type: CardTypeId,

    /// Owner (who started with this card). `None` for neutral cards.
    pub owner: Option<PlayerId>,

    /// Printed controller. Control-changing effects are folded on read.
    pub controller: Option<PlayerId>,

    /// Current zone.
    pub zone: ZoneId,

    /// Is this card face-down?
    pub face_down: bool,

    /// Mutable instance state.
    #[serde(default)]
    pub state: FxHashMap<String, i64>,

    #[serde(default)]
    pub traits: Vec<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    printed: FxHashMap<String, i64>,
}

impl std::hash::Hash for CardInstance {
    fn hash<H: std::hash::Hasher>(&self, hasher: &mut H) {
        self.entity_id.hash(hasher);
        self.card_id.hash(hasher);
        self.owner.hash(hasher);
        self.controller.hash(hasher);
        self.zone.hash(hasher);
        self.face_down.hash(hasher);

        // Hash state entries in sorted order for determinism
        let mut entries: Vec<_> = self.state.iter().collect();
        entries.sort_by_key(|(k, _)| *k);
        for (k, v) in entries {
            k.hash(hasher);
            v.hash(hasher);
        }
    }
}

impl CardInstance {
    /// Create a blank card instance with an owner.
    #[must_use]
    pub fn new(entity_id: EntityId, card_id: CardId, owner: PlayerId, zone: ZoneId) -> Self {
        Self {
            entity_id,
            card_id,
            name: card_id.to_string(),
            card_type: CardTypeId::default(),
            owner: Some(owner),
            controller: Some(owner),
            zone,
            face_down: false,
            state: FxHashMap::default(),
            traits: Vec::new(),
            keywords: Vec::new(),
            printed: FxHashMap::default(),
        }
    }

    /// Create an instance of a definition, copying its printed data.
    #[must_use]
    pub fn from_definition(
        entity_id: EntityId,
        definition: &CardDefinition,
        owner: Option<PlayerId>,
        zone: ZoneId,
    ) -> Self {
        Self {
            entity_id,
            card_id: definition.id,
            name: definition.name.clone(),
            card_type: definition.card_type,
            owner,
            controller: owner,
            zone,
            face_down: false,
            state: definition.stats.clone(),
            traits: definition.traits.clone(),
            keywords: definition.keywords.clone(),
            printed: definition.stats.clone(),
        }
    }

    /// Check if this is a neutral (ownerless) card.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        self.owner.is_none()
    }

    /// Set the printed controller.
    pub fn set_controller(&mut self, controller: Option<PlayerId>) {
        self.controller = controller;
    }

    /// Get a state value with a default.
    #[must_use]
    pub fn get_state(&self, key: &str, default: i64) -> i64 {
        self.state.get(key).copied().unwrap_or(default)
    }

    /// Set a state value.
    pub fn set_state(&mut self, key: impl Into<String>, value: i64) {
        self.state.insert(key.into(), value);
    }

    /// Modify a state value by delta.
    pub fn modify_state(&mut self, key: &str, delta: i64) {
        let current = self.get_state(key, 0);
        self.state.insert(key.to_string(), current + delta);
    }

    /// Check if a state flag is set (non-zero).
    #[must_use]
    pub fn has_flag(&self, key: &str) -> bool {
        self.get_state(key, 0) != 0
    }

    /// Set a boolean flag (1 for true, 0 for false).
    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.set_state(key, i64::from(value));
    }

    /// Restore printed values and the owner's control (the card left play).
    pub fn reset(&mut self) {
        self.state = self.printed.clone();
        self.controller = self.owner;
    }
}
