//! Entity identification system.
//!
//! Every game object (player, card, ring, conflict) has a unique `EntityId`.
//! Abilities and effects never hold references to each other or to the cards
//! they belong to; they hold ids and resolve them through `GameState` at use
//! time.
//!
//! ## ID Layout
//!
//! IDs are allocated as follows:
//! - `0..player_count`: Reserved for players
//! - next `ring_count` ids: Rings, in configuration order
//! - next id: The conflict entity
//! - everything after: Cards
//!
//! ```
//! use ccg_rules::core::EntityId;
//!
//! let player_count = 2;
//! let p1 = EntityId::player_id(1);
//! assert!(p1.is_player(player_count));
//! assert!(!EntityId(10).is_player(player_count));
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for any game entity.
///
/// Identity is stable across the match: entities are never destroyed, only
/// relocated (cards) or reset (rings, conflict).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create an entity ID for a player by index.
    #[must_use]
    pub const fn player_id(index: u8) -> Self {
        Self(index as u32)
    }

    /// First id after the player block.
    #[must_use]
    pub const fn first_non_player(player_count: usize) -> u32 {
        player_count as u32
    }

    /// Check if this entity ID refers to a player.
    ///
    /// ```
    /// use ccg_rules::core::EntityId;
    ///
    /// assert!(EntityId(1).is_player(2));
    /// assert!(!EntityId(1).is_player(1));
    /// ```
    #[must_use]
    pub const fn is_player(self, player_count: usize) -> bool {
        self.0 < player_count as u32
    }

    /// Convert to PlayerId if this is a player entity.
    #[must_use]
    pub fn as_player(self, player_count: usize) -> Option<super::PlayerId> {
        if self.is_player(player_count) {
            Some(super::PlayerId::new(self.0 as u8))
        } else {
            None
        }
    }

    /// Entity id of a player.
    #[must_use]
    pub const fn player(id: super::PlayerId) -> Self {
        Self(id.0 as u32)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// The polymorphic family an entity belongs to.
///
/// Effects declare a target scope of one of these kinds and only ever apply to
/// entities of that kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Card,
    Player,
    Ring,
    Conflict,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Card => "card",
            EntityKind::Player => "player",
            EntityKind::Ring => "ring",
            EntityKind::Conflict => "conflict",
        };
        f.write_str(name)
    }
}
