//! Shared board entities: rings and the conflict.
//!
//! Both are persistent entities with stable ids. They are never destroyed,
//! only reset (rings at the end of a round, the conflict when it ends).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::{EntityId, PlayerId};

/// A shared ring carrying an elemental identity and a resource pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ring {
    pub entity_id: EntityId,
    pub element: String,
    pub claimed_by: Option<PlayerId>,
    pub contested: bool,
    /// Numeric ring state ("fate" and anything games add).
    #[serde(default)]
    pub state: FxHashMap<String, i64>,
}

impl Ring {
    #[must_use]
    pub fn new(entity_id: EntityId, element: impl Into<String>) -> Self {
        Self {
            entity_id,
            element: element.into(),
            claimed_by: None,
            contested: false,
            state: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn get_state(&self, key: &str, default: i64) -> i64 {
        self.state.get(key).copied().unwrap_or(default)
    }

    pub fn modify_state(&mut self, key: &str, delta: i64) {
        *self.state.entry(key.to_string()).or_insert(0) += delta;
    }

    /// Return the ring to the unclaimed pool. The resource pool is kept.
    pub fn reset(&mut self) {
        self.claimed_by = None;
        self.contested = false;
    }
}

/// Which side of a conflict a card is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Attacking,
    Defending,
    Either,
}

/// The conflict entity.
///
/// There is exactly one; it is active between `Game::start_conflict` and the
/// end of the after-conflict window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub entity_id: EntityId,
    pub active: bool,
    pub conflict_type: String,
    pub attacker: Option<PlayerId>,
    pub defender: Option<PlayerId>,
    pub ring: Option<EntityId>,
    pub attackers: Vec<EntityId>,
    pub defenders: Vec<EntityId>,
    pub winner: Option<PlayerId>,
    pub loser: Option<PlayerId>,
    #[serde(default)]
    pub state: FxHashMap<String, i64>,
}

impl Conflict {
    #[must_use]
    pub fn new(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            active: false,
            conflict_type: String::new(),
            attacker: None,
            defender: None,
            ring: None,
            attackers: Vec::new(),
            defenders: Vec::new(),
            winner: None,
            loser: None,
            state: FxHashMap::default(),
        }
    }

    /// Check whether `card` participates on `side`.
    #[must_use]
    pub fn is_participating(&self, card: EntityId, side: Side) -> bool {
        if !self.active {
            return false;
        }
        match side {
            Side::Attacking => self.attackers.contains(&card),
            Side::Defending => self.defenders.contains(&card),
            Side::Either => self.attackers.contains(&card) || self.defenders.contains(&card),
        }
    }

    /// Drop a card from both sides (it left play).
    pub fn remove_participant(&mut self, card: EntityId) {
        self.attackers.retain(|&c| c != card);
        self.defenders.retain(|&c| c != card);
    }

    #[must_use]
    pub fn get_state(&self, key: &str, default: i64) -> i64 {
        self.state.get(key).copied().unwrap_or(default)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.entity_id);
    }
}

/// Parameters for declaring a conflict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictDeclaration {
    pub attacker: PlayerId,
    pub defender: PlayerId,
    pub conflict_type: String,
    pub ring: Option<EntityId>,
    pub attackers: Vec<EntityId>,
    pub defenders: Vec<EntityId>,
}

impl ConflictDeclaration {
    pub fn new(attacker: PlayerId, defender: PlayerId, conflict_type: impl Into<String>) -> Self {
        Self {
            attacker,
            defender,
            conflict_type: conflict_type.into(),
            ring: None,
            attackers: Vec::new(),
            defenders: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_ring(mut self, ring: EntityId) -> Self {
        self.ring = Some(ring);
        self
    }

    #[must_use]
    pub fn with_attacker(mut self, card: EntityId) -> Self {
        self.attackers.push(card);
        self
    }

    #[must_use]
    pub fn with_defender(mut self, card: EntityId) -> Self {
        self.defenders.push(card);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_reset_keeps_fate() {
        let mut ring = Ring::new(EntityId(2), "fire");
        ring.modify_state("fate", 2);
        ring.claimed_by = Some(PlayerId::new(0));
        ring.contested = true;

        ring.reset();

        assert_eq!(ring.claimed_by, None);
        assert!(!ring.contested);
        assert_eq!(ring.get_state("fate", 0), 2);
    }

    #[test]
    fn test_participation_requires_active_conflict() {
        let mut conflict = Conflict::new(EntityId(7));
        conflict.attackers.push(EntityId(10));
        assert!(!conflict.is_participating(EntityId(10), Side::Attacking));

        conflict.active = true;
        assert!(conflict.is_participating(EntityId(10), Side::Attacking));
        assert!(conflict.is_participating(EntityId(10), Side::Either));
        assert!(!conflict.is_participating(EntityId(10), Side::Defending));

        conflict.remove_participant(EntityId(10));
        assert!(!conflict.is_participating(EntityId(10), Side::Either));
    }

    #[test]
    fn test_conflict_reset() {
        let mut conflict = Conflict::new(EntityId(7));
        conflict.active = true;
        conflict.winner = Some(PlayerId::new(1));
        conflict.reset();
        assert_eq!(conflict, Conflict::new(EntityId(7)));
    }
}
