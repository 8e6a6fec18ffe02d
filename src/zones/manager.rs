//! Zone manager for card locations and movement.
//!
//! The `ZoneManager` tracks where cards are located and handles movement
//! between zones. It supports:
//! - Ordered zones (decks) with explicit position control
//! - Unordered zones (play area, provinces) with set-like semantics

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::ZoneId;
use crate::core::entity::EntityId;
use crate::core::rng::GameRng;

/// Position for inserting a card into an ordered zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZonePosition {
    /// Top of the zone (end of the vec).
    Top,
    /// Bottom of the zone (start of the vec).
    Bottom,
    /// Specific index, clamped to the zone size.
    Index(usize),
}

/// Manages card locations across zones.
///
/// ```
/// use ccg_rules::zones::{ZoneManager, ZonePosition};
/// use ccg_rules::core::{ZoneId, EntityId};
///
/// let mut manager = ZoneManager::new();
/// let deck = ZoneId::new(0);
/// manager.init_ordered_zone(deck);
///
/// manager.add_to_zone(EntityId(10), deck, Some(ZonePosition::Top));
/// manager.add_to_zone(EntityId(11), deck, Some(ZonePosition::Bottom));
///
/// assert_eq!(manager.top_card(deck), Some(EntityId(10)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ZoneManager {
    locations: FxHashMap<EntityId, ZoneId>,
    zone_order: FxHashMap<ZoneId, Vec<EntityId>>,
}

impl ZoneManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize an ordered zone. Must be called before cards are added to it.
    pub fn init_ordered_zone(&mut self, zone: ZoneId) {
        self.zone_order.entry(zone).or_default();
    }

    #[must_use]
    pub fn is_ordered(&self, zone: ZoneId) -> bool {
        self.zone_order.contains_key(&zone)
    }

    /// Add a card to a zone.
    ///
    /// Returns `false` (and changes nothing) if the card is already tracked.
    pub fn add_to_zone(&mut self, entity: EntityId, zone: ZoneId, position: Option<ZonePosition>) -> bool {
        if self.locations.contains_key(&entity) {
            return false;
        }
        self.locations.insert(entity, zone);
        self.insert_ordered(entity, zone, position);
        true
    }

    /// Move a card from one zone to another.
    ///
    /// Returns the old zone, or `None` if the card wasn't found. Moving within
    /// the same ordered zone repositions the card.
    pub fn move_to_zone(
        &mut self,
        entity: EntityId,
        new_zone: ZoneId,
        position: Option<ZonePosition>,
    ) -> Option<ZoneId> {
        let old_zone = self.locations.get(&entity).copied()?;

        if let Some(order) = self.zone_order.get_mut(&old_zone) {
            order.retain(|&e| e != entity);
        }
        self.locations.insert(entity, new_zone);
        self.insert_ordered(entity, new_zone, position);

        Some(old_zone)
    }

    fn insert_ordered(&mut self, entity: EntityId, zone: ZoneId, position: Option<ZonePosition>) {
        if let Some(order) = self.zone_order.get_mut(&zone) {
            match position.unwrap_or(ZonePosition::Top) {
                ZonePosition::Top => order.push(entity),
                ZonePosition::Bottom => order.insert(0, entity),
                ZonePosition::Index(i) => {
                    let idx = i.min(order.len());
                    order.insert(idx, entity);
                }
            }
        }
    }

    #[must_use]
    pub fn get_zone(&self, entity: EntityId) -> Option<ZoneId> {
        self.locations.get(&entity).copied()
    }

    #[must_use]
    pub fn is_in_zone(&self, entity: EntityId, zone: ZoneId) -> bool {
        self.locations.get(&entity) == Some(&zone)
    }

    /// All cards in a zone (unordered).
    pub fn cards_in_zone(&self, zone: ZoneId) -> impl Iterator<Item = EntityId> + '_ {
        self.locations
            .iter()
            .filter(move |(_, &z)| z == zone)
            .map(|(&e, _)| e)
    }

    /// Cards in an ordered zone, bottom first. Empty for unordered zones.
    #[must_use]
    pub fn cards_in_zone_ordered(&self, zone: ZoneId) -> &[EntityId] {
        self.zone_order.get(&zone).map_or(&[], |v| v.as_slice())
    }

    #[must_use]
    pub fn zone_size(&self, zone: ZoneId) -> usize {
        match self.zone_order.get(&zone) {
            Some(order) => order.len(),
            None => self.cards_in_zone(zone).count(),
        }
    }

    /// Top card of an ordered zone.
    #[must_use]
    pub fn top_card(&self, zone: ZoneId) -> Option<EntityId> {
        self.zone_order.get(&zone)?.last().copied()
    }

    pub fn shuffle_zone(&mut self, zone: ZoneId, rng: &mut GameRng) {
        if let Some(order) = self.zone_order.get_mut(&zone) {
            rng.shuffle(order);
        }
    }

    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.locations.contains_key(&entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut manager = ZoneManager::new();
        let zone = ZoneId::new(0);

        assert!(manager.add_to_zone(EntityId(10), zone, None));
        assert!(manager.add_to_zone(EntityId(11), zone, None));

        assert_eq!(manager.get_zone(EntityId(10)), Some(zone));
        assert_eq!(manager.get_zone(EntityId(99)), None);
        assert!(manager.is_in_zone(EntityId(11), zone));
    }

    #[test]
    fn test_duplicate_add_is_rejected() {
        let mut manager = ZoneManager::new();
        assert!(manager.add_to_zone(EntityId(10), ZoneId::new(0), None));
        assert!(!manager.add_to_zone(EntityId(10), ZoneId::new(1), None));
        assert_eq!(manager.get_zone(EntityId(10)), Some(ZoneId::new(0)));
    }

    #[test]
    fn test_ordered_zone() {
        let mut manager = ZoneManager::new();
        let deck = ZoneId::new(0);
        manager.init_ordered_zone(deck);

        manager.add_to_zone(EntityId(10), deck, Some(ZonePosition::Top));
        manager.add_to_zone(EntityId(11), deck, Some(ZonePosition::Bottom));
        manager.add_to_zone(EntityId(12), deck, Some(ZonePosition::Index(1)));

        assert_eq!(
            manager.cards_in_zone_ordered(deck),
            &[EntityId(11), EntityId(12), EntityId(10)]
        );
        assert_eq!(manager.top_card(deck), Some(EntityId(10)));
    }

    #[test]
    fn test_move_between_zones() {
        let mut manager = ZoneManager::new();
        let deck = ZoneId::new(0);
        let play = ZoneId::new(1);
        manager.init_ordered_zone(deck);

        manager.add_to_zone(EntityId(10), deck, None);
        let old = manager.move_to_zone(EntityId(10), play, None);

        assert_eq!(old, Some(deck));
        assert_eq!(manager.zone_size(deck), 0);
        assert_eq!(manager.zone_size(play), 1);
        assert_eq!(manager.move_to_zone(EntityId(99), play, None), None);
    }

    #[test]
    fn test_move_to_bottom_of_same_zone() {
        let mut manager = ZoneManager::new();
        let deck = ZoneId::new(0);
        manager.init_ordered_zone(deck);
        manager.add_to_zone(EntityId(10), deck, None);
        manager.add_to_zone(EntityId(11), deck, None);

        manager.move_to_zone(EntityId(11), deck, Some(ZonePosition::Bottom));
        assert_eq!(manager.cards_in_zone_ordered(deck), &[EntityId(11), EntityId(10)]);
    }

    #[test]
    fn test_shuffle() {
        let mut manager = ZoneManager::new();
        let deck = ZoneId::new(0);
        manager.init_ordered_zone(deck);
        for i in 0..20 {
            manager.add_to_zone(EntityId(i), deck, None);
        }
        let before = manager.cards_in_zone_ordered(deck).to_vec();

        let mut rng = GameRng::new(42);
        manager.shuffle_zone(deck, &mut rng);

        let after = manager.cards_in_zone_ordered(deck).to_vec();
        assert_eq!(before.len(), after.len());
        assert_ne!(before, after);
    }
}
