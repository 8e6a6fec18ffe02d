//! Live abilities.
//!
//! Attaching a descriptor to an entity wires it into every subsystem it
//! touches: a limit counter, a trigger registration for triggered types and
//! the effect engine for persistent types. Detaching undoes all of it.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::core::{EntityId, GameState};
use crate::effects::EffectId;
use crate::triggers::{TriggerId, TriggerTiming};

use super::descriptor::{AbilityDescriptor, AbilityType};
use super::limit::LimitKey;
use super::AbilityId;

/// An ability attached to an entity.
#[derive(Clone, Debug)]
pub struct Ability {
    pub id: AbilityId,
    pub descriptor: Arc<AbilityDescriptor>,
    pub owner: EntityId,
    /// The entity whose effect granted this ability; `None` when printed.
    pub granted_by: Option<EntityId>,
    pub limit_key: LimitKey,
    pub trigger: Option<TriggerId>,
    pub effects: Vec<EffectId>,
}

impl Ability {
    #[must_use]
    pub fn is_printed(&self) -> bool {
        self.granted_by.is_none()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.descriptor.title
    }
}

/// Every attached ability, indexed by owner.
#[derive(Clone, Debug, Default)]
pub struct AbilityStore {
    abilities: FxHashMap<AbilityId, Ability>,
    by_owner: FxHashMap<EntityId, Vec<AbilityId>>,
    next_id: u32,
}

impl AbilityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> AbilityId {
        let id = AbilityId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert(&mut self, ability: Ability) {
        self.by_owner.entry(ability.owner).or_default().push(ability.id);
        self.abilities.insert(ability.id, ability);
    }

    fn remove(&mut self, id: AbilityId) -> Option<Ability> {
        let ability = self.abilities.remove(&id)?;
        if let Some(ids) = self.by_owner.get_mut(&ability.owner) {
            ids.retain(|&a| a != id);
        }
        Some(ability)
    }

    #[must_use]
    pub fn get(&self, id: AbilityId) -> Option<&Ability> {
        self.abilities.get(&id)
    }

    /// Abilities on an entity, in attach order.
    pub fn for_owner(&self, owner: EntityId) -> impl Iterator<Item = &Ability> {
        self.by_owner
            .get(&owner)
            .into_iter()
            .flatten()
            .filter_map(|id| self.abilities.get(id))
    }

    #[must_use]
    pub fn find_by_title(&self, owner: EntityId, title: &str) -> Option<AbilityId> {
        self.for_owner(owner).find(|a| a.title() == title).map(|a| a.id)
    }

    /// All ability ids in attach order.
    #[must_use]
    pub fn ids(&self) -> Vec<AbilityId> {
        let mut ids: Vec<_> = self.abilities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

/// Attach `descriptor` to `owner`.
///
/// Grants from the same source to the same card reuse one limit counter, so
/// re-granting does not reset it.
pub fn attach(
    state: &mut GameState,
    descriptor: Arc<AbilityDescriptor>,
    owner: EntityId,
    granted_by: Option<EntityId>,
) -> AbilityId {
    let id = state.abilities.allocate();
    let limit_key = match granted_by {
        None => LimitKey::Printed(id),
        Some(source) => LimitKey::Granted {
            source,
            target: owner,
            title: descriptor.title.clone(),
        },
    };
    if let Some(limit) = descriptor.limit {
        state.limits.ensure(limit_key.clone(), limit);
    }

    let timing = match descriptor.ability_type {
        AbilityType::Reaction => Some(TriggerTiming::Reaction),
        AbilityType::Interrupt => Some(TriggerTiming::Interrupt),
        AbilityType::WouldInterrupt => Some(TriggerTiming::WouldInterrupt),
        AbilityType::Action | AbilityType::Persistent => None,
    };
    let trigger = timing.map(|timing| {
        state
            .triggers
            .register(id, owner, descriptor.title.clone(), descriptor.when.clone(), timing)
    });

    let mut effects = Vec::new();
    if descriptor.ability_type == AbilityType::Persistent {
        let controller = state
            .controller_of(owner)
            .or_else(|| state.owner_of(owner))
            .unwrap_or(state.public.active_player);
        for spec in &descriptor.effects {
            for mut effect in spec.instantiate(state, owner, controller, &[owner], None) {
                effect.printed = granted_by.is_none();
                effects.push(state.effects.add(effect));
            }
        }
    }

    debug!(ability = %id, owner = %owner, title = %descriptor.title, granted = granted_by.is_some(), "ability attached");
    state.abilities.insert(Ability {
        id,
        descriptor,
        owner,
        granted_by,
        limit_key,
        trigger,
        effects,
    });
    id
}

/// Detach an ability, removing its trigger and effects.
///
/// Granted limit counters survive so a re-grant continues the count.
pub fn detach(state: &mut GameState, id: AbilityId) -> bool {
    let Some(ability) = state.abilities.remove(id) else {
        return false;
    };
    if let Some(trigger) = ability.trigger {
        state.triggers.unregister(trigger);
    }
    if !ability.effects.is_empty() {
        crate::effects::remove_where(state, |effect| ability.effects.contains(&effect.id));
    }
    if matches!(ability.limit_key, LimitKey::Printed(_)) {
        state.limits.remove(&ability.limit_key);
    }
    debug!(ability = %id, owner = %ability.owner, "ability detached");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::AbilityLimit;
    use crate::actions::GameAction;
    use crate::cards::{CardId, CardInstance};
    use crate::core::{GameConfig, PlayerId, ZoneConfig, ZoneId, ZoneRole};
    use crate::effects::EffectBuilder;
    use crate::triggers::{events, Condition};

    fn state_with_card() -> (GameState, EntityId) {
        let config = GameConfig::new(2)
            .with_zone(ZoneConfig::new(ZoneId(0), "Play").with_role(ZoneRole::Play).in_play());
        let mut state = GameState::new(config, 5);
        let card = state.alloc_entity();
        state.add_card(CardInstance::new(card, CardId::new(1), PlayerId::new(0), ZoneId(0)));
        (state, card)
    }

    #[test]
    fn test_attach_reaction_registers_trigger() {
        let (mut state, card) = state_with_card();
        let descriptor = AbilityDescriptor::reaction("Ready up", events::BOWED, Condition::EventTargetIsSelf)
            .with_step(GameAction::Ready, crate::abilities::ActionTarget::Source);
        let id = attach(&mut state, Arc::new(descriptor), card, None);

        assert_eq!(state.triggers.len(), 1);
        assert_eq!(state.abilities.find_by_title(card, "Ready up"), Some(id));

        assert!(detach(&mut state, id));
        assert!(state.triggers.is_empty());
        assert!(state.abilities.get(id).is_none());
        assert!(!detach(&mut state, id));
    }

    #[test]
    fn test_attach_persistent_adds_effects() {
        let (mut state, card) = state_with_card();
        let descriptor = AbilityDescriptor::persistent("Strong", EffectBuilder::modify("military", 2));
        let id = attach(&mut state, Arc::new(descriptor), card, None);
        crate::effects::recalculate(&mut state);

        assert_eq!(state.get_value(card, "military"), 2);
        detach(&mut state, id);
        assert_eq!(state.get_value(card, "military"), 0);
    }

    #[test]
    fn test_granted_limit_survives_regrant() {
        let (mut state, card) = state_with_card();
        let granter = EntityId::player(PlayerId::new(1));
        let descriptor = Arc::new(AbilityDescriptor::action("Bow", GameAction::Bow).with_limit(AbilityLimit::per_round(1)));

        let first = attach(&mut state, Arc::clone(&descriptor), card, Some(granter));
        let key = state.abilities.get(first).unwrap().limit_key.clone();
        state.limits.record_use(&key, 0);
        detach(&mut state, first);

        let second = attach(&mut state, descriptor, card, Some(granter));
        assert_eq!(state.abilities.get(second).unwrap().limit_key, key);
        assert!(!state.limits.can_use(&key, 0));
    }

    #[test]
    fn test_printed_limit_removed_on_detach() {
        let (mut state, card) = state_with_card();
        let descriptor = AbilityDescriptor::action("Bow", GameAction::Bow).with_limit(AbilityLimit::per_round(1));
        let id = attach(&mut state, Arc::new(descriptor), card, None);
        assert_eq!(state.limits.len(), 1);

        detach(&mut state, id);
        assert!(state.limits.is_empty());
    }
}
