//! Trigger registry.
//!
//! Every triggered ability (would-interrupt, interrupt, reaction) that is
//! attached to an entity has one `Trigger` here, indexed by the event types
//! named in its `when` clause. The dispatcher asks the registry for the
//! candidates of one tier; legality (limits, restrictions, blanking) is
//! checked by the dispatcher afterwards.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::abilities::AbilityId;
use crate::core::{EntityId, GameState, PlayerId};

use super::condition::{Condition, ConditionContext};
use super::event::{EventId, EventTypeId, GameEvent};

/// Unique identifier for a trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriggerId(pub u32);

impl TriggerId {
    /// Create a new trigger ID.
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

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Trigger({})", self.0)
    }
}

/// Dispatcher tier a trigger fires in, in window order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TriggerTiming {
    /// Before interrupts; the only tier that may cancel the event.
    WouldInterrupt,
    /// Before the event is finalized.
    Interrupt,
    /// After the event is finalized.
    Reaction,
}

/// A registered trigger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: TriggerId,

    /// The ability that resolves when this fires.
    pub ability: AbilityId,

    /// The entity the ability is attached to.
    pub source: EntityId,

    /// Human-readable name (for logging).
    pub name: String,

    /// Event type → predicate. The trigger matches an event when the entry
    /// for its type evaluates true.
    pub when: Vec<(EventTypeId, Condition)>,

    pub timing: TriggerTiming,
}

impl Trigger {
    /// Event types this trigger listens for.
    pub fn event_types(&self) -> impl Iterator<Item = EventTypeId> + '_ {
        self.when.iter().map(|(t, _)| *t)
    }

    /// Check the `when` entry for the event's type.
    #[must_use]
    pub fn matches(&self, event: &GameEvent, state: &GameState) -> bool {
        let mut ctx = ConditionContext::new(state).with_event(event).with_source(self.source);
        if let Some(controller) = state.controller_of(self.source) {
            ctx = ctx.with_player(controller);
        }
        self.when
            .iter()
            .filter(|(t, _)| *t == event.event_type)
            .any(|(_, condition)| condition.evaluate(&ctx))
    }
}

/// A trigger whose `when` clause matched an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerCandidate {
    pub trigger_id: TriggerId,
    pub ability: AbilityId,
    pub source: EntityId,
    pub controller: Option<PlayerId>,
    pub event: EventId,
}

/// Registry for triggers, indexed by event type.
#[derive(Clone, Debug, Default)]
pub struct TriggerRegistry {
    /// All registered triggers.
    triggers: FxHashMap<TriggerId, Trigger>,

    /// Index by event type for fast lookup.
    by_event_type: FxHashMap<EventTypeId, Vec<TriggerId>>,

    /// Index by ability for removal.
    by_ability: FxHashMap<AbilityId, TriggerId>,

    /// Next trigger ID to allocate.
    next_id: u32,
}

impl TriggerRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger for an ability, returns its ID.
    pub fn register(
        &mut self,
        ability: AbilityId,
        source: EntityId,
        name: impl Into<String>,
        when: Vec<(EventTypeId, Condition)>,
        timing: TriggerTiming,
    ) -> TriggerId {
        let id = TriggerId::new(self.next_id);
        self.next_id += 1;

        let trigger = Trigger {
            id,
            ability,
            source,
            name: name.into(),
            when,
            timing,
        };

        for event_type in trigger.event_types() {
            let list = self.by_event_type.entry(event_type).or_default();
            if !list.contains(&id) {
                list.push(id);
            }
        }
        self.by_ability.insert(ability, id);
        self.triggers.insert(id, trigger);
        id
    }

    /// Unregister a trigger.
    pub fn unregister(&mut self, id: TriggerId) -> Option<Trigger> {
        let trigger = self.triggers.remove(&id)?;

        let mut empty_types = Vec::new();
        for event_type in trigger.event_types() {
            if let Some(list) = self.by_event_type.get_mut(&event_type) {
                list.retain(|&tid| tid != id);
                if list.is_empty() {
                    empty_types.push(event_type);
                }
            }
        }
        for event_type in empty_types {
            self.by_event_type.remove(&event_type);
        }
        self.by_ability.remove(&trigger.ability);
        Some(trigger)
    }

    /// Remove the trigger backing an ability, if any.
    pub fn remove_for_ability(&mut self, ability: AbilityId) -> Option<Trigger> {
        let id = self.by_ability.get(&ability).copied()?;
        self.unregister(id)
    }

    /// Get a trigger by ID.
    #[must_use]
    pub fn get(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.get(&id)
    }

    #[must_use]
    pub fn for_ability(&self, ability: AbilityId) -> Option<&Trigger> {
        self.by_ability.get(&ability).and_then(|id| self.triggers.get(id))
    }

    /// Find every trigger of `timing` whose `when` clause matches the event.
    ///
    /// Candidates are ordered by the initiative order of their controllers
    /// (initiative holder first), then by trigger ID. Ordering between one
    /// controller's candidates is not a decision; the dispatcher prompts.
    pub fn find_candidates(
        &self,
        event: &GameEvent,
        state: &GameState,
        timing: TriggerTiming,
    ) -> Vec<TriggerCandidate> {
        let Some(trigger_ids) = self.by_event_type.get(&event.event_type) else {
            return Vec::new();
        };

        let seats: Vec<PlayerId> = state.public.initiative_order().collect();
        let seat_of = |player: Option<PlayerId>| {
            player
                .and_then(|p| seats.iter().position(|&s| s == p))
                .unwrap_or(seats.len())
        };

        let mut results: Vec<TriggerCandidate> = trigger_ids
            .iter()
            .filter_map(|id| self.triggers.get(id))
            .filter(|trigger| trigger.timing == timing)
            .filter(|trigger| trigger.matches(event, state))
            .map(|trigger| TriggerCandidate {
                trigger_id: trigger.id,
                ability: trigger.ability,
                source: trigger.source,
                controller: state.controller_of(trigger.source),
                event: event.id,
            })
            .collect();

        results.sort_by_key(|c| (seat_of(c.controller), c.trigger_id));
        results
    }

    /// Get total trigger count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Iterate all triggers.
    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.values()
    }
}
