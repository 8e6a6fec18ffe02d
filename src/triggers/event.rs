//! Game event types.
//!
//! Events represent state transitions. The engine raises its own events for
//! the primitive game actions (see [`events`]); games add their own types
//! from [`events::FIRST_CUSTOM`] upward.
//!
//! An event is immutable once created. The only thing that can happen to it
//! afterwards is cancellation, which is tracked by `GameState` and only a
//! would-interrupt may request it.

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId, ZoneId};

/// Event type identifier.
///
/// The engine defines the types in [`events`]; everything else is opaque.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventTypeId(pub u32);

impl EventTypeId {
    /// Create a new event type ID.
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

impl std::fmt::Display for EventTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventType({})", self.0)
    }
}

/// Engine event types.
pub mod events {
    use super::EventTypeId;

    pub const CARD_MOVED: EventTypeId = EventTypeId(1);
    pub const ENTERED_PLAY: EventTypeId = EventTypeId(2);
    pub const LEFT_PLAY: EventTypeId = EventTypeId(3);
    pub const BOWED: EventTypeId = EventTypeId(4);
    pub const READIED: EventTypeId = EventTypeId(5);
    pub const HONORED: EventTypeId = EventTypeId(6);
    pub const DISHONORED: EventTypeId = EventTypeId(7);
    pub const CARD_STATE_CHANGED: EventTypeId = EventTypeId(8);
    pub const PLAYER_STATE_CHANGED: EventTypeId = EventTypeId(9);
    pub const RING_STATE_CHANGED: EventTypeId = EventTypeId(10);
    pub const RING_CLAIMED: EventTypeId = EventTypeId(11);
    pub const EFFECT_APPLIED: EventTypeId = EventTypeId(12);
    pub const ABILITY_GRANTED: EventTypeId = EventTypeId(13);
    pub const ABILITY_INITIATED: EventTypeId = EventTypeId(14);
    pub const ABILITY_RESOLVED: EventTypeId = EventTypeId(15);
    pub const CARDS_DRAWN: EventTypeId = EventTypeId(16);
    pub const DECK_SHUFFLED: EventTypeId = EventTypeId(17);
    pub const CONFLICT_STARTED: EventTypeId = EventTypeId(18);
    pub const AFTER_CONFLICT: EventTypeId = EventTypeId(19);
    pub const PHASE_ENDED: EventTypeId = EventTypeId(20);
    pub const ROUND_ENDED: EventTypeId = EventTypeId(21);
    pub const DISCARDED: EventTypeId = EventTypeId(22);
    pub const SACRIFICED: EventTypeId = EventTypeId(23);
    pub const RETURNED_TO_DECK: EventTypeId = EventTypeId(24);
    pub const EVENT_CANCELLED: EventTypeId = EventTypeId(25);
    pub const COST_PAID: EventTypeId = EventTypeId(26);

    /// First id available to games.
    pub const FIRST_CUSTOM: EventTypeId = EventTypeId(1000);
}

/// Unique identifier of a raised event, in raise order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u32);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event({})", self.0)
    }
}

/// A game event with contextual data.
///
/// ## Event Data
///
/// - `event_type`: What kind of event this is
/// - `source`: The entity that caused the event (usually an ability's card)
/// - `target`: The entity affected by the event
/// - `player`: The player associated with the event
/// - `values`: Numeric values (amount changed, cards drawn, etc.)
/// - `zones`: Zone information (from zone, to zone)
/// - `tags`: String data (state keys, conflict type)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Assigned when the event is raised.
    pub id: EventId,

    /// The type of event.
    pub event_type: EventTypeId,

    /// The entity that caused/initiated the event.
    pub source: Option<EntityId>,

    /// The entity that was affected by the event.
    pub target: Option<EntityId>,

    /// The player associated with the event.
    pub player: Option<PlayerId>,

    /// Additional entities involved in the event.
    pub other_entities: Vec<EntityId>,

    /// Numeric values associated with the event.
    pub values: Vec<i64>,

    /// Zone information (source zone, destination zone, etc.).
    pub zones: Vec<ZoneId>,

    /// String keys for custom event data.
    pub tags: Vec<String>,

    /// Whether a would-interrupt may cancel this event.
    pub cancellable: bool,
}

impl GameEvent {
    /// Create a new cancellable event with just a type.
    pub fn new(event_type: EventTypeId) -> Self {
        Self {
            id: EventId(0),
            event_type,
            source: None,
            target: None,
            player: None,
            other_entities: Vec::new(),
            values: Vec::new(),
            zones: Vec::new(),
            tags: Vec::new(),
            cancellable: true,
        }
    }

    /// Set the source entity (builder pattern).
    #[must_use]
    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the target entity (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the associated player (builder pattern).
    #[must_use]
    pub fn with_player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    /// Add another entity (builder pattern).
    #[must_use]
    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.other_entities.push(entity);
        self
    }

    /// Add a numeric value (builder pattern).
    #[must_use]
    pub fn with_value(mut self, value: i64) -> Self {
        self.values.push(value);
        self
    }

    /// Add zone information (builder pattern).
    #[must_use]
    pub fn with_zone(mut self, zone: ZoneId) -> Self {
        self.zones.push(zone);
        self
    }

    /// Add a tag (builder pattern).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Mark the event as not cancellable (builder pattern).
    #[must_use]
    pub fn uncancellable(mut self) -> Self {
        self.cancellable = false;
        self
    }

    /// Get a value, or a default.
    #[must_use]
    pub fn value(&self, index: usize, default: i64) -> i64 {
        self.values.get(index).copied().unwrap_or(default)
    }

    /// Get a zone, or None.
    #[must_use]
    pub fn zone(&self, index: usize) -> Option<ZoneId> {
        self.zones.get(index).copied()
    }

    /// Check if event has a specific tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Builders for common event patterns.
impl GameEvent {
    /// Create a zone change event.
    ///
    /// Zones[0] = from zone, Zones[1] = to zone
    pub fn zone_change(event_type: EventTypeId, card: EntityId, from: ZoneId, to: ZoneId) -> Self {
        Self::new(event_type).with_target(card).with_zone(from).with_zone(to)
    }

    /// Create a player-centric event (like a round ending).
    pub fn for_player(event_type: EventTypeId, player: PlayerId) -> Self {
        Self::new(event_type).with_player(player)
    }

    /// Create a card-centric event caused by `source`.
    pub fn for_card(event_type: EventTypeId, source: Option<EntityId>, card: EntityId) -> Self {
        let event = Self::new(event_type).with_target(card);
        match source {
            Some(source) => event.with_source(source),
            None => event,
        }
    }
}
