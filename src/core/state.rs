//! Game state: the single explicit value every rules operation reads and writes.
//!
//! ## PublicState
//!
//! Observable information for all players:
//! - Phase, round, conflict and phase counters
//! - The initiative holder (`active_player`)
//! - Player state (honor, fate, flags)
//! - The finalized event log and rendered ability messages
//!
//! ## GameState
//!
//! Public state plus:
//! - Zone manager and card instances
//! - Rings and the conflict entity
//! - Effect engine, ability store, trigger registry, delayed registry,
//!   cost reducers and ability limits
//! - RNG and configuration

use std::sync::Arc;

use im::Vector;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::board::{Conflict, Ring};
use super::config::{GameConfig, PhaseId, ZoneId};
use super::entity::{EntityId, EntityKind};
use super::player::{PlayerId, PlayerMap};
use super::rng::GameRng;
use crate::abilities::{AbilityStore, CostReducerRegistry, LimitTracker};
use crate::cards::{CardInstance, CardTypeId};
use crate::effects::{DelayedRegistry, EffectEngine};
use crate::triggers::{EventId, GameEvent, TriggerRegistry};
use crate::zones::{ZoneManager, ZonePosition};

/// Public game state - observable by all players.
///
/// Counters (`round`, `phase_number`, `conflict_number`) only ever increase.
/// Effects with a bounded duration remember the counter value at creation and
/// stay active while it is unchanged.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicState {
    player_count: usize,

    /// Current phase (game-specific, opaque to engine).
    pub phase: PhaseId,

    /// Round number (starts at 1).
    pub round: u32,

    /// Number of phases that have ended.
    pub phase_number: u32,

    /// Number of conflicts that have ended.
    pub conflict_number: u32,

    /// Player holding initiative. Their abilities resolve first within a tier.
    pub active_player: PlayerId,

    /// Per-player state (honor, fate, flags) - games define keys.
    pub player_state: PlayerMap<FxHashMap<String, i64>>,

    /// Every finalized event, in order.
    pub event_log: Vector<GameEvent>,

    /// Rendered ability messages.
    pub messages: Vector<String>,
}

impl PublicState {
    #[must_use]
    pub fn new(player_count: usize) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        Self {
            player_count,
            phase: PhaseId::default(),
            round: 1,
            phase_number: 0,
            conflict_number: 0,
            active_player: PlayerId::new(0),
            player_state: PlayerMap::with_default(player_count),
            event_log: Vector::new(),
            messages: Vector::new(),
        }
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        PlayerId::all(self.player_count)
    }

    /// Players in initiative order (initiative holder first).
    pub fn initiative_order(&self) -> impl Iterator<Item = PlayerId> {
        self.active_player.seat_order(self.player_count)
    }

    #[must_use]
    pub fn get_player_state(&self, player: PlayerId, key: &str, default: i64) -> i64 {
        self.player_state[player].get(key).copied().unwrap_or(default)
    }

    pub fn set_player_state(&mut self, player: PlayerId, key: impl Into<String>, value: i64) {
        self.player_state[player].insert(key.into(), value);
    }

    pub fn modify_player_state(&mut self, player: PlayerId, key: &str, delta: i64) {
        let current = self.get_player_state(player, key, 0);
        self.player_state[player].insert(key.to_string(), current + delta);
    }
}

/// Full game state.
///
/// Engine subsystems live here as plain fields so every operation receives
/// the whole state explicitly; nothing is ambient.
pub struct GameState {
    pub public: PublicState,
    pub zones: ZoneManager,
    cards: FxHashMap<EntityId, CardInstance>,
    rings: Vec<Ring>,
    conflict: Conflict,

    pub effects: EffectEngine,
    pub abilities: AbilityStore,
    pub triggers: TriggerRegistry,
    pub delayed: DelayedRegistry,
    pub reducers: CostReducerRegistry,
    pub limits: LimitTracker,

    pub rng: GameRng,
    config: Arc<GameConfig>,
    cancelled: FxHashSet<EventId>,
    next_entity_id: u32,
    next_event_id: u32,
}

impl GameState {
    /// Create a new game state, allocating player, ring and conflict entities.
    #[must_use]
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let player_count = config.player_count;
        let mut next = EntityId::first_non_player(player_count);

        let mut zones = ZoneManager::new();
        for zone in config.zones.iter().filter(|z| z.ordered) {
            zones.init_ordered_zone(zone.id);
        }

        let rings = config
            .rings
            .iter()
            .map(|element| {
                let ring = Ring::new(EntityId(next), element.clone());
                next += 1;
                ring
            })
            .collect();
        let conflict = Conflict::new(EntityId(next));
        next += 1;

        let mut public = PublicState::new(player_count);
        public.phase = config.initial_phase;

        Self {
            public,
            zones,
            cards: FxHashMap::default(),
            rings,
            conflict,
            effects: EffectEngine::new(),
            abilities: AbilityStore::new(),
            triggers: TriggerRegistry::new(),
            delayed: DelayedRegistry::new(),
            reducers: CostReducerRegistry::new(),
            limits: LimitTracker::new(),
            rng: GameRng::new(seed),
            config: Arc::new(config),
            cancelled: FxHashSet::default(),
            next_entity_id: next,
            next_event_id: 0,
        }
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.public.player_count()
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    // === Entities ===

    /// Allocate a new card entity ID.
    pub fn alloc_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    /// Which family an entity belongs to, if it exists.
    #[must_use]
    pub fn kind_of(&self, entity: EntityId) -> Option<EntityKind> {
        if entity.is_player(self.player_count()) {
            Some(EntityKind::Player)
        } else if self.ring(entity).is_some() {
            Some(EntityKind::Ring)
        } else if entity == self.conflict.entity_id {
            Some(EntityKind::Conflict)
        } else if self.cards.contains_key(&entity) {
            Some(EntityKind::Card)
        } else {
            None
        }
    }

    /// Every entity of a kind. Cards are limited to those in play.
    #[must_use]
    pub fn entities_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        match kind {
            EntityKind::Player => self.public.player_ids().map(EntityId::player).collect(),
            EntityKind::Ring => self.rings.iter().map(|r| r.entity_id).collect(),
            EntityKind::Conflict => vec![self.conflict.entity_id],
            EntityKind::Card => self.cards_in_play(),
        }
    }

    /// Whether an entity is in play. Players, rings and the conflict always are.
    #[must_use]
    pub fn is_in_play(&self, entity: EntityId) -> bool {
        match self.kind_of(entity) {
            Some(EntityKind::Card) => self
                .zones
                .get_zone(entity)
                .is_some_and(|zone| self.config.is_in_play_zone(zone)),
            Some(_) => true,
            None => false,
        }
    }

    /// Cards currently in play, in id order.
    #[must_use]
    pub fn cards_in_play(&self) -> Vec<EntityId> {
        let mut cards: Vec<_> = self
            .config
            .in_play_zones()
            .flat_map(|zone| self.cards_in_zone(zone))
            .collect();
        cards.sort_unstable();
        cards
    }

    /// Cards in a zone, in id order for unordered zones.
    #[must_use]
    pub fn cards_in_zone(&self, zone: ZoneId) -> Vec<EntityId> {
        if self.zones.is_ordered(zone) {
            return self.zones.cards_in_zone_ordered(zone).to_vec();
        }
        let mut cards: Vec<_> = self.zones.cards_in_zone(zone).collect();
        cards.sort_unstable();
        cards
    }

    /// Display name of an entity.
    #[must_use]
    pub fn name_of(&self, entity: EntityId) -> String {
        match self.kind_of(entity) {
            Some(EntityKind::Player) => entity
                .as_player(self.player_count())
                .map_or_else(|| entity.to_string(), |p| p.to_string()),
            Some(EntityKind::Ring) => self
                .ring(entity)
                .map_or_else(|| entity.to_string(), |r| format!("{} ring", r.element)),
            Some(EntityKind::Conflict) => "the conflict".to_string(),
            Some(EntityKind::Card) => self
                .card(entity)
                .map_or_else(|| entity.to_string(), |c| c.name.clone()),
            None => entity.to_string(),
        }
    }

    // === Cards ===

    /// Add a card instance to its zone.
    pub fn add_card(&mut self, card: CardInstance) {
        let entity_id = card.entity_id;
        let zone = card.zone;
        self.cards.insert(entity_id, card);
        self.zones.add_to_zone(entity_id, zone, None);
    }

    /// Move a card between zones, keeping the instance's zone in sync.
    ///
    /// Returns the zone the card came from.
    pub fn move_card(
        &mut self,
        entity_id: EntityId,
        destination: ZoneId,
        position: Option<ZonePosition>,
    ) -> Option<ZoneId> {
        let from = self.zones.move_to_zone(entity_id, destination, position)?;
        if let Some(card) = self.cards.get_mut(&entity_id) {
            card.zone = destination;
        }
        Some(from)
    }

    #[must_use]
    pub fn card(&self, entity_id: EntityId) -> Option<&CardInstance> {
        self.cards.get(&entity_id)
    }

    pub fn card_mut(&mut self, entity_id: EntityId) -> Option<&mut CardInstance> {
        self.cards.get_mut(&entity_id)
    }

    #[must_use]
    pub fn card_type(&self, entity_id: EntityId) -> Option<CardTypeId> {
        self.card(entity_id).map(|c| c.card_type)
    }

    /// Owner of a card, or the player itself for player entities.
    #[must_use]
    pub fn owner_of(&self, entity: EntityId) -> Option<PlayerId> {
        entity
            .as_player(self.player_count())
            .or_else(|| self.card(entity).and_then(|c| c.owner))
    }

    // === Rings & conflict ===

    #[must_use]
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    #[must_use]
    pub fn ring(&self, entity: EntityId) -> Option<&Ring> {
        self.rings.iter().find(|r| r.entity_id == entity)
    }

    pub fn ring_mut(&mut self, entity: EntityId) -> Option<&mut Ring> {
        self.rings.iter_mut().find(|r| r.entity_id == entity)
    }

    #[must_use]
    pub fn ring_by_element(&self, element: &str) -> Option<EntityId> {
        self.rings.iter().find(|r| r.element == element).map(|r| r.entity_id)
    }

    #[must_use]
    pub fn conflict(&self) -> &Conflict {
        &self.conflict
    }

    pub fn conflict_mut(&mut self) -> &mut Conflict {
        &mut self.conflict
    }

    // === Attribute base values ===

    /// The unmodified value of a numeric attribute.
    #[must_use]
    pub fn base_value(&self, entity: EntityId, key: &str) -> i64 {
        match self.kind_of(entity) {
            Some(EntityKind::Player) => entity
                .as_player(self.player_count())
                .map_or(0, |p| self.public.get_player_state(p, key, 0)),
            Some(EntityKind::Ring) => self.ring(entity).map_or(0, |r| r.get_state(key, 0)),
            Some(EntityKind::Conflict) => self.conflict.get_state(key, 0),
            Some(EntityKind::Card) => self.card(entity).map_or(0, |c| c.get_state(key, 0)),
            None => 0,
        }
    }

    /// The current value of a numeric attribute with every active effect folded in.
    #[must_use]
    pub fn get_value(&self, entity: EntityId, key: &str) -> i64 {
        crate::effects::value_of(self, entity, key)
    }

    /// Whether an entity carries a flag, from its own state or an active effect.
    #[must_use]
    pub fn has_flag(&self, entity: EntityId, flag: &str) -> bool {
        crate::effects::has_flag(self, entity, flag)
    }

    #[must_use]
    pub fn has_trait(&self, entity: EntityId, name: &str) -> bool {
        crate::effects::has_trait(self, entity, name)
    }

    #[must_use]
    pub fn has_keyword(&self, entity: EntityId, name: &str) -> bool {
        crate::effects::has_keyword(self, entity, name)
    }

    #[must_use]
    pub fn is_blank(&self, entity: EntityId) -> bool {
        crate::effects::is_blank(self, entity)
    }

    /// Current controller, taking control-changing effects into account.
    #[must_use]
    pub fn controller_of(&self, entity: EntityId) -> Option<PlayerId> {
        crate::effects::controller_of(self, entity)
    }

    // === Events ===

    pub fn next_event_id(&mut self) -> EventId {
        let id = EventId(self.next_event_id);
        self.next_event_id += 1;
        id
    }

    /// Append a finalized event to the public log.
    pub fn record_event(&mut self, event: GameEvent) {
        self.public.event_log.push_back(event);
    }

    pub fn cancel_event(&mut self, event: EventId) {
        self.cancelled.insert(event);
    }

    #[must_use]
    pub fn is_cancelled(&self, event: EventId) -> bool {
        self.cancelled.contains(&event)
    }

    pub fn log_message(&mut self, message: String) {
        self.public.messages.push_back(message);
    }
}
