//! Game configuration types.
//!
//! Games configure the engine at startup by providing:
//! - `ZoneConfig`: Defines zones (hand, deck, play area, provinces, etc.)
//! - `GameConfig`: Combines zones, rings, resource naming and named conditions
//!
//! The engine never hardcodes zones - games define them, and flag which ones
//! count as "in play".

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::PlayerId;
use crate::error::ConfigError;
use crate::triggers::CustomCondition;

/// Zone identifier. Games define what zones exist.
///
/// The engine doesn't interpret zone IDs - they're opaque identifiers.
/// Games assign meaning via `ZoneConfig`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u16);

impl ZoneId {
    /// Create a new zone ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Zone({})", self.0)
    }
}

/// Zone visibility rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneVisibility {
    /// All cards visible to all players (play area, discard piles).
    Public,
    /// Cards visible only to the zone owner (hand).
    OwnerOnly,
    /// Cards not visible to anyone (face-down deck).
    Hidden,
}

/// What a zone is used for.
///
/// Game actions such as "return to deck" or "put into play" look up the
/// owner's zone with the matching role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneRole {
    Deck,
    Hand,
    Discard,
    Play,
    Province,
    #[default]
    Other,
}

/// Configuration for a single zone.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Unique identifier for this zone.
    pub id: ZoneId,

    /// Human-readable name (for debugging/display).
    pub name: String,

    /// Zone owner. `None` for shared zones.
    pub owner: Option<PlayerId>,

    /// Visibility rules for cards in this zone.
    pub visibility: ZoneVisibility,

    /// Is card order significant? (true for decks).
    pub ordered: bool,

    /// Role used by game actions to find destination zones.
    pub role: ZoneRole,

    /// Cards in this zone are "in play": their persistent abilities are
    /// active and leaving the zone counts as leaving play.
    pub in_play: bool,
}

impl ZoneConfig {
    /// Create a new zone configuration.
    pub fn new(id: ZoneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner: None,
            visibility: ZoneVisibility::Public,
            ordered: false,
            role: ZoneRole::Other,
            in_play: false,
        }
    }

    /// Set the zone owner.
    #[must_use]
    pub fn with_owner(mut self, owner: PlayerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Set visibility to owner-only (like a hand).
    #[must_use]
    pub fn owner_only(mut self) -> Self {
        self.visibility = ZoneVisibility::OwnerOnly;
        self
    }

    /// Set visibility to hidden (like a face-down deck).
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visibility = ZoneVisibility::Hidden;
        self
    }

    /// Mark zone as ordered (like a deck).
    #[must_use]
    pub fn ordered(mut self) -> Self {
        self.ordered = true;
        self
    }

    /// Set the zone role.
    #[must_use]
    pub fn with_role(mut self, role: ZoneRole) -> Self {
        self.role = role;
        self
    }

    /// Mark the zone as an in-play zone.
    #[must_use]
    pub fn in_play(mut self) -> Self {
        self.in_play = true;
        self
    }
}

/// Opaque phase identifier. Games define their own phases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseId(pub u32);

impl PhaseId {
    /// Create a new phase ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Complete game configuration.
#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Number of players (1-255).
    pub player_count: usize,

    /// Zone configurations.
    pub zones: Vec<ZoneConfig>,

    /// Ring elements, one ring entity is allocated per element.
    pub rings: Vec<String>,

    /// Initial game phase.
    pub initial_phase: PhaseId,

    /// Player-state key spent by resource costs and adjusted by cost reducers.
    pub cost_resource: String,

    /// Maximum effect recalculation passes per state change.
    pub recalc_pass_limit: usize,

    /// Named predicates referenced by `Condition::Custom`.
    pub conditions: FxHashMap<String, CustomCondition>,
}

impl GameConfig {
    /// Create a new game configuration.
    pub fn new(player_count: usize) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        Self {
            player_count,
            zones: Vec::new(),
            rings: Vec::new(),
            initial_phase: PhaseId::default(),
            cost_resource: "fate".to_string(),
            recalc_pass_limit: 8,
            conditions: FxHashMap::default(),
        }
    }

    /// Add a zone configuration.
    #[must_use]
    pub fn with_zone(mut self, zone: ZoneConfig) -> Self {
        self.zones.push(zone);
        self
    }

    /// Add a ring.
    #[must_use]
    pub fn with_ring(mut self, element: impl Into<String>) -> Self {
        self.rings.push(element.into());
        self
    }

    /// Set the initial phase.
    #[must_use]
    pub fn with_initial_phase(mut self, phase: PhaseId) -> Self {
        self.initial_phase = phase;
        self
    }

    /// Set the player-state key used by resource costs.
    #[must_use]
    pub fn with_cost_resource(mut self, key: impl Into<String>) -> Self {
        self.cost_resource = key.into();
        self
    }

    /// Set the recalculation pass budget.
    #[must_use]
    pub fn with_recalc_pass_limit(mut self, passes: usize) -> Self {
        self.recalc_pass_limit = passes.max(1);
        self
    }

    /// Register a named condition.
    #[must_use]
    pub fn with_condition(mut self, name: impl Into<String>, condition: CustomCondition) -> Self {
        self.conditions.insert(name.into(), condition);
        self
    }

    /// Get a zone config by ID.
    #[must_use]
    pub fn get_zone(&self, id: ZoneId) -> Option<&ZoneConfig> {
        self.zones.iter().find(|z| z.id == id)
    }

    /// Check whether a zone counts as in play.
    #[must_use]
    pub fn is_in_play_zone(&self, id: ZoneId) -> bool {
        self.get_zone(id).is_some_and(|z| z.in_play)
    }

    /// All in-play zones.
    pub fn in_play_zones(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.zones.iter().filter(|z| z.in_play).map(|z| z.id)
    }

    /// Find the zone with `role` owned by `player`, falling back to a shared
    /// zone with that role.
    #[must_use]
    pub fn zone_for(&self, player: Option<PlayerId>, role: ZoneRole) -> Option<ZoneId> {
        self.zones
            .iter()
            .find(|z| z.role == role && z.owner == player && player.is_some())
            .or_else(|| self.zones.iter().find(|z| z.role == role && z.owner.is_none()))
            .map(|z| z.id)
    }

    /// Fail with `UnknownZone` if the zone is not configured.
    pub fn require_zone(&self, id: ZoneId) -> Result<&ZoneConfig, ConfigError> {
        self.get_zone(id).ok_or(ConfigError::UnknownZone(id))
    }

    /// Look up a named condition.
    #[must_use]
    pub fn condition(&self, name: &str) -> Option<CustomCondition> {
        self.conditions.get(name).copied()
    }
}
