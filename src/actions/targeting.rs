//! Ability targeting.
//!
//! A `TargetDescriptor` names a set of legal candidates. The candidate list is
//! always computed from the current state: a target chosen before costs are
//! paid is checked again against the same filter afterwards.

use crate::abilities::restriction::{is_restricted, RestrictedAction};
use crate::actions::{ActionContext, GameAction};
use crate::cards::CardTypeId;
use crate::core::{EntityId, EntityKind, GameState, PlayerRelation, ZoneRole};
use crate::triggers::Condition;

/// Where a card target may be found.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetLocation {
    #[default]
    InPlay,
    /// A zone with this role, belonging to any player.
    Zone(ZoneRole),
    Any,
}

/// One named target of an ability.
///
/// ```
/// use ccg_rules::actions::{GameAction, TargetDescriptor};
/// use ccg_rules::core::PlayerRelation;
///
/// let target = TargetDescriptor::card("character")
///     .controlled_by(PlayerRelation::Opponent)
///     .with_action(GameAction::Bow);
/// assert_eq!(target.name, "character");
/// assert!(!target.optional);
/// ```
#[derive(Clone, Debug)]
pub struct TargetDescriptor {
    pub name: String,
    pub kind: EntityKind,
    pub card_type: Option<CardTypeId>,
    pub location: TargetLocation,
    /// Relation to the resolving player.
    pub controller: PlayerRelation,
    /// Evaluated with the candidate as subject.
    pub condition: Condition,
    /// Candidates must be affectable by this action, which is then applied
    /// to the chosen target.
    pub game_action: Option<GameAction>,
    /// An optional target may resolve with no candidates.
    pub optional: bool,
}

impl TargetDescriptor {
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            card_type: None,
            location: TargetLocation::InPlay,
            controller: PlayerRelation::Any,
            condition: Condition::Always,
            game_action: None,
            optional: false,
        }
    }

    pub fn card(name: impl Into<String>) -> Self {
        Self::new(name, EntityKind::Card)
    }

    pub fn player(name: impl Into<String>) -> Self {
        Self::new(name, EntityKind::Player)
    }

    pub fn ring(name: impl Into<String>) -> Self {
        Self::new(name, EntityKind::Ring)
    }

    #[must_use]
    pub fn of_type(mut self, card_type: CardTypeId) -> Self {
        self.card_type = Some(card_type);
        self
    }

    #[must_use]
    pub fn in_location(mut self, location: TargetLocation) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn controlled_by(mut self, relation: PlayerRelation) -> Self {
        self.controller = relation;
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = self.condition.and(condition);
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: GameAction) -> Self {
        self.game_action = Some(action);
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Every condition the target filter evaluates.
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut all = vec![&self.condition];
        if let Some(action) = &self.game_action {
            all.extend(action.conditions());
        }
        all
    }

    /// Whether `candidate` is currently a legal choice.
    #[must_use]
    pub fn is_legal(&self, state: &GameState, ctx: &ActionContext, candidate: EntityId) -> bool {
        if state.kind_of(candidate) != Some(self.kind) {
            return false;
        }
        if self.kind == EntityKind::Card {
            let in_location = match self.location {
                TargetLocation::InPlay => state.is_in_play(candidate),
                TargetLocation::Zone(role) => state
                    .zones
                    .get_zone(candidate)
                    .and_then(|zone| state.config().get_zone(zone))
                    .is_some_and(|zone| zone.role == role),
                TargetLocation::Any => true,
            };
            if !in_location {
                return false;
            }
            if self.card_type.is_some_and(|t| state.card_type(candidate) != Some(t)) {
                return false;
            }
        }
        if !self.controller.matches(ctx.player, state.controller_of(candidate)) {
            return false;
        }

        let mut condition_ctx = crate::triggers::ConditionContext::new(state)
            .with_source(ctx.source)
            .with_player(ctx.player)
            .with_subject(candidate);
        if let Some(event) = &ctx.event {
            condition_ctx = condition_ctx.with_event(event);
        }
        if !self.condition.evaluate(&condition_ctx) {
            return false;
        }
        if is_restricted(state, candidate, RestrictedAction::BeTargeted, Some(ctx.source)) {
            return false;
        }
        self.game_action
            .as_ref()
            .map_or(true, |action| action.can_affect(state, ctx, candidate))
    }

    /// All legal candidates, in id order.
    #[must_use]
    pub fn candidates(&self, state: &GameState, ctx: &ActionContext) -> Vec<EntityId> {
        self.pool(state)
            .into_iter()
            .filter(|&candidate| self.is_legal(state, ctx, candidate))
            .collect()
    }

    fn pool(&self, state: &GameState) -> Vec<EntityId> {
        match (self.kind, self.location) {
            (EntityKind::Card, TargetLocation::InPlay) => state.cards_in_play(),
            (EntityKind::Card, TargetLocation::Zone(role)) => state
                .config()
                .zones
                .iter()
                .filter(|zone| zone.role == role)
                .flat_map(|zone| state.cards_in_zone(zone.id))
                .collect(),
            (EntityKind::Card, TargetLocation::Any) => {
                let mut all: Vec<_> = state
                    .config()
                    .zones
                    .iter()
                    .flat_map(|zone| state.cards_in_zone(zone.id))
                    .collect();
                all.sort_unstable();
                all
            }
            (kind, _) => state.entities_of_kind(kind),
        }
    }
}
