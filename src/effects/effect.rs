//! Lasting effect definitions.
//!
//! An `Effect` is one modification of one or more entities: a numeric fold
//! term, a granted trait or flag, a restriction, or a detached operation with
//! explicit apply/unapply. Effects reference every entity by id.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::abilities::{AbilityDescriptor, AbilityLimit, ActionStep, Restriction};
use crate::core::{EntityId, EntityKind, GameState, PlayerId};
use crate::stack::ResolutionId;
use crate::triggers::{Condition, ConditionContext};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectId(pub u32);

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Effect({})", self.0)
    }
}

/// How long an effect lasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Duration {
    /// While the source is in play and the effect's condition holds.
    Persistent,
    UntilEndOfConflict,
    UntilEndOfPhase,
    UntilEndOfRound,
    /// Until the end of the game.
    Game,
}

impl Duration {
    /// Counter value marking the window an effect of this duration lives in.
    #[must_use]
    pub fn window(self, state: &GameState) -> u32 {
        match self {
            Self::UntilEndOfConflict => state.public.conflict_number,
            Self::UntilEndOfPhase => state.public.phase_number,
            Self::UntilEndOfRound => state.public.round,
            Self::Persistent | Self::Game => 0,
        }
    }

    /// Whether the window stamped `window` has closed.
    #[must_use]
    pub fn has_expired(self, window: u32, state: &GameState) -> bool {
        self.window(state) != window
    }
}

/// A number computed from the state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Amount {
    Fixed(i64),
    /// Current value of an attribute on the source.
    SourceAttr(String),
    /// Current value of a state key on the controlling player.
    ControllerState(String),
    /// Number of cards in play matching the condition (as subject).
    CountInPlay(Condition),
    Negate(Box<Amount>),
}

impl Amount {
    #[must_use]
    pub fn evaluate(&self, state: &GameState, source: EntityId, controller: Option<PlayerId>) -> i64 {
        match self {
            Self::Fixed(value) => *value,
            Self::SourceAttr(key) => state.get_value(source, key),
            Self::ControllerState(key) => {
                controller.map_or(0, |p| state.get_value(EntityId::player(p), key))
            }
            Self::CountInPlay(condition) => {
                let mut ctx = ConditionContext::new(state).with_source(source);
                if let Some(controller) = controller {
                    ctx = ctx.with_player(controller);
                }
                state
                    .cards_in_play()
                    .into_iter()
                    .filter(|&card| condition.evaluate(&ctx.with_subject(card)))
                    .count() as i64
            }
            Self::Negate(inner) => -inner.evaluate(state, source, controller),
        }
    }

    pub fn conditions(&self) -> Vec<&Condition> {
        match self {
            Self::CountInPlay(condition) => vec![condition],
            Self::Negate(inner) => inner.conditions(),
            _ => Vec::new(),
        }
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self::Fixed(value)
    }
}

/// The value of a numeric effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectValue {
    /// Computed once when the effect activates.
    Static(Amount),
    /// Recomputed on every read.
    Dynamic(Amount),
}

impl EffectValue {
    #[must_use]
    pub fn amount(&self) -> &Amount {
        match self {
            Self::Static(amount) | Self::Dynamic(amount) => amount,
        }
    }
}

/// What an effect does to its targets.
#[derive(Clone, Debug)]
pub enum EffectOp {
    /// Replace the base value before modifiers.
    SetBase { key: String, value: EffectValue },
    Modify { key: String, value: EffectValue },
    Multiply { key: String, value: EffectValue },
    /// Absolute override of the final value.
    Set { key: String, value: EffectValue },
    AddTrait(String),
    AddKeyword(String),
    Flag(String),
    /// Printed abilities stop working.
    Blank,
    /// The effect's controller takes control of the target.
    TakeControl,
    Restriction(Restriction),
    GainAbility(Arc<AbilityDescriptor>),
    ReduceCost {
        amount: i64,
        condition: Condition,
        limit: Option<AbilityLimit>,
    },
    DelayedEffect {
        condition: Condition,
        actions: Vec<ActionStep>,
    },
    TerminalCondition {
        condition: Condition,
        actions: Vec<ActionStep>,
    },
    /// Raise a player state flag while active.
    PlayerFlag(String),
}

impl EffectOp {
    /// Detached operations have apply/unapply side effects.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        matches!(
            self,
            Self::GainAbility(_)
                | Self::ReduceCost { .. }
                | Self::DelayedEffect { .. }
                | Self::TerminalCondition { .. }
                | Self::PlayerFlag(_)
        )
    }

    /// The key and value of a numeric op.
    #[must_use]
    pub fn numeric(&self) -> Option<(&str, &EffectValue)> {
        match self {
            Self::SetBase { key, value }
            | Self::Modify { key, value }
            | Self::Multiply { key, value }
            | Self::Set { key, value } => Some((key, value)),
            _ => None,
        }
    }

    /// Abilities gained through this op, including by its delayed actions.
    pub fn granted_abilities(&self) -> Vec<&AbilityDescriptor> {
        match self {
            Self::GainAbility(ability) => vec![ability.as_ref()],
            Self::DelayedEffect { actions, .. } | Self::TerminalCondition { actions, .. } => {
                actions.iter().flat_map(|step| step.action.granted_abilities()).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn conditions(&self) -> Vec<&Condition> {
        match self {
            Self::Restriction(restriction) => vec![&restriction.applies_to],
            Self::GainAbility(ability) => ability.conditions(),
            Self::ReduceCost { condition, .. } => vec![condition],
            Self::DelayedEffect { condition, actions } | Self::TerminalCondition { condition, actions } => {
                let mut all = vec![condition];
                all.extend(actions.iter().flat_map(|step| step.action.conditions()));
                all
            }
            op => op.numeric().map(|(_, v)| v.amount().conditions()).unwrap_or_default(),
        }
    }
}

/// Which entities an effect applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EffectTarget {
    Entity(EntityId),
    /// Every entity of the effect's scope matching the condition.
    Matching(Condition),
}

/// A registered effect.
#[derive(Clone, Debug)]
pub struct Effect {
    pub id: EffectId,
    pub source: EntityId,
    pub controller: PlayerId,
    pub scope: EntityKind,
    pub target: EffectTarget,
    pub op: EffectOp,
    pub duration: Duration,
    /// Evaluated per target, with the target as subject.
    pub condition: Condition,
    /// The resolution that created the effect, if any.
    pub created_by: Option<ResolutionId>,
    /// Comes from a printed ability of the source.
    pub printed: bool,
    /// Duration window stamp at creation.
    pub window: u32,
}

impl Effect {
    /// The controller relations are measured from: the source's current
    /// controller for printed effects, the creating player otherwise.
    #[must_use]
    pub fn controller_in(&self, state: &GameState) -> Option<PlayerId> {
        if self.printed {
            state.controller_of(self.source).or(Some(self.controller))
        } else {
            Some(self.controller)
        }
    }

    pub(crate) fn condition_context<'a>(&self, state: &'a GameState, subject: EntityId) -> ConditionContext<'a> {
        let ctx = ConditionContext::new(state).with_source(self.source).with_subject(subject);
        match self.controller_in(state) {
            Some(player) => ctx.with_player(player),
            None => ctx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, CardInstance};
    use crate::core::{GameConfig, ZoneConfig, ZoneId, ZoneRole};

    fn state() -> (GameState, EntityId) {
        let config = GameConfig::new(2)
            .with_zone(ZoneConfig::new(ZoneId(0), "Play").with_role(ZoneRole::Play).in_play());
        let mut state = GameState::new(config, 9);
        let card = state.alloc_entity();
        let mut instance = CardInstance::new(card, CardId::new(1), PlayerId::new(0), ZoneId(0));
        instance.set_state("glory", 2);
        instance.traits.push("bushi".into());
        state.add_card(instance);
        (state, card)
    }

    #[test]
    fn test_amounts() {
        let (mut state, card) = state();
        state.public.set_player_state(PlayerId::new(0), "honor", 11);
        let me = Some(PlayerId::new(0));

        assert_eq!(Amount::Fixed(3).evaluate(&state, card, me), 3);
        assert_eq!(Amount::SourceAttr("glory".into()).evaluate(&state, card, me), 2);
        assert_eq!(Amount::ControllerState("honor".into()).evaluate(&state, card, me), 11);
        assert_eq!(Amount::ControllerState("honor".into()).evaluate(&state, card, None), 0);
        assert_eq!(
            Amount::CountInPlay(Condition::SubjectHasTrait("bushi".into())).evaluate(&state, card, me),
            1
        );
        assert_eq!(Amount::Negate(Box::new(Amount::Fixed(2))).evaluate(&state, card, me), -2);
    }

    #[test]
    fn test_duration_windows() {
        let (mut state, _) = state();
        let window = Duration::UntilEndOfPhase.window(&state);
        assert!(!Duration::UntilEndOfPhase.has_expired(window, &state));

        state.public.phase_number += 1;
        assert!(Duration::UntilEndOfPhase.has_expired(window, &state));
        assert!(!Duration::Game.has_expired(0, &state));
    }

    #[test]
    fn test_detached_classification() {
        assert!(EffectOp::PlayerFlag("first-action".into()).is_detached());
        assert!(!EffectOp::Blank.is_detached());
        let op = EffectOp::Modify {
            key: "military".into(),
            value: EffectValue::Static(Amount::Fixed(1)),
        };
        assert_eq!(op.numeric().map(|(k, _)| k), Some("military"));
    }

    #[test]
    fn test_ids_serialize() {
        let json = serde_json::to_string(&EffectId(4)).unwrap();
        assert_eq!(serde_json::from_str::<EffectId>(&json).unwrap(), EffectId(4));
        let amount = Amount::CountInPlay(Condition::SubjectInPlay);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(serde_json::from_str::<Amount>(&json).unwrap(), amount);
    }
}
