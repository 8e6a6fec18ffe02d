//! Effect specifications.
//!
//! Content describes effects as `EffectSpec` values built with
//! `EffectBuilder`. A spec becomes concrete `Effect`s when an ability
//! resolves (or a persistent ability is attached), at which point its target
//! selector is resolved against the chosen targets.
//!
//! ```
//! use ccg_rules::effects::{Duration, EffectBuilder};
//!
//! let spec = EffectBuilder::modify("military", 2).until_end_of_conflict();
//! assert_eq!(spec.duration, Duration::UntilEndOfConflict);
//! ```

use std::sync::Arc;

use crate::abilities::{AbilityDescriptor, AbilityLimit, ActionStep, Restriction};
use crate::core::{EntityId, EntityKind, GameState, PlayerId};
use crate::stack::ResolutionId;
use crate::triggers::Condition;

use super::effect::{Amount, Duration, Effect, EffectId, EffectOp, EffectTarget, EffectValue};

/// Who a spec applies to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SpecTarget {
    /// Each target the resolution chose.
    #[default]
    Targets,
    Source,
    /// The resolving player.
    Controller,
    /// Every entity of the scope matching the condition, re-evaluated live.
    Matching(Condition),
    Entity(EntityId),
}

/// An effect waiting for a source and targets.
#[derive(Clone, Debug)]
pub struct EffectSpec {
    pub scope: EntityKind,
    pub target: SpecTarget,
    pub op: EffectOp,
    pub duration: Duration,
    pub condition: Condition,
}

impl EffectSpec {
    pub fn new(scope: EntityKind, op: EffectOp) -> Self {
        Self {
            scope,
            target: SpecTarget::Targets,
            op,
            duration: Duration::Persistent,
            condition: Condition::Always,
        }
    }

    #[must_use]
    pub fn lasting(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn until_end_of_conflict(self) -> Self {
        self.lasting(Duration::UntilEndOfConflict)
    }

    #[must_use]
    pub fn until_end_of_phase(self) -> Self {
        self.lasting(Duration::UntilEndOfPhase)
    }

    #[must_use]
    pub fn until_end_of_round(self) -> Self {
        self.lasting(Duration::UntilEndOfRound)
    }

    #[must_use]
    pub fn permanently(self) -> Self {
        self.lasting(Duration::Game)
    }

    #[must_use]
    pub fn on(mut self, target: SpecTarget) -> Self {
        if target == SpecTarget::Controller {
            self.scope = EntityKind::Player;
        }
        self.target = target;
        self
    }

    /// Apply to every entity of `scope` matching `condition`.
    #[must_use]
    pub fn matching(mut self, scope: EntityKind, condition: Condition) -> Self {
        self.scope = scope;
        self.target = SpecTarget::Matching(condition);
        self
    }

    /// Only active (per target) while `condition` holds.
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = self.condition.and(condition);
        self
    }

    pub fn conditions(&self) -> Vec<&Condition> {
        let mut all = vec![&self.condition];
        if let SpecTarget::Matching(condition) = &self.target {
            all.push(condition);
        }
        all.extend(self.op.conditions());
        all
    }

    /// Concrete effects for a source, controller and chosen targets.
    ///
    /// Ids are assigned when the effects are added to the engine.
    #[must_use]
    pub fn instantiate(
        &self,
        state: &GameState,
        source: EntityId,
        controller: PlayerId,
        targets: &[EntityId],
        created_by: Option<ResolutionId>,
    ) -> Vec<Effect> {
        let effect = |scope: EntityKind, target: EffectTarget| Effect {
            id: EffectId(0),
            source,
            controller,
            scope,
            target,
            op: self.op.clone(),
            duration: self.duration,
            condition: self.condition.clone(),
            created_by,
            printed: false,
            window: self.duration.window(state),
        };
        match &self.target {
            SpecTarget::Targets => targets
                .iter()
                .filter_map(|&t| state.kind_of(t).map(|kind| effect(kind, EffectTarget::Entity(t))))
                .collect(),
            SpecTarget::Source => {
                let kind = state.kind_of(source).unwrap_or(self.scope);
                vec![effect(kind, EffectTarget::Entity(source))]
            }
            SpecTarget::Controller => vec![effect(EntityKind::Player, EffectTarget::Entity(EntityId::player(controller)))],
            SpecTarget::Matching(condition) => vec![effect(self.scope, EffectTarget::Matching(condition.clone()))],
            SpecTarget::Entity(entity) => {
                let kind = state.kind_of(*entity).unwrap_or(self.scope);
                vec![effect(kind, EffectTarget::Entity(*entity))]
            }
        }
    }
}

/// Factory for common effect specs.
pub struct EffectBuilder;

impl EffectBuilder {
    fn card(op: EffectOp) -> EffectSpec {
        EffectSpec::new(EntityKind::Card, op)
    }

    pub fn modify(key: impl Into<String>, amount: i64) -> EffectSpec {
        Self::card(EffectOp::Modify {
            key: key.into(),
            value: EffectValue::Static(Amount::Fixed(amount)),
        })
    }

    /// A modifier recomputed on every read.
    pub fn modify_by(key: impl Into<String>, amount: Amount) -> EffectSpec {
        Self::card(EffectOp::Modify {
            key: key.into(),
            value: EffectValue::Dynamic(amount),
        })
    }

    pub fn set_base(key: impl Into<String>, value: i64) -> EffectSpec {
        Self::card(EffectOp::SetBase {
            key: key.into(),
            value: EffectValue::Static(Amount::Fixed(value)),
        })
    }

    pub fn multiply(key: impl Into<String>, factor: i64) -> EffectSpec {
        Self::card(EffectOp::Multiply {
            key: key.into(),
            value: EffectValue::Static(Amount::Fixed(factor)),
        })
    }

    pub fn set(key: impl Into<String>, value: i64) -> EffectSpec {
        Self::card(EffectOp::Set {
            key: key.into(),
            value: EffectValue::Static(Amount::Fixed(value)),
        })
    }

    pub fn add_trait(name: impl Into<String>) -> EffectSpec {
        Self::card(EffectOp::AddTrait(name.into()))
    }

    pub fn add_keyword(name: impl Into<String>) -> EffectSpec {
        Self::card(EffectOp::AddKeyword(name.into()))
    }

    pub fn flag(name: impl Into<String>) -> EffectSpec {
        Self::card(EffectOp::Flag(name.into()))
    }

    pub fn blank() -> EffectSpec {
        Self::card(EffectOp::Blank)
    }

    pub fn take_control() -> EffectSpec {
        Self::card(EffectOp::TakeControl)
    }

    pub fn restriction(restriction: Restriction) -> EffectSpec {
        Self::card(EffectOp::Restriction(restriction))
    }

    pub fn gain_ability(ability: AbilityDescriptor) -> EffectSpec {
        Self::card(EffectOp::GainAbility(Arc::new(ability)))
    }

    /// Reduce the controller's costs for abilities whose source matches.
    pub fn reduce_cost(amount: i64, condition: Condition) -> EffectSpec {
        EffectSpec::new(
            EntityKind::Player,
            EffectOp::ReduceCost {
                amount,
                condition,
                limit: None,
            },
        )
        .on(SpecTarget::Controller)
    }

    /// A reducer that stops working after `limit` uses in its scope.
    pub fn reduce_cost_limited(amount: i64, condition: Condition, limit: AbilityLimit) -> EffectSpec {
        EffectSpec::new(
            EntityKind::Player,
            EffectOp::ReduceCost {
                amount,
                condition,
                limit: Some(limit),
            },
        )
        .on(SpecTarget::Controller)
    }

    pub fn increase_cost(amount: i64, condition: Condition) -> EffectSpec {
        Self::reduce_cost(-amount, condition)
    }

    /// Fire `actions` once, the next time `condition` holds for an event.
    pub fn delayed_effect(condition: Condition, actions: Vec<ActionStep>) -> EffectSpec {
        Self::card(EffectOp::DelayedEffect { condition, actions })
    }

    /// Fire `actions` once, as soon as `condition` holds after any change.
    pub fn terminal_condition(condition: Condition, actions: Vec<ActionStep>) -> EffectSpec {
        Self::card(EffectOp::TerminalCondition { condition, actions })
    }

    pub fn player_flag(key: impl Into<String>) -> EffectSpec {
        EffectSpec::new(EntityKind::Player, EffectOp::PlayerFlag(key.into())).on(SpecTarget::Controller)
    }
}
