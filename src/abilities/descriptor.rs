//! Ability descriptors.
//!
//! An `AbilityDescriptor` is declarative data: a card definition carries a
//! list of them, and `AbilityStore::attach` turns one into a live ability on
//! an entity. The same descriptor can be attached many times (printed on
//! several copies, granted by effects).

use crate::actions::{GameAction, TargetDescriptor};
use crate::core::{EntityId, GameConfig, ZoneRole};
use crate::effects::EffectSpec;
use crate::error::ConfigError;
use crate::stack::HandlerContext;
use crate::triggers::{Condition, EventTypeId};

use super::cost::Cost;
use super::limit::AbilityLimit;

/// How an ability is initiated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AbilityType {
    /// Initiated by a player when legal.
    Action,
    /// Triggers after an event resolves.
    Reaction,
    /// Triggers before an event resolves.
    Interrupt,
    /// Triggers before an event resolves and may cancel it.
    WouldInterrupt,
    /// Always-on effects while the source is in play.
    Persistent,
}

impl AbilityType {
    #[must_use]
    pub fn is_triggered(self) -> bool {
        matches!(self, Self::Reaction | Self::Interrupt | Self::WouldInterrupt)
    }
}

/// Custom resolution logic. Reads the state and queues actions.
pub type Handler = fn(&mut HandlerContext<'_>);

/// What a game-action step is applied to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ActionTarget {
    /// Every chosen target of every target descriptor without its own action.
    #[default]
    Targets,
    /// The target chosen for a named descriptor.
    Named(String),
    /// The ability's source.
    Source,
    /// The resolving player.
    Controller,
    /// Every opponent of the resolving player.
    Opponent,
    /// The triggering event's target.
    EventTarget,
    /// The triggering event's source.
    EventSource,
    Entity(EntityId),
}

/// A game action and what it applies to.
#[derive(Clone, Debug)]
pub struct ActionStep {
    pub action: GameAction,
    pub target: ActionTarget,
}

impl ActionStep {
    pub fn new(action: GameAction, target: ActionTarget) -> Self {
        Self { action, target }
    }
}

/// Declarative ability description.
#[derive(Clone, Debug)]
pub struct AbilityDescriptor {
    pub title: String,
    pub ability_type: AbilityType,
    /// Triggered abilities may be declined when optional.
    pub optional: bool,
    /// Trigger clauses: an event type and a condition on it.
    pub when: Vec<(EventTypeId, Condition)>,
    pub costs: Vec<Cost>,
    pub targets: Vec<TargetDescriptor>,
    /// Logged when the ability resolves. `{player}`, `{source}` and
    /// `{target}` are substituted.
    pub message: Option<String>,
    pub game_actions: Vec<ActionStep>,
    pub handler: Option<Handler>,
    pub limit: Option<AbilityLimit>,
    pub cannot_be_mirrored: bool,
    /// Choose targets before paying costs.
    pub cannot_target_first: bool,
    /// Must hold for the ability to be initiated or triggered.
    pub condition: Condition,
    /// Zone the source must be in. `None` means in play.
    pub location: Option<ZoneRole>,
    /// Effects of a persistent ability.
    pub effects: Vec<EffectSpec>,
}

impl AbilityDescriptor {
    /// An empty action ability.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ability_type: AbilityType::Action,
            optional: false,
            when: Vec::new(),
            costs: Vec::new(),
            targets: Vec::new(),
            message: None,
            game_actions: Vec::new(),
            handler: None,
            limit: None,
            cannot_be_mirrored: false,
            cannot_target_first: true,
            condition: Condition::Always,
            location: None,
            effects: Vec::new(),
        }
    }

    /// An action ability applying `action` to its targets.
    pub fn action(title: impl Into<String>, action: GameAction) -> Self {
        Self::new(title).with_step(action, ActionTarget::Targets)
    }

    fn triggered(title: impl Into<String>, ability_type: AbilityType, event: EventTypeId, condition: Condition) -> Self {
        let mut ability = Self::new(title);
        ability.ability_type = ability_type;
        ability.when.push((event, condition));
        ability
    }

    pub fn reaction(title: impl Into<String>, event: EventTypeId, condition: Condition) -> Self {
        Self::triggered(title, AbilityType::Reaction, event, condition)
    }

    pub fn interrupt(title: impl Into<String>, event: EventTypeId, condition: Condition) -> Self {
        Self::triggered(title, AbilityType::Interrupt, event, condition)
    }

    pub fn would_interrupt(title: impl Into<String>, event: EventTypeId, condition: Condition) -> Self {
        Self::triggered(title, AbilityType::WouldInterrupt, event, condition)
    }

    /// A persistent ability with one effect.
    pub fn persistent(title: impl Into<String>, effect: EffectSpec) -> Self {
        let mut ability = Self::new(title);
        ability.ability_type = AbilityType::Persistent;
        ability.effects.push(effect);
        ability
    }

    #[must_use]
    pub fn also_when(mut self, event: EventTypeId, condition: Condition) -> Self {
        self.when.push((event, condition));
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub fn with_cost(mut self, cost: Cost) -> Self {
        self.costs.push(cost);
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: TargetDescriptor) -> Self {
        self.targets.push(target);
        self
    }

    #[must_use]
    pub fn with_step(mut self, action: GameAction, target: ActionTarget) -> Self {
        self.game_actions.push(ActionStep::new(action, target));
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: EffectSpec) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: AbilityLimit) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = self.condition.and(condition);
        self
    }

    #[must_use]
    pub fn from_location(mut self, role: ZoneRole) -> Self {
        self.location = Some(role);
        self
    }

    /// Let targets be chosen before costs are paid.
    #[must_use]
    pub fn target_first(mut self) -> Self {
        self.cannot_target_first = false;
        self
    }

    #[must_use]
    pub fn cannot_be_mirrored(mut self) -> Self {
        self.cannot_be_mirrored = true;
        self
    }

    /// Structural checks, run when a card is registered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let title = || self.title.clone();
        match self.ability_type {
            AbilityType::Persistent => {
                if self.effects.is_empty() {
                    return Err(ConfigError::MissingEffects { title: title() });
                }
            }
            ability_type => {
                let has_target_action = self.targets.iter().any(|t| t.game_action.is_some());
                if self.game_actions.is_empty() && self.handler.is_none() && !has_target_action {
                    return Err(ConfigError::MissingAction { title: title() });
                }
                if ability_type.is_triggered() && self.when.is_empty() {
                    return Err(ConfigError::MissingTrigger { title: title() });
                }
            }
        }
        if self.limit.as_ref().is_some_and(|limit| limit.max == 0) {
            return Err(ConfigError::ZeroLimit { title: title() });
        }
        let empty_choice = self
            .game_actions
            .iter()
            .map(|step| &step.action)
            .chain(self.targets.iter().filter_map(|t| t.game_action.as_ref()))
            .any(GameAction::has_empty_choice);
        if empty_choice {
            return Err(ConfigError::EmptyChoice { title: title() });
        }
        self.granted_abilities().into_iter().try_for_each(Self::validate)
    }

    /// Abilities this one can hand out to other cards.
    fn granted_abilities(&self) -> Vec<&AbilityDescriptor> {
        self.game_actions
            .iter()
            .map(|step| &step.action)
            .chain(self.targets.iter().filter_map(|t| t.game_action.as_ref()))
            .flat_map(GameAction::granted_abilities)
            .chain(self.effects.iter().flat_map(|spec| spec.op.granted_abilities()))
            .collect()
    }

    /// Every condition this ability evaluates.
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut all = vec![&self.condition];
        all.extend(self.when.iter().map(|(_, condition)| condition));
        all.extend(self.costs.iter().flat_map(Cost::conditions));
        all.extend(self.targets.iter().flat_map(TargetDescriptor::conditions));
        all.extend(self.game_actions.iter().flat_map(|step| step.action.conditions()));
        all.extend(self.effects.iter().flat_map(EffectSpec::conditions));
        all
    }

    /// Check that every named custom condition is registered.
    pub fn validate_conditions(&self, config: &GameConfig) -> Result<(), ConfigError> {
        self.conditions().into_iter().try_for_each(|c| c.validate(config))
    }
}
