//! The ability resolution pipeline.
//!
//! One `AbilityResolution` walks a single ability from initiation to its
//! outcome. Until costs are paid nothing is mutated, so any failure up to
//! then leaves the state untouched. Paying costs is the commitment point:
//! a target lost afterwards is dropped, and the ability resolves against
//! whatever remains. It aborts, without a refund, only once every required
//! target is gone.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::abilities::{
    can_pay_all, pay_costs, resource_cost, Ability, AbilityDescriptor, AbilityId, AbilityType, ActionTarget, Cost,
    LimitKey,
};
use crate::actions::{ActionContext, GameAction, PendingEvent};
use crate::core::{EntityId, EntityKind, GameState, PlayerId, ZoneId};
use crate::effects::{recalculate, remove_where, DelayedEffect};
use crate::triggers::{events, EventId, GameEvent};

use super::context::HandlerContext;
use super::legality::{self, limit_bonus};
use super::prompt::{Prompt, PromptKind};
use super::{AbortReason, EventWindow, Frame, ResolutionId, ResolutionOutcome, StackIo, Step};

const TARGETS_FIRST: &str = "Choose targets first";
const COSTS_FIRST: &str = "Pay costs first";
const NO_TARGET: &str = "No target";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Initiated,
    OrderChoice,
    Targets { index: usize, before_costs: bool },
    Costs { index: usize },
    Pay,
    Revalidate,
    Announce,
    Execute,
    Choices { index: usize },
    Fire,
    Executed,
    Finished,
}

pub(crate) struct AbilityResolution {
    id: ResolutionId,
    ability: Option<AbilityId>,
    descriptor: Arc<AbilityDescriptor>,
    source: EntityId,
    player: PlayerId,
    event: Option<GameEvent>,
    limit_key: Option<LimitKey>,
    skip_legality: bool,
    stage: Stage,
    target_first: bool,
    targets: Vec<(String, Option<EntityId>)>,
    /// What `ActionTarget::Targets` means when the ability declares no targets.
    default_targets: Vec<EntityId>,
    cost_choices: Vec<Option<EntityId>>,
    cost_origins: Vec<(EntityId, ZoneId)>,
    actions: Vec<(GameAction, Vec<EntityId>)>,
    /// Entities or option indices behind the prompt this frame parked on.
    offered: Vec<usize>,
    candidates: Vec<EntityId>,
    own_events: Vec<EventId>,
    initiated: Option<EventId>,
}

impl AbilityResolution {
    fn with_descriptor(
        id: ResolutionId,
        descriptor: Arc<AbilityDescriptor>,
        source: EntityId,
        player: PlayerId,
        event: Option<GameEvent>,
    ) -> Self {
        Self {
            id,
            ability: None,
            descriptor,
            source,
            player,
            event,
            limit_key: None,
            skip_legality: false,
            stage: Stage::Initiated,
            target_first: false,
            targets: Vec::new(),
            default_targets: Vec::new(),
            cost_choices: Vec::new(),
            cost_origins: Vec::new(),
            actions: Vec::new(),
            offered: Vec::new(),
            candidates: Vec::new(),
            own_events: Vec::new(),
            initiated: None,
        }
    }

    /// A player-initiated or triggered resolution of an attached ability.
    pub(crate) fn new(id: ResolutionId, ability: &Ability, player: PlayerId, event: Option<GameEvent>) -> Self {
        let mut resolution = Self::with_descriptor(id, Arc::clone(&ability.descriptor), ability.owner, player, event);
        resolution.ability = Some(ability.id);
        resolution.limit_key = Some(ability.limit_key.clone());
        resolution
    }

    /// A fired delayed effect or terminal condition. It was legal when
    /// registered, so only its actions run.
    pub(crate) fn delayed(id: ResolutionId, entry: DelayedEffect) -> Self {
        let mut descriptor = AbilityDescriptor::new(entry.title);
        descriptor.game_actions = entry.actions;
        let mut resolution =
            Self::with_descriptor(id, Arc::new(descriptor), entry.source, entry.controller, None);
        resolution.skip_legality = true;
        resolution.default_targets = vec![entry.target];
        resolution
    }

    /// A bare game action performed on behalf of `source`.
    pub(crate) fn perform(
        id: ResolutionId,
        source: EntityId,
        player: PlayerId,
        action: GameAction,
        target: EntityId,
    ) -> Self {
        let descriptor = AbilityDescriptor::new(format!("{:?}", action.kind()))
            .with_step(action, ActionTarget::Entity(target));
        let mut resolution = Self::with_descriptor(id, Arc::new(descriptor), source, player, None);
        resolution.skip_legality = true;
        resolution
    }

    pub(crate) fn id(&self) -> ResolutionId {
        self.id
    }

    fn context(&self) -> ActionContext {
        ActionContext {
            source: self.source,
            player: self.player,
            resolution: Some(self.id),
            event: self.event.clone(),
            can_cancel: self.descriptor.ability_type == AbilityType::WouldInterrupt,
        }
    }

    fn finish(&mut self, io: &mut StackIo, outcome: ResolutionOutcome) -> Step {
        debug!(
            resolution = %self.id,
            title = %self.descriptor.title,
            source = %self.source,
            ?outcome,
            "resolution finished"
        );
        io.record(self.id, outcome);
        self.stage = Stage::Finished;
        Step::Done
    }

    fn abort(&mut self, io: &mut StackIo, reason: AbortReason) -> Step {
        self.finish(io, ResolutionOutcome::Aborted(reason))
    }

    fn advance(&mut self, stage: Stage) -> Step {
        trace!(resolution = %self.id, from = ?self.stage, to = ?stage, "pipeline stage");
        self.stage = stage;
        Step::Continue
    }

    pub(crate) fn step(&mut self, state: &mut GameState, io: &mut StackIo) -> Step {
        match self.stage {
            Stage::Initiated => self.check_legality(state, io),
            Stage::OrderChoice => self.order_choice(state, io),
            Stage::Targets { index, before_costs } => self.choose_target(state, io, index, before_costs),
            Stage::Costs { index } => self.choose_cost(state, io, index),
            Stage::Pay => self.pay(state, io),
            Stage::Revalidate => self.revalidate(state, io),
            Stage::Announce => self.announce(state),
            Stage::Execute => self.execute(state, io),
            Stage::Choices { index } => self.expand_choice(state, io, index),
            Stage::Fire => self.fire(state),
            Stage::Executed => self.complete(state, io),
            Stage::Finished => Step::Done,
        }
    }

    fn check_legality(&mut self, state: &GameState, io: &mut StackIo) -> Step {
        if !self.skip_legality {
            let Some(ability) = self.ability.and_then(|id| state.abilities.get(id)) else {
                return self.abort(io, AbortReason::Inactive);
            };
            if let Err(reason) = legality::check(state, ability, self.player, self.event.as_ref()) {
                return self.abort(io, reason);
            }
        }
        if !self.descriptor.cannot_target_first && !self.descriptor.targets.is_empty() {
            return self.advance(Stage::OrderChoice);
        }
        self.advance(Stage::Costs { index: 0 })
    }

    fn order_choice(&mut self, state: &GameState, io: &mut StackIo) -> Step {
        let Some(answer) = io.take_answer() else {
            let prompt = Prompt::new(self.player, state.name_of(self.source), PromptKind::TargetFirst)
                .with_options([COSTS_FIRST.to_string(), TARGETS_FIRST.to_string()]);
            return Step::Prompt(prompt);
        };
        self.target_first = answer == 1;
        if self.target_first {
            self.advance(Stage::Targets {
                index: 0,
                before_costs: true,
            })
        } else {
            self.advance(Stage::Costs { index: 0 })
        }
    }

    fn after_targets(&mut self, io: &mut StackIo, before_costs: bool) -> Step {
        if before_costs {
            self.advance(Stage::Costs { index: 0 })
        } else if self.lost_required_targets() {
            self.abort(io, AbortReason::NoLegalTargets)
        } else {
            self.advance(Stage::Announce)
        }
    }

    /// True when the ability declares required targets and none is chosen.
    fn lost_required_targets(&self) -> bool {
        let mut required = self
            .descriptor
            .targets
            .iter()
            .zip(&self.targets)
            .filter(|(target, _)| !target.optional)
            .peekable();
        required.peek().is_some() && required.all(|(_, (_, chosen))| chosen.is_none())
    }

    fn choose_target(&mut self, state: &GameState, io: &mut StackIo, index: usize, before_costs: bool) -> Step {
        let descriptor = Arc::clone(&self.descriptor);
        let Some(target) = descriptor.targets.get(index) else {
            return self.after_targets(io, before_costs);
        };
        let next = Stage::Targets {
            index: index + 1,
            before_costs,
        };

        if let Some(answer) = io.take_answer() {
            let chosen = self.candidates.get(answer).copied();
            self.targets.push((target.name.clone(), chosen));
            self.candidates.clear();
            return self.advance(next);
        }

        let candidates = target.candidates(state, &self.context());
        match (candidates.as_slice(), target.optional) {
            ([], true) => {
                self.targets.push((target.name.clone(), None));
                self.advance(next)
            }
            ([], false) if before_costs => self.abort(io, AbortReason::NoLegalTargets),
            ([], false) => {
                trace!(resolution = %self.id, target = %target.name, "required target lost after costs");
                self.targets.push((target.name.clone(), None));
                self.advance(next)
            }
            ([only], false) => {
                self.targets.push((target.name.clone(), Some(*only)));
                self.advance(next)
            }
            _ => {
                let mut options: Vec<String> = candidates.iter().map(|&c| state.name_of(c)).collect();
                if target.optional {
                    options.push(NO_TARGET.to_string());
                }
                self.candidates = candidates;
                let prompt = Prompt::new(
                    self.player,
                    format!("{}: choose {}", descriptor.title, target.name),
                    PromptKind::Target {
                        name: target.name.clone(),
                    },
                )
                .with_options(options);
                Step::Prompt(prompt)
            }
        }
    }

    fn choose_cost(&mut self, state: &GameState, io: &mut StackIo, index: usize) -> Step {
        let descriptor = Arc::clone(&self.descriptor);
        let Some(cost) = descriptor.costs.get(index) else {
            return self.advance(Stage::Pay);
        };
        let next = Stage::Costs { index: index + 1 };

        if let Some(answer) = io.take_answer() {
            self.cost_choices.push(self.candidates.get(answer).copied());
            self.candidates.clear();
            return self.advance(next);
        }

        match cost.choices(state, &self.context()) {
            None => {
                self.cost_choices.push(None);
                self.advance(next)
            }
            Some(choices) if choices.is_empty() => self.abort(io, AbortReason::CannotPayCosts),
            Some(choices) if choices.len() == 1 => {
                self.cost_choices.push(Some(choices[0]));
                self.advance(next)
            }
            Some(choices) => {
                let options: Vec<String> = choices.iter().map(|&c| state.name_of(c)).collect();
                self.candidates = choices;
                let prompt = Prompt::new(self.player, format!("{}: pay cost", descriptor.title), PromptKind::Cost)
                    .with_options(options);
                Step::Prompt(prompt)
            }
        }
    }

    fn pay(&mut self, state: &mut GameState, io: &mut StackIo) -> Step {
        let ctx = self.context();
        let descriptor = Arc::clone(&self.descriptor);
        let costs = &descriptor.costs;
        if !can_pay_all(costs, state, &ctx) {
            return self.abort(io, AbortReason::CannotPayCosts);
        }
        if descriptor.limit.is_some() {
            if let Some(key) = self.limit_key.clone() {
                let bonus = limit_bonus(state, self.source);
                if !state.limits.record_use(&key, bonus) {
                    return self.abort(io, AbortReason::LimitReached);
                }
            }
        }

        let resource = resource_cost(costs, state, &ctx);
        self.cost_origins = costs
            .iter()
            .zip(&self.cost_choices)
            .filter(|(cost, _)| matches!(cost, Cost::ShuffleIntoDeck { .. }))
            .filter_map(|(_, chosen)| *chosen)
            .filter_map(|card| state.zones.get_zone(card).map(|zone| (card, zone)))
            .collect();
        let pending = pay_costs(costs, &self.cost_choices, &resource, state, &ctx);
        state.reducers.consume(&resource.used, &mut state.limits);
        debug!(
            resolution = %self.id,
            spent = resource.amount,
            reducers = resource.used.len(),
            "costs paid"
        );

        self.stage = if self.target_first {
            Stage::Revalidate
        } else {
            Stage::Targets {
                index: 0,
                before_costs: false,
            }
        };
        if pending.is_empty() {
            return Step::Continue;
        }
        Step::Push(Frame::Window(EventWindow::new(state, pending)))
    }

    /// Drop every chosen target that paying costs made illegal.
    fn revalidate(&mut self, state: &GameState, io: &mut StackIo) -> Step {
        let ctx = self.context();
        let descriptor = Arc::clone(&self.descriptor);
        for (target, (name, chosen)) in descriptor.targets.iter().zip(self.targets.iter_mut()) {
            if chosen.is_some_and(|entity| !target.is_legal(state, &ctx, entity)) {
                trace!(resolution = %self.id, target = %name, "chosen target no longer legal");
                *chosen = None;
            }
        }
        if self.lost_required_targets() {
            return self.abort(io, AbortReason::NoLegalTargets);
        }
        self.advance(Stage::Announce)
    }

    fn announce(&mut self, state: &mut GameState) -> Step {
        let first_target = self.targets.iter().find_map(|(_, t)| *t);
        if let Some(message) = &self.descriptor.message {
            let target_name = first_target.map(|t| state.name_of(t)).unwrap_or_default();
            let text = message
                .replace("{player}", &self.player.to_string())
                .replace("{source}", &state.name_of(self.source))
                .replace("{target}", &target_name);
            state.log_message(text);
        }

        let mut event = GameEvent::new(events::ABILITY_INITIATED)
            .with_source(self.source)
            .with_player(self.player)
            .with_tag(self.descriptor.title.clone());
        if let Some(target) = first_target {
            event = event.with_target(target);
        }
        let window = EventWindow::new(state, vec![PendingEvent::notice(event)]);
        self.initiated = window.event_ids().first().copied();
        self.stage = Stage::Execute;
        Step::Push(Frame::Window(window))
    }

    fn resolve_step_target(&self, state: &GameState, target: &ActionTarget) -> Vec<EntityId> {
        let event = self.event.as_ref();
        match target {
            ActionTarget::Targets => {
                if self.descriptor.targets.is_empty() {
                    return self.default_targets.clone();
                }
                self.descriptor
                    .targets
                    .iter()
                    .zip(&self.targets)
                    .filter(|(descriptor, _)| descriptor.game_action.is_none())
                    .filter_map(|(_, (_, chosen))| *chosen)
                    .collect()
            }
            ActionTarget::Named(name) => self
                .targets
                .iter()
                .filter(|(n, _)| n == name)
                .filter_map(|(_, chosen)| *chosen)
                .collect(),
            ActionTarget::Source => vec![self.source],
            ActionTarget::Controller => vec![EntityId::player(self.player)],
            ActionTarget::Opponent => PlayerId::all(state.player_count())
                .filter(|&p| p != self.player)
                .map(EntityId::player)
                .collect(),
            ActionTarget::EventTarget => event.and_then(|e| e.target).into_iter().collect(),
            ActionTarget::EventSource => event.and_then(|e| e.source).into_iter().collect(),
            ActionTarget::Entity(entity) => vec![*entity],
        }
    }

    fn execute(&mut self, state: &GameState, io: &mut StackIo) -> Step {
        if self.initiated.is_some_and(|id| state.is_cancelled(id)) {
            return self.abort(io, AbortReason::Cancelled);
        }

        let mut actions: Vec<(GameAction, Vec<EntityId>)> = Vec::new();
        for (descriptor, (_, chosen)) in self.descriptor.targets.iter().zip(&self.targets) {
            if let (Some(action), Some(chosen)) = (&descriptor.game_action, chosen) {
                actions.push((action.clone(), vec![*chosen]));
            }
        }
        for step in &self.descriptor.game_actions {
            actions.push((step.action.clone(), self.resolve_step_target(state, &step.target)));
        }
        if let Some(handler) = self.descriptor.handler {
            let mut ctx = HandlerContext::new(
                state,
                self.source,
                self.player,
                self.event.as_ref(),
                &self.targets,
                &self.cost_origins,
            );
            handler(&mut ctx);
            actions.extend(ctx.into_queued());
        }
        trace!(resolution = %self.id, actions = actions.len(), "actions resolved");
        self.actions = actions;
        self.advance(Stage::Choices { index: 0 })
    }

    fn expand_choice(&mut self, state: &GameState, io: &mut StackIo, index: usize) -> Step {
        let Some(position) = self.actions[index.min(self.actions.len())..]
            .iter()
            .position(|(action, _)| matches!(action, GameAction::Choose(_)))
            .map(|p| p + index)
        else {
            return self.advance(Stage::Fire);
        };
        let GameAction::Choose(options) = self.actions[position].0.clone() else {
            return self.advance(Stage::Fire);
        };

        if let Some(answer) = io.take_answer() {
            let picked = self.offered.get(answer).copied();
            self.offered.clear();
            return self.pick(position, options, picked);
        }

        let ctx = self.context();
        let targets = &self.actions[position].1;
        let legal: Vec<usize> = options
            .iter()
            .enumerate()
            .filter(|(_, (_, action))| targets.iter().any(|&t| action.can_affect(state, &ctx, t)))
            .map(|(i, _)| i)
            .collect();
        match legal.as_slice() {
            [] => self.pick(position, options, None),
            [only] => self.pick(position, options, Some(*only)),
            _ => {
                let labels = legal.iter().map(|&i| options[i].0.clone());
                let prompt = Prompt::new(self.player, self.descriptor.title.clone(), PromptKind::Choice)
                    .with_options(labels);
                self.offered = legal;
                Step::Prompt(prompt)
            }
        }
    }

    /// Replace the `Choose` at `position` with the picked option, or drop it.
    fn pick(&mut self, position: usize, options: Vec<(String, GameAction)>, picked: Option<usize>) -> Step {
        match picked.and_then(|i| options.into_iter().nth(i)) {
            Some((label, action)) => {
                trace!(resolution = %self.id, %label, "option chosen");
                self.actions[position].0 = action;
            }
            None => {
                self.actions.remove(position);
            }
        }
        // A picked option may itself be a choice.
        self.advance(Stage::Choices { index: position })
    }

    fn fire(&mut self, state: &mut GameState) -> Step {
        let ctx = self.context();
        let mut pending = Vec::new();
        for (action, targets) in &self.actions {
            for &target in targets {
                pending.extend(action.events(state, &ctx, target));
            }
        }
        self.stage = Stage::Executed;
        if pending.is_empty() {
            return Step::Continue;
        }
        let window = EventWindow::new(state, pending);
        self.own_events = window.event_ids().to_vec();
        Step::Push(Frame::Window(window))
    }

    fn complete(&mut self, state: &mut GameState, io: &mut StackIo) -> Step {
        if self.own_events.iter().any(|&id| state.is_cancelled(id)) {
            let id = self.id;
            let removed = remove_where(state, |effect| effect.created_by == Some(id));
            if removed > 0 {
                recalculate(state);
            }
            debug!(resolution = %self.id, removed, "resolution cancelled, effects unapplied");
            return self.abort(io, AbortReason::Cancelled);
        }

        self.finish(io, ResolutionOutcome::Completed);
        let mut event = GameEvent::new(events::ABILITY_RESOLVED)
            .with_source(self.source)
            .with_player(self.player)
            .with_tag(self.descriptor.title.clone())
            .uncancellable();
        for entity in self.targets.iter().filter_map(|(_, t)| *t) {
            if state.kind_of(entity) == Some(EntityKind::Card) {
                event = event.with_entity(entity);
            }
        }
        Step::Finish(vec![Frame::Window(EventWindow::new(
            state,
            vec![PendingEvent::notice(event)],
        ))])
    }
}
