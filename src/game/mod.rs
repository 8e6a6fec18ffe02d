//! The game facade.
//!
//! `Game` owns the state, the card registry and the resolution stack, and is
//! the only way callers drive resolution: initiating action abilities,
//! raising events, performing bare game actions, answering prompts and
//! crossing conflict, phase and round boundaries.
//!
//! One resolution runs at a time. Every entry point that starts work fails
//! with [`EngineError::ResolutionInProgress`] while the stack is parked on a
//! prompt; the caller answers with [`Game::respond`] instead.

mod flow;

pub use flow::FlowStep;

use tracing::debug;

use crate::abilities::{attach, Ability, AbilityId, AbilityType};
use crate::actions::{GameAction, PendingEvent};
use crate::cards::{CardId, CardInstance, CardRegistry};
use crate::core::{ConflictDeclaration, EntityId, GameConfig, GameState, PhaseId, PlayerId, ZoneId};
use crate::effects::recalculate;
use crate::error::{ConfigError, EngineError};
use crate::stack::legality;
use crate::stack::{
    AbilityResolution, EventWindow, Frame, Prompt, ResolutionId, ResolutionOutcome, ResolutionStack,
    ResolutionStatus,
};
use crate::triggers::{events, GameEvent};

pub struct Game {
    state: GameState,
    registry: CardRegistry,
    stack: ResolutionStack,
    last_resolution: Option<ResolutionId>,
}

impl Game {
    /// Create a game. Fails if a registered ability names a custom condition
    /// the configuration does not define.
    pub fn new(config: GameConfig, registry: CardRegistry, seed: u64) -> Result<Self, ConfigError> {
        registry.validate_conditions(&config)?;
        Ok(Self {
            state: GameState::new(config, seed),
            registry,
            stack: ResolutionStack::new(),
            last_resolution: None,
        })
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct state access for setup.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    #[must_use]
    pub fn registry(&self) -> &CardRegistry {
        &self.registry
    }

    fn ensure_idle(&self) -> Result<(), EngineError> {
        if self.stack.is_empty() {
            Ok(())
        } else {
            Err(EngineError::ResolutionInProgress)
        }
    }

    fn ensure_entity(&self, entity: EntityId) -> Result<(), EngineError> {
        self.state
            .kind_of(entity)
            .map(|_| ())
            .ok_or(EngineError::UnknownEntity(entity))
    }

    /// Create an instance of a registered card in `zone`, attaching its
    /// printed abilities.
    pub fn create_card(&mut self, card: CardId, owner: Option<PlayerId>, zone: ZoneId) -> Result<EntityId, EngineError> {
        let definition = self.registry.get(card).ok_or(EngineError::UnknownCard(card))?;
        if self.state.config().get_zone(zone).is_none() {
            return Err(EngineError::UnknownZone(zone));
        }
        let entity = self.state.alloc_entity();
        self.state
            .add_card(CardInstance::from_definition(entity, definition, owner, zone));
        for descriptor in &definition.abilities {
            attach(&mut self.state, descriptor.clone(), entity, None);
        }
        recalculate(&mut self.state);
        debug!(%entity, card = card.raw(), "card created");
        Ok(entity)
    }

    pub fn abilities_of(&self, entity: EntityId) -> impl Iterator<Item = &Ability> {
        self.state.abilities.for_owner(entity)
    }

    #[must_use]
    pub fn ability_by_title(&self, entity: EntityId, title: &str) -> Option<AbilityId> {
        self.state.abilities.find_by_title(entity, title)
    }

    /// Action abilities `player` could initiate right now.
    #[must_use]
    pub fn legal_actions(&self, player: PlayerId) -> Vec<AbilityId> {
        if !self.stack.is_empty() {
            return Vec::new();
        }
        self.state
            .abilities
            .ids()
            .into_iter()
            .filter_map(|id| self.state.abilities.get(id))
            .filter(|a| a.descriptor.ability_type == AbilityType::Action)
            .filter(|a| self.state.controller_of(a.owner) == Some(player))
            .filter(|a| legality::check(&self.state, a, player, None).is_ok())
            .map(|a| a.id)
            .collect()
    }

    /// Start resolving an action ability.
    ///
    /// An ability that is not legal right now still gets a resolution; it
    /// aborts at once and the outcome records why.
    pub fn initiate(&mut self, player: PlayerId, ability: AbilityId) -> Result<ResolutionStatus, EngineError> {
        self.ensure_idle()?;
        let entry = self
            .state
            .abilities
            .get(ability)
            .ok_or(EngineError::UnknownAbility(ability))?;
        if entry.descriptor.ability_type != AbilityType::Action {
            return Err(EngineError::NotAnAction(ability));
        }
        if let Some(controller) = self.state.controller_of(entry.owner) {
            if controller != player {
                return Err(EngineError::WrongPlayer {
                    expected: controller,
                    got: player,
                });
            }
        }
        let id = self.stack.allocate();
        let resolution = AbilityResolution::new(id, entry, player, None);
        debug!(resolution = %id, %ability, %player, "ability initiated");
        self.last_resolution = Some(id);
        self.stack.push(Frame::Ability(Box::new(resolution)));
        Ok(self.process())
    }

    /// Dispatch an event raised by the game itself.
    pub fn raise(&mut self, event: GameEvent) -> Result<ResolutionStatus, EngineError> {
        self.raise_pending(vec![PendingEvent::notice(event)])
    }

    /// Dispatch simultaneous events, each with the change it applies.
    pub fn raise_pending(&mut self, events: Vec<PendingEvent>) -> Result<ResolutionStatus, EngineError> {
        self.ensure_idle()?;
        let window = EventWindow::new(&mut self.state, events);
        self.stack.push(Frame::Window(window));
        Ok(self.process())
    }

    /// Resolve one game action on behalf of `source`, outside any ability.
    pub fn perform(
        &mut self,
        player: PlayerId,
        source: EntityId,
        action: GameAction,
        target: EntityId,
    ) -> Result<ResolutionStatus, EngineError> {
        self.ensure_idle()?;
        self.ensure_entity(source)?;
        self.ensure_entity(target)?;
        let id = self.stack.allocate();
        self.last_resolution = Some(id);
        let resolution = AbilityResolution::perform(id, source, player, action, target);
        self.stack.push(Frame::Ability(Box::new(resolution)));
        Ok(self.process())
    }

    /// Answer the pending prompt and continue resolving.
    pub fn respond(&mut self, player: PlayerId, option: usize) -> Result<ResolutionStatus, EngineError> {
        self.stack.respond(player, option)?;
        Ok(self.process())
    }

    /// Answer the pending prompt by option label.
    pub fn respond_with(&mut self, player: PlayerId, label: &str) -> Result<ResolutionStatus, EngineError> {
        let prompt = self.stack.pending_prompt().ok_or(EngineError::NoPendingPrompt)?;
        let index = prompt.position(label).ok_or(EngineError::OptionOutOfRange {
            index: prompt.options.len(),
            len: prompt.options.len(),
        })?;
        self.respond(player, index)
    }

    #[must_use]
    pub fn pending_prompt(&self) -> Option<&Prompt> {
        self.stack.pending_prompt()
    }

    /// Run the stack until it empties or parks.
    pub fn process(&mut self) -> ResolutionStatus {
        self.stack.process(&mut self.state)
    }

    #[must_use]
    pub fn is_resolving(&self) -> bool {
        !self.stack.is_empty()
    }

    #[must_use]
    pub fn outcome(&self, id: ResolutionId) -> Option<ResolutionOutcome> {
        self.stack.outcome(id)
    }

    /// Outcome of the last resolution started through the facade.
    #[must_use]
    pub fn last_outcome(&self) -> Option<ResolutionOutcome> {
        self.last_resolution.and_then(|id| self.stack.outcome(id))
    }

    #[must_use]
    pub fn last_resolution(&self) -> Option<ResolutionId> {
        self.last_resolution
    }

    #[must_use]
    pub fn value(&self, entity: EntityId, key: &str) -> i64 {
        self.state.get_value(entity, key)
    }

    #[must_use]
    pub fn has_flag(&self, entity: EntityId, flag: &str) -> bool {
        self.state.has_flag(entity, flag)
    }

    // === Flow ===

    /// Declare a conflict and raise `CONFLICT_STARTED`.
    pub fn start_conflict(&mut self, declaration: ConflictDeclaration) -> Result<ResolutionStatus, EngineError> {
        self.ensure_idle()?;
        let conflict = self.state.conflict_mut();
        conflict.reset();
        conflict.active = true;
        conflict.conflict_type = declaration.conflict_type.clone();
        conflict.attacker = Some(declaration.attacker);
        conflict.defender = Some(declaration.defender);
        conflict.ring = declaration.ring;
        conflict.attackers = declaration.attackers;
        conflict.defenders = declaration.defenders;
        let entity = conflict.entity_id;
        if let Some(ring) = declaration.ring.and_then(|r| self.state.ring_mut(r)) {
            ring.contested = true;
        }

        let mut event = GameEvent::new(events::CONFLICT_STARTED)
            .with_source(entity)
            .with_player(declaration.attacker)
            .with_tag(declaration.conflict_type);
        if let Some(ring) = declaration.ring {
            event = event.with_target(ring);
        }
        self.raise(event)
    }

    /// Decide the conflict and close it after the after-conflict window.
    pub fn end_conflict(&mut self, winner: Option<PlayerId>) -> Result<ResolutionStatus, EngineError> {
        self.ensure_idle()?;
        let conflict = self.state.conflict_mut();
        let (attacker, defender) = (conflict.attacker, conflict.defender);
        conflict.winner = winner;
        conflict.loser = winner.and_then(|w| if attacker == Some(w) { defender } else { attacker });
        let mut event = GameEvent::new(events::AFTER_CONFLICT).with_source(conflict.entity_id);
        if let Some(winner) = winner {
            event = event.with_player(winner);
        }
        self.close_with(event, FlowStep::CloseConflict)
    }

    /// End the current phase and enter `next`.
    pub fn end_phase(&mut self, next: PhaseId) -> Result<ResolutionStatus, EngineError> {
        self.ensure_idle()?;
        let event = GameEvent::new(events::PHASE_ENDED).with_value(i64::from(self.state.public.phase.0));
        self.close_with(event, FlowStep::ClosePhase { next })
    }

    pub fn end_round(&mut self) -> Result<ResolutionStatus, EngineError> {
        self.ensure_idle()?;
        let event = GameEvent::new(events::ROUND_ENDED).with_value(i64::from(self.state.public.round));
        self.close_with(event, FlowStep::CloseRound)
    }

    fn close_with(&mut self, event: GameEvent, step: FlowStep) -> Result<ResolutionStatus, EngineError> {
        self.stack.push(Frame::Flow(step));
        let window = EventWindow::new(&mut self.state, vec![PendingEvent::notice(event.uncancellable())]);
        self.stack.push(Frame::Window(window));
        Ok(self.process())
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("round", &self.state.public.round)
            .field("phase", &self.state.public.phase)
            .field("stack", &self.stack)
            .finish_non_exhaustive()
    }
}
