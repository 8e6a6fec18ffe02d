//! Handler context.
//!
//! A handler sees the state read-only and answers by queueing game actions,
//! which the resolution turns into events like any declared action.

use crate::actions::GameAction;
use crate::core::{EntityId, GameState, PlayerId, ZoneId};
use crate::triggers::GameEvent;

pub struct HandlerContext<'a> {
    pub state: &'a GameState,
    pub source: EntityId,
    pub player: PlayerId,
    /// The event that triggered the ability.
    pub event: Option<&'a GameEvent>,
    targets: &'a [(String, Option<EntityId>)],
    cost_origins: &'a [(EntityId, ZoneId)],
    queued: Vec<(GameAction, Vec<EntityId>)>,
}

impl<'a> HandlerContext<'a> {
    pub(crate) fn new(
        state: &'a GameState,
        source: EntityId,
        player: PlayerId,
        event: Option<&'a GameEvent>,
        targets: &'a [(String, Option<EntityId>)],
        cost_origins: &'a [(EntityId, ZoneId)],
    ) -> Self {
        Self {
            state,
            source,
            player,
            event,
            targets,
            cost_origins,
            queued: Vec::new(),
        }
    }

    /// The target chosen for a named target descriptor.
    #[must_use]
    pub fn target(&self, name: &str) -> Option<EntityId> {
        self.targets
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, target)| *target)
    }

    /// Every chosen target, in descriptor order.
    pub fn targets(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.targets.iter().filter_map(|(_, target)| *target)
    }

    /// Where a card chosen for a cost was when it was chosen.
    #[must_use]
    pub fn cost_origin(&self, card: EntityId) -> Option<ZoneId> {
        self.cost_origins.iter().find(|(c, _)| *c == card).map(|(_, zone)| *zone)
    }

    /// Cards moved by costs, with the zone each came from.
    #[must_use]
    pub fn cost_cards(&self) -> &[(EntityId, ZoneId)] {
        self.cost_origins
    }

    pub fn queue(&mut self, action: GameAction, targets: impl IntoIterator<Item = EntityId>) {
        self.queued.push((action, targets.into_iter().collect()));
    }

    pub(crate) fn into_queued(self) -> Vec<(GameAction, Vec<EntityId>)> {
        self.queued
    }
}

impl std::fmt::Debug for HandlerContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("source", &self.source)
            .field("player", &self.player)
            .field("targets", &self.targets)
            .field("queued", &self.queued.len())
            .finish()
    }
}
