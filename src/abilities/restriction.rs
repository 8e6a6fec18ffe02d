//! The restriction engine.
//!
//! "Cannot" effects, player restrictions and immunity are all the same
//! shape: a set of restricted actions plus an `applies_to` predicate. An
//! action is legal unless some active restriction on the subject matches it.
//! There is no permissive restriction.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::actions::ActionKind;
use crate::core::{EntityId, GameState};
use crate::triggers::{Condition, ConditionContext};

/// Something a restriction can forbid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RestrictedAction {
    /// Initiate or trigger abilities (on a card: its abilities; on a player:
    /// any ability they would resolve).
    TriggerAbilities,
    /// Be chosen as a target.
    BeTargeted,
    /// Be affected by a game action of this kind.
    Receive(ActionKind),
    /// Be targeted or affected by anything.
    AnyAction,
}

impl RestrictedAction {
    fn covers(self, attempted: RestrictedAction) -> bool {
        match (self, attempted) {
            (RestrictedAction::AnyAction, RestrictedAction::TriggerAbilities) => false,
            (RestrictedAction::AnyAction, _) => true,
            (restricted, attempted) => restricted == attempted,
        }
    }
}

/// `{ restricted, applies_to }`.
///
/// `applies_to` is evaluated with the acting card as `source`, the restricted
/// entity as `subject`, and the restriction's controller as `player`; so
/// `SourceControlledBy(Opponent)` reads "by your opponents' cards".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    pub restricted: Vec<RestrictedAction>,
    pub applies_to: Condition,
}

impl Restriction {
    pub fn new(restricted: impl IntoIterator<Item = RestrictedAction>) -> Self {
        Self {
            restricted: restricted.into_iter().collect(),
            applies_to: Condition::Always,
        }
    }

    /// "Cannot be targeted or affected by opponents' card effects."
    #[must_use]
    pub fn immunity() -> Self {
        Self::new([RestrictedAction::AnyAction])
            .applies_when(Condition::SourceControlledBy(crate::core::PlayerRelation::Opponent))
    }

    #[must_use]
    pub fn applies_when(mut self, condition: Condition) -> Self {
        self.applies_to = condition;
        self
    }

    #[must_use]
    pub fn forbids(&self, attempted: RestrictedAction) -> bool {
        self.restricted.iter().any(|r| r.covers(attempted))
    }
}

/// Whether any active restriction on `subject` forbids `action` by `acting_source`.
#[must_use]
pub fn is_restricted(
    state: &GameState,
    subject: EntityId,
    action: RestrictedAction,
    acting_source: Option<EntityId>,
) -> bool {
    let blocked = state.effects.restrictions_on(subject).any(|(effect, restriction)| {
        if !restriction.forbids(action) {
            return false;
        }
        let mut ctx = ConditionContext::new(state).with_subject(subject);
        if let Some(source) = acting_source {
            ctx = ctx.with_source(source);
        }
        if let Some(controller) = effect.controller_in(state) {
            ctx = ctx.with_player(controller);
        }
        restriction.applies_to.evaluate(&ctx)
    });
    if blocked {
        trace!(%subject, ?action, "restricted");
    }
    blocked
}

/// Check a card and its controller together.
#[must_use]
pub fn is_restricted_with_controller(
    state: &GameState,
    subject: EntityId,
    action: RestrictedAction,
    acting_source: Option<EntityId>,
) -> bool {
    if is_restricted(state, subject, action, acting_source) {
        return true;
    }
    state
        .controller_of(subject)
        .map(EntityId::player)
        .filter(|&player| player != subject)
        .is_some_and(|player| is_restricted(state, player, action, acting_source))
}
