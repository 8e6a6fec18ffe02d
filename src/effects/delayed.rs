//! Delayed effects and terminal conditions.
//!
//! Entries live outside any resolution. A delayed effect is polled against
//! every finalized event; a terminal condition is polled against the state
//! after every change. Either fires at most once and is removed when it does,
//! together with the effect that registered it once that has nothing left
//! to wait for.
//! Entries whose source leaves play are abandoned without firing.

use tracing::debug;

use crate::abilities::ActionStep;
use crate::core::{EntityId, GameState, PlayerId};
use crate::triggers::{Condition, ConditionContext, GameEvent};

use super::engine::remove_where;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct DelayedId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelayedKind {
    /// Fires on a matching event.
    Delayed,
    /// Fires as soon as the state satisfies the condition.
    Terminal,
}

/// A registered deferred action.
#[derive(Clone, Debug)]
pub struct DelayedEffect {
    pub id: DelayedId,
    pub kind: DelayedKind,
    pub title: String,
    pub condition: Condition,
    pub actions: Vec<ActionStep>,
    pub source: EntityId,
    pub controller: PlayerId,
    /// The entity the creating effect applied to.
    pub target: EntityId,
}

impl DelayedEffect {
    fn is_met(&self, state: &GameState, event: Option<&GameEvent>) -> bool {
        let ctx = ConditionContext::new(state)
            .with_source(self.source)
            .with_player(self.controller)
            .with_subject(self.target);
        match event {
            Some(event) => self.condition.evaluate(&ctx.with_event(event)),
            None => self.condition.evaluate(&ctx),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DelayedRegistry {
    entries: Vec<DelayedEffect>,
    next_id: u32,
}

impl DelayedRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &mut self,
        kind: DelayedKind,
        title: impl Into<String>,
        condition: Condition,
        actions: Vec<ActionStep>,
        source: EntityId,
        controller: PlayerId,
        target: EntityId,
    ) -> DelayedId {
        let id = DelayedId(self.next_id);
        self.next_id += 1;
        let title = title.into();
        debug!(?id, ?kind, %title, "delayed effect registered");
        self.entries.push(DelayedEffect {
            id,
            kind,
            title,
            condition,
            actions,
            source,
            controller,
            target,
        });
        id
    }

    pub fn remove(&mut self, id: DelayedId) -> Option<DelayedEffect> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index))
    }

    #[must_use]
    pub fn get(&self, id: DelayedId) -> Option<&DelayedEffect> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Drop every entry owned by `source` without firing it.
    pub fn abandon_for_source(&mut self, source: EntityId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| {
            let keep = e.source != source;
            if !keep {
                debug!(id = ?e.id, title = %e.title, "delayed effect abandoned");
            }
            keep
        });
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DelayedEffect> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn take_matching(state: &mut GameState, kind: DelayedKind, event: Option<&GameEvent>) -> Vec<DelayedEffect> {
    let ready: Vec<DelayedId> = state
        .delayed
        .entries
        .iter()
        .filter(|e| e.kind == kind && e.is_met(state, event))
        .map(|e| e.id)
        .collect();
    let fired: Vec<DelayedEffect> = ready
        .into_iter()
        .filter_map(|id| state.delayed.remove(id))
        .inspect(|e| debug!(id = ?e.id, title = %e.title, "delayed effect fired"))
        .collect();
    if !fired.is_empty() {
        let spent = state.effects.spent_delayed_hosts(&state.delayed);
        if !spent.is_empty() {
            remove_where(state, |e| spent.contains(&e.id));
        }
    }
    fired
}

/// Remove and return the delayed effects a finalized event satisfies.
pub fn poll_event(state: &mut GameState, event: &GameEvent) -> Vec<DelayedEffect> {
    take_matching(state, DelayedKind::Delayed, Some(event))
}

/// Remove and return the terminal conditions the current state satisfies.
pub fn poll_terminal(state: &mut GameState) -> Vec<DelayedEffect> {
    take_matching(state, DelayedKind::Terminal, None)
}
