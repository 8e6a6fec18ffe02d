//! Detached effect operations.
//!
//! These run once when an effect starts applying to a target and once when
//! it stops. The handle returned by `apply` is all `unapply` needs.

use tracing::trace;

use crate::abilities::{self, AbilityId, LimitKey, ReducerId};
use crate::core::{EntityId, GameState, PlayerId};

use super::delayed::{DelayedId, DelayedKind};
use super::effect::{Effect, EffectOp};

/// What a detached op left behind on one target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DetachedHandle {
    Ability(AbilityId),
    Reducer(ReducerId),
    Delayed(DelayedId),
    PlayerFlag { player: PlayerId, key: String },
}

pub(crate) fn apply(state: &mut GameState, effect: &Effect, target: EntityId) -> Option<DetachedHandle> {
    let player = target.as_player(state.player_count());
    let handle = match &effect.op {
        EffectOp::GainAbility(descriptor) => Some(DetachedHandle::Ability(abilities::attach(
            state,
            std::sync::Arc::clone(descriptor),
            target,
            Some(effect.source),
        ))),
        EffectOp::ReduceCost { amount, condition, limit } => player.map(|player| {
            let key = limit.map(|limit| {
                let key = LimitKey::Reducer {
                    effect: effect.id,
                    player,
                };
                state.limits.ensure(key.clone(), limit);
                key
            });
            DetachedHandle::Reducer(state.reducers.register(player, effect.source, *amount, condition.clone(), key))
        }),
        EffectOp::DelayedEffect { condition, actions } | EffectOp::TerminalCondition { condition, actions } => {
            let kind = if matches!(effect.op, EffectOp::DelayedEffect { .. }) {
                DelayedKind::Delayed
            } else {
                DelayedKind::Terminal
            };
            let title = state.name_of(effect.source);
            let controller = effect.controller_in(state).unwrap_or(effect.controller);
            Some(DetachedHandle::Delayed(state.delayed.register(
                kind,
                title,
                condition.clone(),
                actions.clone(),
                effect.source,
                controller,
                target,
            )))
        }
        EffectOp::PlayerFlag(key) => player.map(|player| {
            state.public.modify_player_state(player, key, 1);
            DetachedHandle::PlayerFlag { player, key: key.clone() }
        }),
        _ => None,
    };
    trace!(effect = %effect.id, %target, ?handle, "detached apply");
    handle
}

pub(crate) fn unapply(state: &mut GameState, handle: DetachedHandle) {
    trace!(?handle, "detached unapply");
    match handle {
        DetachedHandle::Ability(id) => {
            abilities::detach(state, id);
        }
        DetachedHandle::Reducer(id) => {
            state.reducers.remove(id);
        }
        DetachedHandle::Delayed(id) => {
            state.delayed.remove(id);
        }
        DetachedHandle::PlayerFlag { player, key } => {
            state.public.modify_player_state(player, &key, -1);
        }
    }
}
