//! The effect engine.
//!
//! Holds every registered effect and which of them are currently applying
//! to which entities. `recalculate` re-derives activity from the state after
//! every change: effects whose window or condition stopped holding are
//! deactivated, new ones are activated with a fresh activation stamp, and
//! detached ops run their apply/unapply exactly at those boundaries.
//!
//! Attribute reads (`value_of`, `has_flag`, ...) never mutate anything. They
//! fold the active effects on an entity in activation order.

use std::cell::Cell;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::abilities::Restriction;
use crate::core::{EntityId, EntityKind, GameState, PlayerId};

use super::delayed::DelayedRegistry;
use super::detached::{self, DetachedHandle};
use super::effect::{Duration, Effect, EffectId, EffectOp, EffectTarget, EffectValue};

/// Nesting limit for reads that evaluate dynamic values.
const MAX_READ_DEPTH: u32 = 16;

/// Entities an effect applies to; usually one.
type Targets = SmallVec<[EntityId; 2]>;

#[derive(Clone, Debug)]
struct Activation {
    stamp: u64,
    targets: Targets,
    /// Value of a static numeric op, fixed at activation.
    snapshot: Option<i64>,
    handles: Vec<(EntityId, DetachedHandle)>,
}

#[derive(Clone, Debug, Default)]
pub struct EffectEngine {
    effects: Vec<Effect>,
    active: FxHashMap<EffectId, Activation>,
    next_id: u32,
    next_stamp: u64,
    depth: Cell<u32>,
}

impl EffectEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an effect. It starts applying at the next `recalculate`.
    pub fn add(&mut self, mut effect: Effect) -> EffectId {
        let id = EffectId(self.next_id);
        self.next_id += 1;
        effect.id = id;
        trace!(effect = %id, source = %effect.source, op = ?effect.op, "effect registered");
        self.effects.push(effect);
        id
    }

    #[must_use]
    pub fn get(&self, id: EffectId) -> Option<&Effect> {
        self.effects.iter().find(|e| e.id == id)
    }

    /// All registered effects, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    #[must_use]
    pub fn is_active(&self, id: EffectId) -> bool {
        self.active.contains_key(&id)
    }

    /// Active effects that registered delayed entries, all of which are gone.
    pub(crate) fn spent_delayed_hosts(&self, delayed: &DelayedRegistry) -> Vec<EffectId> {
        let mut spent: Vec<EffectId> = self
            .active
            .iter()
            .filter(|(_, activation)| {
                let mut entries = activation
                    .handles
                    .iter()
                    .filter_map(|(_, handle)| match handle {
                        DetachedHandle::Delayed(id) => Some(*id),
                        _ => None,
                    })
                    .peekable();
                entries.peek().is_some() && entries.all(|id| delayed.get(id).is_none())
            })
            .map(|(id, _)| *id)
            .collect();
        spent.sort_unstable();
        spent
    }

    /// Entities an active effect currently applies to.
    #[must_use]
    pub fn targets_of(&self, id: EffectId) -> &[EntityId] {
        self.active.get(&id).map_or(&[], |a| a.targets.as_slice())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    fn active_on(&self, entity: EntityId) -> impl Iterator<Item = (&Effect, &Activation)> {
        self.effects.iter().filter_map(move |effect| {
            self.active
                .get(&effect.id)
                .filter(|a| a.targets.contains(&entity))
                .map(|a| (effect, a))
        })
    }

    /// Active restrictions on an entity.
    pub fn restrictions_on(&self, entity: EntityId) -> impl Iterator<Item = (&Effect, &Restriction)> {
        self.active_on(entity).filter_map(|(effect, _)| match &effect.op {
            EffectOp::Restriction(restriction) => Some((effect, restriction)),
            _ => None,
        })
    }

    /// Run `read` one level deeper, or return `fallback` past the limit.
    fn guarded<T>(&self, fallback: T, read: impl FnOnce() -> T) -> T {
        let depth = self.depth.get();
        if depth >= MAX_READ_DEPTH {
            trace!(depth, "effect read depth exceeded");
            return fallback;
        }
        self.depth.set(depth + 1);
        let value = read();
        self.depth.set(depth);
        value
    }
}

// === Reads ===

/// Current value of a numeric attribute.
///
/// The latest activated `Set` wins outright. Otherwise the last `SetBase`
/// (or the entity's own value) plus every `Modify`, times every `Multiply`.
#[must_use]
pub fn value_of(state: &GameState, entity: EntityId, key: &str) -> i64 {
    let base = state.base_value(entity, key);
    let engine = &state.effects;
    let mut terms: Vec<(u64, EffectId, &EffectOp, i64)> = engine.guarded(Vec::new(), || {
        engine
            .active_on(entity)
            .filter_map(|(effect, activation)| {
                let (op_key, value) = effect.op.numeric()?;
                if op_key != key {
                    return None;
                }
                let amount = match value {
                    EffectValue::Static(_) => activation.snapshot.unwrap_or(0),
                    EffectValue::Dynamic(amount) => {
                        amount.evaluate(state, effect.source, effect.controller_in(state))
                    }
                };
                Some((activation.stamp, effect.id, &effect.op, amount))
            })
            .collect()
    });
    if terms.is_empty() {
        return base;
    }
    terms.sort_by_key(|&(stamp, id, _, _)| (stamp, id));

    if let Some(&(_, _, _, value)) = terms.iter().rev().find(|t| matches!(t.2, EffectOp::Set { .. })) {
        return value;
    }
    let start = terms
        .iter()
        .rev()
        .find(|t| matches!(t.2, EffectOp::SetBase { .. }))
        .map_or(base, |t| t.3);
    let sum: i64 = terms
        .iter()
        .filter(|t| matches!(t.2, EffectOp::Modify { .. }))
        .map(|t| t.3)
        .sum();
    let product: i64 = terms
        .iter()
        .filter(|t| matches!(t.2, EffectOp::Multiply { .. }))
        .map(|t| t.3)
        .product();
    (start + sum) * product
}

#[must_use]
pub fn has_flag(state: &GameState, entity: EntityId, flag: &str) -> bool {
    let own = match state.kind_of(entity) {
        Some(EntityKind::Card) => state.card(entity).is_some_and(|c| c.has_flag(flag)),
        Some(_) => state.base_value(entity, flag) != 0,
        None => return false,
    };
    own || state
        .effects
        .active_on(entity)
        .any(|(effect, _)| matches!(&effect.op, EffectOp::Flag(f) if f == flag))
}

#[must_use]
pub fn is_blank(state: &GameState, entity: EntityId) -> bool {
    state
        .effects
        .active_on(entity)
        .any(|(effect, _)| matches!(effect.op, EffectOp::Blank))
}

/// Printed traits (unless blanked) plus granted ones.
#[must_use]
pub fn has_trait(state: &GameState, entity: EntityId, name: &str) -> bool {
    let printed = state.card(entity).is_some_and(|c| c.traits.iter().any(|t| t == name));
    (printed && !is_blank(state, entity))
        || state
            .effects
            .active_on(entity)
            .any(|(effect, _)| matches!(&effect.op, EffectOp::AddTrait(t) if t == name))
}

#[must_use]
pub fn has_keyword(state: &GameState, entity: EntityId, name: &str) -> bool {
    let printed = state.card(entity).is_some_and(|c| c.keywords.iter().any(|k| k == name));
    (printed && !is_blank(state, entity))
        || state
            .effects
            .active_on(entity)
            .any(|(effect, _)| matches!(&effect.op, EffectOp::AddKeyword(k) if k == name))
}

/// Players control themselves, rings are controlled by whoever claimed them,
/// the conflict by the attacker, cards by the latest control effect or their
/// own controller.
#[must_use]
pub fn controller_of(state: &GameState, entity: EntityId) -> Option<PlayerId> {
    match state.kind_of(entity)? {
        EntityKind::Player => entity.as_player(state.player_count()),
        EntityKind::Ring => state.ring(entity).and_then(|r| r.claimed_by),
        EntityKind::Conflict => state.conflict().attacker,
        EntityKind::Card => {
            let printed = state.card(entity).and_then(|c| c.controller);
            let engine = &state.effects;
            engine.guarded(printed, || {
                engine
                    .active_on(entity)
                    .filter(|(effect, _)| matches!(effect.op, EffectOp::TakeControl))
                    .max_by_key(|(effect, activation)| (activation.stamp, effect.id))
                    .and_then(|(effect, _)| effect.controller_in(state))
                    .or(printed)
            })
        }
    }
}

// === Recalculation ===

enum Change {
    Activate { id: EffectId, targets: Targets },
    Deactivate(EffectId),
    Retarget { id: EffectId, targets: Targets },
}

fn wants_active(state: &GameState, effect: &Effect) -> bool {
    if effect.duration.has_expired(effect.window, state) {
        return false;
    }
    match effect.duration {
        Duration::Persistent => {
            state.is_in_play(effect.source) && !(effect.printed && state.is_blank(effect.source))
        }
        _ => true,
    }
}

fn current_targets(state: &GameState, effect: &Effect) -> Targets {
    let candidates: Targets = match &effect.target {
        EffectTarget::Entity(entity) => smallvec::smallvec![*entity],
        EffectTarget::Matching(condition) => state
            .entities_of_kind(effect.scope)
            .into_iter()
            .filter(|&e| condition.evaluate(&effect.condition_context(state, e)))
            .collect(),
    };
    candidates
        .into_iter()
        .filter(|&target| match state.kind_of(target) {
            Some(EntityKind::Card) => state.is_in_play(target),
            Some(_) => true,
            None => false,
        })
        .filter(|&target| effect.condition.evaluate(&effect.condition_context(state, target)))
        .collect()
}

fn plan(state: &GameState) -> Vec<Change> {
    let engine = &state.effects;
    engine
        .effects
        .iter()
        .filter_map(|effect| {
            let desired = if wants_active(state, effect) {
                Some(current_targets(state, effect)).filter(|t| !t.is_empty())
            } else {
                None
            };
            match (engine.active.get(&effect.id), desired) {
                (None, Some(targets)) => Some(Change::Activate { id: effect.id, targets }),
                (Some(_), None) => Some(Change::Deactivate(effect.id)),
                (Some(activation), Some(targets)) if activation.targets != targets => {
                    Some(Change::Retarget { id: effect.id, targets })
                }
                _ => None,
            }
        })
        .collect()
}

fn apply_targets(state: &mut GameState, effect: &Effect, targets: &[EntityId]) -> Vec<(EntityId, DetachedHandle)> {
    if !effect.op.is_detached() {
        return Vec::new();
    }
    targets
        .iter()
        .filter_map(|&target| detached::apply(state, effect, target).map(|h| (target, h)))
        .collect()
}

fn apply_plan(state: &mut GameState, plan: Vec<Change>) {
    for change in plan {
        match change {
            Change::Activate { id, targets } => {
                let Some(effect) = state.effects.get(id).cloned() else {
                    continue;
                };
                let snapshot = match effect.op.numeric() {
                    Some((_, EffectValue::Static(amount))) => {
                        Some(amount.evaluate(state, effect.source, effect.controller_in(state)))
                    }
                    _ => None,
                };
                let stamp = state.effects.next_stamp;
                state.effects.next_stamp += 1;
                let handles = apply_targets(state, &effect, &targets);
                debug!(effect = %id, ?targets, "effect activated");
                state.effects.active.insert(
                    id,
                    Activation {
                        stamp,
                        targets,
                        snapshot,
                        handles,
                    },
                );
            }
            Change::Deactivate(id) => {
                if let Some(activation) = state.effects.active.remove(&id) {
                    debug!(effect = %id, "effect deactivated");
                    for (_, handle) in activation.handles {
                        detached::unapply(state, handle);
                    }
                }
            }
            Change::Retarget { id, targets } => {
                let (Some(effect), Some(mut activation)) =
                    (state.effects.get(id).cloned(), state.effects.active.remove(&id))
                else {
                    continue;
                };
                let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(&mut activation.handles)
                    .into_iter()
                    .partition(|(target, _)| targets.contains(target));
                for (_, handle) in dropped {
                    detached::unapply(state, handle);
                }
                let added: Vec<_> = targets
                    .iter()
                    .copied()
                    .filter(|t| !activation.targets.contains(t))
                    .collect();
                activation.handles = kept;
                activation.handles.extend(apply_targets(state, &effect, &added));
                trace!(effect = %id, ?targets, "effect retargeted");
                activation.targets = targets;
                state.effects.active.insert(id, activation);
            }
        }
    }
}

/// Bring effect activity in line with the state.
///
/// Expired effects are removed first. Activation changes can enable or
/// disable other effects, so planning repeats until nothing changes or the
/// configured pass budget runs out.
pub fn recalculate(state: &mut GameState) {
    let limit = state.config().recalc_pass_limit;
    for pass in 0..=limit {
        let expired: Vec<EffectId> = state
            .effects
            .effects
            .iter()
            .filter(|e| e.duration.has_expired(e.window, state))
            .map(|e| e.id)
            .collect();
        if !expired.is_empty() {
            remove_where(state, |e| expired.contains(&e.id));
        }

        let plan = plan(state);
        if plan.is_empty() {
            trace!(pass, "effects settled");
            return;
        }
        if pass == limit {
            warn!(passes = limit, pending = plan.len(), "effect recalculation did not settle");
            return;
        }
        apply_plan(state, plan);
    }
}

/// Remove every effect matching `pred`, unapplying what it applied.
pub fn remove_where(state: &mut GameState, pred: impl Fn(&Effect) -> bool) -> usize {
    let removed: Vec<EffectId> = state.effects.effects.iter().filter(|e| pred(e)).map(|e| e.id).collect();
    for &id in &removed {
        state.effects.effects.retain(|e| e.id != id);
        state.limits.remove_reducers_of(id);
        if let Some(activation) = state.effects.active.remove(&id) {
            for (_, handle) in activation.handles {
                detached::unapply(state, handle);
            }
        }
        debug!(effect = %id, "effect removed");
    }
    removed.len()
}

/// A card left play: drop the lasting effects it created or that were placed
/// on it, abandon its delayed effects and take it out of the conflict.
///
/// Printed effects stay registered and go inactive with their source.
pub fn on_leave_play(state: &mut GameState, card: EntityId) {
    let removed = remove_where(state, |e| {
        !e.printed && (e.source == card || e.target == EffectTarget::Entity(card))
    });
    // A printed reducer starts counting afresh when its card re-enters play.
    let printed: Vec<_> = state.effects.iter().filter(|e| e.printed && e.source == card).map(|e| e.id).collect();
    for id in printed {
        state.limits.remove_reducers_of(id);
    }
    let abandoned = state.delayed.abandon_for_source(card);
    state.conflict_mut().remove_participant(card);
    debug!(%card, removed, abandoned, "card left play");
}
