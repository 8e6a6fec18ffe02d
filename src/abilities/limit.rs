//! Ability limits.
//!
//! A limit bounds how often an ability may resolve within a scope. Counters
//! live in a `LimitTracker` keyed by `LimitKey` rather than on the ability,
//! so an ability granted twice by the same source shares one counter, and a
//! limited cost reducer keeps its count while its effect switches off and on.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{EntityId, PlayerId};
use crate::effects::EffectId;

use super::AbilityId;

/// When a limit's counter resets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimitScope {
    PerRound,
    PerPhase,
    PerGame,
    /// Never resets (single-use reducers).
    Fixed,
}

/// `{ max, scope, used }` with `used <= max + bonus` at all times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilityLimit {
    pub max: u32,
    pub scope: LimitScope,
    pub used: u32,
}

impl AbilityLimit {
    #[must_use]
    pub const fn new(max: u32, scope: LimitScope) -> Self {
        Self { max, scope, used: 0 }
    }

    #[must_use]
    pub const fn per_round(max: u32) -> Self {
        Self::new(max, LimitScope::PerRound)
    }

    #[must_use]
    pub const fn per_phase(max: u32) -> Self {
        Self::new(max, LimitScope::PerPhase)
    }

    #[must_use]
    pub const fn per_game(max: u32) -> Self {
        Self::new(max, LimitScope::PerGame)
    }

    #[must_use]
    pub const fn fixed(max: u32) -> Self {
        Self::new(max, LimitScope::Fixed)
    }

    /// Whether no use is left, with `bonus` extra uses allowed.
    #[must_use]
    pub fn is_at_max(&self, bonus: u32) -> bool {
        self.used >= self.max.saturating_add(bonus)
    }

    /// Record one use. Returns `false` (and changes nothing) at the max.
    pub fn increment(&mut self, bonus: u32) -> bool {
        if self.is_at_max(bonus) {
            return false;
        }
        self.used += 1;
        true
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }
}

/// Which counter an ability uses.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimitKey {
    /// A printed ability has its own counter.
    Printed(AbilityId),
    /// Grants of the same ability by the same source to the same card share
    /// a counter across re-grants.
    Granted {
        source: EntityId,
        target: EntityId,
        title: String,
    },
    /// A limited cost reducer, per creating effect and adjusted player.
    Reducer { effect: EffectId, player: PlayerId },
}

/// All live limit counters.
#[derive(Clone, Debug, Default)]
pub struct LimitTracker {
    limits: FxHashMap<LimitKey, AbilityLimit>,
}

impl LimitTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a counter unless one already exists for the key.
    pub fn ensure(&mut self, key: LimitKey, limit: AbilityLimit) {
        self.limits.entry(key).or_insert(limit);
    }

    #[must_use]
    pub fn get(&self, key: &LimitKey) -> Option<&AbilityLimit> {
        self.limits.get(key)
    }

    /// Whether an ability with this key may resolve. Untracked keys are unlimited.
    #[must_use]
    pub fn can_use(&self, key: &LimitKey, bonus: u32) -> bool {
        self.limits.get(key).map_or(true, |limit| !limit.is_at_max(bonus))
    }

    /// Record a use. Returns `false` when the counter is at its max.
    pub fn record_use(&mut self, key: &LimitKey, bonus: u32) -> bool {
        match self.limits.get_mut(key) {
            Some(limit) => limit.increment(bonus),
            None => true,
        }
    }

    pub fn remove(&mut self, key: &LimitKey) -> Option<AbilityLimit> {
        self.limits.remove(key)
    }

    /// Drop the reducer counters of a removed effect.
    pub fn remove_reducers_of(&mut self, effect: EffectId) -> usize {
        let before = self.limits.len();
        self.limits
            .retain(|key, _| !matches!(key, LimitKey::Reducer { effect: e, .. } if *e == effect));
        before - self.limits.len()
    }

    /// Reset every counter with the given scope. Returns how many were reset.
    pub fn reset_scope(&mut self, scope: LimitScope) -> usize {
        let mut count = 0;
        for limit in self.limits.values_mut().filter(|l| l.scope == scope) {
            limit.reset();
            count += 1;
        }
        trace!(?scope, count, "limits reset");
        count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.limits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }
}
