//! Cost reducers.
//!
//! A reducer lowers (or, with a negative amount, raises) the resource cost of
//! matching ability activations for one player. It is consumed only when it
//! actually changes a paid cost; an exhausted reducer stays registered but
//! inert until its limit resets.
//!
//! A limited reducer's counter lives in the `LimitTracker` under a key tied
//! to the effect that created it, so the count survives the reducer being
//! removed and registered again while that effect switches off and on.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{EntityId, GameState, PlayerId};
use crate::triggers::{Condition, ConditionContext};

use super::limit::{LimitKey, LimitTracker};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReducerId(pub u32);

/// An active cost modifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostReducer {
    pub id: ReducerId,
    /// The player whose costs are adjusted.
    pub player: PlayerId,
    /// Entity that created the reducer.
    pub source: EntityId,
    /// Positive reduces, negative increases.
    pub amount: i64,
    /// Tested with the paying ability's card as subject.
    pub condition: Condition,
    /// Counter in the limit tracker; `None` is unlimited.
    pub limit: Option<LimitKey>,
}

impl CostReducer {
    #[must_use]
    pub fn is_exhausted(&self, limits: &LimitTracker) -> bool {
        self.limit.as_ref().is_some_and(|key| !limits.can_use(key, 0))
    }

    /// Whether this reducer applies to an ability on `subject`.
    #[must_use]
    pub fn matches(&self, state: &GameState, subject: EntityId) -> bool {
        if self.is_exhausted(&state.limits) {
            return false;
        }
        let ctx = ConditionContext::new(state)
            .with_source(self.source)
            .with_player(self.player)
            .with_subject(subject);
        self.condition.evaluate(&ctx)
    }
}

/// Result of running a base cost through the active reducers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdjustedCost {
    pub amount: i64,
    /// Reducers that changed the cost, to be consumed on payment.
    pub used: Vec<ReducerId>,
}

#[derive(Clone, Debug, Default)]
pub struct CostReducerRegistry {
    reducers: Vec<CostReducer>,
    next_id: u32,
}

impl CostReducerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        player: PlayerId,
        source: EntityId,
        amount: i64,
        condition: Condition,
        limit: Option<LimitKey>,
    ) -> ReducerId {
        let id = ReducerId(self.next_id);
        self.next_id += 1;
        debug!(?id, %player, amount, "cost reducer registered");
        self.reducers.push(CostReducer {
            id,
            player,
            source,
            amount,
            condition,
            limit,
        });
        id
    }

    pub fn remove(&mut self, id: ReducerId) -> Option<CostReducer> {
        let index = self.reducers.iter().position(|r| r.id == id)?;
        Some(self.reducers.remove(index))
    }

    #[must_use]
    pub fn get(&self, id: ReducerId) -> Option<&CostReducer> {
        self.reducers.iter().find(|r| r.id == id)
    }

    /// Reducers belonging to a player, in registration order.
    pub fn for_player(&self, player: PlayerId) -> impl Iterator<Item = &CostReducer> {
        self.reducers.iter().filter(move |r| r.player == player)
    }

    /// Apply matching reducers to `base`, in registration order.
    ///
    /// A reducer counts as used only if the running cost changed; the result
    /// never goes below zero.
    #[must_use]
    pub fn adjust(&self, state: &GameState, player: PlayerId, subject: EntityId, base: i64) -> AdjustedCost {
        let mut amount = base.max(0);
        let mut used = Vec::new();
        for reducer in self.for_player(player) {
            if !reducer.matches(state, subject) {
                continue;
            }
            let next = (amount - reducer.amount).max(0);
            if next != amount {
                amount = next;
                used.push(reducer.id);
            }
        }
        AdjustedCost { amount, used }
    }

    /// Consume the given reducers (their costs were paid).
    pub fn consume(&self, used: &[ReducerId], limits: &mut LimitTracker) {
        for reducer in self.reducers.iter().filter(|r| used.contains(&r.id)) {
            if let Some(key) = &reducer.limit {
                limits.record_use(key, 0);
            }
            trace!(id = ?reducer.id, "cost reducer consumed");
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::{AbilityLimit, LimitScope};
    use crate::core::GameConfig;
    use crate::effects::EffectId;

    fn state() -> GameState {
        GameState::new(GameConfig::new(2), 1)
    }

    fn tracked(state: &mut GameState, limit: AbilityLimit) -> LimitKey {
        let key = LimitKey::Reducer {
            effect: EffectId(0),
            player: PlayerId::new(0),
        };
        state.limits.ensure(key.clone(), limit);
        key
    }

    #[test]
    fn test_reduction_floors_at_zero() {
        let state = state();
        let mut registry = CostReducerRegistry::new();
        registry.register(PlayerId::new(0), EntityId(0), 3, Condition::Always, None);

        let adjusted = registry.adjust(&state, PlayerId::new(0), EntityId(0), 2);
        assert_eq!(adjusted.amount, 0);
        assert_eq!(adjusted.used.len(), 1);

        let other = registry.adjust(&state, PlayerId::new(1), EntityId(0), 2);
        assert_eq!(other.amount, 2);
        assert!(other.used.is_empty());
    }

    #[test]
    fn test_reducer_not_used_on_free_cost() {
        let mut state = state();
        let key = tracked(&mut state, AbilityLimit::fixed(1));
        let mut registry = CostReducerRegistry::new();
        registry.register(PlayerId::new(0), EntityId(0), 1, Condition::Always, Some(key));

        let adjusted = registry.adjust(&state, PlayerId::new(0), EntityId(0), 0);
        assert_eq!(adjusted.amount, 0);
        assert!(adjusted.used.is_empty());
    }

    #[test]
    fn test_increase_cost() {
        let state = state();
        let mut registry = CostReducerRegistry::new();
        registry.register(PlayerId::new(1), EntityId(0), -1, Condition::Always, None);

        let adjusted = registry.adjust(&state, PlayerId::new(1), EntityId(0), 0);
        assert_eq!(adjusted.amount, 1);
    }

    #[test]
    fn test_consume_exhausts_and_reset_restores() {
        let mut state = state();
        let key = tracked(&mut state, AbilityLimit::per_round(1));
        let mut registry = CostReducerRegistry::new();
        let id = registry.register(PlayerId::new(0), EntityId(0), 1, Condition::Always, Some(key));

        let adjusted = registry.adjust(&state, PlayerId::new(0), EntityId(0), 1);
        registry.consume(&adjusted.used, &mut state.limits);
        assert!(registry.get(id).unwrap().is_exhausted(&state.limits));
        assert_eq!(registry.adjust(&state, PlayerId::new(0), EntityId(0), 1).amount, 1);

        state.limits.reset_scope(LimitScope::PerPhase);
        assert!(registry.get(id).unwrap().is_exhausted(&state.limits));
        state.limits.reset_scope(LimitScope::PerRound);
        assert_eq!(registry.adjust(&state, PlayerId::new(0), EntityId(0), 1).amount, 0);
    }

    #[test]
    fn test_count_survives_reregistration() {
        let mut state = state();
        let key = tracked(&mut state, AbilityLimit::fixed(1));
        let mut registry = CostReducerRegistry::new();
        let first = registry.register(PlayerId::new(0), EntityId(0), 1, Condition::Always, Some(key.clone()));
        let adjusted = registry.adjust(&state, PlayerId::new(0), EntityId(0), 1);
        registry.consume(&adjusted.used, &mut state.limits);

        registry.remove(first);
        let second = registry.register(PlayerId::new(0), EntityId(0), 1, Condition::Always, Some(key));
        assert!(registry.get(second).unwrap().is_exhausted(&state.limits));
        assert_eq!(registry.adjust(&state, PlayerId::new(0), EntityId(0), 1).amount, 1);
    }
}
