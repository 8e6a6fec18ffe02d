//! Ability costs.
//!
//! Costs are validated as a whole before anything is paid: the combined
//! resource cost (after reducers) plus any resource placed on rings must be
//! affordable, and every other cost must be individually payable. Paying
//! produces uncancellable events through the same generators game actions
//! use.

use crate::actions::{ActionContext, GameAction, PendingEvent};
use crate::core::{EntityId, GameState};
use crate::effects::Amount;
use crate::triggers::{events, Condition, ConditionContext, GameEvent};

use super::reducer::AdjustedCost;

/// One cost of an ability.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cost {
    /// Spend the configured cost resource. Affected by cost reducers.
    PayResource { amount: i64 },
    SacrificeSelf,
    BowSelf,
    DishonorSelf,
    /// Shuffle a card you control matching `condition` into its owner's deck.
    ShuffleIntoDeck { condition: Condition },
    /// Move resource from the player onto an unclaimed ring.
    PlaceResourceOnRing { amount: i64 },
}

impl Cost {
    /// Candidates for a cost that needs a choice, `None` if it needs none.
    #[must_use]
    pub fn choices(&self, state: &GameState, ctx: &ActionContext) -> Option<Vec<EntityId>> {
        match self {
            Self::ShuffleIntoDeck { condition } => {
                let action = GameAction::ReturnToDeck { shuffle: true, bottom: false };
                Some(
                    state
                        .cards_in_play()
                        .into_iter()
                        .filter(|&card| state.controller_of(card) == Some(ctx.player))
                        .filter(|&card| {
                            condition.evaluate(
                                &ConditionContext::new(state)
                                    .with_source(ctx.source)
                                    .with_player(ctx.player)
                                    .with_subject(card),
                            )
                        })
                        .filter(|&card| action.can_affect(state, ctx, card))
                        .collect(),
                )
            }
            Self::PlaceResourceOnRing { .. } => Some(
                state
                    .rings()
                    .iter()
                    .filter(|ring| ring.claimed_by.is_none())
                    .map(|ring| ring.entity_id)
                    .collect(),
            ),
            _ => None,
        }
    }

    fn self_action(&self) -> Option<GameAction> {
        match self {
            Self::SacrificeSelf => Some(GameAction::Sacrifice),
            Self::BowSelf => Some(GameAction::Bow),
            Self::DishonorSelf => Some(GameAction::Dishonor),
            _ => None,
        }
    }

    /// Whether this cost could be paid now, ignoring the shared resource pool.
    #[must_use]
    pub fn can_pay(&self, state: &GameState, ctx: &ActionContext) -> bool {
        if let Some(action) = self.self_action() {
            return action.can_affect(state, ctx, ctx.source);
        }
        match self.choices(state, ctx) {
            Some(candidates) => !candidates.is_empty(),
            None => true,
        }
    }

    pub fn conditions(&self) -> Vec<&Condition> {
        match self {
            Self::ShuffleIntoDeck { condition } => vec![condition],
            _ => Vec::new(),
        }
    }

    /// Events paying this cost. `chosen` is the selected candidate for costs
    /// with choices; resource payment is produced by `pay_costs`.
    fn pay(&self, state: &GameState, ctx: &ActionContext, chosen: Option<EntityId>) -> Vec<PendingEvent> {
        if let Some(action) = self.self_action() {
            return action.events(state, ctx, ctx.source);
        }
        match (self, chosen) {
            (Self::ShuffleIntoDeck { .. }, Some(card)) => {
                GameAction::ReturnToDeck { shuffle: true, bottom: false }.events(state, ctx, card)
            }
            (Self::PlaceResourceOnRing { amount }, Some(ring)) => {
                let key = state.config().cost_resource.clone();
                let mut pending = spend(state, ctx, *amount);
                pending.extend(
                    GameAction::ModifyRingState {
                        key,
                        amount: Amount::Fixed(*amount),
                    }
                    .events(state, ctx, ring),
                );
                pending
            }
            _ => Vec::new(),
        }
    }
}

fn spend(state: &GameState, ctx: &ActionContext, amount: i64) -> Vec<PendingEvent> {
    if amount <= 0 {
        return Vec::new();
    }
    GameAction::ModifyPlayerState {
        key: state.config().cost_resource.clone(),
        amount: Amount::Fixed(-amount),
    }
    .events(state, ctx, EntityId::player(ctx.player))
}

/// The combined `PayResource` cost after the player's reducers.
#[must_use]
pub fn resource_cost(costs: &[Cost], state: &GameState, ctx: &ActionContext) -> AdjustedCost {
    let base: i64 = costs
        .iter()
        .map(|cost| match cost {
            Cost::PayResource { amount } => *amount,
            _ => 0,
        })
        .sum();
    state.reducers.adjust(state, ctx.player, ctx.source, base)
}

/// Whether every cost can be paid together.
#[must_use]
pub fn can_pay_all(costs: &[Cost], state: &GameState, ctx: &ActionContext) -> bool {
    let placed: i64 = costs
        .iter()
        .map(|cost| match cost {
            Cost::PlaceResourceOnRing { amount } => *amount,
            _ => 0,
        })
        .sum();
    let needed = resource_cost(costs, state, ctx).amount + placed;
    let available = state.get_value(EntityId::player(ctx.player), &state.config().cost_resource);
    needed <= available && costs.iter().all(|cost| cost.can_pay(state, ctx))
}

/// Events paying every cost. `chosen[i]` is the choice made for `costs[i]`.
///
/// All returned events are uncancellable. When there is at least one cost
/// they end with a `COST_PAID` notice; an empty cost list pays nothing and
/// raises nothing.
#[must_use]
pub fn pay_costs(
    costs: &[Cost],
    chosen: &[Option<EntityId>],
    resource: &AdjustedCost,
    state: &GameState,
    ctx: &ActionContext,
) -> Vec<PendingEvent> {
    let mut pending = spend(state, ctx, resource.amount);
    for (index, cost) in costs.iter().enumerate() {
        pending.extend(cost.pay(state, ctx, chosen.get(index).copied().flatten()));
    }
    if !costs.is_empty() {
        pending.push(PendingEvent::notice(
            GameEvent::for_player(events::COST_PAID, ctx.player)
                .with_source(ctx.source)
                .with_value(resource.amount),
        ));
    }
    for p in &mut pending {
        p.event.cancellable = false;
    }
    pending
}
