//! Abilities and the primitives that gate them.
//!
//! - `AbilityDescriptor`: declarative ability data
//! - `AbilityStore`: abilities attached to entities
//! - `Cost`: what initiating an ability consumes
//! - `AbilityLimit` / `LimitTracker`: use counters
//! - `CostReducer`: per-player cost modifiers
//! - `Restriction`: "cannot" effects and immunity

use serde::{Deserialize, Serialize};

pub mod cost;
pub mod descriptor;
pub mod limit;
pub mod reducer;
pub mod restriction;
pub mod store;

pub use cost::{can_pay_all, pay_costs, resource_cost, Cost};
pub use descriptor::{AbilityDescriptor, AbilityType, ActionStep, ActionTarget, Handler};
pub use limit::{AbilityLimit, LimitKey, LimitScope, LimitTracker};
pub use reducer::{AdjustedCost, CostReducer, CostReducerRegistry, ReducerId};
pub use restriction::{is_restricted, is_restricted_with_controller, RestrictedAction, Restriction};
pub use store::{attach, detach, Ability, AbilityStore};

/// Identifier of an attached ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AbilityId(pub u32);

impl AbilityId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AbilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ability({})", self.0)
    }
}
