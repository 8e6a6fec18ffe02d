//! Events, the condition language and the trigger index.
//!
//! ## Key Components
//!
//! - [`EventTypeId`]: Event type identifier; engine types live in [`events`]
//! - [`GameEvent`]: An immutable record of a state transition
//! - [`Condition`]: Data predicate used by `when` clauses, targets, effects,
//!   restrictions, reducers and delayed effects
//! - [`TriggerRegistry`]: Triggered abilities indexed by event type
//!
//! ## Example Usage
//!
//! ```
//! use ccg_rules::abilities::AbilityId;
//! use ccg_rules::core::{EntityId, GameConfig, GameState};
//! use ccg_rules::triggers::{events, Condition, GameEvent, TriggerRegistry, TriggerTiming};
//!
//! let mut registry = TriggerRegistry::new();
//!
//! // "Reaction: after a ring is claimed"
//! registry.register(
//!     AbilityId::new(1),
//!     EntityId(0),
//!     "Ring watcher",
//!     vec![(events::RING_CLAIMED, Condition::Always)],
//!     TriggerTiming::Reaction,
//! );
//!
//! let state = GameState::new(GameConfig::new(2), 42);
//! let event = GameEvent::new(events::RING_CLAIMED);
//! let candidates = registry.find_candidates(&event, &state, TriggerTiming::Reaction);
//! assert_eq!(candidates.len(), 1);
//! ```

mod condition;
mod event;
mod registry;

pub use condition::{Cmp, Condition, ConditionContext, CustomCondition};
pub use event::{events, EventId, EventTypeId, GameEvent};
pub use registry::{Trigger, TriggerCandidate, TriggerId, TriggerRegistry, TriggerTiming};
