//! Game actions and targeting.
//!
//! - `GameAction`: the closed set of primitive state operations
//! - `PendingEvent` / `StateChange`: what an action produces and applies
//! - `TargetDescriptor`: legal target selection

pub mod game_action;
pub mod targeting;

pub use game_action::{apply_change, ActionContext, ActionKind, GameAction, PendingEvent, StateChange};
pub use targeting::{TargetDescriptor, TargetLocation};
