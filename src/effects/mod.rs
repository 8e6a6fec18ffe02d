//! Lasting effects.
//!
//! - `Effect` / `EffectOp`: what an effect does and for how long
//! - `EffectSpec` / `EffectBuilder`: how content declares effects
//! - `EffectEngine`: activation tracking and attribute reads
//! - `DelayedRegistry`: deferred actions detached from any resolution
//!
//! ## Activity
//!
//! An effect applies while its duration window is open, its source is in
//! play (for `Duration::Persistent`), and its condition holds for the target.
//! Activity is re-derived by `recalculate` after every state change rather
//! than tracked incrementally.

mod builder;
mod delayed;
mod detached;
mod effect;
mod engine;

pub use builder::{EffectBuilder, EffectSpec, SpecTarget};
pub use delayed::{poll_event, poll_terminal, DelayedEffect, DelayedId, DelayedKind, DelayedRegistry};
pub use detached::DetachedHandle;
pub use effect::{Amount, Duration, Effect, EffectId, EffectOp, EffectTarget, EffectValue};
pub use engine::{
    controller_of, has_flag, has_keyword, has_trait, is_blank, on_leave_play, recalculate, remove_where,
    value_of, EffectEngine,
};
