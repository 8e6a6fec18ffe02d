//! # ccg-rules
//!
//! Rules-resolution core for a turn-based strategic card game: lasting
//! effects on game entities, the cost/target/action pipeline every ability
//! goes through, and ordered dispatch of events to interrupts and reactions.
//!
//! ## Design Principles
//!
//! 1. **Explicit state**: every operation takes the `GameState` it reads or
//!    changes. There is no ambient game.
//!
//! 2. **Declarative content**: cards describe abilities with
//!    `AbilityDescriptor` data; the only escape hatch is a handler that reads
//!    the state and queues game actions.
//!
//! 3. **Derived attributes**: `get_value` folds base values with the effects
//!    active right now. Effects never write into the entities they modify,
//!    so expiry leaves no residue.
//!
//! 4. **One resolution at a time**: abilities and event windows run as
//!    frames on a single stack that parks whenever a player must decide.
//!
//! ## Modules
//!
//! - `core`: entity and player ids, configuration, rings, the conflict, state
//! - `zones`: card locations
//! - `cards`: card definitions, instances, registry
//! - `abilities`: descriptors, attached abilities, limits, costs, reducers,
//!   restrictions
//! - `actions`: game actions and target descriptors
//! - `effects`: effects, the effect engine, delayed effects
//! - `triggers`: events, conditions, trigger registry
//! - `stack`: the resolution pipeline and event windows
//! - `game`: the `Game` facade

pub mod core;
pub mod zones;
pub mod cards;
pub mod abilities;
pub mod actions;
pub mod effects;
pub mod triggers;
pub mod stack;
pub mod game;
pub mod error;

// Re-export commonly used types
pub use crate::core::{
    EntityId, EntityKind, PlayerId, PlayerMap, PlayerRelation,
    GameRng, GameRngState,
    ZoneId, ZoneConfig, ZoneRole, ZoneVisibility, PhaseId, GameConfig,
    Conflict, ConflictDeclaration, Ring, Side,
    PublicState, GameState,
};

pub use crate::zones::{ZoneManager, ZonePosition};

pub use crate::cards::{CardId, CardTypeId, CardDefinition, CardInstance, CardRegistry};

pub use crate::abilities::{
    Ability, AbilityDescriptor, AbilityId, AbilityLimit, AbilityType, ActionStep, ActionTarget,
    Cost, CostReducer, LimitScope, RestrictedAction, Restriction,
};

pub use crate::actions::{ActionKind, GameAction, TargetDescriptor, TargetLocation};

pub use crate::effects::{
    Amount, Duration, Effect, EffectBuilder, EffectId, EffectOp, EffectSpec, SpecTarget,
    DelayedEffect, DelayedId,
};

pub use crate::triggers::{
    events, Cmp, Condition, ConditionContext, EventId, EventTypeId, GameEvent,
    TriggerId, TriggerRegistry, TriggerTiming,
};

pub use crate::stack::{
    AbortReason, HandlerContext, Prompt, PromptKind, ResolutionId, ResolutionOutcome, ResolutionStatus,
};

pub use crate::game::Game;

pub use crate::error::{ConfigError, EngineError};
