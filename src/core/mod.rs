//! Core engine types: entities, players, board, state, RNG, configuration.
//!
//! This module contains the fundamental building blocks that are game-agnostic.
//! Games configure these via `GameConfig` rather than modifying the core.

pub mod entity;
pub mod player;
pub mod rng;
pub mod config;
pub mod board;
pub mod state;

pub use entity::{EntityId, EntityKind};
pub use player::{PlayerId, PlayerMap, PlayerRelation};
pub use rng::{GameRng, GameRngState};
pub use config::{GameConfig, PhaseId, ZoneConfig, ZoneId, ZoneRole, ZoneVisibility};
pub use board::{Conflict, ConflictDeclaration, Ring, Side};
pub use state::{GameState, PublicState};
