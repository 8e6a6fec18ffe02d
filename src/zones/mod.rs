//! Zone system for card locations.
//!
//! Zones are **game-configured**, not hardcoded. Games define their zones
//! (hand, deck, play area, provinces, discard piles) via `ZoneConfig` and mark
//! which of them are in play.

pub mod manager;

pub use manager::{ZoneManager, ZonePosition};

pub use crate::core::config::{ZoneConfig, ZoneId, ZoneRole, ZoneVisibility};
