//! Card system: definitions, instances, and registry.
//!
//! ## Key Types
//!
//! - `CardId`: Identifier for card definitions
//! - `CardTypeId`: Opaque type identifier (games define types)
//! - `CardDefinition`: Printed stats, traits and ability descriptors
//! - `CardInstance`: Runtime card state (zone, owner, base values)
//! - `CardRegistry`: Definition lookup, validates descriptors on registration

pub mod definition;
pub mod instance;
pub mod registry;

pub use definition::{CardDefinition, CardId, CardTypeId};
pub use instance::CardInstance;
pub use registry::CardRegistry;
