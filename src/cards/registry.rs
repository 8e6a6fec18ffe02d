//! Card registry for definition lookup.
//!
//! The `CardRegistry` stores all card definitions for a game. Registration
//! validates every ability descriptor, so malformed content is rejected when
//! it is loaded rather than when it resolves.

use rustc_hash::FxHashMap;

use super::definition::{CardDefinition, CardId, CardTypeId};
use crate::core::GameConfig;
use crate::error::ConfigError;

/// Registry of card definitions.
///
/// ## Example
///
/// ```
/// use ccg_rules::cards::{CardRegistry, CardDefinition, CardId, CardTypeId};
///
/// let mut registry = CardRegistry::new();
///
/// let card = CardDefinition::new(CardId::new(1), "Hida Guardian", CardTypeId::new(0))
///     .with_stat("military", 2);
///
/// registry.register(card).unwrap();
///
/// let found = registry.get(CardId::new(1)).unwrap();
/// assert_eq!(found.name, "Hida Guardian");
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardRegistry {
    cards: FxHashMap<CardId, CardDefinition>,
}

impl CardRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a card definition.
    ///
    /// Fails if the id is taken or any ability descriptor is malformed; the
    /// card is not loaded in either case.
    pub fn register(&mut self, card: CardDefinition) -> Result<(), ConfigError> {
        if self.cards.contains_key(&card.id) {
            return Err(ConfigError::DuplicateCard(card.id));
        }
        for ability in &card.abilities {
            ability.validate()?;
        }
        self.cards.insert(card.id, card);
        Ok(())
    }

    /// Check every custom condition name used by registered abilities
    /// against the configured set.
    pub fn validate_conditions(&self, config: &GameConfig) -> Result<(), ConfigError> {
        let mut ids: Vec<_> = self.cards.keys().copied().collect();
        ids.sort_by_key(|id| id.raw());
        for id in ids {
            if let Some(card) = self.cards.get(&id) {
                for ability in &card.abilities {
                    ability.validate_conditions(config)?;
                }
            }
        }
        Ok(())
    }

    /// Get a card definition by ID.
    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&CardDefinition> {
        self.cards.get(&id)
    }

    /// Check if a card ID is registered.
    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.cards.contains_key(&id)
    }

    /// Get the number of registered cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over all card definitions.
    pub fn iter(&self) -> impl Iterator<Item = &CardDefinition> {
        self.cards.values()
    }

    /// Find cards by type.
    pub fn find_by_type(&self, card_type: CardTypeId) -> impl Iterator<Item = &CardDefinition> {
        self.cards.values().filter(move |c| c.card_type == card_type)
    }
}
