//! Player identification and per-player data storage.
//!
//! ## PlayerId
//!
//! Type-safe player identifier.
//!
//! ## PlayerMap
//!
//! Per-player storage backed by `Vec` for O(1) access, indexable by `PlayerId`.
//!
//! ## PlayerRelation
//!
//! How ability content refers to players relative to the player resolving the
//! ability ("self", "opponent", "any").

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Player identifier. Indices are 0-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw player index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all player IDs for a game with `player_count` players.
    ///
    /// ```
    /// use ccg_rules::core::PlayerId;
    ///
    /// let players: Vec<_> = PlayerId::all(2).collect();
    /// assert_eq!(players, vec![PlayerId::new(0), PlayerId::new(1)]);
    /// ```
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..player_count as u8).map(PlayerId)
    }

    /// Players in seat order starting with `self`.
    ///
    /// ```
    /// use ccg_rules::core::PlayerId;
    ///
    /// let order: Vec<_> = PlayerId::new(1).seat_order(3).collect();
    /// assert_eq!(order, vec![PlayerId::new(1), PlayerId::new(2), PlayerId::new(0)]);
    /// ```
    pub fn seat_order(self, player_count: usize) -> impl Iterator<Item = PlayerId> {
        let start = self.0 as usize;
        (0..player_count).map(move |i| PlayerId(((start + i) % player_count) as u8))
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// A player reference relative to the resolving player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerRelation {
    /// The player resolving the ability.
    Self_,
    /// Any player other than the resolving player.
    Opponent,
    /// Any player.
    #[default]
    Any,
}

impl PlayerRelation {
    /// Check whether `candidate` stands in this relation to `reference`.
    ///
    /// A missing candidate (neutral card, uncontrolled entity) only matches `Any`.
    #[must_use]
    pub fn matches(self, reference: PlayerId, candidate: Option<PlayerId>) -> bool {
        match (self, candidate) {
            (PlayerRelation::Any, _) => true,
            (PlayerRelation::Self_, Some(p)) => p == reference,
            (PlayerRelation::Opponent, Some(p)) => p != reference,
            (_, None) => false,
        }
    }
}

/// Per-player data storage with O(1) access.
///
/// ```
/// use ccg_rules::core::{PlayerId, PlayerMap};
///
/// let mut honor: PlayerMap<i64> = PlayerMap::new(2, |_| 10);
/// honor[PlayerId::new(1)] -= 2;
/// assert_eq!(honor[PlayerId::new(1)], 8);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: Vec<T>,
}

impl<T> PlayerMap<T> {
    /// Create a new PlayerMap with values from a factory function.
    pub fn new(player_count: usize, factory: impl Fn(PlayerId) -> T) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        let data = (0..player_count as u8)
            .map(|i| factory(PlayerId(i)))
            .collect();

        Self { data }
    }

    /// Create a new PlayerMap with all entries set to the same value.
    pub fn with_value(player_count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(player_count, |_| value.clone())
    }

    /// Create a new PlayerMap with default values.
    pub fn with_default(player_count: usize) -> Self
    where
        T: Default,
    {
        Self::new(player_count, |_| T::default())
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn get(&self, player: PlayerId) -> &T {
        &self.data[player.index()]
    }

    pub fn get_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.data[player.index()]
    }

    /// Iterate over (PlayerId, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    /// Iterate over (PlayerId, &mut T) pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerId, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        self.get_mut(player)
    }
}
