//! Error types.
//!
//! Only two things are errors here: malformed content rejected when it is
//! registered (`ConfigError`) and misuse of the `Game` API (`EngineError`).
//! Illegal ability attempts, cancellations and post-payment target loss are
//! ordinary resolution outcomes, not errors.

use thiserror::Error;

use crate::abilities::AbilityId;
use crate::cards::CardId;
use crate::core::{EntityId, PlayerId, ZoneId};

/// Content rejected at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("ability `{title}` declares no game action, target action or handler")]
    MissingAction { title: String },

    #[error("triggered ability `{title}` has no `when` clause")]
    MissingTrigger { title: String },

    #[error("persistent ability `{title}` declares no effects")]
    MissingEffects { title: String },

    #[error("ability `{title}` has a limit of zero uses")]
    ZeroLimit { title: String },

    #[error("choice in ability `{title}` offers no options")]
    EmptyChoice { title: String },

    #[error("{0} is already registered")]
    DuplicateCard(CardId),

    #[error("{0} is not a configured zone")]
    UnknownZone(ZoneId),

    #[error("custom condition `{0}` is not registered")]
    UnknownCondition(String),
}

/// Misuse of the `Game` facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("another resolution is in progress")]
    ResolutionInProgress,

    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("unknown card definition {0}")]
    UnknownCard(CardId),

    #[error("unknown ability {0}")]
    UnknownAbility(AbilityId),

    #[error("{0} is not an action ability")]
    NotAnAction(AbilityId),

    #[error("{0} is not configured")]
    UnknownZone(ZoneId),

    #[error("no prompt is pending")]
    NoPendingPrompt,

    #[error("prompt is for {expected}, not {got}")]
    WrongPlayer { expected: PlayerId, got: PlayerId },

    #[error("option {index} is out of range (prompt has {len} options)")]
    OptionOutOfRange { index: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConfigError::MissingAction { title: "Cancel an event".into() };
        assert_eq!(
            err.to_string(),
            "ability `Cancel an event` declares no game action, target action or handler"
        );

        let err = EngineError::WrongPlayer {
            expected: PlayerId::new(0),
            got: PlayerId::new(1),
        };
        assert_eq!(err.to_string(), "prompt is for Player 0, not Player 1");
    }
}
