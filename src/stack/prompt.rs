//! Player prompts.
//!
//! The stack parks on a prompt whenever a decision belongs to a player:
//! ordering simultaneous triggers, picking targets or cost candidates,
//! choosing between alternatives. Options are plain display strings; the
//! answer is an index into them.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

/// What a prompt is deciding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptKind {
    /// Which triggered ability resolves next (or pass).
    Trigger,
    /// Whether to choose targets before paying costs.
    TargetFirst,
    Target { name: String },
    Cost,
    Choice,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub player: PlayerId,
    pub title: String,
    pub options: Vec<String>,
    pub kind: PromptKind,
}

impl Prompt {
    pub fn new(player: PlayerId, title: impl Into<String>, kind: PromptKind) -> Self {
        Self {
            player,
            title: title.into(),
            options: Vec::new(),
            kind,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: impl IntoIterator<Item = String>) -> Self {
        self.options.extend(options);
        self
    }

    /// Index of the option with this label.
    #[must_use]
    pub fn position(&self, label: &str) -> Option<usize> {
        self.options.iter().position(|o| o == label)
    }
}
