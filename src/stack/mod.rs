//! Resolution stack.
//!
//! Everything that changes game state runs as a frame on one stack:
//!
//! - **Ability frames** walk the resolution pipeline for one ability:
//!   legality, cost payment, target selection, execution, completion.
//! - **Window frames** dispatch a batch of simultaneous events through the
//!   would-interrupt, interrupt and reaction tiers, finalizing them between
//!   interrupts and reactions.
//! - **Flow frames** close a conflict, phase or round once its closing
//!   window has run.
//!
//! Only the top frame runs. A frame that needs a nested resolution (a
//! triggered ability, the window for its own events) pushes it and stays
//! blocked until it finishes. A frame that needs a player decision parks the
//! stack on a [`Prompt`]; nothing else runs until [`ResolutionStack::respond`]
//! answers it.
//!
//! ## Outcomes
//!
//! Legality failures and cancellations are not errors. Every ability frame
//! ends with a [`ResolutionOutcome`] recorded under its [`ResolutionId`].

mod ability;
mod context;
pub mod legality;
mod prompt;
mod window;

pub use context::HandlerContext;
pub use prompt::{Prompt, PromptKind};

pub(crate) use ability::AbilityResolution;
pub(crate) use window::EventWindow;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{GameState, PlayerId};
use crate::error::EngineError;
use crate::game::FlowStep;

/// Identifies one run of the resolution pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResolutionId(pub u32);

impl ResolutionId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ResolutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Resolution({})", self.0)
    }
}

/// Status returned by stack processing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionStatus {
    /// The stack is empty.
    Complete,

    /// Parked until the prompted player answers.
    AwaitingChoice(Prompt),
}

/// Why an ability stopped before completing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbortReason {
    /// The source is not where the ability works from, or is blank.
    Inactive,
    /// A "cannot trigger" restriction applies.
    Restricted,
    LimitReached,
    ConditionFailed,
    CannotPayCosts,
    NoLegalTargets,
    /// An interrupt cancelled one of the resolution's events.
    Cancelled,
}

/// How an ability resolution ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionOutcome {
    Completed,
    Aborted(AbortReason),
}

impl ResolutionOutcome {
    #[must_use]
    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }
}

pub(crate) enum Frame {
    Ability(Box<AbilityResolution>),
    Window(EventWindow),
    Flow(FlowStep),
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ability(resolution) => write!(f, "Ability({})", resolution.id()),
            Self::Window(window) => write!(f, "Window({:?})", window.event_ids()),
            Self::Flow(step) => write!(f, "Flow({step:?})"),
        }
    }
}

/// What a frame asks of the stack after one step.
pub(crate) enum Step {
    /// Step again.
    Continue,
    /// Pop.
    Done,
    /// Keep this frame and run `Frame` on top of it.
    Push(Frame),
    /// Pop and run these frames, first one first.
    Finish(Vec<Frame>),
    /// Keep this frame and park on the prompt.
    Prompt(Prompt),
}

/// Shared bookkeeping frames read and write while stepping.
#[derive(Debug, Default)]
pub(crate) struct StackIo {
    answer: Option<usize>,
    prompt: Option<Prompt>,
    outcomes: FxHashMap<ResolutionId, ResolutionOutcome>,
    next_resolution: u32,
}

impl StackIo {
    pub(crate) fn allocate(&mut self) -> ResolutionId {
        let id = ResolutionId::new(self.next_resolution);
        self.next_resolution += 1;
        id
    }

    /// The answer to the prompt this frame parked on.
    pub(crate) fn take_answer(&mut self) -> Option<usize> {
        self.answer.take()
    }

    pub(crate) fn record(&mut self, id: ResolutionId, outcome: ResolutionOutcome) {
        self.outcomes.insert(id, outcome);
    }
}

/// The single active resolution stack.
#[derive(Debug, Default)]
pub struct ResolutionStack {
    frames: Vec<Frame>,
    io: StackIo,
}

impl ResolutionStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub(crate) fn allocate(&mut self) -> ResolutionId {
        self.io.allocate()
    }

    #[must_use]
    pub fn pending_prompt(&self) -> Option<&Prompt> {
        self.io.prompt.as_ref()
    }

    #[must_use]
    pub fn outcome(&self, id: ResolutionId) -> Option<ResolutionOutcome> {
        self.io.outcomes.get(&id).copied()
    }

    /// Run frames until the stack empties or a player must decide.
    pub fn process(&mut self, state: &mut GameState) -> ResolutionStatus {
        loop {
            if let Some(prompt) = &self.io.prompt {
                return ResolutionStatus::AwaitingChoice(prompt.clone());
            }
            let Some(mut frame) = self.frames.pop() else {
                return ResolutionStatus::Complete;
            };
            let step = match &mut frame {
                Frame::Ability(resolution) => resolution.step(state, &mut self.io),
                Frame::Window(window) => window.step(state, &mut self.io),
                Frame::Flow(flow) => {
                    flow.apply(state);
                    Step::Done
                }
            };
            match step {
                Step::Continue => self.frames.push(frame),
                Step::Done => trace!(?frame, "frame done"),
                Step::Push(child) => {
                    self.frames.push(frame);
                    self.frames.push(child);
                }
                Step::Finish(next) => {
                    trace!(?frame, next = next.len(), "frame finished");
                    self.frames.extend(next.into_iter().rev());
                }
                Step::Prompt(prompt) => {
                    self.frames.push(frame);
                    self.io.prompt = Some(prompt);
                }
            }
        }
    }

    /// Answer the pending prompt with the option at `index`.
    pub fn respond(&mut self, player: PlayerId, index: usize) -> Result<(), EngineError> {
        let prompt = self.io.prompt.as_ref().ok_or(EngineError::NoPendingPrompt)?;
        if prompt.player != player {
            return Err(EngineError::WrongPlayer {
                expected: prompt.player,
                got: player,
            });
        }
        if index >= prompt.options.len() {
            return Err(EngineError::OptionOutOfRange {
                index,
                len: prompt.options.len(),
            });
        }
        trace!(%player, index, title = %prompt.title, "prompt answered");
        self.io.prompt = None;
        self.io.answer = Some(index);
        Ok(())
    }
}
