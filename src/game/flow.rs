//! Conflict, phase and round boundaries.
//!
//! Each boundary runs as two frames: the window for its event, so abilities
//! reacting to "after the conflict" still see the conflict, then a flow step
//! closing it. Closing bumps the counter that bounded effects are stamped
//! with, so recalculation drops them.

use tracing::debug;

use crate::abilities::LimitScope;
use crate::core::{EntityKind, GameState, PhaseId};
use crate::effects::recalculate;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowStep {
    CloseConflict,
    ClosePhase { next: PhaseId },
    CloseRound,
}

impl FlowStep {
    pub(crate) fn apply(self, state: &mut GameState) {
        match self {
            Self::CloseConflict => {
                state.public.conflict_number += 1;
                state.conflict_mut().reset();
                debug!(conflicts = state.public.conflict_number, "conflict closed");
            }
            Self::ClosePhase { next } => {
                state.public.phase_number += 1;
                state.public.phase = next;
                let reset = state.limits.reset_scope(LimitScope::PerPhase);
                debug!(phase = ?next, limits_reset = reset, "phase closed");
            }
            Self::CloseRound => {
                // A round end also ends whatever phase is open.
                state.public.round += 1;
                state.public.phase_number += 1;
                let reset = state.limits.reset_scope(LimitScope::PerPhase)
                    + state.limits.reset_scope(LimitScope::PerRound);
                for ring in state.entities_of_kind(EntityKind::Ring) {
                    if let Some(ring) = state.ring_mut(ring) {
                        ring.reset();
                    }
                }
                debug!(round = state.public.round, limits_reset = reset, "round closed");
            }
        }
        recalculate(state);
    }
}
