//! Event windows.
//!
//! A window takes a batch of simultaneous events through the dispatcher
//! tiers in order: would-interrupts, interrupts, finalization, reactions.
//! Cancelled events drop out of every later tier and are never finalized.
//!
//! Within a tier, candidates of the player earliest in initiative order go
//! first. When that player has more than one candidate, or a single optional
//! one, they choose which resolves next; nothing is ordered implicitly. Each
//! fired ability resolves completely before the tier is searched again, so
//! the next candidate sees the state it left behind.

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::abilities::AbilityId;
use crate::actions::{apply_change, PendingEvent};
use crate::core::{GameState, PlayerId};
use crate::effects::{poll_event, poll_terminal, recalculate};
use crate::triggers::{EventId, TriggerCandidate, TriggerTiming};

use super::legality;
use super::prompt::{Prompt, PromptKind};
use super::{AbilityResolution, Frame, StackIo, Step};

const PASS: &str = "Pass";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tier {
    WouldInterrupt,
    Interrupt,
    Apply,
    Reaction,
    Done,
}

impl Tier {
    fn timing(self) -> Option<TriggerTiming> {
        match self {
            Self::WouldInterrupt => Some(TriggerTiming::WouldInterrupt),
            Self::Interrupt => Some(TriggerTiming::Interrupt),
            Self::Reaction => Some(TriggerTiming::Reaction),
            Self::Apply | Self::Done => None,
        }
    }

    fn next(self) -> Self {
        match self {
            Self::WouldInterrupt => Self::Interrupt,
            Self::Interrupt => Self::Apply,
            Self::Apply => Self::Reaction,
            Self::Reaction | Self::Done => Self::Done,
        }
    }
}

pub(crate) struct EventWindow {
    events: Vec<PendingEvent>,
    ids: Vec<EventId>,
    applied: Vec<bool>,
    tier: Tier,
    /// Abilities already fired or declined for an event.
    handled: FxHashSet<(AbilityId, EventId)>,
    /// Candidates behind the pending trigger prompt.
    offered: Vec<TriggerCandidate>,
    /// Delayed effects fired by finalized events.
    after: Vec<Frame>,
}

impl EventWindow {
    /// Open a window, assigning each event its id.
    pub(crate) fn new(state: &mut GameState, mut events: Vec<PendingEvent>) -> Self {
        for pending in &mut events {
            pending.event.id = state.next_event_id();
        }
        let ids = events.iter().map(|p| p.event.id).collect();
        let applied = vec![false; events.len()];
        Self {
            events,
            ids,
            applied,
            tier: Tier::WouldInterrupt,
            handled: FxHashSet::default(),
            offered: Vec::new(),
            after: Vec::new(),
        }
    }

    pub(crate) fn event_ids(&self) -> &[EventId] {
        &self.ids
    }

    pub(crate) fn step(&mut self, state: &mut GameState, io: &mut StackIo) -> Step {
        match self.tier {
            Tier::Apply => {
                self.apply(state, io);
                self.advance()
            }
            Tier::Done => Step::Finish(std::mem::take(&mut self.after)),
            tier => match tier.timing() {
                Some(timing) => self.dispatch(state, io, timing),
                None => self.advance(),
            },
        }
    }

    fn advance(&mut self) -> Step {
        let next = self.tier.next();
        trace!(events = ?self.ids, from = ?self.tier, to = ?next, "window tier");
        self.tier = next;
        Step::Continue
    }

    /// Events still live in this tier.
    fn live(&self, state: &GameState, timing: TriggerTiming) -> Vec<usize> {
        (0..self.events.len())
            .filter(|&i| !state.is_cancelled(self.ids[i]))
            .filter(|&i| timing != TriggerTiming::Reaction || self.applied[i])
            .collect()
    }

    fn candidates(&self, state: &GameState, timing: TriggerTiming) -> Vec<(TriggerCandidate, PlayerId)> {
        let seats: Vec<PlayerId> = state.public.initiative_order().collect();
        let mut found: Vec<(usize, usize, TriggerCandidate, PlayerId)> = Vec::new();
        for index in self.live(state, timing) {
            let event = &self.events[index].event;
            for candidate in state.triggers.find_candidates(event, state, timing) {
                if self.handled.contains(&(candidate.ability, candidate.event)) {
                    continue;
                }
                let Some(controller) = candidate.controller else {
                    continue;
                };
                let Some(ability) = state.abilities.get(candidate.ability) else {
                    continue;
                };
                if legality::check(state, ability, controller, Some(event)).is_err() {
                    continue;
                }
                let seat = seats.iter().position(|&s| s == controller).unwrap_or(seats.len());
                found.push((seat, index, candidate, controller));
            }
        }
        found.sort_by_key(|(seat, index, candidate, _)| (*seat, *index, candidate.trigger_id));
        found.into_iter().map(|(_, _, c, p)| (c, p)).collect()
    }

    fn is_optional(state: &GameState, ability: AbilityId) -> bool {
        state.abilities.get(ability).is_some_and(|a| a.descriptor.optional)
    }

    fn dispatch(&mut self, state: &GameState, io: &mut StackIo, timing: TriggerTiming) -> Step {
        if !self.offered.is_empty() {
            let offered = std::mem::take(&mut self.offered);
            return match io.take_answer().and_then(|i| offered.get(i).copied()) {
                Some(chosen) => self.fire(state, io, chosen),
                None => {
                    debug!(declined = offered.len(), "triggers passed");
                    self.handled.extend(offered.iter().map(|c| (c.ability, c.event)));
                    Step::Continue
                }
            };
        }

        let candidates = self.candidates(state, timing);
        let Some(&(_, leader)) = candidates.first() else {
            return self.advance();
        };
        let group: Vec<TriggerCandidate> = candidates
            .into_iter()
            .filter(|(_, controller)| *controller == leader)
            .map(|(c, _)| c)
            .collect();

        let all_optional = group.iter().all(|c| Self::is_optional(state, c.ability));
        if let [only] = group.as_slice() {
            if !all_optional {
                return self.fire(state, io, *only);
            }
        }

        let mut options: Vec<String> = group
            .iter()
            .map(|c| {
                let title = state.abilities.get(c.ability).map_or("", |a| a.title());
                format!("{title} ({})", state.name_of(c.source))
            })
            .collect();
        if all_optional {
            options.push(PASS.to_string());
        }
        self.offered = group;
        Step::Prompt(Prompt::new(leader, format!("{timing:?}"), PromptKind::Trigger).with_options(options))
    }

    fn fire(&mut self, state: &GameState, io: &mut StackIo, candidate: TriggerCandidate) -> Step {
        self.handled.insert((candidate.ability, candidate.event));
        let (Some(ability), Some(controller)) = (state.abilities.get(candidate.ability), candidate.controller) else {
            return Step::Continue;
        };
        let Some(index) = self.ids.iter().position(|&id| id == candidate.event) else {
            return Step::Continue;
        };
        let id = io.allocate();
        debug!(
            resolution = %id,
            ability = %candidate.ability,
            title = %ability.title(),
            event = ?candidate.event,
            "trigger fired"
        );
        let event = self.events[index].event.clone();
        let resolution = AbilityResolution::new(id, ability, controller, Some(event));
        Step::Push(Frame::Ability(Box::new(resolution)))
    }

    /// Finalize every event no interrupt cancelled.
    fn apply(&mut self, state: &mut GameState, io: &mut StackIo) {
        for index in 0..self.events.len() {
            let id = self.ids[index];
            let previous_dropped = index > 0 && !self.applied[index - 1];
            if state.is_cancelled(id) || (self.events[index].follows_previous && previous_dropped) {
                if !state.is_cancelled(id) {
                    state.cancel_event(id);
                }
                debug!(event = ?id, "event cancelled, not finalized");
                continue;
            }

            let pending = &mut self.events[index];
            if let Some(change) = pending.change.take() {
                apply_change(state, change);
            }
            let event = pending.event.clone();
            state.record_event(event.clone());
            self.applied[index] = true;
            trace!(event = ?id, event_type = ?event.event_type, "event finalized");

            let fired = poll_event(state, &event);
            recalculate(state);
            let terminal = poll_terminal(state);
            for entry in fired.into_iter().chain(terminal) {
                let resolution = AbilityResolution::delayed(io.allocate(), entry);
                self.after.push(Frame::Ability(Box::new(resolution)));
            }
        }
    }
}
