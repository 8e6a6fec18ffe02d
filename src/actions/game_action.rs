//! Primitive game actions.
//!
//! `GameAction` is the closed set of state operations content may request.
//! An action never mutates state directly: `events` turns it into pending
//! events, each carrying the `StateChange` the dispatcher applies once the
//! event survives its interrupt tiers. Generating events is a pure function of
//! the state, the context and the target, so the same inputs always produce
//! the same events.

use std::sync::Arc;

use tracing::trace;

use crate::abilities::restriction::{is_restricted, RestrictedAction};
use crate::abilities::AbilityDescriptor;
use crate::core::{EntityId, EntityKind, GameState, PlayerId, ZoneId, ZoneRole};
use crate::effects::{Amount, Duration, Effect, EffectOp, EffectSpec};
use crate::stack::ResolutionId;
use crate::triggers::{events, Condition, ConditionContext, EventId, EventTypeId, GameEvent};
use crate::zones::ZonePosition;

/// Category of a game action, used by restrictions ("cannot be bowed").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ActionKind {
    Move,
    PutIntoPlay,
    ReturnToDeck,
    Discard,
    Sacrifice,
    Bow,
    Ready,
    Honor,
    Dishonor,
    ModifyState,
    ClaimRing,
    ApplyEffect,
    GrantAbility,
    CancelEvent,
    Draw,
    Shuffle,
    Choose,
}

/// A primitive state operation.
#[derive(Clone, Debug)]
pub enum GameAction {
    /// Move a card to its owner's zone with the given role.
    MoveCard { to: ZoneRole },
    PutIntoPlay,
    ReturnToDeck { shuffle: bool, bottom: bool },
    Discard,
    Sacrifice,
    Bow,
    Ready,
    Honor,
    Dishonor,
    ModifyCardState { key: String, amount: Amount },
    SetCardState { key: String, value: i64 },
    ModifyPlayerState { key: String, amount: Amount },
    SetPlayerState { key: String, value: i64 },
    ModifyRingState { key: String, amount: Amount },
    /// Claim a ring for the resolving player.
    ClaimRing,
    /// Create a lasting effect on the target.
    ApplyEffect(EffectSpec),
    /// Give the target card an ability for a duration.
    GrantAbility {
        ability: Arc<AbilityDescriptor>,
        duration: Duration,
    },
    /// Cancel the triggering event. Only effective from a would-interrupt.
    CancelEvent,
    /// The target player draws cards.
    DrawCards(u32),
    ShuffleDeck,
    Conditional {
        condition: Condition,
        then: Box<GameAction>,
        otherwise: Option<Box<GameAction>>,
    },
    /// The resolving player picks one named alternative.
    Choose(Vec<(String, GameAction)>),
}

/// What an action is resolving on behalf of.
#[derive(Clone, Debug)]
pub struct ActionContext {
    /// Card (or player entity) whose ability is resolving.
    pub source: EntityId,
    pub player: PlayerId,
    pub resolution: Option<ResolutionId>,
    /// The event that triggered the resolution, if any.
    pub event: Option<GameEvent>,
    /// The resolution is a would-interrupt and may cancel `event`.
    pub can_cancel: bool,
}

impl ActionContext {
    #[must_use]
    pub fn new(source: EntityId, player: PlayerId) -> Self {
        Self {
            source,
            player,
            resolution: None,
            event: None,
            can_cancel: false,
        }
    }

    fn condition_context<'a>(&'a self, state: &'a GameState, subject: EntityId) -> ConditionContext<'a> {
        let ctx = ConditionContext::new(state)
            .with_source(self.source)
            .with_player(self.player)
            .with_subject(subject);
        match &self.event {
            Some(event) => ctx.with_event(event),
            None => ctx,
        }
    }
}

/// A mutation applied by the dispatcher once its event is finalized.
#[derive(Clone, Debug)]
pub enum StateChange {
    MoveCard {
        card: EntityId,
        to: ZoneId,
        position: Option<ZonePosition>,
    },
    SetCardState { card: EntityId, key: String, value: i64 },
    ModifyCardState { card: EntityId, key: String, delta: i64 },
    SetPlayerState { player: PlayerId, key: String, value: i64 },
    ModifyPlayerState { player: PlayerId, key: String, delta: i64 },
    ModifyRingState { ring: EntityId, key: String, delta: i64 },
    ClaimRing { ring: EntityId, player: PlayerId },
    ShuffleZone(ZoneId),
    AddEffects(Vec<Effect>),
    CancelEvent(EventId),
    Batch(Vec<StateChange>),
}

/// An event waiting for its window, with the change it will apply.
#[derive(Clone, Debug)]
pub struct PendingEvent {
    pub event: GameEvent,
    pub change: Option<StateChange>,
    /// Consequence of the previous pending event ("left play" after a
    /// discard); skipped if that event is cancelled.
    pub follows_previous: bool,
}

impl PendingEvent {
    #[must_use]
    pub fn new(event: GameEvent, change: Option<StateChange>) -> Self {
        Self {
            event,
            change,
            follows_previous: false,
        }
    }

    /// An event carrying no state change.
    #[must_use]
    pub fn notice(event: GameEvent) -> Self {
        Self::new(event, None)
    }

    fn following(event: GameEvent) -> Self {
        Self {
            event,
            change: None,
            follows_previous: true,
        }
    }
}

impl GameAction {
    pub fn modify_card(key: impl Into<String>, amount: i64) -> Self {
        Self::ModifyCardState {
            key: key.into(),
            amount: Amount::Fixed(amount),
        }
    }

    pub fn modify_player(key: impl Into<String>, amount: i64) -> Self {
        Self::ModifyPlayerState {
            key: key.into(),
            amount: Amount::Fixed(amount),
        }
    }

    pub fn modify_ring(key: impl Into<String>, amount: i64) -> Self {
        Self::ModifyRingState {
            key: key.into(),
            amount: Amount::Fixed(amount),
        }
    }

    pub fn grant(ability: AbilityDescriptor, duration: Duration) -> Self {
        Self::GrantAbility {
            ability: Arc::new(ability),
            duration,
        }
    }

    pub fn choose(options: impl IntoIterator<Item = (&'static str, GameAction)>) -> Self {
        Self::Choose(options.into_iter().map(|(name, a)| (name.to_string(), a)).collect())
    }

    pub fn when(condition: Condition, then: GameAction) -> Self {
        Self::Conditional {
            condition,
            then: Box::new(then),
            otherwise: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::MoveCard { .. } => ActionKind::Move,
            Self::PutIntoPlay => ActionKind::PutIntoPlay,
            Self::ReturnToDeck { .. } => ActionKind::ReturnToDeck,
            Self::Discard => ActionKind::Discard,
            Self::Sacrifice => ActionKind::Sacrifice,
            Self::Bow => ActionKind::Bow,
            Self::Ready => ActionKind::Ready,
            Self::Honor => ActionKind::Honor,
            Self::Dishonor => ActionKind::Dishonor,
            Self::ModifyCardState { .. }
            | Self::SetCardState { .. }
            | Self::ModifyPlayerState { .. }
            | Self::SetPlayerState { .. }
            | Self::ModifyRingState { .. } => ActionKind::ModifyState,
            Self::ClaimRing => ActionKind::ClaimRing,
            Self::ApplyEffect(_) => ActionKind::ApplyEffect,
            Self::GrantAbility { .. } => ActionKind::GrantAbility,
            Self::CancelEvent => ActionKind::CancelEvent,
            Self::DrawCards(_) => ActionKind::Draw,
            Self::ShuffleDeck => ActionKind::Shuffle,
            Self::Conditional { then, .. } => then.kind(),
            Self::Choose(_) => ActionKind::Choose,
        }
    }

    /// Every condition embedded in this action.
    pub fn conditions(&self) -> Vec<&Condition> {
        match self {
            Self::ApplyEffect(spec) => spec.conditions(),
            Self::GrantAbility { ability, .. } => ability.conditions(),
            Self::Conditional {
                condition,
                then,
                otherwise,
            } => {
                let mut all = vec![condition];
                all.extend(then.conditions());
                if let Some(otherwise) = otherwise {
                    all.extend(otherwise.conditions());
                }
                all
            }
            Self::Choose(options) => options.iter().flat_map(|(_, a)| a.conditions()).collect(),
            Self::ModifyCardState { amount, .. }
            | Self::ModifyPlayerState { amount, .. }
            | Self::ModifyRingState { amount, .. } => amount.conditions(),
            _ => Vec::new(),
        }
    }

    /// Abilities this action hands out, directly or through a nested action.
    pub fn granted_abilities(&self) -> Vec<&AbilityDescriptor> {
        match self {
            Self::ApplyEffect(spec) => spec.op.granted_abilities(),
            Self::GrantAbility { ability, .. } => vec![ability.as_ref()],
            Self::Conditional { then, otherwise, .. } => {
                let mut all = then.granted_abilities();
                if let Some(otherwise) = otherwise {
                    all.extend(otherwise.granted_abilities());
                }
                all
            }
            Self::Choose(options) => options.iter().flat_map(|(_, a)| a.granted_abilities()).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether this action or a nested one is a choice with no options.
    #[must_use]
    pub fn has_empty_choice(&self) -> bool {
        match self {
            Self::Choose(options) => options.is_empty() || options.iter().any(|(_, a)| a.has_empty_choice()),
            Self::Conditional { then, otherwise, .. } => {
                then.has_empty_choice() || otherwise.as_ref().is_some_and(|o| o.has_empty_choice())
            }
            _ => false,
        }
    }

    /// Whether the action would change anything on `target`.
    #[must_use]
    pub fn can_affect(&self, state: &GameState, ctx: &ActionContext, target: EntityId) -> bool {
        let Some(kind) = state.kind_of(target) else {
            return false;
        };
        if !matches!(self, Self::Choose(_) | Self::Conditional { .. } | Self::CancelEvent)
            && is_restricted(state, target, RestrictedAction::Receive(self.kind()), Some(ctx.source))
        {
            return false;
        }

        let is_card = kind == EntityKind::Card;
        let in_play = is_card && state.is_in_play(target);
        let flag = |key: &str| state.has_flag(target, key);

        match self {
            Self::MoveCard { to } => {
                is_card && destination(state, target, *to).is_some_and(|zone| state.zones.get_zone(target) != Some(zone))
            }
            Self::PutIntoPlay => is_card && !in_play && destination(state, target, ZoneRole::Play).is_some(),
            Self::ReturnToDeck { .. } => is_card && destination(state, target, ZoneRole::Deck).is_some(),
            Self::Discard => {
                is_card
                    && destination(state, target, ZoneRole::Discard)
                        .is_some_and(|zone| state.zones.get_zone(target) != Some(zone))
            }
            Self::Sacrifice => in_play && destination(state, target, ZoneRole::Discard).is_some(),
            Self::Bow => in_play && !flag("bowed"),
            Self::Ready => in_play && flag("bowed"),
            Self::Honor => in_play && !flag("honored"),
            Self::Dishonor => in_play && !flag("dishonored"),
            Self::ModifyCardState { .. } | Self::SetCardState { .. } => is_card,
            Self::ModifyPlayerState { .. } | Self::SetPlayerState { .. } => kind == EntityKind::Player,
            Self::ModifyRingState { .. } => kind == EntityKind::Ring,
            Self::ClaimRing => state.ring(target).is_some_and(|r| r.claimed_by.is_none()),
            Self::ApplyEffect(_) => !is_card || in_play,
            Self::GrantAbility { .. } => in_play,
            Self::CancelEvent => {
                ctx.can_cancel
                    && ctx
                        .event
                        .as_ref()
                        .is_some_and(|e| e.cancellable && !state.is_cancelled(e.id))
            }
            Self::DrawCards(_) => target
                .as_player(state.player_count())
                .and_then(|p| state.config().zone_for(Some(p), ZoneRole::Deck))
                .is_some_and(|deck| state.zones.zone_size(deck) > 0),
            Self::ShuffleDeck => kind == EntityKind::Player,
            Self::Conditional { .. } => self
                .branch(state, ctx, target)
                .is_some_and(|action| action.can_affect(state, ctx, target)),
            Self::Choose(options) => options.iter().any(|(_, a)| a.can_affect(state, ctx, target)),
        }
    }

    /// The pending events this action produces on `target`. Empty when the
    /// action cannot affect it.
    #[must_use]
    pub fn events(&self, state: &GameState, ctx: &ActionContext, target: EntityId) -> Vec<PendingEvent> {
        if !self.can_affect(state, ctx, target) {
            trace!(?target, kind = ?self.kind(), "action cannot affect target");
            return Vec::new();
        }
        let card_event = |event_type: EventTypeId| {
            GameEvent::for_card(event_type, Some(ctx.source), target).with_player(ctx.player)
        };

        match self {
            Self::MoveCard { to } => moved(state, target, *to, None, card_event(events::CARD_MOVED), Vec::new()),
            Self::PutIntoPlay => moved(state, target, ZoneRole::Play, None, card_event(events::ENTERED_PLAY), Vec::new()),
            Self::ReturnToDeck { shuffle, bottom } => {
                let position = if *bottom { ZonePosition::Bottom } else { ZonePosition::Top };
                let extra = match (shuffle, destination(state, target, ZoneRole::Deck)) {
                    (true, Some(deck)) => vec![StateChange::ShuffleZone(deck)],
                    _ => Vec::new(),
                };
                moved(state, target, ZoneRole::Deck, Some(position), card_event(events::RETURNED_TO_DECK), extra)
            }
            Self::Discard => moved(state, target, ZoneRole::Discard, None, card_event(events::DISCARDED), Vec::new()),
            Self::Sacrifice => moved(state, target, ZoneRole::Discard, None, card_event(events::SACRIFICED), Vec::new()),
            Self::Bow => vec![flag_event(card_event(events::BOWED), target, "bowed", 1)],
            Self::Ready => vec![flag_event(card_event(events::READIED), target, "bowed", 0)],
            Self::Honor => {
                let event = card_event(events::HONORED);
                if state.has_flag(target, "dishonored") {
                    vec![flag_event(event, target, "dishonored", 0)]
                } else {
                    vec![flag_event(event, target, "honored", 1)]
                }
            }
            Self::Dishonor => {
                let event = card_event(events::DISHONORED);
                if state.has_flag(target, "honored") {
                    vec![flag_event(event, target, "honored", 0)]
                } else {
                    vec![flag_event(event, target, "dishonored", 1)]
                }
            }
            Self::ModifyCardState { key, amount } => {
                let delta = amount.evaluate(state, ctx.source, Some(ctx.player));
                vec![PendingEvent::new(
                    card_event(events::CARD_STATE_CHANGED).with_tag(key.clone()).with_value(delta),
                    Some(StateChange::ModifyCardState { card: target, key: key.clone(), delta }),
                )]
            }
            Self::SetCardState { key, value } => vec![PendingEvent::new(
                card_event(events::CARD_STATE_CHANGED).with_tag(key.clone()).with_value(*value),
                Some(StateChange::SetCardState { card: target, key: key.clone(), value: *value }),
            )],
            Self::ModifyPlayerState { key, amount } => {
                let Some(player) = target.as_player(state.player_count()) else {
                    return Vec::new();
                };
                let delta = amount.evaluate(state, ctx.source, Some(ctx.player));
                vec![PendingEvent::new(
                    player_event(ctx, player, key, delta),
                    Some(StateChange::ModifyPlayerState { player, key: key.clone(), delta }),
                )]
            }
            Self::SetPlayerState { key, value } => {
                let Some(player) = target.as_player(state.player_count()) else {
                    return Vec::new();
                };
                vec![PendingEvent::new(
                    player_event(ctx, player, key, *value),
                    Some(StateChange::SetPlayerState { player, key: key.clone(), value: *value }),
                )]
            }
            Self::ModifyRingState { key, amount } => {
                let delta = amount.evaluate(state, ctx.source, Some(ctx.player));
                vec![PendingEvent::new(
                    card_event(events::RING_STATE_CHANGED).with_tag(key.clone()).with_value(delta),
                    Some(StateChange::ModifyRingState { ring: target, key: key.clone(), delta }),
                )]
            }
            Self::ClaimRing => {
                let element = state.ring(target).map(|r| r.element.clone()).unwrap_or_default();
                vec![PendingEvent::new(
                    card_event(events::RING_CLAIMED).with_tag(element),
                    Some(StateChange::ClaimRing { ring: target, player: ctx.player }),
                )]
            }
            Self::ApplyEffect(spec) => {
                let effects = spec.instantiate(state, ctx.source, ctx.player, &[target], ctx.resolution);
                vec![PendingEvent::new(card_event(events::EFFECT_APPLIED), Some(StateChange::AddEffects(effects)))]
            }
            Self::GrantAbility { ability, duration } => {
                let spec = EffectSpec::new(EntityKind::Card, EffectOp::GainAbility(Arc::clone(ability))).lasting(*duration);
                let effects = spec.instantiate(state, ctx.source, ctx.player, &[target], ctx.resolution);
                vec![PendingEvent::new(
                    card_event(events::ABILITY_GRANTED).with_tag(ability.title.clone()),
                    Some(StateChange::AddEffects(effects)),
                )]
            }
            Self::CancelEvent => {
                let Some(cancelled) = ctx.event.as_ref() else {
                    return Vec::new();
                };
                let event = GameEvent::new(events::EVENT_CANCELLED)
                    .with_source(ctx.source)
                    .with_player(ctx.player)
                    .with_value(i64::from(cancelled.id.0))
                    .uncancellable();
                vec![PendingEvent::new(event, Some(StateChange::CancelEvent(cancelled.id)))]
            }
            Self::DrawCards(count) => {
                let Some(player) = target.as_player(state.player_count()) else {
                    return Vec::new();
                };
                let config = state.config();
                let (Some(deck), Some(hand)) = (
                    config.zone_for(Some(player), ZoneRole::Deck),
                    config.zone_for(Some(player), ZoneRole::Hand),
                ) else {
                    return Vec::new();
                };
                let cards = state.zones.cards_in_zone_ordered(deck);
                let drawn: Vec<_> = cards.iter().rev().take(*count as usize).copied().collect();
                let moves = drawn
                    .iter()
                    .map(|&card| StateChange::MoveCard { card, to: hand, position: None })
                    .collect();
                let event = GameEvent::for_player(events::CARDS_DRAWN, player)
                    .with_source(ctx.source)
                    .with_value(drawn.len() as i64);
                vec![PendingEvent::new(event, Some(StateChange::Batch(moves)))]
            }
            Self::ShuffleDeck => {
                let Some(player) = target.as_player(state.player_count()) else {
                    return Vec::new();
                };
                let Some(deck) = state.config().zone_for(Some(player), ZoneRole::Deck) else {
                    return Vec::new();
                };
                let event = GameEvent::for_player(events::DECK_SHUFFLED, player).with_source(ctx.source);
                vec![PendingEvent::new(event, Some(StateChange::ShuffleZone(deck)))]
            }
            Self::Conditional { .. } => self
                .branch(state, ctx, target)
                .map(|action| action.events(state, ctx, target))
                .unwrap_or_default(),
            // Choices are expanded by the resolution before events are generated.
            Self::Choose(_) => Vec::new(),
        }
    }

    fn branch(&self, state: &GameState, ctx: &ActionContext, target: EntityId) -> Option<&GameAction> {
        let Self::Conditional {
            condition,
            then,
            otherwise,
        } = self
        else {
            return Some(self);
        };
        if condition.evaluate(&ctx.condition_context(state, target)) {
            Some(then)
        } else {
            otherwise.as_deref()
        }
    }
}

/// The owner's zone with `role`.
fn destination(state: &GameState, card: EntityId, role: ZoneRole) -> Option<ZoneId> {
    state.config().zone_for(state.owner_of(card), role)
}

fn flag_event(event: GameEvent, card: EntityId, key: &str, value: i64) -> PendingEvent {
    PendingEvent::new(
        event,
        Some(StateChange::SetCardState {
            card,
            key: key.to_string(),
            value,
        }),
    )
}

fn player_event(ctx: &ActionContext, player: PlayerId, key: &str, value: i64) -> GameEvent {
    GameEvent::for_player(events::PLAYER_STATE_CHANGED, player)
        .with_source(ctx.source)
        .with_target(EntityId::player(player))
        .with_tag(key)
        .with_value(value)
}

/// A zone move, plus "left play" / "entered play" consequences.
fn moved(
    state: &GameState,
    card: EntityId,
    role: ZoneRole,
    position: Option<ZonePosition>,
    event: GameEvent,
    extra: Vec<StateChange>,
) -> Vec<PendingEvent> {
    let (Some(from), Some(to)) = (state.zones.get_zone(card), destination(state, card, role)) else {
        return Vec::new();
    };
    let event_type = event.event_type;
    let source = event.source;
    let player = event.player;
    let event = event.with_zone(from).with_zone(to);

    let mut change = vec![StateChange::MoveCard { card, to, position }];
    change.extend(extra);
    let mut pending = vec![PendingEvent::new(event, Some(StateChange::Batch(change)))];

    let config = state.config();
    let consequence = |event_type| {
        let mut follow = GameEvent::zone_change(event_type, card, from, to);
        follow.source = source;
        follow.player = player;
        PendingEvent::following(follow)
    };
    match (config.is_in_play_zone(from), config.is_in_play_zone(to)) {
        (true, false) => pending.push(consequence(events::LEFT_PLAY)),
        (false, true) if event_type != events::ENTERED_PLAY => pending.push(consequence(events::ENTERED_PLAY)),
        _ => {}
    }
    pending
}

/// Apply a finalized change to the state.
pub fn apply_change(state: &mut GameState, change: StateChange) {
    match change {
        StateChange::MoveCard { card, to, position } => {
            let left_play = state.is_in_play(card) && !state.config().is_in_play_zone(to);
            if state.move_card(card, to, position).is_some() && left_play {
                crate::effects::on_leave_play(state, card);
                if let Some(instance) = state.card_mut(card) {
                    instance.reset();
                }
            }
        }
        StateChange::SetCardState { card, key, value } => {
            if let Some(instance) = state.card_mut(card) {
                instance.set_state(key, value);
            }
        }
        StateChange::ModifyCardState { card, key, delta } => {
            if let Some(instance) = state.card_mut(card) {
                instance.modify_state(&key, delta);
            }
        }
        StateChange::SetPlayerState { player, key, value } => state.public.set_player_state(player, key, value),
        StateChange::ModifyPlayerState { player, key, delta } => state.public.modify_player_state(player, &key, delta),
        StateChange::ModifyRingState { ring, key, delta } => {
            if let Some(ring) = state.ring_mut(ring) {
                ring.modify_state(&key, delta);
            }
        }
        StateChange::ClaimRing { ring, player } => {
            if let Some(ring) = state.ring_mut(ring) {
                ring.claimed_by = Some(player);
                ring.contested = false;
            }
        }
        StateChange::ShuffleZone(zone) => {
            let GameState { zones, rng, .. } = state;
            zones.shuffle_zone(zone, rng);
        }
        StateChange::AddEffects(effects) => {
            for effect in effects {
                state.effects.add(effect);
            }
        }
        StateChange::CancelEvent(event) => state.cancel_event(event),
        StateChange::Batch(changes) => {
            for change in changes {
                apply_change(state, change);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, CardInstance};
    use crate::core::{GameConfig, ZoneConfig};

    const PLAY: ZoneId = ZoneId(0);
    const DECK: ZoneId = ZoneId(1);
    const DISCARD: ZoneId = ZoneId(2);
    const HAND: ZoneId = ZoneId(3);

    fn state() -> GameState {
        let config = GameConfig::new(2)
            .with_zone(ZoneConfig::new(PLAY, "Play").with_role(ZoneRole::Play).in_play())
            .with_zone(ZoneConfig::new(DECK, "Deck").with_role(ZoneRole::Deck).ordered())
            .with_zone(ZoneConfig::new(DISCARD, "Discard").with_role(ZoneRole::Discard))
            .with_zone(ZoneConfig::new(HAND, "Hand").with_role(ZoneRole::Hand))
            .with_ring("fire");
        GameState::new(config, 7)
    }

    fn card(state: &mut GameState, zone: ZoneId) -> EntityId {
        let entity = state.alloc_entity();
        state.add_card(CardInstance::new(entity, CardId::new(1), PlayerId::new(0), zone));
        entity
    }

    fn ctx() -> ActionContext {
        ActionContext::new(EntityId(0), PlayerId::new(0))
    }

    fn apply_all(state: &mut GameState, pending: Vec<PendingEvent>) {
        for p in pending {
            if let Some(change) = p.change {
                apply_change(state, change);
            }
        }
    }

    #[test]
    fn test_bow_and_ready() {
        let mut state = state();
        let target = card(&mut state, PLAY);

        assert!(!GameAction::Ready.can_affect(&state, &ctx(), target));
        let pending = GameAction::Bow.events(&state, &ctx(), target);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].event.event_type, events::BOWED);
        apply_all(&mut state, pending);

        assert!(state.has_flag(target, "bowed"));
        assert!(GameAction::Bow.events(&state, &ctx(), target).is_empty());
        assert!(GameAction::Ready.can_affect(&state, &ctx(), target));
    }

    #[test]
    fn test_honor_clears_dishonor() {
        let mut state = state();
        let target = card(&mut state, PLAY);
        let pending = GameAction::Dishonor.events(&state, &ctx(), target);
        apply_all(&mut state, pending);
        assert!(state.has_flag(target, "dishonored"));

        let pending = GameAction::Honor.events(&state, &ctx(), target);

        apply_all(&mut state, pending);
        assert!(!state.has_flag(target, "dishonored"));
        assert!(!state.has_flag(target, "honored"));
    }

    #[test]
    fn test_events_are_repeatable() {
        let mut state = state();
        let target = card(&mut state, PLAY);
        let first = GameAction::Discard.events(&state, &ctx(), target);
        let second = GameAction::Discard.events(&state, &ctx(), target);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.event, b.event);
        }
    }

    #[test]
    fn test_discard_from_play_adds_left_play() {
        let mut state = state();
        let target = card(&mut state, PLAY);
        state.card_mut(target).unwrap().set_flag("bowed", true);

        let pending = GameAction::Discard.events(&state, &ctx(), target);
        let types: Vec<_> = pending.iter().map(|p| p.event.event_type).collect();
        assert_eq!(types, vec![events::DISCARDED, events::LEFT_PLAY]);
        assert!(pending[1].follows_previous);

        apply_all(&mut state, pending);
        assert_eq!(state.zones.get_zone(target), Some(DISCARD));
        assert!(!state.has_flag(target, "bowed"));
    }

    #[test]
    fn test_return_to_deck_bottom() {
        let mut state = state();
        let top = card(&mut state, DECK);
        let target = card(&mut state, HAND);

        let action = GameAction::ReturnToDeck { shuffle: false, bottom: true };
        let pending = action.events(&state, &ctx(), target);
        apply_all(&mut state, pending);
        assert_eq!(state.zones.cards_in_zone_ordered(DECK), &[target, top]);
    }

    #[test]
    fn test_draw_takes_from_top() {
        let mut state = state();
        let bottom = card(&mut state, DECK);
        let top = card(&mut state, DECK);
        let player = EntityId::player(PlayerId::new(0));

        let pending = GameAction::DrawCards(1).events(&state, &ctx(), player);
        assert_eq!(pending[0].event.value(0, 0), 1);
        apply_all(&mut state, pending);

        assert_eq!(state.zones.get_zone(top), Some(HAND));
        assert_eq!(state.zones.get_zone(bottom), Some(DECK));
    }

    #[test]
    fn test_player_and_ring_state() {
        let mut state = state();
        let player = EntityId::player(PlayerId::new(1));
        let ring = state.ring_by_element("fire").unwrap();

        let pending = GameAction::modify_player("honor", 2).events(&state, &ctx(), player);

        apply_all(&mut state, pending);
        let pending = GameAction::modify_ring("fate", 1).events(&state, &ctx(), ring);
        apply_all(&mut state, pending);
        let pending = GameAction::ClaimRing.events(&state, &ctx(), ring);
        apply_all(&mut state, pending);

        assert_eq!(state.public.get_player_state(PlayerId::new(1), "honor", 0), 2);
        assert_eq!(state.ring(ring).unwrap().get_state("fate", 0), 1);
        assert_eq!(state.ring(ring).unwrap().claimed_by, Some(PlayerId::new(0)));
        assert!(!GameAction::ClaimRing.can_affect(&state, &ctx(), ring));

        // Wrong entity kind
        assert!(GameAction::modify_player("honor", 1).events(&state, &ctx(), ring).is_empty());
    }

    #[test]
    fn test_cancel_requires_would_interrupt() {
        let mut state = state();
        let mut event = GameEvent::new(events::BOWED);
        event.id = state.next_event_id();

        let mut context = ctx();
        context.event = Some(event.clone());
        assert!(!GameAction::CancelEvent.can_affect(&state, &context, EntityId(0)));

        context.can_cancel = true;
        let pending = GameAction::CancelEvent.events(&state, &context, EntityId(0));
        apply_all(&mut state, pending);
        assert!(state.is_cancelled(event.id));
    }

    #[test]
    fn test_conditional_and_choice() {
        let mut state = state();
        let target = card(&mut state, PLAY);

        let action = GameAction::Conditional {
            condition: Condition::SubjectHasFlag("bowed".into()),
            then: Box::new(GameAction::Ready),
            otherwise: Some(Box::new(GameAction::Bow)),
        };
        let pending = action.events(&state, &ctx(), target);
        assert_eq!(pending[0].event.event_type, events::BOWED);

        let choice = GameAction::choose([("Honor", GameAction::Honor), ("Dishonor", GameAction::Dishonor)]);
        assert!(choice.can_affect(&state, &ctx(), target));
        assert!(choice.events(&state, &ctx(), target).is_empty());
        assert!(!choice.has_empty_choice());
        assert!(GameAction::Choose(Vec::new()).has_empty_choice());
    }
}
