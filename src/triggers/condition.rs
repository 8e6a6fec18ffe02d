//! The condition language.
//!
//! One predicate enum serves every place content needs a test: trigger `when`
//! clauses, ability conditions, target filters, effect match predicates,
//! restriction `applies_to`, cost reducer matching and delayed effect
//! conditions. Conditions are data; game-specific logic plugs in through
//! named `Custom` predicates registered in `GameConfig`.

use serde::{Deserialize, Serialize};

use crate::cards::CardTypeId;
use crate::core::{EntityId, GameConfig, GameState, PhaseId, PlayerId, PlayerRelation, Side, ZoneId};
use crate::error::ConfigError;

use super::event::{EventTypeId, GameEvent};

/// A named predicate implemented in Rust by the game.
pub type CustomCondition = fn(&ConditionContext<'_>) -> bool;

/// Comparison operator for numeric tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cmp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Cmp {
    #[must_use]
    pub fn apply(self, left: i64, right: i64) -> bool {
        match self {
            Cmp::Eq => left == right,
            Cmp::Ne => left != right,
            Cmp::Lt => left < right,
            Cmp::Le => left <= right,
            Cmp::Gt => left > right,
            Cmp::Ge => left >= right,
        }
    }
}

/// A predicate over the game state and an evaluation context.
///
/// Player relations are relative to the context player (the controller of
/// the ability, effect or reducer being evaluated).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    // === Combinators ===
    Always,
    Never,
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),

    // === Event ===
    EventType(EventTypeId),
    AnyEventType(Vec<EventTypeId>),
    EventSourceIs(EntityId),
    EventTargetIs(EntityId),
    /// The event was caused by the context source.
    EventSourceIsSelf,
    /// The event happened to the context source.
    EventTargetIsSelf,
    EventPlayerIs(PlayerRelation),
    EventSourceCardType(CardTypeId),
    EventTargetCardType(CardTypeId),
    EventHasTag(String),
    EventValueAtLeast { index: usize, min: i64 },

    // === Subject (target candidate, effect target, cost target) ===
    SubjectHasFlag(String),
    SubjectHasTrait(String),
    SubjectHasKeyword(String),
    SubjectCardType(CardTypeId),
    SubjectControlledBy(PlayerRelation),
    SubjectInZone(ZoneId),
    SubjectInPlay,
    SubjectAttr { key: String, cmp: Cmp, value: i64 },
    SubjectParticipating(Side),

    // === Source (the card owning the ability or effect) ===
    SourceInPlay,
    SourceHasFlag(String),
    SourceAttr { key: String, cmp: Cmp, value: i64 },
    SourceControlledBy(PlayerRelation),
    SourceParticipating(Side),

    // === Conflict ===
    ConflictWinner(PlayerRelation),
    ConflictLoser(PlayerRelation),
    ConflictType(String),
    InConflict,

    // === Other ===
    PlayerState { key: String, cmp: Cmp, value: i64 },
    Phase(PhaseId),

    /// Named predicate registered in `GameConfig::conditions`.
    Custom(String),
}

impl Condition {
    /// Create an event type condition.
    pub fn event(event_type: EventTypeId) -> Self {
        Self::EventType(event_type)
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    pub fn subject_attr(key: impl Into<String>, cmp: Cmp, value: i64) -> Self {
        Self::SubjectAttr { key: key.into(), cmp, value }
    }

    pub fn source_attr(key: impl Into<String>, cmp: Cmp, value: i64) -> Self {
        Self::SourceAttr { key: key.into(), cmp, value }
    }

    pub fn player_state(key: impl Into<String>, cmp: Cmp, value: i64) -> Self {
        Self::PlayerState { key: key.into(), cmp, value }
    }

    /// Create an AND condition.
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::All(conditions.into_iter().collect())
    }

    /// Create an OR condition.
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Any(conditions.into_iter().collect())
    }

    /// Negate this condition.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Add another condition with AND.
    #[must_use]
    pub fn and(self, other: Condition) -> Self {
        match self {
            Self::Always => other,
            Self::All(mut conditions) => {
                conditions.push(other);
                Self::All(conditions)
            }
            _ => Self::All(vec![self, other]),
        }
    }

    /// Add another condition with OR.
    #[must_use]
    pub fn or(self, other: Condition) -> Self {
        match self {
            Self::Any(mut conditions) => {
                conditions.push(other);
                Self::Any(conditions)
            }
            _ => Self::Any(vec![self, other]),
        }
    }

    /// Check that every custom predicate this condition names is registered.
    pub fn validate(&self, config: &GameConfig) -> Result<(), ConfigError> {
        match self {
            Self::All(conditions) | Self::Any(conditions) => {
                conditions.iter().try_for_each(|c| c.validate(config))
            }
            Self::Not(inner) => inner.validate(config),
            Self::Custom(name) if config.condition(name).is_none() => {
                Err(ConfigError::UnknownCondition(name.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Evaluate against a context.
    #[must_use]
    pub fn evaluate(&self, ctx: &ConditionContext<'_>) -> bool {
        let state = ctx.state;
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::All(conditions) => conditions.iter().all(|c| c.evaluate(ctx)),
            Self::Any(conditions) => conditions.iter().any(|c| c.evaluate(ctx)),
            Self::Not(inner) => !inner.evaluate(ctx),

            Self::EventType(expected) => ctx.event.is_some_and(|e| e.event_type == *expected),
            Self::AnyEventType(types) => ctx.event.is_some_and(|e| types.contains(&e.event_type)),
            Self::EventSourceIs(entity) => ctx.event.is_some_and(|e| e.source == Some(*entity)),
            Self::EventTargetIs(entity) => ctx.event.is_some_and(|e| e.target == Some(*entity)),
            Self::EventSourceIsSelf => {
                ctx.source.is_some() && ctx.event.is_some_and(|e| e.source == ctx.source)
            }
            Self::EventTargetIsSelf => {
                ctx.source.is_some() && ctx.event.is_some_and(|e| e.target == ctx.source)
            }
            Self::EventPlayerIs(relation) => {
                ctx.event.is_some_and(|e| ctx.relates(*relation, e.player))
            }
            Self::EventSourceCardType(card_type) => ctx
                .event
                .and_then(|e| e.source)
                .is_some_and(|s| state.card_type(s) == Some(*card_type)),
            Self::EventTargetCardType(card_type) => ctx
                .event
                .and_then(|e| e.target)
                .is_some_and(|t| state.card_type(t) == Some(*card_type)),
            Self::EventHasTag(tag) => ctx.event.is_some_and(|e| e.has_tag(tag)),
            Self::EventValueAtLeast { index, min } => {
                ctx.event.is_some_and(|e| e.value(*index, i64::MIN) >= *min)
            }

            Self::SubjectHasFlag(flag) => ctx.subject.is_some_and(|s| state.has_flag(s, flag)),
            Self::SubjectHasTrait(name) => ctx.subject.is_some_and(|s| state.has_trait(s, name)),
            Self::SubjectHasKeyword(name) => ctx.subject.is_some_and(|s| state.has_keyword(s, name)),
            Self::SubjectCardType(card_type) => {
                ctx.subject.is_some_and(|s| state.card_type(s) == Some(*card_type))
            }
            Self::SubjectControlledBy(relation) => {
                ctx.subject.is_some_and(|s| ctx.relates(*relation, state.controller_of(s)))
            }
            Self::SubjectInZone(zone) => ctx.subject.is_some_and(|s| state.zones.is_in_zone(s, *zone)),
            Self::SubjectInPlay => ctx.subject.is_some_and(|s| state.is_in_play(s)),
            Self::SubjectAttr { key, cmp, value } => {
                ctx.subject.is_some_and(|s| cmp.apply(state.get_value(s, key), *value))
            }
            Self::SubjectParticipating(side) => {
                ctx.subject.is_some_and(|s| state.conflict().is_participating(s, *side))
            }

            Self::SourceInPlay => ctx.source.is_some_and(|s| state.is_in_play(s)),
            Self::SourceHasFlag(flag) => ctx.source.is_some_and(|s| state.has_flag(s, flag)),
            Self::SourceAttr { key, cmp, value } => {
                ctx.source.is_some_and(|s| cmp.apply(state.get_value(s, key), *value))
            }
            Self::SourceControlledBy(relation) => {
                ctx.source.is_some_and(|s| ctx.relates(*relation, state.controller_of(s)))
            }
            Self::SourceParticipating(side) => {
                ctx.source.is_some_and(|s| state.conflict().is_participating(s, *side))
            }

            Self::ConflictWinner(relation) => {
                let conflict = state.conflict();
                conflict.winner.is_some() && ctx.relates(*relation, conflict.winner)
            }
            Self::ConflictLoser(relation) => {
                let conflict = state.conflict();
                conflict.loser.is_some() && ctx.relates(*relation, conflict.loser)
            }
            Self::ConflictType(name) => {
                let conflict = state.conflict();
                conflict.active && conflict.conflict_type == *name
            }
            Self::InConflict => state.conflict().active,

            Self::PlayerState { key, cmp, value } => ctx.player.is_some_and(|p| {
                cmp.apply(state.get_value(EntityId::player(p), key), *value)
            }),
            Self::Phase(phase) => state.public.phase == *phase,

            Self::Custom(name) => state.config().condition(name).is_some_and(|f| f(ctx)),
        }
    }
}

/// Context for evaluating a condition.
///
/// ```
/// use ccg_rules::core::{GameConfig, GameState, EntityId};
/// use ccg_rules::triggers::{Condition, ConditionContext};
///
/// let state = GameState::new(GameConfig::new(2), 42);
/// let ctx = ConditionContext::new(&state).with_subject(EntityId(0));
/// assert!(Condition::SubjectInPlay.evaluate(&ctx));
/// ```
#[derive(Clone, Copy)]
pub struct ConditionContext<'a> {
    pub state: &'a GameState,
    /// The event being dispatched, if any.
    pub event: Option<&'a GameEvent>,
    /// The card (or player) owning the ability, effect or reducer.
    pub source: Option<EntityId>,
    /// The player relations are measured from.
    pub player: Option<PlayerId>,
    /// The entity being tested (target candidate, effect target).
    pub subject: Option<EntityId>,
}

impl<'a> ConditionContext<'a> {
    pub fn new(state: &'a GameState) -> Self {
        Self {
            state,
            event: None,
            source: None,
            player: None,
            subject: None,
        }
    }

    #[must_use]
    pub fn with_event(mut self, event: &'a GameEvent) -> Self {
        self.event = Some(event);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: EntityId) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Whether `candidate` stands in `relation` to the context player.
    /// Without a context player only `Any` matches.
    #[must_use]
    pub fn relates(&self, relation: PlayerRelation, candidate: Option<PlayerId>) -> bool {
        match self.player {
            Some(player) => relation.matches(player, candidate),
            None => relation == PlayerRelation::Any,
        }
    }
}

impl std::fmt::Debug for ConditionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionContext")
            .field("event", &self.event.map(|e| e.id))
            .field("source", &self.source)
            .field("player", &self.player)
            .field("subject", &self.subject)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, CardInstance};
    use crate::core::{ConflictDeclaration, ZoneConfig, ZoneRole};

    const PLAY: ZoneId = ZoneId(0);
    const HAND: ZoneId = ZoneId(1);

    fn high_honor(ctx: &ConditionContext<'_>) -> bool {
        ctx.player.is_some_and(|p| ctx.state.public.get_player_state(p, "honor", 0) >= 10)
    }

    fn test_state() -> GameState {
        let config = GameConfig::new(2)
            .with_zone(ZoneConfig::new(PLAY, "Play").with_role(ZoneRole::Play).in_play())
            .with_zone(ZoneConfig::new(HAND, "Hand").with_role(ZoneRole::Hand))
            .with_condition("high-honor", high_honor);
        GameState::new(config, 42)
    }

    fn add_card(state: &mut GameState, owner: u8, zone: ZoneId) -> EntityId {
        let entity = state.alloc_entity();
        let mut card = CardInstance::new(entity, CardId::new(1), PlayerId::new(owner), zone);
        card.card_type = CardTypeId::new(3);
        card.traits.push("bushi".into());
        card.set_state("military", 2);
        state.add_card(card);
        entity
    }

    #[test]
    fn test_event_type_condition() {
        let state = test_state();
        let event = GameEvent::new(EventTypeId::new(5));
        let ctx = ConditionContext::new(&state).with_event(&event);

        assert!(Condition::EventType(EventTypeId::new(5)).evaluate(&ctx));
        assert!(!Condition::EventType(EventTypeId::new(10)).evaluate(&ctx));
        assert!(Condition::AnyEventType(vec![EventTypeId::new(1), EventTypeId::new(5)]).evaluate(&ctx));

        // No event in context
        let bare = ConditionContext::new(&state);
        assert!(!Condition::EventType(EventTypeId::new(5)).evaluate(&bare));
    }

    #[test]
    fn test_self_relative_event_conditions() {
        let state = test_state();
        let event = GameEvent::new(EventTypeId::new(1))
            .with_source(EntityId(10))
            .with_target(EntityId(20));

        let ctx = ConditionContext::new(&state).with_event(&event).with_source(EntityId(20));
        assert!(Condition::EventTargetIsSelf.evaluate(&ctx));
        assert!(!Condition::EventSourceIsSelf.evaluate(&ctx));
        assert!(Condition::EventSourceIs(EntityId(10)).evaluate(&ctx));
    }

    #[test]
    fn test_event_player_relation() {
        let state = test_state();
        let event = GameEvent::for_player(EventTypeId::new(1), PlayerId::new(1));

        let mine = ConditionContext::new(&state).with_event(&event).with_player(PlayerId::new(1));
        let theirs = ConditionContext::new(&state).with_event(&event).with_player(PlayerId::new(0));

        assert!(Condition::EventPlayerIs(PlayerRelation::Self_).evaluate(&mine));
        assert!(Condition::EventPlayerIs(PlayerRelation::Opponent).evaluate(&theirs));
        assert!(!Condition::EventPlayerIs(PlayerRelation::Self_).evaluate(&theirs));
    }

    #[test]
    fn test_subject_conditions() {
        let mut state = test_state();
        let card = add_card(&mut state, 1, PLAY);
        let in_hand = add_card(&mut state, 0, HAND);

        let ctx = ConditionContext::new(&state).with_player(PlayerId::new(0)).with_subject(card);
        assert!(Condition::SubjectInPlay.evaluate(&ctx));
        assert!(Condition::SubjectHasTrait("bushi".into()).evaluate(&ctx));
        assert!(Condition::SubjectCardType(CardTypeId::new(3)).evaluate(&ctx));
        assert!(Condition::SubjectControlledBy(PlayerRelation::Opponent).evaluate(&ctx));
        assert!(Condition::subject_attr("military", Cmp::Ge, 2).evaluate(&ctx));
        assert!(!Condition::subject_attr("military", Cmp::Gt, 2).evaluate(&ctx));
        assert!(!Condition::SubjectHasFlag("bowed".into()).evaluate(&ctx));

        let hand_ctx = ctx.with_subject(in_hand);
        assert!(!Condition::SubjectInPlay.evaluate(&hand_ctx));
        assert!(Condition::SubjectInZone(HAND).evaluate(&hand_ctx));
    }

    #[test]
    fn test_conflict_conditions() {
        let mut state = test_state();
        let card = add_card(&mut state, 0, PLAY);
        {
            let conflict = state.conflict_mut();
            let decl = ConflictDeclaration::new(PlayerId::new(0), PlayerId::new(1), "military")
                .with_attacker(card);
            conflict.active = true;
            conflict.conflict_type = decl.conflict_type;
            conflict.attackers = decl.attackers;
            conflict.winner = Some(PlayerId::new(0));
            conflict.loser = Some(PlayerId::new(1));
        }

        let ctx = ConditionContext::new(&state).with_player(PlayerId::new(0)).with_source(card);
        assert!(Condition::InConflict.evaluate(&ctx));
        assert!(Condition::ConflictType("military".into()).evaluate(&ctx));
        assert!(Condition::ConflictWinner(PlayerRelation::Self_).evaluate(&ctx));
        assert!(Condition::ConflictLoser(PlayerRelation::Opponent).evaluate(&ctx));
        assert!(Condition::SourceParticipating(Side::Attacking).evaluate(&ctx));
        assert!(!Condition::SourceParticipating(Side::Defending).evaluate(&ctx));
    }

    #[test]
    fn test_combinators() {
        let state = test_state();
        let event = GameEvent::new(EventTypeId::new(1)).with_value(5).with_tag("military");
        let ctx = ConditionContext::new(&state).with_event(&event);

        let all_true = Condition::all([
            Condition::EventType(EventTypeId::new(1)),
            Condition::EventHasTag("military".into()),
        ]);
        assert!(all_true.evaluate(&ctx));

        let all_mixed = Condition::EventType(EventTypeId::new(1)).and(Condition::EventHasTag("political".into()));
        assert!(!all_mixed.evaluate(&ctx));

        let any_true = Condition::EventType(EventTypeId::new(99)).or(Condition::EventValueAtLeast { index: 0, min: 5 });
        assert!(any_true.evaluate(&ctx));

        assert!(Condition::EventType(EventTypeId::new(99)).negate().evaluate(&ctx));
        assert!(Condition::Always.evaluate(&ctx));
        assert!(!Condition::Never.evaluate(&ctx));
        assert_eq!(Condition::Always.and(Condition::InConflict), Condition::InConflict);
    }

    #[test]
    fn test_custom_condition() {
        let mut state = test_state();
        state.public.set_player_state(PlayerId::new(0), "honor", 12);

        let rich = ConditionContext::new(&state).with_player(PlayerId::new(0));
        let poor = ConditionContext::new(&state).with_player(PlayerId::new(1));
        assert!(Condition::custom("high-honor").evaluate(&rich));
        assert!(!Condition::custom("high-honor").evaluate(&poor));
        assert!(!Condition::custom("unregistered").evaluate(&rich));
    }

    #[test]
    fn test_validate_custom_names() {
        let state = test_state();
        let nested = Condition::all([Condition::InConflict, Condition::custom("high-honor").negate()]);
        assert!(nested.validate(state.config()).is_ok());

        let missing = Condition::any([Condition::Never, Condition::custom("favor")]);
        assert_eq!(
            missing.validate(state.config()),
            Err(ConfigError::UnknownCondition("favor".into()))
        );
    }

    #[test]
    fn test_condition_serialization() {
        let condition = Condition::all([
            Condition::EventType(EventTypeId::new(1)),
            Condition::subject_attr("glory", Cmp::Ge, 2),
            Condition::SubjectControlledBy(PlayerRelation::Self_),
        ]);

        let json = serde_json::to_string(&condition).unwrap();
        let deserialized: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(condition, deserialized);
    }
}
