//! Shared sample card set for integration tests.
//!
//! A two-player table with a shared play area and discard pile, per-player
//! decks and hands, and three rings. Every player starts with 5 fate and
//! 10 honor.

#![allow(dead_code)]

use ccg_rules::abilities::{AbilityDescriptor, AbilityLimit, ActionTarget, Cost};
use ccg_rules::actions::{GameAction, TargetDescriptor};
use ccg_rules::cards::{CardDefinition, CardId, CardRegistry, CardTypeId};
use ccg_rules::core::{EntityId, GameConfig, PlayerId, PlayerRelation, ZoneConfig, ZoneId, ZoneRole};
use ccg_rules::effects::{Amount, Duration, EffectBuilder};
use ccg_rules::stack::HandlerContext;
use ccg_rules::triggers::{events, Condition};
use ccg_rules::{ActionStep, Game};

pub const PLAY: ZoneId = ZoneId(0);
pub const DISCARD: ZoneId = ZoneId(1);
pub const DECK: [ZoneId; 2] = [ZoneId(2), ZoneId(3)];
pub const HAND: [ZoneId; 2] = [ZoneId(4), ZoneId(5)];

pub const CHARACTER: CardTypeId = CardTypeId(1);
pub const HOLDING: CardTypeId = CardTypeId(2);

pub const P0: PlayerId = PlayerId(0);
pub const P1: PlayerId = PlayerId(1);

pub const STARTING_FATE: i64 = 5;
pub const STARTING_HONOR: i64 = 10;

/// Card ids of the sample set.
pub mod cards {
    use ccg_rules::cards::CardId;

    /// Vanilla character: military 2, political 1.
    pub const ASHIGARU: CardId = CardId(1);
    /// Persistent: friendly characters get +1 military.
    pub const BANNER: CardId = CardId(2);
    /// Persistent: the first ability its controller pays for costs 1 less.
    pub const PATRON: CardId = CardId(3);
    /// Action, 1 fate: bow a character.
    pub const COURIER: CardId = CardId(4);
    /// Action: a friendly character gains "Rally" while this is in play.
    pub const MENTOR: CardId = CardId(5);
    /// Would-interrupt: cancel this character being bowed.
    pub const WARDEN: CardId = CardId(6);
    /// Reaction: after a ring is claimed, gain 1 fate.
    pub const GATHERER: CardId = CardId(7);
    /// Reaction: after a ring is claimed, gain honor equal to your fate.
    pub const SCHOLAR: CardId = CardId(8);
    /// Action: the next time the fire ring is claimed, gain 2 fate.
    pub const SHRINE: CardId = CardId(9);
    /// Action: honor or dishonor a character.
    pub const MAGISTRATE: CardId = CardId(10);
    /// Action, shuffle a character into its deck: gain 1 honor.
    pub const CULTIST: CardId = CardId(11);
    /// Action, sacrifice this: honor a friendly character.
    pub const MARTYR: CardId = CardId(12);
    /// Action, 1 fate, targets first: bow an opposing character.
    pub const DUELIST: CardId = CardId(13);
    /// Action: bow a character and give it -2 military until end of phase.
    pub const ENFORCER: CardId = CardId(14);
    /// Reaction: after a character is bowed, gain 1 honor.
    pub const AVENGER: CardId = CardId(15);
    /// Action, once per round: gain 1 honor.
    pub const DOJO: CardId = CardId(16);
    /// Dojo whose limit is raised by one.
    pub const GRAND_DOJO: CardId = CardId(17);
    /// Optional reaction: after a ring is claimed, gain 1 honor.
    pub const POET: CardId = CardId(18);
}

pub const RALLY: &str = "Rally";

/// Set up logging for a test run; `RUST_LOG` controls the filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config() -> GameConfig {
    let mut config = GameConfig::new(2)
        .with_zone(ZoneConfig::new(PLAY, "Play").with_role(ZoneRole::Play).in_play())
        .with_zone(ZoneConfig::new(DISCARD, "Discard").with_role(ZoneRole::Discard));
    for player in PlayerId::all(2) {
        config = config
            .with_zone(
                ZoneConfig::new(DECK[player.index()], format!("Deck {player}"))
                    .with_owner(player)
                    .with_role(ZoneRole::Deck)
                    .ordered(),
            )
            .with_zone(
                ZoneConfig::new(HAND[player.index()], format!("Hand {player}"))
                    .with_owner(player)
                    .with_role(ZoneRole::Hand),
            );
    }
    config.with_ring("air").with_ring("fire").with_ring("water")
}

fn gain(key: &str, amount: i64) -> GameAction {
    GameAction::modify_player(key, amount)
}

fn dedicate(ctx: &mut HandlerContext<'_>) {
    let from_play = ctx.cost_cards().iter().filter(|(_, zone)| *zone == PLAY).count();
    if from_play > 0 {
        let player = EntityId::player(ctx.player);
        ctx.queue(gain("honor", 1), [player]);
    }
}

fn character(id: CardId, name: &str) -> CardDefinition {
    CardDefinition::new(id, name, CHARACTER)
        .with_stat("military", 2)
        .with_stat("political", 1)
}

fn holding(id: CardId, name: &str) -> CardDefinition {
    CardDefinition::new(id, name, HOLDING)
}

pub fn definitions() -> Vec<CardDefinition> {
    use cards::*;

    let rally = AbilityDescriptor::reaction(RALLY, events::HONORED, Condition::EventTargetIsSelf)
        .with_step(gain("fate", 1), ActionTarget::Controller);

    vec![
        character(ASHIGARU, "Ashigaru"),
        holding(BANNER, "Banner").with_ability(AbilityDescriptor::persistent(
            "Rally the troops",
            EffectBuilder::modify("military", 1).matching(
                ccg_rules::core::EntityKind::Card,
                Condition::all([
                    Condition::SubjectCardType(CHARACTER),
                    Condition::SubjectControlledBy(PlayerRelation::Self_),
                ]),
            ),
        )),
        holding(PATRON, "Patron").with_ability(AbilityDescriptor::persistent(
            "Patronage",
            EffectBuilder::reduce_cost_limited(1, Condition::Always, AbilityLimit::fixed(1)),
        )),
        holding(COURIER, "Courier").with_ability(
            AbilityDescriptor::new("Deliver orders")
                .with_cost(Cost::PayResource { amount: 1 })
                .with_target(TargetDescriptor::card("character").of_type(CHARACTER).with_action(GameAction::Bow)),
        ),
        holding(MENTOR, "Mentor").with_ability(
            AbilityDescriptor::new("Inspire").with_target(
                TargetDescriptor::card("character")
                    .of_type(CHARACTER)
                    .controlled_by(PlayerRelation::Self_)
                    .with_action(GameAction::grant(rally, Duration::Persistent)),
            ),
        ),
        character(WARDEN, "Warden").with_ability(
            AbilityDescriptor::would_interrupt("Deflect", events::BOWED, Condition::EventTargetIsSelf)
                .with_step(GameAction::CancelEvent, ActionTarget::Source),
        ),
        holding(GATHERER, "Gatherer").with_ability(
            AbilityDescriptor::reaction("Gather", events::RING_CLAIMED, Condition::Always)
                .with_step(gain("fate", 1), ActionTarget::Controller),
        ),
        holding(SCHOLAR, "Scholar").with_ability(
            AbilityDescriptor::reaction("Study", events::RING_CLAIMED, Condition::Always).with_step(
                GameAction::ModifyPlayerState {
                    key: "honor".into(),
                    amount: Amount::ControllerState("fate".into()),
                },
                ActionTarget::Controller,
            ),
        ),
        holding(SHRINE, "Shrine").with_ability(AbilityDescriptor::new("Invoke").with_step(
            GameAction::ApplyEffect(EffectBuilder::delayed_effect(
                Condition::all([Condition::EventType(events::RING_CLAIMED), Condition::EventHasTag("fire".into())]),
                vec![ActionStep::new(gain("fate", 2), ActionTarget::Controller)],
            )),
            ActionTarget::Source,
        )),
        holding(MAGISTRATE, "Magistrate").with_ability(
            AbilityDescriptor::new("Judge")
                .with_target(TargetDescriptor::card("character").of_type(CHARACTER))
                .with_step(
                    GameAction::choose([("Honor", GameAction::Honor), ("Dishonor", GameAction::Dishonor)]),
                    ActionTarget::Targets,
                ),
        ),
        holding(CULTIST, "Cultist").with_ability(
            AbilityDescriptor::new("Dedication")
                .with_cost(Cost::ShuffleIntoDeck {
                    condition: Condition::SubjectCardType(CHARACTER),
                })
                .with_handler(dedicate),
        ),
        character(MARTYR, "Martyr").with_ability(
            AbilityDescriptor::new("Last stand").with_cost(Cost::SacrificeSelf).with_target(
                TargetDescriptor::card("character")
                    .of_type(CHARACTER)
                    .controlled_by(PlayerRelation::Self_)
                    .with_action(GameAction::Honor),
            ),
        ),
        holding(DUELIST, "Duelist").with_ability(
            AbilityDescriptor::new("Challenge")
                .with_cost(Cost::PayResource { amount: 1 })
                .with_target(
                    TargetDescriptor::card("character")
                        .of_type(CHARACTER)
                        .controlled_by(PlayerRelation::Opponent)
                        .with_action(GameAction::Bow),
                )
                .target_first(),
        ),
        holding(ENFORCER, "Enforcer").with_ability(
            AbilityDescriptor::new("Intimidate")
                .with_target(TargetDescriptor::card("character").of_type(CHARACTER).with_action(GameAction::Bow))
                .with_step(
                    GameAction::ApplyEffect(EffectBuilder::modify("military", -2).until_end_of_phase()),
                    ActionTarget::Named("character".into()),
                ),
        ),
        holding(AVENGER, "Avenger").with_ability(
            AbilityDescriptor::reaction("Avenge", events::BOWED, Condition::Always)
                .with_step(gain("honor", 1), ActionTarget::Controller),
        ),
        holding(DOJO, "Dojo").with_ability(
            AbilityDescriptor::new("Train")
                .with_step(gain("honor", 1), ActionTarget::Controller)
                .with_limit(AbilityLimit::per_round(1)),
        ),
        holding(GRAND_DOJO, "Grand Dojo")
            .with_ability(
                AbilityDescriptor::new("Train")
                    .with_step(gain("honor", 1), ActionTarget::Controller)
                    .with_limit(AbilityLimit::per_round(1)),
            )
            .with_ability(AbilityDescriptor::persistent(
                "Discipline",
                EffectBuilder::modify("ability-limit-bonus", 1),
            )),
        holding(POET, "Poet").with_ability(
            AbilityDescriptor::reaction("Recite", events::RING_CLAIMED, Condition::Always)
                .optional()
                .with_step(gain("honor", 1), ActionTarget::Controller),
        ),
    ]
}

pub fn registry() -> CardRegistry {
    let mut registry = CardRegistry::new();
    for card in definitions() {
        registry.register(card).unwrap();
    }
    registry
}

/// A fresh game with the sample set and starting resources.
pub fn game() -> Game {
    game_with(registry())
}

pub fn game_with(registry: CardRegistry) -> Game {
    init_tracing();
    let mut game = Game::new(config(), registry, 42).unwrap();
    for player in PlayerId::all(2) {
        let public = &mut game.state_mut().public;
        public.set_player_state(player, "fate", STARTING_FATE);
        public.set_player_state(player, "honor", STARTING_HONOR);
    }
    game
}

/// Put a card into play under `owner`.
pub fn put(game: &mut Game, card: CardId, owner: PlayerId) -> EntityId {
    game.create_card(card, Some(owner), PLAY).unwrap()
}

pub fn fate(game: &Game, player: PlayerId) -> i64 {
    game.value(EntityId::player(player), "fate")
}

pub fn honor(game: &Game, player: PlayerId) -> i64 {
    game.value(EntityId::player(player), "honor")
}

/// The ability with `title` on `entity`.
pub fn ability(game: &Game, entity: EntityId, title: &str) -> ccg_rules::abilities::AbilityId {
    game.ability_by_title(entity, title).unwrap()
}

/// Claim a ring for `player` outside any ability.
pub fn claim(game: &mut Game, player: PlayerId, element: &str) -> ccg_rules::ResolutionStatus {
    let ring = game.state().ring_by_element(element).unwrap();
    game.perform(player, EntityId::player(player), GameAction::ClaimRing, ring).unwrap()
}

/// Count finalized events of one type.
pub fn count_events(game: &Game, event_type: ccg_rules::triggers::EventTypeId) -> usize {
    game.state()
        .public
        .event_log
        .iter()
        .filter(|e| e.event_type == event_type)
        .count()
}
