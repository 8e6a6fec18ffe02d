//! Delayed effect and terminal condition integration tests.

mod common;

use ccg_rules::abilities::{AbilityDescriptor, ActionStep, ActionTarget};
use ccg_rules::actions::GameAction;
use ccg_rules::cards::{CardDefinition, CardId};
use ccg_rules::core::EntityId;
use ccg_rules::effects::EffectBuilder;
use ccg_rules::stack::ResolutionOutcome;
use ccg_rules::triggers::{Cmp, Condition};

use common::cards::*;
use common::*;

const ORACLE: CardId = CardId(100);

/// Registry with an extra card whose ability waits for its controller to
/// reach 12 honor, then gives them 3 fate.
fn oracle_registry() -> ccg_rules::CardRegistry {
    let mut registry = registry();
    registry
        .register(
            CardDefinition::new(ORACLE, "Oracle", HOLDING).with_ability(
                AbilityDescriptor::new("Foresee").with_step(
                    GameAction::ApplyEffect(EffectBuilder::terminal_condition(
                        Condition::PlayerState {
                            key: "honor".into(),
                            cmp: Cmp::Ge,
                            value: 12,
                        },
                        vec![ActionStep::new(GameAction::modify_player("fate", 3), ActionTarget::Controller)],
                    )),
                    ActionTarget::Source,
                ),
            ),
        )
        .unwrap();
    registry
}

fn gain_honor(game: &mut ccg_rules::Game, amount: i64) {
    let player = EntityId::player(P0);
    game.perform(P0, player, GameAction::modify_player("honor", amount), player)
        .unwrap();
}

// =============================================================================
// Delayed effects
// =============================================================================

/// Test that a delayed effect waits for its event and fires exactly once.
#[test]
fn test_delayed_effect_fires_once() {
    let mut game = game();
    let shrine = put(&mut game, SHRINE, P0);

    game.initiate(P0, ability(&game, shrine, "Invoke")).unwrap();
    assert_eq!(game.last_outcome(), Some(ResolutionOutcome::Completed));
    assert_eq!(game.state().delayed.len(), 1);
    assert_eq!(fate(&game, P0), STARTING_FATE);

    claim(&mut game, P0, "air");
    assert_eq!(fate(&game, P0), STARTING_FATE);
    assert_eq!(game.state().delayed.len(), 1);

    claim(&mut game, P1, "fire");
    // The controller of the delayed effect gains, whoever claimed.
    assert_eq!(fate(&game, P0), STARTING_FATE + 2);
    assert_eq!(fate(&game, P1), STARTING_FATE);
    assert!(game.state().delayed.is_empty());

    game.end_round().unwrap();
    claim(&mut game, P0, "fire");
    assert_eq!(fate(&game, P0), STARTING_FATE + 2);
}

/// Test that the effect hosting a delayed effect is cleared once it fires.
#[test]
fn test_fired_delayed_effect_leaves_no_host() {
    let mut game = game();
    let shrine = put(&mut game, SHRINE, P0);
    let before = game.state().effects.len();

    game.initiate(P0, ability(&game, shrine, "Invoke")).unwrap();
    assert_eq!(game.state().effects.len(), before + 1);

    claim(&mut game, P1, "fire");
    assert_eq!(fate(&game, P0), STARTING_FATE + 2);
    assert_eq!(game.state().effects.len(), before);
    assert_eq!(game.state().effects.active_count(), 0);
}

/// Test that a delayed effect is abandoned when its source leaves play.
#[test]
fn test_delayed_effect_abandoned_with_source() {
    let mut game = game();
    let shrine = put(&mut game, SHRINE, P0);
    game.initiate(P0, ability(&game, shrine, "Invoke")).unwrap();
    assert_eq!(game.state().delayed.len(), 1);

    game.perform(P0, EntityId::player(P0), GameAction::Discard, shrine).unwrap();
    assert!(game.state().delayed.is_empty());

    claim(&mut game, P0, "fire");
    assert_eq!(fate(&game, P0), STARTING_FATE);
}

/// Test that invoking twice registers two independent entries that fire on
/// the same event.
#[test]
fn test_two_delayed_effects_fire_together() {
    let mut game = game();
    let shrine = put(&mut game, SHRINE, P0);
    let invoke = ability(&game, shrine, "Invoke");
    game.initiate(P0, invoke).unwrap();
    game.initiate(P0, invoke).unwrap();
    assert_eq!(game.state().delayed.len(), 2);

    claim(&mut game, P0, "fire");
    assert_eq!(fate(&game, P0), STARTING_FATE + 4);
    assert!(game.state().delayed.is_empty());
    assert_eq!(game.state().effects.len(), 0);
}

// =============================================================================
// Terminal conditions
// =============================================================================

/// Test that a terminal condition fires as soon as the state satisfies it.
#[test]
fn test_terminal_condition_fires_on_state() {
    let mut game = game_with(oracle_registry());
    let oracle = put(&mut game, ORACLE, P0);
    game.initiate(P0, ability(&game, oracle, "Foresee")).unwrap();
    assert_eq!(game.state().delayed.len(), 1);

    gain_honor(&mut game, 1);
    assert_eq!(fate(&game, P0), STARTING_FATE);

    gain_honor(&mut game, 1);
    assert_eq!(honor(&game, P0), 12);
    assert_eq!(fate(&game, P0), STARTING_FATE + 3);
    assert!(game.state().delayed.is_empty());
    assert_eq!(game.state().effects.len(), 0);

    gain_honor(&mut game, 1);
    assert_eq!(fate(&game, P0), STARTING_FATE + 3);
}
