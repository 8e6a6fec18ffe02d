//! Ability resolution pipeline integration tests.
//!
//! These tests drive whole resolutions through the `Game` facade: legality,
//! cost payment with reducers, target selection, prompts, handlers,
//! cancellation and the commitment point at cost payment.

mod common;

use ccg_rules::abilities::AbilityType;
use ccg_rules::actions::TargetDescriptor;
use ccg_rules::core::{EntityId, PlayerRelation};
use ccg_rules::stack::{AbortReason, PromptKind, ResolutionOutcome, ResolutionStatus};
use ccg_rules::triggers::{events, Condition};
use ccg_rules::{
    AbilityDescriptor, ActionTarget, CardDefinition, CardId, CardRegistry, Cost, EngineError, Game, GameAction,
};

use common::cards::*;
use common::*;

// =============================================================================
// Costs and reducers
// =============================================================================

/// Test that a matching single-use reducer makes the first activation free
/// and is spent, so the second pays the full cost.
#[test]
fn test_reducer_consumed_once() {
    let mut game = game();
    put(&mut game, PATRON, P0);
    let courier = put(&mut game, COURIER, P0);
    let target = put(&mut game, ASHIGARU, P1);
    let orders = ability(&game, courier, "Deliver orders");

    let status = game.initiate(P0, orders).unwrap();
    assert_eq!(status, ResolutionStatus::Complete);
    assert_eq!(game.last_outcome(), Some(ResolutionOutcome::Completed));
    assert!(game.has_flag(target, "bowed"));
    assert_eq!(fate(&game, P0), STARTING_FATE);

    let reducer = game.state().reducers.for_player(P0).next().unwrap();
    let key = reducer.limit.as_ref().unwrap();
    assert_eq!(game.state().limits.get(key).unwrap().used, 1);

    game.perform(P0, EntityId::player(P0), GameAction::Ready, target).unwrap();
    game.initiate(P0, orders).unwrap();
    assert_eq!(game.last_outcome(), Some(ResolutionOutcome::Completed));
    assert_eq!(fate(&game, P0), STARTING_FATE - 1);
}

/// Test that an unpayable ability aborts before anything changes.
#[test]
fn test_unpayable_cost_changes_nothing() {
    let mut game = game();
    let courier = put(&mut game, COURIER, P0);
    let target = put(&mut game, ASHIGARU, P1);
    game.state_mut().public.set_player_state(P0, "fate", 0);
    let log_before = game.state().public.event_log.len();

    let orders = ability(&game, courier, "Deliver orders");
    assert!(!game.legal_actions(P0).contains(&orders));

    game.initiate(P0, orders).unwrap();
    assert_eq!(
        game.last_outcome(),
        Some(ResolutionOutcome::Aborted(AbortReason::CannotPayCosts))
    );
    assert_eq!(fate(&game, P0), 0);
    assert!(!game.has_flag(target, "bowed"));
    assert_eq!(game.state().public.event_log.len(), log_before);
}

/// Test that a cost paid before the targets vanish is not refunded.
#[test]
fn test_no_refund_after_commitment() {
    let mut game = game();
    let martyr = put(&mut game, MARTYR, P0);
    let stand = ability(&game, martyr, "Last stand");
    assert!(game.legal_actions(P0).contains(&stand));

    game.initiate(P0, stand).unwrap();

    assert_eq!(
        game.last_outcome(),
        Some(ResolutionOutcome::Aborted(AbortReason::NoLegalTargets))
    );
    assert!(!game.state().is_in_play(martyr));
    assert_eq!(game.state().zones.get_zone(martyr), Some(DISCARD));
    assert_eq!(count_events(&game, events::SACRIFICED), 1);
    assert_eq!(count_events(&game, events::HONORED), 0);
}

const SENTRY: CardId = CardId(101);
const RAIDER: CardId = CardId(102);
const ALARM: CardId = CardId(103);

fn opposing_character(name: &str) -> TargetDescriptor {
    TargetDescriptor::card(name)
        .of_type(CHARACTER)
        .controlled_by(PlayerRelation::Opponent)
        .with_action(GameAction::Bow)
}

/// The sample set plus:
/// - Sentry, a character that bows itself after an opponent pays a cost;
/// - Raider, an action for 1 fate, targets first, bowing two opposing characters;
/// - Alarm, a holding whose controller gains 1 honor after any cost is paid.
fn watch_registry() -> CardRegistry {
    let mut registry = registry();
    let sentry = CardDefinition::new(SENTRY, "Sentry", CHARACTER).with_ability(
        AbilityDescriptor::reaction("Brace", events::COST_PAID, Condition::EventPlayerIs(PlayerRelation::Opponent))
            .with_step(GameAction::Bow, ActionTarget::Source),
    );
    let raider = CardDefinition::new(RAIDER, "Raider", HOLDING).with_ability(
        AbilityDescriptor::new("Raid")
            .with_cost(Cost::PayResource { amount: 1 })
            .with_target(opposing_character("first"))
            .with_target(opposing_character("second"))
            .target_first(),
    );
    let alarm = CardDefinition::new(ALARM, "Alarm", HOLDING).with_ability(
        AbilityDescriptor::reaction("Sound", events::COST_PAID, Condition::Always)
            .with_step(GameAction::modify_player("honor", 1), ActionTarget::Controller),
    );
    for card in [sentry, raider, alarm] {
        registry.register(card).unwrap();
    }
    registry
}

/// Start a targets-first resolution and pick each named target in order.
fn choose_targets_first(game: &mut Game, ability: ccg_rules::abilities::AbilityId, picks: &[&str]) {
    game.initiate(P0, ability).unwrap();
    game.respond_with(P0, "Choose targets first").unwrap();
    for pick in picks {
        game.respond_with(P0, pick).unwrap();
    }
}

/// Test that a target lost while costs are paid is dropped and the ability
/// still resolves against the target that remains.
#[test]
fn test_lost_target_dropped_after_costs() {
    let mut game = game_with(watch_registry());
    let raider = put(&mut game, RAIDER, P0);
    let sentry = put(&mut game, SENTRY, P1);
    let ashigaru = put(&mut game, ASHIGARU, P1);

    let raid = ability(&game, raider, "Raid");
    choose_targets_first(&mut game, raid, &["Sentry", "Ashigaru"]);

    assert_eq!(game.last_outcome(), Some(ResolutionOutcome::Completed));
    assert_eq!(fate(&game, P0), STARTING_FATE - 1);
    assert!(game.has_flag(ashigaru, "bowed"));
    // Bowed by its own reaction, not by the raid.
    assert!(game.has_flag(sentry, "bowed"));
    assert_eq!(count_events(&game, events::BOWED), 2);
}

/// Test that losing the only required target after costs aborts without a refund.
#[test]
fn test_every_target_lost_after_costs() {
    let mut game = game_with(watch_registry());
    let duelist = put(&mut game, DUELIST, P0);
    let sentry = put(&mut game, SENTRY, P1);

    let challenge = ability(&game, duelist, "Challenge");
    choose_targets_first(&mut game, challenge, &[]);

    assert_eq!(
        game.last_outcome(),
        Some(ResolutionOutcome::Aborted(AbortReason::NoLegalTargets))
    );
    assert_eq!(fate(&game, P0), STARTING_FATE - 1);
    assert!(game.has_flag(sentry, "bowed"));
    assert_eq!(count_events(&game, events::BOWED), 1);
}

/// Test that a reaction to paid costs fires once per payment, and that its
/// own cost-free resolution raises no further payment.
#[test]
fn test_cost_free_reaction_to_payment_fires_once() {
    let mut game = game_with(watch_registry());
    let courier = put(&mut game, COURIER, P0);
    put(&mut game, ALARM, P1);
    let target = put(&mut game, ASHIGARU, P1);

    let status = game.initiate(P0, ability(&game, courier, "Deliver orders")).unwrap();

    assert_eq!(status, ResolutionStatus::Complete);
    assert!(!game.is_resolving());
    assert!(game.has_flag(target, "bowed"));
    assert_eq!(honor(&game, P1), STARTING_HONOR + 1);
    assert_eq!(count_events(&game, events::COST_PAID), 1);
}

/// Test that a handler sees where its cost card came from.
#[test]
fn test_handler_reads_cost_origin() {
    let mut game = game();
    let cultist = put(&mut game, CULTIST, P0);
    let ashigaru = put(&mut game, ASHIGARU, P0);
    put(&mut game, ASHIGARU, P1);

    game.initiate(P0, ability(&game, cultist, "Dedication")).unwrap();

    assert_eq!(game.last_outcome(), Some(ResolutionOutcome::Completed));
    assert_eq!(game.state().zones.get_zone(ashigaru), Some(DECK[0]));
    assert_eq!(honor(&game, P0), STARTING_HONOR + 1);
}

/// Test that a cost with several candidates prompts for one.
#[test]
fn test_cost_choice_prompts() {
    let mut game = game();
    let cultist = put(&mut game, CULTIST, P0);
    let first = put(&mut game, ASHIGARU, P0);
    let second = put(&mut game, ASHIGARU, P0);

    let status = game.initiate(P0, ability(&game, cultist, "Dedication")).unwrap();
    let ResolutionStatus::AwaitingChoice(prompt) = status else {
        panic!("expected a cost prompt, got {status:?}");
    };
    assert_eq!(prompt.kind, PromptKind::Cost);
    assert_eq!(prompt.options.len(), 2);

    game.respond(P0, 1).unwrap();
    assert!(game.state().is_in_play(first));
    assert!(!game.state().is_in_play(second));
}

// =============================================================================
// Targets and choices
// =============================================================================

/// Test that several candidates prompt, and the choice is honored.
#[test]
fn test_target_prompt() {
    let mut game = game();
    let courier = put(&mut game, COURIER, P0);
    let first = put(&mut game, ASHIGARU, P1);
    let second = put(&mut game, ASHIGARU, P1);

    let status = game.initiate(P0, ability(&game, courier, "Deliver orders")).unwrap();
    let ResolutionStatus::AwaitingChoice(prompt) = status else {
        panic!("expected a target prompt, got {status:?}");
    };
    assert_eq!(prompt.player, P0);
    assert_eq!(prompt.kind, PromptKind::Target { name: "character".into() });
    // Costs are paid before targets are chosen.
    assert_eq!(fate(&game, P0), STARTING_FATE - 1);

    assert_eq!(game.respond(P0, 1).unwrap(), ResolutionStatus::Complete);
    assert!(!game.has_flag(first, "bowed"));
    assert!(game.has_flag(second, "bowed"));
}

/// Test that only the prompted player may answer, within range.
#[test]
fn test_respond_validation() {
    let mut game = game();
    let courier = put(&mut game, COURIER, P0);
    put(&mut game, ASHIGARU, P1);
    put(&mut game, ASHIGARU, P1);
    game.initiate(P0, ability(&game, courier, "Deliver orders")).unwrap();

    assert_eq!(
        game.respond(P1, 0),
        Err(EngineError::WrongPlayer { expected: P0, got: P1 })
    );
    assert_eq!(game.respond(P0, 7), Err(EngineError::OptionOutOfRange { index: 7, len: 2 }));
    assert_eq!(
        game.initiate(P0, ability(&game, courier, "Deliver orders")),
        Err(EngineError::ResolutionInProgress)
    );
    assert!(game.respond(P0, 0).is_ok());
    assert_eq!(game.respond(P0, 0), Err(EngineError::NoPendingPrompt));
}

/// Test choosing targets before paying costs.
#[test]
fn test_targets_first() {
    let mut game = game();
    let duelist = put(&mut game, DUELIST, P0);
    let first = put(&mut game, ASHIGARU, P1);
    let second = put(&mut game, ASHIGARU, P1);

    let status = game.initiate(P0, ability(&game, duelist, "Challenge")).unwrap();
    let ResolutionStatus::AwaitingChoice(prompt) = status else {
        panic!("expected the ordering prompt, got {status:?}");
    };
    assert_eq!(prompt.kind, PromptKind::TargetFirst);

    game.respond_with(P0, "Choose targets first").unwrap();
    let prompt = game.pending_prompt().unwrap();
    assert!(matches!(prompt.kind, PromptKind::Target { .. }));
    assert_eq!(fate(&game, P0), STARTING_FATE);

    game.respond(P0, 0).unwrap();
    assert_eq!(game.last_outcome(), Some(ResolutionOutcome::Completed));
    assert_eq!(fate(&game, P0), STARTING_FATE - 1);
    assert!(game.has_flag(first, "bowed"));
    assert!(!game.has_flag(second, "bowed"));
}

/// Test that a choice between alternatives prompts the resolving player.
#[test]
fn test_choice_prompt() {
    let mut game = game();
    let magistrate = put(&mut game, MAGISTRATE, P0);
    let target = put(&mut game, ASHIGARU, P1);

    let status = game.initiate(P0, ability(&game, magistrate, "Judge")).unwrap();
    let ResolutionStatus::AwaitingChoice(prompt) = status else {
        panic!("expected a choice, got {status:?}");
    };
    assert_eq!(prompt.kind, PromptKind::Choice);
    assert_eq!(prompt.options, vec!["Honor".to_string(), "Dishonor".to_string()]);

    game.respond_with(P0, "Dishonor").unwrap();
    assert!(game.has_flag(target, "dishonored"));
}

/// Test that an alternative that cannot affect the target is not offered.
#[test]
fn test_choice_skips_illegal_option() {
    let mut game = game();
    let magistrate = put(&mut game, MAGISTRATE, P0);
    let target = put(&mut game, ASHIGARU, P1);
    game.state_mut().card_mut(target).unwrap().set_flag("honored", true);

    let status = game.initiate(P0, ability(&game, magistrate, "Judge")).unwrap();
    assert_eq!(status, ResolutionStatus::Complete);
    // Dishonoring an honored character makes it ordinary.
    assert!(!game.has_flag(target, "honored"));
    assert!(!game.has_flag(target, "dishonored"));
}

// =============================================================================
// Cancellation
// =============================================================================

/// Test that a cancelled event aborts the resolution, stops reactions and
/// unapplies the effects the resolution created.
#[test]
fn test_cancellation_is_total() {
    let mut game = game();
    let enforcer = put(&mut game, ENFORCER, P0);
    let warden = put(&mut game, WARDEN, P1);
    put(&mut game, AVENGER, P1);

    game.initiate(P0, ability(&game, enforcer, "Intimidate")).unwrap();

    assert_eq!(
        game.last_outcome(),
        Some(ResolutionOutcome::Aborted(AbortReason::Cancelled))
    );
    assert!(!game.has_flag(warden, "bowed"));
    assert_eq!(game.value(warden, "military"), 2);
    assert_eq!(game.state().effects.len(), 0);
    assert_eq!(honor(&game, P1), STARTING_HONOR);
    assert_eq!(count_events(&game, events::EVENT_CANCELLED), 1);
    assert_eq!(count_events(&game, events::BOWED), 0);
}

/// Test that the effect of an uncancelled resolution lasts until the phase ends.
#[test]
fn test_uncancelled_effect_applies() {
    let mut game = game();
    let enforcer = put(&mut game, ENFORCER, P0);
    let target = put(&mut game, ASHIGARU, P1);
    put(&mut game, AVENGER, P1);

    game.initiate(P0, ability(&game, enforcer, "Intimidate")).unwrap();

    assert_eq!(game.last_outcome(), Some(ResolutionOutcome::Completed));
    assert!(game.has_flag(target, "bowed"));
    assert_eq!(game.value(target, "military"), 0);
    assert_eq!(honor(&game, P1), STARTING_HONOR + 1);

    game.end_phase(ccg_rules::PhaseId(2)).unwrap();
    assert_eq!(game.value(target, "military"), 2);
}

// =============================================================================
// Facade errors
// =============================================================================

/// Test that only action abilities can be initiated, by their controller.
#[test]
fn test_initiate_errors() {
    let mut game = game();
    let courier = put(&mut game, COURIER, P0);
    let warden = put(&mut game, WARDEN, P1);
    let deflect = ability(&game, warden, "Deflect");
    assert_eq!(
        game.state().abilities.get(deflect).unwrap().descriptor.ability_type,
        AbilityType::WouldInterrupt
    );

    assert_eq!(game.initiate(P1, deflect), Err(EngineError::NotAnAction(deflect)));
    assert_eq!(
        game.initiate(P1, ability(&game, courier, "Deliver orders")),
        Err(EngineError::WrongPlayer { expected: P0, got: P1 })
    );
    assert_eq!(
        game.create_card(CardId(999), Some(P0), PLAY),
        Err(EngineError::UnknownCard(CardId(999)))
    );
}

/// Test that a message is rendered with the resolving player and target.
#[test]
fn test_message_is_logged() {
    let mut registry = registry();
    registry
        .register(
            CardDefinition::new(CardId(100), "Herald", HOLDING).with_ability(
                AbilityDescriptor::new("Proclaim")
                    .with_cost(Cost::BowSelf)
                    .with_step(GameAction::modify_player("honor", 2), ActionTarget::Controller)
                    .with_message("{player} uses {source} to gain 2 honor"),
            ),
        )
        .unwrap();
    let mut game = game_with(registry);
    let herald = put(&mut game, CardId(100), P0);

    game.initiate(P0, ability(&game, herald, "Proclaim")).unwrap();

    assert!(game.has_flag(herald, "bowed"));
    assert_eq!(honor(&game, P0), STARTING_HONOR + 2);
    let messages = &game.state().public.messages;
    assert_eq!(messages.back().map(String::as_str), Some("Player 0 uses Herald to gain 2 honor"));

    // Bowed now, so the cost cannot be paid again.
    assert!(game.legal_actions(P0).is_empty());
}
