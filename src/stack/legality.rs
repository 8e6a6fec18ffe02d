//! Pre-commitment legality checks.
//!
//! Everything here is read-only. An ability failing any check is simply not
//! available: nothing is paid and nothing is prompted.

use crate::abilities::{can_pay_all, is_restricted, Ability, RestrictedAction};
use crate::actions::ActionContext;
use crate::core::{EntityId, EntityKind, GameState, PlayerId};
use crate::triggers::{ConditionContext, GameEvent};

use super::AbortReason;

/// Attribute raising the max of every limit on a card's abilities.
pub const LIMIT_BONUS: &str = "ability-limit-bonus";

/// Extra uses granted by the source's limit bonus.
#[must_use]
pub fn limit_bonus(state: &GameState, source: EntityId) -> u32 {
    u32::try_from(state.get_value(source, LIMIT_BONUS).max(0)).unwrap_or(0)
}

/// Whether the ability's source is where the ability works from.
#[must_use]
pub fn in_location(state: &GameState, ability: &Ability) -> bool {
    let owner = ability.owner;
    if state.kind_of(owner) != Some(EntityKind::Card) {
        return state.kind_of(owner).is_some();
    }
    match ability.descriptor.location {
        None => state.is_in_play(owner),
        Some(role) => state
            .zones
            .get_zone(owner)
            .and_then(|zone| state.config().get_zone(zone))
            .is_some_and(|zone| zone.role == role),
    }
}

/// Check whether `player` may resolve `ability` now.
pub fn check(
    state: &GameState,
    ability: &Ability,
    player: PlayerId,
    event: Option<&GameEvent>,
) -> Result<(), AbortReason> {
    let source = ability.owner;
    let descriptor = &ability.descriptor;

    if !in_location(state, ability) || (ability.is_printed() && state.is_blank(source)) {
        return Err(AbortReason::Inactive);
    }

    let actor = EntityId::player(player);
    if is_restricted(state, source, RestrictedAction::TriggerAbilities, Some(source))
        || (actor != source && is_restricted(state, actor, RestrictedAction::TriggerAbilities, Some(source)))
    {
        return Err(AbortReason::Restricted);
    }

    if descriptor.limit.is_some() && !state.limits.can_use(&ability.limit_key, limit_bonus(state, source)) {
        return Err(AbortReason::LimitReached);
    }

    let mut condition_ctx = ConditionContext::new(state)
        .with_source(source)
        .with_player(player)
        .with_subject(source);
    if let Some(event) = event {
        condition_ctx = condition_ctx.with_event(event);
    }
    if !descriptor.condition.evaluate(&condition_ctx) {
        return Err(AbortReason::ConditionFailed);
    }

    let ctx = ActionContext {
        source,
        player,
        resolution: None,
        event: event.cloned(),
        can_cancel: descriptor.ability_type == crate::abilities::AbilityType::WouldInterrupt,
    };
    if !can_pay_all(&descriptor.costs, state, &ctx) {
        return Err(AbortReason::CannotPayCosts);
    }

    let missing_target = descriptor
        .targets
        .iter()
        .any(|target| !target.optional && target.candidates(state, &ctx).is_empty());
    if missing_target {
        return Err(AbortReason::NoLegalTargets);
    }
    Ok(())
}
