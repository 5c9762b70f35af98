//! Damage and healing: `get_suffered_damage` and `heal`.
//!
//! A request rule first clears any `result` left by an earlier request. The base
//! rule then copies `value` into `result`; resistance, vulnerability and
//! immunity run right after it in the same iteration and adjust `result`. Once the
//! amount is settled, instant death and death-save failures are checked against the
//! character as it was before the hit, then [`ApplyDamage`] subtracts hitpoints and
//! consumes the request.

use game_rules::{Character, Condition, DamageType};
use tracing::{debug, info};

use super::{
    action, edit_character, flag, CHARACTER, COMPLETION_PRIORITY, DAMAGE_TYPE, FATALITY,
    REQUEST_PRIORITY, RESULT, VALUE,
};
use crate::context::{Context, ACTIONS};
use crate::error::RegistryError;
use crate::registry::RuleRegistry;
use crate::rule::{Bindings, Requirement, Rule};
use crate::value::ValueKind;

/// Modifiers run after the base amount is in place.
const MODIFIER_PRIORITY: i32 = -1;

const REQUEST_REQUIREMENTS: &[Requirement] =
    &[Requirement::required(ACTIONS, ValueKind::TextList)];

const BASE_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(VALUE, ValueKind::Int),
    Requirement::absent(RESULT),
];

const MODIFIER_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(CHARACTER, ValueKind::Character),
    Requirement::required(VALUE, ValueKind::Int),
    Requirement::required(DAMAGE_TYPE, ValueKind::DamageType),
    Requirement::absent(RESULT),
];

const SETTLED_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(CHARACTER, ValueKind::Character),
    Requirement::required(RESULT, ValueKind::Int),
];

const INSTANT_DEATH_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(CHARACTER, ValueKind::Character),
    Requirement::required(RESULT, ValueKind::Int),
    Requirement::absent(FATALITY),
];

const DEATH_SAVES_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(CHARACTER, ValueKind::Character),
    Requirement::absent(FATALITY),
];

const HEAL_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(CHARACTER, ValueKind::Character),
    Requirement::required(VALUE, ValueKind::Int),
];

pub fn register(registry: &mut RuleRegistry) -> Result<(), RegistryError> {
    registry.register(DamageRequest)?;
    registry.register(SufferDamage)?;
    registry.register(DamageModifier::Resistance)?;
    registry.register(DamageModifier::Vulnerability)?;
    registry.register(DamageModifier::Immunity)?;
    registry.register(InstantDeath)?;
    registry.register(FailDeathSaveOnDamage)?;
    registry.register(TooManyFailedDeathSaves)?;
    registry.register(ApplyDamage)?;
    registry.register(Heal)?;
    Ok(())
}

/// Starts a `get_suffered_damage` request from a clean slate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DamageRequest;

impl Rule for DamageRequest {
    fn name(&self) -> &str {
        "suffer_damage_request"
    }

    fn requirements(&self) -> &[Requirement] {
        REQUEST_REQUIREMENTS
    }

    fn priority(&self) -> i32 {
        REQUEST_PRIORITY
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::GET_SUFFERED_DAMAGE) && !context.has_flag(flag::DAMAGE_REQUESTED)
    }

    fn then(&self, context: &mut Context, _bindings: &Bindings) {
        if let Some(stale) = context.remove(RESULT) {
            debug!(?stale, "clearing result before computing suffered damage");
        }
        context.set_flag(flag::DAMAGE_REQUESTED);
    }
}

/// Suffered damage starts as the incoming amount.
#[derive(Debug, Clone, Copy, Default)]
pub struct SufferDamage;

impl Rule for SufferDamage {
    fn name(&self) -> &str {
        "suffer_damage"
    }

    fn requirements(&self) -> &[Requirement] {
        BASE_REQUIREMENTS
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::GET_SUFFERED_DAMAGE)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        if let Some(value) = bindings.int(VALUE) {
            context.update(RESULT, value.max(0));
        }
    }
}

/// Adjusts the amount for the character's relation to the damage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageModifier {
    Resistance,
    Vulnerability,
    Immunity,
}

impl DamageModifier {
    fn applies(&self, character: &Character, damage_type: DamageType) -> bool {
        let set = match self {
            DamageModifier::Resistance => &character.resistances,
            DamageModifier::Vulnerability => &character.vulnerabilities,
            DamageModifier::Immunity => &character.immunities,
        };
        set.contains(&damage_type)
    }

    fn adjust(&self, amount: i64) -> i64 {
        match self {
            DamageModifier::Resistance => amount.div_euclid(2),
            DamageModifier::Vulnerability => amount.saturating_mul(2),
            DamageModifier::Immunity => 0,
        }
    }
}

impl Rule for DamageModifier {
    fn name(&self) -> &str {
        match self {
            DamageModifier::Resistance => "suffer_damage_resistance",
            DamageModifier::Vulnerability => "suffer_damage_vulnerability",
            DamageModifier::Immunity => "suffer_damage_immunity",
        }
    }

    fn requirements(&self) -> &[Requirement] {
        MODIFIER_REQUIREMENTS
    }

    fn priority(&self) -> i32 {
        MODIFIER_PRIORITY
    }

    fn when(&self, context: &Context, bindings: &Bindings) -> bool {
        let (Some(character), Some(damage_type)) =
            (bindings.character(CHARACTER), bindings.damage_type(DAMAGE_TYPE))
        else {
            return false;
        };
        context.has_action(action::GET_SUFFERED_DAMAGE) && self.applies(character, damage_type)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        // The base rule has already written `result` in this iteration.
        let Some(amount) = context.get_int(RESULT).or(bindings.int(VALUE)) else {
            return;
        };
        let adjusted = self.adjust(amount);
        info!(rule = self.name(), amount, adjusted, "adjusting suffered damage");
        context.update(RESULT, adjusted);
    }
}

/// Damage that would leave the character at `-max_hitpoints` or below kills outright.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantDeath;

impl Rule for InstantDeath {
    fn name(&self) -> &str {
        "instant_death_too_much_damage"
    }

    fn requirements(&self) -> &[Requirement] {
        INSTANT_DEATH_REQUIREMENTS
    }

    fn when(&self, context: &Context, bindings: &Bindings) -> bool {
        let (Some(character), Some(amount)) = (bindings.character(CHARACTER), bindings.int(RESULT))
        else {
            return false;
        };
        context.has_action(action::GET_SUFFERED_DAMAGE)
            && context.has_flag(flag::DAMAGE_REQUESTED)
            && amount >= i64::from(character.hitpoints) + i64::from(character.max_hitpoints)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        if let Some(character) = bindings.character(CHARACTER) {
            info!(character = %character.name, "character dies from massive damage");
        }
        context.update(FATALITY, "instant death");
    }
}

/// Taking damage at zero hitpoints counts as a failed death save, two on a critical hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailDeathSaveOnDamage;

impl Rule for FailDeathSaveOnDamage {
    fn name(&self) -> &str {
        "fail_death_save_when_receiving_damage"
    }

    fn requirements(&self) -> &[Requirement] {
        SETTLED_REQUIREMENTS
    }

    fn when(&self, context: &Context, bindings: &Bindings) -> bool {
        let (Some(character), Some(amount)) = (bindings.character(CHARACTER), bindings.int(RESULT))
        else {
            return false;
        };
        context.has_action(action::GET_SUFFERED_DAMAGE)
            && context.has_flag(flag::DAMAGE_REQUESTED)
            && character.hitpoints == 0
            && amount > 0
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        let failures = if context.has_flag(flag::IS_CRITICAL_HIT) { 2 } else { 1 };
        edit_character(context, bindings, |character| {
            character.conditions.remove(&Condition::Stable);
            character.death_saves.failures += failures;
            info!(
                character = %character.name,
                failures = character.death_saves.failures,
                "damage at zero hitpoints fails a death save"
            );
        });
    }
}

/// Three failed death saves are fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TooManyFailedDeathSaves;

impl Rule for TooManyFailedDeathSaves {
    fn name(&self) -> &str {
        "too_many_failed_death_saves"
    }

    fn requirements(&self) -> &[Requirement] {
        DEATH_SAVES_REQUIREMENTS
    }

    fn when(&self, _context: &Context, bindings: &Bindings) -> bool {
        bindings
            .character(CHARACTER)
            .is_some_and(|character| character.death_saves.is_dead())
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        if let Some(character) = bindings.character(CHARACTER) {
            info!(character = %character.name, "character dies after failing death saves");
        }
        context.update(FATALITY, "failed death saves");
    }
}

/// Subtracts the settled amount from the character and consumes the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyDamage;

impl Rule for ApplyDamage {
    fn name(&self) -> &str {
        "apply_damage"
    }

    fn requirements(&self) -> &[Requirement] {
        SETTLED_REQUIREMENTS
    }

    fn priority(&self) -> i32 {
        COMPLETION_PRIORITY
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::GET_SUFFERED_DAMAGE) && context.has_flag(flag::DAMAGE_REQUESTED)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        let Some(amount) = bindings.int(RESULT) else {
            return;
        };
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        context.take_action(action::GET_SUFFERED_DAMAGE);
        context.reset_flag(flag::DAMAGE_REQUESTED);
        edit_character(context, bindings, |character| {
            character.take_damage(amount);
            info!(
                character = %character.name,
                amount,
                hitpoints = character.hitpoints,
                "damage applied"
            );
        });
    }
}

/// Restores `value` hitpoints and reports the new total in `result`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Heal;

impl Rule for Heal {
    fn name(&self) -> &str {
        "heal"
    }

    fn requirements(&self) -> &[Requirement] {
        HEAL_REQUIREMENTS
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::HEAL)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        let Some(amount) = bindings.int(VALUE) else {
            return;
        };
        let amount = i32::try_from(amount.max(0)).unwrap_or(i32::MAX);
        context.take_action(action::HEAL);
        let hitpoints = edit_character(context, bindings, |character| {
            character.heal(amount);
            character.hitpoints
        });
        if let Some(hitpoints) = hitpoints {
            context.update(RESULT, hitpoints);
        }
    }
}
