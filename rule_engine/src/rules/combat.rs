//! Attack and damage rolls with the equipped weapon.

use game_rules::{Ability, DamageType, DiceRoll};
use tracing::info;

use super::{action, flag, CHARACTER, DAMAGE_TYPE, HIT, RESULT, TARGET_AC};
use crate::context::{Context, ACTIONS};
use crate::error::RegistryError;
use crate::registry::RuleRegistry;
use crate::rule::{Bindings, Requirement, Rule};
use crate::value::ValueKind;

const REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(CHARACTER, ValueKind::Character),
];

pub fn register(registry: &mut RuleRegistry) -> Result<(), RegistryError> {
    registry.register(RollAttack)?;
    registry.register(RollDamage)?;
    Ok(())
}

/// d20 + weapon modifier + proficiency. A natural 20 is a critical hit.
///
/// With `target_ac` present, `hit` records whether the attack beats it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollAttack;

impl Rule for RollAttack {
    fn name(&self) -> &str {
        "roll_attack"
    }

    fn requirements(&self) -> &[Requirement] {
        REQUIREMENTS
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::ROLL_ATTACK)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        let Some(character) = bindings.character(CHARACTER) else {
            return;
        };
        context.take_action(action::ROLL_ATTACK);

        let natural = DiceRoll::D20.roll(context.rng());
        let mut total = natural + character.weapon_modifier();
        if character.is_proficient_with_weapon() {
            total += character.proficiency_bonus();
        }

        let critical = natural == DiceRoll::D20.max();
        if critical {
            context.set_flag(flag::IS_CRITICAL_HIT);
        } else {
            context.reset_flag(flag::IS_CRITICAL_HIT);
        }

        if let Some(target_ac) = context.get_int(TARGET_AC) {
            let hit = critical || i64::from(total) > target_ac;
            info!(character = %character.name, natural, total, target_ac, hit, "rolled attack");
            context.update(HIT, hit);
        } else {
            info!(character = %character.name, natural, total, "rolled attack");
        }
        context.update(RESULT, total);
    }
}

/// Weapon damage plus the attack modifier; critical hits roll the dice twice.
/// Unarmed strikes deal 1 + STR bludgeoning.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollDamage;

impl Rule for RollDamage {
    fn name(&self) -> &str {
        "roll_damage"
    }

    fn requirements(&self) -> &[Requirement] {
        REQUIREMENTS
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::ROLL_DAMAGE)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        let Some(character) = bindings.character(CHARACTER) else {
            return;
        };
        context.take_action(action::ROLL_DAMAGE);
        let critical = context.has_flag(flag::IS_CRITICAL_HIT);

        let (amount, damage_type) = match &character.equipped_weapon {
            None => (
                1 + character.modifier(Ability::Strength),
                DamageType::Bludgeoning,
            ),
            Some(weapon) => {
                let (mut amount, damage_type) = weapon.roll_damage(context.rng());
                if critical {
                    amount += weapon.roll_damage(context.rng()).0;
                }
                (amount + character.weapon_modifier(), damage_type)
            }
        };

        info!(character = %character.name, amount, %damage_type, critical, "rolled damage");
        context.update(RESULT, amount);
        context.update(DAMAGE_TYPE, damage_type);
    }
}
