//! Ability checks, skill checks, saving throws, initiative and death saves.
//!
//! Every roll is a d20 from the context's random source. Disadvantage comes from the
//! `has_disadvantage` flag or from wearing armor without proficiency; advantage
//! from `has_advantage`. Both flags are cleared by the roll that uses them.

use game_rules::{Ability, Character, Condition, DiceRoll, Skill};
use tracing::info;

use super::{action, edit_character, flag, ABILITY, CHARACTER, RESULT, SKILL};
use crate::context::{Context, ACTIONS};
use crate::error::RegistryError;
use crate::registry::RuleRegistry;
use crate::rule::{Bindings, Requirement, Rule};
use crate::value::ValueKind;

/// Runs before the check it modifies.
const MODIFIER_PRIORITY: i32 = 10;

/// Lowest d20 roll that counts as a death save success.
const DEATH_SAVE_DC: i32 = 10;

const ABILITY_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(CHARACTER, ValueKind::Character),
    Requirement::required(ABILITY, ValueKind::Ability),
];

const SKILL_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(CHARACTER, ValueKind::Character),
    Requirement::required(SKILL, ValueKind::Skill),
];

const CHARACTER_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(CHARACTER, ValueKind::Character),
];

pub fn register(registry: &mut RuleRegistry) -> Result<(), RegistryError> {
    registry.register(StealthDisadvantageFromArmor)?;
    registry.register(RollAbilityCheck)?;
    registry.register(RollSkillCheck)?;
    registry.register(RollSavingThrow)?;
    registry.register(RollInitiative)?;
    registry.register(RollDeathSave)?;
    Ok(())
}

/// Roll a d20 check with `ability`, consuming the advantage flags.
fn roll_check(context: &mut Context, character: &Character, ability: Ability) -> i64 {
    let advantage = context.has_flag(flag::HAS_ADVANTAGE);
    let disadvantage =
        context.has_flag(flag::HAS_DISADVANTAGE) || character.has_armor_penalty(ability);
    context.reset_flag(flag::HAS_ADVANTAGE);
    context.reset_flag(flag::HAS_DISADVANTAGE);

    let roll = match (advantage, disadvantage) {
        (true, false) => DiceRoll::D20.roll_advantage(context.rng()),
        (false, true) => DiceRoll::D20.roll_disadvantage(context.rng()),
        _ => DiceRoll::D20.roll(context.rng()),
    };
    i64::from(roll + character.modifier(ability))
}

/// Apply one death save roll to `character`.
///
/// 20 regains a hitpoint, 1 counts as two failures, 10 or more succeeds. Three
/// successes stabilize the character.
pub fn record_death_save(character: &mut Character, roll: i32) {
    match roll {
        20 => {
            character.heal(1);
            return;
        }
        1 => character.death_saves.failures += 2,
        r if r >= DEATH_SAVE_DC => character.death_saves.successes += 1,
        _ => character.death_saves.failures += 1,
    }

    if character.death_saves.is_stabilized() && !character.death_saves.is_dead() {
        character.conditions.insert(Condition::Stable);
        character.death_saves.reset();
    }
}

/// Armor with a stealth drawback imposes disadvantage on stealth checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct StealthDisadvantageFromArmor;

impl Rule for StealthDisadvantageFromArmor {
    fn name(&self) -> &str {
        "stealth_check_disadvantage_from_armor"
    }

    fn requirements(&self) -> &[Requirement] {
        SKILL_REQUIREMENTS
    }

    fn priority(&self) -> i32 {
        MODIFIER_PRIORITY
    }

    fn when(&self, context: &Context, bindings: &Bindings) -> bool {
        context.has_action(action::ROLL_SKILL_CHECK)
            && !context.has_flag(flag::HAS_DISADVANTAGE)
            && bindings.skill(SKILL) == Some(Skill::Stealth)
            && bindings.character(CHARACTER).is_some_and(|character| {
                character
                    .equipped_armor
                    .as_ref()
                    .is_some_and(|armor| armor.stealth_disadvantage)
            })
    }

    fn then(&self, context: &mut Context, _bindings: &Bindings) {
        context.set_flag(flag::HAS_DISADVANTAGE);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RollAbilityCheck;

impl Rule for RollAbilityCheck {
    fn name(&self) -> &str {
        "roll_ability_check"
    }

    fn requirements(&self) -> &[Requirement] {
        ABILITY_REQUIREMENTS
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::ROLL_ABILITY_CHECK)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        let (Some(character), Some(ability)) = (bindings.character(CHARACTER), bindings.ability(ABILITY))
        else {
            return;
        };
        context.take_action(action::ROLL_ABILITY_CHECK);
        let result = roll_check(context, character, ability);
        info!(character = %character.name, ?ability, result, "rolled ability check");
        context.update(RESULT, result);
    }
}

/// Ability check of the governing ability, plus proficiency when trained.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollSkillCheck;

impl Rule for RollSkillCheck {
    fn name(&self) -> &str {
        "roll_skill_check"
    }

    fn requirements(&self) -> &[Requirement] {
        SKILL_REQUIREMENTS
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::ROLL_SKILL_CHECK)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        let (Some(character), Some(skill)) = (bindings.character(CHARACTER), bindings.skill(SKILL))
        else {
            return;
        };
        context.take_action(action::ROLL_SKILL_CHECK);
        let mut result = roll_check(context, character, skill.ability());
        if character.is_proficient_in_skill(skill) {
            result += i64::from(character.proficiency_bonus());
        }
        info!(character = %character.name, ?skill, result, "rolled skill check");
        context.update(RESULT, result);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RollSavingThrow;

impl Rule for RollSavingThrow {
    fn name(&self) -> &str {
        "roll_saving_throw"
    }

    fn requirements(&self) -> &[Requirement] {
        ABILITY_REQUIREMENTS
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::ROLL_SAVING_THROW)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        let (Some(character), Some(ability)) = (bindings.character(CHARACTER), bindings.ability(ABILITY))
        else {
            return;
        };
        context.take_action(action::ROLL_SAVING_THROW);
        let mut result = roll_check(context, character, ability);
        if character.is_proficient_in_saving_throw(ability) {
            result += i64::from(character.proficiency_bonus());
        }
        info!(character = %character.name, ?ability, result, "rolled saving throw");
        context.update(RESULT, result);
    }
}

/// Initiative is a Dexterity check; hands off to [`RollAbilityCheck`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RollInitiative;

impl Rule for RollInitiative {
    fn name(&self) -> &str {
        "roll_initiative"
    }

    fn requirements(&self) -> &[Requirement] {
        CHARACTER_REQUIREMENTS
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::ROLL_INITIATIVE)
    }

    fn then(&self, context: &mut Context, _bindings: &Bindings) {
        context.take_action(action::ROLL_INITIATIVE);
        context.update(ABILITY, Ability::Dexterity);
        context.push_action(action::ROLL_ABILITY_CHECK);
    }
}

/// Death saving throw for a character at zero hitpoints who is not yet stable.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollDeathSave;

impl Rule for RollDeathSave {
    fn name(&self) -> &str {
        "roll_death_save"
    }

    fn requirements(&self) -> &[Requirement] {
        CHARACTER_REQUIREMENTS
    }

    fn when(&self, context: &Context, bindings: &Bindings) -> bool {
        context.has_action(action::ROLL_DEATH_SAVE)
            && bindings.character(CHARACTER).is_some_and(|character| {
                character.hitpoints == 0 && !character.has_condition(Condition::Stable)
            })
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        context.take_action(action::ROLL_DEATH_SAVE);
        let roll = DiceRoll::D20.roll(context.rng());
        edit_character(context, bindings, |character| {
            record_death_save(character, roll);
            info!(
                character = %character.name,
                roll,
                successes = character.death_saves.successes,
                failures = character.death_saves.failures,
                "rolled death save"
            );
        });
        context.update(RESULT, roll);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use game_rules::{Armor, ArmorType, DeathSaves};

    fn engine() -> Engine {
        let mut registry = RuleRegistry::new();
        register(&mut registry).unwrap();
        Engine::new(registry)
    }

    fn athlete() -> Character {
        Character::new("Athlete")
            .with_ability(Ability::Strength, 14)
            .with_ability(Ability::Dexterity, 16)
    }

    #[test]
    fn test_ability_check_range() {
        for seed in 0..20 {
            let ctx = engine()
                .execute(
                    Context::with_seed(seed)
                        .with(CHARACTER, athlete())
                        .with(ABILITY, Ability::Strength)
                        .with_action(action::ROLL_ABILITY_CHECK),
                )
                .unwrap();
            let result = ctx.get_int(RESULT).unwrap();
            assert!((3..=22).contains(&result), "result {result} out of range");
            assert!(ctx.actions().is_empty());
        }
    }

    #[test]
    fn test_same_seed_same_roll() {
        let roll = |seed| {
            engine()
                .execute(
                    Context::with_seed(seed)
                        .with(CHARACTER, athlete())
                        .with(ABILITY, Ability::Wisdom)
                        .with_action(action::ROLL_SAVING_THROW),
                )
                .unwrap()
                .get_int(RESULT)
        };
        assert_eq!(roll(42), roll(42));
    }

    #[test]
    fn test_skill_check_adds_proficiency() {
        let mut character = athlete();
        character.proficiencies.skills.push(Skill::Athletics);

        for seed in 0..20 {
            let ctx = engine()
                .execute(
                    Context::with_seed(seed)
                        .with(CHARACTER, character.clone())
                        .with(SKILL, Skill::Athletics)
                        .with_action(action::ROLL_SKILL_CHECK),
                )
                .unwrap();
            let result = ctx.get_int(RESULT).unwrap();
            assert!((5..=24).contains(&result), "result {result} out of range");
        }
    }

    #[test]
    fn test_saving_throw_adds_proficiency() {
        let mut character = athlete();
        character.proficiencies.saving_throws.insert(Ability::Dexterity);

        let ctx = engine()
            .execute(
                Context::with_seed(3)
                    .with(CHARACTER, character)
                    .with(ABILITY, Ability::Dexterity)
                    .with_action(action::ROLL_SAVING_THROW),
            )
            .unwrap();
        let result = ctx.get_int(RESULT).unwrap();
        assert!((6..=25).contains(&result));
    }

    #[test]
    fn test_stealth_disadvantage_from_armor() {
        let character = athlete()
            .with_armor(Armor::new("Chain Mail", ArmorType::Heavy, 16).with_stealth_disadvantage());
        let mut ctx = Context::with_seed(5)
            .with(CHARACTER, character)
            .with(SKILL, Skill::Stealth)
            .with_action(action::ROLL_SKILL_CHECK);

        let report = engine().run(&mut ctx).unwrap();
        assert_eq!(
            report.agendas[0],
            vec!["stealth_check_disadvantage_from_armor", "roll_skill_check"]
        );
        assert!(!ctx.has_flag(flag::HAS_DISADVANTAGE));
        assert!(ctx.get_int(RESULT).is_some());
    }

    #[test]
    fn test_initiative_rolls_dexterity() {
        let mut ctx = Context::with_seed(9)
            .with(CHARACTER, athlete())
            .with_action(action::ROLL_INITIATIVE);

        let report = engine().run(&mut ctx).unwrap();
        assert_eq!(ctx.get_ability(ABILITY), Some(Ability::Dexterity));
        assert_eq!(report.fired_count("roll_ability_check"), 1);
        let result = ctx.get_int(RESULT).unwrap();
        assert!((4..=23).contains(&result));
        assert!(report.unhandled_actions.is_empty());
    }

    #[test]
    fn test_death_save_outcomes() {
        let mut downed = Character::new("Downed");
        downed.hitpoints = 0;
        downed.conditions.insert(Condition::Unconscious);

        let mut character = downed.clone();
        record_death_save(&mut character, 12);
        assert_eq!(character.death_saves, DeathSaves { successes: 1, failures: 0 });

        record_death_save(&mut character, 5);
        assert_eq!(character.death_saves, DeathSaves { successes: 1, failures: 1 });

        record_death_save(&mut character, 1);
        assert!(character.death_saves.is_dead());

        let mut character = downed.clone();
        record_death_save(&mut character, 20);
        assert_eq!(character.hitpoints, 1);
        assert!(!character.has_condition(Condition::Unconscious));

        let mut character = downed;
        for _ in 0..3 {
            record_death_save(&mut character, 15);
        }
        assert!(character.has_condition(Condition::Stable));
        assert_eq!(character.death_saves, DeathSaves::default());
    }

    #[test]
    fn test_death_save_needs_zero_hitpoints() {
        let mut ctx = Context::with_seed(1)
            .with(CHARACTER, Character::new("Healthy"))
            .with_action(action::ROLL_DEATH_SAVE);
        let report = engine().run(&mut ctx).unwrap();
        assert_eq!(report.unhandled_actions, vec![action::ROLL_DEATH_SAVE.to_string()]);

        let mut downed = Character::new("Downed");
        downed.hitpoints = 0;
        let ctx = engine()
            .execute(
                Context::with_seed(1)
                    .with(CHARACTER, downed)
                    .with_action(action::ROLL_DEATH_SAVE),
            )
            .unwrap();
        let roll = ctx.get_int(RESULT).unwrap();
        assert!((1..=20).contains(&roll));
        let character = ctx.get_character(CHARACTER).unwrap();
        if roll == 20 {
            assert_eq!(character.hitpoints, 1);
        } else {
            assert_ne!(character.death_saves, DeathSaves::default());
        }
    }
}
