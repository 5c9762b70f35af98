//! Equipping and unequipping armor, shields and weapons.
//!
//! Any change to worn armor queues `get_armor_class`, so the run ends with the new
//! armor class in `result`.

use tracing::info;

use super::{action, edit_character, notify, ARMOR, CHARACTER, SLOT, WEAPON};
use crate::context::{Context, ACTIONS};
use crate::error::RegistryError;
use crate::registry::RuleRegistry;
use crate::rule::{Bindings, Requirement, Rule};
use crate::value::ValueKind;

/// `slot` value selecting the shield in `unequip_armor`.
pub const SHIELD_SLOT: &str = "shield";

const EQUIP_ARMOR_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(CHARACTER, ValueKind::Character),
    Requirement::required(ARMOR, ValueKind::Armor),
];

const EQUIP_WEAPON_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(CHARACTER, ValueKind::Character),
    Requirement::required(WEAPON, ValueKind::Weapon),
];

const UNEQUIP_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(CHARACTER, ValueKind::Character),
];

pub fn register(registry: &mut RuleRegistry) -> Result<(), RegistryError> {
    registry.register(EquipArmor)?;
    registry.register(UnequipArmor)?;
    registry.register(EquipWeapon)?;
    registry.register(UnequipWeapon)?;
    Ok(())
}

fn request_armor_class(context: &mut Context) {
    context.push_action(action::GET_ARMOR_CLASS);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EquipArmor;

impl Rule for EquipArmor {
    fn name(&self) -> &str {
        "equip_armor"
    }

    fn requirements(&self) -> &[Requirement] {
        EQUIP_ARMOR_REQUIREMENTS
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::EQUIP_ARMOR)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        let Some(armor) = bindings.armor(ARMOR) else {
            return;
        };
        context.take_action(action::EQUIP_ARMOR);

        let warning = edit_character(context, bindings, |character| {
            character.equip_armor(armor.clone());
            info!(character = %character.name, armor = %armor.name, "equipped armor");
            (!armor.is_shield() && character.lacks_strength_for(armor)).then(|| {
                format!(
                    "{} lacks the strength for {}; speed drops to {}",
                    character.name,
                    armor.name,
                    character.speed()
                )
            })
        });
        if let Some(message) = warning.flatten() {
            notify(context, message);
        }

        request_armor_class(context);
    }
}

/// Removes body armor, or the shield when `slot` is `"shield"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnequipArmor;

impl Rule for UnequipArmor {
    fn name(&self) -> &str {
        "unequip_armor"
    }

    fn requirements(&self) -> &[Requirement] {
        UNEQUIP_REQUIREMENTS
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::UNEQUIP_ARMOR)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        let shield = context.get_text(SLOT) == Some(SHIELD_SLOT);
        context.take_action(action::UNEQUIP_ARMOR);

        edit_character(context, bindings, |character| {
            let removed = if shield {
                character.equipped_shield.take()
            } else {
                character.equipped_armor.take()
            };
            if let Some(armor) = removed {
                info!(character = %character.name, armor = %armor.name, "unequipped armor");
            }
        });

        request_armor_class(context);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EquipWeapon;

impl Rule for EquipWeapon {
    fn name(&self) -> &str {
        "equip_weapon"
    }

    fn requirements(&self) -> &[Requirement] {
        EQUIP_WEAPON_REQUIREMENTS
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::EQUIP_WEAPON)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        let Some(weapon) = bindings.weapon(WEAPON) else {
            return;
        };
        context.take_action(action::EQUIP_WEAPON);
        edit_character(context, bindings, |character| {
            info!(character = %character.name, weapon = %weapon.name, "equipped weapon");
            character.equipped_weapon = Some(weapon.clone());
        });
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnequipWeapon;

impl Rule for UnequipWeapon {
    fn name(&self) -> &str {
        "unequip_weapon"
    }

    fn requirements(&self) -> &[Requirement] {
        UNEQUIP_REQUIREMENTS
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::UNEQUIP_WEAPON)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        context.take_action(action::UNEQUIP_WEAPON);
        edit_character(context, bindings, |character| {
            character.equipped_weapon = None;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::rules::{armor_class, NOTIFICATIONS, RESULT};
    use game_rules::{Ability, Armor, ArmorType, Character, Weapon, WeaponType};

    fn engine() -> Engine {
        let mut registry = RuleRegistry::new();
        register(&mut registry).unwrap();
        armor_class::register(&mut registry).unwrap();
        Engine::new(registry)
    }

    fn fighter() -> Character {
        Character::new("Fighter").with_ability(Ability::Dexterity, 14)
    }

    #[test]
    fn test_equip_armor_updates_armor_class() {
        let mut ctx = Context::with_seed(1)
            .with(CHARACTER, fighter())
            .with(RESULT, 12)
            .with(ARMOR, Armor::new("Chain Mail", ArmorType::Heavy, 16))
            .with_action(action::EQUIP_ARMOR);

        let report = engine().run(&mut ctx).unwrap();
        assert_eq!(ctx.get_int(RESULT), Some(16));
        assert!(report.unhandled_actions.is_empty());
        let character = ctx.get_character(CHARACTER).unwrap();
        assert_eq!(character.equipped_armor.as_ref().map(|a| a.armor_class), Some(16));
        assert!(!ctx.has_attribute(NOTIFICATIONS));
    }

    #[test]
    fn test_heavy_armor_without_strength_notifies() {
        let plate = Armor::new("Plate", ArmorType::Heavy, 18).with_min_strength(15);
        let ctx = engine()
            .execute(
                Context::with_seed(1)
                    .with(CHARACTER, fighter())
                    .with(ARMOR, plate)
                    .with_action(action::EQUIP_ARMOR),
            )
            .unwrap();

        assert_eq!(ctx.get_int(RESULT), Some(18));
        assert_eq!(
            ctx.get_text_list(NOTIFICATIONS),
            Some(&["Fighter lacks the strength for Plate; speed drops to 20".to_string()][..])
        );
    }

    #[test]
    fn test_unequip_shield_slot() {
        let character = fighter()
            .with_armor(Armor::new("Leather", ArmorType::Light, 11))
            .with_armor(Armor::new("Shield", ArmorType::Shield, 2));
        let ctx = engine()
            .execute(
                Context::with_seed(1)
                    .with(CHARACTER, character)
                    .with(SLOT, SHIELD_SLOT)
                    .with_action(action::UNEQUIP_ARMOR),
            )
            .unwrap();

        let character = ctx.get_character(CHARACTER).unwrap();
        assert!(character.equipped_shield.is_none());
        assert!(character.equipped_armor.is_some());
        assert_eq!(ctx.get_int(RESULT), Some(13));
    }

    #[test]
    fn test_unequip_body_armor() {
        let character = fighter().with_armor(Armor::new("Leather", ArmorType::Light, 11));
        let ctx = engine()
            .execute(
                Context::with_seed(1)
                    .with(CHARACTER, character)
                    .with_action(action::UNEQUIP_ARMOR),
            )
            .unwrap();
        assert!(ctx.get_character(CHARACTER).unwrap().equipped_armor.is_none());
        assert_eq!(ctx.get_int(RESULT), Some(12));
    }

    #[test]
    fn test_equip_and_unequip_weapon() {
        let dagger = Weapon::new("Dagger", WeaponType::Simple, "1d4 piercing".parse().unwrap());
        let engine = engine();
        let mut ctx = engine
            .execute(
                Context::with_seed(1)
                    .with(CHARACTER, fighter())
                    .with(WEAPON, dagger)
                    .with_action(action::EQUIP_WEAPON),
            )
            .unwrap();
        let equipped = ctx.get_character(CHARACTER).unwrap().equipped_weapon.clone();
        assert_eq!(equipped.map(|w| w.name), Some("Dagger".to_string()));

        ctx.push_action(action::UNEQUIP_WEAPON);
        engine.run(&mut ctx).unwrap();
        assert!(ctx.get_character(CHARACTER).unwrap().equipped_weapon.is_none());
        assert!(ctx.actions().is_empty());
    }
}
