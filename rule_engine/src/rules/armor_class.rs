//! Armor class rules, answering `get_armor_class`.
//!
//! A request rule clears any earlier answer, one body-armor rule computes the base
//! value, the shield rule adds its bonus once, and a completion rule consumes the
//! request.

use game_rules::{Ability, ArmorType, Character};
use tracing::{debug, info};

use super::{action, flag, CHARACTER, COMPLETION_PRIORITY, REQUEST_PRIORITY, RESULT};
use crate::context::{Context, ACTIONS};
use crate::error::RegistryError;
use crate::registry::RuleRegistry;
use crate::rule::{Bindings, Requirement, Rule};
use crate::value::ValueKind;

/// Medium armor caps the DEX bonus.
const MEDIUM_ARMOR_MAX_DEX: i32 = 2;

const REQUEST_REQUIREMENTS: &[Requirement] =
    &[Requirement::required(ACTIONS, ValueKind::TextList)];

const BASE_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(CHARACTER, ValueKind::Character),
    Requirement::absent(RESULT),
];

const BONUS_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(CHARACTER, ValueKind::Character),
    Requirement::required(RESULT, ValueKind::Int),
];

const COMPLETE_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(RESULT, ValueKind::Int),
];

pub fn register(registry: &mut RuleRegistry) -> Result<(), RegistryError> {
    registry.register(ArmorClassRequest)?;
    registry.register(BodyArmorClass::Unarmored)?;
    registry.register(BodyArmorClass::Worn(ArmorType::Light))?;
    registry.register(BodyArmorClass::Worn(ArmorType::Medium))?;
    registry.register(BodyArmorClass::Worn(ArmorType::Heavy))?;
    registry.register(ShieldBonus)?;
    registry.register(ArmorClassComplete)?;
    Ok(())
}

/// Starts a `get_armor_class` request from a clean slate.
///
/// Removing a `result` left by an earlier request lets the base rules fire again.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArmorClassRequest;

impl Rule for ArmorClassRequest {
    fn name(&self) -> &str {
        "armor_class_request"
    }

    fn requirements(&self) -> &[Requirement] {
        REQUEST_REQUIREMENTS
    }

    fn priority(&self) -> i32 {
        REQUEST_PRIORITY
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::GET_ARMOR_CLASS) && !context.has_flag(flag::ARMOR_CLASS_REQUESTED)
    }

    fn then(&self, context: &mut Context, _bindings: &Bindings) {
        if let Some(stale) = context.remove(RESULT) {
            debug!(?stale, "clearing result before computing armor class");
        }
        context.reset_flag(flag::SHIELD_AC_ADDED);
        context.set_flag(flag::ARMOR_CLASS_REQUESTED);
    }
}

/// Base armor class from whatever the character wears on the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyArmorClass {
    Unarmored,
    Worn(ArmorType),
}

impl BodyArmorClass {
    fn applies_to(&self, character: &Character) -> bool {
        let worn = character.equipped_armor.as_ref().map(|armor| armor.kind);
        match self {
            BodyArmorClass::Unarmored => worn.is_none(),
            BodyArmorClass::Worn(kind) => worn == Some(*kind),
        }
    }

    fn armor_class(&self, character: &Character) -> i32 {
        let dexterity = character.modifier(Ability::Dexterity);
        let base = character
            .equipped_armor
            .as_ref()
            .map_or(10, |armor| armor.armor_class);
        match self {
            BodyArmorClass::Unarmored | BodyArmorClass::Worn(ArmorType::Light) => base + dexterity,
            BodyArmorClass::Worn(ArmorType::Medium) => base + dexterity.min(MEDIUM_ARMOR_MAX_DEX),
            BodyArmorClass::Worn(_) => base,
        }
    }
}

impl Rule for BodyArmorClass {
    fn name(&self) -> &str {
        match self {
            BodyArmorClass::Unarmored => "armor_class_no_armor",
            BodyArmorClass::Worn(ArmorType::Light) => "armor_class_light_armor",
            BodyArmorClass::Worn(ArmorType::Medium) => "armor_class_medium_armor",
            BodyArmorClass::Worn(ArmorType::Heavy) => "armor_class_heavy_armor",
            BodyArmorClass::Worn(ArmorType::Shield) => "armor_class_shield_as_armor",
        }
    }

    fn requirements(&self) -> &[Requirement] {
        BASE_REQUIREMENTS
    }

    fn when(&self, context: &Context, bindings: &Bindings) -> bool {
        context.has_action(action::GET_ARMOR_CLASS)
            && bindings
                .character(CHARACTER)
                .is_some_and(|character| self.applies_to(character))
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        let Some(character) = bindings.character(CHARACTER) else {
            return;
        };
        let armor_class = self.armor_class(character);
        info!(character = %character.name, rule = self.name(), armor_class, "computed base armor class");
        context.update(RESULT, armor_class);
    }
}

/// Adds the shield bonus on top of the base value, once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShieldBonus;

impl Rule for ShieldBonus {
    fn name(&self) -> &str {
        "armor_class_shield"
    }

    fn requirements(&self) -> &[Requirement] {
        BONUS_REQUIREMENTS
    }

    fn when(&self, context: &Context, bindings: &Bindings) -> bool {
        context.has_action(action::GET_ARMOR_CLASS)
            && context.has_flag(flag::ARMOR_CLASS_REQUESTED)
            && !context.has_flag(flag::SHIELD_AC_ADDED)
            && bindings
                .character(CHARACTER)
                .is_some_and(|character| character.equipped_shield.is_some())
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        let (Some(character), Some(result)) = (bindings.character(CHARACTER), bindings.int(RESULT))
        else {
            return;
        };
        let Some(shield) = &character.equipped_shield else {
            return;
        };
        info!(character = %character.name, bonus = shield.armor_class, "adding shield to armor class");

        context.update(RESULT, result + i64::from(shield.armor_class));
        context.set_flag(flag::SHIELD_AC_ADDED);
    }
}

/// Consumes the request once a value is in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArmorClassComplete;

impl Rule for ArmorClassComplete {
    fn name(&self) -> &str {
        "armor_class_complete"
    }

    fn requirements(&self) -> &[Requirement] {
        COMPLETE_REQUIREMENTS
    }

    fn priority(&self) -> i32 {
        COMPLETION_PRIORITY
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::GET_ARMOR_CLASS) && context.has_flag(flag::ARMOR_CLASS_REQUESTED)
    }

    fn then(&self, context: &mut Context, _bindings: &Bindings) {
        context.take_action(action::GET_ARMOR_CLASS);
        context.reset_flag(flag::ARMOR_CLASS_REQUESTED);
    }
}
