//! Rule packs for the d20 rules system.
//!
//! Every pack reads and writes the same attribute vocabulary, declared below, and
//! reacts to action tokens from [`action`]. A request is made by pushing a token;
//! the rule that handles it consumes the token once its answer is in place.

pub mod armor_class;
pub mod checks;
pub mod combat;
pub mod damage;
pub mod equipment;
pub mod experience;

use game_rules::Character;

use crate::context::Context;
use crate::error::RegistryError;
use crate::registry::RuleRegistry;
use crate::rule::Bindings;

// === Attribute names ===

pub const CHARACTER: &str = "character";
pub const RESULT: &str = "result";
pub const VALUE: &str = "value";
pub const DAMAGE_TYPE: &str = "damage_type";
pub const ABILITY: &str = "ability";
pub const SKILL: &str = "skill";
pub const ARMOR: &str = "armor";
pub const WEAPON: &str = "weapon";
/// `"shield"` to unequip the shield; anything else means body armor.
pub const SLOT: &str = "slot";
pub const TARGET_AC: &str = "target_ac";
pub const HIT: &str = "hit";
/// Why the character died. Present only once it has.
pub const FATALITY: &str = "fatality";
pub const LEVEL_UP: &str = "level_up";
pub const NOTIFICATIONS: &str = "notifications";

/// Action tokens understood by the standard packs.
pub mod action {
    pub const GET_ARMOR_CLASS: &str = "get_armor_class";
    pub const GET_SUFFERED_DAMAGE: &str = "get_suffered_damage";
    pub const HEAL: &str = "heal";
    pub const ROLL_ABILITY_CHECK: &str = "roll_ability_check";
    pub const ROLL_SKILL_CHECK: &str = "roll_skill_check";
    pub const ROLL_SAVING_THROW: &str = "roll_saving_throw";
    pub const ROLL_INITIATIVE: &str = "roll_initiative";
    pub const ROLL_DEATH_SAVE: &str = "roll_death_save";
    pub const ROLL_ATTACK: &str = "roll_attack";
    pub const ROLL_DAMAGE: &str = "roll_damage";
    pub const EQUIP_ARMOR: &str = "equip_armor";
    pub const UNEQUIP_ARMOR: &str = "unequip_armor";
    pub const EQUIP_WEAPON: &str = "equip_weapon";
    pub const UNEQUIP_WEAPON: &str = "unequip_weapon";
    pub const GAIN_EXPERIENCE: &str = "gain_experience";
}

/// Flags used for one-shot gating.
pub mod flag {
    pub const SHIELD_AC_ADDED: &str = "shield_ac_added";
    pub const IS_CRITICAL_HIT: &str = "is_critical_hit";
    pub const HAS_ADVANTAGE: &str = "has_advantage";
    pub const HAS_DISADVANTAGE: &str = "has_disadvantage";
    pub const LEVEL_UP_ANNOUNCED: &str = "level_up_announced";
    /// Set while a `get_armor_class` request is being answered.
    pub const ARMOR_CLASS_REQUESTED: &str = "armor_class_requested";
    /// Set while a `get_suffered_damage` request is being answered.
    pub const DAMAGE_REQUESTED: &str = "damage_requested";
}

/// Request rules clear what an earlier answer left behind before anything else runs.
pub(crate) const REQUEST_PRIORITY: i32 = 20;

/// Completion rules run after everything else that reacts to the same change.
pub(crate) const COMPLETION_PRIORITY: i32 = -10;

/// Register every standard pack.
pub fn register_all(registry: &mut RuleRegistry) -> Result<(), RegistryError> {
    armor_class::register(registry)?;
    damage::register(registry)?;
    checks::register(registry)?;
    combat::register(registry)?;
    equipment::register(registry)?;
    experience::register(registry)?;
    Ok(())
}

/// A registry holding every standard pack.
pub fn standard_registry() -> Result<RuleRegistry, RegistryError> {
    let mut registry = RuleRegistry::new();
    register_all(&mut registry)?;
    Ok(registry)
}

/// Append a message to the `notifications` list.
pub fn notify(context: &mut Context, message: impl Into<String>) {
    let mut notifications = context
        .get_text_list(NOTIFICATIONS)
        .map(<[String]>::to_vec)
        .unwrap_or_default();
    notifications.push(message.into());
    context.update(NOTIFICATIONS, notifications);
}

/// Edit a copy of the bound character and store it back.
pub(crate) fn edit_character<T>(
    context: &mut Context,
    bindings: &Bindings,
    edit: impl FnOnce(&mut Character) -> T,
) -> Option<T> {
    let mut character = bindings.character(CHARACTER)?.clone();
    let output = edit(&mut character);
    context.update(CHARACTER, character);
    Some(output)
}
