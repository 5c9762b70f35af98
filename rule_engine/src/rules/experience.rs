//! Experience and level-up announcements.

use tracing::info;

use super::{action, edit_character, flag, notify, CHARACTER, LEVEL_UP, VALUE};
use crate::context::{Context, ACTIONS};
use crate::error::RegistryError;
use crate::registry::RuleRegistry;
use crate::rule::{Bindings, Requirement, Rule};
use crate::value::ValueKind;

const GAIN_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(ACTIONS, ValueKind::TextList),
    Requirement::required(CHARACTER, ValueKind::Character),
    Requirement::required(VALUE, ValueKind::Int),
];

const ANNOUNCE_REQUIREMENTS: &[Requirement] = &[
    Requirement::required(CHARACTER, ValueKind::Character),
    Requirement::required(LEVEL_UP, ValueKind::Int),
];

pub fn register(registry: &mut RuleRegistry) -> Result<(), RegistryError> {
    registry.register(GainExperience)?;
    registry.register(LevelUpNotification)?;
    Ok(())
}

/// Adds `value` experience; sets `level_up` when the level rises.
#[derive(Debug, Clone, Copy, Default)]
pub struct GainExperience;

impl Rule for GainExperience {
    fn name(&self) -> &str {
        "gain_experience"
    }

    fn requirements(&self) -> &[Requirement] {
        GAIN_REQUIREMENTS
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        context.has_action(action::GAIN_EXPERIENCE)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        let Some(gained) = bindings.int(VALUE) else {
            return;
        };
        let gained = u32::try_from(gained.max(0)).unwrap_or(u32::MAX);
        context.take_action(action::GAIN_EXPERIENCE);

        let levels = edit_character(context, bindings, |character| {
            let before = character.level();
            character.experience = character.experience.saturating_add(gained);
            info!(character = %character.name, gained, total = character.experience, "gained experience");
            (before, character.level())
        });

        if let Some((before, after)) = levels {
            if after > before {
                context.reset_flag(flag::LEVEL_UP_ANNOUNCED);
                context.update(LEVEL_UP, i64::from(after));
            }
        }
    }
}

/// Announces a new level once.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelUpNotification;

impl Rule for LevelUpNotification {
    fn name(&self) -> &str {
        "level_up_notification"
    }

    fn requirements(&self) -> &[Requirement] {
        ANNOUNCE_REQUIREMENTS
    }

    fn when(&self, context: &Context, _bindings: &Bindings) -> bool {
        !context.has_flag(flag::LEVEL_UP_ANNOUNCED)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        let (Some(character), Some(level)) = (bindings.character(CHARACTER), bindings.int(LEVEL_UP))
        else {
            return;
        };
        notify(context, format!("{} reached level {}", character.name, level));
        context.set_flag(flag::LEVEL_UP_ANNOUNCED);
    }
}
