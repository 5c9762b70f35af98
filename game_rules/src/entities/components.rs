//! Component definitions for characters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::items::{ArmorType, WeaponType};
use crate::mechanics::{Ability, Skill};

/// The six ability scores of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

impl AbilityScores {
    /// Raw score for an ability.
    pub fn score(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, score: i32) {
        let slot = match ability {
            Ability::Strength => &mut self.strength,
            Ability::Dexterity => &mut self.dexterity,
            Ability::Constitution => &mut self.constitution,
            Ability::Intelligence => &mut self.intelligence,
            Ability::Wisdom => &mut self.wisdom,
            Ability::Charisma => &mut self.charisma,
        };
        *slot = score;
    }

    /// Modifier for an ability: `floor((score - 10) / 2)`.
    pub fn modifier(&self, ability: Ability) -> i32 {
        (self.score(ability) - 10).div_euclid(2)
    }
}

/// Everything a character is trained in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Proficiencies {
    pub saving_throws: BTreeSet<Ability>,
    pub skills: Vec<Skill>,
    pub armor_types: Vec<ArmorType>,
    pub weapon_types: Vec<WeaponType>,
    /// Individual weapons by name, on top of `weapon_types`.
    pub weapons: BTreeSet<String>,
}

/// Death saving throw tally while at zero hitpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeathSaves {
    pub successes: u32,
    pub failures: u32,
}

impl DeathSaves {
    /// Three failures mean death.
    pub const LIMIT: u32 = 3;

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_dead(&self) -> bool {
        self.failures >= Self::LIMIT
    }

    pub fn is_stabilized(&self) -> bool {
        self.successes >= Self::LIMIT
    }
}
