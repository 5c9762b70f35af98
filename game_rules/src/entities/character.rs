//! Character definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{AbilityScores, CharacterId, DeathSaves, Proficiencies};
use crate::items::{Armor, ArmorType, Weapon};
use crate::mechanics::{Ability, Condition, DamageType, DiceRoll, Skill};

/// Minimum experience and proficiency bonus for levels 1 through 20.
const LEVEL_TABLE: [(u32, i32); 20] = [
    (0, 2),
    (300, 2),
    (900, 2),
    (2_700, 2),
    (6_500, 3),
    (14_000, 3),
    (23_000, 3),
    (34_000, 3),
    (48_000, 4),
    (64_000, 4),
    (85_000, 4),
    (100_000, 4),
    (120_000, 5),
    (140_000, 5),
    (165_000, 5),
    (195_000, 5),
    (225_000, 6),
    (265_000, 6),
    (305_000, 6),
    (355_000, 6),
];

/// Speed lost when wearing armor without the required strength.
const ARMOR_SPEED_PENALTY: i32 = 10;

/// A player character or creature with everything the rules read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub experience: u32,
    pub abilities: AbilityScores,
    pub proficiencies: Proficiencies,

    pub hitpoints: i32,
    pub max_hitpoints: i32,
    pub temporary_hitpoints: i32,
    pub hit_dice: DiceRoll,
    pub num_hit_dice: u32,

    pub vulnerabilities: BTreeSet<DamageType>,
    pub resistances: BTreeSet<DamageType>,
    pub immunities: BTreeSet<DamageType>,

    pub base_speed: i32,
    pub equipped_armor: Option<Armor>,
    pub equipped_shield: Option<Armor>,
    pub equipped_weapon: Option<Weapon>,

    pub conditions: BTreeSet<Condition>,
    pub death_saves: DeathSaves,
}

impl Character {
    /// Create a new level 1 character with average scores.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::random(),
            name: name.into(),
            experience: 0,
            abilities: AbilityScores::default(),
            proficiencies: Proficiencies::default(),
            hitpoints: 30,
            max_hitpoints: 30,
            temporary_hitpoints: 0,
            hit_dice: DiceRoll::new(1, 8),
            num_hit_dice: 1,
            vulnerabilities: BTreeSet::new(),
            resistances: BTreeSet::new(),
            immunities: BTreeSet::new(),
            base_speed: 30,
            equipped_armor: None,
            equipped_shield: None,
            equipped_weapon: None,
            conditions: BTreeSet::new(),
            death_saves: DeathSaves::default(),
        }
    }

    /// Set an ability score (builder pattern).
    pub fn with_ability(mut self, ability: Ability, score: i32) -> Self {
        self.abilities.set(ability, score);
        self
    }

    /// Equip body armor or a shield (builder pattern).
    pub fn with_armor(mut self, armor: Armor) -> Self {
        self.equip_armor(armor);
        self
    }

    /// Equip a weapon (builder pattern).
    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.equipped_weapon = Some(weapon);
        self
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        self.abilities.modifier(ability)
    }

    /// Current level derived from experience.
    pub fn level(&self) -> u32 {
        LEVEL_TABLE
            .iter()
            .take_while(|(xp, _)| self.experience >= *xp)
            .count() as u32
    }

    /// Proficiency bonus for the current level.
    pub fn proficiency_bonus(&self) -> i32 {
        let index = (self.level() as usize).saturating_sub(1);
        LEVEL_TABLE[index].1
    }

    /// Movement speed; heavy armor without enough strength slows the wearer.
    pub fn speed(&self) -> i32 {
        match &self.equipped_armor {
            Some(armor) if self.lacks_strength_for(armor) => {
                self.base_speed - ARMOR_SPEED_PENALTY
            }
            _ => self.base_speed,
        }
    }

    pub fn lacks_strength_for(&self, armor: &Armor) -> bool {
        armor.min_strength > self.abilities.strength
    }

    /// Put on body armor, or a shield if `armor` is one. Returns what was replaced.
    pub fn equip_armor(&mut self, armor: Armor) -> Option<Armor> {
        if armor.is_shield() {
            self.equipped_shield.replace(armor)
        } else {
            self.equipped_armor.replace(armor)
        }
    }

    pub fn is_proficient_with_armor(&self, kind: ArmorType) -> bool {
        self.proficiencies.armor_types.contains(&kind)
    }

    /// Wearing armor without proficiency hampers STR and DEX rolls.
    pub fn has_armor_penalty(&self, ability: Ability) -> bool {
        matches!(ability, Ability::Strength | Ability::Dexterity)
            && self
                .equipped_armor
                .as_ref()
                .is_some_and(|armor| !self.is_proficient_with_armor(armor.kind))
    }

    pub fn is_proficient_in_skill(&self, skill: Skill) -> bool {
        self.proficiencies.skills.contains(&skill)
    }

    pub fn is_proficient_in_saving_throw(&self, ability: Ability) -> bool {
        self.proficiencies.saving_throws.contains(&ability)
    }

    /// Proficiency with the equipped weapon; unarmed strikes always count.
    pub fn is_proficient_with_weapon(&self) -> bool {
        match &self.equipped_weapon {
            None => true,
            Some(weapon) => {
                self.proficiencies.weapons.contains(&weapon.name)
                    || self.proficiencies.weapon_types.contains(&weapon.kind)
            }
        }
    }

    /// Modifier applied to attack and damage rolls with the equipped weapon.
    pub fn weapon_modifier(&self) -> i32 {
        let strength = self.modifier(Ability::Strength);
        let dexterity = self.modifier(Ability::Dexterity);
        match &self.equipped_weapon {
            None => strength,
            Some(weapon) if weapon.finesse => strength.max(dexterity),
            Some(weapon) if weapon.ranged => dexterity,
            Some(_) => strength,
        }
    }

    /// Check if the character is above zero hitpoints.
    pub fn is_alive(&self) -> bool {
        self.hitpoints > 0
    }

    pub fn has_condition(&self, condition: Condition) -> bool {
        self.conditions.contains(&condition)
    }

    /// Lose hitpoints, temporary hitpoints first. Returns damage left over past zero.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let absorbed = amount.min(self.temporary_hitpoints).max(0);
        self.temporary_hitpoints -= absorbed;
        let amount = amount - absorbed;

        let overflow = amount.saturating_sub(self.hitpoints);
        self.hitpoints = self.hitpoints.saturating_sub(amount).max(0);
        if self.hitpoints == 0 {
            self.conditions.insert(Condition::Unconscious);
        }
        overflow.max(0)
    }

    /// Regain hitpoints up to the maximum. Healing from zero ends unconsciousness.
    pub fn heal(&mut self, amount: i32) {
        if self.hitpoints == 0 {
            self.conditions.remove(&Condition::Stable);
            self.conditions.remove(&Condition::Unconscious);
            self.death_saves.reset();
        }
        self.hitpoints = self.hitpoints.saturating_add(amount).min(self.max_hitpoints);
    }
}
