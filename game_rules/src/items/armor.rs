//! Armor and shields.

use serde::{Deserialize, Serialize};

use crate::mechanics::Currency;

/// Armor categories. Shields are worn in addition to body armor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorType {
    Light,
    Medium,
    Heavy,
    Shield,
}

/// A piece of armor or a shield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Armor {
    pub name: String,
    pub cost: Currency,
    /// Base armor class for body armor, bonus for shields.
    pub armor_class: i32,
    pub kind: ArmorType,
    pub weight: u32,
    /// Minimum strength score to avoid the speed penalty.
    pub min_strength: i32,
    pub stealth_disadvantage: bool,
}

impl Armor {
    /// Create armor with no cost, weight or drawbacks.
    pub fn new(name: impl Into<String>, kind: ArmorType, armor_class: i32) -> Self {
        Self {
            name: name.into(),
            cost: Currency::default(),
            armor_class,
            kind,
            weight: 0,
            min_strength: 0,
            stealth_disadvantage: false,
        }
    }

    /// Set the minimum strength requirement.
    pub fn with_min_strength(mut self, min_strength: i32) -> Self {
        self.min_strength = min_strength;
        self
    }

    /// Mark the armor as imposing disadvantage on stealth checks.
    pub fn with_stealth_disadvantage(mut self) -> Self {
        self.stealth_disadvantage = true;
        self
    }

    pub fn is_shield(&self) -> bool {
        self.kind == ArmorType::Shield
    }
}
