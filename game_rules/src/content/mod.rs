//! Content catalog - armor and weapon definitions loaded from TOML.
//!
//! Content files hold `[[armors]]` and `[[weapons]]` arrays. Each entry carries an
//! `id` that characters and rules use to look the item up.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{ContentError, ContentResult};
use crate::items::{Armor, ArmorType, DamageRoll, Weapon, WeaponType};
use crate::mechanics::Currency;

/// Bundled Player's Handbook content.
const STANDARD_CONTENT: &str = include_str!("standard.toml");

#[derive(Debug, Deserialize)]
struct ContentFile {
    #[serde(default)]
    armors: Vec<ArmorEntry>,
    #[serde(default)]
    weapons: Vec<WeaponEntry>,
}

#[derive(Debug, Deserialize)]
struct ArmorEntry {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: ArmorType,
    cost: Currency,
    weight: u32,
    armor_class: i32,
    #[serde(default)]
    minimum_strength: i32,
    #[serde(default)]
    stealth_disadvantage: bool,
}

#[derive(Debug, Deserialize)]
struct WeaponEntry {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: WeaponType,
    cost: Currency,
    damage: DamageRoll,
    weight: u32,
    #[serde(default)]
    ranged: bool,
    #[serde(default)]
    finesse: bool,
}

/// All known armor and weapons, keyed by content id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    armors: HashMap<String, Armor>,
    weapons: HashMap<String, Weapon>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled standard content.
    pub fn standard() -> ContentResult<Self> {
        Self::from_toml_str(STANDARD_CONTENT)
    }

    /// Load a content file from disk.
    pub fn load(path: impl AsRef<Path>) -> ContentResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse content from TOML text.
    pub fn from_toml_str(text: &str) -> ContentResult<Self> {
        let file: ContentFile = toml::from_str(text)?;
        let mut catalog = Self::new();
        catalog.merge(file)?;
        Ok(catalog)
    }

    /// Add the contents of another TOML document; ids must not collide.
    pub fn extend_from_toml_str(&mut self, text: &str) -> ContentResult<()> {
        let file: ContentFile = toml::from_str(text)?;
        self.merge(file)
    }

    fn merge(&mut self, file: ContentFile) -> ContentResult<()> {
        for entry in file.armors {
            if self.armors.contains_key(&entry.id) {
                return Err(ContentError::DuplicateId(entry.id));
            }
            let armor = Armor {
                name: entry.name,
                cost: entry.cost,
                armor_class: entry.armor_class,
                kind: entry.kind,
                weight: entry.weight,
                min_strength: entry.minimum_strength,
                stealth_disadvantage: entry.stealth_disadvantage,
            };
            self.armors.insert(entry.id, armor);
        }

        for entry in file.weapons {
            if self.weapons.contains_key(&entry.id) {
                return Err(ContentError::DuplicateId(entry.id));
            }
            let weapon = Weapon {
                name: entry.name,
                kind: entry.kind,
                cost: entry.cost,
                damage: entry.damage,
                weight: entry.weight,
                ranged: entry.ranged,
                finesse: entry.finesse,
            };
            self.weapons.insert(entry.id, weapon);
        }

        Ok(())
    }

    /// Get armor (or a shield) by id.
    pub fn armor(&self, id: &str) -> Option<&Armor> {
        self.armors.get(id)
    }

    /// Get a weapon by id.
    pub fn weapon(&self, id: &str) -> Option<&Weapon> {
        self.weapons.get(id)
    }

    pub fn armor_count(&self) -> usize {
        self.armors.len()
    }

    pub fn weapon_count(&self) -> usize {
        self.weapons.len()
    }
}
