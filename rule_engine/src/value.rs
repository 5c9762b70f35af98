//! Attribute values stored in the context.
//!
//! The attribute vocabulary is closed, so values are a tagged union instead of
//! type-erased boxes. Rules declare the [`ValueKind`] they expect and the engine
//! compares kinds during matching.

use game_rules::{Ability, Armor, Character, DamageType, Skill, Weapon};
use serde::{Deserialize, Serialize};

/// A dynamically typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Text(String),
    TextList(Vec<String>),
    Character(Box<Character>),
    Armor(Armor),
    Weapon(Weapon),
    DamageType(DamageType),
    Ability(Ability),
    Skill(Skill),
}

/// The type tag of a [`Value`], used in rule requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Int,
    Bool,
    Text,
    TextList,
    Character,
    Armor,
    Weapon,
    DamageType,
    Ability,
    Skill,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Bool(_) => ValueKind::Bool,
            Value::Text(_) => ValueKind::Text,
            Value::TextList(_) => ValueKind::TextList,
            Value::Character(_) => ValueKind::Character,
            Value::Armor(_) => ValueKind::Armor,
            Value::Weapon(_) => ValueKind::Weapon,
            Value::DamageType(_) => ValueKind::DamageType,
            Value::Ability(_) => ValueKind::Ability,
            Value::Skill(_) => ValueKind::Skill,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text_list(&self) -> Option<&[String]> {
        match self {
            Value::TextList(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_character(&self) -> Option<&Character> {
        match self {
            Value::Character(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_armor(&self) -> Option<&Armor> {
        match self {
            Value::Armor(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_weapon(&self) -> Option<&Weapon> {
        match self {
            Value::Weapon(w) => Some(w),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_damage_type(&self) -> Option<DamageType> {
        match self {
            Value::DamageType(d) => Some(*d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_ability(&self) -> Option<Ability> {
        match self {
            Value::Ability(a) => Some(*a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_skill(&self) -> Option<Skill> {
        match self {
            Value::Skill(s) => Some(*s),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::TextList(v)
    }
}

impl From<Character> for Value {
    fn from(v: Character) -> Self {
        Value::Character(Box::new(v))
    }
}

impl From<Armor> for Value {
    fn from(v: Armor) -> Self {
        Value::Armor(v)
    }
}

impl From<Weapon> for Value {
    fn from(v: Weapon) -> Self {
        Value::Weapon(v)
    }
}

impl From<DamageType> for Value {
    fn from(v: DamageType) -> Self {
        Value::DamageType(v)
    }
}

impl From<Ability> for Value {
    fn from(v: Ability) -> Self {
        Value::Ability(v)
    }
}

impl From<Skill> for Value {
    fn from(v: Skill) -> Self {
        Value::Skill(v)
    }
}
