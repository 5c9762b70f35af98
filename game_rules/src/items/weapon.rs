//! Weapons and their damage rolls.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ContentError;
use crate::mechanics::{Currency, DamageType, DiceRoll};

/// Weapon proficiency groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponType {
    Simple,
    Martial,
}

/// Amount of damage a weapon deals: either dice or a fixed number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageAmount {
    Dice(DiceRoll),
    Fixed(i32),
}

/// Damage dealt by a weapon, e.g. `1d8 slashing` or `1 piercing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DamageRoll {
    pub amount: DamageAmount,
    pub damage_type: DamageType,
}

impl DamageRoll {
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        match self.amount {
            DamageAmount::Dice(dice) => dice.roll(rng),
            DamageAmount::Fixed(value) => value,
        }
    }
}

impl FromStr for DamageRoll {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ContentError::InvalidDamage(s.to_string());

        let (amount, damage_type) = s.trim().split_once(char::is_whitespace).ok_or_else(invalid)?;
        let amount = if amount.bytes().all(|b| b.is_ascii_digit()) {
            DamageAmount::Fixed(amount.parse().map_err(|_| invalid())?)
        } else {
            DamageAmount::Dice(amount.parse().map_err(|_| invalid())?)
        };

        Ok(Self {
            amount,
            damage_type: damage_type.parse()?,
        })
    }
}

impl TryFrom<String> for DamageRoll {
    type Error = ContentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DamageRoll> for String {
    fn from(roll: DamageRoll) -> Self {
        roll.to_string()
    }
}

impl std::fmt::Display for DamageRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.amount {
            DamageAmount::Dice(dice) => write!(f, "{} {}", dice, self.damage_type),
            DamageAmount::Fixed(value) => write!(f, "{} {}", value, self.damage_type),
        }
    }
}

/// A weapon definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub kind: WeaponType,
    pub cost: Currency,
    pub damage: DamageRoll,
    pub weight: u32,
    /// Ranged weapons use DEX for attack and damage.
    pub ranged: bool,
    /// Finesse weapons use the better of STR and DEX.
    pub finesse: bool,
}

impl Weapon {
    pub fn new(name: impl Into<String>, kind: WeaponType, damage: DamageRoll) -> Self {
        Self {
            name: name.into(),
            kind,
            cost: Currency::default(),
            damage,
            weight: 0,
            ranged: false,
            finesse: false,
        }
    }

    pub fn roll_damage<R: Rng + ?Sized>(&self, rng: &mut R) -> (i32, DamageType) {
        (self.damage.roll(rng), self.damage.damage_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_parse_damage_roll() {
        let roll: DamageRoll = "1d8 slashing".parse().unwrap();
        assert_eq!(roll.amount, DamageAmount::Dice(DiceRoll::new(1, 8)));
        assert_eq!(roll.damage_type, DamageType::Slashing);

        let fixed: DamageRoll = "1 piercing".parse().unwrap();
        assert_eq!(fixed.amount, DamageAmount::Fixed(1));
        assert_eq!(fixed.damage_type, DamageType::Piercing);
    }

    #[test]
    fn test_parse_damage_roll_errors() {
        assert!(matches!(
            "slashing".parse::<DamageRoll>(),
            Err(ContentError::InvalidDamage(_))
        ));
        assert!(matches!(
            "1d7 fire".parse::<DamageRoll>(),
            Err(ContentError::InvalidDamage(_))
        ));
        assert!(matches!(
            "1d6 sonic".parse::<DamageRoll>(),
            Err(ContentError::UnknownDamageType(_))
        ));
    }

    #[test]
    fn test_fixed_damage_always_rolls_same_value() {
        let weapon = Weapon::new("Blowgun", WeaponType::Martial, "1 piercing".parse().unwrap());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(weapon.roll_damage(&mut rng), (1, DamageType::Piercing));
    }
}
