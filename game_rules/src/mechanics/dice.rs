//! Dice notation and rolling.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ContentError;

/// Die sizes allowed in dice notation.
const VALID_SIDES: [u32; 7] = [4, 6, 8, 10, 12, 20, 100];

/// A roll of `count` dice with `sides` sides each, e.g. `2d6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceRoll {
    pub count: u32,
    pub sides: u32,
}

impl DiceRoll {
    pub const D20: DiceRoll = DiceRoll { count: 1, sides: 20 };

    /// Create a dice roll without validating the die size.
    pub const fn new(count: u32, sides: u32) -> Self {
        Self { count, sides }
    }

    /// Roll all dice and sum them. A roll with no dice or no sides totals 0.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        if self.sides == 0 {
            return 0;
        }
        (0..self.count)
            .map(|_| rng.gen_range(1..=self.sides) as i32)
            .fold(0, i32::saturating_add)
    }

    /// Roll twice and keep the higher total.
    pub fn roll_advantage<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        self.roll(rng).max(self.roll(rng))
    }

    /// Roll twice and keep the lower total.
    pub fn roll_disadvantage<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        self.roll(rng).min(self.roll(rng))
    }

    /// Smallest possible total.
    pub fn min(&self) -> i32 {
        if self.sides == 0 {
            return 0;
        }
        i32::try_from(self.count).unwrap_or(i32::MAX)
    }

    /// Largest possible total.
    pub fn max(&self) -> i32 {
        i32::try_from(self.count.saturating_mul(self.sides)).unwrap_or(i32::MAX)
    }
}

impl FromStr for DiceRoll {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ContentError::InvalidDice(s.to_string());

        let (count, sides) = s.split_once(['d', 'D']).ok_or_else(invalid)?;
        if count.is_empty() || count.len() > 2 || !count.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if !sides.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let count: u32 = count.parse().map_err(|_| invalid())?;
        let sides: u32 = sides.parse().map_err(|_| invalid())?;
        if count == 0 || !VALID_SIDES.contains(&sides) {
            return Err(invalid());
        }

        Ok(Self { count, sides })
    }
}

impl TryFrom<String> for DiceRoll {
    type Error = ContentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiceRoll> for String {
    fn from(roll: DiceRoll) -> Self {
        roll.to_string()
    }
}

impl std::fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}
