//! Coinage. Every amount is normalized to copper pieces.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ContentError;

/// Coin denominations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrencyType {
    Copper,
    Silver,
    Electrum,
    Gold,
    Platinum,
}

impl CurrencyType {
    /// Worth of one coin in copper pieces.
    pub fn copper_value(&self) -> u64 {
        match self {
            CurrencyType::Copper => 1,
            CurrencyType::Silver => 10,
            CurrencyType::Electrum => 50,
            CurrencyType::Gold => 100,
            CurrencyType::Platinum => 1000,
        }
    }

    fn from_abbreviation(abbreviation: &str) -> Option<Self> {
        match abbreviation {
            "cp" => Some(CurrencyType::Copper),
            "sp" => Some(CurrencyType::Silver),
            "ep" => Some(CurrencyType::Electrum),
            "gp" => Some(CurrencyType::Gold),
            "pp" => Some(CurrencyType::Platinum),
            _ => None,
        }
    }
}

/// An amount of money, stored as copper pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency {
    pub copper: u64,
}

impl Currency {
    pub fn new(amount: u64, kind: CurrencyType) -> Self {
        Self {
            copper: amount * kind.copper_value(),
        }
    }
}

impl FromStr for Currency {
    type Err = ContentError;

    /// Parses `"<amount> <cp|sp|ep|gp|pp>"`, e.g. `"45 gp"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ContentError::InvalidCurrency(s.to_string());

        let (amount, unit) = s.split_once(' ').ok_or_else(invalid)?;
        if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let amount: u64 = amount.parse().map_err(|_| invalid())?;
        let kind = CurrencyType::from_abbreviation(unit).ok_or_else(invalid)?;

        Ok(Currency::new(amount, kind))
    }
}

impl TryFrom<String> for Currency {
    type Error = ContentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.to_string()
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} cp", self.copper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency() {
        assert_eq!("5 cp".parse::<Currency>().unwrap().copper, 5);
        assert_eq!("5 sp".parse::<Currency>().unwrap().copper, 50);
        assert_eq!("2 ep".parse::<Currency>().unwrap().copper, 100);
        assert_eq!("45 gp".parse::<Currency>().unwrap().copper, 4500);
        assert_eq!("1 pp".parse::<Currency>().unwrap().copper, 1000);
    }

    #[test]
    fn test_parse_currency_rejects_malformed() {
        for bad in ["", "gp", "5gp", "5 xp", "-5 gp", "5  gp"] {
            assert!(bad.parse::<Currency>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_currency_ordering() {
        assert!(Currency::new(1, CurrencyType::Gold) > Currency::new(9, CurrencyType::Silver));
    }
}
