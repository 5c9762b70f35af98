//! # Game Rules
//!
//! The "World Bible" crate - abilities, dice, currency, items, characters and the
//! content catalog. This crate holds data and derived values only; every rule that
//! reacts to game actions lives in `rule_engine`.

pub mod content;
pub mod entities;
pub mod error;
pub mod items;
pub mod mechanics;

pub use content::*;
pub use entities::*;
pub use error::*;
pub use items::*;
pub use mechanics::*;
