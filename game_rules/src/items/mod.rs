//! Equipment definitions: armor, shields and weapons.

mod armor;
mod weapon;

pub use armor::*;
pub use weapon::*;
