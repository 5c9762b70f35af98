//! Errors raised while parsing and loading game content.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Unrecognized dice format: \"{0}\"")]
    InvalidDice(String),

    #[error("Unrecognized currency format: \"{0}\"")]
    InvalidCurrency(String),

    #[error("Unrecognized damage roll format: \"{0}\"")]
    InvalidDamage(String),

    #[error("Unrecognized damage type: \"{0}\"")]
    UnknownDamageType(String),

    #[error("Duplicate item id: {0}")]
    DuplicateId(String),

    #[error("Failed to read content file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed content file: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type ContentResult<T> = Result<T, ContentError>;
