//! Error types for rule registration, engine runs and configuration.

use std::time::Duration;
use thiserror::Error;

/// Malformed rule metadata, detected at registration time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Rule name must not be empty")]
    EmptyName,

    #[error("Rule already registered: {0}")]
    DuplicateRule(String),

    #[error("Rule {0} declares no requirements and could never be triggered")]
    NoRequirements(String),

    #[error("Rule {rule} declares an empty requirement name")]
    EmptyRequirementName { rule: String },

    #[error("Rule {rule} declares requirement {requirement} more than once")]
    DuplicateRequirement { rule: String, requirement: String },

    #[error("Rule {rule} expects the action queue to be something other than a text list")]
    InvalidActionsRequirement { rule: String },
}

/// A run that could not reach a fixpoint within its budget.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Rules did not converge after {iterations} iterations (still changing: {changed:?})")]
    DidNotConverge {
        iterations: usize,
        changed: Vec<String>,
    },

    #[error("Time budget exhausted after {iterations} iterations ({elapsed:?})")]
    BudgetExhausted { iterations: usize, elapsed: Duration },
}

/// Engine configuration that could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
