//! # Rule Engine
//!
//! A forward-chaining production system for the d20 rules in `game_rules`.
//!
//! Rules declare what data they need, a guard and an action. The [`Engine`] keeps
//! firing the rules whose inputs changed until the [`Context`] stops changing:
//!
//! ```
//! use game_rules::{Ability, Character};
//! use rule_engine::rules::{self, action, CHARACTER, RESULT};
//! use rule_engine::{Context, Engine};
//!
//! let engine = Engine::new(rules::standard_registry()?);
//! let hero = Character::new("Hero").with_ability(Ability::Dexterity, 16);
//! let context = Context::new()
//!     .with(CHARACTER, hero)
//!     .with_action(action::GET_ARMOR_CLASS);
//!
//! let context = engine.execute(context)?;
//! assert_eq!(context.get_int(RESULT), Some(13));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod registry;
pub mod rule;
pub mod rules;
pub mod value;

pub use context::{Context, ACTIONS};
pub use engine::{Agenda, Engine, EngineConfig, RunReport};
pub use error::{ConfigError, EngineError, EngineResult, RegistryError};
pub use registry::RuleRegistry;
pub use rule::{Bindings, Expect, FnRule, Requirement, Rule};
pub use value::{Value, ValueKind};
