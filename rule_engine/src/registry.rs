//! Rule registry - the ordered set of rules an engine evaluates.
//!
//! Registration order matters: it is the tie-break between rules of equal
//! priority. Rule packs attach themselves through an explicit `register` call
//! from a composition root, so several independent registries can coexist.

use std::collections::HashSet;

use crate::context::ACTIONS;
use crate::error::RegistryError;
use crate::rule::{Expect, Rule};
use crate::value::ValueKind;

/// Append-only list of rules, validated on entry.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a rule.
    pub fn register(&mut self, rule: impl Rule + 'static) -> Result<(), RegistryError> {
        self.register_boxed(Box::new(rule))
    }

    /// Validate and register an already boxed rule.
    pub fn register_boxed(&mut self, rule: Box<dyn Rule>) -> Result<(), RegistryError> {
        self.validate(rule.as_ref())?;
        self.rules.push(rule);
        Ok(())
    }

    fn validate(&self, rule: &dyn Rule) -> Result<(), RegistryError> {
        let name = rule.name();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.get(name).is_some() {
            return Err(RegistryError::DuplicateRule(name.to_string()));
        }

        let requirements = rule.requirements();
        if requirements.is_empty() {
            return Err(RegistryError::NoRequirements(name.to_string()));
        }

        let mut seen = HashSet::new();
        for requirement in requirements {
            if requirement.name.is_empty() {
                return Err(RegistryError::EmptyRequirementName {
                    rule: name.to_string(),
                });
            }
            if !seen.insert(requirement.name) {
                return Err(RegistryError::DuplicateRequirement {
                    rule: name.to_string(),
                    requirement: requirement.name.to_string(),
                });
            }
            if requirement.name == ACTIONS
                && matches!(requirement.expect, Expect::Required(kind) if kind != ValueKind::TextList)
            {
                return Err(RegistryError::InvalidActionsRequirement {
                    rule: name.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get a rule by name.
    pub fn get(&self, name: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|rule| rule.name() == name)
            .map(|rule| rule.as_ref())
    }

    /// Iterate rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    /// Rule names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|rule| rule.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.names())
            .finish()
    }
}
