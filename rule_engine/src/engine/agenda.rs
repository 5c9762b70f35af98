//! Agenda - the rules selected to fire in one iteration.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::context::Context;
use crate::registry::RuleRegistry;
use crate::rule::{Bindings, Rule};

/// Priority-ordered rules for a single iteration.
///
/// Eligibility is decided once, when the agenda is built. Mutations made while it
/// fires never add or remove entries.
pub struct Agenda<'r> {
    entries: Vec<&'r dyn Rule>,
}

impl<'r> Agenda<'r> {
    /// Select candidates, evaluate their guards and order the survivors.
    ///
    /// A rule is a candidate when every requirement is satisfied and at least one
    /// requirement name is in `changed`.
    pub fn build(registry: &'r RuleRegistry, context: &Context, changed: &BTreeSet<String>) -> Self {
        let mut entries: Vec<&'r dyn Rule> = registry
            .iter()
            .filter(|rule| is_triggered(*rule, changed))
            .filter(|rule| rule.requirements().iter().all(|req| req.is_satisfied(context)))
            .filter(|rule| {
                let bindings = Bindings::bind(rule.requirements(), context);
                rule.when(context, &bindings)
            })
            .collect();

        // Stable sort: ties keep registration order.
        entries.sort_by_key(|rule| Reverse(rule.priority()));

        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'r dyn Rule> + '_ {
        self.entries.iter().copied()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|rule| rule.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_triggered(rule: &dyn Rule, changed: &BTreeSet<String>) -> bool {
    rule.requirements()
        .iter()
        .any(|req| changed.contains(req.name))
}
