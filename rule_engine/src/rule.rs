//! The rule contract: declared requirements, a guard and an action.
//!
//! Rules never introspect the context to find out what they need. Each rule
//! carries a static requirement table; the engine uses it to decide whether the
//! rule is worth evaluating and which values to bind for `when` and `then`.

use game_rules::{Ability, Armor, Character, DamageType, Skill, Weapon};
use std::collections::BTreeMap;

use crate::context::Context;
use crate::value::{Value, ValueKind};

/// What a rule expects to find under a requirement name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// Present with exactly this kind. The value is bound.
    Required(ValueKind),
    /// Present with any kind. The value is bound.
    Any,
    /// Not present. Nothing is bound.
    Absent,
}

/// One entry of a rule's requirement table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    pub name: &'static str,
    pub expect: Expect,
}

impl Requirement {
    pub const fn required(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            expect: Expect::Required(kind),
        }
    }

    pub const fn any(name: &'static str) -> Self {
        Self {
            name,
            expect: Expect::Any,
        }
    }

    pub const fn absent(name: &'static str) -> Self {
        Self {
            name,
            expect: Expect::Absent,
        }
    }

    /// Check this requirement against the current context.
    pub fn is_satisfied(&self, context: &Context) -> bool {
        let present = context.kind_of(self.name);
        match self.expect {
            Expect::Required(kind) => present == Some(kind),
            Expect::Any => present.is_some(),
            Expect::Absent => present.is_none(),
        }
    }

    /// Whether a value is bound for this requirement.
    pub fn binds_value(&self) -> bool {
        self.expect != Expect::Absent
    }
}

/// A unit of declarative behavior.
///
/// ## Contract
///
/// - `requirements` must be non-empty; a rule with nothing to watch can never be
///   triggered and is rejected at registration
/// - `when` must not have side effects; it may run many times per run
/// - `then` mutates the context; everything it changes becomes the trigger set
///   of the next iteration
pub trait Rule {
    /// Unique name, used for registration and diagnostics.
    fn name(&self) -> &str;

    /// Declared data requirements.
    fn requirements(&self) -> &[Requirement];

    /// Higher priorities fire earlier within an iteration.
    fn priority(&self) -> i32 {
        0
    }

    /// Guard: is the rule applicable to the bound values?
    fn when(&self, context: &Context, bindings: &Bindings) -> bool;

    /// Action: mutate the context.
    fn then(&self, context: &mut Context, bindings: &Bindings);
}

/// Values bound to a rule's requirements.
///
/// Bindings are copies taken from the context just before `when` or `then` runs,
/// so a rule may freely mutate the context while holding them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: BTreeMap<&'static str, Value>,
}

impl Bindings {
    /// Bind every value-carrying requirement that is currently present.
    pub fn bind(requirements: &[Requirement], context: &Context) -> Self {
        let values = requirements
            .iter()
            .filter(|req| req.binds_value())
            .filter_map(|req| context.snapshot(req.name).map(|value| (req.name, value)))
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }

    pub fn text_list(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(Value::as_text_list)
    }

    pub fn character(&self, name: &str) -> Option<&Character> {
        self.get(name).and_then(Value::as_character)
    }

    pub fn armor(&self, name: &str) -> Option<&Armor> {
        self.get(name).and_then(Value::as_armor)
    }

    pub fn weapon(&self, name: &str) -> Option<&Weapon> {
        self.get(name).and_then(Value::as_weapon)
    }

    pub fn damage_type(&self, name: &str) -> Option<DamageType> {
        self.get(name).and_then(Value::as_damage_type)
    }

    pub fn ability(&self, name: &str) -> Option<Ability> {
        self.get(name).and_then(Value::as_ability)
    }

    pub fn skill(&self, name: &str) -> Option<Skill> {
        self.get(name).and_then(Value::as_skill)
    }
}

type Guard = Box<dyn Fn(&Context, &Bindings) -> bool>;
type Action = Box<dyn Fn(&mut Context, &Bindings)>;

/// A rule assembled from closures.
///
/// Useful for small rule packs and tests where a dedicated type would be noise.
///
/// ```
/// use rule_engine::{Context, FnRule, Requirement, ValueKind};
///
/// let double = FnRule::new("double", vec![Requirement::required("value", ValueKind::Int)])
///     .with_priority(5)
///     .with_guard(|_, b| b.int("value").is_some_and(|v| v < 100))
///     .with_action(|ctx, b| {
///         if let Some(v) = b.int("value") {
///             ctx.update("value", v * 2);
///         }
///     });
/// # let _ = double;
/// ```
pub struct FnRule {
    name: String,
    requirements: Vec<Requirement>,
    priority: i32,
    guard: Guard,
    action: Action,
}

impl FnRule {
    /// Create a rule that always passes its guard and does nothing.
    pub fn new(name: impl Into<String>, requirements: Vec<Requirement>) -> Self {
        Self {
            name: name.into(),
            requirements,
            priority: 0,
            guard: Box::new(|_, _| true),
            action: Box::new(|_, _| {}),
        }
    }

    /// Set priority (builder pattern).
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the guard (builder pattern).
    #[must_use]
    pub fn with_guard(mut self, guard: impl Fn(&Context, &Bindings) -> bool + 'static) -> Self {
        self.guard = Box::new(guard);
        self
    }

    /// Set the action (builder pattern).
    #[must_use]
    pub fn with_action(mut self, action: impl Fn(&mut Context, &Bindings) + 'static) -> Self {
        self.action = Box::new(action);
        self
    }
}

impl Rule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn when(&self, context: &Context, bindings: &Bindings) -> bool {
        (self.guard)(context, bindings)
    }

    fn then(&self, context: &mut Context, bindings: &Bindings) {
        (self.action)(context, bindings)
    }
}

impl std::fmt::Debug for FnRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnRule")
            .field("name", &self.name)
            .field("requirements", &self.requirements)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ACTIONS;

    #[test]
    fn test_requirement_satisfaction() {
        let ctx = Context::with_seed(1).with("result", 13).with("name", "Hero");

        assert!(Requirement::required("result", ValueKind::Int).is_satisfied(&ctx));
        assert!(!Requirement::required("name", ValueKind::Int).is_satisfied(&ctx));
        assert!(!Requirement::required("missing", ValueKind::Int).is_satisfied(&ctx));

        assert!(Requirement::any("name").is_satisfied(&ctx));
        assert!(!Requirement::any("missing").is_satisfied(&ctx));

        assert!(Requirement::absent("missing").is_satisfied(&ctx));
        assert!(!Requirement::absent("result").is_satisfied(&ctx));
    }

    #[test]
    fn test_action_queue_requirement() {
        let req = Requirement::required(ACTIONS, ValueKind::TextList);
        let empty = Context::with_seed(1);
        assert!(!req.is_satisfied(&empty));
        assert!(Requirement::absent(ACTIONS).is_satisfied(&empty));

        let queued = Context::with_seed(1).with_action("get_armor_class");
        assert!(req.is_satisfied(&queued));
    }

    #[test]
    fn test_bindings_skip_absent_requirements() {
        let ctx = Context::with_seed(1)
            .with("value", 7)
            .with_action("get_suffered_damage");
        let reqs = [
            Requirement::required(ACTIONS, ValueKind::TextList),
            Requirement::required("value", ValueKind::Int),
            Requirement::absent("result"),
        ];

        let bindings = Bindings::bind(&reqs, &ctx);
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings.int("value"), Some(7));
        assert_eq!(
            bindings.text_list(ACTIONS),
            Some(&["get_suffered_damage".to_string()][..])
        );
        assert!(!bindings.contains("result"));
    }

    #[test]
    fn test_fn_rule_builder() {
        let rule = FnRule::new("bump", vec![Requirement::required("value", ValueKind::Int)])
            .with_priority(-1)
            .with_guard(|_, b| b.int("value") == Some(1))
            .with_action(|ctx, _| {
                ctx.update("value", 2);
            });

        assert_eq!(rule.name(), "bump");
        assert_eq!(rule.priority(), -1);

        let mut ctx = Context::with_seed(1).with("value", 1);
        let bindings = Bindings::bind(rule.requirements(), &ctx);
        assert!(rule.when(&ctx, &bindings));
        rule.then(&mut ctx, &bindings);
        assert_eq!(ctx.get_int("value"), Some(2));
    }
}
