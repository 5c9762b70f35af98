//! Engine - runs registered rules against a context until it stops changing.
//!
//! Each iteration:
//! 1. **Drain**: take the names changed since the previous iteration
//! 2. **Match**: keep rules whose requirements hold and overlap the changed names
//! 3. **Guard**: keep rules whose `when` accepts the bound values
//! 4. **Order**: sort by priority, highest first, ties in registration order
//! 5. **Fire**: run every `then` in order, mutating the context in place
//!
//! The run ends once an iteration changes nothing.

mod agenda;

pub use agenda::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::context::Context;
use crate::error::{ConfigError, EngineError, EngineResult};
use crate::registry::RuleRegistry;
use crate::rule::Bindings;

/// Safety limits for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of iterations before the run is declared divergent.
    pub max_iterations: Option<usize>,

    /// Wall-clock budget for one run, in milliseconds.
    pub max_duration_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: Some(1000),
            max_duration_ms: None,
        }
    }
}

impl EngineConfig {
    /// No iteration or time limit. Rules must converge on their own.
    pub fn unbounded() -> Self {
        Self {
            max_iterations: None,
            max_duration_ms: None,
        }
    }

    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_ms.map(Duration::from_millis)
    }
}

/// What happened during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Fired rule names, one entry per iteration.
    pub agendas: Vec<Vec<String>>,

    /// Action tokens still queued when the context stopped changing.
    pub unhandled_actions: Vec<String>,
}

impl RunReport {
    pub fn iterations(&self) -> usize {
        self.agendas.len()
    }

    /// Every fired rule in firing order.
    pub fn fired(&self) -> impl Iterator<Item = &str> {
        self.agendas.iter().flatten().map(String::as_str)
    }

    pub fn fired_count(&self, rule: &str) -> usize {
        self.fired().filter(|name| *name == rule).count()
    }
}

/// Forward-chaining engine over an immutable rule registry.
#[derive(Debug)]
pub struct Engine {
    registry: RuleRegistry,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with the default safety limits.
    pub fn new(registry: RuleRegistry) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    pub fn with_config(registry: RuleRegistry, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run to a fixpoint and hand the stabilized context back.
    pub fn execute(&self, mut context: Context) -> EngineResult<Context> {
        self.run(&mut context)?;
        Ok(context)
    }

    /// Run to a fixpoint in place.
    pub fn run(&self, context: &mut Context) -> EngineResult<RunReport> {
        let started = Instant::now();
        let max_duration = self.config.max_duration();
        let mut report = RunReport::default();
        let mut changed = context.drain_changed();

        while !changed.is_empty() {
            let iterations = report.iterations();
            if self.config.max_iterations.is_some_and(|max| iterations >= max) {
                return Err(EngineError::DidNotConverge {
                    iterations,
                    changed: changed.into_iter().collect(),
                });
            }
            if let Some(budget) = max_duration {
                let elapsed = started.elapsed();
                if elapsed > budget {
                    return Err(EngineError::BudgetExhausted { iterations, elapsed });
                }
            }

            let agenda = Agenda::build(&self.registry, context, &changed);
            debug!(
                iteration = iterations + 1,
                changed = ?changed,
                agenda = ?agenda.names(),
                "evaluating rules"
            );

            for rule in agenda.iter() {
                // Re-bind so earlier rules in this batch are visible.
                let bindings = Bindings::bind(rule.requirements(), context);
                trace!(rule = rule.name(), priority = rule.priority(), "firing rule");
                rule.then(context, &bindings);
            }

            report.agendas.push(agenda.names());
            changed = context.drain_changed();
        }

        if !context.actions().is_empty() {
            warn!(actions = ?context.actions(), "no rule handled the remaining actions");
            report.unhandled_actions = context.actions().to_vec();
        }

        debug!(iterations = report.iterations(), "context stabilized");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ACTIONS;
    use crate::rule::{FnRule, Requirement};
    use crate::value::ValueKind;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine(rules: Vec<FnRule>) -> Engine {
        let mut registry = RuleRegistry::new();
        for rule in rules {
            registry.register(rule).unwrap();
        }
        Engine::new(registry)
    }

    fn doubler() -> FnRule {
        FnRule::new("double", vec![Requirement::required("value", ValueKind::Int)])
            .with_guard(|_, b| b.int("value").is_some_and(|v| v < 100))
            .with_action(|ctx, b| {
                if let Some(v) = b.int("value") {
                    ctx.update("value", v * 2);
                }
            })
    }

    #[test]
    fn test_reaches_fixpoint() {
        let engine = engine(vec![doubler()]);
        let mut ctx = Context::with_seed(1).with("value", 3);

        let report = engine.run(&mut ctx).unwrap();
        assert_eq!(ctx.get_int("value"), Some(192));
        assert_eq!(report.fired_count("double"), 6);
        assert!(report.unhandled_actions.is_empty());
    }

    #[test]
    fn test_second_run_is_idle() {
        let engine = engine(vec![doubler()]);
        let ctx = engine.execute(Context::with_seed(1).with("value", 5)).unwrap();
        let value = ctx.get_int("value");

        let mut ctx = ctx;
        let report = engine.run(&mut ctx).unwrap();
        assert_eq!(report.iterations(), 0);
        assert_eq!(ctx.get_int("value"), value);
    }

    #[test]
    fn test_empty_context_does_nothing() {
        let engine = engine(vec![doubler()]);
        let report = engine.run(&mut Context::with_seed(1)).unwrap();
        assert_eq!(report, RunReport::default());
    }

    #[test]
    fn test_change_gating() {
        let engine = engine(vec![
            FnRule::new("set_y", vec![Requirement::required("x", ValueKind::Int)]).with_action(
                |ctx, b| {
                    if let Some(x) = b.int("x") {
                        ctx.update("y", x + 1);
                    }
                },
            ),
            FnRule::new("watch_x", vec![Requirement::required("x", ValueKind::Int)]),
        ]);
        let mut ctx = Context::with_seed(1).with("x", 1);

        let report = engine.run(&mut ctx).unwrap();
        assert_eq!(report.agendas[0], vec!["set_y", "watch_x"]);
        // `y` changed in iteration 1; `x` did not, so nothing watching `x` fires again.
        assert_eq!(report.iterations(), 2);
        assert!(report.agendas[1].is_empty());
        assert_eq!(report.fired_count("watch_x"), 1);
    }

    #[test]
    fn test_absence_gating_is_live() {
        let engine = engine(vec![
            FnRule::new(
                "produce",
                vec![Requirement::any("input"), Requirement::absent("result")],
            )
            .with_action(|ctx, _| {
                ctx.update("result", 1);
            }),
        ]);

        let mut ctx = Context::with_seed(1).with("input", 1);
        let report = engine.run(&mut ctx).unwrap();
        assert_eq!(report.fired_count("produce"), 1);
        assert_eq!(ctx.get_int("result"), Some(1));

        ctx.update("input", 2);
        let report = engine.run(&mut ctx).unwrap();
        assert_eq!(report.fired_count("produce"), 0);

        ctx.remove("result");
        let report = engine.run(&mut ctx).unwrap();
        assert_eq!(report.fired_count("produce"), 1);
        assert_eq!(ctx.get_int("result"), Some(1));
    }

    #[test]
    fn test_priority_and_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let recorder = |name: &'static str, priority: i32| {
            let order = Rc::clone(&order);
            FnRule::new(name, vec![Requirement::any("x")])
                .with_priority(priority)
                .with_action(move |_, _| order.borrow_mut().push(name))
        };

        let engine = engine(vec![
            recorder("low", -1),
            recorder("first_tie", 0),
            recorder("high", 5),
            recorder("second_tie", 0),
        ]);
        engine.execute(Context::with_seed(1).with("x", 1)).unwrap();

        assert_eq!(
            *order.borrow(),
            vec!["high", "first_tie", "second_tie", "low"]
        );
    }

    #[test]
    fn test_agenda_is_fixed_per_iteration() {
        let engine = engine(vec![
            FnRule::new("claim", vec![Requirement::any("x")])
                .with_priority(5)
                .with_action(|ctx, _| {
                    ctx.update("result", 1);
                }),
            FnRule::new(
                "fallback",
                vec![Requirement::any("x"), Requirement::absent("result")],
            )
            .with_action(|ctx, _| {
                ctx.update("fallback_fired", true);
            }),
            FnRule::new("react", vec![Requirement::required("result", ValueKind::Int)])
                .with_priority(-5),
        ]);

        let mut ctx = Context::with_seed(1).with("x", 1);
        let report = engine.run(&mut ctx).unwrap();

        // `fallback` was selected before `claim` set `result`, so it still fires.
        assert_eq!(report.agendas[0], vec!["claim", "fallback"]);
        assert_eq!(ctx.get_bool("fallback_fired"), Some(true));
        // `react` only sees the new `result` in the next iteration.
        assert_eq!(report.agendas[1], vec!["react"]);
    }

    #[test]
    fn test_bindings_see_earlier_mutations() {
        let engine = engine(vec![
            FnRule::new("bump", vec![Requirement::required("x", ValueKind::Int)])
                .with_priority(1)
                .with_action(|ctx, _| {
                    ctx.update("y", 10);
                }),
            FnRule::new(
                "copy",
                vec![Requirement::any("x"), Requirement::required("y", ValueKind::Int)],
            )
            .with_action(|ctx, b| {
                if let Some(y) = b.int("y") {
                    ctx.update("copied", y);
                }
            }),
        ]);

        let ctx = engine
            .execute(Context::with_seed(1).with("x", 1).with("y", 0))
            .unwrap();
        assert_eq!(ctx.get_int("copied"), Some(10));
    }

    #[test]
    fn test_actions_trigger_rules() {
        let engine = engine(vec![FnRule::new(
            "answer",
            vec![Requirement::required(ACTIONS, ValueKind::TextList)],
        )
        .with_guard(|ctx, _| ctx.has_action("ask"))
        .with_action(|ctx, _| {
            ctx.take_action("ask");
            ctx.update("result", 42);
        })]);

        let mut ctx = Context::with_seed(1).with_action("ask").with_action("ignored");
        let report = engine.run(&mut ctx).unwrap();

        assert_eq!(ctx.get_int("result"), Some(42));
        assert_eq!(report.unhandled_actions, vec!["ignored".to_string()]);
        assert_eq!(ctx.actions(), ["ignored".to_string()]);
    }

    #[test]
    fn test_oscillation_hits_iteration_limit() {
        let flip = FnRule::new("flip", vec![Requirement::required("on", ValueKind::Bool)])
            .with_action(|ctx, b| {
                if let Some(on) = b.get("on").and_then(|v| v.as_bool()) {
                    ctx.update("on", !on);
                }
            });
        let mut registry = RuleRegistry::new();
        registry.register(flip).unwrap();
        let engine = Engine::with_config(
            registry,
            EngineConfig {
                max_iterations: Some(10),
                max_duration_ms: None,
            },
        );

        let err = engine
            .execute(Context::with_seed(1).with("on", true))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::DidNotConverge {
                iterations: 10,
                changed: vec!["on".to_string()],
            }
        );
    }

    #[test]
    fn test_time_budget() {
        let slow = FnRule::new("slow", vec![Requirement::required("n", ValueKind::Int)])
            .with_action(|ctx, b| {
                std::thread::sleep(Duration::from_millis(2));
                if let Some(n) = b.int("n") {
                    ctx.update("n", n + 1);
                }
            });
        let mut registry = RuleRegistry::new();
        registry.register(slow).unwrap();
        let engine = Engine::with_config(
            registry,
            EngineConfig {
                max_iterations: None,
                max_duration_ms: Some(1),
            },
        );

        let err = engine.execute(Context::with_seed(1).with("n", 0)).unwrap_err();
        assert!(matches!(err, EngineError::BudgetExhausted { iterations, .. } if iterations >= 1));
    }

    #[test]
    fn test_config_from_toml() {
        let config = EngineConfig::from_toml_str("max_duration_ms = 250").unwrap();
        assert_eq!(config.max_iterations, Some(1000));
        assert_eq!(config.max_duration(), Some(Duration::from_millis(250)));

        let config = EngineConfig::from_toml_str("max_iterations = 5").unwrap();
        assert_eq!(config.max_iterations, Some(5));
        assert_eq!(config.max_duration(), None);

        assert!(EngineConfig::from_toml_str("max_iterations = \"many\"").is_err());
        assert_eq!(EngineConfig::unbounded().max_iterations, None);
    }

    proptest! {
        #[test]
        fn prop_doubling_converges_and_is_idempotent(start in 1i64..100) {
            let engine = engine(vec![doubler()]);
            let mut ctx = Context::with_seed(1).with("value", start);

            engine.run(&mut ctx).unwrap();
            let value = ctx.get_int("value").unwrap();
            prop_assert!(value >= 100 && value < 200);

            let report = engine.run(&mut ctx).unwrap();
            prop_assert_eq!(report.iterations(), 0);
            prop_assert_eq!(ctx.get_int("value"), Some(value));
        }
    }
}
