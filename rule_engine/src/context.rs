//! The fact base that rules read and write during a run.
//!
//! A [`Context`] holds four independent pieces of state:
//! - **attributes**: named [`Value`]s
//! - **changed**: names touched since the last drain, which drive rule matching
//! - **flags**: one-shot markers that never count as changes
//! - **actions**: the queue of pending intents, exposed to rules under [`ACTIONS`]

use game_rules::{Ability, Armor, Character, DamageType, Skill, Weapon};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

use crate::value::{Value, ValueKind};

/// Reserved attribute name for the action queue.
///
/// The queue counts as present while it holds at least one token, and its kind is
/// [`ValueKind::TextList`]. Pushing or taking a token marks it changed.
pub const ACTIONS: &str = "actions";

/// Mutable fact base for one engine run.
#[derive(Debug, Clone)]
pub struct Context {
    attributes: HashMap<String, Value>,
    changed: BTreeSet<String>,
    flags: BTreeSet<String>,
    actions: Vec<String>,
    rng: ChaCha8Rng,
}

impl Default for Context {
    fn default() -> Self {
        Self::with_seed(rand::random())
    }
}

impl Context {
    /// Create an empty context with a random dice seed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty context whose dice rolls are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            attributes: HashMap::new(),
            changed: BTreeSet::new(),
            flags: BTreeSet::new(),
            actions: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seed an action token (builder pattern).
    #[must_use]
    pub fn with_action(mut self, token: impl Into<String>) -> Self {
        self.push_action(token);
        self
    }

    /// Seed an attribute (builder pattern).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.update(key, value);
        self
    }

    // === Attributes ===

    /// Set an attribute. Returns whether the stored value changed.
    ///
    /// Writing [`ACTIONS`] with a text list replaces the action queue.
    pub fn update(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        let value = value.into();

        if key == ACTIONS {
            return match value {
                Value::TextList(tokens) => self.replace_actions(tokens),
                other => {
                    warn!(kind = ?other.kind(), "ignoring non-list value written to the action queue");
                    false
                }
            };
        }

        if self.attributes.get(&key) == Some(&value) {
            return false;
        }
        self.attributes.insert(key.clone(), value);
        self.changed.insert(key);
        true
    }

    /// Set several attributes at once.
    pub fn update_many<K, V>(&mut self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in entries {
            self.update(key, value);
        }
    }

    /// Clear an attribute. Returns the old value if there was one.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if key == ACTIONS {
            let tokens = std::mem::take(&mut self.actions);
            if tokens.is_empty() {
                return None;
            }
            self.changed.insert(ACTIONS.to_string());
            return Some(Value::TextList(tokens));
        }

        let removed = self.attributes.remove(key);
        if removed.is_some() {
            self.changed.insert(key.to_string());
        }
        removed
    }

    /// Borrow a stored attribute. The action queue is not stored as an
    /// attribute; read it through [`Context::actions`] or [`Context::snapshot`].
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Copy of the value under `key` (the action queue included), or `default`.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.snapshot(key).unwrap_or(default)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.kind_of(key).is_some()
    }

    /// The kind of what is stored under `key`, or `None` when absent.
    pub fn kind_of(&self, key: &str) -> Option<ValueKind> {
        if key == ACTIONS {
            return (!self.actions.is_empty()).then_some(ValueKind::TextList);
        }
        self.attributes.get(key).map(Value::kind)
    }

    /// Copy of the value under `key`, including the action queue.
    pub fn snapshot(&self, key: &str) -> Option<Value> {
        if key == ACTIONS {
            return (!self.actions.is_empty()).then(|| Value::TextList(self.actions.clone()));
        }
        self.attributes.get(key).cloned()
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_text)
    }

    pub fn get_text_list(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(Value::as_text_list)
    }

    pub fn get_character(&self, key: &str) -> Option<&Character> {
        self.get(key).and_then(Value::as_character)
    }

    pub fn get_armor(&self, key: &str) -> Option<&Armor> {
        self.get(key).and_then(Value::as_armor)
    }

    pub fn get_weapon(&self, key: &str) -> Option<&Weapon> {
        self.get(key).and_then(Value::as_weapon)
    }

    pub fn get_damage_type(&self, key: &str) -> Option<DamageType> {
        self.get(key).and_then(Value::as_damage_type)
    }

    pub fn get_ability(&self, key: &str) -> Option<Ability> {
        self.get(key).and_then(Value::as_ability)
    }

    pub fn get_skill(&self, key: &str) -> Option<Skill> {
        self.get(key).and_then(Value::as_skill)
    }

    /// Return and clear the names changed since the previous drain.
    pub fn drain_changed(&mut self) -> BTreeSet<String> {
        std::mem::take(&mut self.changed)
    }

    /// Names changed since the previous drain, without clearing them.
    pub fn pending_changes(&self) -> &BTreeSet<String> {
        &self.changed
    }

    // === Flags ===

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: impl Into<String>) {
        self.flags.insert(flag.into());
    }

    pub fn reset_flag(&mut self, flag: &str) {
        self.flags.remove(flag);
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    // === Actions ===

    /// Append an action token to the queue.
    pub fn push_action(&mut self, token: impl Into<String>) {
        self.actions.push(token.into());
        self.changed.insert(ACTIONS.to_string());
    }

    /// Remove the first occurrence of `token`. Returns whether it was queued.
    pub fn take_action(&mut self, token: &str) -> bool {
        let Some(index) = self.actions.iter().position(|t| t == token) else {
            return false;
        };
        self.actions.remove(index);
        self.changed.insert(ACTIONS.to_string());
        true
    }

    pub fn has_action(&self, token: &str) -> bool {
        self.actions.iter().any(|t| t == token)
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    fn replace_actions(&mut self, tokens: Vec<String>) -> bool {
        if self.actions == tokens {
            return false;
        }
        self.actions = tokens;
        self.changed.insert(ACTIONS.to_string());
        true
    }

    // === Dice ===

    /// Random source for dice-driven rules.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Dump attributes, flags and pending actions for inspection.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        Ok(json!({
            "attributes": serde_json::to_value(&self.attributes)?,
            "flags": self.flags,
            "actions": self.actions,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_marks_changed_only_on_difference() {
        let mut ctx = Context::with_seed(1);
        assert!(ctx.update("result", 13));
        assert!(!ctx.update("result", 13));
        assert_eq!(ctx.drain_changed(), BTreeSet::from(["result".to_string()]));

        assert!(!ctx.update("result", 13));
        assert!(ctx.drain_changed().is_empty());

        assert!(ctx.update("result", 14));
        assert_eq!(ctx.get_int("result"), Some(14));
        assert!(ctx.pending_changes().contains("result"));
    }

    #[test]
    fn test_update_with_different_kind_is_a_change() {
        let mut ctx = Context::with_seed(1);
        ctx.update("value", 1);
        ctx.drain_changed();
        assert!(ctx.update("value", "1"));
        assert_eq!(ctx.kind_of("value"), Some(ValueKind::Text));
    }

    #[test]
    fn test_drain_is_destructive() {
        let mut ctx = Context::with_seed(1);
        ctx.update_many([("a", 1), ("b", 2)]);
        assert_eq!(ctx.drain_changed().len(), 2);
        assert!(ctx.drain_changed().is_empty());
    }

    #[test]
    fn test_get_or_and_has_attribute() {
        let ctx = Context::with_seed(1).with("result", 10);
        assert_eq!(ctx.get_or("result", Value::Int(0)), Value::Int(10));
        assert_eq!(ctx.get_or("missing", Value::Int(0)), Value::Int(0));
        assert!(ctx.has_attribute("result"));
        assert!(!ctx.has_attribute("missing"));
    }

    #[test]
    fn test_get_or_sees_action_queue() {
        let mut ctx = Context::with_seed(1);
        assert_eq!(ctx.get_or(ACTIONS, Value::TextList(vec![])), Value::TextList(vec![]));

        ctx.push_action("heal");
        assert!(ctx.has_attribute(ACTIONS));
        assert!(ctx.get(ACTIONS).is_none());
        assert_eq!(
            ctx.get_or(ACTIONS, Value::TextList(vec![])),
            Value::TextList(vec!["heal".to_string()])
        );
    }

    #[test]
    fn test_remove_marks_changed() {
        let mut ctx = Context::with_seed(1).with("result", 10);
        ctx.drain_changed();

        assert_eq!(ctx.remove("result"), Some(Value::Int(10)));
        assert!(ctx.pending_changes().contains("result"));
        ctx.drain_changed();

        assert_eq!(ctx.remove("result"), None);
        assert!(ctx.drain_changed().is_empty());
    }

    #[test]
    fn test_flags_never_count_as_changes() {
        let mut ctx = Context::with_seed(1);
        ctx.set_flag("shield_ac_added");
        assert!(ctx.has_flag("shield_ac_added"));
        assert!(ctx.drain_changed().is_empty());

        ctx.reset_flag("shield_ac_added");
        assert!(!ctx.has_flag("shield_ac_added"));
        assert!(ctx.drain_changed().is_empty());
    }

    #[test]
    fn test_action_queue_marks_actions_changed() {
        let mut ctx = Context::with_seed(1);
        assert!(!ctx.has_attribute(ACTIONS));

        ctx.push_action("roll_initiative");
        assert!(ctx.has_action("roll_initiative"));
        assert_eq!(ctx.kind_of(ACTIONS), Some(ValueKind::TextList));
        assert!(ctx.drain_changed().contains(ACTIONS));

        assert!(!ctx.take_action("get_armor_class"));
        assert!(ctx.drain_changed().is_empty());

        assert!(ctx.take_action("roll_initiative"));
        assert!(ctx.actions().is_empty());
        assert!(ctx.drain_changed().contains(ACTIONS));
        assert_eq!(ctx.snapshot(ACTIONS), None);
    }

    #[test]
    fn test_actions_can_be_seeded_through_update() {
        let mut ctx = Context::with_seed(1);
        ctx.update(ACTIONS, vec!["get_armor_class".to_string()]);
        assert_eq!(ctx.actions(), ["get_armor_class".to_string()]);
        assert!(ctx.get(ACTIONS).is_none());
        assert!(ctx.drain_changed().contains(ACTIONS));

        assert!(!ctx.update(ACTIONS, 5));
        assert_eq!(ctx.actions().len(), 1);
    }

    #[test]
    fn test_to_json_dump() {
        let mut ctx = Context::with_seed(1)
            .with("result", 13)
            .with_action("get_armor_class");
        ctx.set_flag("shield_ac_added");

        let dump = ctx.to_json().unwrap();
        assert_eq!(dump["attributes"]["result"]["Int"], 13);
        assert_eq!(dump["flags"][0], "shield_ac_added");
        assert_eq!(dump["actions"][0], "get_armor_class");
    }
}
