//! Flat, keyed context flags shared by the passes of one run.
//!
//! A key is either inactive (no payload) or active with exactly one payload.
//! There is no nesting: entering an active key replaces its payload and a
//! single `leave` deactivates it regardless of how many `enter`s preceded it.
//! Callers that need balanced nesting keep their own counter in the payload.

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;

pub type Payload = IndexMap<String, Value>;

#[derive(Clone, Debug, Default)]
pub struct ContextManager {
    active: HashMap<String, Payload>,
}

impl ContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates `key`, replacing any previous payload (no merge).
    pub fn enter(&mut self, key: &str, payload: Payload) {
        log::trace!(target: "sanitizer.context", "enter {key} {payload:?}");
        self.active.insert(key.to_string(), payload);
    }

    /// Deactivates `key` and discards its payload.
    pub fn leave(&mut self, key: &str) {
        log::trace!(target: "sanitizer.context", "leave {key}");
        self.active.remove(key);
    }

    /// Activating behaves like `enter`, deactivating like `leave`; the
    /// payload argument is ignored when deactivating.
    pub fn toggle(&mut self, key: &str, payload: Payload) {
        if self.is(key) {
            self.leave(key);
        } else {
            self.enter(key, payload);
        }
    }

    pub fn is(&self, key: &str) -> bool {
        self.active.contains_key(key)
    }

    /// Payload of an active key; empty when inactive or unknown.
    pub fn state(&self, key: &str) -> Payload {
        self.active.get(key).cloned().unwrap_or_default()
    }

    pub fn active_keys(&self) -> impl Iterator<Item = &str> {
        self.active.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(pairs: &[(&str, Value)]) -> Payload {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn enter_then_leave_round_trips_to_empty() {
        let mut cx = ContextManager::new();
        cx.enter("k", payload(&[("a", json!(1))]));
        assert!(cx.is("k"));
        assert_eq!(cx.state("k").get("a"), Some(&json!(1)));

        cx.leave("k");
        assert!(!cx.is("k"));
        assert!(cx.state("k").is_empty());
    }

    #[test]
    fn toggle_twice_returns_to_inactive_without_stale_payload() {
        let mut cx = ContextManager::new();
        cx.toggle("k", payload(&[("a", json!(1))]));
        assert!(cx.is("k"));
        cx.toggle("k", Payload::new());
        assert!(!cx.is("k"));
        assert!(cx.state("k").is_empty());

        cx.toggle("k", Payload::new());
        assert!(cx.is("k"));
        assert!(
            cx.state("k").is_empty(),
            "payload from the first toggle must not resurface"
        );
    }

    #[test]
    fn re_entering_replaces_payload_instead_of_merging() {
        let mut cx = ContextManager::new();
        cx.enter("k", payload(&[("a", json!(1)), ("b", json!(2))]));
        cx.enter("k", payload(&[("c", json!(3))]));
        let state = cx.state("k");
        assert_eq!(state.len(), 1);
        assert_eq!(state.get("c"), Some(&json!(3)));
    }

    #[test]
    fn nesting_is_not_counted() {
        let mut cx = ContextManager::new();
        cx.enter("k", Payload::new());
        cx.enter("k", Payload::new());
        cx.leave("k");
        assert!(!cx.is("k"), "one leave closes any number of enters");
    }

    #[test]
    fn unknown_keys_are_inactive() {
        let cx = ContextManager::new();
        assert!(!cx.is("missing"));
        assert!(cx.state("missing").is_empty());
        assert_eq!(cx.active_keys().count(), 0);
    }
}
