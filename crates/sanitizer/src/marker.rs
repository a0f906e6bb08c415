//! Deferred context instructions anchored to tree positions.
//!
//! The document tree has a closed set of node kinds, so markers are kept in
//! a side list next to it instead of as synthetic nodes: each entry names a
//! stable [`NodeKey`] anchor and whether it fires when a walker opens the
//! anchor (before its subtree) or closes it (after its subtree). Markers are
//! never part of the tree and so can never be rendered.

use crate::context::{ContextManager, Payload};
use dom::NodeKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerOp {
    Enter,
    Leave,
    Toggle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Open,
    Close,
}

/// A context instruction; immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextMarker {
    key: String,
    op: MarkerOp,
    payload: Payload,
}

impl ContextMarker {
    pub fn enter(key: &str, payload: Payload) -> Self {
        Self {
            key: key.to_string(),
            op: MarkerOp::Enter,
            payload,
        }
    }

    pub fn leave(key: &str) -> Self {
        Self {
            key: key.to_string(),
            op: MarkerOp::Leave,
            payload: Payload::new(),
        }
    }

    pub fn toggle(key: &str, payload: Payload) -> Self {
        Self {
            key: key.to_string(),
            op: MarkerOp::Toggle,
            payload,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn op(&self) -> MarkerOp {
        self.op
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Translates the marker into the matching context call.
    pub fn apply(&self, contexts: &mut ContextManager) {
        match self.op {
            MarkerOp::Enter => contexts.enter(&self.key, self.payload.clone()),
            MarkerOp::Leave => contexts.leave(&self.key),
            MarkerOp::Toggle => contexts.toggle(&self.key, self.payload.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedMarker {
    pub anchor: NodeKey,
    pub placement: Placement,
    pub marker: ContextMarker,
}

/// Per-run list of markers awaiting consumption.
#[derive(Debug, Default)]
pub struct MarkerList {
    entries: Vec<PlacedMarker>,
}

impl MarkerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, anchor: NodeKey, placement: Placement, marker: ContextMarker) {
        log::trace!(
            target: "sanitizer.marker",
            "place {:?} {} at {anchor} ({placement:?})",
            marker.op(),
            marker.key()
        );
        self.entries.push(PlacedMarker {
            anchor,
            placement,
            marker,
        });
    }

    /// Whether a marker for `key` is already anchored at `anchor`.
    pub fn has(&self, anchor: NodeKey, key: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.anchor == anchor && e.marker.key() == key)
    }

    /// Removes and returns the markers at one anchor/placement in the order
    /// they were placed.
    pub fn take(&mut self, anchor: NodeKey, placement: Placement) -> Vec<ContextMarker> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if entry.anchor == anchor && entry.placement == placement {
                taken.push(entry.marker);
            } else {
                kept.push(entry);
            }
        }
        self.entries = kept;
        taken
    }

    /// Consumes the markers at one anchor/placement into `contexts`.
    pub fn apply_at(&mut self, anchor: NodeKey, placement: Placement, contexts: &mut ContextManager) {
        for marker in self.take(anchor, placement) {
            marker.apply(contexts);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Everything nobody consumed; used by the end-of-run cleanup.
    pub fn drain_unconsumed(&mut self) -> Vec<PlacedMarker> {
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn open_and_close_markers_drive_the_context() {
        let mut markers = MarkerList::new();
        let mut contexts = ContextManager::new();
        let anchor = NodeKey(7);
        let mut payload = Payload::new();
        payload.insert("type".to_string(), json!("amp-mustache"));
        markers.place(anchor, Placement::Open, ContextMarker::enter("tpl", payload));
        markers.place(anchor, Placement::Close, ContextMarker::leave("tpl"));

        markers.apply_at(anchor, Placement::Open, &mut contexts);
        assert!(contexts.is("tpl"));
        assert_eq!(contexts.state("tpl").get("type"), Some(&json!("amp-mustache")));
        assert_eq!(markers.len(), 1);

        markers.apply_at(anchor, Placement::Close, &mut contexts);
        assert!(!contexts.is("tpl"));
        assert!(markers.is_empty());
    }

    #[test]
    fn take_only_returns_matching_entries_in_order() {
        let mut markers = MarkerList::new();
        markers.place(NodeKey(1), Placement::Open, ContextMarker::toggle("a", Payload::new()));
        markers.place(NodeKey(2), Placement::Open, ContextMarker::leave("b"));
        markers.place(NodeKey(1), Placement::Open, ContextMarker::leave("c"));

        let taken = markers.take(NodeKey(1), Placement::Open);
        let keys: Vec<&str> = taken.iter().map(ContextMarker::key).collect();
        assert_eq!(keys, ["a", "c"]);
        assert!(markers.has(NodeKey(2), "b"));
        assert_eq!(markers.drain_unconsumed().len(), 1);
        assert!(markers.is_empty());
    }
}
