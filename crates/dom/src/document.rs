//! Arena-backed mutable document.
//!
//! Invariants:
//! - Keys are allocated monotonically and never reused; removed keys stay dead.
//! - A node has at most one parent, and appears exactly once in that
//!   parent's child list.
//! - Operations must not create cycles.
//! - Element and attribute names are stored ASCII-lowercase.
//! - Freshly created nodes are detached until inserted; detached nodes are
//!   live but not reachable from the root.

use crate::{Attributes, Node, NodeKey, NodeKind, TreeError};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone, Debug)]
struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    live: bool,
}

#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<NodeRecord>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self { nodes: Vec::new() };
        doc.alloc(NodeKind::Document);
        doc
    }

    pub fn root(&self) -> NodeKey {
        NodeKey(1)
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeKey {
        self.nodes.push(NodeRecord {
            kind,
            parent: None,
            children: Vec::new(),
            live: true,
        });
        NodeKey(self.nodes.len() as u32)
    }

    fn index(&self, key: NodeKey) -> Result<usize, TreeError> {
        let index = (key.0 as usize)
            .checked_sub(1)
            .ok_or(TreeError::MissingKey(key))?;
        match self.nodes.get(index) {
            Some(record) if record.live => Ok(index),
            _ => Err(TreeError::MissingKey(key)),
        }
    }

    fn record(&self, key: NodeKey) -> Result<&NodeRecord, TreeError> {
        let index = self.index(key)?;
        Ok(&self.nodes[index])
    }

    fn record_mut(&mut self, key: NodeKey) -> Result<&mut NodeRecord, TreeError> {
        let index = self.index(key)?;
        Ok(&mut self.nodes[index])
    }

    pub fn create_element(&mut self, name: &str) -> NodeKey {
        self.alloc(NodeKind::Element {
            name: Arc::from(name.to_ascii_lowercase()),
            attributes: Vec::new(),
        })
    }

    pub fn create_element_with_attributes<'a>(
        &mut self,
        name: &str,
        attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> NodeKey {
        let key = self.create_element(name);
        if let Ok(NodeKind::Element { attributes: attrs, .. }) =
            self.record_mut(key).map(|r| &mut r.kind)
        {
            for (k, v) in attributes {
                upsert_attr(attrs, k, v);
            }
        }
        key
    }

    pub fn create_text(&mut self, text: &str) -> NodeKey {
        self.alloc(NodeKind::Text {
            text: text.to_string(),
        })
    }

    pub fn create_comment(&mut self, text: &str) -> NodeKey {
        self.alloc(NodeKind::Comment {
            text: text.to_string(),
        })
    }

    pub fn create_fragment(&mut self) -> NodeKey {
        self.alloc(NodeKind::Fragment)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.index(key).is_ok()
    }

    pub fn kind(&self, key: NodeKey) -> Result<&NodeKind, TreeError> {
        Ok(&self.record(key)?.kind)
    }

    /// Tag name of a live element, `None` for every other node.
    pub fn tag_name(&self, key: NodeKey) -> Option<&str> {
        match &self.record(key).ok()?.kind {
            NodeKind::Element { name, .. } => Some(name.as_ref()),
            _ => None,
        }
    }

    pub fn is_tag(&self, key: NodeKey, tag: &str) -> bool {
        self.tag_name(key).is_some_and(|name| name == tag)
    }

    pub fn is_element(&self, key: NodeKey) -> bool {
        self.tag_name(key).is_some()
    }

    pub fn text(&self, key: NodeKey) -> Option<&str> {
        match &self.record(key).ok()?.kind {
            NodeKind::Text { text } | NodeKind::Comment { text } => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.record(key).ok()?.parent
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.record(key)
            .map(|r| r.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_children(&self, key: NodeKey) -> Vec<NodeKey> {
        self.children(key)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    /// Concatenated text of the direct text children.
    pub fn child_text(&self, key: NodeKey) -> String {
        let mut out = String::new();
        for child in self.children(key) {
            if let Ok(NodeKind::Text { text }) = self.kind(*child) {
                out.push_str(text);
            }
        }
        out
    }

    /// Parent chain, nearest first. Stops at the root or a detached node.
    pub fn ancestors(&self, key: NodeKey) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(key),
            budget: self.nodes.len(),
        }
    }

    pub fn is_attached(&self, key: NodeKey) -> bool {
        if !self.contains(key) {
            return false;
        }
        key == self.root() || self.ancestors(key).any(|a| a == self.root())
    }

    /// Pre-order descendants of `key`, excluding `key` itself.
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = self.children(key).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// All attached elements in document order.
    pub fn elements(&self) -> Vec<NodeKey> {
        self.descendants(self.root())
            .into_iter()
            .filter(|k| self.is_element(*k))
            .collect()
    }

    /// Attached elements with the given tag, in document order.
    ///
    /// The result is a snapshot: callers that remove nodes while walking it
    /// should go from the last match to the first.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeKey> {
        self.descendants(self.root())
            .into_iter()
            .filter(|k| self.tag_name(*k).is_some_and(|n| n.eq_ignore_ascii_case(tag)))
            .collect()
    }

    pub fn attributes(&self, key: NodeKey) -> &[(Arc<str>, String)] {
        match self.record(key).map(|r| &r.kind) {
            Ok(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    pub fn attribute_names(&self, key: NodeKey) -> Vec<Arc<str>> {
        self.attributes(key)
            .iter()
            .map(|(k, _)| Arc::clone(k))
            .collect()
    }

    pub fn attr(&self, key: NodeKey, name: &str) -> Option<&str> {
        self.attributes(key)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, key: NodeKey, name: &str) -> bool {
        self.attr(key, name).is_some()
    }

    pub fn attr_has_token(&self, key: NodeKey, name: &str, token: &str) -> bool {
        self.attr(key, name)
            .is_some_and(|v| v.split_ascii_whitespace().any(|t| t.eq_ignore_ascii_case(token)))
    }

    fn element_attrs_mut(&mut self, key: NodeKey) -> Result<&mut Attributes, TreeError> {
        match &mut self.record_mut(key)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            _ => Err(TreeError::WrongNodeKind(key)),
        }
    }

    /// Sets (or overwrites) an attribute; keys stay unique.
    pub fn set_attr(&mut self, key: NodeKey, name: &str, value: &str) -> Result<(), TreeError> {
        let attrs = self.element_attrs_mut(key)?;
        upsert_attr(attrs, name, value);
        Ok(())
    }

    /// Returns whether the attribute was present.
    pub fn remove_attr(&mut self, key: NodeKey, name: &str) -> Result<bool, TreeError> {
        let attrs = self.element_attrs_mut(key)?;
        let before = attrs.len();
        attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        Ok(attrs.len() != before)
    }

    pub fn set_tag_name(&mut self, key: NodeKey, tag: &str) -> Result<(), TreeError> {
        match &mut self.record_mut(key)?.kind {
            NodeKind::Element { name, .. } => {
                *name = Arc::from(tag.to_ascii_lowercase());
                Ok(())
            }
            _ => Err(TreeError::WrongNodeKind(key)),
        }
    }

    fn check_insert(&self, parent: NodeKey, child: NodeKey) -> Result<(), TreeError> {
        let parent_record = self.record(parent)?;
        let child_record = self.record(child)?;
        if !parent_record.kind.allows_children() {
            debug_assert!(false, "parent node cannot have children");
            return Err(TreeError::InvalidParent(parent));
        }
        if child == self.root() {
            return Err(TreeError::RootImmovable(child));
        }
        if child_record.parent.is_some() {
            return Err(TreeError::AlreadyAttached { child });
        }
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(TreeError::CycleDetected { parent, child });
        }
        Ok(())
    }

    /// Appends a detached node. A fragment contributes its children instead.
    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), TreeError> {
        self.check_insert(parent, child)?;
        if matches!(self.record(child)?.kind, NodeKind::Fragment) {
            for moved in self.take_children(child)? {
                self.record_mut(parent)?.children.push(moved);
                self.record_mut(moved)?.parent = Some(parent);
            }
            return Ok(());
        }
        self.record_mut(parent)?.children.push(child);
        self.record_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Inserts a detached node before `before`, which must be a child of
    /// `parent`. A fragment contributes its children instead.
    pub fn insert_before(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        before: NodeKey,
    ) -> Result<(), TreeError> {
        self.check_insert(parent, child)?;
        if self.record(before)?.parent != Some(parent) {
            return Err(TreeError::InvalidSibling { parent, before });
        }
        let moved = if matches!(self.record(child)?.kind, NodeKind::Fragment) {
            self.take_children(child)?
        } else {
            vec![child]
        };
        let siblings = &mut self.record_mut(parent)?.children;
        let pos = siblings
            .iter()
            .position(|k| *k == before)
            .ok_or(TreeError::InvalidSibling { parent, before })?;
        siblings.splice(pos..pos, moved.iter().copied());
        for key in moved {
            self.record_mut(key)?.parent = Some(parent);
        }
        Ok(())
    }

    fn take_children(&mut self, key: NodeKey) -> Result<Vec<NodeKey>, TreeError> {
        let children = std::mem::take(&mut self.record_mut(key)?.children);
        for child in &children {
            self.record_mut(*child)?.parent = None;
        }
        Ok(children)
    }

    /// Unlinks a node from its parent; the node and its subtree stay live.
    pub fn detach(&mut self, key: NodeKey) -> Result<(), TreeError> {
        if key == self.root() {
            return Err(TreeError::RootImmovable(key));
        }
        let Some(parent) = self.record_mut(key)?.parent.take() else {
            return Ok(());
        };
        let siblings = &mut self.record_mut(parent)?.children;
        let before = siblings.len();
        siblings.retain(|k| *k != key);
        if siblings.len() + 1 != before {
            debug_assert!(false, "child missing from parent's child list");
            return Err(TreeError::Integrity {
                node: parent,
                detail: format!("child {key} missing from child list"),
            });
        }
        Ok(())
    }

    /// Removes a node and its whole subtree; the keys become dead.
    pub fn remove(&mut self, key: NodeKey) -> Result<(), TreeError> {
        self.detach(key)?;
        log::trace!(target: "dom", "remove subtree {key}");
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let record = self.record_mut(current)?;
            record.live = false;
            record.parent = None;
            stack.extend(std::mem::take(&mut record.children));
        }
        Ok(())
    }

    /// Puts `new` where `old` is and detaches `old` (it stays live so it can
    /// be moved elsewhere).
    pub fn replace_with(&mut self, old: NodeKey, new: NodeKey) -> Result<(), TreeError> {
        let parent = self.record(old)?.parent.ok_or(TreeError::InvalidParent(old))?;
        self.insert_before(parent, new, old)?;
        self.detach(old)
    }

    /// Removes an element but keeps its children in its former position.
    pub fn unwrap(&mut self, key: NodeKey) -> Result<(), TreeError> {
        let parent = self.record(key)?.parent.ok_or(TreeError::InvalidParent(key))?;
        let fragment = self.create_fragment();
        for child in self.take_children(key)? {
            self.append_child(fragment, child)?;
        }
        self.insert_before(parent, fragment, key)?;
        self.remove(key)?;
        self.remove(fragment)
    }

    /// Verifies parent/child links of every live node.
    pub fn check_integrity(&self) -> Result<(), TreeError> {
        let budget = self.nodes.len();
        for (index, record) in self.nodes.iter().enumerate() {
            if !record.live {
                continue;
            }
            let key = NodeKey(index as u32 + 1);
            let mut seen = HashSet::with_capacity(record.children.len());
            for child in &record.children {
                let child_record = self.record(*child).map_err(|_| TreeError::Integrity {
                    node: key,
                    detail: format!("dangling child {child}"),
                })?;
                if child_record.parent != Some(key) {
                    return Err(TreeError::Integrity {
                        node: *child,
                        detail: format!("parent link does not point back to {key}"),
                    });
                }
                if !seen.insert(*child) {
                    return Err(TreeError::Integrity {
                        node: key,
                        detail: format!("child {child} listed twice"),
                    });
                }
            }
            if let Some(parent) = record.parent {
                let parent_record = self.record(parent).map_err(|_| TreeError::Integrity {
                    node: key,
                    detail: format!("dangling parent {parent}"),
                })?;
                if !parent_record.children.contains(&key) {
                    return Err(TreeError::Integrity {
                        node: key,
                        detail: format!("missing from child list of {parent}"),
                    });
                }
            }
            if self.ancestors(key).count() >= budget {
                return Err(TreeError::Integrity {
                    node: key,
                    detail: "parent chain does not terminate".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> Node {
        self.snapshot_of(self.root())
            .unwrap_or(Node::Document { children: Vec::new() })
    }

    pub fn snapshot_of(&self, key: NodeKey) -> Result<Node, TreeError> {
        let record = self.record(key)?;
        let children = record
            .children
            .iter()
            .map(|child| self.snapshot_of(*child))
            .collect::<Result<Vec<_>, _>>()?;
        let node = match &record.kind {
            NodeKind::Document => Node::Document { children },
            NodeKind::Element { name, attributes } => {
                let mut attributes = attributes.clone();
                attributes.sort_by(|a, b| a.0.cmp(&b.0));
                Node::Element {
                    name: Arc::clone(name),
                    attributes,
                    children,
                }
            }
            NodeKind::Text { text } => Node::Text { text: text.clone() },
            NodeKind::Comment { text } => Node::Comment { text: text.clone() },
            NodeKind::Fragment => Node::Fragment { children },
        };
        Ok(node)
    }

    /// Human-readable path such as `html > body > div[2]`.
    pub fn location(&self, key: NodeKey) -> String {
        if !self.contains(key) {
            return format!("(removed {key})");
        }
        let mut path: Vec<NodeKey> = self.ancestors(key).collect();
        path.reverse();
        path.push(key);
        let mut segments = Vec::with_capacity(path.len());
        for (i, node) in path.iter().enumerate() {
            if *node == self.root() {
                continue;
            }
            let segment = match self.kind(*node) {
                Ok(NodeKind::Element { name, .. }) => {
                    let same: Vec<NodeKey> = match self.parent(*node) {
                        Some(parent) => self
                            .children(parent)
                            .iter()
                            .copied()
                            .filter(|s| self.is_tag(*s, name))
                            .collect(),
                        None => Vec::new(),
                    };
                    match same.iter().position(|s| s == node) {
                        Some(pos) if same.len() > 1 => format!("{name}[{}]", pos + 1),
                        _ => name.to_string(),
                    }
                }
                Ok(NodeKind::Text { .. }) => "#text".to_string(),
                Ok(NodeKind::Comment { .. }) => "#comment".to_string(),
                Ok(NodeKind::Fragment) => "#fragment".to_string(),
                Ok(NodeKind::Document) | Err(_) => continue,
            };
            if i == 0 && path[0] != self.root() {
                segments.push(format!("(detached) {segment}"));
            } else {
                segments.push(segment);
            }
        }
        if segments.is_empty() {
            return "#document".to_string();
        }
        segments.join(" > ")
    }
}

fn upsert_attr(attrs: &mut Attributes, name: &str, value: &str) {
    match attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
        Some((_, existing)) => {
            existing.clear();
            existing.push_str(value);
        }
        None => attrs.push((Arc::from(name.to_ascii_lowercase()), value.to_string())),
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeKey>,
    budget: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<NodeKey> {
        let current = self.next?;
        if self.budget == 0 {
            self.next = None;
            return None;
        }
        self.budget -= 1;
        self.next = self.doc.parent(current);
        Some(current)
    }
}
