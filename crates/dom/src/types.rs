use std::sync::Arc;

/// Stable handle for a node inside a [`crate::Document`].
///
/// Keys are allocated by the document and never reused, so a key that
/// outlives its node reports `TreeError::MissingKey` instead of aliasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u32);

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type Attributes = Vec<(Arc<str>, String)>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element { name: Arc<str>, attributes: Attributes },
    Text { text: String },
    Comment { text: String },
    /// Transient container; inserting it moves its children instead.
    Fragment,
}

impl NodeKind {
    pub fn allows_children(&self) -> bool {
        matches!(
            self,
            NodeKind::Document | NodeKind::Element { .. } | NodeKind::Fragment
        )
    }
}

/// Owned, materialized view of a subtree.
///
/// Attributes are sorted by name so two snapshots compare equal regardless of
/// the order in which passes set attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Document {
        children: Vec<Node>,
    },
    Element {
        name: Arc<str>,
        attributes: Vec<(Arc<str>, String)>,
        children: Vec<Node>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
    Fragment {
        children: Vec<Node>,
    },
}

impl Node {
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document { children }
            | Node::Element { children, .. }
            | Node::Fragment { children } => children,
            _ => &[],
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            Node::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| &**k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}
