use crate::NodeKey;

/// Tree-integrity failures.
///
/// Any of these means the caller broke a structural invariant; content-level
/// problems never surface here.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node {0} does not exist or was removed")]
    MissingKey(NodeKey),
    #[error("node {0} has the wrong kind for this operation")]
    WrongNodeKind(NodeKey),
    #[error("node {0} cannot be used as a parent here")]
    InvalidParent(NodeKey),
    #[error("node {before} is not a child of {parent}")]
    InvalidSibling { parent: NodeKey, before: NodeKey },
    #[error("inserting {child} under {parent} would create a cycle")]
    CycleDetected { parent: NodeKey, child: NodeKey },
    #[error("node {child} already has a parent")]
    AlreadyAttached { child: NodeKey },
    #[error("the document root {0} cannot be moved or removed")]
    RootImmovable(NodeKey),
    #[error("integrity check failed at {node}: {detail}")]
    Integrity { node: NodeKey, detail: String },
}

impl TreeError {
    /// The node the error is about, for location reporting.
    pub fn node(&self) -> NodeKey {
        match self {
            TreeError::MissingKey(key)
            | TreeError::WrongNodeKind(key)
            | TreeError::InvalidParent(key)
            | TreeError::RootImmovable(key) => *key,
            TreeError::InvalidSibling { parent, .. } => *parent,
            TreeError::CycleDetected { child, .. } => *child,
            TreeError::AlreadyAttached { child } => *child,
            TreeError::Integrity { node, .. } => *node,
        }
    }
}
