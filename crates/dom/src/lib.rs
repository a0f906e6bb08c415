//! Mutable document tree consumed by the sanitizer.
//!
//! The tree is an arena of nodes addressed by stable [`NodeKey`] handles with
//! non-owning parent back-references. Parsing is someone else's job: callers
//! build the tree through the creation/insertion API.

mod document;
mod error;
mod outline;
mod types;

pub use crate::document::{Ancestors, Document};
pub use crate::error::TreeError;
pub use crate::outline::outline;
pub use crate::types::{Attributes, Node, NodeKey, NodeKind};
