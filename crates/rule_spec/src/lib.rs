//! Declarative tag/attribute rules and their validator.
//!
//! Everything here is pure lookup: nothing in this crate mutates the
//! document. Callers decide what to do with a `Validation::Fail`.

pub mod catalog;
mod error;
mod registry;
mod rules;
pub mod url_check;
mod validation;

pub use crate::error::SpecLoadError;
pub use crate::registry::{AllowedAttributes, TagSpecRegistry};
pub use crate::rules::{AttrRule, StructuralRule, TagSpec, UrlRule, ValueShape};
pub use crate::validation::{Validation, ValidationOptions};
