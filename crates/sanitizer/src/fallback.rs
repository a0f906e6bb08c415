//! Noscript fallback: keep a filtered copy of a converted element for
//! renderers that do not run the component runtime.

use dom::{Document, NodeKey, TreeError};
use rule_spec::{AllowedAttributes, TagSpecRegistry};
use std::collections::HashMap;

pub const FALLBACK_TAG: &str = "noscript";

/// Tag-name prefix of elements produced by conversion passes.
pub const COMPONENT_PREFIX: &str = "amp-";

pub fn is_component_tag(tag: &str) -> bool {
    tag.len() > COMPONENT_PREFIX.len() && tag.starts_with(COMPONENT_PREFIX)
}

#[derive(Debug, Default)]
pub struct NoscriptFallback {
    allowed: HashMap<String, AllowedAttributes>,
}

impl NoscriptFallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the allowed attribute set for `tag` once; later calls reuse it.
    pub fn initialize_allowed_attributes(&mut self, registry: &TagSpecRegistry, tag: &str) {
        self.allowed
            .entry(tag.to_ascii_lowercase())
            .or_insert_with(|| registry.allowed_attributes(tag));
    }

    pub fn allowed_attributes(&self, tag: &str) -> Option<&AllowedAttributes> {
        self.allowed.get(&tag.to_ascii_lowercase())
    }

    /// Moves `old_element` into a new `<noscript>` appended under
    /// `new_element`, then strips every attribute not allowed on the old tag.
    ///
    /// A tag that was never initialized keeps no attributes at all.
    pub fn wrap_as_fallback(
        &self,
        doc: &mut Document,
        new_element: NodeKey,
        old_element: NodeKey,
    ) -> Result<NodeKey, TreeError> {
        let tag = doc
            .tag_name(old_element)
            .ok_or(TreeError::WrongNodeKind(old_element))?
            .to_string();
        let noscript = doc.create_element(FALLBACK_TAG);
        doc.detach(old_element)?;
        doc.append_child(noscript, old_element)?;
        doc.append_child(new_element, noscript)?;

        let allowed = self.allowed_attributes(&tag);
        if allowed.is_none() {
            log::debug!(
                target: "sanitizer.fallback",
                "allowed attributes for {tag} were never initialized"
            );
        }
        let names = doc.attribute_names(old_element);
        for name in names.iter().rev() {
            if !allowed.is_some_and(|set| set.contains(name)) {
                doc.remove_attr(old_element, name)?;
            }
        }
        Ok(noscript)
    }

    /// True when `node` sits directly in a fallback container owned by a
    /// converted component element.
    pub fn is_inside_fallback(doc: &Document, node: NodeKey) -> bool {
        doc.parent(node)
            .is_some_and(|parent| Self::is_fallback_container(doc, parent))
    }

    /// A `<noscript>` directly under a component element.
    pub fn is_fallback_container(doc: &Document, node: NodeKey) -> bool {
        doc.is_tag(node, FALLBACK_TAG)
            && doc
                .parent(node)
                .and_then(|parent| doc.tag_name(parent))
                .is_some_and(is_component_tag)
    }
}
