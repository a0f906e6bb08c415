use crate::config::HostConfig;
use crate::context::ContextManager;
use crate::marker::MarkerList;
use dom::{Document, NodeKey, TreeError};
use indexmap::IndexMap;
use rule_spec::TagSpecRegistry;

const COMPONENT_SCRIPT_BASE: &str = "https://cdn.ampproject.org/v0";

/// Elements carrying this attribute, and their subtrees, count as already
/// validated. Every pass leaves them alone.
pub const EXEMPT_ATTRIBUTE: &str = "data-strictml-exempt";

pub fn is_exempt(doc: &Document, key: NodeKey) -> bool {
    doc.has_attr(key, EXEMPT_ATTRIBUTE)
        || doc.ancestors(key).any(|a| doc.has_attr(a, EXEMPT_ATTRIBUTE))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptDescriptor {
    pub slug: String,
    pub src: String,
}

/// Runtime script for a component, e.g. `amp-carousel`.
pub fn component_script(slug: &str) -> ScriptDescriptor {
    ScriptDescriptor {
        slug: slug.to_string(),
        src: format!("{COMPONENT_SCRIPT_BASE}/{slug}-0.1.js"),
    }
}

/// Scripts and stylesheets the final document must carry.
///
/// Scripts are keyed by slug; the first source registered for a slug wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SideOutputs {
    scripts: IndexMap<String, String>,
    styles: Vec<String>,
}

impl SideOutputs {
    pub fn add_script(&mut self, script: ScriptDescriptor) {
        self.scripts.entry(script.slug).or_insert(script.src);
    }

    pub fn add_style(&mut self, css: String) {
        self.styles.push(css);
    }

    pub fn scripts(&self) -> &IndexMap<String, String> {
        &self.scripts
    }

    pub fn styles(&self) -> &[String] {
        &self.styles
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() && self.styles.is_empty()
    }
}

/// Everything a pass may touch during one run.
pub struct PassContext<'a> {
    pub doc: &'a mut Document,
    pub registry: &'a TagSpecRegistry,
    pub contexts: &'a mut ContextManager,
    pub markers: &'a mut MarkerList,
    pub host: &'a dyn HostConfig,
}

/// One ordered transformation over the shared document.
///
/// A pass must leave the tree structurally valid and must be idempotent on
/// its own output. Passes are `Send + Sync` so a built pipeline can move to
/// or be shared with another thread between runs.
pub trait Sanitizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Tags whose spec must be in the registry before this pass can run.
    fn required_tag_specs(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn sanitize(&mut self, cx: &mut PassContext<'_>) -> Result<(), TreeError>;

    /// Scripts this pass needs, valid after `sanitize`.
    fn scripts(&self) -> Vec<ScriptDescriptor> {
        Vec::new()
    }

    fn styles(&self) -> Vec<String> {
        Vec::new()
    }
}
