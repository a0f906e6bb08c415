use crate::config::{PassArgs, parse_args};
use crate::error::PipelineError;
use crate::pass::{PassContext, Sanitizer, is_exempt};
use crate::policy::for_each_match_reverse;
use dom::{Document, NodeKey, TreeError};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StyleOptions {
    /// Styles carrying any of these attributes are left in place.
    pub keep_marked: Vec<String>,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            keep_marked: vec!["amp-custom".to_string(), "amp-boilerplate".to_string()],
        }
    }
}

/// Lifts inline `<style>` blocks out of the body into the side outputs, in
/// document order.
#[derive(Debug, Default)]
pub struct StyleSanitizer {
    options: StyleOptions,
    collected: Vec<String>,
}

impl StyleSanitizer {
    pub fn new(options: StyleOptions) -> Self {
        Self {
            options,
            collected: Vec::new(),
        }
    }

    pub fn from_args(args: &PassArgs) -> Result<Self, PipelineError> {
        Ok(Self::new(parse_args("style", args)?))
    }

    fn is_kept(&self, doc: &Document, key: NodeKey) -> bool {
        is_exempt(doc, key) || self.options.keep_marked.iter().any(|a| doc.has_attr(key, a))
    }
}

impl Sanitizer for StyleSanitizer {
    fn name(&self) -> &'static str {
        "style"
    }

    fn sanitize(&mut self, cx: &mut PassContext<'_>) -> Result<(), TreeError> {
        self.collected.clear();
        let styles: Vec<NodeKey> = cx
            .doc
            .elements_by_tag("style")
            .into_iter()
            .filter(|key| !self.is_kept(cx.doc, *key))
            .collect();
        for style in &styles {
            let css = cx.doc.child_text(*style);
            let css = css.trim();
            if !css.is_empty() {
                self.collected.push(css.to_string());
            }
        }
        for_each_match_reverse(cx.doc, &styles, |doc, style| doc.remove(style))
    }

    fn styles(&self) -> Vec<String> {
        self.collected.clone()
    }
}
