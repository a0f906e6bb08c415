use crate::config::{PassArgs, parse_args};
use crate::error::PipelineError;
use crate::fallback::NoscriptFallback;
use crate::pass::{PassContext, Sanitizer, is_exempt};
use crate::policy::for_each_match_reverse;
use dom::{Document, NodeKey, TreeError};
use serde::Deserialize;

const JSON_TYPES: &[&str] = &["application/json", "application/ld+json"];

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ScriptOptions {
    /// Unwrap `<noscript>` elements that are not component fallbacks.
    pub unwrap_noscripts: bool,
    /// Keep inert JSON data blocks.
    pub keep_json: bool,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            unwrap_noscripts: true,
            keep_json: true,
        }
    }
}

/// Drops author scripts. The document's content is expected to work
/// without them, so `<noscript>` content is promoted into the page.
#[derive(Debug, Default)]
pub struct ScriptSanitizer {
    options: ScriptOptions,
}

impl ScriptSanitizer {
    pub fn new(options: ScriptOptions) -> Self {
        Self { options }
    }

    pub fn from_args(args: &PassArgs) -> Result<Self, PipelineError> {
        Ok(Self::new(parse_args("script", args)?))
    }

    fn is_data_block(doc: &Document, key: NodeKey) -> bool {
        doc.attr(key, "type").is_some_and(|t| {
            let t = t.trim();
            JSON_TYPES.iter().any(|json| t.eq_ignore_ascii_case(json))
        }) && !doc.has_attr(key, "src")
    }
}

impl Sanitizer for ScriptSanitizer {
    fn name(&self) -> &'static str {
        "script"
    }

    fn sanitize(&mut self, cx: &mut PassContext<'_>) -> Result<(), TreeError> {
        let keep_json = self.options.keep_json;
        let scripts = cx.doc.elements_by_tag("script");
        for_each_match_reverse(cx.doc, &scripts, |doc, script| {
            if is_exempt(doc, script) || (keep_json && Self::is_data_block(doc, script)) {
                return Ok(());
            }
            log::debug!(
                target: "sanitizer.script",
                "removing script at {}",
                doc.location(script)
            );
            doc.remove(script)
        })?;

        if self.options.unwrap_noscripts {
            let noscripts = cx.doc.elements_by_tag("noscript");
            for_each_match_reverse(cx.doc, &noscripts, |doc, noscript| {
                if is_exempt(doc, noscript) || NoscriptFallback::is_fallback_container(doc, noscript) {
                    return Ok(());
                }
                doc.unwrap(noscript)
            })?;
        }
        Ok(())
    }
}
