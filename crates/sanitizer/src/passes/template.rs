use crate::config::{PassArgs, parse_args};
use crate::context::Payload;
use crate::error::PipelineError;
use crate::marker::{ContextMarker, Placement};
use crate::pass::{PassContext, Sanitizer, ScriptDescriptor, component_script, is_exempt};
use dom::TreeError;
use serde::Deserialize;
use serde_json::Value;

/// Context key active while a walker is inside a client-side template.
pub const MUSTACHE_CONTEXT: &str = "mustache_template";

const TEMPLATE_TYPE: &str = "amp-mustache";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TemplateOptions {
    /// Template `type` values that open the template context.
    pub types: Vec<String>,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            types: vec![TEMPLATE_TYPE.to_string()],
        }
    }
}

/// Marks client-side templates so later passes relax placeholder checks
/// inside them.
#[derive(Debug, Default)]
pub struct TemplateSanitizer {
    options: TemplateOptions,
    found: bool,
}

impl TemplateSanitizer {
    pub fn new(options: TemplateOptions) -> Self {
        Self {
            options,
            found: false,
        }
    }

    pub fn from_args(args: &PassArgs) -> Result<Self, PipelineError> {
        Ok(Self::new(parse_args("template", args)?))
    }
}

impl Sanitizer for TemplateSanitizer {
    fn name(&self) -> &'static str {
        "template"
    }

    fn sanitize(&mut self, cx: &mut PassContext<'_>) -> Result<(), TreeError> {
        self.found = false;
        for template in cx.doc.elements_by_tag("template") {
            if is_exempt(cx.doc, template) {
                continue;
            }
            let Some(kind) = cx.doc.attr(template, "type") else {
                continue;
            };
            if !self.options.types.iter().any(|t| t.eq_ignore_ascii_case(kind)) {
                continue;
            }
            self.found = true;
            if cx.markers.has(template, MUSTACHE_CONTEXT) {
                continue;
            }
            let mut payload = Payload::new();
            payload.insert("type".to_string(), Value::String(kind.to_string()));
            cx.markers.place(
                template,
                Placement::Open,
                ContextMarker::enter(MUSTACHE_CONTEXT, payload),
            );
            cx.markers.place(
                template,
                Placement::Close,
                ContextMarker::leave(MUSTACHE_CONTEXT),
            );
        }
        Ok(())
    }

    fn scripts(&self) -> Vec<ScriptDescriptor> {
        if self.found {
            vec![component_script(TEMPLATE_TYPE)]
        } else {
            Vec::new()
        }
    }
}
