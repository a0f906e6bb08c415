use crate::config::{HostConfig, PassArgs, parse_args};
use crate::error::PipelineError;
use crate::pass::{PassContext, Sanitizer, ScriptDescriptor, component_script, is_exempt};
use crate::policy::{apply_removal_policy, for_each_match_reverse};
use dom::{Document, NodeKey, TreeError};
use serde::Deserialize;
use url::Url;

const XHR_ACTION: &str = "action-xhr";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    /// Target forced onto every form unless it already opens a new window.
    pub target: String,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            target: "_top".to_string(),
        }
    }
}

/// Rewrites forms into the XHR-submitted component form.
///
/// Forms without an `action` cannot be submitted and are dropped. POST forms
/// submit through `action-xhr`; GET forms keep `action`.
#[derive(Debug, Default)]
pub struct FormSanitizer {
    options: FormOptions,
    used: bool,
}

impl FormSanitizer {
    pub fn new(options: FormOptions) -> Self {
        Self {
            options,
            used: false,
        }
    }

    pub fn from_args(args: &PassArgs) -> Result<Self, PipelineError> {
        Ok(Self::new(parse_args("form", args)?))
    }

    fn fix_target(&self, doc: &mut Document, form: NodeKey) -> Result<(), TreeError> {
        let new_window = doc
            .attr(form, "target")
            .is_some_and(|target| target.eq_ignore_ascii_case("_blank"));
        if new_window {
            return Ok(());
        }
        doc.set_attr(form, "target", &self.options.target)
    }
}

/// Absolutizes `action` against the host's home URL when it is relative.
/// Values that cannot be resolved are kept as written.
fn resolve_action(action: &str, host: &dyn HostConfig) -> String {
    let action = action.trim();
    if Url::parse(action).is_ok() {
        return action.to_string();
    }
    host.home_url()
        .and_then(|home| Url::parse(&home).ok())
        .and_then(|base| base.join(action).ok())
        .map(String::from)
        .unwrap_or_else(|| action.to_string())
}

impl Sanitizer for FormSanitizer {
    fn name(&self) -> &'static str {
        "form"
    }

    fn sanitize(&mut self, cx: &mut PassContext<'_>) -> Result<(), TreeError> {
        self.used = false;
        let forms = cx.doc.elements_by_tag("form");
        let host = cx.host;
        let mut used = false;
        for_each_match_reverse(cx.doc, &forms, |doc, form| {
            if is_exempt(doc, form) {
                return Ok(());
            }
            if doc.has_attr(form, XHR_ACTION) {
                used = true;
                return self.fix_target(doc, form);
            }
            let action = match doc.attr(form, "action") {
                Some(action) => resolve_action(action, host),
                None => {
                    log::debug!(
                        target: "sanitizer.form",
                        "form without action at {}",
                        doc.location(form)
                    );
                    return apply_removal_policy(doc, form).map(|_| ());
                }
            };
            let is_post = doc
                .attr(form, "method")
                .is_some_and(|m| m.trim().eq_ignore_ascii_case("post"));
            if is_post {
                doc.set_attr(form, XHR_ACTION, &action)?;
                doc.remove_attr(form, "action")?;
            } else {
                doc.set_attr(form, "action", &action)?;
            }
            used = true;
            self.fix_target(doc, form)
        })?;
        self.used = used;
        Ok(())
    }

    fn scripts(&self) -> Vec<ScriptDescriptor> {
        if self.used {
            vec![component_script("amp-form")]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn relative_actions_resolve_against_home() {
        let mut host = HashMap::new();
        host.insert("home_url".to_string(), "https://example.com/blog/".to_string());
        assert_eq!(resolve_action("/subscribe", &host), "https://example.com/subscribe");
        assert_eq!(resolve_action("reply", &host), "https://example.com/blog/reply");
        assert_eq!(resolve_action("http://x/y", &host), "http://x/y");
        assert_eq!(resolve_action("reply", &()), "reply");
    }
}
