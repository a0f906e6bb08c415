//! Registry-driven allowlist over the whole document.
//!
//! The walk is pre-order with children visited last-to-first, so whatever a
//! node's own fix-up does to the tree only ever touches nodes that have not
//! been visited yet. Context markers fire as their anchors are opened and
//! closed, which is how template placeholders get relaxed URL checks.

use super::template::MUSTACHE_CONTEXT;
use crate::config::{PassArgs, parse_args};
use crate::error::PipelineError;
use crate::fallback::NoscriptFallback;
use crate::marker::Placement;
use crate::pass::{EXEMPT_ATTRIBUTE, PassContext, Sanitizer};
use crate::policy::{RemovalPolicy, apply_removal_policy};
use dom::{NodeKey, NodeKind, TreeError};
use rule_spec::ValidationOptions;
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TagAndAttributeOptions {
    pub remove_comments: bool,
}

#[derive(Clone, Copy, Debug)]
enum Frame {
    /// `trusted` subtrees are exempt and only walked for their markers.
    Open { key: NodeKey, trusted: bool },
    Close(NodeKey),
}

enum Outcome {
    Kept,
    Unwrapped(Vec<NodeKey>),
    Removed,
}

#[derive(Debug, Default)]
struct Tally {
    removed: usize,
    unwrapped: usize,
    stripped: usize,
}

#[derive(Debug, Default)]
pub struct TagAndAttributeSanitizer {
    options: TagAndAttributeOptions,
}

impl TagAndAttributeSanitizer {
    pub fn new(options: TagAndAttributeOptions) -> Self {
        Self { options }
    }

    pub fn from_args(args: &PassArgs) -> Result<Self, PipelineError> {
        Ok(Self::new(parse_args("tag_and_attribute", args)?))
    }

    fn enforce(
        &self,
        cx: &mut PassContext<'_>,
        key: NodeKey,
        tally: &mut Tally,
    ) -> Result<Outcome, TreeError> {
        let is_comment = matches!(cx.doc.kind(key)?, NodeKind::Comment { .. });
        if is_comment && self.options.remove_comments {
            cx.doc.remove(key)?;
            return Ok(Outcome::Removed);
        }
        let Some(tag) = cx.doc.tag_name(key).map(str::to_string) else {
            return Ok(Outcome::Kept);
        };

        if !cx.registry.is_allowed_tag(&tag) {
            log::debug!(
                target: "sanitizer.tag_and_attribute",
                "tag not allowed at {}",
                cx.doc.location(key)
            );
            return self.drop_element(cx, key, tally);
        }
        if cx.registry.check_structure(cx.doc, key).is_fail() {
            return self.drop_element(cx, key, tally);
        }

        let options = ValidationOptions {
            allow_template_placeholders: cx.contexts.is(MUSTACHE_CONTEXT),
        };
        let names = cx.doc.attribute_names(key);
        for name in names.iter().rev() {
            if !cx
                .registry
                .validate_attribute(cx.doc, key, name, &options)
                .is_fail()
            {
                continue;
            }
            let mandatory = cx
                .registry
                .attr_rule(&tag, name)
                .is_some_and(|rule| rule.mandatory);
            if mandatory {
                log::debug!(
                    target: "sanitizer.tag_and_attribute",
                    "mandatory attribute {name} invalid at {}",
                    cx.doc.location(key)
                );
                return self.drop_element(cx, key, tally);
            }
            log::debug!(
                target: "sanitizer.tag_and_attribute",
                "stripping attribute {name} at {}",
                cx.doc.location(key)
            );
            cx.doc.remove_attr(key, name)?;
            tally.stripped += 1;
        }

        let missing_mandatory = cx
            .registry
            .tag_spec(&tag)
            .is_some_and(|spec| spec.failing_mandatory(cx.doc, key).next().is_some());
        if missing_mandatory {
            return self.drop_element(cx, key, tally);
        }
        Ok(Outcome::Kept)
    }

    fn drop_element(
        &self,
        cx: &mut PassContext<'_>,
        key: NodeKey,
        tally: &mut Tally,
    ) -> Result<Outcome, TreeError> {
        let children = cx.doc.children(key).to_vec();
        let descendants = cx.doc.descendants(key);
        match apply_removal_policy(cx.doc, key)? {
            RemovalPolicy::Unwrap => {
                tally.unwrapped += 1;
                Ok(Outcome::Unwrapped(children))
            }
            RemovalPolicy::RemoveSubtree => {
                tally.removed += 1;
                // Markers anchored inside the dropped subtree still fire, in
                // tree order, so paired enter/leave instructions balance out.
                for node in descendants.into_iter().filter(|d| *d != key) {
                    cx.markers.apply_at(node, Placement::Open, cx.contexts);
                    cx.markers.apply_at(node, Placement::Close, cx.contexts);
                }
                Ok(Outcome::Removed)
            }
        }
    }
}

impl Sanitizer for TagAndAttributeSanitizer {
    fn name(&self) -> &'static str {
        "tag_and_attribute"
    }

    fn sanitize(&mut self, cx: &mut PassContext<'_>) -> Result<(), TreeError> {
        let mut tally = Tally::default();
        let mut stack = vec![Frame::Open {
            key: cx.doc.root(),
            trusted: false,
        }];

        while let Some(frame) = stack.pop() {
            let (key, trusted) = match frame {
                Frame::Close(key) => {
                    cx.markers.apply_at(key, Placement::Close, cx.contexts);
                    continue;
                }
                Frame::Open { key, trusted } => (key, trusted),
            };
            if !cx.doc.contains(key) {
                continue;
            }
            cx.markers.apply_at(key, Placement::Open, cx.contexts);
            stack.push(Frame::Close(key));

            let trusted = trusted || cx.doc.has_attr(key, EXEMPT_ATTRIBUTE);
            let fallback = NoscriptFallback::is_fallback_container(cx.doc, key)
                || NoscriptFallback::is_inside_fallback(cx.doc, key);
            let outcome = if trusted || fallback {
                Outcome::Kept
            } else {
                self.enforce(cx, key, &mut tally)?
            };
            let children = match outcome {
                Outcome::Kept => cx.doc.children(key).to_vec(),
                Outcome::Unwrapped(children) => children,
                Outcome::Removed => continue,
            };
            stack.extend(children.into_iter().map(|key| Frame::Open { key, trusted }));
        }

        log::trace!(
            target: "sanitizer.tag_and_attribute",
            "removed {}, unwrapped {}, stripped {} attributes",
            tally.removed,
            tally.unwrapped,
            tally.stripped
        );
        Ok(())
    }
}
