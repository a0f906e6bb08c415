//! Rewrites a parsed document, pass by pass, into the constrained component
//! dialect.
//!
//! A [`Pipeline`] owns an ordered list of [`Sanitizer`] passes and a
//! read-only [`rule_spec::TagSpecRegistry`]. Each run threads one
//! [`dom::Document`] through the passes together with a fresh
//! [`ContextManager`] and [`MarkerList`], and collects the scripts and styles
//! the passes ask for into [`SideOutputs`].

mod config;
mod context;
mod error;
mod fallback;
mod marker;
mod pass;
pub mod passes;
mod pipeline;
mod policy;

pub use crate::config::{HostConfig, PassArgs, PassEntry, PipelineConfig, parse_args};
pub use crate::context::{ContextManager, Payload};
pub use crate::error::{ConfigError, PipelineError, RunError, RunWarning};
pub use crate::fallback::{COMPONENT_PREFIX, FALLBACK_TAG, NoscriptFallback, is_component_tag};
pub use crate::marker::{ContextMarker, MarkerList, MarkerOp, PlacedMarker, Placement};
pub use crate::pass::{
    EXEMPT_ATTRIBUTE, PassContext, Sanitizer, ScriptDescriptor, SideOutputs, component_script,
    is_exempt,
};
pub use crate::passes::build_pass;
pub use crate::pipeline::{Pipeline, RunReport};
pub use crate::policy::{RemovalPolicy, apply_removal_policy, for_each_match_reverse, removal_policy};
