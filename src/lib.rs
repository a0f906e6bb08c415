//! Rewrites an HTML document tree into the constrained component dialect.
//!
//! The work is split across three crates, re-exported here:
//!
//! - [`dom`]: the mutable document tree the passes operate on.
//! - [`rule_spec`]: declarative tag and attribute rules and their validation.
//! - [`sanitizer`]: the passes, the pipeline that orders them, and the
//!   cross-pass context machinery.
//!
//! ```no_run
//! use strictml::{Document, Pipeline, TagSpecRegistry, passes};
//!
//! # fn load() -> (Document, String) { unimplemented!() }
//! let (mut doc, rules) = load();
//! let registry = TagSpecRegistry::from_toml_str(&rules)?;
//! let mut pipeline = Pipeline::new(&registry, passes::default_passes())?;
//! let report = pipeline.run(&mut doc, &())?;
//! for (slug, src) in report.outputs.scripts() {
//!     println!("{slug}: {src}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use dom;
pub use rule_spec;
pub use sanitizer;

pub use dom::{Document, Node, NodeKey, TreeError};
pub use rule_spec::{SpecLoadError, TagSpecRegistry, Validation, ValidationOptions};
pub use sanitizer::{
    HostConfig, Pipeline, PipelineConfig, PipelineError, RunError, RunReport, RunWarning,
    Sanitizer, SideOutputs, passes,
};
