//! Ordered execution of sanitizer passes over one document.

use crate::config::{HostConfig, PipelineConfig};
use crate::context::ContextManager;
use crate::error::{PipelineError, RunError, RunWarning};
use crate::marker::MarkerList;
use crate::pass::{PassContext, Sanitizer, SideOutputs};
use crate::passes::build_pass;
use dom::{Document, TreeError};
use rule_spec::TagSpecRegistry;
use std::time::Instant;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
    pub outputs: SideOutputs,
    pub warnings: Vec<RunWarning>,
}

/// Passes in caller order, checked against a registry at construction.
pub struct Pipeline<'r> {
    registry: &'r TagSpecRegistry,
    passes: Vec<Box<dyn Sanitizer>>,
}

impl<'r> Pipeline<'r> {
    pub fn new(
        registry: &'r TagSpecRegistry,
        passes: Vec<Box<dyn Sanitizer>>,
    ) -> Result<Self, PipelineError> {
        for pass in &passes {
            for tag in pass.required_tag_specs() {
                if !registry.has_tag_spec(tag) {
                    return Err(PipelineError::MissingCollaboratorData {
                        pass: pass.name(),
                        tag,
                    });
                }
            }
        }
        Ok(Self { registry, passes })
    }

    pub fn from_config(
        registry: &'r TagSpecRegistry,
        config: &PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let mut passes = Vec::with_capacity(config.passes.len());
        for entry in &config.passes {
            passes.push(build_pass(&entry.name, &entry.args()?)?);
        }
        Self::new(registry, passes)
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Runs every pass once, in order.
    ///
    /// A structural violation stops the run at the failing pass; the tree is
    /// not rolled back.
    pub fn run(
        &mut self,
        doc: &mut Document,
        host: &dyn HostConfig,
    ) -> Result<RunReport, RunError> {
        let mut contexts = ContextManager::new();
        let mut markers = MarkerList::new();
        let mut report = RunReport::default();

        for pass in self.passes.iter_mut() {
            let name = pass.name();
            let started = Instant::now();
            let mut cx = PassContext {
                doc: &mut *doc,
                registry: self.registry,
                contexts: &mut contexts,
                markers: &mut markers,
                host,
            };
            pass.sanitize(&mut cx)
                .and_then(|()| doc.check_integrity())
                .map_err(|source| structural_violation(doc, name, source))?;

            let scripts = pass.scripts();
            let styles = pass.styles();
            log::trace!(
                target: "sanitizer.pipeline",
                "{name}: {} scripts, {} styles in {:?}",
                scripts.len(),
                styles.len(),
                started.elapsed()
            );
            for script in scripts {
                report.outputs.add_script(script);
            }
            for style in styles {
                report.outputs.add_style(style);
            }
        }

        for placed in markers.drain_unconsumed() {
            let location = doc.location(placed.anchor);
            log::warn!(
                target: "sanitizer.pipeline",
                "context marker {:?} for {} at {location} was never consumed",
                placed.marker.op(),
                placed.marker.key()
            );
            report.warnings.push(RunWarning::UnconsumedMarker {
                key: placed.marker.key().to_string(),
                anchor: placed.anchor,
                location,
            });
        }
        Ok(report)
    }
}

fn structural_violation(doc: &Document, pass: &'static str, source: TreeError) -> RunError {
    let location = doc.location(source.node());
    log::debug!(target: "sanitizer.pipeline", "{pass} aborted the run: {source}");
    RunError::StructuralViolation {
        pass,
        location,
        source,
    }
}
