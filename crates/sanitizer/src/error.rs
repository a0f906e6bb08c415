use dom::{NodeKey, TreeError};
use thiserror::Error;

/// Problems found before any document is touched.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pass {pass} requires a tag spec for <{tag}>, which the registry does not have")]
    MissingCollaboratorData { pass: &'static str, tag: &'static str },
    #[error("unknown pass {0:?}")]
    UnknownPass(String),
    #[error("invalid configuration for pass {pass}: {source}")]
    InvalidPassConfig {
        pass: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("pipeline config is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("pass args for {pass} cannot be represented as JSON: {source}")]
    Args {
        pass: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A run that had to stop; the document is left as the failing pass left it.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("pass {pass} broke the tree at {location}: {source}")]
    StructuralViolation {
        pass: &'static str,
        location: String,
        #[source]
        source: TreeError,
    },
}

impl RunError {
    pub fn pass(&self) -> &'static str {
        match self {
            RunError::StructuralViolation { pass, .. } => pass,
        }
    }
}

/// Something worth reporting that did not stop the run.
#[derive(Clone, Debug, PartialEq)]
pub enum RunWarning {
    UnconsumedMarker {
        key: String,
        anchor: NodeKey,
        location: String,
    },
}
