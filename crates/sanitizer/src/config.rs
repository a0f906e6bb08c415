//! Run configuration: per-pass option structs, pipeline layout and host
//! settings.

use crate::error::{ConfigError, PipelineError};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

/// Raw options handed to a pass constructor.
pub type PassArgs = serde_json::Map<String, Value>;

/// Builds a pass's option struct. Missing keys take the struct's defaults and
/// unknown keys are ignored.
pub fn parse_args<T>(pass: &str, args: &PassArgs) -> Result<T, PipelineError>
where
    T: DeserializeOwned + Default,
{
    if args.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_value(Value::Object(args.clone())).map_err(|source| {
        PipelineError::InvalidPassConfig {
            pass: pass.to_string(),
            source,
        }
    })
}

/// Settings owned by the embedding application.
pub trait HostConfig {
    fn get(&self, key: &str) -> Option<String>;

    fn is_enabled(&self, key: &str) -> bool {
        matches!(
            self.get(key).as_deref().map(str::trim),
            Some("1" | "true" | "yes" | "on")
        )
    }

    /// Base URL that relative links are resolved against.
    fn home_url(&self) -> Option<String> {
        self.get("home_url")
    }
}

impl HostConfig for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl HostConfig for serde_json::Map<String, Value> {
    fn get(&self, key: &str) -> Option<String> {
        match serde_json::Map::get(self, key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// No host settings at all.
impl HostConfig for () {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PassEntry {
    pub name: String,
    #[serde(default)]
    pub args: toml::Table,
}

/// Ordered pass layout, usually read from TOML:
///
/// ```toml
/// [[pass]]
/// name = "img"
/// args = { default_width = 320 }
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PipelineConfig {
    #[serde(rename = "pass", default)]
    pub passes: Vec<PassEntry>,
}

impl PipelineConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn pass_names(&self) -> impl Iterator<Item = &str> {
        self.passes.iter().map(|p| p.name.as_str())
    }
}

impl PassEntry {
    pub fn args(&self) -> Result<PassArgs, ConfigError> {
        let value = serde_json::to_value(&self.args).map_err(|source| ConfigError::Args {
            pass: self.name.clone(),
            source,
        })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Ok(PassArgs::new()),
        }
    }
}
