//! Serde model of the generated rule tables.
//!
//! The tables are produced outside this workspace and versioned on their own
//! schedule, so unknown fields are ignored rather than rejected.
//!
//! ```toml
//! [globals]
//! attrs = ["id", "class"]
//! attr_prefixes = ["data-", "aria-"]
//!
//! [supplement]
//! amp-experiment = ["src"]
//!
//! [[tags]]
//! name = "amp-img"
//! disallowed_ancestor = ["amp-sidebar"]
//!
//! [[tags.attrs]]
//! name = "src"
//! mandatory = true
//! alternative_names = ["srcset"]
//! url = { allowed_protocols = ["https", "http"], allow_relative = true }
//! ```

use crate::error::SpecLoadError;
use crate::rules::{AttrRule, StructuralRule, TagSpec, UrlRule, ValueShape};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub globals: Globals,
    /// Ad hoc additions: tag name → attribute names.
    pub supplement: BTreeMap<String, Vec<String>>,
    pub tags: Vec<RawTagSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Globals {
    pub attrs: Vec<String>,
    pub attr_prefixes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawTagSpec {
    pub name: String,
    #[serde(default)]
    pub mandatory_ancestor: Vec<String>,
    #[serde(default)]
    pub disallowed_ancestor: Vec<String>,
    #[serde(default)]
    pub mandatory_parent: Option<String>,
    #[serde(default)]
    pub attrs: Vec<RawAttrRule>,
}

#[derive(Debug, Deserialize)]
pub struct RawAttrRule {
    pub name: String,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub alternative_names: Vec<String>,
    pub value: Option<String>,
    pub value_casei: Option<String>,
    pub value_regex: Option<String>,
    pub value_regex_casei: Option<String>,
    pub url: Option<RawUrlRule>,
}

#[derive(Debug, Deserialize)]
pub struct RawUrlRule {
    #[serde(default)]
    pub allowed_protocols: Vec<String>,
    #[serde(default)]
    pub disallowed_domains: Vec<String>,
    #[serde(default)]
    pub allow_empty: bool,
    #[serde(default = "default_allow_relative")]
    pub allow_relative: bool,
}

fn default_allow_relative() -> bool {
    true
}

impl Catalog {
    pub fn from_toml_str(input: &str) -> Result<Self, SpecLoadError> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self, SpecLoadError> {
        Ok(serde_json::from_str(input)?)
    }
}

impl RawTagSpec {
    pub fn compile(self) -> Result<TagSpec, SpecLoadError> {
        let mut spec = TagSpec::new(&self.name);
        spec.structural.extend(
            self.mandatory_ancestor
                .iter()
                .map(|t| StructuralRule::MandatoryAncestor(t.to_ascii_lowercase())),
        );
        spec.structural.extend(
            self.disallowed_ancestor
                .iter()
                .map(|t| StructuralRule::DisallowedAncestor(t.to_ascii_lowercase())),
        );
        if let Some(parent) = &self.mandatory_parent {
            spec.structural
                .push(StructuralRule::MandatoryParent(parent.to_ascii_lowercase()));
        }
        for raw in self.attrs {
            let rule = raw.compile(&spec.name)?;
            spec.attrs.push(rule);
        }
        Ok(spec)
    }
}

impl RawAttrRule {
    fn compile(self, tag: &str) -> Result<AttrRule, SpecLoadError> {
        let shapes = [
            self.value.is_some(),
            self.value_casei.is_some(),
            self.value_regex.is_some(),
            self.value_regex_casei.is_some(),
        ];
        if shapes.iter().filter(|s| **s).count() > 1 {
            return Err(SpecLoadError::ConflictingValueShape {
                tag: tag.to_string(),
                attr: self.name,
            });
        }
        let anchored = |pattern: &str, flags: &str| {
            Regex::new(&format!("{flags}^(?:{pattern})$")).map_err(|source| {
                SpecLoadError::Regex {
                    tag: tag.to_string(),
                    attr: self.name.clone(),
                    source,
                }
            })
        };
        let value = if let Some(exact) = &self.value {
            Some(ValueShape::Exact(exact.clone()))
        } else if let Some(casei) = &self.value_casei {
            Some(ValueShape::CaseInsensitive(casei.clone()))
        } else if let Some(pattern) = &self.value_regex {
            Some(ValueShape::Regex(anchored(pattern, "")?))
        } else if let Some(pattern) = &self.value_regex_casei {
            Some(ValueShape::RegexCaseInsensitive(anchored(pattern, "(?i)")?))
        } else {
            None
        };
        let mut rule = AttrRule::new(&self.name);
        rule.mandatory = self.mandatory;
        rule.alternative_names = self
            .alternative_names
            .iter()
            .map(|n| n.to_ascii_lowercase())
            .collect();
        rule.value = value;
        rule.url = self.url.map(|raw| UrlRule {
            allowed_protocols: raw
                .allowed_protocols
                .iter()
                .map(|p| p.to_ascii_lowercase())
                .collect(),
            disallowed_domains: raw.disallowed_domains,
            allow_empty: raw.allow_empty,
            allow_relative: raw.allow_relative,
        });
        Ok(rule)
    }
}
