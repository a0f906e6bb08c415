use crate::catalog::Catalog;
use crate::error::SpecLoadError;
use crate::rules::{AttrRule, TagSpec};
use crate::validation::{Validation, ValidationOptions};
use dom::{Document, NodeKey};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Attribute names permitted on one tag: declared names, every alternative
/// name, globals, supplementary additions and global prefixes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowedAttributes {
    names: BTreeSet<String>,
    prefixes: Vec<String>,
}

impl AllowedAttributes {
    pub fn contains(&self, attr: &str) -> bool {
        let attr = attr.to_ascii_lowercase();
        self.names.contains(&attr) || self.prefixes.iter().any(|p| attr.starts_with(p.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Lookup and validation over the declarative tag tables.
///
/// Read-only once built; a single registry can serve many runs.
#[derive(Clone, Debug, Default)]
pub struct TagSpecRegistry {
    tags: HashMap<String, TagSpec>,
    global_attrs: BTreeSet<String>,
    global_attr_prefixes: Vec<String>,
    supplement: BTreeMap<String, BTreeSet<String>>,
}

impl TagSpecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(input: &str) -> Result<Self, SpecLoadError> {
        Self::from_catalog(Catalog::from_toml_str(input)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self, SpecLoadError> {
        Self::from_catalog(Catalog::from_json_str(input)?)
    }

    pub fn from_catalog(catalog: Catalog) -> Result<Self, SpecLoadError> {
        let mut registry = Self::new();
        registry.global_attrs = catalog
            .globals
            .attrs
            .iter()
            .map(|a| a.to_ascii_lowercase())
            .collect();
        registry.global_attr_prefixes = catalog
            .globals
            .attr_prefixes
            .iter()
            .map(|p| p.to_ascii_lowercase())
            .collect();
        for raw in catalog.tags {
            let spec = raw.compile()?;
            registry.insert(spec)?;
        }
        for (tag, attrs) in catalog.supplement {
            registry = registry.with_supplement(&tag, attrs.iter().map(String::as_str));
        }
        log::debug!(
            target: "rule_spec",
            "loaded {} tag specs, {} supplementary tags",
            registry.tags.len(),
            registry.supplement.len()
        );
        Ok(registry)
    }

    pub fn insert(&mut self, spec: TagSpec) -> Result<(), SpecLoadError> {
        if self.tags.contains_key(&spec.name) {
            return Err(SpecLoadError::DuplicateTag(spec.name));
        }
        self.tags.insert(spec.name.clone(), spec);
        Ok(())
    }

    /// Adds ad hoc allowed attributes (and the tag itself) on top of the
    /// primary tables. Primary rules are never replaced.
    pub fn with_supplement<'a>(mut self, tag: &str, attrs: impl IntoIterator<Item = &'a str>) -> Self {
        self.supplement
            .entry(tag.to_ascii_lowercase())
            .or_default()
            .extend(attrs.into_iter().map(|a| a.to_ascii_lowercase()));
        self
    }

    pub fn tag_spec(&self, tag: &str) -> Option<&TagSpec> {
        self.tags.get(&tag.to_ascii_lowercase())
    }

    pub fn has_tag_spec(&self, tag: &str) -> bool {
        self.tag_spec(tag).is_some()
    }

    pub fn is_allowed_tag(&self, tag: &str) -> bool {
        let tag = tag.to_ascii_lowercase();
        self.tags.contains_key(&tag) || self.supplement.contains_key(&tag)
    }

    pub fn allowed_attributes(&self, tag: &str) -> AllowedAttributes {
        let tag = tag.to_ascii_lowercase();
        let mut names = self.global_attrs.clone();
        if let Some(spec) = self.tags.get(&tag) {
            for rule in &spec.attrs {
                names.extend(rule.names().map(str::to_string));
            }
        }
        if let Some(extra) = self.supplement.get(&tag) {
            names.extend(extra.iter().cloned());
        }
        AllowedAttributes {
            names,
            prefixes: self.global_attr_prefixes.clone(),
        }
    }

    pub fn is_allowed_attribute(&self, tag: &str, attr: &str) -> bool {
        self.allowed_attributes(tag).contains(attr)
    }

    pub fn attr_rule(&self, tag: &str, attr: &str) -> Option<&AttrRule> {
        self.tag_spec(tag)?.attr_rule(attr)
    }

    /// Validates one attribute of an element at its current tree position.
    ///
    /// Tags without a spec are not constrained (`NotApplicable`). Attributes
    /// without a rule pass when allowed by globals/supplement and fail
    /// otherwise.
    pub fn validate_attribute(
        &self,
        doc: &Document,
        key: NodeKey,
        attr: &str,
        options: &ValidationOptions,
    ) -> Validation {
        let Some(tag) = doc.tag_name(key) else {
            return Validation::NotApplicable;
        };
        if !self.is_allowed_tag(tag) {
            return Validation::NotApplicable;
        }
        match self.attr_rule(tag, attr) {
            Some(rule) => match doc.attr(key, attr) {
                Some(value) => rule.validate_value(value, options),
                None => rule.validate(doc, key, options),
            },
            None if !doc.has_attr(key, attr) => Validation::NotApplicable,
            None => Validation::from_bool(self.is_allowed_attribute(tag, attr)),
        }
    }

    pub fn check_structure(&self, doc: &Document, key: NodeKey) -> Validation {
        match doc.tag_name(key).and_then(|tag| self.tag_spec(tag)) {
            Some(spec) => spec.check_structure(doc, key),
            None => Validation::NotApplicable,
        }
    }
}
