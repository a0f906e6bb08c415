//! Rule types and their per-node checks.
//!
//! Attribute checks run in a fixed order: presence (any alternative name
//! counts), then the value shape, then URL constraints. A later stage only
//! runs when the earlier one passed.

use crate::url_check;
use crate::validation::{Validation, ValidationOptions};
use dom::{Document, NodeKey};
use regex::Regex;

#[derive(Clone, Debug)]
pub enum ValueShape {
    Exact(String),
    CaseInsensitive(String),
    /// Compiled anchored, so it must match the whole value.
    Regex(Regex),
    RegexCaseInsensitive(Regex),
}

impl ValueShape {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            ValueShape::Exact(expected) => value == expected,
            ValueShape::CaseInsensitive(expected) => value.eq_ignore_ascii_case(expected),
            ValueShape::Regex(re) | ValueShape::RegexCaseInsensitive(re) => re.is_match(value),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct UrlRule {
    /// Lowercase scheme names; empty means any scheme.
    pub allowed_protocols: Vec<String>,
    pub disallowed_domains: Vec<String>,
    pub allow_empty: bool,
    pub allow_relative: bool,
}

#[derive(Clone, Debug)]
pub struct AttrRule {
    pub name: String,
    pub mandatory: bool,
    pub alternative_names: Vec<String>,
    pub value: Option<ValueShape>,
    pub url: Option<UrlRule>,
}

impl AttrRule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            mandatory: false,
            alternative_names: Vec::new(),
            value: None,
            url: None,
        }
    }

    /// The primary name followed by every alternative name.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.alternative_names.iter().map(String::as_str))
    }

    pub fn answers_to(&self, attr: &str) -> bool {
        self.names().any(|n| n.eq_ignore_ascii_case(attr))
    }

    /// First present spelling of this attribute and its value.
    pub fn present_value<'d>(&self, doc: &'d Document, key: NodeKey) -> Option<&'d str> {
        self.names().find_map(|n| doc.attr(key, n))
    }

    pub fn check_presence(&self, doc: &Document, key: NodeKey) -> Validation {
        match (self.present_value(doc, key), self.mandatory) {
            (Some(_), _) => Validation::Pass,
            (None, true) => Validation::Fail,
            (None, false) => Validation::NotApplicable,
        }
    }

    /// Absent attributes are not constrained by their value shape.
    pub fn check_value(&self, doc: &Document, key: NodeKey) -> Validation {
        let (Some(shape), Some(value)) = (&self.value, self.present_value(doc, key)) else {
            return Validation::NotApplicable;
        };
        Validation::from_bool(shape.matches(value))
    }

    pub fn check_url(
        &self,
        doc: &Document,
        key: NodeKey,
        options: &ValidationOptions,
    ) -> Validation {
        let (Some(rule), Some(value)) = (&self.url, self.present_value(doc, key)) else {
            return Validation::NotApplicable;
        };
        url_check::check(rule, value, options)
    }

    /// Value stages (shape, then URL) for one concrete attribute value.
    pub fn validate_value(&self, value: &str, options: &ValidationOptions) -> Validation {
        if let Some(shape) = &self.value
            && !shape.matches(value)
        {
            return Validation::Fail;
        }
        if let Some(rule) = &self.url
            && url_check::check(rule, value, options).is_fail()
        {
            return Validation::Fail;
        }
        Validation::Pass
    }

    /// Runs every stage in order and reports the first failure.
    pub fn validate(&self, doc: &Document, key: NodeKey, options: &ValidationOptions) -> Validation {
        match self.check_presence(doc, key) {
            Validation::Fail => {
                log::debug!(
                    target: "rule_spec.validate",
                    "mandatory attribute {} missing on {}",
                    self.name,
                    doc.location(key)
                );
                return Validation::Fail;
            }
            Validation::NotApplicable => return Validation::NotApplicable,
            Validation::Pass => {}
        }
        let Some(value) = self.present_value(doc, key) else {
            return Validation::NotApplicable;
        };
        let result = self.validate_value(value, options);
        if result.is_fail() {
            log::debug!(
                target: "rule_spec.validate",
                "attribute {} on {} has a disallowed value {value:?}",
                self.name,
                doc.location(key)
            );
        }
        result
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StructuralRule {
    MandatoryAncestor(String),
    DisallowedAncestor(String),
    MandatoryParent(String),
}

impl StructuralRule {
    pub fn check(&self, doc: &Document, key: NodeKey) -> Validation {
        match self {
            StructuralRule::MandatoryAncestor(tag) => {
                Validation::from_bool(doc.ancestors(key).any(|a| doc.is_tag(a, tag)))
            }
            StructuralRule::DisallowedAncestor(tag) => {
                Validation::from_bool(!doc.ancestors(key).any(|a| doc.is_tag(a, tag)))
            }
            StructuralRule::MandatoryParent(tag) => {
                Validation::from_bool(doc.parent(key).is_some_and(|p| doc.is_tag(p, tag)))
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct TagSpec {
    pub name: String,
    pub structural: Vec<StructuralRule>,
    pub attrs: Vec<AttrRule>,
}

impl TagSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            structural: Vec::new(),
            attrs: Vec::new(),
        }
    }

    pub fn attr_rule(&self, attr: &str) -> Option<&AttrRule> {
        self.attrs.iter().find(|rule| rule.answers_to(attr))
    }

    /// `NotApplicable` when the tag declares no structural rules.
    pub fn check_structure(&self, doc: &Document, key: NodeKey) -> Validation {
        if self.structural.is_empty() {
            return Validation::NotApplicable;
        }
        for rule in &self.structural {
            if rule.check(doc, key) == Validation::Fail {
                log::debug!(
                    target: "rule_spec.validate",
                    "{rule:?} failed for {}",
                    doc.location(key)
                );
                return Validation::Fail;
            }
        }
        Validation::Pass
    }

    /// Mandatory attribute rules that currently fail on `key`.
    pub fn failing_mandatory<'s>(
        &'s self,
        doc: &Document,
        key: NodeKey,
    ) -> impl Iterator<Item = &'s AttrRule> {
        self.attrs
            .iter()
            .filter(move |rule| rule.mandatory && rule.check_presence(doc, key) == Validation::Fail)
    }
}
