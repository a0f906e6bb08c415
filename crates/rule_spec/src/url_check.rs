use crate::rules::UrlRule;
use crate::validation::{Validation, ValidationOptions};
use memchr::memchr;
use std::borrow::Cow;

const TEMPLATE_PLACEHOLDER: &str = "{{";

/// How a URL attribute value reads once browser preprocessing is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reference<'a> {
    Absolute(&'a str),
    /// Relative or scheme-relative (`//host/...`).
    Relative,
    /// A colon ends the first segment but the prefix is not a valid scheme.
    Malformed,
}

/// Strips what browsers drop before parsing: leading and trailing C0
/// controls and spaces, and every tab or newline inside the value.
pub fn preprocess(raw: &str) -> Cow<'_, str> {
    let trimmed = raw.trim_matches(|c: char| c <= ' ');
    if trimmed.contains(['\t', '\n', '\r']) {
        Cow::Owned(
            trimmed
                .chars()
                .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
                .collect(),
        )
    } else {
        Cow::Borrowed(trimmed)
    }
}

/// Classifies a preprocessed value by its first segment.
pub fn classify(value: &str) -> Reference<'_> {
    let bytes = value.as_bytes();
    let Some(end) = memchr::memchr3(b':', b'/', b'?', bytes) else {
        return Reference::Relative;
    };
    if bytes[end] != b':' || memchr(b'#', &bytes[..end]).is_some() {
        return Reference::Relative;
    }
    let candidate = &bytes[..end];
    let valid = candidate.first().is_some_and(u8::is_ascii_alphabetic)
        && candidate
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'));
    if valid {
        Reference::Absolute(&value[..end])
    } else {
        Reference::Malformed
    }
}

/// Scheme of an absolute URL, or `None` for relative, scheme-relative and
/// malformed references.
pub fn scheme_of(value: &str) -> Option<&str> {
    match classify(value) {
        Reference::Absolute(scheme) => Some(scheme),
        Reference::Relative | Reference::Malformed => None,
    }
}

/// Host of an absolute or scheme-relative URL, without a trailing root dot.
pub fn host_of(value: &str) -> Option<String> {
    let parsed = if value.starts_with("//") {
        url::Url::parse(&format!("https:{value}")).ok()?
    } else {
        scheme_of(value)?;
        url::Url::parse(value).ok()?
    };
    parsed
        .host_str()
        .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
}

fn domain_matches(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.');
    let domain = domain.trim_start_matches('.').trim_end_matches('.');
    if domain.is_empty() {
        return false;
    }
    host.eq_ignore_ascii_case(domain)
        || (host.len() > domain.len()
            && host[..host.len() - domain.len()].ends_with('.')
            && host[host.len() - domain.len()..].eq_ignore_ascii_case(domain))
}

/// Protocol check, then disallowed-domain check.
pub fn check(rule: &UrlRule, raw: &str, options: &ValidationOptions) -> Validation {
    let cleaned = preprocess(raw);
    let value = &*cleaned;
    if value.is_empty() {
        return Validation::from_bool(rule.allow_empty);
    }
    if options.allow_template_placeholders && value.contains(TEMPLATE_PLACEHOLDER) {
        return Validation::Pass;
    }
    match classify(value) {
        Reference::Absolute(scheme) => {
            if !rule.allowed_protocols.is_empty()
                && !rule
                    .allowed_protocols
                    .iter()
                    .any(|p| p.eq_ignore_ascii_case(scheme))
            {
                log::debug!(target: "rule_spec.url", "protocol {scheme:?} not allowed in {value:?}");
                return Validation::Fail;
            }
        }
        Reference::Malformed => {
            log::debug!(target: "rule_spec.url", "unparseable scheme in {value:?}");
            return Validation::Fail;
        }
        Reference::Relative if !rule.allow_relative => {
            log::debug!(target: "rule_spec.url", "relative url {value:?} not allowed");
            return Validation::Fail;
        }
        Reference::Relative => {}
    }
    if !rule.disallowed_domains.is_empty()
        && let Some(host) = host_of(value)
        && rule
            .disallowed_domains
            .iter()
            .any(|d| domain_matches(&host, d))
    {
        log::debug!(target: "rule_spec.url", "host {host:?} is disallowed");
        return Validation::Fail;
    }
    Validation::Pass
}
