/// Outcome of checking one rule against one node.
///
/// `NotApplicable` means the rule does not constrain this node (for example
/// an optional attribute that is absent); it is never a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Validation {
    Pass,
    Fail,
    NotApplicable,
}

impl Validation {
    pub fn from_bool(ok: bool) -> Self {
        if ok { Validation::Pass } else { Validation::Fail }
    }

    pub fn is_fail(self) -> bool {
        self == Validation::Fail
    }
}

/// Context-dependent relaxations supplied by the caller.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValidationOptions {
    /// Inside template regions URL values may contain `{{...}}` placeholders
    /// that are only resolved at render time; protocol/domain checks are
    /// skipped for such values.
    pub allow_template_placeholders: bool,
}
