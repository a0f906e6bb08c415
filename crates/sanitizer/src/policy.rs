//! What to do with an element that cannot be made compliant.

use crate::fallback::is_component_tag;
use dom::{Document, NodeKey, TreeError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemovalPolicy {
    /// Children are meaningless without the element.
    RemoveSubtree,
    /// Children stay valid on their own and take the element's place.
    Unwrap,
}

/// The single removal-policy table shared by every pass.
pub fn removal_policy(tag: &str) -> RemovalPolicy {
    match tag {
        "script" | "style" | "template" | "iframe" | "frame" | "frameset" | "object"
        | "embed" | "applet" | "param" | "form" | "input" | "select" | "option" | "textarea"
        | "button" | "video" | "audio" | "source" | "track" | "svg" | "math" | "canvas"
        | "map" | "head" | "title" | "meta" | "link" | "base" | "img" | "picture" => {
            RemovalPolicy::RemoveSubtree
        }
        tag if is_component_tag(tag) => RemovalPolicy::RemoveSubtree,
        _ => RemovalPolicy::Unwrap,
    }
}

/// Removes `key` according to its tag's policy and reports which one ran.
pub fn apply_removal_policy(doc: &mut Document, key: NodeKey) -> Result<RemovalPolicy, TreeError> {
    let tag = doc.tag_name(key).ok_or(TreeError::WrongNodeKind(key))?;
    let policy = removal_policy(tag);
    log::debug!(
        target: "sanitizer.policy",
        "{policy:?} {}",
        doc.location(key)
    );
    match policy {
        RemovalPolicy::RemoveSubtree => doc.remove(key)?,
        RemovalPolicy::Unwrap => doc.unwrap(key)?,
    }
    Ok(policy)
}

/// Visits a match list from the last entry to the first.
///
/// Matches are in document order, so every descendant is visited before its
/// ancestors: removing the current node can only affect nodes that were
/// already visited. Entries that no longer exist are skipped.
pub fn for_each_match_reverse<F>(
    doc: &mut Document,
    matches: &[NodeKey],
    mut visit: F,
) -> Result<(), TreeError>
where
    F: FnMut(&mut Document, NodeKey) -> Result<(), TreeError>,
{
    for key in matches.iter().rev() {
        if !doc.contains(*key) {
            continue;
        }
        visit(doc, *key)?;
    }
    Ok(())
}
