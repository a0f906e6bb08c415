//! Shared helpers for tests, benches and fuzzing: tree builders, the fixture
//! rule catalog and readable outline diffs.

use dom::{Document, NodeKey, outline};
use rule_spec::TagSpecRegistry;

pub const FIXTURE_TAG_SPECS: &str = include_str!("../fixtures/tag_specs.toml");

pub fn fixture_registry() -> TagSpecRegistry {
    match TagSpecRegistry::from_toml_str(FIXTURE_TAG_SPECS) {
        Ok(registry) => registry,
        Err(err) => panic!("fixture tag specs do not load: {err}"),
    }
}

/// Appends a new element under `parent`.
pub fn element(doc: &mut Document, parent: NodeKey, tag: &str, attrs: &[(&str, &str)]) -> NodeKey {
    let key = doc.create_element_with_attributes(tag, attrs.iter().copied());
    if let Err(err) = doc.append_child(parent, key) {
        panic!("cannot append <{tag}> under {parent}: {err}");
    }
    key
}

pub fn text(doc: &mut Document, parent: NodeKey, value: &str) -> NodeKey {
    let key = doc.create_text(value);
    if let Err(err) = doc.append_child(parent, key) {
        panic!("cannot append text under {parent}: {err}");
    }
    key
}

/// `html > (head, body)`; returns `(html, head, body)`.
pub fn skeleton(doc: &mut Document) -> (NodeKey, NodeKey, NodeKey) {
    let root = doc.root();
    let html = element(doc, root, "html", &[]);
    let head = element(doc, html, "head", &[]);
    let body = element(doc, html, "body", &[]);
    (html, head, body)
}

pub fn document_outline(doc: &Document) -> Vec<String> {
    outline(&doc.snapshot())
}

pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    use std::fmt::Write;

    fn line(lines: &[String], i: usize) -> &str {
        lines.get(i).map(String::as_str).unwrap_or("<missing>")
    }

    let max = expected.len().max(actual.len());
    let mut out = String::new();
    let mismatch = (0..max).find(|i| line(expected, *i) != line(actual, *i));
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for idx in start..end {
            let marker = if idx == i { ">" } else { " " };
            let _ = writeln!(&mut out, "{marker} {:>4}  expected: {}", idx + 1, line(expected, idx));
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {}", idx + 1, line(actual, idx));
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

/// Panics with a line diff when the document does not render as `expected`.
pub fn assert_outline(doc: &Document, expected: &[&str]) {
    let expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    let actual = document_outline(doc);
    if expected != actual {
        panic!("outline mismatch\n{}", diff_lines(&expected, &actual));
    }
}

/// Builds a small article page touching every built-in pass. Used by the
/// bench and as a smoke input.
pub fn sample_article(doc: &mut Document, sections: usize) {
    let (_, head, body) = skeleton(doc);
    let style = element(doc, head, "style", &[]);
    text(doc, style, "body { margin: 0 }");
    element(doc, head, "script", &[("src", "https://cdn.example/app.js")]);

    for i in 0..sections {
        let section = element(doc, body, "div", &[("class", "section"), ("onclick", "track()")]);
        let heading = element(doc, section, "h2", &[]);
        text(doc, heading, &format!("Section {i}"));
        let p = element(doc, section, "p", &[("style", "color: red")]);
        text(doc, p, "Lorem ipsum ");
        let link = element(doc, p, "a", &[("href", "https://example.com/more"), ("target", "_new")]);
        text(doc, link, "more");
        element(doc, section, "img", &[("src", "https://img.example/a.png"), ("alt", "a")]);
        let gallery = element(doc, section, "div", &[("class", "gallery")]);
        element(doc, gallery, "img", &[("src", "https://img.example/b.png")]);
        element(doc, gallery, "img", &[("src", "https://img.example/c.png")]);
        let form = element(doc, section, "form", &[("action", "/subscribe"), ("method", "post")]);
        element(doc, form, "input", &[("name", "email"), ("type", "email")]);
        let unknown = element(doc, section, "marquee", &[]);
        text(doc, unknown, "news");
    }
}
