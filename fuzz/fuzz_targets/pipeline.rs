#![no_main]

use dom::{Document, NodeKey};
use dom_test_support::fixture_registry;
use libfuzzer_sys::fuzz_target;
use sanitizer::Pipeline;
use sanitizer::passes::{PASS_NAMES, build_pass};
use std::collections::HashMap;

const MAX_DEPTH: usize = 48;

const TAGS: &[&str] = &[
    "div", "p", "span", "a", "ul", "li", "img", "amp-img", "amp-carousel", "form", "input",
    "template", "script", "style", "noscript", "marquee", "iframe", "head", "body", "html",
];

const ATTRS: &[(&str, &[&str])] = &[
    ("class", &["gallery", "x"]),
    ("src", &["https://img.example/a.png", "javascript:x", "", "{{src}}"]),
    ("href", &["https://example.com", "/rel", "{{url}}", "mailto:a@b"]),
    ("action", &["/post", "http://x/y", "javascript:x", ""]),
    ("method", &["post", "GET", "put"]),
    ("type", &["amp-mustache", "application/json", "text/javascript", "slides"]),
    ("target", &["_blank", "_self", "frame"]),
    ("width", &["100", "wide"]),
    ("height", &["50", "auto"]),
    ("onclick", &["x()"]),
    ("data-strictml-exempt", &[""]),
    ("amp-custom", &[""]),
];

/// Interprets the input as a small tree-building program. Only elements and
/// the root ever receive children.
fn build(data: &[u8]) -> Document {
    let mut doc = Document::new();
    let mut open: Vec<NodeKey> = vec![doc.root()];
    let mut current: Option<NodeKey> = None;
    let mut bytes = data.iter().copied();
    while let Some(op) = bytes.next() {
        let arg = bytes.next().unwrap_or(0) as usize;
        let Some(&parent) = open.last() else { break };
        match op % 5 {
            0 | 1 => {
                let key = doc.create_element(TAGS[arg % TAGS.len()]);
                if doc.append_child(parent, key).is_ok() {
                    current = Some(key);
                    if op % 5 == 0 && open.len() < MAX_DEPTH {
                        open.push(key);
                    }
                }
            }
            2 => {
                let key = doc.create_text(if arg % 2 == 0 { "text" } else { "{{name}}" });
                let _ = doc.append_child(parent, key);
            }
            3 => {
                if let Some(key) = current {
                    let (name, values) = ATTRS[arg % ATTRS.len()];
                    let value = values[(arg / ATTRS.len()) % values.len()];
                    let _ = doc.set_attr(key, name, value);
                }
            }
            _ => {
                if open.len() > 1 {
                    open.pop();
                }
            }
        }
    }
    doc
}

fuzz_target!(|data: &[u8]| {
    let registry = fixture_registry();
    let mut host = HashMap::new();
    host.insert("home_url".to_string(), "https://example.com/".to_string());
    let mut doc = build(data);

    for name in PASS_NAMES {
        let args = Default::default();
        let mut once = Pipeline::new(&registry, vec![build_pass(name, &args).unwrap()]).unwrap();
        once.run(&mut doc, &host).unwrap();
        doc.check_integrity().unwrap();
        let after_first = doc.snapshot();

        let mut twice = Pipeline::new(&registry, vec![build_pass(name, &args).unwrap()]).unwrap();
        twice.run(&mut doc, &host).unwrap();
        assert_eq!(doc.snapshot(), after_first, "pass {name} is not idempotent");
    }
});
