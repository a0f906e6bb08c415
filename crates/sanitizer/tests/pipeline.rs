use dom::Document;
use dom_test_support::{
    assert_outline, diff_lines, document_outline, element, fixture_registry, sample_article,
    skeleton, text,
};
use rule_spec::TagSpecRegistry;
use sanitizer::passes::{
    CarouselOptions, CarouselSanitizer, FormSanitizer, MUSTACHE_CONTEXT, PASS_NAMES,
    TagAndAttributeSanitizer, TemplateSanitizer, default_passes,
};
use sanitizer::{
    PassArgs, PassContext, Pipeline, PipelineConfig, PipelineError, RunError, RunWarning,
    Sanitizer, build_pass,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn host() -> HashMap<String, String> {
    let mut host = HashMap::new();
    host.insert("home_url".to_string(), "https://example.com/".to_string());
    host
}

fn run_passes(
    registry: &TagSpecRegistry,
    passes: Vec<Box<dyn Sanitizer>>,
    doc: &mut Document,
) -> sanitizer::RunReport {
    let mut pipeline = Pipeline::new(registry, passes).expect("pipeline builds");
    pipeline.run(doc, &host()).expect("run succeeds")
}

#[test]
fn empty_carousel_is_removed_and_script_is_requested_once() {
    let registry = fixture_registry();
    let mut doc = Document::new();
    let (_, _, body) = skeleton(&mut doc);
    let empty = element(&mut doc, body, "amp-carousel", &[]);
    let full = element(&mut doc, body, "amp-carousel", &[("height", "200")]);
    element(&mut doc, full, "amp-img", &[("src", "https://img.example/1.png")]);
    element(&mut doc, full, "amp-img", &[("src", "https://img.example/2.png")]);
    let gallery = element(&mut doc, body, "div", &[("class", "gallery")]);
    element(&mut doc, gallery, "p", &[]);

    let report = run_passes(
        &registry,
        vec![
            Box::new(CarouselSanitizer::default()),
            Box::new(TagAndAttributeSanitizer::default()),
        ],
        &mut doc,
    );

    assert!(!doc.contains(empty));
    assert!(doc.is_attached(full));
    assert_eq!(doc.attr(full, "height"), Some("200"), "existing values are kept");
    assert_eq!(doc.attr(full, "type"), Some("slides"));
    assert_eq!(doc.attr(full, "layout"), Some("responsive"));
    assert!(doc.is_tag(gallery, "amp-carousel"));

    let scripts: Vec<&str> = report.outputs.scripts().keys().map(String::as_str).collect();
    assert_eq!(scripts, ["amp-carousel"]);
    assert!(report.warnings.is_empty());
}

#[test]
fn only_empty_carousels_means_no_script() {
    let registry = fixture_registry();
    let mut doc = Document::new();
    let (_, _, body) = skeleton(&mut doc);
    element(&mut doc, body, "amp-carousel", &[]);
    let options = CarouselOptions {
        convert_galleries: false,
        ..CarouselOptions::default()
    };
    let report = run_passes(&registry, vec![Box::new(CarouselSanitizer::new(options))], &mut doc);
    assert!(report.outputs.is_empty());
    assert!(doc.elements_by_tag("amp-carousel").is_empty());
}

#[test]
fn forms_without_action_go_and_post_forms_submit_by_xhr() {
    let registry = fixture_registry();
    let mut doc = Document::new();
    let (_, _, body) = skeleton(&mut doc);
    let dead = element(&mut doc, body, "form", &[("method", "post")]);
    let dead_input = element(&mut doc, dead, "input", &[("name", "q")]);
    let post = element(&mut doc, body, "form", &[("action", "http://x/y"), ("method", "post")]);
    element(&mut doc, post, "input", &[("name", "email"), ("type", "email")]);
    let get = element(
        &mut doc,
        body,
        "form",
        &[("action", "/search"), ("target", "_blank")],
    );

    let report = run_passes(
        &registry,
        vec![
            Box::new(FormSanitizer::default()),
            Box::new(TagAndAttributeSanitizer::default()),
        ],
        &mut doc,
    );

    assert!(!doc.contains(dead), "form without action is removed");
    assert!(!doc.contains(dead_input), "its subtree goes with it");
    assert_eq!(doc.attr(post, "action-xhr"), Some("http://x/y"));
    assert_eq!(doc.attr(post, "action"), None);
    assert_eq!(doc.attr(post, "target"), Some("_top"));
    assert_eq!(doc.attr(get, "action"), Some("https://example.com/search"));
    assert_eq!(doc.attr(get, "target"), Some("_blank"));

    let scripts: Vec<(&str, &str)> = report
        .outputs
        .scripts()
        .iter()
        .map(|(slug, src)| (slug.as_str(), src.as_str()))
        .collect();
    assert_eq!(
        scripts,
        [("amp-form", "https://cdn.ampproject.org/v0/amp-form-0.1.js")]
    );
}

#[test]
fn every_pass_is_idempotent_on_its_own_output() {
    let registry = fixture_registry();
    for name in PASS_NAMES {
        let mut doc = Document::new();
        sample_article(&mut doc, 3);

        let first = build_pass(name, &PassArgs::new()).expect("known pass");
        run_passes(&registry, vec![first], &mut doc);
        let once = document_outline(&doc);

        let second = build_pass(name, &PassArgs::new()).expect("known pass");
        run_passes(&registry, vec![second], &mut doc);
        let twice = document_outline(&doc);

        assert!(
            once == twice,
            "pass {name} changed its own output\n{}",
            diff_lines(&once, &twice)
        );
    }
}

#[test]
fn full_pipeline_is_idempotent_and_integrity_holds() {
    let registry = fixture_registry();
    let mut doc = Document::new();
    sample_article(&mut doc, 2);

    let report = run_passes(&registry, default_passes(), &mut doc);
    doc.check_integrity().expect("tree stays consistent");
    let once = doc.snapshot();

    let again = run_passes(&registry, default_passes(), &mut doc);
    assert_eq!(doc.snapshot(), once);
    assert_eq!(again.outputs.scripts(), report.outputs.scripts());
    assert!(again.outputs.styles().is_empty(), "styles were lifted on the first run");

    let slugs: Vec<&str> = report.outputs.scripts().keys().map(String::as_str).collect();
    assert_eq!(slugs, ["amp-form", "amp-carousel"]);
    assert_eq!(report.outputs.styles(), ["body { margin: 0 }"]);
    assert!(doc.elements_by_tag("marquee").is_empty());
    assert!(doc.elements_by_tag("script").is_empty());
    for amp in doc.elements_by_tag("amp-img") {
        assert!(doc.has_attr(amp, "width") && doc.has_attr(amp, "height"));
    }
}

#[test]
fn template_markers_relax_placeholder_urls_inside_the_template_only() {
    let registry = fixture_registry();
    let mut doc = Document::new();
    let (_, _, body) = skeleton(&mut doc);
    let template = element(&mut doc, body, "template", &[("type", "amp-mustache")]);
    let inside = element(&mut doc, template, "a", &[("href", "{{url}}")]);
    let outside = element(&mut doc, body, "a", &[("href", "{{url}}")]);

    let report = run_passes(
        &registry,
        vec![
            Box::new(TemplateSanitizer::default()),
            Box::new(TagAndAttributeSanitizer::default()),
        ],
        &mut doc,
    );

    assert_eq!(doc.attr(inside, "href"), Some("{{url}}"));
    assert_eq!(doc.attr(outside, "href"), None);
    assert!(report.warnings.is_empty(), "markers were consumed: {:?}", report.warnings);
    assert!(report.outputs.scripts().contains_key("amp-mustache"));
}

#[test]
fn unconsumed_markers_are_reported_and_the_document_survives() {
    let registry = fixture_registry();
    let mut doc = Document::new();
    let (_, _, body) = skeleton(&mut doc);
    let template = element(&mut doc, body, "template", &[("type", "amp-mustache")]);
    text(&mut doc, template, "{{name}}");

    let report = run_passes(&registry, vec![Box::new(TemplateSanitizer::default())], &mut doc);

    assert_eq!(report.warnings.len(), 2);
    for warning in &report.warnings {
        let RunWarning::UnconsumedMarker { key, anchor, location } = warning;
        assert_eq!(key, MUSTACHE_CONTEXT);
        assert_eq!(*anchor, template);
        assert_eq!(location, "html > body > template");
    }
    assert!(doc.is_attached(template));
}

#[test]
fn exempt_subtrees_are_left_alone() {
    let registry = fixture_registry();
    let mut doc = Document::new();
    let (_, _, body) = skeleton(&mut doc);
    let exempt = element(
        &mut doc,
        body,
        "div",
        &[("data-strictml-exempt", ""), ("onclick", "go()")],
    );
    let marquee = element(&mut doc, exempt, "marquee", &[("scrollamount", "2")]);
    let plain = element(&mut doc, body, "div", &[("onclick", "go()")]);

    run_passes(&registry, vec![Box::new(TagAndAttributeSanitizer::default())], &mut doc);

    assert_eq!(doc.attr(exempt, "onclick"), Some("go()"));
    assert!(doc.is_attached(marquee));
    assert_eq!(doc.attr(marquee, "scrollamount"), Some("2"));
    assert_eq!(doc.attr(plain, "onclick"), None);
}

#[test]
fn unknown_and_misplaced_elements_follow_the_removal_table() {
    let registry = fixture_registry();
    let mut doc = Document::new();
    let (_, _, body) = skeleton(&mut doc);
    let center = element(&mut doc, body, "center", &[]);
    text(&mut doc, center, "kept text");
    let iframe = element(&mut doc, body, "iframe", &[("src", "https://video.example")]);
    text(&mut doc, iframe, "no frames");
    let stray = element(&mut doc, body, "li", &[]);
    text(&mut doc, stray, "item");
    let list = element(&mut doc, body, "ul", &[]);
    element(&mut doc, list, "li", &[]);

    run_passes(&registry, vec![Box::new(TagAndAttributeSanitizer::default())], &mut doc);

    assert_outline(
        &doc,
        &[
            "#document",
            "  <html>",
            "    <head>",
            "    <body>",
            "      \"kept text\"",
            "      \"item\"",
            "      <ul>",
            "        <li>",
        ],
    );
}

struct Broken;

impl Sanitizer for Broken {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn sanitize(&mut self, cx: &mut PassContext<'_>) -> Result<(), dom::TreeError> {
        let divs = cx.doc.elements_by_tag("div");
        let body = cx.doc.elements_by_tag("body")[0];
        cx.doc.append_child(body, divs[0])
    }
}

struct Counting(Arc<AtomicUsize>);

impl Sanitizer for Counting {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn sanitize(&mut self, _cx: &mut PassContext<'_>) -> Result<(), dom::TreeError> {
        self.0.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[test]
fn structural_violation_aborts_the_run_and_names_the_pass() {
    let registry = fixture_registry();
    let mut doc = Document::new();
    let (_, _, body) = skeleton(&mut doc);
    element(&mut doc, body, "div", &[]);

    let ran = Arc::new(AtomicUsize::new(0));
    let mut pipeline = Pipeline::new(
        &registry,
        vec![Box::new(Broken), Box::new(Counting(Arc::clone(&ran)))],
    )
    .expect("pipeline builds");

    let err = pipeline.run(&mut doc, &()).expect_err("run must fail");
    let RunError::StructuralViolation { pass, location, source } = &err;
    assert_eq!(*pass, "broken");
    assert_eq!(location, "html > body > div");
    assert!(matches!(source, dom::TreeError::AlreadyAttached { .. }));
    assert_eq!(ran.load(Ordering::Relaxed), 0, "later passes do not run");
}

#[test]
fn missing_tag_specs_are_rejected_before_any_run() {
    let registry = TagSpecRegistry::new();
    let err = Pipeline::new(&registry, vec![Box::new(CarouselSanitizer::default())])
        .err()
        .expect("construction fails");
    assert!(matches!(
        err,
        PipelineError::MissingCollaboratorData { pass: "carousel", tag: "amp-carousel" }
    ));
}

#[test]
fn pipeline_from_toml_config() {
    let registry = fixture_registry();
    let config = PipelineConfig::from_toml_str(
        r#"
[[pass]]
name = "img"
args = { default_width = 320, default_height = 240, fallback = false }

[[pass]]
name = "tag_and_attribute"
"#,
    )
    .expect("config parses");
    let mut pipeline = Pipeline::from_config(&registry, &config).expect("pipeline builds");
    assert_eq!(pipeline.pass_names(), ["img", "tag_and_attribute"]);

    let mut doc = Document::new();
    let (_, _, body) = skeleton(&mut doc);
    element(&mut doc, body, "img", &[("src", "https://img.example/x.png")]);
    pipeline.run(&mut doc, &()).expect("run succeeds");

    assert_outline(
        &doc,
        &[
            "#document",
            "  <html>",
            "    <head>",
            "    <body>",
            "      <amp-img height=\"240\" layout=\"responsive\" src=\"https://img.example/x.png\" width=\"320\">",
        ],
    );
}

#[test]
fn bad_pipeline_configs_are_rejected() {
    let registry = fixture_registry();
    let unknown = PipelineConfig::from_toml_str("[[pass]]\nname = \"iframe\"\n").unwrap();
    assert!(matches!(
        Pipeline::from_config(&registry, &unknown),
        Err(PipelineError::UnknownPass(name)) if name == "iframe"
    ));

    let invalid =
        PipelineConfig::from_toml_str("[[pass]]\nname = \"img\"\nargs = { default_width = \"wide\" }\n")
            .unwrap();
    assert!(matches!(
        Pipeline::from_config(&registry, &invalid),
        Err(PipelineError::InvalidPassConfig { pass, .. }) if pass == "img"
    ));
}

#[test]
fn pipelines_and_registries_can_cross_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TagSpecRegistry>();
    assert_send_sync::<Pipeline<'static>>();
}
