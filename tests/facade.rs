use dom_test_support::{element, fixture_registry, skeleton};
use strictml::{Document, Pipeline, PipelineConfig, passes};

#[test]
fn configured_pipeline_runs_through_the_facade() {
    let registry = fixture_registry();
    let config = PipelineConfig::from_toml_str(
        r#"
[[pass]]
name = "script"

[[pass]]
name = "tag_and_attribute"
"#,
    )
    .expect("config parses");
    let mut pipeline = Pipeline::from_config(&registry, &config).expect("pipeline builds");

    let mut doc = Document::new();
    let (_, head, body) = skeleton(&mut doc);
    let script = element(&mut doc, head, "script", &[("src", "https://cdn.example/x.js")]);
    let p = element(&mut doc, body, "p", &[("onclick", "x()")]);

    let report = pipeline.run(&mut doc, &()).expect("run succeeds");
    assert!(report.outputs.is_empty());
    assert!(!doc.contains(script));
    assert!(!doc.has_attr(p, "onclick"));
}

#[test]
fn default_passes_need_the_component_specs() {
    let empty = strictml::TagSpecRegistry::new();
    assert!(Pipeline::new(&empty, passes::default_passes()).is_err());
    let registry = fixture_registry();
    assert!(Pipeline::new(&registry, passes::default_passes()).is_ok());
}
