use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use dom::Document;
use dom_test_support::{fixture_registry, sample_article};
use sanitizer::Pipeline;
use sanitizer::passes::{TagAndAttributeSanitizer, default_passes};
use std::collections::HashMap;

const SMALL_SECTIONS: usize = 16;
const LARGE_SECTIONS: usize = 2_000;

fn article(sections: usize) -> Document {
    let mut doc = Document::new();
    sample_article(&mut doc, sections);
    doc
}

fn host() -> HashMap<String, String> {
    let mut host = HashMap::new();
    host.insert("home_url".to_string(), "https://example.com/".to_string());
    host
}

fn bench_full_pipeline(c: &mut Criterion, name: &str, sections: usize) {
    let registry = fixture_registry();
    let host = host();
    let input = article(sections);
    c.bench_function(name, |b| {
        b.iter_batched(
            || input.clone(),
            |mut doc| {
                let mut pipeline = Pipeline::new(&registry, default_passes()).expect("pipeline");
                let report = pipeline.run(&mut doc, &host).expect("run");
                black_box((doc, report));
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_pipeline_small(c: &mut Criterion) {
    bench_full_pipeline(c, "bench_pipeline_small", SMALL_SECTIONS);
}

fn bench_pipeline_large(c: &mut Criterion) {
    bench_full_pipeline(c, "bench_pipeline_large", LARGE_SECTIONS);
}

fn bench_tag_and_attribute_large(c: &mut Criterion) {
    let registry = fixture_registry();
    let input = article(LARGE_SECTIONS);
    c.bench_function("bench_tag_and_attribute_large", |b| {
        b.iter_batched(
            || input.clone(),
            |mut doc| {
                let mut pipeline =
                    Pipeline::new(&registry, vec![Box::new(TagAndAttributeSanitizer::default())])
                        .expect("pipeline");
                let report = pipeline.run(&mut doc, &()).expect("run");
                black_box((doc, report));
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_pipeline_small,
    bench_pipeline_large,
    bench_tag_and_attribute_large
);
criterion_main!(benches);
