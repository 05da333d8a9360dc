use badge_renderer::compose::{BadgeTemplate, BuiltinLayout, compose_builtin, export_svg};
use badge_renderer::model::BadgeFields;
use badge_renderer::registry::{TemplateId, TemplateRecord};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn builtin_template(id: TemplateId) -> &'static str {
    match id {
        TemplateId::Staff => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/templates/badge-template-1.svg"
        )),
        TemplateId::Attendee => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/templates/badge-template-2.svg"
        )),
        TemplateId::Speaker => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/templates/badge-template-3.svg"
        )),
        TemplateId::Partner => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/templates/badge-template-4.svg"
        )),
    }
}

// A custom upload with `repeat` copies of every placeholder.
fn custom_source(repeat: usize) -> String {
    let mut out = String::from(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 400 600">"#,
    );
    for i in 0..repeat {
        out.push_str(&format!(
            r#"<text y="{y}">{{{{firstName}}}} {{{{lastName}}}}</text><text y="{y}">[COMPANY]</text><text y="{y}">%title%</text>"#,
            y = i * 10
        ));
    }
    out.push_str("</svg>");
    out
}

fn fields() -> BadgeFields {
    BadgeFields {
        first_name: "Marie-Claire".into(),
        last_name: "Van den Broeck".into(),
        title: "Principal Engineer".into(),
        company: "Ben & Jerry's International Ice Cream Works".into(),
        location: "Brussels".into(),
        badge_type: "Speaker".into(),
    }
}

fn bench_builtin(c: &mut Criterion) {
    let fields = fields();
    let mut group = c.benchmark_group("compose_builtin");
    for id in TemplateId::ALL {
        let source = builtin_template(id);
        let layout = BuiltinLayout::for_template(id);
        group.bench_with_input(BenchmarkId::from_parameter(id), &source, |b, source| {
            b.iter(|| compose_builtin(black_box(source), black_box(&fields), &layout))
        });
    }
    group.finish();
}

fn bench_custom(c: &mut Criterion) {
    let fields = fields();
    let mut group = c.benchmark_group("compose_custom");
    for repeat in [1usize, 20, 200] {
        let template = BadgeTemplate::custom(TemplateRecord::from_body("bench.svg", custom_source(repeat)));
        group.bench_with_input(BenchmarkId::from_parameter(repeat), &template, |b, template| {
            b.iter(|| template.compose(black_box(&fields), 20))
        });
    }
    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let template = BadgeTemplate::custom(TemplateRecord::from_body("bench.svg", custom_source(20)));
    let composed = template.compose(&fields(), 20);
    let size = template.export_size(3.0);
    c.bench_function("export_svg", |b| b.iter(|| export_svg(black_box(&composed), size)));
}

criterion_group!(benches, bench_builtin, bench_custom, bench_export);
criterion_main!(benches);
