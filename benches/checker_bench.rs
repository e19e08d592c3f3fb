//! Checker benchmarks.
//!
//! Builds synthetic manifests of increasing size and measures a full
//! `perform_type_checking` run, with and without finality inference.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::{Value, json};

use sable::checker::{CheckerOptions, CheckerServices, TopLevelContext, perform_type_checking, perform_whole_module_checks};
use sable::cli::manifest::{Project, parse_manifest};

/// `classes` classes, each with a stored property, a method holding a nested
/// function and a closure, and an extension adding a computed property.
fn synthetic_manifest(classes: usize) -> Value {
    let mut decls = Vec::new();
    for i in 0..classes {
        let name = format!("Widget{i}");
        decls.push(json!({ "class": {
            "name": name,
            "members": [
                { "var": { "name": "enabled", "type": "Bool", "init": { "bool": true } } },
                { "func": {
                    "name": "draw",
                    "access": "private",
                    "params": [{ "name": "count", "type": "Bool" }],
                    "body": [
                        { "let": { "name": "label", "init": { "string": "widget" } } },
                        { "func": { "name": "helper", "body": [{ "return": { "ref": "count" } }] } },
                        { "expr": { "closure": [{ "expr": { "array": [{ "int": "1" }, { "int": "2" }] } }] } }
                    ]
                } }
            ]
        } }));
        decls.push(json!({ "extension": {
            "path": [{ "name": name }],
            "members": [
                { "var": { "name": "visible", "type": "Bool", "accessors": ["get"] } }
            ]
        } }));
    }
    decls.push(json!({ "code": [{ "expr": { "dict": [[{ "string": "a" }, { "int": "1" }]] } }] }));

    json!({
        "modules": [{
            "name": "App",
            "units": [{ "file": "main.sable", "kind": "main", "decls": decls }]
        }]
    })
}

fn build(manifest: &str) -> Project {
    parse_manifest(manifest)
        .and_then(|manifest| manifest.build())
        .expect("synthetic manifest should build")
}

fn bench_type_checking(c: &mut Criterion) {
    let mut group = c.benchmark_group("perform_type_checking");
    let services = CheckerServices::standard();

    for classes in [10, 100, 500] {
        let manifest = synthetic_manifest(classes).to_string();
        group.bench_with_input(BenchmarkId::from_parameter(classes), &manifest, |b, manifest| {
            b.iter_with_setup(
                || build(manifest),
                |mut project| {
                    let unit = project.default_unit().expect("main unit");
                    let mut top_level = TopLevelContext::new();
                    let outcome = perform_type_checking(
                        &mut project.ast,
                        unit,
                        &mut top_level,
                        0,
                        &services,
                        CheckerOptions::default(),
                        None,
                    );
                    black_box(outcome.stats.rounds)
                },
            );
        });
    }
    group.finish();
}

fn bench_finality(c: &mut Criterion) {
    let mut group = c.benchmark_group("finality_inference");
    let services = CheckerServices::standard();

    for classes in [100, 500] {
        let manifest = synthetic_manifest(classes).to_string();
        group.bench_with_input(BenchmarkId::from_parameter(classes), &manifest, |b, manifest| {
            b.iter_with_setup(
                || {
                    let mut project = build(manifest);
                    let unit = project.default_unit().expect("main unit");
                    let mut top_level = TopLevelContext::new();
                    perform_type_checking(
                        &mut project.ast,
                        unit,
                        &mut top_level,
                        0,
                        &services,
                        CheckerOptions {
                            whole_module: true,
                            ..CheckerOptions::default()
                        },
                        None,
                    );
                    (project, unit)
                },
                |(mut project, unit)| {
                    let module = project.ast.unit(unit).module;
                    black_box(perform_whole_module_checks(&mut project.ast, module, unit, true))
                },
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_type_checking, bench_finality);
criterion_main!(benches);
