use clap::Parser;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

use super::args::CliArgs;
use super::driver::{EXIT_DIAGNOSTICS, EXIT_SUCCESS, check_project, run, select_unit};
use super::manifest::parse_manifest;

fn write_manifest(dir: &Path, value: &Value) -> PathBuf {
    let path = dir.join("app.json");
    std::fs::write(&path, value.to_string()).expect("failed to write manifest");
    path
}

fn app(decls: Value) -> Value {
    json!({
        "modules": [{
            "name": "App",
            "units": [{ "file": "main.sable", "kind": "main", "decls": decls }]
        }]
    })
}

/// Run the CLI on `manifest` with extra flags; returns the exit code and
/// everything written to stdout.
fn run_cli(manifest: &Value, flags: &[&str]) -> (i32, String) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_manifest(dir.path(), manifest);
    let mut argv = vec!["sable".to_string(), "--pretty".to_string(), "false".to_string()];
    argv.extend(flags.iter().map(|flag| flag.to_string()));
    argv.push(path.display().to_string());
    let args = CliArgs::try_parse_from(argv).expect("args should parse");

    let mut out = Vec::new();
    let code = run(&args, &mut out).expect("run should succeed");
    (code, String::from_utf8(out).expect("utf-8 output"))
}

fn run_json(manifest: &Value, flags: &[&str]) -> (i32, Value) {
    let mut flags = flags.to_vec();
    flags.push("--json");
    let (code, out) = run_cli(manifest, &flags);
    (code, serde_json::from_str(&out).expect("report should be JSON"))
}

fn widget_with_draw(access: Option<&str>) -> Value {
    let mut draw = json!({ "name": "draw", "body": [] });
    if let Some(access) = access {
        draw["access"] = json!(access);
    }
    app(json!([{ "class": { "name": "Widget", "members": [{ "func": draw }] } }]))
}

#[test]
fn test_clean_manifest_exits_successfully() {
    let (code, out) = run_cli(&app(json!([{ "struct": { "name": "Point" } }])), &[]);

    assert_eq!(code, EXIT_SUCCESS);
    assert!(out.contains("Found 0 errors in main.sable."), "{out}");
}

#[test]
fn test_unresolved_name_is_reported() {
    let manifest = app(json!([{ "code": [{ "expr": { "ref": "nowhere" } }] }]));
    let (code, out) = run_cli(&manifest, &[]);

    assert_eq!(code, EXIT_DIAGNOSTICS);
    assert!(out.contains("error SB2003: Cannot find 'nowhere' in scope."), "{out}");
    assert!(out.contains("Found 1 error in main.sable."), "{out}");
}

#[test]
fn test_json_report_carries_stage_and_statistics() {
    let manifest = app(json!([
        { "func": { "name": "run", "body": [{ "expr": { "int": "1" } }] } },
        { "code": [{ "expr": { "ref": "nowhere" } }] }
    ]));
    let (code, report) = run_json(&manifest, &[]);

    assert_eq!(code, EXIT_DIAGNOSTICS);
    assert_eq!(report["unit"], "main.sable");
    assert_eq!(report["stage"], "TypeChecked");
    assert_eq!(report["diagnostics"].as_array().map(Vec::len), Some(1));
    assert_eq!(report["diagnostics"][0]["code"], 2003);
    assert!(report["stats"]["rounds"].as_u64().unwrap_or(0) >= 1);
    assert!(report["stats"]["bodiesChecked"].as_u64().unwrap_or(0) >= 1);
    assert!(report.get("finality").is_none());
}

#[test]
fn test_infer_final_lists_private_members() {
    let (code, report) = run_json(&widget_with_draw(Some("private")), &["--infer-final"]);

    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(report["finality"]["inferred"], 1);
    assert_eq!(report["finality"]["finalized"], json!(["Widget.draw"]));
}

#[test]
fn test_internal_members_need_whole_module_for_finality() {
    let manifest = widget_with_draw(None);

    let (_, single) = run_json(&manifest, &["--infer-final"]);
    assert_eq!(single["finality"]["inferred"], 0);
    assert_eq!(single["finality"]["wholeModule"], false);

    let (_, whole) = run_json(&manifest, &["--infer-final", "--whole-module"]);
    assert_eq!(whole["finality"]["finalized"], json!(["Widget.draw"]));
}

#[test]
fn test_public_members_of_internal_classes_stay_overridable() {
    let (code, report) = run_json(&widget_with_draw(Some("public")), &["--infer-final", "--whole-module"]);

    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(report["finality"]["inferred"], 0);
}

#[test]
fn test_extension_of_generic_type_without_parameters() {
    let manifest = app(json!([
        { "struct": { "name": "Box", "generics": ["T"] } },
        { "extension": {
            "path": [{ "name": "Box" }],
            "members": [{ "func": { "name": "peek", "body": [] } }]
        } }
    ]));
    let (code, report) = run_json(&manifest, &[]);

    assert_eq!(code, EXIT_SUCCESS, "{report}");
    assert_eq!(report["diagnostics"], json!([]));
}

#[test]
fn test_text_output_lists_finalized_declarations() {
    let (_, out) = run_cli(&widget_with_draw(Some("private")), &["--infer-final"]);
    assert!(out.contains("final: Widget.draw"), "{out}");
}

#[test]
fn test_bridged_declarations_need_the_bridging_module() {
    let manifest = app(json!([{ "class": { "name": "Handle", "bridged": true } }]));

    let (code, report) = run_json(&manifest, &[]);
    assert_eq!(code, EXIT_DIAGNOSTICS);
    assert_eq!(report["diagnostics"][0]["code"], 2301);

    let (code, report) = run_json(&manifest, &["--allow-unimported-bridging"]);
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(report["diagnostics"], json!([]));
}

#[test]
fn test_importing_the_bridging_module_allows_bridged_declarations() {
    let manifest = json!({
        "bridgingModule": "Native",
        "modules": [
            { "name": "Native", "units": [{ "file": "native.sable" }] },
            { "name": "App", "units": [{
                "file": "main.sable",
                "kind": "main",
                "imports": ["Native"],
                "decls": [{ "class": { "name": "Handle", "bridged": true } }]
            }] }
        ]
    });
    let (code, report) = run_json(&manifest, &[]);

    assert_eq!(code, EXIT_SUCCESS, "{report}");
}

#[test]
fn test_unit_flag_selects_a_library_unit() {
    let manifest = json!({
        "modules": [{
            "name": "App",
            "units": [
                { "file": "main.sable", "kind": "main" },
                { "file": "widgets.sable", "decls": [{ "code": [{ "expr": { "ref": "nowhere" } }] }] }
            ]
        }]
    });

    let (code, _) = run_json(&manifest, &[]);
    assert_eq!(code, EXIT_SUCCESS);

    let (code, report) = run_json(&manifest, &["--unit", "widgets.sable"]);
    assert_eq!(code, EXIT_DIAGNOSTICS);
    assert_eq!(report["unit"], "widgets.sable");
}

#[test]
fn test_external_definitions_are_synchronized() {
    let manifest = json!({
        "modules": [
            { "name": "Lib", "units": [{ "file": "lib.sable", "decls": [
                { "struct": { "name": "Settings", "members": [{ "var": { "name": "enabled", "type": "Bool" } }] } }
            ] }] },
            { "name": "App", "units": [{ "file": "main.sable", "kind": "main" }] }
        ],
        "externals": ["Settings"]
    });
    let (code, report) = run_json(&manifest, &[]);

    assert_eq!(code, EXIT_SUCCESS, "{report}");
    assert_eq!(report["stats"]["externalsProcessed"], 1);
}

#[test]
fn test_unknown_unit_is_an_error() {
    let project_manifest = parse_manifest(&app(json!([])).to_string()).expect("manifest should parse");
    let project = project_manifest.build().expect("manifest should build");

    let err = select_unit(&project, Some("missing.sable")).expect_err("unknown unit");
    assert!(err.to_string().contains("no unit named 'missing.sable'"));

    let library_only = parse_manifest(
        &json!({ "modules": [{ "name": "App", "units": [{ "file": "lib.sable" }] }] }).to_string(),
    )
    .expect("manifest should parse")
    .build()
    .expect("manifest should build");
    assert!(select_unit(&library_only, None).is_err());
}

#[test]
fn test_check_project_reports_partial_start() {
    let manifest = parse_manifest(
        &app(json!([
            { "code": [{ "expr": { "ref": "nowhere" } }] },
            { "code": [{ "expr": { "int": "1" } }] }
        ]))
        .to_string(),
    )
    .expect("manifest should parse");
    let mut project = manifest.build().expect("manifest should build");
    let args = CliArgs::try_parse_from(["sable", "--start", "1", "app.json"]).expect("args should parse");

    let report = check_project(&mut project, &args).expect("check should run");

    assert!(!report.has_errors(), "{:?}", report.diagnostics);
}

#[test]
fn test_missing_manifest_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("absent.json");
    let args = CliArgs::try_parse_from(["sable".into(), path.display().to_string()]).expect("args should parse");

    let err = run(&args, &mut Vec::new()).expect_err("missing manifest");
    assert!(err.to_string().contains("failed to read manifest"));
}
