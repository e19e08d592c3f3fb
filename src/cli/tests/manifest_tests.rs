use super::manifest::{DEFAULT_STDLIB_NAME, Manifest, load_manifest, parse_manifest, parse_type};
use sable_ast::{AstContext, DeclFlags, DeclKind, ExprKind, FunctionKind, Stmt, TypeRepr, UnitKind};
use sable_checker::KnownCapability;
use sable_common::Span;
use serde_json::json;

fn manifest(value: serde_json::Value) -> Manifest {
    parse_manifest(&value.to_string()).expect("manifest should parse")
}

fn app(decls: serde_json::Value) -> Manifest {
    manifest(json!({
        "modules": [{
            "name": "App",
            "units": [{ "file": "main.sable", "kind": "main", "decls": decls }]
        }]
    }))
}

// =============================================================================
// Modules and the standard library
// =============================================================================

#[test]
fn test_builds_prelude_when_no_stdlib_is_declared() {
    let project = app(json!([])).build().expect("manifest should build");

    let stdlib = project.ast.module(project.stdlib);
    assert_eq!(project.ast.text(stdlib.name), DEFAULT_STDLIB_NAME);
    assert_eq!(project.ast.stdlib, Some(project.stdlib));
    let core = project.ast.unit(stdlib.units[0]);
    assert_eq!(core.decls.len(), KnownCapability::ALL.len() + 1);
    assert!(
        core.decls
            .iter()
            .any(|&decl| project.ast.name_of(decl) == "Bool")
    );
}

#[test]
fn test_uses_declared_core_module() {
    let project = manifest(json!({
        "modules": [
            { "name": "Core", "units": [{ "file": "core.sable", "decls": [
                { "struct": { "name": "Bool" } }
            ] }] },
            { "name": "App", "units": [{ "file": "main.sable", "kind": "main" }] }
        ]
    }))
    .build()
    .expect("manifest should build");

    let core = project.ast.module(project.stdlib);
    assert_eq!(project.ast.text(core.name), "Core");
    assert_eq!(project.ast.unit(core.units[0]).decls.len(), 1);
}

#[test]
fn test_named_stdlib_must_exist() {
    let err = manifest(json!({ "stdlib": "Std", "modules": [] }))
        .build()
        .expect_err("missing stdlib should fail");
    assert!(err.to_string().contains("stdlib module 'Std' is not declared"));
}

#[test]
fn test_rejects_duplicate_modules_and_unknown_imports() {
    let duplicate = manifest(json!({
        "modules": [{ "name": "App" }, { "name": "App" }]
    }));
    assert!(duplicate.build().is_err());

    let unknown = manifest(json!({
        "modules": [{ "name": "App", "units": [{ "file": "main.sable", "imports": ["Nowhere"] }] }]
    }));
    let err = unknown.build().expect_err("unknown import should fail");
    assert!(err.to_string().contains("unknown module 'Nowhere'"));
}

#[test]
fn test_resolves_imports_and_reexports() {
    let project = manifest(json!({
        "modules": [
            { "name": "Base", "units": [{ "file": "base.sable" }] },
            { "name": "Geometry", "reexports": ["Base"], "units": [{ "file": "geometry.sable" }] },
            { "name": "App", "units": [{ "file": "main.sable", "kind": "main", "imports": ["Geometry"] }] }
        ]
    }))
    .build()
    .expect("manifest should build");

    let unit = project.default_unit().expect("main unit");
    let visible: Vec<&str> = project
        .ast
        .visible_modules(unit)
        .into_iter()
        .map(|module| project.ast.text(project.ast.module(module).name))
        .collect();
    assert_eq!(visible, vec!["App", "Core", "Geometry", "Base"]);
    assert_eq!(project.find_unit("base.sable").map(|u| project.ast.unit(u).kind), Some(UnitKind::Library));
    assert!(project.find_unit("missing.sable").is_none());
}

// =============================================================================
// Declarations
// =============================================================================

#[test]
fn test_builds_members_accessors_and_attributes() {
    let project = app(json!([
        { "class": { "name": "Widget", "access": "public", "bridged": true, "members": [
            { "var": { "name": "size", "type": "Bool", "access": "private", "accessors": ["get", "set"] } },
            { "func": { "name": "draw", "final": true, "dynamic": true, "body": [] } },
            { "init": { "params": [{ "name": "size", "type": "Bool" }], "body": [] } }
        ] } }
    ]))
    .build()
    .expect("manifest should build");
    let ast = &project.ast;
    let unit = project.default_unit().expect("main unit");
    let widget = ast.unit(unit).decls[0];

    assert_eq!(ast.decl(widget).declared_access, Some(sable_ast::Accessibility::Public));
    assert!(ast.decl(widget).flags.contains(DeclFlags::BRIDGED));
    assert!(ast.unit(unit).first_bridged_attr.is_some());

    let members = ast.decl(widget).kind.members();
    let kinds: Vec<&str> = members.iter().map(|&m| ast.decl(m).kind.name()).collect();
    assert_eq!(kinds, vec!["var", "pattern binding", "func", "init"]);

    let DeclKind::Variable(size) = &ast.decl(members[0]).kind else {
        panic!("expected a variable");
    };
    assert_eq!(size.accessors.len(), 2);
    assert!(size.annotation.is_some());

    let draw = ast.decl(members[2]);
    assert!(draw.flags.contains(DeclFlags::FINAL | DeclFlags::DYNAMIC));
    assert_eq!(draw.kind.function().map(|f| f.kind), Some(FunctionKind::Method));

    let init = ast.decl(members[3]).kind.function().expect("constructor");
    assert_eq!(init.params.len(), 1);
}

#[test]
fn test_records_overrides_and_externals() {
    let project = manifest(json!({
        "modules": [
            { "name": "Lib", "units": [{ "file": "lib.sable", "decls": [
                { "struct": { "name": "Settings" } }
            ] }] },
            { "name": "App", "units": [{ "file": "main.sable", "kind": "main", "decls": [
                { "class": { "name": "Widget", "members": [{ "func": { "name": "draw", "body": [] } }] } },
                { "class": { "name": "Button", "members": [
                    { "func": { "name": "draw", "overrides": "Widget.draw", "body": [] } }
                ] } }
            ] }] }
        ],
        "externals": ["Settings"]
    }))
    .build()
    .expect("manifest should build");
    let ast = &project.ast;
    let unit = project.default_unit().expect("main unit");
    let base = ast.decl(ast.unit(unit).decls[0]).kind.members()[0];
    let derived = ast.decl(ast.unit(unit).decls[1]).kind.members()[0];

    assert!(ast.decl(base).is_overridden());
    assert_eq!(ast.decl(derived).overridden, Some(base));
    assert_eq!(ast.external_definitions.len(), 1);
    assert_eq!(ast.name_of(ast.external_definitions[0]), "Settings");
}

#[test]
fn test_unknown_override_target_is_an_error() {
    let err = app(json!([
        { "class": { "name": "Button", "members": [
            { "func": { "name": "draw", "overrides": "Widget.draw" } }
        ] } }
    ]))
    .build()
    .expect_err("unknown override should fail");
    assert!(format!("{err:#}").contains("Widget.draw"));
}

#[test]
fn test_builds_extension_paths() {
    let project = app(json!([
        { "struct": { "name": "Box", "generics": ["T"] } },
        { "extension": { "path": [{ "name": "Box", "generics": ["U"] }], "members": [
            { "func": { "name": "map", "body": [] } }
        ] } }
    ]))
    .build()
    .expect("manifest should build");
    let ast = &project.ast;
    let unit = project.default_unit().expect("main unit");
    let ext = ast.decl(ast.unit(unit).decls[1]).kind.extension().expect("extension");

    assert_eq!(ext.refs.len(), 1);
    let params = ext.refs[0].generic_params.expect("written generic list");
    assert_eq!(ast.generic_params(params).len(), 1);
    assert_eq!(ext.members.len(), 1);
}

#[test]
fn test_top_level_variables_are_reached_through_their_binding() {
    let project = app(json!([{ "var": { "name": "count", "init": { "int": "0" } } }]))
        .build()
        .expect("manifest should build");
    let ast = &project.ast;
    let unit = project.default_unit().expect("main unit");

    let decls = &ast.unit(unit).decls;
    assert_eq!(decls.len(), 1);
    let DeclKind::PatternBinding(binding) = &ast.decl(decls[0]).kind else {
        panic!("expected a pattern binding");
    };
    assert_eq!(binding.entries[0].pattern.bound_vars().len(), 1);
    assert!(matches!(
        binding.entries[0].init.as_ref().map(|e| &e.kind),
        Some(ExprKind::IntegerLiteral(_))
    ));
}

#[test]
fn test_bodies_parent_locals_and_closures() {
    let project = app(json!([
        { "func": { "name": "run", "body": [
            { "let": { "name": "flag", "init": { "bool": true } } },
            { "block": [{ "func": { "name": "helper", "body": [] } }] },
            { "expr": { "closure": [{ "return": null }] } }
        ] } }
    ]))
    .build()
    .expect("manifest should build");
    let ast = &project.ast;
    let unit = project.default_unit().expect("main unit");
    let run = ast.unit(unit).decls[0];
    let body = ast.decl(run).kind.function().and_then(|f| f.body.as_ref()).expect("body");

    let [Stmt::Decl(binding), Stmt::Brace(inner), Stmt::Expr(closure)] = body.stmts.as_slice() else {
        panic!("unexpected body shape");
    };
    assert_eq!(ast.decl(*binding).parent, Some(run));
    let [Stmt::Decl(helper)] = inner.as_slice() else {
        panic!("unexpected block shape");
    };
    assert_eq!(ast.decl(*helper).parent, Some(run));
    let ExprKind::Closure(closure) = closure.kind else {
        panic!("expected a closure");
    };
    assert_eq!(ast.decl(closure).parent, Some(run));
    assert_eq!(ast.decl(closure).kind.function().map(|f| f.kind), Some(FunctionKind::Closure));
}

#[test]
fn test_top_level_code_is_only_allowed_in_units() {
    let err = app(json!([
        { "struct": { "name": "Point", "members": [{ "code": [] }] } }
    ]))
    .build()
    .expect_err("nested top-level code should fail");
    assert!(format!("{err:#}").contains("top-level code"));
}

#[test]
fn test_rejects_unknown_declaration_forms() {
    assert!(parse_manifest(r#"{ "modules": [{ "name": "App", "units": [{ "file": "a", "decls": [{ "macro": {} }] }] }] }"#).is_err());
}

// =============================================================================
// Type syntax
// =============================================================================

#[test]
fn test_parses_dotted_generic_types() {
    let mut ast = AstContext::new();
    let ty = parse_type(&mut ast, "Dictionary<Key, Value>.Index", Span::INVALID).expect("type should parse");

    let TypeRepr::Ident(components) = ty else {
        panic!("expected an identifier type");
    };
    assert_eq!(components.len(), 2);
    assert_eq!(ast.text(components[0].name), "Dictionary");
    assert_eq!(components[0].generic_args.len(), 2);
    assert_eq!(ast.text(components[1].name), "Index");
}

#[test]
fn test_parses_tuple_and_function_types() {
    let mut ast = AstContext::new();
    assert!(matches!(
        parse_type(&mut ast, "(Bool, Bool)", Span::INVALID),
        Ok(TypeRepr::Tuple(elems, _)) if elems.len() == 2
    ));
    assert!(matches!(
        parse_type(&mut ast, "(Bool) -> ()", Span::INVALID),
        Ok(TypeRepr::Function { params, .. }) if params.len() == 1
    ));
}

#[test]
fn test_rejects_malformed_types() {
    let mut ast = AstContext::new();
    for text in ["Bool<", "Bool Bool", "", "A.", "(A", "A - B", "A?"] {
        assert!(parse_type(&mut ast, text, Span::INVALID).is_err(), "{text:?} should not parse");
    }
}

// =============================================================================
// Loading from disk
// =============================================================================

#[test]
fn test_loads_manifest_from_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("app.json");
    std::fs::write(&path, r#"{ "modules": [{ "name": "App" }] }"#).expect("write manifest");

    let loaded = load_manifest(&path).expect("manifest should load");
    assert_eq!(loaded.modules.len(), 1);

    let missing = load_manifest(&dir.path().join("missing.json")).expect_err("missing file");
    assert!(missing.to_string().contains("failed to read manifest"));
}

#[test]
fn test_reports_invalid_json_with_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").expect("write manifest");

    let err = load_manifest(&path).expect_err("invalid json");
    assert!(err.to_string().contains("invalid manifest"));
}
