use super::*;
use crate::name_lookup::{ScopeLookup, StandardNameBinder, body_locals};
use crate::test_fixtures::TestContext;
use sable_ast::{DeclKind, ImportData, NominalData, Stmt, Type, UnitKind, UnitStage};
use sable_common::{DiagnosticSink, diagnostic_codes};

fn unqualified(tc: &mut TestContext, scope: LookupScope, name: &str) -> Vec<LookupResult> {
    let name = tc.ast.atom(name);
    ScopeLookup.lookup_unqualified(&tc.ast, scope, name)
}

fn member(tc: &mut TestContext, base: &Type, name: &str) -> Vec<LookupResult> {
    let name = tc.ast.atom(name);
    ScopeLookup.lookup_member(&tc.ast, base, name)
}

#[test]
fn test_extension_members_are_found_through_the_type() {
    let mut tc = TestContext::new();
    let target = tc.add_struct("Point");
    let ext = tc.add_extension(&[("Point", None)]);
    let extra = tc.add_method(ext, "scaled");
    let base = Type::Nominal(target);

    assert!(member(&mut tc, &base, "scaled").is_empty());

    tc.check();

    assert_eq!(member(&mut tc, &base, "scaled"), vec![LookupResult::Decl(extra)]);
}

#[test]
fn test_extension_generic_parameters_are_in_scope() {
    let mut tc = TestContext::new();
    tc.add_generic_struct("Box", &["T"]);
    let ext = tc.add_extension(&[("Box", Some(&["U"]))]);
    let method = tc.add_method(ext, "map");
    tc.check();

    let scope = LookupScope::inside(&tc.ast, method);
    let u = tc.ast.atom("U");
    assert_eq!(unqualified(&mut tc, scope, "U"), vec![LookupResult::GenericParam(u)]);
}

#[test]
fn test_innermost_declaration_wins() {
    let mut tc = TestContext::new();
    let outer = tc.add_struct("value");
    let f = tc.add_function("f", Vec::new());
    let (local, stmt) = tc.add_local_var(f, "value", None);
    tc.set_body(f, vec![stmt]);

    let inside = LookupScope::inside(&tc.ast, f);
    let at_unit = LookupScope::unit(tc.unit);

    assert_eq!(unqualified(&mut tc, inside, "value"), vec![LookupResult::Decl(local)]);
    assert_eq!(unqualified(&mut tc, at_unit, "value"), vec![LookupResult::Decl(outer)]);
}

#[test]
fn test_body_locals_include_nested_braces() {
    let mut tc = TestContext::new();
    let f = tc.add_function("f", Vec::new());
    let (a, a_stmt) = tc.add_local_var(f, "a", None);
    let (b, b_stmt) = tc.add_local_var(f, "b", None);
    let helper = tc.add_local_function(f, "helper", Vec::new());
    let (_, hidden) = tc.add_local_var(helper, "hidden", None);
    tc.set_body(helper, vec![hidden]);
    tc.set_body(f, vec![a_stmt, Stmt::Brace(vec![b_stmt]), Stmt::Decl(helper)]);

    let body = tc.function(f).body.clone().unwrap();
    assert_eq!(body_locals(&tc.ast, &body), vec![a, b, helper]);
}

#[test]
fn test_module_members_and_module_names() {
    let mut tc = TestContext::new();
    let base = Type::Module(tc.stdlib);

    let found = member(&mut tc, &base, "Bool");
    assert_eq!(found.len(), 1);
    assert!(matches!(
        tc.ast.decl(found[0].decl().unwrap()).kind,
        DeclKind::Struct(_)
    ));

    let scope = LookupScope::unit(tc.unit);
    assert_eq!(unqualified(&mut tc, scope, "Core"), vec![LookupResult::Module(tc.stdlib)]);
    assert!(unqualified(&mut tc, scope, "Nowhere").is_empty());
}

#[test]
fn test_standard_library_is_visible_without_import() {
    let mut tc = TestContext::new();
    let scope = LookupScope::unit(tc.unit);

    let found = unqualified(&mut tc, scope, "Equatable");

    assert_eq!(found, vec![LookupResult::Decl(tc.capability(KnownCapability::Equatable))]);
}

#[test]
fn test_name_binding_resolves_imports() {
    let mut tc = TestContext::new();
    let lib = tc.ast.add_module("Geometry");
    let lib_unit = tc.ast.add_unit(lib, "geometry.sable", UnitKind::Library);
    let span = tc.span();
    let thing = tc
        .ast
        .add_top_level(lib_unit, "Shape", span, DeclKind::Struct(NominalData::default()));
    let module_name = tc.ast.atom("Geometry");
    let import = tc.ast.add_top_level(
        tc.unit,
        "",
        span,
        DeclKind::Import(ImportData {
            module_name,
            module: None,
        }),
    );
    let scope = LookupScope::unit(tc.unit);
    assert!(unqualified(&mut tc, scope, "Shape").is_empty());

    let mut sink = DiagnosticSink::collecting();
    StandardNameBinder.perform_name_binding(&mut tc.ast, tc.unit, 0, &mut sink);

    assert!(sink.diagnostics().is_empty());
    assert_eq!(tc.ast.unit(tc.unit).stage, UnitStage::NameBound);
    assert!(matches!(
        &tc.ast.decl(import).kind,
        DeclKind::Import(ImportData { module: Some(m), .. }) if *m == lib
    ));
    assert_eq!(unqualified(&mut tc, scope, "Shape"), vec![LookupResult::Decl(thing)]);
}

#[test]
fn test_name_binding_skips_declarations_before_start() {
    let mut tc = TestContext::new();
    let module_name = tc.ast.atom("Missing");
    for _ in 0..2 {
        let span = tc.span();
        tc.ast.add_top_level(
            tc.unit,
            "",
            span,
            DeclKind::Import(ImportData {
                module_name,
                module: None,
            }),
        );
    }

    let mut sink = DiagnosticSink::collecting();
    StandardNameBinder.perform_name_binding(&mut tc.ast, tc.unit, 1, &mut sink);

    let codes: Vec<u32> = sink.diagnostics().iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![diagnostic_codes::NO_SUCH_MODULE]);
}
