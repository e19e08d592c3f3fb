//! Reference name binding and lexical lookup.

use crate::services::{LookupResult, LookupScope, NameBinder, NameLookup};
use rustc_hash::FxHashSet;
use sable_ast::{AstContext, Body, DeclId, DeclKind, Stmt, Type, UnitId, UnitStage};
use sable_common::limits::MAX_SCOPE_DEPTH;
use sable_common::{Atom, Diagnostic, DiagnosticSink, diagnostic_codes};
use tracing::{debug, trace};

/// Resolves `import` declarations to modules.
pub struct StandardNameBinder;

impl NameBinder for StandardNameBinder {
    fn perform_name_binding(
        &self,
        ast: &mut AstContext,
        unit: UnitId,
        start: usize,
        diagnostics: &mut DiagnosticSink,
    ) {
        let decls: Vec<DeclId> = ast.unit(unit).decls.iter().skip(start).copied().collect();
        for decl in decls {
            let DeclKind::Import(import) = &ast.decl(decl).kind else {
                continue;
            };
            let module_name = import.module_name;
            match ast.module_named(module_name) {
                Some(module) => {
                    debug!(module = ast.text(module_name), "import resolved");
                    if let DeclKind::Import(import) = &mut ast.decl_mut(decl).kind {
                        import.module = Some(module);
                    }
                    ast.add_import(unit, module);
                }
                None => {
                    let span = ast.decl(decl).span;
                    diagnostics.push(Diagnostic::from_code(
                        ast.unit(unit).file_name.clone(),
                        span,
                        diagnostic_codes::NO_SUCH_MODULE,
                        &[ast.text(module_name)],
                    ));
                    ast.decl_mut(decl).set_invalid();
                }
            }
        }
        let source = ast.unit_mut(unit);
        source.stage = source.stage.max(UnitStage::NameBound);
    }
}

/// Lexical lookup over the declaration arena.
///
/// Unqualified lookup walks the parent chain (members, extension members,
/// generic parameters, parameters and body locals), then the unit, the
/// unit's module, every visible module and finally module names. The first
/// level with a match wins.
pub struct ScopeLookup;

impl NameLookup for ScopeLookup {
    fn lookup_unqualified(&self, ast: &AstContext, scope: LookupScope, name: Atom) -> Vec<LookupResult> {
        let mut results = Vec::new();
        let mut current = scope.decl;
        let mut depth = 0;
        while let Some(id) = current {
            depth += 1;
            if depth > MAX_SCOPE_DEPTH {
                break;
            }
            lookup_in_decl(ast, id, name, &mut results);
            if !results.is_empty() {
                trace!(name = ast.text(name), scope = id.0, "found in lexical scope");
                return results;
            }
            current = ast.decl(id).parent;
        }

        let unit = ast.unit(scope.unit);
        collect_top_level(ast, &unit.decls, name, &mut results);
        if !results.is_empty() {
            return results;
        }

        let own = unit.module;
        for &other in &ast.module(own).units {
            if other != scope.unit {
                collect_top_level(ast, &ast.unit(other).decls, name, &mut results);
            }
        }
        if !results.is_empty() {
            return results;
        }

        for module in ast.visible_modules(scope.unit) {
            if module == own {
                continue;
            }
            for &other in &ast.module(module).units {
                collect_top_level(ast, &ast.unit(other).decls, name, &mut results);
            }
        }
        if !results.is_empty() {
            return results;
        }

        if let Some(module) = ast.module_named(name) {
            results.push(LookupResult::Module(module));
        }
        results
    }

    fn lookup_member(&self, ast: &AstContext, base: &Type, name: Atom) -> Vec<LookupResult> {
        let mut results = Vec::new();
        match base {
            Type::Nominal(decl)
            | Type::UnboundGeneric(decl)
            | Type::BoundGeneric { decl, .. }
            | Type::Protocol(decl) => collect_type_members(ast, *decl, name, &mut results),
            Type::Module(module) => {
                for &unit in &ast.module(*module).units {
                    collect_top_level(ast, &ast.unit(unit).decls, name, &mut results);
                }
            }
            Type::Metatype(inner) => return self.lookup_member(ast, inner, name),
            Type::GenericParam(_) | Type::Tuple(_) | Type::Function { .. } | Type::Error => {}
        }
        results
    }
}

fn is_named(ast: &AstContext, decl: DeclId, name: Atom) -> bool {
    let node = ast.decl(decl);
    node.name == name && node.kind.is_value_decl()
}

fn lookup_in_decl(ast: &AstContext, id: DeclId, name: Atom, results: &mut Vec<LookupResult>) {
    let node = ast.decl(id);
    for list in ast.generic_chain(node.kind.generic_params()) {
        if ast.generic_params(list).params.iter().any(|p| p.name == name) {
            results.push(LookupResult::GenericParam(name));
            return;
        }
    }

    match &node.kind {
        DeclKind::Struct(_) | DeclKind::Class(_) | DeclKind::Enum(_) | DeclKind::Protocol(_) => {
            collect_type_members(ast, id, name, results);
        }
        DeclKind::Extension(ext) => {
            collect_matching(ast, &ext.members, name, results);
            if results.is_empty()
                && let Some(nominal) = ext.extended_type.as_ref().and_then(Type::any_nominal)
            {
                collect_type_members(ast, nominal, name, results);
            }
        }
        DeclKind::Function(f) | DeclKind::Constructor(f) | DeclKind::Destructor(f) => {
            collect_matching(ast, &f.params, name, results);
            if let Some(body) = &f.body {
                collect_matching(ast, &body_locals(ast, body), name, results);
            }
        }
        DeclKind::TopLevelCode(code) => {
            collect_matching(ast, &body_locals(ast, &code.body), name, results);
        }
        DeclKind::TypeAlias(_)
        | DeclKind::Variable(_)
        | DeclKind::PatternBinding(_)
        | DeclKind::Import(_) => {}
    }
}

fn collect_matching(ast: &AstContext, decls: &[DeclId], name: Atom, results: &mut Vec<LookupResult>) {
    results.extend(
        decls
            .iter()
            .copied()
            .filter(|&d| is_named(ast, d, name))
            .map(LookupResult::Decl),
    );
}

/// Members of a nominal type and of every extension bound to it.
fn collect_type_members(ast: &AstContext, decl: DeclId, name: Atom, results: &mut Vec<LookupResult>) {
    let Some(nominal) = ast.decl(decl).kind.nominal() else {
        return;
    };
    collect_matching(ast, &nominal.members, name, results);
    for &ext in &nominal.extensions {
        collect_matching(ast, ast.decl(ext).kind.members(), name, results);
    }
}

/// Top-level declarations plus bindings made by top-level code.
fn collect_top_level(ast: &AstContext, decls: &[DeclId], name: Atom, results: &mut Vec<LookupResult>) {
    for &decl in decls {
        match &ast.decl(decl).kind {
            DeclKind::TopLevelCode(code) => {
                collect_matching(ast, &body_locals(ast, &code.body), name, results);
            }
            DeclKind::PatternBinding(binding) => {
                let vars: Vec<DeclId> = binding
                    .entries
                    .iter()
                    .flat_map(|e| e.pattern.bound_vars())
                    .collect();
                collect_matching(ast, &vars, name, results);
            }
            _ if is_named(ast, decl, name) => results.push(LookupResult::Decl(decl)),
            _ => {}
        }
    }
}

/// Declarations introduced directly by a body, including those inside
/// nested braces but not inside nested functions.
#[must_use]
pub fn body_locals(ast: &AstContext, body: &Body) -> Vec<DeclId> {
    let mut out = Vec::new();
    let mut seen = FxHashSet::default();
    collect_locals(ast, &body.stmts, &mut out, &mut seen);
    out
}

fn collect_locals(ast: &AstContext, stmts: &[Stmt], out: &mut Vec<DeclId>, seen: &mut FxHashSet<DeclId>) {
    for stmt in stmts {
        match stmt {
            Stmt::Decl(decl) => {
                if !seen.insert(*decl) {
                    continue;
                }
                match &ast.decl(*decl).kind {
                    DeclKind::PatternBinding(binding) => {
                        out.extend(binding.entries.iter().flat_map(|e| e.pattern.bound_vars()));
                    }
                    _ => out.push(*decl),
                }
            }
            Stmt::Brace(inner) => collect_locals(ast, inner, out, seen),
            Stmt::Expr(_) | Stmt::Return(..) => {}
        }
    }
}
