//! Post-check consistency checks for a unit.
//!
//! Violations are bugs in the checker, not in user code; the driver stops
//! on them in debug builds and logs them otherwise.

use sable_ast::{AstContext, DeclFlags, DeclId, DeclKind, ExtensionState, Type, UnitId, UnitStage};

/// Every broken invariant found in the declarations of `unit`.
#[must_use]
pub fn verify_unit(ast: &AstContext, unit: UnitId) -> Vec<String> {
    let checked = ast.unit(unit).stage == UnitStage::TypeChecked;
    let mut problems = Vec::new();

    for id in ast.decl_ids() {
        let decl = ast.decl(id);
        if decl.unit != unit {
            continue;
        }
        let name = ast.name_of(id);

        if decl.flags.contains(DeclFlags::FINAL_INFERRED) && !decl.is_final() {
            problems.push(format!("`{name}` has inferred finality but is not final"));
        }

        match &decl.kind {
            DeclKind::Extension(ext) => match (ext.state, &ext.extended_type) {
                (ExtensionState::Bound, Some(ty)) if !ty.is_error() => {
                    let registered = ty.any_nominal().is_some_and(|nominal| {
                        ast.decl(nominal)
                            .kind
                            .nominal()
                            .is_some_and(|n| n.extensions.contains(&id))
                    });
                    if !registered {
                        problems.push(format!("bound extension #{} is not registered with its type", id.0));
                    }
                }
                (ExtensionState::Invalid, Some(Type::Error)) => {}
                (ExtensionState::Unbound, None) if !checked => {}
                (state, ty) => {
                    problems.push(format!("extension #{} is {state:?} with extended type {ty:?}", id.0));
                }
            },
            kind if checked => {
                if let Some(f) = kind.function()
                    && f.body.is_some()
                    && !decl.flags.contains(DeclFlags::BODY_CHECKED)
                    && !has_invalid_ancestor(ast, id)
                {
                    problems.push(format!("body of `{name}` was never checked"));
                }
            }
            _ => {}
        }
    }
    problems
}

fn has_invalid_ancestor(ast: &AstContext, decl: DeclId) -> bool {
    let mut current = Some(decl);
    while let Some(id) = current {
        if ast.decl(id).is_invalid() {
            return true;
        }
        current = ast.decl(id).parent;
    }
    false
}
