//! Finality inference.
//!
//! After a module is fully checked, class members that nothing can override
//! are marked `final` so later stages may dispatch to them directly. The pass
//! only ever adds `final` (and drops an inferred `dynamic` it replaces); it
//! reports nothing and cannot fail.
//!
//! Eligibility depends on declaration attributes alone, so the walk enters
//! declarations and patterns but never statements or type representations.

use sable_ast::{
    Accessibility, AstContext, AstVisitor, DeclFlags, DeclId, DeclKind, ModuleId, Pattern, Stmt,
    TypeRepr, UnitId, WalkAction, walk_unit,
};
use sable_common::limits::MAX_OVERRIDE_CHAIN_DEPTH;
use tracing::{Level, debug, span, trace, warn};

/// Run finality inference over `primary_unit`, or over every unit of
/// `module` when the whole module is checked together. Returns the number of
/// declarations made final.
pub fn perform_whole_module_checks(
    ast: &mut AstContext,
    module: ModuleId,
    primary_unit: UnitId,
    whole_module: bool,
) -> usize {
    let _span = span!(Level::INFO, "perform_whole_module_checks", whole_module).entered();
    let units = if whole_module {
        ast.module(module).units.clone()
    } else {
        vec![primary_unit]
    };

    let mut pass = FinalityInference::new(whole_module);
    for unit in units {
        walk_unit(&mut pass, ast, unit);
    }
    debug!(finalized = pass.finalized, "finality inference done");
    pass.finalized
}

/// Visitor that marks non-overridable class members final.
pub struct FinalityInference {
    whole_module: bool,
    finalized: usize,
}

impl FinalityInference {
    #[must_use]
    pub const fn new(whole_module: bool) -> Self {
        Self {
            whole_module,
            finalized: 0,
        }
    }

    fn add_final(&mut self, ast: &mut AstContext, decl: DeclId, remove_dynamic: bool) {
        let node = ast.decl_mut(decl);
        node.flags.insert(DeclFlags::FINAL | DeclFlags::FINAL_INFERRED);
        if remove_dynamic {
            node.flags.remove(DeclFlags::DYNAMIC | DeclFlags::DYNAMIC_IMPLICIT);
        }
        self.finalized += 1;
        trace!(decl = decl.0, name = ast.name_of(decl), remove_dynamic, "inferred final");
    }
}

impl AstVisitor for FinalityInference {
    fn walk_to_decl_pre(&mut self, ast: &mut AstContext, decl: DeclId) -> WalkAction {
        let node = ast.decl(decl);
        if !node.kind.is_value_decl() {
            return WalkAction::Continue;
        }
        if matches!(node.kind, DeclKind::Constructor(_) | DeclKind::Destructor(_)) {
            return WalkAction::Continue;
        }
        if node.is_final() || node.is_invalid() {
            return WalkAction::SkipChildren;
        }
        let Some(access) = node.access else {
            return WalkAction::SkipChildren;
        };

        // Subclasses of a bridged class may live outside the module.
        if matches!(node.kind, DeclKind::Class(_)) && node.flags.contains(DeclFlags::BRIDGED) {
            return WalkAction::SkipChildren;
        }

        let mut remove_dynamic = false;
        if node.flags.contains(DeclFlags::DYNAMIC) {
            if !is_inferred_dynamic(ast, Some(decl)) {
                return WalkAction::SkipChildren;
            }
            remove_dynamic = true;
        }

        match access {
            Accessibility::Public => return WalkAction::Continue,
            Accessibility::Internal if !self.whole_module => return WalkAction::Continue,
            Accessibility::Internal | Accessibility::Private => {}
        }

        if node.is_overridden() || member_class(ast, decl).is_none() {
            return WalkAction::Continue;
        }
        match &node.kind {
            DeclKind::Variable(_) => self.add_final(ast, decl, remove_dynamic),
            DeclKind::Function(f) => {
                // A final setter on overridable storage is unsound.
                if f.is_setter()
                    && let Some(storage) = f.accessor_storage()
                    && !ast.decl(storage).is_final()
                {
                    return WalkAction::Continue;
                }
                self.add_final(ast, decl, remove_dynamic);
            }
            _ => {}
        }
        WalkAction::Continue
    }

    fn walk_to_pattern_pre(&mut self, _ast: &mut AstContext, _pattern: &Pattern) -> WalkAction {
        WalkAction::Continue
    }

    fn walk_to_stmt_pre(&mut self, _ast: &mut AstContext, _stmt: &Stmt) -> WalkAction {
        WalkAction::SkipChildren
    }

    fn walk_to_type_repr_pre(&mut self, _ast: &mut AstContext, _repr: &TypeRepr) -> WalkAction {
        WalkAction::SkipChildren
    }
}

/// The class `decl` is a member of. Accessors belong to their storage's
/// class.
fn member_class(ast: &AstContext, decl: DeclId) -> Option<DeclId> {
    match ast.decl(decl).kind.function().and_then(|f| f.accessor_storage()) {
        Some(storage) => ast.enclosing_class(storage),
        None => ast.enclosing_class(decl),
    }
}

/// Was the `dynamic` attribute on `decl` inferred rather than written?
///
/// Accessors inherit the answer from their storage. An implicit `dynamic`
/// comes from the overridden declaration, so the override chain is followed
/// until a written attribute (not inferred) or a declaration without one.
#[must_use]
pub fn is_inferred_dynamic(ast: &AstContext, decl: Option<DeclId>) -> bool {
    let mut current = decl;
    for _ in 0..MAX_OVERRIDE_CHAIN_DEPTH {
        let Some(id) = current else {
            return true;
        };
        let node = ast.decl(id);
        if let Some(storage) = node.kind.function().and_then(|f| f.accessor_storage())
            && !is_inferred_dynamic(ast, Some(storage))
        {
            return false;
        }
        if !node.flags.contains(DeclFlags::DYNAMIC) {
            return true;
        }
        if !node.flags.contains(DeclFlags::DYNAMIC_IMPLICIT) {
            return false;
        }
        current = node.overridden;
    }
    warn!(decl = ?decl, "override chain too deep; treating dynamic as written");
    false
}
