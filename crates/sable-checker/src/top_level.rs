//! Contextualization of closures in top-level code, and result variables
//! for interactive units.

use crate::state::TypeCheckingSession;
use sable_ast::{
    AstContext, AstVisitor, DeclFlags, DeclId, DeclKind, Expr, FunctionKind, Pattern, PatternBindingData,
    PatternBindingEntry, Stmt, Type, VarData, WalkAction, walk_decl,
};
use tracing::{debug, trace};

/// State carried across incremental checks of one script-mode unit, so a
/// closure keeps its discriminator when later statements are checked.
#[derive(Debug, Default)]
pub struct TopLevelContext {
    pub next_closure_discriminator: u32,
    /// Index of the next `$R<n>` result variable of a REPL unit.
    pub next_repl_result: u32,
}

impl TopLevelContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Give every closure that appears directly in the top-level code among
    /// `decls` a unit-wide discriminator. Closures already numbered keep
    /// theirs; closures nested in another closure belong to that closure.
    pub fn contextualize(&mut self, ast: &mut AstContext, decls: &[DeclId]) {
        for &decl in decls {
            if matches!(ast.decl(decl).kind, DeclKind::TopLevelCode(_)) {
                walk_decl(self, ast, decl);
            }
        }
    }
}

impl AstVisitor for TopLevelContext {
    fn walk_to_decl_pre(&mut self, ast: &mut AstContext, decl: DeclId) -> WalkAction {
        let Some(function) = ast.decl_mut(decl).kind.function_mut() else {
            return WalkAction::Continue;
        };
        if function.kind != FunctionKind::Closure {
            // Named local functions number their own closures.
            return WalkAction::SkipChildren;
        }
        if function.discriminator.is_none() {
            function.discriminator = Some(self.next_closure_discriminator);
            trace!(closure = decl.0, discriminator = self.next_closure_discriminator, "closure contextualized");
            self.next_closure_discriminator += 1;
        }
        WalkAction::SkipChildren
    }
}

impl TypeCheckingSession<'_> {
    /// Bind the value of every expression statement in the top-level code
    /// among `decls` to a fresh `$R<n>` variable, so later input can refer to
    /// it. Statements without a value keep their place.
    pub fn process_repl_top_level(&mut self, top_level: &mut TopLevelContext, decls: &[DeclId]) {
        for &code in decls {
            let DeclKind::TopLevelCode(data) = &self.ctx.ast.decl(code).kind else {
                continue;
            };
            let mut stmts = data.body.stmts.clone();
            let mut bound = 0;
            for stmt in &mut stmts {
                let Stmt::Expr(expr) = stmt else {
                    continue;
                };
                let Some(ty) = expr.ty.clone().filter(has_result_value) else {
                    continue;
                };
                *stmt = Stmt::Decl(self.bind_repl_result(top_level, code, expr.clone(), ty));
                bound += 1;
            }
            if bound == 0 {
                continue;
            }
            debug!(code = code.0, bound, "repl results bound");
            if let DeclKind::TopLevelCode(data) = &mut self.ctx.ast.decl_mut(code).kind {
                data.body.stmts = stmts;
            }
        }
    }

    /// `let $R<n> = value` inside `code`. The value is already checked, so
    /// the binding is recorded as checked with the value's type.
    fn bind_repl_result(&mut self, top_level: &mut TopLevelContext, code: DeclId, value: Expr, ty: Type) -> DeclId {
        let unit = self.ctx.ast.decl(code).unit;
        let span = value.span;
        let name = format!("$R{}", top_level.next_repl_result);
        top_level.next_repl_result += 1;

        let var = self
            .ctx
            .ast
            .alloc_decl(unit, Some(code), &name, span, DeclKind::Variable(VarData::default()));
        let binding = self.ctx.ast.alloc_decl(
            unit,
            Some(code),
            "",
            span,
            DeclKind::PatternBinding(PatternBindingData {
                entries: vec![PatternBindingEntry {
                    pattern: Pattern::Named(var),
                    init: Some(value),
                }],
            }),
        );
        trace!(var = var.0, name = %name, "repl result");
        self.ctx.var_types.insert(var, ty);
        self.validate_decl(var);
        self.ctx.ast.decl_mut(binding).flags.insert(DeclFlags::BODY_CHECKED);
        binding
    }
}

fn has_result_value(ty: &Type) -> bool {
    match ty {
        Type::Error | Type::Module(_) => false,
        Type::Tuple(elems) => !elems.is_empty(),
        _ => true,
    }
}
