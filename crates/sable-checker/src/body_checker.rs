//! Reference body checker and capture analysis.
//!
//! This is not a type inferencer. It walks statements, gives literals the
//! protocol their capability names, resolves declaration references, queues
//! nested functions and closures for the fixpoint loop, and records which
//! outer locals each function captures.

use crate::services::{BodyChecker, LookupResult, LookupScope};
use crate::state::TypeCheckingSession;
use rustc_hash::FxHashSet;
use sable_ast::{AstContext, DeclFlags, DeclId, DeclKind, Expr, ExprKind, Stmt, Type};
use sable_common::{Atom, Span, diagnostic_codes};
use smallvec::SmallVec;
use tracing::{trace, warn};

pub struct BasicBodyChecker;

impl BodyChecker for BasicBodyChecker {
    fn check_function_body(&self, session: &mut TypeCheckingSession<'_>, func: DeclId, end: Option<u32>) {
        let node = session.ctx.ast.decl(func);
        if node.is_invalid() || node.flags.contains(DeclFlags::BODY_CHECKED) {
            return;
        }
        let Some(mut body) = node.kind.function().and_then(|f| f.body.clone()) else {
            return;
        };
        session.validate_decl(func);
        trace!(func = func.0, name = session.ctx.ast.name_of(func), ?end, "check_function_body");

        let scope = LookupScope::inside(session.ctx.ast, func);
        self.check_stmts(session, scope, &mut body.stmts, end);

        let decl = session.ctx.ast.decl_mut(func);
        if let Some(f) = decl.kind.function_mut() {
            f.body = Some(body);
        }
        if end.is_none() {
            decl.flags.insert(DeclFlags::BODY_CHECKED);
            session.ctx.stats.bodies_checked += 1;
        }
    }

    fn check_top_level_code(&self, session: &mut TypeCheckingSession<'_>, code: DeclId) {
        let node = session.ctx.ast.decl(code);
        if node.flags.contains(DeclFlags::BODY_CHECKED) {
            return;
        }
        let DeclKind::TopLevelCode(data) = &node.kind else {
            return;
        };
        let mut body = data.body.clone();
        let scope = LookupScope::inside(session.ctx.ast, code);
        self.check_stmts(session, scope, &mut body.stmts, None);

        let decl = session.ctx.ast.decl_mut(code);
        if let DeclKind::TopLevelCode(data) = &mut decl.kind {
            data.body = body;
        }
        decl.flags.insert(DeclFlags::BODY_CHECKED);
    }

    fn check_expr(&self, session: &mut TypeCheckingSession<'_>, scope: LookupScope, expr: &mut Expr) -> Type {
        for child in expr.children_mut() {
            self.check_expr(session, scope, child);
        }

        let ty = match &expr.kind {
            ExprKind::DeclRef(name) => {
                let results = session.lookup_unqualified(scope, *name);
                match results.first() {
                    Some(LookupResult::Decl(decl)) => value_type_of(session, *decl),
                    Some(LookupResult::GenericParam(param)) => {
                        Type::Metatype(Box::new(Type::GenericParam(*param)))
                    }
                    Some(LookupResult::Module(module)) => Type::Module(*module),
                    None => {
                        let name = session.ctx.ast.text(*name).to_string();
                        session.error_in_unit(expr.span, diagnostic_codes::CANNOT_FIND_IN_SCOPE, &[&name]);
                        Type::Error
                    }
                }
            }
            ExprKind::Call { callee, .. } => match &callee.ty {
                Some(Type::Function { result, .. }) => (**result).clone(),
                Some(Type::Metatype(instance)) => (**instance).clone(),
                _ => Type::Error,
            },
            ExprKind::Closure(decl) => {
                let decl = *decl;
                session.validate_decl(decl);
                session.ctx.queues.define_function(decl);
                value_type_of(session, decl)
            }
            ExprKind::Error => Type::Error,
            _ => session
                .literal_protocol(expr)
                .map_or(Type::Error, Type::Protocol),
        };
        expr.ty = Some(ty.clone());
        ty
    }

    fn compute_captures(&self, session: &mut TypeCheckingSession<'_>, func: DeclId) {
        let ast = &*session.ctx.ast;
        let Some(f) = ast.decl(func).kind.function() else {
            return;
        };
        if f.captures_computed {
            return;
        }
        let scope = LookupScope::inside(ast, func);
        let mut captures: Vec<DeclId> = Vec::new();
        let mut seen = FxHashSet::default();

        let mut refs = Vec::new();
        let mut nested = Vec::new();
        if let Some(body) = &f.body {
            collect_refs(ast, &body.stmts, &mut refs, &mut nested);
        }

        for name in refs {
            let results = session.lookup_unqualified(scope, name);
            if let Some(decl) = results.first().and_then(LookupResult::decl)
                && is_capture(ast, decl, func)
                && seen.insert(decl)
            {
                captures.push(decl);
            }
        }

        // Nested functions were finalized first; whatever they capture from
        // outside `func` is captured by `func` too.
        for inner in nested {
            let Some(g) = ast.decl(inner).kind.function() else {
                continue;
            };
            if !g.captures_computed {
                warn!(func = func.0, inner = inner.0, "nested captures not computed");
                continue;
            }
            for &decl in &g.captures {
                if is_capture(ast, decl, func) && seen.insert(decl) {
                    captures.push(decl);
                }
            }
        }

        trace!(func = func.0, captures = captures.len(), "compute_captures");
        if let Some(f) = session.ctx.ast.decl_mut(func).kind.function_mut() {
            f.captures = captures;
            f.captures_computed = true;
        }
    }
}

impl BasicBodyChecker {
    fn check_stmts(&self, session: &mut TypeCheckingSession<'_>, scope: LookupScope, stmts: &mut [Stmt], end: Option<u32>) {
        for stmt in stmts {
            if let Some(end) = end
                && !stmt_start(session.ctx.ast, stmt).starts_before(end)
            {
                break;
            }
            match stmt {
                Stmt::Expr(expr) | Stmt::Return(Some(expr), _) => {
                    self.check_expr(session, scope, expr);
                }
                Stmt::Return(None, _) => {}
                Stmt::Decl(decl) => self.check_local_decl(session, *decl),
                Stmt::Brace(inner) => self.check_stmts(session, scope, inner, end),
            }
        }
    }

    fn check_local_decl(&self, session: &mut TypeCheckingSession<'_>, decl: DeclId) {
        match &session.ctx.ast.decl(decl).kind {
            DeclKind::Function(_) => {
                session.validate_decl(decl);
                session.ctx.queues.define_function(decl);
            }
            DeclKind::PatternBinding(_) => session.check_pattern_binding(decl),
            DeclKind::Struct(_)
            | DeclKind::Class(_)
            | DeclKind::Enum(_)
            | DeclKind::Protocol(_)
            | DeclKind::TypeAlias(_) => {
                session.type_check_decl(decl, true);
                session.type_check_decl(decl, false);
            }
            _ => session.validate_decl(decl),
        }
    }
}

fn stmt_start(ast: &AstContext, stmt: &Stmt) -> Span {
    match stmt {
        Stmt::Decl(decl) => ast.decl(*decl).span,
        _ => stmt.span(),
    }
}

/// The type of a reference to `decl` used as a value.
fn value_type_of(session: &mut TypeCheckingSession<'_>, decl: DeclId) -> Type {
    session.validate_decl(decl);
    let ast = &*session.ctx.ast;
    match &ast.decl(decl).kind {
        DeclKind::Variable(_) => session.ctx.var_types.get(&decl).cloned().unwrap_or(Type::Error),
        DeclKind::Function(f) | DeclKind::Constructor(f) | DeclKind::Destructor(f) => Type::Function {
            params: f
                .params
                .iter()
                .map(|p| session.ctx.var_types.get(p).cloned().unwrap_or(Type::Error))
                .collect(),
            result: Box::new(Type::Tuple(Vec::new())),
        },
        _ => Type::declared(ast, decl).map_or(Type::Error, |ty| Type::Metatype(Box::new(ty))),
    }
}

/// A reference from `func` to `decl` is a capture when `decl` is a local of
/// some function that lexically encloses `func`.
fn is_capture(ast: &AstContext, decl: DeclId, func: DeclId) -> bool {
    if !matches!(ast.decl(decl).kind, DeclKind::Variable(_) | DeclKind::Function(_)) {
        return false;
    }
    match ast.enclosing_function(decl) {
        Some(owner) => owner != func && ast.is_nested_in(func, owner),
        None => false,
    }
}

/// Names referenced directly by `stmts` (local initializers included), and
/// functions declared directly in them. Bodies of nested functions are not
/// entered.
fn collect_refs(ast: &AstContext, stmts: &[Stmt], refs: &mut Vec<Atom>, nested: &mut Vec<DeclId>) {
    for stmt in stmts {
        match stmt {
            Stmt::Expr(expr) | Stmt::Return(Some(expr), _) => collect_expr_refs(expr, refs, nested),
            Stmt::Decl(decl) => match &ast.decl(*decl).kind {
                DeclKind::PatternBinding(binding) => {
                    for init in binding.entries.iter().filter_map(|e| e.init.as_ref()) {
                        collect_expr_refs(init, refs, nested);
                    }
                }
                _ => nested.push(*decl),
            },
            Stmt::Brace(inner) => collect_refs(ast, inner, refs, nested),
            Stmt::Return(None, _) => {}
        }
    }
}

fn collect_expr_refs(expr: &Expr, refs: &mut Vec<Atom>, nested: &mut Vec<DeclId>) {
    let mut stack: SmallVec<[&Expr; 8]> = SmallVec::new();
    stack.push(expr);
    while let Some(expr) = stack.pop() {
        match &expr.kind {
            ExprKind::DeclRef(name) => refs.push(*name),
            ExprKind::Closure(decl) => nested.push(*decl),
            _ => {}
        }
        stack.extend(expr.children());
    }
}
