//! Selective AST walker.
//!
//! The walker enters four node categories: declarations, patterns, statements
//! and type representations. Each `*_pre` hook decides whether to descend.
//! Visitors receive `&mut AstContext` so they can mutate declaration flags in
//! place; the walker copies a node's child list before descending, which keeps
//! traversal stable when a visitor edits the node it just entered.
//!
//! Variables are never direct children of a type or extension. They are
//! reached through the `Named` leaves of pattern bindings.

use crate::body::{Body, Expr, ExprKind, Pattern, Stmt};
use crate::context::{AstContext, UnitId};
use crate::decl::{DeclId, DeclKind};
use crate::types::TypeRepr;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WalkAction {
    Continue,
    SkipChildren,
}

pub trait AstVisitor {
    fn walk_to_decl_pre(&mut self, _ast: &mut AstContext, _decl: DeclId) -> WalkAction {
        WalkAction::Continue
    }

    fn walk_to_decl_post(&mut self, _ast: &mut AstContext, _decl: DeclId) {}

    fn walk_to_pattern_pre(&mut self, _ast: &mut AstContext, _pattern: &Pattern) -> WalkAction {
        WalkAction::Continue
    }

    fn walk_to_stmt_pre(&mut self, _ast: &mut AstContext, _stmt: &Stmt) -> WalkAction {
        WalkAction::Continue
    }

    fn walk_to_type_repr_pre(&mut self, _ast: &mut AstContext, _repr: &TypeRepr) -> WalkAction {
        WalkAction::Continue
    }
}

/// Walk every top-level declaration of `unit` in source order.
pub fn walk_unit<V: AstVisitor + ?Sized>(visitor: &mut V, ast: &mut AstContext, unit: UnitId) {
    let decls = ast.unit(unit).decls.clone();
    for decl in decls {
        walk_decl(visitor, ast, decl);
    }
}

pub fn walk_decl<V: AstVisitor + ?Sized>(visitor: &mut V, ast: &mut AstContext, decl: DeclId) {
    if visitor.walk_to_decl_pre(ast, decl) == WalkAction::SkipChildren {
        return;
    }

    let node = ast.decl(decl);
    let inherited = node.inherited.clone();
    match node.kind.clone() {
        DeclKind::Struct(data) | DeclKind::Class(data) | DeclKind::Protocol(data) => {
            walk_type_reprs(visitor, ast, &inherited);
            walk_members(visitor, ast, &data.members);
        }
        DeclKind::Enum(data) => {
            walk_type_reprs(visitor, ast, &inherited);
            if let Some(raw) = &data.raw_type {
                walk_type_repr(visitor, ast, raw);
            }
            walk_members(visitor, ast, &data.nominal.members);
        }
        DeclKind::Extension(data) => {
            walk_type_reprs(visitor, ast, &inherited);
            walk_members(visitor, ast, &data.members);
        }
        DeclKind::TypeAlias(data) => walk_type_repr(visitor, ast, &data.underlying),
        DeclKind::Function(f) | DeclKind::Constructor(f) | DeclKind::Destructor(f) => {
            for param in f.params {
                walk_decl(visitor, ast, param);
            }
            if let Some(body) = &f.body {
                walk_body(visitor, ast, body);
            }
        }
        DeclKind::Variable(var) => {
            if let Some(annotation) = &var.annotation {
                walk_type_repr(visitor, ast, annotation);
            }
            for accessor in var.accessors {
                walk_decl(visitor, ast, accessor);
            }
        }
        DeclKind::PatternBinding(binding) => {
            for entry in &binding.entries {
                walk_pattern(visitor, ast, &entry.pattern);
                if let Some(init) = &entry.init {
                    walk_expr_decls(visitor, ast, init);
                }
            }
        }
        DeclKind::TopLevelCode(code) => walk_body(visitor, ast, &code.body),
        DeclKind::Import(_) => {}
    }

    visitor.walk_to_decl_post(ast, decl);
}

fn walk_members<V: AstVisitor + ?Sized>(visitor: &mut V, ast: &mut AstContext, members: &[DeclId]) {
    for &member in members {
        if matches!(ast.decl(member).kind, DeclKind::Variable(_)) {
            continue;
        }
        walk_decl(visitor, ast, member);
    }
}

pub fn walk_pattern<V: AstVisitor + ?Sized>(
    visitor: &mut V,
    ast: &mut AstContext,
    pattern: &Pattern,
) {
    if visitor.walk_to_pattern_pre(ast, pattern) == WalkAction::SkipChildren {
        return;
    }
    match pattern {
        Pattern::Named(var) => walk_decl(visitor, ast, *var),
        Pattern::Tuple(elems) => {
            for elem in elems {
                walk_pattern(visitor, ast, elem);
            }
        }
        Pattern::Typed { sub, annotation } => {
            walk_pattern(visitor, ast, sub);
            walk_type_repr(visitor, ast, annotation);
        }
        Pattern::Any => {}
    }
}

fn walk_body<V: AstVisitor + ?Sized>(visitor: &mut V, ast: &mut AstContext, body: &Body) {
    for stmt in &body.stmts {
        walk_stmt(visitor, ast, stmt);
    }
}

pub fn walk_stmt<V: AstVisitor + ?Sized>(visitor: &mut V, ast: &mut AstContext, stmt: &Stmt) {
    if visitor.walk_to_stmt_pre(ast, stmt) == WalkAction::SkipChildren {
        return;
    }
    match stmt {
        Stmt::Expr(expr) | Stmt::Return(Some(expr), _) => walk_expr_decls(visitor, ast, expr),
        Stmt::Decl(decl) => walk_decl(visitor, ast, *decl),
        Stmt::Return(None, _) => {}
        Stmt::Brace(stmts) => {
            for stmt in stmts {
                walk_stmt(visitor, ast, stmt);
            }
        }
    }
}

/// Expressions are not a walk category, but closures inside them are
/// declarations and are entered.
fn walk_expr_decls<V: AstVisitor + ?Sized>(visitor: &mut V, ast: &mut AstContext, expr: &Expr) {
    if let ExprKind::Closure(decl) = expr.kind {
        walk_decl(visitor, ast, decl);
    }
    for child in expr.children() {
        walk_expr_decls(visitor, ast, child);
    }
}

fn walk_type_reprs<V: AstVisitor + ?Sized>(
    visitor: &mut V,
    ast: &mut AstContext,
    reprs: &[TypeRepr],
) {
    for repr in reprs {
        walk_type_repr(visitor, ast, repr);
    }
}

pub fn walk_type_repr<V: AstVisitor + ?Sized>(
    visitor: &mut V,
    ast: &mut AstContext,
    repr: &TypeRepr,
) {
    if visitor.walk_to_type_repr_pre(ast, repr) == WalkAction::SkipChildren {
        return;
    }
    for child in repr.children() {
        walk_type_repr(visitor, ast, child);
    }
}
