//! Executable code: expressions, statements, patterns and bodies.
//!
//! Bodies are owned by their function or top-level-code declaration. Nested
//! declarations inside a body (local functions, local bindings) live in the
//! arena and are referenced from `Stmt::Decl` / `ExprKind::Closure`.

use crate::decl::DeclId;
use crate::types::{Type, TypeRepr};
use sable_common::{Atom, Span};

/// `#file`, `#function`, `#line`, `#column`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MagicIdentifierKind {
    File,
    Function,
    Line,
    Column,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    NilLiteral,
    IntegerLiteral(String),
    FloatLiteral(String),
    BooleanLiteral(bool),
    CharacterLiteral(char),
    StringLiteral(String),
    /// Segments alternate between literal text and interpolated expressions.
    InterpolatedStringLiteral(Vec<Expr>),
    MagicIdentifier(MagicIdentifierKind),
    Array(Vec<Expr>),
    Dictionary(Vec<(Expr, Expr)>),
    DeclRef(Atom),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Closure(DeclId),
    Error,
}

#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Filled by the expression checker.
    pub ty: Option<Type>,
}

impl Expr {
    #[must_use]
    pub const fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: None,
        }
    }

    /// Direct sub-expressions, in evaluation order.
    #[must_use]
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::InterpolatedStringLiteral(parts) | ExprKind::Array(parts) => {
                parts.iter().collect()
            }
            ExprKind::Dictionary(entries) => entries.iter().flat_map(|(k, v)| [k, v]).collect(),
            ExprKind::Call { callee, args } => {
                std::iter::once(&**callee).chain(args.iter()).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn children_mut(&mut self) -> Vec<&mut Expr> {
        match &mut self.kind {
            ExprKind::InterpolatedStringLiteral(parts) | ExprKind::Array(parts) => {
                parts.iter_mut().collect()
            }
            ExprKind::Dictionary(entries) => entries
                .iter_mut()
                .flat_map(|(k, v)| [k, v])
                .collect(),
            ExprKind::Call { callee, args } => std::iter::once(&mut **callee)
                .chain(args.iter_mut())
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Stmt {
    Expr(Expr),
    Decl(DeclId),
    Return(Option<Expr>, Span),
    Brace(Vec<Stmt>),
}

impl Stmt {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Expr(expr) => expr.span,
            Self::Decl(_) => Span::INVALID,
            Self::Return(_, span) => *span,
            Self::Brace(stmts) => stmts
                .iter()
                .map(Self::span)
                .fold(Span::INVALID, Span::to),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Body {
    pub stmts: Vec<Stmt>,
}

impl Body {
    #[must_use]
    pub const fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

/// Binding pattern. Variables are reachable only through `Named` patterns.
#[derive(Clone, Debug)]
pub enum Pattern {
    Named(DeclId),
    Tuple(Vec<Pattern>),
    Typed {
        sub: Box<Pattern>,
        annotation: TypeRepr,
    },
    Any,
}

impl Pattern {
    /// Every variable bound by this pattern, left to right.
    #[must_use]
    pub fn bound_vars(&self) -> Vec<DeclId> {
        let mut out = Vec::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars(&self, out: &mut Vec<DeclId>) {
        match self {
            Self::Named(decl) => out.push(*decl),
            Self::Tuple(elems) => elems.iter().for_each(|p| p.collect_vars(out)),
            Self::Typed { sub, .. } => sub.collect_vars(out),
            Self::Any => {}
        }
    }
}
