//! Type representations (as written) and resolved semantic types.

use crate::context::{AstContext, ModuleId};
use crate::decl::{DeclId, DeclKind};
use sable_common::{Atom, Span};
use smallvec::SmallVec;

// =============================================================================
// Generic parameter lists
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericParamListId(pub u32);

#[derive(Clone, Debug)]
pub struct GenericParam {
    pub name: Atom,
    pub span: Span,
}

/// `<T, U>` as written on a type, function or extension path component.
#[derive(Clone, Debug)]
pub struct GenericParamList {
    pub params: SmallVec<[GenericParam; 2]>,
    /// List of the enclosing path segment; name resolution inside an
    /// extension walks this chain outward.
    pub outer: Option<GenericParamListId>,
    pub span: Span,
}

impl GenericParamList {
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

// =============================================================================
// Type representations
// =============================================================================

/// One component of a dotted identifier type, e.g. `Dictionary<K, V>`.
#[derive(Clone, Debug)]
pub struct TypeComponent {
    pub name: Atom,
    pub span: Span,
    pub generic_args: Vec<TypeRepr>,
}

/// A type as written in source.
#[derive(Clone, Debug)]
pub enum TypeRepr {
    /// `A.B<C>.D`
    Ident(SmallVec<[TypeComponent; 2]>),
    Tuple(Vec<TypeRepr>, Span),
    Function {
        params: Vec<TypeRepr>,
        result: Box<TypeRepr>,
        span: Span,
    },
}

impl TypeRepr {
    /// A single non-generic identifier.
    #[must_use]
    pub fn simple(name: Atom, span: Span) -> Self {
        let mut components = SmallVec::new();
        components.push(TypeComponent {
            name,
            span,
            generic_args: Vec::new(),
        });
        Self::Ident(components)
    }

    /// A dotted path of non-generic identifiers.
    #[must_use]
    pub fn path(names: &[(Atom, Span)]) -> Self {
        Self::Ident(
            names
                .iter()
                .map(|&(name, span)| TypeComponent {
                    name,
                    span,
                    generic_args: Vec::new(),
                })
                .collect(),
        )
    }

    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Ident(components) => match (components.first(), components.last()) {
                (Some(first), Some(last)) => first.span.to(last.span),
                _ => Span::INVALID,
            },
            Self::Tuple(_, span) => *span,
            Self::Function { span, .. } => *span,
        }
    }

    #[must_use]
    pub fn last_component(&self) -> Option<&TypeComponent> {
        match self {
            Self::Ident(components) => components.last(),
            _ => None,
        }
    }

    /// Nested type representations, in source order.
    #[must_use]
    pub fn children(&self) -> Vec<&TypeRepr> {
        match self {
            Self::Ident(components) => components
                .iter()
                .flat_map(|c| c.generic_args.iter())
                .collect(),
            Self::Tuple(elems, _) => elems.iter().collect(),
            Self::Function { params, result, .. } => {
                params.iter().chain(std::iter::once(&**result)).collect()
            }
        }
    }
}

// =============================================================================
// Semantic types
// =============================================================================

/// A resolved type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// A non-generic struct, class or enum.
    Nominal(DeclId),
    /// A generic nominal referenced without arguments.
    UnboundGeneric(DeclId),
    BoundGeneric {
        decl: DeclId,
        args: Vec<Type>,
    },
    Protocol(DeclId),
    GenericParam(Atom),
    Tuple(Vec<Type>),
    Function {
        params: Vec<Type>,
        result: Box<Type>,
    },
    Metatype(Box<Type>),
    Module(ModuleId),
    /// Sentinel for failed resolution. Consumers must not re-derive it.
    Error,
}

impl Type {
    /// The declared type of a type declaration.
    #[must_use]
    pub fn declared(ast: &AstContext, decl: DeclId) -> Option<Self> {
        match &ast.decl(decl).kind {
            DeclKind::Protocol(_) => Some(Self::Protocol(decl)),
            kind @ (DeclKind::Struct(_) | DeclKind::Class(_) | DeclKind::Enum(_)) => {
                if kind.generic_params().is_some() {
                    Some(Self::UnboundGeneric(decl))
                } else {
                    Some(Self::Nominal(decl))
                }
            }
            _ => None,
        }
    }

    /// The struct, class or enum this type names, bound or not.
    #[must_use]
    pub fn any_nominal(&self) -> Option<DeclId> {
        match self {
            Self::Nominal(decl) | Self::UnboundGeneric(decl) | Self::BoundGeneric { decl, .. } => {
                Some(*decl)
            }
            _ => None,
        }
    }

    /// Types an extension may attach to.
    #[must_use]
    pub const fn is_extendable(&self) -> bool {
        matches!(self, Self::Nominal(_) | Self::UnboundGeneric(_))
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Human-readable rendering for diagnostics.
    #[must_use]
    pub fn display(&self, ast: &AstContext) -> String {
        match self {
            Self::Nominal(decl) | Self::UnboundGeneric(decl) | Self::Protocol(decl) => {
                ast.name_of(*decl).to_string()
            }
            Self::BoundGeneric { decl, args } => {
                let args: Vec<String> = args.iter().map(|a| a.display(ast)).collect();
                format!("{}<{}>", ast.name_of(*decl), args.join(", "))
            }
            Self::GenericParam(name) => ast.interner.resolve(*name).to_string(),
            Self::Tuple(elems) => {
                let elems: Vec<String> = elems.iter().map(|e| e.display(ast)).collect();
                format!("({})", elems.join(", "))
            }
            Self::Function { params, result } => {
                let params: Vec<String> = params.iter().map(|p| p.display(ast)).collect();
                format!("({}) -> {}", params.join(", "), result.display(ast))
            }
            Self::Metatype(inner) => format!("{}.Type", inner.display(ast)),
            Self::Module(module) => ast.interner.resolve(ast.module(*module).name).to_string(),
            Self::Error => "<<error type>>".to_string(),
        }
    }
}
