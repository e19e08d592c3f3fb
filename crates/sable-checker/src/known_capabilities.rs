//! Compiler-recognized capabilities and the syntactic gate over them.

use rustc_hash::FxHashMap;
use sable_ast::{AstContext, DeclId, DeclKind, ModuleId, TypeRepr};
use tracing::trace;

macro_rules! known_capabilities {
    ($($variant:ident => $name:literal,)*) => {
        /// Capabilities the compiler treats specially.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum KnownCapability {
            $($variant,)*
        }

        impl KnownCapability {
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];

            /// Name of the protocol that provides this capability.
            #[must_use]
            pub const fn source_name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            #[must_use]
            pub fn from_source_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

known_capabilities! {
    Sequence => "Sequence",
    Iterator => "Iterator",
    RawRepresentable => "RawRepresentable",
    Equatable => "Equatable",
    Hashable => "Hashable",
    Comparable => "Comparable",
    Bridgeable => "Bridgeable",
    ArrayLiteral => "ArrayLiteralConvertible",
    BooleanLiteral => "BooleanLiteralConvertible",
    CharacterLiteral => "CharacterLiteralConvertible",
    DictionaryLiteral => "DictionaryLiteralConvertible",
    ExtendedGraphemeClusterLiteral => "ExtendedGraphemeClusterLiteralConvertible",
    FloatLiteral => "FloatLiteralConvertible",
    IntegerLiteral => "IntegerLiteralConvertible",
    NilLiteral => "NilLiteralConvertible",
    StringLiteral => "StringLiteralConvertible",
    StringInterpolation => "StringInterpolationConvertible",
}

/// Could `decl` conform to a known capability, judging only by the text of
/// its inheritance clause?
///
/// Runs before name lookup is complete, so it cannot resolve anything. Only
/// the last component of each identifier type is inspected, and only when
/// that component has no generic arguments. False negatives are tolerated.
#[must_use]
pub fn may_conform_to_known_capability(ast: &AstContext, decl: DeclId) -> bool {
    let result = ast.decl(decl).inherited.iter().any(|repr| names_known_capability(ast, repr));
    trace!(decl = decl.0, result, "may_conform_to_known_capability");
    result
}

fn names_known_capability(ast: &AstContext, repr: &TypeRepr) -> bool {
    let Some(last) = repr.last_component() else {
        return false;
    };
    last.generic_args.is_empty() && KnownCapability::from_source_name(ast.text(last.name)).is_some()
}

/// Protocol declarations providing each known capability in this session.
#[derive(Clone, Debug, Default)]
pub struct CapabilityRegistry {
    protocols: FxHashMap<KnownCapability, DeclId>,
}

impl CapabilityRegistry {
    pub fn record(&mut self, kind: KnownCapability, protocol: DeclId) {
        self.protocols.entry(kind).or_insert(protocol);
    }

    #[must_use]
    pub fn get(&self, kind: KnownCapability) -> Option<DeclId> {
        self.protocols.get(&kind).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    /// Register every capability protocol declared at the top level of
    /// `module`.
    pub fn record_from_module(&mut self, ast: &AstContext, module: ModuleId) {
        for &unit in &ast.module(module).units {
            for &decl in &ast.unit(unit).decls {
                let node = ast.decl(decl);
                if !matches!(node.kind, DeclKind::Protocol(_)) {
                    continue;
                }
                if let Some(kind) = KnownCapability::from_source_name(ast.text(node.name)) {
                    self.record(kind, decl);
                }
            }
        }
    }
}
