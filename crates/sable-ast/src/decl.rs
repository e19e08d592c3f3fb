//! Declarations stored in the arena.
//!
//! A declaration is a closed tagged union (`DeclKind`) plus the attributes
//! every kind shares. Cross references between declarations (parent scope,
//! overridden member, extension target) are `DeclId`s, never owning
//! pointers, so cycles through overrides and extensions need no special
//! handling.

use crate::body::{Body, Expr, Pattern};
use crate::context::{ModuleId, UnitId};
use crate::types::{GenericParamListId, Type, TypeRepr};
use bitflags::bitflags;
use sable_common::{Atom, Span};
use smallvec::SmallVec;

/// Stable index of a declaration in the `AstContext` arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

impl DeclId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Accessibility {
    Private,
    Internal,
    Public,
}

bitflags! {
    /// Mutable per-declaration attribute bits.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DeclFlags: u32 {
        /// Cannot be overridden.
        const FINAL = 1 << 0;
        /// `final` was added by finality inference rather than written.
        const FINAL_INFERRED = 1 << 1;
        /// Dispatched dynamically.
        const DYNAMIC = 1 << 2;
        /// The `dynamic` attribute was inferred rather than written.
        const DYNAMIC_IMPLICIT = 1 << 3;
        /// Permanently failed checking; downstream consumers treat it as opaque.
        const INVALID = 1 << 4;
        /// Synthesized by the checker.
        const IMPLICIT = 1 << 5;
        /// Some other declaration overrides this one.
        const OVERRIDDEN = 1 << 6;
        /// Signature has been computed.
        const VALIDATED = 1 << 7;
        /// Carries the bridging attribute; for classes this also means the
        /// class may be subclassed from outside the module.
        const BRIDGED = 1 << 8;
        /// Body (or pattern-binding initializer) has been checked.
        const BODY_CHECKED = 1 << 9;
    }
}

// =============================================================================
// Per-kind payloads
// =============================================================================

/// Shared payload of struct, class, enum and protocol declarations.
#[derive(Clone, Debug, Default)]
pub struct NominalData {
    pub generic_params: Option<GenericParamListId>,
    pub members: Vec<DeclId>,
    /// Extensions bound to this type. Non-owning: the extensions live in
    /// their own units.
    pub extensions: Vec<DeclId>,
    /// Protocols this type conforms to implicitly (filled by synthesis).
    pub implicit_conformances: Vec<DeclId>,
}

#[derive(Clone, Debug)]
pub struct EnumCase {
    pub name: Atom,
    pub has_payload: bool,
}

#[derive(Clone, Debug, Default)]
pub struct EnumData {
    pub nominal: NominalData,
    pub cases: Vec<EnumCase>,
    pub raw_type: Option<TypeRepr>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ExtensionState {
    #[default]
    Unbound,
    Bound,
    Invalid,
}

/// One dotted component of an extension's target path, e.g. `Outer<T>` in
/// `extension Outer<T>.Inner`.
#[derive(Clone, Debug)]
pub struct ExtensionRef {
    pub name: Atom,
    pub span: Span,
    pub generic_params: Option<GenericParamListId>,
    /// Set once the path has been resolved.
    pub bound: Option<Type>,
}

#[derive(Clone, Debug, Default)]
pub struct ExtensionData {
    pub refs: SmallVec<[ExtensionRef; 2]>,
    pub state: ExtensionState,
    /// `Type::Error` once binding has failed.
    pub extended_type: Option<Type>,
    /// Innermost generic parameter list of the chained path; the extension
    /// body resolves generic names through its `outer` links.
    pub generic_params: Option<GenericParamListId>,
    pub members: Vec<DeclId>,
}

#[derive(Clone, Debug)]
pub struct TypeAliasData {
    pub underlying: TypeRepr,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccessorKind {
    Getter,
    Setter,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    Free,
    Method,
    Accessor { kind: AccessorKind, storage: DeclId },
    Closure,
}

/// Payload of functions, constructors and destructors.
#[derive(Clone, Debug)]
pub struct FunctionData {
    pub kind: FunctionKind,
    pub generic_params: Option<GenericParamListId>,
    pub params: Vec<DeclId>,
    pub body: Option<Body>,
    /// Declarations this function captures from enclosing scopes, filled by
    /// capture analysis after the body is checked.
    pub captures: Vec<DeclId>,
    pub captures_computed: bool,
    /// Closure discriminator assigned when top-level code is contextualized.
    pub discriminator: Option<u32>,
}

impl FunctionData {
    #[must_use]
    pub fn new(kind: FunctionKind, body: Option<Body>) -> Self {
        Self {
            kind,
            generic_params: None,
            params: Vec::new(),
            body,
            captures: Vec::new(),
            captures_computed: false,
            discriminator: None,
        }
    }

    #[must_use]
    pub const fn is_setter(&self) -> bool {
        matches!(
            self.kind,
            FunctionKind::Accessor {
                kind: AccessorKind::Setter,
                ..
            }
        )
    }

    #[must_use]
    pub const fn accessor_storage(&self) -> Option<DeclId> {
        match self.kind {
            FunctionKind::Accessor { storage, .. } => Some(storage),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct VarData {
    pub annotation: Option<TypeRepr>,
    pub accessors: Vec<DeclId>,
    pub is_parameter: bool,
}

#[derive(Clone, Debug)]
pub struct PatternBindingEntry {
    pub pattern: Pattern,
    pub init: Option<Expr>,
}

#[derive(Clone, Debug, Default)]
pub struct PatternBindingData {
    pub entries: Vec<PatternBindingEntry>,
}

#[derive(Clone, Debug, Default)]
pub struct TopLevelCodeData {
    pub body: Body,
}

/// `import Name`; resolved to a module by name binding.
#[derive(Clone, Debug)]
pub struct ImportData {
    pub module_name: Atom,
    pub module: Option<ModuleId>,
}

/// Closed set of declaration kinds.
#[derive(Clone, Debug)]
pub enum DeclKind {
    Struct(NominalData),
    Class(NominalData),
    Enum(EnumData),
    Protocol(NominalData),
    Extension(ExtensionData),
    TypeAlias(TypeAliasData),
    Function(FunctionData),
    Constructor(FunctionData),
    Destructor(FunctionData),
    Variable(VarData),
    PatternBinding(PatternBindingData),
    TopLevelCode(TopLevelCodeData),
    Import(ImportData),
}

impl DeclKind {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Struct(_) => "struct",
            Self::Class(_) => "class",
            Self::Enum(_) => "enum",
            Self::Protocol(_) => "protocol",
            Self::Extension(_) => "extension",
            Self::TypeAlias(_) => "typealias",
            Self::Function(_) => "func",
            Self::Constructor(_) => "init",
            Self::Destructor(_) => "deinit",
            Self::Variable(_) => "var",
            Self::PatternBinding(_) => "pattern binding",
            Self::TopLevelCode(_) => "top-level code",
            Self::Import(_) => "import",
        }
    }

    /// Struct, class, enum or protocol.
    #[must_use]
    pub fn nominal(&self) -> Option<&NominalData> {
        match self {
            Self::Struct(n) | Self::Class(n) | Self::Protocol(n) => Some(n),
            Self::Enum(e) => Some(&e.nominal),
            _ => None,
        }
    }

    pub fn nominal_mut(&mut self) -> Option<&mut NominalData> {
        match self {
            Self::Struct(n) | Self::Class(n) | Self::Protocol(n) => Some(n),
            Self::Enum(e) => Some(&mut e.nominal),
            _ => None,
        }
    }

    /// A nominal type other than a protocol.
    #[must_use]
    pub const fn is_concrete_nominal(&self) -> bool {
        matches!(self, Self::Struct(_) | Self::Class(_) | Self::Enum(_))
    }

    #[must_use]
    pub const fn is_type_decl(&self) -> bool {
        matches!(
            self,
            Self::Struct(_) | Self::Class(_) | Self::Enum(_) | Self::Protocol(_) | Self::TypeAlias(_)
        )
    }

    /// Function, constructor or destructor.
    #[must_use]
    pub const fn function(&self) -> Option<&FunctionData> {
        match self {
            Self::Function(f) | Self::Constructor(f) | Self::Destructor(f) => Some(f),
            _ => None,
        }
    }

    pub fn function_mut(&mut self) -> Option<&mut FunctionData> {
        match self {
            Self::Function(f) | Self::Constructor(f) | Self::Destructor(f) => Some(f),
            _ => None,
        }
    }

    #[must_use]
    pub const fn extension(&self) -> Option<&ExtensionData> {
        match self {
            Self::Extension(e) => Some(e),
            _ => None,
        }
    }

    pub fn extension_mut(&mut self) -> Option<&mut ExtensionData> {
        match self {
            Self::Extension(e) => Some(e),
            _ => None,
        }
    }

    /// Declarations that carry a name and a type in their context.
    #[must_use]
    pub const fn is_value_decl(&self) -> bool {
        !matches!(
            self,
            Self::Extension(_) | Self::PatternBinding(_) | Self::TopLevelCode(_) | Self::Import(_)
        )
    }

    /// Member declarations of a type or extension.
    #[must_use]
    pub fn members(&self) -> &[DeclId] {
        match self {
            Self::Extension(e) => &e.members,
            _ => self.nominal().map_or(&[], |n| n.members.as_slice()),
        }
    }

    #[must_use]
    pub fn generic_params(&self) -> Option<GenericParamListId> {
        match self {
            Self::Extension(e) => e.generic_params,
            Self::Function(f) | Self::Constructor(f) | Self::Destructor(f) => f.generic_params,
            _ => self.nominal().and_then(|n| n.generic_params),
        }
    }
}

/// One declaration in the arena.
#[derive(Clone, Debug)]
pub struct Decl {
    pub kind: DeclKind,
    pub name: Atom,
    pub span: Span,
    pub unit: UnitId,
    /// Lexical parent (type, extension or function); `None` at top level.
    pub parent: Option<DeclId>,
    /// Accessibility as written.
    pub declared_access: Option<Accessibility>,
    /// Accessibility after signature validation; `None` until resolved.
    pub access: Option<Accessibility>,
    pub flags: DeclFlags,
    /// The declaration this one overrides.
    pub overridden: Option<DeclId>,
    /// Inheritance clause as written.
    pub inherited: Vec<TypeRepr>,
}

impl Decl {
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        self.flags.contains(DeclFlags::INVALID)
    }

    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.flags.contains(DeclFlags::FINAL)
    }

    #[must_use]
    pub const fn is_overridden(&self) -> bool {
        self.flags.contains(DeclFlags::OVERRIDDEN)
    }

    #[must_use]
    pub const fn is_implicit(&self) -> bool {
        self.flags.contains(DeclFlags::IMPLICIT)
    }

    #[must_use]
    pub const fn is_validated(&self) -> bool {
        self.flags.contains(DeclFlags::VALIDATED)
    }

    #[must_use]
    pub const fn has_accessibility(&self) -> bool {
        self.access.is_some()
    }

    pub fn set_invalid(&mut self) {
        self.flags.insert(DeclFlags::INVALID);
    }
}
