//! Declaration arena and syntax for the sable compiler front end.
//!
//! - `context` - `AstContext`, the owner of every declaration, module and unit
//! - `decl` - declaration kinds and shared attributes
//! - `types` - type representations as written and resolved semantic types
//! - `body` - expressions, statements, patterns
//! - `walker` - selective visitor over declarations, patterns, statements and types
//! - `loader` - the module-loader / lazy-resolver seam

pub mod body;
pub mod context;
pub mod decl;
pub mod loader;
pub mod types;
pub mod walker;

pub use body::{Body, Expr, ExprKind, MagicIdentifierKind, Pattern, Stmt};
pub use context::{AstContext, Module, ModuleId, SourceUnit, UnitId, UnitKind, UnitStage};
pub use decl::{
    AccessorKind, Accessibility, Decl, DeclFlags, DeclId, DeclKind, EnumCase, EnumData,
    ExtensionData, ExtensionRef, ExtensionState, FunctionData, FunctionKind, ImportData,
    NominalData, PatternBindingData, PatternBindingEntry, TopLevelCodeData, TypeAliasData, VarData,
};
pub use loader::{LazyResolver, ModuleLoader, QueuedModuleLoader};
pub use types::{GenericParam, GenericParamList, GenericParamListId, Type, TypeComponent, TypeRepr};
pub use walker::{AstVisitor, WalkAction, walk_decl, walk_pattern, walk_stmt, walk_type_repr, walk_unit};

#[cfg(test)]
#[path = "../tests/context_tests.rs"]
mod context_tests;
#[cfg(test)]
#[path = "../tests/walker_tests.rs"]
mod walker_tests;
