//! Resolving written types to semantic types.

use crate::services::{LookupResult, LookupScope};
use crate::state::TypeCheckingSession;
use sable_ast::{DeclId, DeclKind, Type, TypeComponent, TypeRepr};
use sable_common::limits::MAX_ALIAS_RESOLUTION_DEPTH;
use sable_common::{Atom, Diagnostic, diagnostic_codes};
use tracing::trace;

/// Outcome of resolving one component of a dotted type path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComponentResolution {
    Type(Type),
    /// Found, but the declaration is a value.
    NotAType(DeclId),
    Missing,
}

impl TypeCheckingSession<'_> {
    /// Resolve `repr` as seen from `scope`, diagnosing failures. Failure
    /// yields `Type::Error`.
    pub fn resolve_type_repr(&mut self, repr: &TypeRepr, scope: LookupScope) -> Type {
        self.resolve_type_repr_at_depth(repr, scope, 0)
    }

    fn resolve_type_repr_at_depth(&mut self, repr: &TypeRepr, scope: LookupScope, depth: usize) -> Type {
        match repr {
            TypeRepr::Ident(components) => self.resolve_ident(components, scope, depth),
            TypeRepr::Tuple(elems, _) => Type::Tuple(
                elems
                    .iter()
                    .map(|e| self.resolve_type_repr_at_depth(e, scope, depth))
                    .collect(),
            ),
            TypeRepr::Function { params, result, .. } => Type::Function {
                params: params
                    .iter()
                    .map(|p| self.resolve_type_repr_at_depth(p, scope, depth))
                    .collect(),
                result: Box::new(self.resolve_type_repr_at_depth(result, scope, depth)),
            },
        }
    }

    fn resolve_ident(&mut self, components: &[TypeComponent], scope: LookupScope, depth: usize) -> Type {
        let mut base: Option<Type> = None;
        for component in components {
            let ty = match self.resolve_path_component(base.as_ref(), component.name, scope, depth) {
                ComponentResolution::Type(ty) => ty,
                ComponentResolution::NotAType(_) => {
                    let name = self.ctx.ast.text(component.name).to_string();
                    self.error_in_scope(scope, component, diagnostic_codes::NOT_A_TYPE, &name);
                    return Type::Error;
                }
                ComponentResolution::Missing => {
                    // An unknown name inside an extension may be one of the
                    // extended type's generic parameters, which needs the
                    // extension's generic environment.
                    if base.is_none()
                        && let Some(ext) = self.enclosing_extension(scope)
                    {
                        self.extension_generic_environment(ext);
                        if self.ctx.ast.decl(ext).is_invalid() {
                            return Type::Error;
                        }
                    }
                    let name = self.ctx.ast.text(component.name).to_string();
                    self.error_in_scope(scope, component, diagnostic_codes::CANNOT_FIND_TYPE_IN_SCOPE, &name);
                    return Type::Error;
                }
            };
            if ty.is_error() {
                return Type::Error;
            }
            let ty = if component.generic_args.is_empty() {
                ty
            } else {
                let args: Vec<Type> = component
                    .generic_args
                    .iter()
                    .map(|arg| self.resolve_type_repr_at_depth(arg, scope, depth))
                    .collect();
                match ty {
                    Type::UnboundGeneric(decl) => Type::BoundGeneric { decl, args },
                    other => other,
                }
            };
            base = Some(ty);
        }
        base.unwrap_or(Type::Error)
    }

    fn enclosing_extension(&self, scope: LookupScope) -> Option<DeclId> {
        let mut current = scope.decl;
        while let Some(id) = current {
            let node = self.ctx.ast.decl(id);
            if matches!(node.kind, DeclKind::Extension(_)) {
                return Some(id);
            }
            current = node.parent;
        }
        None
    }

    fn error_in_scope(&mut self, scope: LookupScope, component: &TypeComponent, code: u32, name: &str) {
        match scope.decl {
            Some(decl) => self.error_at(decl, component.span, code, &[name]),
            None => {
                let file = self.ctx.ast.unit(scope.unit).file_name.clone();
                self.push_diagnostic(Diagnostic::from_code(file, component.span, code, &[name]));
            }
        }
    }

    /// Resolve one path component: unqualified from `scope` for the first
    /// component, as a member of `base` for later ones. Type aliases are
    /// looked through.
    pub fn resolve_path_component(
        &mut self,
        base: Option<&Type>,
        name: Atom,
        scope: LookupScope,
        depth: usize,
    ) -> ComponentResolution {
        let results = match base {
            None => self.lookup_unqualified(scope, name),
            Some(base) => self.lookup_member(base, name),
        };
        trace!(name = self.ctx.ast.text(name), found = results.len(), "resolve_path_component");

        // Prefer a type when a name has several meanings.
        let mut value = None;
        for result in results {
            match result {
                LookupResult::GenericParam(param) => {
                    return ComponentResolution::Type(Type::GenericParam(param));
                }
                LookupResult::Module(module) => return ComponentResolution::Type(Type::Module(module)),
                LookupResult::Decl(decl) => {
                    if let Some(ty) = self.declared_type_at_depth(decl, depth) {
                        return ComponentResolution::Type(ty);
                    }
                    value.get_or_insert(decl);
                }
            }
        }
        value.map_or(ComponentResolution::Missing, ComponentResolution::NotAType)
    }

    /// The type a type declaration declares; aliases resolve to their
    /// underlying type.
    fn declared_type_at_depth(&mut self, decl: DeclId, depth: usize) -> Option<Type> {
        let underlying = match &self.ctx.ast.decl(decl).kind {
            DeclKind::TypeAlias(alias) => alias.underlying.clone(),
            _ => return Type::declared(self.ctx.ast, decl),
        };
        if depth >= MAX_ALIAS_RESOLUTION_DEPTH || self.ctx.ast.decl(decl).is_invalid() {
            return Some(Type::Error);
        }
        let scope = LookupScope::around(self.ctx.ast, decl);
        Some(self.resolve_type_repr_at_depth(&underlying, scope, depth + 1))
    }
}
