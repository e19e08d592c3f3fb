//! Reference signature validation.

use crate::services::{LookupScope, SignatureValidator};
use crate::state::TypeCheckingSession;
use sable_ast::{Accessibility, DeclId, DeclKind, Type};
use tracing::trace;

/// Resolves accessibility, inheritance clauses and written types.
pub struct DefaultSignatureValidator;

impl SignatureValidator for DefaultSignatureValidator {
    fn validate_signature(&self, session: &mut TypeCheckingSession<'_>, decl: DeclId) {
        let access = resolve_accessibility(session, decl);
        session.ctx.ast.decl_mut(decl).access = Some(access);

        let inherited = session.ctx.ast.decl(decl).inherited.clone();
        if !inherited.is_empty() {
            let scope = LookupScope::inside(session.ctx.ast, decl);
            for repr in &inherited {
                session.resolve_type_repr(repr, scope);
            }
        }

        match session.ctx.ast.decl(decl).kind.clone() {
            DeclKind::TypeAlias(alias) => {
                let scope = LookupScope::around(session.ctx.ast, decl);
                if session.resolve_type_repr(&alias.underlying, scope).is_error() {
                    session.ctx.ast.decl_mut(decl).set_invalid();
                }
            }
            DeclKind::Enum(data) => {
                if let Some(raw) = &data.raw_type {
                    let scope = LookupScope::inside(session.ctx.ast, decl);
                    session.resolve_type_repr(raw, scope);
                }
            }
            DeclKind::Variable(var) => {
                if let Some(annotation) = &var.annotation {
                    let scope = LookupScope::around(session.ctx.ast, decl);
                    let ty = session.resolve_type_repr(annotation, scope);
                    session.ctx.var_types.insert(decl, ty);
                }
            }
            DeclKind::Function(f) | DeclKind::Constructor(f) | DeclKind::Destructor(f) => {
                for param in f.params {
                    session.validate_decl(param);
                }
            }
            DeclKind::Struct(_)
            | DeclKind::Class(_)
            | DeclKind::Protocol(_)
            | DeclKind::Extension(_)
            | DeclKind::PatternBinding(_)
            | DeclKind::TopLevelCode(_)
            | DeclKind::Import(_) => {}
        }
    }
}

/// Written accessibility, or `Internal` capped by the enclosing context
/// when none is written.
/// Accessors share their storage's accessibility; locals are private.
fn resolve_accessibility(session: &mut TypeCheckingSession<'_>, decl: DeclId) -> Accessibility {
    let node = session.ctx.ast.decl(decl);
    let storage = node.kind.function().and_then(|f| f.accessor_storage());
    let declared = node.declared_access;
    let parent = node.parent;

    if let Some(storage) = storage {
        session.validate_decl(storage);
        return session.ctx.ast.decl(storage).access.unwrap_or(Accessibility::Internal);
    }
    let Some(parent) = parent else {
        return declared.unwrap_or(Accessibility::Internal);
    };
    // Written accessibility is kept; only the default is capped.
    if let Some(declared) = declared
        && !is_body_container(&session.ctx.ast.decl(parent).kind)
    {
        return declared;
    }

    let container = match &session.ctx.ast.decl(parent).kind {
        kind if is_body_container(kind) => return Accessibility::Private,
        DeclKind::Extension(ext) => ext.extended_type.as_ref().and_then(Type::any_nominal),
        _ => Some(parent),
    };
    let cap = container.map_or(Accessibility::Internal, |container| {
        session.validate_decl(container);
        session.ctx.ast.decl(container).access.unwrap_or(Accessibility::Internal)
    });
    let access = Accessibility::Internal.min(cap);
    trace!(decl = decl.0, ?access, "accessibility resolved");
    access
}

fn is_body_container(kind: &DeclKind) -> bool {
    matches!(
        kind,
        DeclKind::Function(_) | DeclKind::Constructor(_) | DeclKind::Destructor(_) | DeclKind::TopLevelCode(_)
    )
}

