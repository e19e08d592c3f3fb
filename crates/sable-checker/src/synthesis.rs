//! Reference synthesis of implicit members and conformances.

use crate::known_capabilities::KnownCapability;
use crate::services::MemberSynthesizer;
use crate::state::TypeCheckingSession;
use sable_ast::{AstContext, Body, DeclFlags, DeclId, DeclKind, FunctionData, FunctionKind, TypeRepr, VarData};
use sable_common::Span;
use tracing::debug;

pub struct DefaultSynthesizer;

impl MemberSynthesizer for DefaultSynthesizer {
    /// Structs get a memberwise initializer and classes a parameterless one,
    /// unless the type already declares an initializer.
    fn add_implicit_constructors(&self, session: &mut TypeCheckingSession<'_>, decl: DeclId) {
        let ast = &mut *session.ctx.ast;
        let node = ast.decl(decl);
        let Some(nominal) = node.kind.nominal() else {
            return;
        };
        if has_member_of_kind(ast, decl, |k| matches!(k, DeclKind::Constructor(_))) {
            return;
        }
        let span = node.span;
        let stored: Vec<(String, Option<TypeRepr>, Span)> = if matches!(node.kind, DeclKind::Struct(_)) {
            nominal
                .members
                .iter()
                .filter_map(|&m| match &ast.decl(m).kind {
                    DeclKind::Variable(var) if var.accessors.is_empty() => {
                        Some((ast.name_of(m).to_string(), var.annotation.clone(), ast.decl(m).span))
                    }
                    _ => None,
                })
                .collect()
        } else {
            Vec::new()
        };

        let ctor = ast.add_member(
            decl,
            "init",
            span,
            DeclKind::Constructor(FunctionData::new(FunctionKind::Method, Some(Body::default()))),
        );
        ast.decl_mut(ctor).flags.insert(DeclFlags::IMPLICIT);
        for (name, annotation, span) in stored {
            let param = ast.add_member(
                ctor,
                &name,
                span,
                DeclKind::Variable(VarData {
                    annotation,
                    accessors: Vec::new(),
                    is_parameter: true,
                }),
            );
            ast.decl_mut(param).flags.insert(DeclFlags::IMPLICIT);
        }
        debug!(decl = decl.0, ctor = ctor.0, "implicit constructor");
        session.ctx.queues.add_implicit_function(ctor);
    }

    fn add_implicit_destructor(&self, session: &mut TypeCheckingSession<'_>, decl: DeclId) {
        let ast = &mut *session.ctx.ast;
        if !matches!(ast.decl(decl).kind, DeclKind::Class(_))
            || has_member_of_kind(ast, decl, |k| matches!(k, DeclKind::Destructor(_)))
        {
            return;
        }
        let span = ast.decl(decl).span;
        let dtor = ast.add_member(
            decl,
            "deinit",
            span,
            DeclKind::Destructor(FunctionData::new(FunctionKind::Method, Some(Body::default()))),
        );
        ast.decl_mut(dtor).flags.insert(DeclFlags::IMPLICIT);
        debug!(decl = decl.0, dtor = dtor.0, "implicit destructor");
        session.ctx.queues.add_implicit_function(dtor);
    }

    /// Bridged structs conform to the bridging capability.
    fn add_implicit_struct_conformances(&self, session: &mut TypeCheckingSession<'_>, decl: DeclId) {
        if session.ctx.ast.decl(decl).flags.contains(DeclFlags::BRIDGED) {
            add_conformance(session, decl, KnownCapability::Bridgeable);
        }
    }

    /// Payload-free enums are equatable and hashable; enums with a raw type
    /// are raw-representable.
    fn add_implicit_enum_conformances(&self, session: &mut TypeCheckingSession<'_>, decl: DeclId) {
        let DeclKind::Enum(data) = &session.ctx.ast.decl(decl).kind else {
            return;
        };
        let simple = !data.cases.is_empty() && data.cases.iter().all(|c| !c.has_payload);
        let raw = data.raw_type.is_some();
        if simple {
            add_conformance(session, decl, KnownCapability::Equatable);
            add_conformance(session, decl, KnownCapability::Hashable);
        }
        if raw {
            add_conformance(session, decl, KnownCapability::RawRepresentable);
        }
    }
}

fn has_member_of_kind(ast: &AstContext, decl: DeclId, pred: impl Fn(&DeclKind) -> bool) -> bool {
    ast.decl(decl)
        .kind
        .members()
        .iter()
        .any(|&m| pred(&ast.decl(m).kind))
}

/// Record a conformance if the capability exists in this session. Missing
/// capabilities are not diagnosed.
fn add_conformance(session: &mut TypeCheckingSession<'_>, decl: DeclId, kind: KnownCapability) {
    let Some(protocol) = session.get_capability(kind, None) else {
        return;
    };
    if let Some(nominal) = session.ctx.ast.decl_mut(decl).kind.nominal_mut()
        && !nominal.implicit_conformances.contains(&protocol)
    {
        nominal.implicit_conformances.push(protocol);
        debug!(decl = decl.0, capability = kind.source_name(), "implicit conformance");
    }
}
