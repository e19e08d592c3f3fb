//! Declaration validation and kind dispatch.

use crate::services::LookupScope;
use crate::state::TypeCheckingSession;
use sable_ast::{DeclFlags, DeclId, DeclKind, ExtensionState, Pattern};
use tracing::{error, trace};

impl TypeCheckingSession<'_> {
    /// Compute the signature of `decl` once. A nominal type validated here is
    /// pushed on the validated-types stack so its members get checked by the
    /// fixpoint loop.
    pub fn validate_decl(&mut self, decl: DeclId) {
        if self.ctx.ast.decl(decl).is_validated() {
            return;
        }
        self.ctx.ast.decl_mut(decl).flags.insert(DeclFlags::VALIDATED);
        trace!(decl = decl.0, name = self.ctx.ast.name_of(decl), "validate_decl");

        let services = self.services();
        services.signatures.validate_signature(self, decl);

        let node = self.ctx.ast.decl(decl);
        if node.kind.nominal().is_some() && !node.is_invalid() {
            self.ctx.queues.validated_types.push(decl);
        }
    }

    /// Check one declaration.
    ///
    /// The first pass validates signatures and synthesizes implicit members;
    /// the second queues function bodies, whose checking may need arbitrary
    /// lookups. Invalid declarations are skipped.
    pub fn type_check_decl(&mut self, decl: DeclId, first_pass: bool) {
        let node = self.ctx.ast.decl(decl);
        if node.is_invalid() {
            return;
        }
        let services = self.services();
        match &node.kind {
            DeclKind::Import(_) => {}
            DeclKind::TopLevelCode(_) => {
                if !first_pass && !node.flags.contains(DeclFlags::BODY_CHECKED) {
                    services.bodies.check_top_level_code(self, decl);
                }
            }
            DeclKind::Extension(ext) => {
                if ext.state != ExtensionState::Bound {
                    return;
                }
                let members = ext.members.clone();
                self.validate_decl(decl);
                if self.ctx.ast.decl(decl).is_invalid() {
                    return;
                }
                self.type_check_members(&members, first_pass);
            }
            DeclKind::Struct(data) | DeclKind::Class(data) | DeclKind::Protocol(data) => {
                let members = data.members.clone();
                let is_class = matches!(node.kind, DeclKind::Class(_));
                let is_protocol = matches!(node.kind, DeclKind::Protocol(_));
                self.validate_decl(decl);
                if first_pass && !is_protocol {
                    services.synthesizer.add_implicit_constructors(self, decl);
                    if is_class {
                        services.synthesizer.add_implicit_destructor(self, decl);
                    }
                }
                self.type_check_members(&members, first_pass);
                // Synthesized members were appended after `members` was taken.
                let synthesized: Vec<DeclId> = self.ctx.ast.decl(decl).kind.members()[members.len()..].to_vec();
                self.type_check_members(&synthesized, first_pass);
            }
            DeclKind::Enum(data) => {
                let members = data.nominal.members.clone();
                self.validate_decl(decl);
                if first_pass {
                    services.synthesizer.add_implicit_enum_conformances(self, decl);
                }
                self.type_check_members(&members, first_pass);
            }
            DeclKind::TypeAlias(_) => self.validate_decl(decl),
            DeclKind::Function(f) | DeclKind::Constructor(f) | DeclKind::Destructor(f) => {
                let has_body = f.body.is_some();
                let checked = node.flags.contains(DeclFlags::BODY_CHECKED);
                self.validate_decl(decl);
                if !first_pass && has_body && !checked {
                    self.ctx.queues.define_function(decl);
                }
            }
            DeclKind::Variable(var) => {
                let accessors = var.accessors.clone();
                self.validate_decl(decl);
                for accessor in accessors {
                    self.type_check_decl(accessor, first_pass);
                }
            }
            DeclKind::PatternBinding(binding) => {
                let vars: Vec<DeclId> = binding.entries.iter().flat_map(|e| e.pattern.bound_vars()).collect();
                for var in vars {
                    self.type_check_decl(var, first_pass);
                }
                if !first_pass {
                    self.check_pattern_binding(decl);
                }
            }
        }
    }

    fn type_check_members(&mut self, members: &[DeclId], first_pass: bool) {
        for &member in members {
            // Variables are checked through their pattern binding.
            if matches!(self.ctx.ast.decl(member).kind, DeclKind::Variable(_)) {
                continue;
            }
            self.type_check_decl(member, first_pass);
        }
    }

    /// Validate the variables of a pattern binding and check its
    /// initializers. Unannotated variables bound by a plain name take the
    /// initializer's type.
    pub fn check_pattern_binding(&mut self, decl: DeclId) {
        let node = self.ctx.ast.decl(decl);
        if node.flags.contains(DeclFlags::BODY_CHECKED) || node.is_invalid() {
            return;
        }
        let DeclKind::PatternBinding(binding) = &node.kind else {
            return;
        };
        let mut entries = binding.entries.clone();
        self.ctx.ast.decl_mut(decl).flags.insert(DeclFlags::BODY_CHECKED);

        let services = self.services();
        let scope = LookupScope::around(self.ctx.ast, decl);
        for entry in &mut entries {
            // Local bindings reach this point without the Variable arm of
            // `type_check_decl`, so accessor bodies are queued here.
            for var in entry.pattern.bound_vars() {
                self.type_check_decl(var, false);
            }
            let Some(init) = &mut entry.init else {
                continue;
            };
            let ty = services.bodies.check_expr(self, scope, init);
            if let Pattern::Named(var) = entry.pattern {
                self.ctx.var_types.entry(var).or_insert(ty);
            }
        }

        if let DeclKind::PatternBinding(binding) = &mut self.ctx.ast.decl_mut(decl).kind {
            binding.entries = entries;
        }
    }

    /// Synchronize a nominal type imported from another compilation unit by
    /// synthesizing the implicit members it needs here.
    pub fn handle_external_decl(&mut self, decl: DeclId) {
        let services = self.services();
        match &self.ctx.ast.decl(decl).kind {
            DeclKind::Struct(_) => {
                services.synthesizer.add_implicit_constructors(self, decl);
                services.synthesizer.add_implicit_struct_conformances(self, decl);
            }
            DeclKind::Class(_) => services.synthesizer.add_implicit_destructor(self, decl),
            DeclKind::Enum(_) => services.synthesizer.add_implicit_enum_conformances(self, decl),
            _ => {}
        }
    }

    /// Process one entry of the external-definitions sequence.
    pub fn type_check_external_definition(&mut self, decl: DeclId) {
        let services = self.services();
        let kind = &self.ctx.ast.decl(decl).kind;
        match kind {
            DeclKind::Function(_) | DeclKind::Constructor(_) | DeclKind::Destructor(_) => {
                services.bodies.check_function_body(self, decl, None);
            }
            DeclKind::Struct(_) | DeclKind::Class(_) | DeclKind::Enum(_) | DeclKind::Protocol(_) => {
                self.handle_external_decl(decl);
            }
            DeclKind::Extension(_)
            | DeclKind::TypeAlias(_)
            | DeclKind::Variable(_)
            | DeclKind::PatternBinding(_)
            | DeclKind::TopLevelCode(_)
            | DeclKind::Import(_) => {
                let kind = kind.name();
                error!(decl = decl.0, kind, "unhandled external definition kind");
                if cfg!(debug_assertions) {
                    unreachable!("external definition of kind `{kind}` has no synchronization");
                }
            }
        }
    }
}
