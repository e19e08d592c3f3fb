//! The checking session and its shared helpers.
//!
//! A `TypeCheckingSession` is created per top-level invocation and dropped
//! at its end. It owns the work queues and every cache (standard library
//! module, `Bool` type, capability registry), so nothing survives from one
//! session to the next except what was written into the `AstContext`.

use crate::context::{CheckerContext, CheckerOptions, CheckerStatistics};
use crate::known_capabilities::KnownCapability;
use crate::literal_capability::literal_capability;
use crate::services::{CheckerServices, LookupResult, LookupScope};
use sable_ast::{AstContext, DeclId, Expr, LazyResolver, ModuleId, ModuleLoader, Type};
use sable_common::{Atom, Diagnostic, DiagnosticSink, Span, diagnostic_codes};
use tracing::{debug, trace};

pub struct TypeCheckingSession<'a> {
    pub ctx: CheckerContext<'a>,
    services: &'a CheckerServices,
    loader: Option<&'a mut dyn ModuleLoader>,
}

/// Lazy resolver lent to the module loader. Requests are recorded and
/// served once the loader call returns.
#[derive(Default)]
struct DeferredResolver {
    requested: Vec<DeclId>,
}

impl LazyResolver for DeferredResolver {
    fn resolve_declaration(&mut self, _ast: &mut AstContext, decl: DeclId) {
        self.requested.push(decl);
    }
}

impl<'a> TypeCheckingSession<'a> {
    /// A session that collects diagnostics.
    pub fn new(ast: &'a mut AstContext, services: &'a CheckerServices, options: CheckerOptions) -> Self {
        Self::with_sink(ast, services, options, DiagnosticSink::collecting())
    }

    /// A session whose diagnostics are swallowed.
    pub fn speculative(ast: &'a mut AstContext, services: &'a CheckerServices) -> Self {
        Self::with_sink(ast, services, CheckerOptions::default(), DiagnosticSink::discarding())
    }

    pub fn with_sink(
        ast: &'a mut AstContext,
        services: &'a CheckerServices,
        options: CheckerOptions,
        sink: DiagnosticSink,
    ) -> Self {
        Self {
            ctx: CheckerContext::new(ast, options, sink),
            services,
            loader: None,
        }
    }

    /// Hand the module loader a lazy resolver for the lifetime of the session.
    #[must_use]
    pub fn with_loader(mut self, loader: &'a mut dyn ModuleLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// The collaborators. The returned reference is not tied to `self`, so
    /// callers can pass `self` mutably to a collaborator.
    #[must_use]
    pub const fn services(&self) -> &'a CheckerServices {
        self.services
    }

    #[must_use]
    pub const fn stats(&self) -> CheckerStatistics {
        self.ctx.stats
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.ctx.diagnostics.diagnostics()
    }

    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.ctx.diagnostics.into_diagnostics()
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Report a diagnostic located in the file that declares `decl`.
    pub fn error_at(&mut self, decl: DeclId, span: Span, code: u32, args: &[&str]) {
        let diagnostic = Diagnostic::from_code(self.ctx.file_of(decl), span, code, args);
        self.ctx.diagnostics.push(diagnostic);
    }

    /// Report a diagnostic located in the unit under check.
    pub fn error_in_unit(&mut self, span: Span, code: u32, args: &[&str]) {
        let diagnostic = Diagnostic::from_code(self.ctx.current_file(), span, code, args);
        self.ctx.diagnostics.push(diagnostic);
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.ctx.diagnostics.push(diagnostic);
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    #[must_use]
    pub fn lookup_unqualified(&self, scope: LookupScope, name: Atom) -> Vec<LookupResult> {
        self.services.lookup.lookup_unqualified(self.ctx.ast, scope, name)
    }

    #[must_use]
    pub fn lookup_member(&self, base: &Type, name: Atom) -> Vec<LookupResult> {
        self.services.lookup.lookup_member(self.ctx.ast, base, name)
    }

    // =========================================================================
    // Session caches
    // =========================================================================

    /// The standard library module, resolved once per session. Falls back to
    /// the module under check, which is the standard library itself when it
    /// is being compiled. Known capabilities are recorded on first use.
    pub fn stdlib_module(&mut self) -> Option<ModuleId> {
        if let Some(module) = self.ctx.stdlib_module {
            return Some(module);
        }
        let module = self
            .ctx
            .ast
            .stdlib
            .or_else(|| self.ctx.unit.map(|unit| self.ctx.ast.unit(unit).module))?;
        self.ctx.stdlib_module = Some(module);
        self.ctx.capabilities.record_from_module(self.ctx.ast, module);
        debug!(
            module = self.ctx.ast.text(self.ctx.ast.module(module).name),
            capabilities = self.ctx.capabilities.len(),
            "standard library resolved"
        );
        Some(module)
    }

    /// The standard library's `Bool`, looked up once per session.
    pub fn lookup_bool_type(&mut self) -> Option<Type> {
        if let Some(cached) = &self.ctx.bool_type {
            return cached.clone();
        }
        let found = self.stdlib_module().and_then(|module| {
            let name = self.ctx.ast.interner.get("Bool")?;
            let results = self.lookup_member(&Type::Module(module), name);
            match results.as_slice() {
                [LookupResult::Decl(decl)] => Type::declared(self.ctx.ast, *decl),
                _ => None,
            }
        });
        if found.is_none() {
            self.error_in_unit(Span::INVALID, diagnostic_codes::BOOL_TYPE_BROKEN, &[]);
        }
        self.ctx.bool_type = Some(found.clone());
        found
    }

    /// The protocol providing `kind`.
    ///
    /// A missing capability is diagnosed only when `span` is given; internal
    /// callers probing for a capability pass `None` and get a quiet `None`.
    pub fn get_capability(&mut self, kind: KnownCapability, span: Option<Span>) -> Option<DeclId> {
        if self.ctx.stdlib_module.is_none() {
            self.stdlib_module();
        }
        let Some(protocol) = self.ctx.capabilities.get(kind) else {
            trace!(capability = kind.source_name(), "capability not registered");
            if let Some(span) = span {
                self.error_in_unit(span, diagnostic_codes::MISSING_CAPABILITY, &[kind.source_name()]);
            }
            return None;
        };
        if !self.ctx.ast.decl(protocol).is_validated() {
            self.validate_decl(protocol);
        }
        if self.ctx.ast.decl(protocol).is_invalid() {
            return None;
        }
        Some(protocol)
    }

    /// The protocol a literal expression requires, diagnosed at the literal.
    pub fn literal_protocol(&mut self, expr: &Expr) -> Option<DeclId> {
        let kind = literal_capability(&expr.kind)?;
        self.get_capability(kind, Some(expr.span))
    }

    // =========================================================================
    // Module loader
    // =========================================================================

    /// Let the module loader import whatever it has queued, then validate
    /// the declarations it asked to have resolved.
    pub fn import_pending(&mut self) {
        let Some(loader) = self.loader.as_deref_mut() else {
            return;
        };
        let mut resolver = DeferredResolver::default();
        loader.import_pending(self.ctx.ast, &mut resolver);
        for decl in resolver.requested {
            self.validate_decl(decl);
        }
    }

    /// Problems found by the module loader's own consistency check.
    #[must_use]
    pub fn verify_loaded_modules(&self) -> Vec<String> {
        self.loader
            .as_deref()
            .map(|loader| loader.verify_all_modules(self.ctx.ast))
            .unwrap_or_default()
    }
}
