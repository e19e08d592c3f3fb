//! Whole-unit checking and the fixpoint loop.
//!
//! `perform_type_checking` runs in two outer phases. Extensions are bound
//! first so that member lookup sees every extension member. Declarations are
//! then visited twice (signatures, then everything needing arbitrary lookup),
//! and the resulting work is drained by a single loop over four queues until
//! none of them has anything left.

use crate::known_capabilities::may_conform_to_known_capability;
use crate::state::TypeCheckingSession;
use crate::top_level::TopLevelContext;
use crate::verifier::verify_unit;
use sable_ast::{DeclId, DeclKind, ExtensionState, Type, UnitId, UnitKind, UnitStage};
use sable_common::{Span, diagnostic_codes};
use tracing::{Level, debug, error, span, trace};

impl TypeCheckingSession<'_> {
    /// Check `unit` from its `start`-th top-level declaration on. Everything
    /// before `start` is assumed checked by an earlier call.
    ///
    /// The unit is marked `TypeChecked` only for a complete run from index 0.
    pub fn perform_type_checking(&mut self, unit: UnitId, top_level: &mut TopLevelContext, start: usize) {
        let _span = span!(
            Level::INFO,
            "perform_type_checking",
            file = %self.ctx.ast.unit(unit).file_name,
            start
        )
        .entered();

        if self.ctx.ast.unit(unit).stage == UnitStage::TypeChecked {
            debug!("unit already type-checked");
            return;
        }
        self.ctx.unit = Some(unit);

        let services = self.services();
        services
            .binder
            .perform_name_binding(self.ctx.ast, unit, start, &mut self.ctx.diagnostics);

        self.stdlib_module();
        self.import_pending();

        self.bind_visible_extensions(unit);

        let decls: Vec<DeclId> = self.ctx.ast.unit(unit).decls.iter().skip(start).copied().collect();

        // Signatures only; bodies may need lookups that are not complete yet.
        for &decl in &decls {
            if matches!(self.ctx.ast.decl(decl).kind, DeclKind::TopLevelCode(_)) {
                continue;
            }
            self.type_check_decl(decl, true);
        }

        // Top-level code binds names used by the statements after it, so it
        // is checked right away.
        let mut saw_top_level_code = false;
        for &decl in &decls {
            if matches!(self.ctx.ast.decl(decl).kind, DeclKind::TopLevelCode(_)) {
                saw_top_level_code = true;
            }
            self.type_check_decl(decl, false);
        }
        if saw_top_level_code {
            top_level.contextualize(self.ctx.ast, &decls);
        }
        self.ctx.queues.merge_implicit_functions();

        if self.ctx.ast.unit(unit).kind == UnitKind::Repl && self.ctx.diagnostics.error_count() == 0 {
            self.process_repl_top_level(top_level, &decls);
        }

        let converged = self.type_check_functions_and_external_decls();

        if start == 0 && converged {
            self.ctx.ast.unit_mut(unit).stage = UnitStage::TypeChecked;
        }

        self.diagnose_bridging_without_module(unit, start);

        if self.ctx.options.verify {
            self.verify(unit);
        }
        debug!(
            rounds = self.ctx.stats.rounds,
            bodies = self.ctx.stats.bodies_checked,
            diagnostics = self.ctx.diagnostics.error_count(),
            "perform_type_checking done"
        );
    }

    /// Bind every extension visible from `unit` and eagerly validate the
    /// nominal types that may conform to a known capability.
    fn bind_visible_extensions(&mut self, unit: UnitId) {
        let _span = span!(Level::DEBUG, "bind_visible_extensions").entered();
        let visible = self.ctx.ast.visible_modules(unit);

        let bridging = self.ctx.options.bridging_module_name.as_str();
        let imports_bridging = visible
            .iter()
            .any(|&module| self.ctx.ast.text(self.ctx.ast.module(module).name) == bridging);
        self.ctx.imports_bridging_module = imports_bridging;

        let decls: Vec<DeclId> = visible
            .iter()
            .flat_map(|&module| self.ctx.ast.module(module).units.clone())
            .flat_map(|unit| self.ctx.ast.unit(unit).decls.clone())
            .collect();

        for decl in decls {
            let kind = &self.ctx.ast.decl(decl).kind;
            let is_extension = matches!(kind, DeclKind::Extension(_));
            let is_nominal = kind.nominal().is_some();

            if is_extension {
                if self.bind_extension(decl) != ExtensionState::Bound
                    || !may_conform_to_known_capability(self.ctx.ast, decl)
                {
                    continue;
                }
                let nominal = self
                    .ctx
                    .ast
                    .decl(decl)
                    .kind
                    .extension()
                    .and_then(|ext| ext.extended_type.as_ref())
                    .and_then(Type::any_nominal);
                if let Some(nominal) = nominal {
                    self.validate_decl(nominal);
                }
            } else if is_nominal && may_conform_to_known_capability(self.ctx.ast, decl) {
                self.validate_decl(decl);
            }
        }
    }

    /// Drain the work queues until all of them are empty at the start of a
    /// round. Returns `false` when the round limit cut the loop short.
    pub fn type_check_functions_and_external_decls(&mut self) -> bool {
        let _span = span!(Level::DEBUG, "fixpoint").entered();
        let services = self.services();
        let max_rounds = self.ctx.options.max_checking_rounds;

        while self.has_pending_work() {
            if self.ctx.stats.rounds >= max_rounds {
                error!(rounds = self.ctx.stats.rounds, "checking did not converge");
                let rounds = self.ctx.stats.rounds.to_string();
                self.error_in_unit(Span::INVALID, diagnostic_codes::CHECKING_DID_NOT_CONVERGE, &[&rounds]);
                return false;
            }
            self.ctx.stats.rounds += 1;
            trace!(round = self.ctx.stats.rounds, "fixpoint round");

            self.import_pending();

            // External definitions. The cursor lives on the context so a
            // later session resumes where this one stopped.
            while self.ctx.ast.last_checked_external < self.ctx.ast.external_definitions.len() {
                let decl = self.ctx.ast.external_definitions[self.ctx.ast.last_checked_external];
                self.ctx.ast.last_checked_external += 1;
                self.ctx.stats.externals_processed += 1;
                self.type_check_external_definition(decl);
            }

            // Function bodies. Nested functions found while checking are
            // appended and checked in the same batch.
            let batch_start = self.ctx.queues.current_function;
            while self.ctx.queues.current_function < self.ctx.queues.defined_functions.len() {
                let func = self.ctx.queues.defined_functions[self.ctx.queues.current_function];
                self.ctx.queues.current_function += 1;
                services.bodies.check_function_body(self, func, None);
            }
            // Inner functions were discovered after their outer function, so
            // reverse order finalizes them first.
            let batch_end = self.ctx.queues.current_function;
            for index in (batch_start..batch_end).rev() {
                let func = self.ctx.queues.defined_functions[index];
                services.bodies.compute_captures(self, func);
            }

            while let Some(nominal) = self.ctx.queues.validated_types.pop() {
                if self.ctx.ast.decl(nominal).is_invalid() {
                    continue;
                }
                self.ctx.stats.types_revalidated += 1;
                self.type_check_decl(nominal, true);
            }

            self.ctx.queues.merge_implicit_functions();
        }
        true
    }

    fn has_pending_work(&self) -> bool {
        let queues = &self.ctx.queues;
        self.ctx.ast.last_checked_external < self.ctx.ast.external_definitions.len()
            || queues.has_pending_functions()
            || !queues.validated_types.is_empty()
            || !queues.implicitly_defined_functions.is_empty()
    }

    /// A main unit using the bridging attribute must import the module that
    /// provides it.
    fn diagnose_bridging_without_module(&mut self, unit: UnitId, start: usize) {
        if !self.ctx.options.bridging_attr_requires_module || start != 0 || self.ctx.imports_bridging_module {
            return;
        }
        let source = self.ctx.ast.unit(unit);
        if source.kind != UnitKind::Main {
            return;
        }
        let Some(span) = source.first_bridged_attr else {
            return;
        };
        let module = self.ctx.options.bridging_module_name.clone();
        self.error_in_unit(
            span,
            diagnostic_codes::BRIDGED_DECL_USED_WITHOUT_REQUIRED_MODULE,
            &["bridged", &module],
        );
    }

    fn verify(&mut self, unit: UnitId) {
        let problems = verify_unit(self.ctx.ast, unit);
        for problem in &problems {
            error!(problem = %problem, "unit verification failed");
        }
        if cfg!(debug_assertions) && !problems.is_empty() {
            panic!("unit verification failed: {}", problems.join("; "));
        }

        if cfg!(debug_assertions) && self.ctx.ast.unit(unit).kind != UnitKind::Repl {
            let problems = self.verify_loaded_modules();
            for problem in &problems {
                error!(problem = %problem, "module verification failed");
            }
            if !problems.is_empty() {
                panic!("module verification failed: {}", problems.join("; "));
            }
        }
    }
}
