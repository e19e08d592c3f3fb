//! Public entry points. Each call runs in a fresh session.
//!
//! Only `perform_type_checking` can mark a unit checked. The tooling entry
//! points (completion, bounded body checks) run speculatively: their
//! diagnostics are discarded and they never advance a unit's stage.

use crate::context::{CheckerOptions, CheckerStatistics};
use crate::services::{CheckerServices, LookupScope};
use crate::state::TypeCheckingSession;
use crate::top_level::TopLevelContext;
use sable_ast::{AstContext, DeclId, DeclKind, Expr, ModuleLoader, Type, TypeRepr, UnitId, UnitStage};
use sable_common::{Diagnostic, DiagnosticSink};
use tracing::{Level, span, warn};

/// Diagnostics and counters of one session.
#[derive(Clone, Debug, Default)]
pub struct CheckOutcome {
    pub diagnostics: Vec<Diagnostic>,
    pub stats: CheckerStatistics,
}

impl CheckOutcome {
    fn from_session(session: TypeCheckingSession<'_>) -> Self {
        let stats = session.stats();
        Self {
            diagnostics: session.into_diagnostics(),
            stats,
        }
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Check `unit` from its `start`-th top-level declaration on.
pub fn perform_type_checking(
    ast: &mut AstContext,
    unit: UnitId,
    top_level: &mut TopLevelContext,
    start: usize,
    services: &CheckerServices,
    options: CheckerOptions,
    loader: Option<&mut dyn ModuleLoader>,
) -> CheckOutcome {
    let mut session = TypeCheckingSession::new(ast, services, options);
    if let Some(loader) = loader {
        session = session.with_loader(loader);
    }
    session.perform_type_checking(unit, top_level, start);
    CheckOutcome::from_session(session)
}

/// Synchronize external definitions added since `unit` was checked. The
/// unit must already be fully checked.
pub fn type_check_external_definitions(
    ast: &mut AstContext,
    unit: UnitId,
    services: &CheckerServices,
    options: CheckerOptions,
) -> CheckOutcome {
    let _span = span!(Level::INFO, "type_check_external_definitions", unit = unit.0).entered();
    if ast.unit(unit).stage != UnitStage::TypeChecked {
        warn!(unit = unit.0, "external definitions requested for an unchecked unit");
        return CheckOutcome::default();
    }
    let mut session = TypeCheckingSession::new(ast, services, options);
    session.ctx.unit = Some(unit);
    session.stdlib_module();
    session.type_check_functions_and_external_decls();
    CheckOutcome::from_session(session)
}

/// Resolve a type representation outside of any declaration.
pub fn perform_type_loc_checking(
    ast: &mut AstContext,
    repr: &TypeRepr,
    scope: LookupScope,
    produce_diagnostics: bool,
    services: &CheckerServices,
) -> (Type, CheckOutcome) {
    let sink = if produce_diagnostics {
        DiagnosticSink::collecting()
    } else {
        DiagnosticSink::discarding()
    };
    let mut session = TypeCheckingSession::with_sink(ast, services, CheckerOptions::default(), sink);
    session.ctx.unit = Some(scope.unit);
    let ty = session.resolve_type_repr(repr, scope);
    (ty, CheckOutcome::from_session(session))
}

/// Validate one declaration for code completion.
pub fn type_check_completion_decl(ast: &mut AstContext, decl: DeclId, services: &CheckerServices) {
    let unit = ast.decl(decl).unit;
    let mut session = TypeCheckingSession::speculative(ast, services);
    session.ctx.unit = Some(unit);
    if matches!(session.ctx.ast.decl(decl).kind, DeclKind::Extension(_)) {
        session.bind_extension(decl);
    }
    session.type_check_decl(decl, true);
}

/// Check the expression around a completion point. Returns `true` when it
/// has a usable type.
pub fn type_check_completion_context_expr(
    ast: &mut AstContext,
    scope: LookupScope,
    expr: &mut Expr,
    services: &CheckerServices,
) -> bool {
    let mut session = TypeCheckingSession::speculative(ast, services);
    session.ctx.unit = Some(scope.unit);
    let ty = services.bodies.check_expr(&mut session, scope, expr);
    !ty.is_error()
}

/// Check the statements of `func` that start before `end`. The body is not
/// marked checked. Returns `true` when no error was found.
pub fn type_check_function_body_until(
    ast: &mut AstContext,
    func: DeclId,
    end: u32,
    services: &CheckerServices,
) -> bool {
    let unit = ast.decl(func).unit;
    let mut session = TypeCheckingSession::speculative(ast, services);
    session.ctx.unit = Some(unit);
    services.bodies.check_function_body(&mut session, func, Some(end));
    !session.ctx.diagnostics.had_error()
}

/// Check one top-level code declaration on its own.
pub fn type_check_top_level_code_decl(ast: &mut AstContext, code: DeclId, services: &CheckerServices) -> bool {
    let unit = ast.decl(code).unit;
    let mut session = TypeCheckingSession::speculative(ast, services);
    session.ctx.unit = Some(unit);
    services.bodies.check_top_level_code(&mut session, code);
    !session.ctx.diagnostics.had_error()
}
