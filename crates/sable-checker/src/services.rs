//! Collaborator interfaces and their bundle.
//!
//! The driver schedules work; the traits here do it. Each trait receives the
//! active `TypeCheckingSession` so implementations can resolve types, queue
//! work and report diagnostics through the same state the driver uses.

use crate::body_checker::BasicBodyChecker;
use crate::name_lookup::{ScopeLookup, StandardNameBinder};
use crate::signature::DefaultSignatureValidator;
use crate::state::TypeCheckingSession;
use crate::synthesis::DefaultSynthesizer;
use sable_ast::{AstContext, DeclId, Expr, ModuleId, Type, UnitId};
use sable_common::{Atom, DiagnosticSink};

/// Where an unqualified lookup starts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LookupScope {
    pub unit: UnitId,
    /// Innermost enclosing declaration; `None` for unit scope.
    pub decl: Option<DeclId>,
}

impl LookupScope {
    #[must_use]
    pub const fn unit(unit: UnitId) -> Self {
        Self { unit, decl: None }
    }

    /// Scope of names visible inside `decl`.
    #[must_use]
    pub fn inside(ast: &AstContext, decl: DeclId) -> Self {
        Self {
            unit: ast.decl(decl).unit,
            decl: Some(decl),
        }
    }

    /// Scope `decl` itself is declared in.
    #[must_use]
    pub fn around(ast: &AstContext, decl: DeclId) -> Self {
        let node = ast.decl(decl);
        Self {
            unit: node.unit,
            decl: node.parent,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupResult {
    Decl(DeclId),
    GenericParam(Atom),
    Module(ModuleId),
}

impl LookupResult {
    #[must_use]
    pub const fn decl(&self) -> Option<DeclId> {
        match self {
            Self::Decl(decl) => Some(*decl),
            _ => None,
        }
    }
}

/// Resolves imports and records the unit as name-bound.
pub trait NameBinder {
    fn perform_name_binding(
        &self,
        ast: &mut AstContext,
        unit: UnitId,
        start: usize,
        diagnostics: &mut DiagnosticSink,
    );
}

pub trait NameLookup {
    /// Names visible from `scope`, innermost first.
    fn lookup_unqualified(&self, ast: &AstContext, scope: LookupScope, name: Atom) -> Vec<LookupResult>;

    /// Members named `name` of `base`, including members of bound extensions.
    fn lookup_member(&self, ast: &AstContext, base: &Type, name: Atom) -> Vec<LookupResult>;
}

/// Computes a declaration's signature: accessibility, inheritance clause,
/// annotations.
pub trait SignatureValidator {
    fn validate_signature(&self, session: &mut TypeCheckingSession<'_>, decl: DeclId);
}

/// The opaque expression and body checker.
pub trait BodyChecker {
    /// Check a function body. With `end`, only statements that start before
    /// that offset are checked and the body is not marked checked.
    fn check_function_body(&self, session: &mut TypeCheckingSession<'_>, func: DeclId, end: Option<u32>);

    fn check_top_level_code(&self, session: &mut TypeCheckingSession<'_>, code: DeclId);

    fn check_expr(&self, session: &mut TypeCheckingSession<'_>, scope: LookupScope, expr: &mut Expr) -> Type;

    /// Runs after the body of `func` and of every function nested in it has
    /// been checked and their captures computed.
    fn compute_captures(&self, session: &mut TypeCheckingSession<'_>, func: DeclId);
}

/// Synthesizes implicit members. Synthesized functions are reported through
/// `session.ctx.queues.add_implicit_function`.
pub trait MemberSynthesizer {
    fn add_implicit_constructors(&self, session: &mut TypeCheckingSession<'_>, decl: DeclId);
    fn add_implicit_destructor(&self, session: &mut TypeCheckingSession<'_>, decl: DeclId);
    fn add_implicit_struct_conformances(&self, session: &mut TypeCheckingSession<'_>, decl: DeclId);
    fn add_implicit_enum_conformances(&self, session: &mut TypeCheckingSession<'_>, decl: DeclId);
}

/// Everything the driver delegates to.
pub struct CheckerServices {
    pub binder: Box<dyn NameBinder>,
    pub lookup: Box<dyn NameLookup>,
    pub signatures: Box<dyn SignatureValidator>,
    pub bodies: Box<dyn BodyChecker>,
    pub synthesizer: Box<dyn MemberSynthesizer>,
}

impl CheckerServices {
    /// The reference implementations.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            binder: Box::new(StandardNameBinder),
            lookup: Box::new(ScopeLookup),
            signatures: Box::new(DefaultSignatureValidator),
            bodies: Box::new(BasicBodyChecker),
            synthesizer: Box::new(DefaultSynthesizer),
        }
    }
}

impl Default for CheckerServices {
    fn default() -> Self {
        Self::standard()
    }
}
