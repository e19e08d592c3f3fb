//! Shared builders for checker tests.

use crate::context::CheckerOptions;
use crate::entry_points::{CheckOutcome, perform_type_checking};
use crate::known_capabilities::KnownCapability;
use crate::services::CheckerServices;
use crate::top_level::TopLevelContext;
use sable_ast::{
    AstContext, Body, DeclId, DeclKind, ExtensionData, ExtensionRef, Expr, ExprKind, FunctionData,
    FunctionKind, ModuleId, NominalData, Pattern, PatternBindingData, PatternBindingEntry, Stmt,
    TopLevelCodeData, TypeRepr, UnitId, UnitKind, VarData,
};
use sable_common::Span;

pub const STDLIB_NAME: &str = "Core";

/// An `AstContext` with a standard library module and one main unit.
pub struct TestContext {
    pub ast: AstContext,
    pub services: CheckerServices,
    pub stdlib: ModuleId,
    pub module: ModuleId,
    pub unit: UnitId,
    pub top_level: TopLevelContext,
    next_offset: u32,
}

impl TestContext {
    /// Standard library declaring every known capability and `Bool`.
    pub fn new() -> Self {
        Self::with_capabilities(KnownCapability::ALL)
    }

    pub fn with_capabilities(capabilities: &[KnownCapability]) -> Self {
        let mut ast = AstContext::new();
        let stdlib = ast.add_module(STDLIB_NAME);
        let core = ast.add_unit(stdlib, "core.sable", UnitKind::Library);
        for kind in capabilities {
            ast.add_top_level(core, kind.source_name(), Span::INVALID, DeclKind::Protocol(NominalData::default()));
        }
        ast.add_top_level(core, "Bool", Span::INVALID, DeclKind::Struct(NominalData::default()));
        ast.stdlib = Some(stdlib);

        let module = ast.add_module("App");
        let unit = ast.add_unit(module, "main.sable", UnitKind::Main);
        Self {
            ast,
            services: CheckerServices::standard(),
            stdlib,
            module,
            unit,
            top_level: TopLevelContext::new(),
            next_offset: 0,
        }
    }

    /// A fresh, strictly increasing span.
    pub fn span(&mut self) -> Span {
        self.next_offset += 10;
        Span::new(self.next_offset, 5)
    }

    pub fn check(&mut self) -> CheckOutcome {
        self.check_with(CheckerOptions::default())
    }

    pub fn check_with(&mut self, options: CheckerOptions) -> CheckOutcome {
        self.check_from(0, options)
    }

    pub fn check_from(&mut self, start: usize, options: CheckerOptions) -> CheckOutcome {
        perform_type_checking(&mut self.ast, self.unit, &mut self.top_level, start, &self.services, options, None)
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    pub fn add_struct(&mut self, name: &str) -> DeclId {
        let span = self.span();
        self.ast.add_top_level(self.unit, name, span, DeclKind::Struct(NominalData::default()))
    }

    pub fn add_class(&mut self, name: &str) -> DeclId {
        let span = self.span();
        self.ast.add_top_level(self.unit, name, span, DeclKind::Class(NominalData::default()))
    }

    pub fn add_protocol(&mut self, name: &str) -> DeclId {
        let span = self.span();
        self.ast.add_top_level(self.unit, name, span, DeclKind::Protocol(NominalData::default()))
    }

    pub fn add_generic_struct(&mut self, name: &str, params: &[&str]) -> DeclId {
        let span = self.span();
        let generic_params = Some(self.ast.add_generic_params(params, span));
        self.ast.add_top_level(
            self.unit,
            name,
            span,
            DeclKind::Struct(NominalData {
                generic_params,
                ..NominalData::default()
            }),
        )
    }

    /// Nested type declared inside `parent`.
    pub fn add_nested_struct(&mut self, parent: DeclId, name: &str) -> DeclId {
        let span = self.span();
        self.ast.add_member(parent, name, span, DeclKind::Struct(NominalData::default()))
    }

    /// `extension A<..>.B<..>`; each component lists its generic parameters,
    /// if written.
    pub fn add_extension(&mut self, path: &[(&str, Option<&[&str]>)]) -> DeclId {
        let refs = path
            .iter()
            .map(|&(name, params)| {
                let span = self.span();
                ExtensionRef {
                    name: self.ast.atom(name),
                    span,
                    generic_params: params.map(|params| self.ast.add_generic_params(params, span)),
                    bound: None,
                }
            })
            .collect();
        let span = self.span();
        self.ast.add_top_level(
            self.unit,
            "",
            span,
            DeclKind::Extension(ExtensionData {
                refs,
                ..ExtensionData::default()
            }),
        )
    }

    pub fn inherit(&mut self, decl: DeclId, names: &[&str]) {
        let reprs = names
            .iter()
            .map(|name| {
                let span = self.span();
                TypeRepr::simple(self.ast.atom(name), span)
            })
            .collect();
        self.ast.set_inherited(decl, reprs);
    }

    pub fn add_function(&mut self, name: &str, stmts: Vec<Stmt>) -> DeclId {
        let span = self.span();
        self.ast.add_top_level(
            self.unit,
            name,
            span,
            DeclKind::Function(FunctionData::new(FunctionKind::Free, Some(Body::new(stmts)))),
        )
    }

    pub fn add_method(&mut self, parent: DeclId, name: &str) -> DeclId {
        let span = self.span();
        self.ast.add_member(
            parent,
            name,
            span,
            DeclKind::Function(FunctionData::new(FunctionKind::Method, Some(Body::default()))),
        )
    }

    /// A function declared inside `parent`'s body. The caller places the
    /// returned declaration with `Stmt::Decl`.
    pub fn add_local_function(&mut self, parent: DeclId, name: &str, stmts: Vec<Stmt>) -> DeclId {
        let span = self.span();
        let unit = self.ast.decl(parent).unit;
        self.ast.alloc_decl(
            unit,
            Some(parent),
            name,
            span,
            DeclKind::Function(FunctionData::new(FunctionKind::Free, Some(Body::new(stmts)))),
        )
    }

    /// A closure expression whose declaration lives inside `parent`.
    pub fn add_closure(&mut self, parent: DeclId, stmts: Vec<Stmt>) -> Expr {
        let span = self.span();
        let unit = self.ast.decl(parent).unit;
        let closure = self.ast.alloc_decl(
            unit,
            Some(parent),
            "",
            span,
            DeclKind::Function(FunctionData::new(FunctionKind::Closure, Some(Body::new(stmts)))),
        );
        Expr::new(ExprKind::Closure(closure), span)
    }

    /// `var name = init` inside `parent`'s body. Returns the variable and
    /// the statement declaring it.
    pub fn add_local_var(&mut self, parent: DeclId, name: &str, init: Option<Expr>) -> (DeclId, Stmt) {
        let span = self.span();
        let unit = self.ast.decl(parent).unit;
        let var = self
            .ast
            .alloc_decl(unit, Some(parent), name, span, DeclKind::Variable(VarData::default()));
        let binding = self.ast.alloc_decl(
            unit,
            Some(parent),
            "",
            span,
            DeclKind::PatternBinding(PatternBindingData {
                entries: vec![PatternBindingEntry {
                    pattern: Pattern::Named(var),
                    init,
                }],
            }),
        );
        (var, Stmt::Decl(binding))
    }

    /// Top-level code holding `stmts`.
    pub fn add_top_level_code(&mut self, stmts: Vec<Stmt>) -> DeclId {
        let span = self.span();
        self.ast.add_top_level(
            self.unit,
            "",
            span,
            DeclKind::TopLevelCode(TopLevelCodeData { body: Body::new(stmts) }),
        )
    }

    /// Allocate a top-level code declaration without adding it to the unit,
    /// so its body can refer to it as a parent.
    pub fn reserve_top_level_code(&mut self) -> DeclId {
        let span = self.span();
        self.ast
            .alloc_decl(self.unit, None, "", span, DeclKind::TopLevelCode(TopLevelCodeData::default()))
    }

    pub fn finish_top_level_code(&mut self, code: DeclId, stmts: Vec<Stmt>) {
        if let DeclKind::TopLevelCode(data) = &mut self.ast.decl_mut(code).kind {
            data.body = Body::new(stmts);
        }
        self.ast.unit_mut(self.unit).decls.push(code);
    }

    /// Fill in the body of a function allocated earlier.
    pub fn set_body(&mut self, func: DeclId, stmts: Vec<Stmt>) {
        if let Some(f) = self.ast.decl_mut(func).kind.function_mut() {
            f.body = Some(Body::new(stmts));
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn int(&mut self) -> Expr {
        let span = self.span();
        Expr::new(ExprKind::IntegerLiteral("1".to_string()), span)
    }

    pub fn string(&mut self, text: &str) -> Expr {
        let span = self.span();
        Expr::new(ExprKind::StringLiteral(text.to_string()), span)
    }

    pub fn name_ref(&mut self, name: &str) -> Expr {
        let span = self.span();
        Expr::new(ExprKind::DeclRef(self.ast.atom(name)), span)
    }

    pub fn call(&mut self, callee: Expr, args: Vec<Expr>) -> Expr {
        let span = self.span();
        Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            span,
        )
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn function(&self, func: DeclId) -> &FunctionData {
        self.ast
            .decl(func)
            .kind
            .function()
            .expect("declaration is a function")
    }

    pub fn extension(&self, ext: DeclId) -> &ExtensionData {
        self.ast
            .decl(ext)
            .kind
            .extension()
            .expect("declaration is an extension")
    }

    pub fn capability(&self, kind: KnownCapability) -> DeclId {
        let core = self.ast.module(self.stdlib).units[0];
        self.ast
            .unit(core)
            .decls
            .iter()
            .copied()
            .find(|&decl| self.ast.name_of(decl) == kind.source_name())
            .expect("capability declared in the fixture")
    }
}
