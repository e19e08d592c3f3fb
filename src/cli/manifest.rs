//! JSON unit manifests.
//!
//! A manifest stands in for parsed source: it lists modules, the units of
//! each module and the declarations of each unit. Building a manifest
//! produces an `AstContext` ready for checking.
//!
//! ```json
//! {
//!   "modules": [{
//!     "name": "App",
//!     "units": [{
//!       "file": "main.sable",
//!       "kind": "main",
//!       "decls": [
//!         { "class": { "name": "Widget", "members": [
//!           { "func": { "name": "draw", "access": "private", "body": [] } }
//!         ] } },
//!         { "code": [ { "expr": { "call": { "callee": { "ref": "print" } } } } ] }
//!       ]
//!     }]
//!   }]
//! }
//! ```
//!
//! Without a `stdlib` entry, a module named `Core` is used as the standard
//! library when declared, and otherwise a prelude declaring every known
//! capability protocol and `Bool` is added.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use sable_ast::{
    Accessibility, AccessorKind, AstContext, Body, DeclFlags, DeclId, DeclKind, EnumCase, EnumData,
    Expr, ExprKind, ExtensionData, ExtensionRef, FunctionData, FunctionKind, GenericParamListId, ImportData,
    MagicIdentifierKind, ModuleId, NominalData, Pattern, PatternBindingData, PatternBindingEntry,
    Stmt, TopLevelCodeData, TypeAliasData, TypeComponent, TypeRepr, UnitId, UnitKind, VarData,
};
use sable_checker::KnownCapability;
use sable_common::Span;

pub const DEFAULT_STDLIB_NAME: &str = "Core";

// =============================================================================
// Manifest schema
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Name of the module acting as the standard library.
    #[serde(default)]
    pub stdlib: Option<String>,
    /// Module that must be imported before bridged declarations are allowed.
    #[serde(default)]
    pub bridging_module: Option<String>,
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
    /// Dotted declaration paths queued as external definitions.
    #[serde(default)]
    pub externals: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSpec {
    pub name: String,
    #[serde(default)]
    pub reexports: Vec<String>,
    #[serde(default)]
    pub units: Vec<UnitSpec>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKindSpec {
    Main,
    #[default]
    Library,
    Repl,
}

impl From<UnitKindSpec> for UnitKind {
    fn from(kind: UnitKindSpec) -> Self {
        match kind {
            UnitKindSpec::Main => Self::Main,
            UnitKindSpec::Library => Self::Library,
            UnitKindSpec::Repl => Self::Repl,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSpec {
    pub file: String,
    #[serde(default)]
    pub kind: UnitKindSpec,
    /// Modules visible to this unit before name binding runs.
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub decls: Vec<DeclSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessSpec {
    Private,
    Internal,
    Public,
}

impl From<AccessSpec> for Accessibility {
    fn from(access: AccessSpec) -> Self {
        match access {
            AccessSpec::Private => Self::Private,
            AccessSpec::Internal => Self::Internal,
            AccessSpec::Public => Self::Public,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SpanSpec {
    pub start: u32,
    #[serde(default)]
    pub length: u32,
}

/// Attributes shared by every declaration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclAttrs {
    #[serde(default)]
    pub access: Option<AccessSpec>,
    #[serde(default)]
    pub bridged: bool,
    #[serde(default, rename = "final")]
    pub is_final: bool,
    #[serde(default)]
    pub dynamic: bool,
    /// Dotted path of the declaration this one overrides.
    #[serde(default)]
    pub overrides: Option<String>,
    /// Source location; synthesized when absent.
    #[serde(default)]
    pub span: Option<SpanSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclSpec {
    Struct(NominalSpec),
    Class(NominalSpec),
    Protocol(NominalSpec),
    Enum(EnumSpec),
    Extension(ExtensionSpec),
    Typealias(AliasSpec),
    Func(FuncSpec),
    Init(FuncSpec),
    Deinit(FuncSpec),
    Var(VarSpec),
    Import(String),
    Code(Vec<StmtSpec>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NominalSpec {
    pub name: String,
    #[serde(flatten)]
    pub attrs: DeclAttrs,
    #[serde(default)]
    pub generics: Vec<String>,
    #[serde(default)]
    pub inherits: Vec<String>,
    #[serde(default)]
    pub members: Vec<DeclSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSpec {
    pub name: String,
    #[serde(default)]
    pub payload: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumSpec {
    pub name: String,
    #[serde(flatten)]
    pub attrs: DeclAttrs,
    #[serde(default)]
    pub cases: Vec<CaseSpec>,
    #[serde(default)]
    pub raw_type: Option<String>,
    #[serde(default)]
    pub inherits: Vec<String>,
    #[serde(default)]
    pub members: Vec<DeclSpec>,
}

/// One component of an extension target, e.g. `{"name": "Box", "generics": ["T"]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathComponentSpec {
    pub name: String,
    #[serde(default)]
    pub generics: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionSpec {
    pub path: Vec<PathComponentSpec>,
    #[serde(flatten)]
    pub attrs: DeclAttrs,
    #[serde(default)]
    pub inherits: Vec<String>,
    #[serde(default)]
    pub members: Vec<DeclSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasSpec {
    pub name: String,
    #[serde(flatten)]
    pub attrs: DeclAttrs,
    #[serde(rename = "type")]
    pub underlying: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpec {
    pub name: String,
    #[serde(default, rename = "type")]
    pub annotation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuncSpec {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub attrs: DeclAttrs,
    #[serde(default)]
    pub generics: Vec<String>,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    /// Absent for requirements and other body-less declarations.
    #[serde(default)]
    pub body: Option<Vec<StmtSpec>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessorSpec {
    Get,
    Set,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarSpec {
    pub name: String,
    #[serde(flatten)]
    pub attrs: DeclAttrs,
    #[serde(default, rename = "type")]
    pub annotation: Option<String>,
    #[serde(default)]
    pub init: Option<ExprSpec>,
    #[serde(default)]
    pub accessors: Vec<AccessorSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StmtSpec {
    Expr(ExprSpec),
    Let(VarSpec),
    Return(Option<ExprSpec>),
    Block(Vec<StmtSpec>),
    Func(FuncSpec),
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagicSpec {
    File,
    Function,
    Line,
    Column,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprSpec {
    Nil,
    Int(String),
    Float(String),
    Bool(bool),
    Char(char),
    String(String),
    Interpolated(Vec<ExprSpec>),
    Magic(MagicSpec),
    Array(Vec<ExprSpec>),
    Dict(Vec<(ExprSpec, ExprSpec)>),
    Ref(String),
    Call {
        callee: Box<ExprSpec>,
        #[serde(default)]
        args: Vec<ExprSpec>,
    },
    Closure(Vec<StmtSpec>),
}

// =============================================================================
// Loading
// =============================================================================

pub fn parse_manifest(source: &str) -> Result<Manifest> {
    serde_json::from_str(source).context("failed to parse unit manifest")
}

pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;
    parse_manifest(&source).with_context(|| format!("invalid manifest: {}", path.display()))
}

/// A built manifest, ready for checking.
#[derive(Debug)]
pub struct Project {
    pub ast: AstContext,
    pub stdlib: ModuleId,
    pub bridging_module: Option<String>,
}

impl Project {
    /// The unit with the given file name.
    #[must_use]
    pub fn find_unit(&self, file: &str) -> Option<UnitId> {
        self.units().find(|&unit| self.ast.unit(unit).file_name == file)
    }

    /// The first main unit, in manifest order.
    #[must_use]
    pub fn default_unit(&self) -> Option<UnitId> {
        self.units()
            .find(|&unit| self.ast.unit(unit).kind == UnitKind::Main)
    }

    pub fn units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.ast
            .modules()
            .flat_map(|(_, module)| module.units.iter().copied())
    }
}

impl Manifest {
    pub fn build(&self) -> Result<Project> {
        let mut builder = ProjectBuilder::default();

        let mut units: Vec<(UnitId, &UnitSpec)> = Vec::new();
        for module in &self.modules {
            let name = builder.ast.atom(&module.name);
            if builder.ast.module_named(name).is_some() {
                bail!("duplicate module '{}'", module.name);
            }
            let id = builder.ast.add_module(&module.name);
            for unit in &module.units {
                if units.iter().any(|(_, spec)| spec.file == unit.file) {
                    bail!("duplicate unit '{}'", unit.file);
                }
                units.push((builder.ast.add_unit(id, &unit.file, unit.kind.into()), unit));
            }
        }

        let stdlib = match &self.stdlib {
            Some(name) => builder
                .module(name)
                .with_context(|| format!("stdlib module '{name}' is not declared"))?,
            None => match builder.module(DEFAULT_STDLIB_NAME) {
                Some(module) => module,
                None => builder.add_prelude(DEFAULT_STDLIB_NAME),
            },
        };
        builder.ast.stdlib = Some(stdlib);

        for module in &self.modules {
            let Some(id) = builder.module(&module.name) else {
                continue;
            };
            for reexport in &module.reexports {
                let target = builder
                    .module(reexport)
                    .with_context(|| format!("module '{}' re-exports unknown module '{reexport}'", module.name))?;
                builder.ast.add_reexport(id, target);
            }
        }

        for &(unit, spec) in &units {
            for import in &spec.imports {
                let module = builder
                    .module(import)
                    .with_context(|| format!("unit '{}' imports unknown module '{import}'", spec.file))?;
                builder.ast.add_import(unit, module);
            }
            for decl in &spec.decls {
                builder
                    .add_decl(Place::TopLevel(unit), decl)
                    .with_context(|| format!("in unit '{}'", spec.file))?;
            }
        }

        builder.resolve_overrides()?;
        for path in &self.externals {
            let decl = builder
                .resolve_path(path)
                .with_context(|| format!("unknown external definition '{path}'"))?;
            builder.ast.add_external_definition(decl);
        }

        debug!(
            modules = self.modules.len(),
            decls = builder.ast.decl_count(),
            externals = self.externals.len(),
            "manifest built"
        );
        Ok(Project {
            ast: builder.ast,
            stdlib,
            bridging_module: self.bridging_module.clone(),
        })
    }
}

// =============================================================================
// Building
// =============================================================================

/// Where a new declaration goes.
#[derive(Copy, Clone, Debug)]
enum Place {
    TopLevel(UnitId),
    /// Member list of a type or extension.
    Member(DeclId),
    /// Inside the body of a function or top-level code.
    Local(DeclId),
}

#[derive(Default)]
struct ProjectBuilder {
    ast: AstContext,
    /// Next synthesized offset, per unit.
    offsets: Vec<u32>,
    overrides: Vec<(DeclId, String)>,
}

impl ProjectBuilder {
    fn module(&mut self, name: &str) -> Option<ModuleId> {
        let name = self.ast.atom(name);
        self.ast.module_named(name)
    }

    fn add_prelude(&mut self, name: &str) -> ModuleId {
        let module = self.ast.add_module(name);
        let unit = self
            .ast
            .add_unit(module, &format!("{}.sable", name.to_lowercase()), UnitKind::Library);
        for kind in KnownCapability::ALL {
            self.ast.add_top_level(
                unit,
                kind.source_name(),
                Span::INVALID,
                DeclKind::Protocol(NominalData::default()),
            );
        }
        self.ast
            .add_top_level(unit, "Bool", Span::INVALID, DeclKind::Struct(NominalData::default()));
        module
    }

    fn unit_of(&self, place: Place) -> UnitId {
        match place {
            Place::TopLevel(unit) => unit,
            Place::Member(parent) | Place::Local(parent) => self.ast.decl(parent).unit,
        }
    }

    /// A fresh span in `unit`; offsets increase in construction order so
    /// statement order and source order agree.
    fn next_span(&mut self, unit: UnitId) -> Span {
        let index = unit.0 as usize;
        if self.offsets.len() <= index {
            self.offsets.resize(index + 1, 0);
        }
        let start = self.offsets[index];
        self.offsets[index] += 1;
        Span::new(start, 1)
    }

    fn decl_span(&mut self, unit: UnitId, attrs: &DeclAttrs) -> Span {
        match attrs.span {
            Some(span) => {
                let index = unit.0 as usize;
                if self.offsets.len() <= index {
                    self.offsets.resize(index + 1, 0);
                }
                let end = span.start.saturating_add(span.length.max(1));
                self.offsets[index] = self.offsets[index].max(end);
                Span::new(span.start, span.length)
            }
            None => self.next_span(unit),
        }
    }

    fn place_decl(&mut self, place: Place, name: &str, span: Span, kind: DeclKind) -> DeclId {
        match place {
            Place::TopLevel(unit) => self.ast.add_top_level(unit, name, span, kind),
            Place::Member(parent) => self.ast.add_member(parent, name, span, kind),
            Place::Local(parent) => {
                let unit = self.ast.decl(parent).unit;
                self.ast.alloc_decl(unit, Some(parent), name, span, kind)
            }
        }
    }

    fn apply_attrs(&mut self, decl: DeclId, attrs: &DeclAttrs) {
        if let Some(access) = attrs.access {
            self.ast.set_access(decl, access.into());
        }
        if attrs.bridged {
            self.ast.mark_bridged(decl);
        }
        let flags = &mut self.ast.decl_mut(decl).flags;
        flags.set(DeclFlags::FINAL, attrs.is_final);
        flags.set(DeclFlags::DYNAMIC, attrs.dynamic);
        if let Some(path) = &attrs.overrides {
            self.overrides.push((decl, path.clone()));
        }
    }

    fn generic_params(&mut self, names: &[String], span: Span) -> Option<GenericParamListId> {
        if names.is_empty() {
            return None;
        }
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        Some(self.ast.add_generic_params(&names, span))
    }

    fn types(&mut self, texts: &[String], span: Span) -> Result<Vec<TypeRepr>> {
        texts.iter().map(|text| parse_type(&mut self.ast, text, span)).collect()
    }

    fn add_decl(&mut self, place: Place, spec: &DeclSpec) -> Result<DeclId> {
        let unit = self.unit_of(place);
        match spec {
            DeclSpec::Struct(n) => self.add_nominal(place, n, DeclKind::Struct),
            DeclSpec::Class(n) => self.add_nominal(place, n, DeclKind::Class),
            DeclSpec::Protocol(n) => self.add_nominal(place, n, DeclKind::Protocol),
            DeclSpec::Enum(e) => {
                let span = self.decl_span(unit, &e.attrs);
                let cases = e
                    .cases
                    .iter()
                    .map(|case| EnumCase {
                        name: self.ast.atom(&case.name),
                        has_payload: case.payload,
                    })
                    .collect();
                let raw_type = e
                    .raw_type
                    .as_deref()
                    .map(|text| parse_type(&mut self.ast, text, span))
                    .transpose()?;
                let data = EnumData {
                    cases,
                    raw_type,
                    ..EnumData::default()
                };
                let decl = self.place_decl(place, &e.name, span, DeclKind::Enum(data));
                let inherited = self.types(&e.inherits, span)?;
                self.ast.set_inherited(decl, inherited);
                self.apply_attrs(decl, &e.attrs);
                self.add_members(decl, &e.members)
                    .with_context(|| format!("in enum '{}'", e.name))?;
                Ok(decl)
            }
            DeclSpec::Extension(ext) => {
                if ext.path.is_empty() {
                    bail!("extension without a target path");
                }
                let mut refs = Vec::with_capacity(ext.path.len());
                for component in &ext.path {
                    let span = self.next_span(unit);
                    let generic_params = match &component.generics {
                        Some(names) => {
                            let names: Vec<&str> = names.iter().map(String::as_str).collect();
                            Some(self.ast.add_generic_params(&names, span))
                        }
                        None => None,
                    };
                    refs.push(ExtensionRef {
                        name: self.ast.atom(&component.name),
                        span,
                        generic_params,
                        bound: None,
                    });
                }
                let span = self.decl_span(unit, &ext.attrs);
                let data = ExtensionData {
                    refs: refs.into_iter().collect(),
                    ..ExtensionData::default()
                };
                let decl = self.place_decl(place, "", span, DeclKind::Extension(data));
                let inherited = self.types(&ext.inherits, span)?;
                self.ast.set_inherited(decl, inherited);
                self.apply_attrs(decl, &ext.attrs);
                self.add_members(decl, &ext.members)?;
                Ok(decl)
            }
            DeclSpec::Typealias(alias) => {
                let span = self.decl_span(unit, &alias.attrs);
                let underlying = parse_type(&mut self.ast, &alias.underlying, span)?;
                let decl = self.place_decl(
                    place,
                    &alias.name,
                    span,
                    DeclKind::TypeAlias(TypeAliasData { underlying }),
                );
                self.apply_attrs(decl, &alias.attrs);
                Ok(decl)
            }
            DeclSpec::Func(f) => self.add_function(place, f, FunctionFlavor::Func),
            DeclSpec::Init(f) => self.add_function(place, f, FunctionFlavor::Init),
            DeclSpec::Deinit(f) => self.add_function(place, f, FunctionFlavor::Deinit),
            DeclSpec::Var(var) => Ok(self.add_var(place, var)?.0),
            DeclSpec::Import(module) => {
                let span = self.next_span(unit);
                let module_name = self.ast.atom(module);
                Ok(self.place_decl(
                    place,
                    "",
                    span,
                    DeclKind::Import(ImportData {
                        module_name,
                        module: None,
                    }),
                ))
            }
            DeclSpec::Code(stmts) => {
                let Place::TopLevel(unit) = place else {
                    bail!("top-level code is only allowed directly in a unit");
                };
                let span = self.next_span(unit);
                let code = self.ast.alloc_decl(
                    unit,
                    None,
                    "",
                    span,
                    DeclKind::TopLevelCode(TopLevelCodeData::default()),
                );
                let body = self.build_body(code, stmts)?;
                if let DeclKind::TopLevelCode(data) = &mut self.ast.decl_mut(code).kind {
                    data.body = body;
                }
                self.ast.unit_mut(unit).decls.push(code);
                Ok(code)
            }
        }
    }

    fn add_nominal(
        &mut self,
        place: Place,
        spec: &NominalSpec,
        make: fn(NominalData) -> DeclKind,
    ) -> Result<DeclId> {
        let unit = self.unit_of(place);
        let span = self.decl_span(unit, &spec.attrs);
        let data = NominalData {
            generic_params: self.generic_params(&spec.generics, span),
            ..NominalData::default()
        };
        let decl = self.place_decl(place, &spec.name, span, make(data));
        let inherited = self.types(&spec.inherits, span)?;
        self.ast.set_inherited(decl, inherited);
        self.apply_attrs(decl, &spec.attrs);
        self.add_members(decl, &spec.members)
            .with_context(|| format!("in '{}'", spec.name))?;
        Ok(decl)
    }

    fn add_members(&mut self, parent: DeclId, members: &[DeclSpec]) -> Result<()> {
        for member in members {
            self.add_decl(Place::Member(parent), member)?;
        }
        Ok(())
    }

    fn add_function(&mut self, place: Place, spec: &FuncSpec, flavor: FunctionFlavor) -> Result<DeclId> {
        let unit = self.unit_of(place);
        let span = self.decl_span(unit, &spec.attrs);
        let kind = match place {
            Place::Member(_) => FunctionKind::Method,
            Place::TopLevel(_) | Place::Local(_) => FunctionKind::Free,
        };
        let mut data = FunctionData::new(kind, None);
        data.generic_params = self.generic_params(&spec.generics, span);
        let (name, kind) = match flavor {
            FunctionFlavor::Func => {
                if spec.name.is_empty() {
                    bail!("function without a name");
                }
                (spec.name.as_str(), DeclKind::Function(data))
            }
            FunctionFlavor::Init => ("init", DeclKind::Constructor(data)),
            FunctionFlavor::Deinit => ("deinit", DeclKind::Destructor(data)),
        };
        let func = self.place_decl(place, name, span, kind);
        self.apply_attrs(func, &spec.attrs);

        for param in &spec.params {
            let span = self.next_span(unit);
            let annotation = param
                .annotation
                .as_deref()
                .map(|text| parse_type(&mut self.ast, text, span))
                .transpose()?;
            self.ast.add_member(
                func,
                &param.name,
                span,
                DeclKind::Variable(VarData {
                    annotation,
                    accessors: Vec::new(),
                    is_parameter: true,
                }),
            );
        }

        if let Some(stmts) = &spec.body {
            let body = self
                .build_body(func, stmts)
                .with_context(|| format!("in the body of '{name}'"))?;
            if let Some(f) = self.ast.decl_mut(func).kind.function_mut() {
                f.body = Some(body);
            }
        }
        Ok(func)
    }

    /// Declare a variable and the pattern binding that introduces it.
    /// Returns `(variable, binding)`.
    fn add_var(&mut self, place: Place, spec: &VarSpec) -> Result<(DeclId, DeclId)> {
        let unit = self.unit_of(place);
        let span = self.decl_span(unit, &spec.attrs);
        let annotation = spec
            .annotation
            .as_deref()
            .map(|text| parse_type(&mut self.ast, text, span))
            .transpose()?;
        let kind = DeclKind::Variable(VarData {
            annotation: annotation.clone(),
            ..VarData::default()
        });
        // Variables are reached through their binding, so only members go
        // on a declaration list.
        let var = match place {
            Place::Member(parent) => self.ast.add_member(parent, &spec.name, span, kind),
            Place::TopLevel(unit) => self.ast.alloc_decl(unit, None, &spec.name, span, kind),
            Place::Local(parent) => self.ast.alloc_decl(unit, Some(parent), &spec.name, span, kind),
        };
        self.apply_attrs(var, &spec.attrs);
        for accessor in &spec.accessors {
            let kind = match accessor {
                AccessorSpec::Get => AccessorKind::Getter,
                AccessorSpec::Set => AccessorKind::Setter,
            };
            let span = self.next_span(unit);
            self.ast.add_accessor(var, kind, span);
        }

        let init = spec
            .init
            .as_ref()
            .map(|init| self.build_expr(place, init))
            .transpose()?;
        let pattern = match annotation {
            Some(annotation) => Pattern::Typed {
                sub: Box::new(Pattern::Named(var)),
                annotation,
            },
            None => Pattern::Named(var),
        };
        let binding = self.place_decl(
            place,
            "",
            span,
            DeclKind::PatternBinding(PatternBindingData {
                entries: vec![PatternBindingEntry { pattern, init }],
            }),
        );
        Ok((var, binding))
    }

    fn build_body(&mut self, owner: DeclId, stmts: &[StmtSpec]) -> Result<Body> {
        Ok(Body::new(self.build_stmts(owner, stmts)?))
    }

    fn build_stmts(&mut self, owner: DeclId, stmts: &[StmtSpec]) -> Result<Vec<Stmt>> {
        stmts.iter().map(|stmt| self.build_stmt(owner, stmt)).collect()
    }

    fn build_stmt(&mut self, owner: DeclId, spec: &StmtSpec) -> Result<Stmt> {
        Ok(match spec {
            StmtSpec::Expr(expr) => Stmt::Expr(self.build_expr(Place::Local(owner), expr)?),
            StmtSpec::Let(var) => Stmt::Decl(self.add_var(Place::Local(owner), var)?.1),
            StmtSpec::Return(value) => {
                let unit = self.ast.decl(owner).unit;
                let span = self.next_span(unit);
                let value = value
                    .as_ref()
                    .map(|value| self.build_expr(Place::Local(owner), value))
                    .transpose()?;
                Stmt::Return(value, span)
            }
            StmtSpec::Block(stmts) => Stmt::Brace(self.build_stmts(owner, stmts)?),
            StmtSpec::Func(f) => Stmt::Decl(self.add_function(Place::Local(owner), f, FunctionFlavor::Func)?),
        })
    }

    fn build_exprs(&mut self, place: Place, exprs: &[ExprSpec]) -> Result<Vec<Expr>> {
        exprs.iter().map(|expr| self.build_expr(place, expr)).collect()
    }

    /// Build an expression appearing at `place`; closures become children of
    /// the enclosing declaration.
    fn build_expr(&mut self, place: Place, spec: &ExprSpec) -> Result<Expr> {
        let unit = self.unit_of(place);
        let span = self.next_span(unit);
        let kind = match spec {
            ExprSpec::Nil => ExprKind::NilLiteral,
            ExprSpec::Int(text) => ExprKind::IntegerLiteral(text.clone()),
            ExprSpec::Float(text) => ExprKind::FloatLiteral(text.clone()),
            ExprSpec::Bool(value) => ExprKind::BooleanLiteral(*value),
            ExprSpec::Char(value) => ExprKind::CharacterLiteral(*value),
            ExprSpec::String(text) => ExprKind::StringLiteral(text.clone()),
            ExprSpec::Interpolated(parts) => ExprKind::InterpolatedStringLiteral(self.build_exprs(place, parts)?),
            ExprSpec::Magic(magic) => ExprKind::MagicIdentifier(match magic {
                MagicSpec::File => MagicIdentifierKind::File,
                MagicSpec::Function => MagicIdentifierKind::Function,
                MagicSpec::Line => MagicIdentifierKind::Line,
                MagicSpec::Column => MagicIdentifierKind::Column,
            }),
            ExprSpec::Array(elems) => ExprKind::Array(self.build_exprs(place, elems)?),
            ExprSpec::Dict(entries) => {
                let mut out = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    out.push((self.build_expr(place, key)?, self.build_expr(place, value)?));
                }
                ExprKind::Dictionary(out)
            }
            ExprSpec::Ref(name) => ExprKind::DeclRef(self.ast.atom(name)),
            ExprSpec::Call { callee, args } => ExprKind::Call {
                callee: Box::new(self.build_expr(place, callee)?),
                args: self.build_exprs(place, args)?,
            },
            ExprSpec::Closure(stmts) => {
                let parent = match place {
                    Place::Member(parent) | Place::Local(parent) => Some(parent),
                    Place::TopLevel(_) => None,
                };
                let closure = self.ast.alloc_decl(
                    unit,
                    parent,
                    "",
                    span,
                    DeclKind::Function(FunctionData::new(FunctionKind::Closure, None)),
                );
                let body = self.build_body(closure, stmts)?;
                if let Some(f) = self.ast.decl_mut(closure).kind.function_mut() {
                    f.body = Some(body);
                }
                ExprKind::Closure(closure)
            }
        };
        Ok(Expr::new(kind, span))
    }

    fn resolve_overrides(&mut self) -> Result<()> {
        for (decl, path) in std::mem::take(&mut self.overrides) {
            let parent = self
                .resolve_path(&path)
                .with_context(|| format!("'{}' overrides unknown declaration '{path}'", self.ast.name_of(decl)))?;
            if parent == decl {
                bail!("'{path}' cannot override itself");
            }
            self.ast.record_override(decl, parent);
        }
        Ok(())
    }

    /// Resolve `Outer.Inner.member`: the first component names a top-level
    /// declaration of any unit, the rest walk member lists.
    fn resolve_path(&self, path: &str) -> Option<DeclId> {
        let mut components = path.split('.');
        let first = components.next()?;
        let mut current = self
            .ast
            .modules()
            .flat_map(|(_, module)| module.units.iter())
            .flat_map(|&unit| self.ast.unit(unit).decls.iter().copied())
            .find(|&decl| self.ast.name_of(decl) == first)?;
        for component in components {
            current = self
                .ast
                .decl(current)
                .kind
                .members()
                .iter()
                .copied()
                .find(|&member| self.ast.name_of(member) == component)?;
        }
        Some(current)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionFlavor {
    Func,
    Init,
    Deinit,
}

// =============================================================================
// Type syntax
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
enum TypeToken {
    Ident(String),
    Punct(char),
    Arrow,
}

fn tokenize_type(text: &str) -> Result<Vec<TypeToken>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        match ch {
            c if c.is_whitespace() => {}
            '<' | '>' | ',' | '.' | '(' | ')' => tokens.push(TypeToken::Punct(ch)),
            '-' => {
                if chars.next_if(|&(_, c)| c == '>').is_none() {
                    bail!("expected '->' in type '{text}'");
                }
                tokens.push(TypeToken::Arrow);
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some((i, c)) = chars.next_if(|&(_, c)| c.is_alphanumeric() || c == '_') {
                    end = i + c.len_utf8();
                }
                tokens.push(TypeToken::Ident(text[start..end].to_string()));
            }
            other => bail!("unexpected '{other}' in type '{text}'"),
        }
    }
    Ok(tokens)
}

/// Parse `A.B<C, D>`, `(A, B)` or `(A) -> B`. Every component gets `span`.
pub fn parse_type(ast: &mut AstContext, text: &str, span: Span) -> Result<TypeRepr> {
    let mut parser = TypeParser {
        ast,
        tokens: tokenize_type(text)?,
        pos: 0,
        span,
        text,
    };
    let ty = parser.parse_type()?;
    if parser.pos != parser.tokens.len() {
        bail!("unexpected trailing input in type '{text}'");
    }
    Ok(ty)
}

struct TypeParser<'a> {
    ast: &'a mut AstContext,
    tokens: Vec<TypeToken>,
    pos: usize,
    span: Span,
    text: &'a str,
}

impl TypeParser<'_> {
    fn next(&mut self) -> Option<TypeToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &TypeToken) -> bool {
        if self.tokens.get(self.pos) == Some(expected) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn parse_type(&mut self) -> Result<TypeRepr> {
        if !self.eat(&TypeToken::Punct('(')) {
            return self.parse_ident();
        }
        let elems = self.parse_list(')')?;
        if self.eat(&TypeToken::Arrow) {
            let result = self.parse_type()?;
            return Ok(TypeRepr::Function {
                params: elems,
                result: Box::new(result),
                span: self.span,
            });
        }
        Ok(TypeRepr::Tuple(elems, self.span))
    }

    fn parse_list(&mut self, close: char) -> Result<Vec<TypeRepr>> {
        let mut items = Vec::new();
        if self.eat(&TypeToken::Punct(close)) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_type()?);
            if self.eat(&TypeToken::Punct(close)) {
                return Ok(items);
            }
            if !self.eat(&TypeToken::Punct(',')) {
                bail!("expected ',' or '{close}' in type '{}'", self.text);
            }
        }
    }

    fn parse_ident(&mut self) -> Result<TypeRepr> {
        let mut components = Vec::new();
        loop {
            let Some(TypeToken::Ident(name)) = self.next() else {
                bail!("expected a type name in '{}'", self.text);
            };
            let generic_args = if self.eat(&TypeToken::Punct('<')) {
                self.parse_list('>')?
            } else {
                Vec::new()
            };
            components.push(TypeComponent {
                name: self.ast.atom(&name),
                span: self.span,
                generic_args,
            });
            if !self.eat(&TypeToken::Punct('.')) {
                break;
            }
        }
        Ok(TypeRepr::Ident(components.into_iter().collect()))
    }
}
