//! The AST context: arena of declarations, modules and source units.
//!
//! `AstContext` is the single owner of every declaration. Checking sessions
//! borrow it mutably for their whole lifetime, which is how "only one session
//! touches a unit at a time" is enforced.

use crate::body::{Body, Pattern};
use crate::decl::{
    AccessorKind, Accessibility, Decl, DeclFlags, DeclId, DeclKind, FunctionData, FunctionKind,
    PatternBindingData, PatternBindingEntry, VarData,
};
use crate::types::{GenericParam, GenericParamList, GenericParamListId, TypeRepr};
use rustc_hash::FxHashSet;
use sable_common::{Atom, Interner, Span};
use tracing::trace;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnitKind {
    /// Program entry unit; may contain top-level code.
    Main,
    Library,
    /// Interactive unit checked incrementally, statement by statement.
    Repl,
}

/// How far a unit has progressed through the front end.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum UnitStage {
    Parsed,
    NameBound,
    TypeChecked,
}

#[derive(Clone, Debug)]
pub struct Module {
    pub name: Atom,
    pub units: Vec<UnitId>,
    /// Modules whose declarations importers of this module also see.
    pub reexports: Vec<ModuleId>,
}

#[derive(Clone, Debug)]
pub struct SourceUnit {
    pub file_name: String,
    pub module: ModuleId,
    pub kind: UnitKind,
    pub imports: Vec<ModuleId>,
    /// Top-level declarations in source order.
    pub decls: Vec<DeclId>,
    pub stage: UnitStage,
    /// Location of the first declaration carrying the bridging attribute.
    pub first_bridged_attr: Option<Span>,
}

#[derive(Debug, Default)]
pub struct AstContext {
    pub interner: Interner,
    decls: Vec<Decl>,
    generic_params: Vec<GenericParamList>,
    modules: Vec<Module>,
    units: Vec<SourceUnit>,
    /// The standard library module, when one has been loaded.
    pub stdlib: Option<ModuleId>,
    /// Declarations imported from outside the current compilation unit that
    /// still need local synchronization. Consumed by index, never truncated.
    pub external_definitions: Vec<DeclId>,
    /// Index of the first external definition no session has consumed yet.
    pub last_checked_external: usize,
}

impl AstContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Interning
    // =========================================================================

    pub fn atom(&mut self, text: &str) -> Atom {
        self.interner.intern(text)
    }

    #[must_use]
    pub fn text(&self, atom: Atom) -> &str {
        self.interner.resolve(atom)
    }

    #[must_use]
    pub fn name_of(&self, decl: DeclId) -> &str {
        self.interner.resolve(self.decl(decl).name)
    }

    // =========================================================================
    // Modules and units
    // =========================================================================

    pub fn add_module(&mut self, name: &str) -> ModuleId {
        let name = self.atom(name);
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(Module {
            name,
            units: Vec::new(),
            reexports: Vec::new(),
        });
        id
    }

    pub fn add_unit(&mut self, module: ModuleId, file_name: &str, kind: UnitKind) -> UnitId {
        let id = UnitId(self.units.len() as u32);
        self.units.push(SourceUnit {
            file_name: file_name.to_string(),
            module,
            kind,
            imports: Vec::new(),
            decls: Vec::new(),
            stage: UnitStage::Parsed,
            first_bridged_attr: None,
        });
        self.modules[module.0 as usize].units.push(id);
        id
    }

    pub fn add_import(&mut self, unit: UnitId, module: ModuleId) {
        let imports = &mut self.unit_mut(unit).imports;
        if !imports.contains(&module) {
            imports.push(module);
        }
    }

    pub fn add_reexport(&mut self, module: ModuleId, reexported: ModuleId) {
        self.modules[module.0 as usize].reexports.push(reexported);
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0 as usize]
    }

    #[must_use]
    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId(i as u32), m))
    }

    #[must_use]
    pub fn module_named(&self, name: Atom) -> Option<ModuleId> {
        self.modules
            .iter()
            .position(|m| m.name == name)
            .map(|i| ModuleId(i as u32))
    }

    #[must_use]
    pub fn unit(&self, id: UnitId) -> &SourceUnit {
        &self.units[id.0 as usize]
    }

    pub fn unit_mut(&mut self, id: UnitId) -> &mut SourceUnit {
        &mut self.units[id.0 as usize]
    }

    /// Modules whose declarations are visible from `unit`: its own module,
    /// the standard library, its imports, and everything those re-export.
    #[must_use]
    pub fn visible_modules(&self, unit: UnitId) -> Vec<ModuleId> {
        let source = self.unit(unit);
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut worklist: Vec<ModuleId> = Vec::new();
        worklist.push(source.module);
        worklist.extend(self.stdlib);
        worklist.extend(source.imports.iter().copied());
        // Depth-first, but keep the declared order for the roots.
        worklist.reverse();
        while let Some(module) = worklist.pop() {
            if !seen.insert(module) {
                continue;
            }
            out.push(module);
            for &re in self.module(module).reexports.iter().rev() {
                worklist.push(re);
            }
        }
        out
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    #[must_use]
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.index()]
    }

    #[must_use]
    pub fn get(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id.index())
    }

    #[must_use]
    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    pub fn decl_ids(&self) -> impl Iterator<Item = DeclId> {
        (0..self.decls.len() as u32).map(DeclId)
    }

    /// Allocate a declaration without attaching it to any container.
    pub fn alloc_decl(
        &mut self,
        unit: UnitId,
        parent: Option<DeclId>,
        name: &str,
        span: Span,
        kind: DeclKind,
    ) -> DeclId {
        let name = self.atom(name);
        let id = DeclId(self.decls.len() as u32);
        trace!(decl = id.0, kind = kind.name(), "alloc_decl");
        self.decls.push(Decl {
            kind,
            name,
            span,
            unit,
            parent,
            declared_access: None,
            access: None,
            flags: DeclFlags::empty(),
            overridden: None,
            inherited: Vec::new(),
        });
        id
    }

    /// Allocate a declaration and append it to the unit's top-level list.
    pub fn add_top_level(&mut self, unit: UnitId, name: &str, span: Span, kind: DeclKind) -> DeclId {
        let id = self.alloc_decl(unit, None, name, span, kind);
        self.unit_mut(unit).decls.push(id);
        id
    }

    /// Allocate a declaration and append it to `parent`'s member list.
    ///
    /// For a variable parent the new declaration becomes an accessor; for a
    /// function parent it becomes a parameter when it is a variable and is
    /// otherwise only parented (local declarations are placed by `Stmt::Decl`).
    pub fn add_member(&mut self, parent: DeclId, name: &str, span: Span, kind: DeclKind) -> DeclId {
        let unit = self.decl(parent).unit;
        let is_var = matches!(kind, DeclKind::Variable(_));
        let id = self.alloc_decl(unit, Some(parent), name, span, kind);
        match &mut self.decl_mut(parent).kind {
            DeclKind::Extension(ext) => ext.members.push(id),
            DeclKind::Variable(var) => var.accessors.push(id),
            DeclKind::Function(f) | DeclKind::Constructor(f) | DeclKind::Destructor(f) => {
                if is_var {
                    f.params.push(id);
                }
            }
            other => {
                if let Some(nominal) = other.nominal_mut() {
                    nominal.members.push(id);
                }
            }
        }
        id
    }

    /// Declare a stored property: a pattern binding naming one variable,
    /// both added as members of `parent`. Returns the variable.
    pub fn add_property(
        &mut self,
        parent: DeclId,
        name: &str,
        span: Span,
        annotation: Option<TypeRepr>,
    ) -> DeclId {
        let var = self.add_member(
            parent,
            name,
            span,
            DeclKind::Variable(VarData {
                annotation: annotation.clone(),
                ..VarData::default()
            }),
        );
        let pattern = match annotation {
            Some(annotation) => Pattern::Typed {
                sub: Box::new(Pattern::Named(var)),
                annotation,
            },
            None => Pattern::Named(var),
        };
        self.add_member(
            parent,
            "",
            span,
            DeclKind::PatternBinding(PatternBindingData {
                entries: vec![PatternBindingEntry {
                    pattern,
                    init: None,
                }],
            }),
        );
        var
    }

    /// Attach a getter or setter to a property.
    pub fn add_accessor(&mut self, storage: DeclId, kind: AccessorKind, span: Span) -> DeclId {
        let name = match kind {
            AccessorKind::Getter => "get",
            AccessorKind::Setter => "set",
        };
        self.add_member(
            storage,
            name,
            span,
            DeclKind::Function(FunctionData::new(
                FunctionKind::Accessor { kind, storage },
                Some(Body::default()),
            )),
        )
    }

    pub fn set_access(&mut self, decl: DeclId, access: Accessibility) {
        self.decl_mut(decl).declared_access = Some(access);
    }

    pub fn set_inherited(&mut self, decl: DeclId, inherited: Vec<TypeRepr>) {
        self.decl_mut(decl).inherited = inherited;
    }

    /// Record that `child` overrides `parent`.
    pub fn record_override(&mut self, child: DeclId, parent: DeclId) {
        self.decl_mut(child).overridden = Some(parent);
        self.decl_mut(parent).flags.insert(DeclFlags::OVERRIDDEN);
    }

    /// Mark a declaration as carrying the bridging attribute and remember the
    /// first such location for its unit.
    pub fn mark_bridged(&mut self, decl: DeclId) {
        let (unit, span) = {
            let d = self.decl_mut(decl);
            d.flags.insert(DeclFlags::BRIDGED);
            (d.unit, d.span)
        };
        let source = self.unit_mut(unit);
        if source.first_bridged_attr.is_none() {
            source.first_bridged_attr = Some(span);
        }
    }

    /// Queue a declaration imported from another compilation unit for local
    /// synchronization.
    pub fn add_external_definition(&mut self, decl: DeclId) {
        self.external_definitions.push(decl);
    }

    // =========================================================================
    // Generic parameter lists
    // =========================================================================

    pub fn add_generic_params(&mut self, names: &[&str], span: Span) -> GenericParamListId {
        let params = names
            .iter()
            .map(|name| GenericParam {
                name: self.interner.intern(name),
                span,
            })
            .collect();
        let id = GenericParamListId(self.generic_params.len() as u32);
        self.generic_params.push(GenericParamList {
            params,
            outer: None,
            span,
        });
        id
    }

    #[must_use]
    pub fn generic_params(&self, id: GenericParamListId) -> &GenericParamList {
        &self.generic_params[id.0 as usize]
    }

    pub fn generic_params_mut(&mut self, id: GenericParamListId) -> &mut GenericParamList {
        &mut self.generic_params[id.0 as usize]
    }

    /// Walk a generic parameter chain from `start` outward.
    #[must_use]
    pub fn generic_chain(&self, start: Option<GenericParamListId>) -> Vec<GenericParamListId> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        let mut current = start;
        while let Some(id) = current {
            if !seen.insert(id) {
                break;
            }
            out.push(id);
            current = self.generic_params(id).outer;
        }
        out
    }

    // =========================================================================
    // Structural queries
    // =========================================================================

    /// The nearest enclosing function of `decl`, excluding `decl` itself.
    #[must_use]
    pub fn enclosing_function(&self, decl: DeclId) -> Option<DeclId> {
        let mut current = self.decl(decl).parent;
        while let Some(id) = current {
            if self.decl(id).kind.function().is_some() {
                return Some(id);
            }
            current = self.decl(id).parent;
        }
        None
    }

    /// True when `inner` is lexically nested (at any depth) inside `outer`.
    #[must_use]
    pub fn is_nested_in(&self, inner: DeclId, outer: DeclId) -> bool {
        let mut current = self.decl(inner).parent;
        while let Some(id) = current {
            if id == outer {
                return true;
            }
            current = self.decl(id).parent;
        }
        false
    }

    /// The class a member belongs to, directly or through a bound extension.
    #[must_use]
    pub fn enclosing_class(&self, decl: DeclId) -> Option<DeclId> {
        let parent = self.decl(decl).parent?;
        match &self.decl(parent).kind {
            DeclKind::Class(_) => Some(parent),
            DeclKind::Extension(ext) => {
                let nominal = ext.extended_type.as_ref()?.any_nominal()?;
                matches!(self.decl(nominal).kind, DeclKind::Class(_)).then_some(nominal)
            }
            _ => None,
        }
    }
}
