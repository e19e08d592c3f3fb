//! Checker context: options, work queues and per-session state.

use crate::known_capabilities::CapabilityRegistry;
use rustc_hash::{FxHashMap, FxHashSet};
use sable_ast::{AstContext, DeclId, ModuleId, Type, UnitId};
use sable_common::DiagnosticSink;
use sable_common::limits::MAX_CHECKING_ROUNDS;

/// Options that affect checking behavior.
#[derive(Clone, Debug)]
pub struct CheckerOptions {
    /// All files of the module are checked together, which widens what
    /// `internal` visibility permits for finality inference.
    pub whole_module: bool,
    /// Diagnose bridged declarations in a main unit that does not import
    /// `bridging_module_name`.
    pub bridging_attr_requires_module: bool,
    pub bridging_module_name: String,
    /// Upper bound on fixpoint rounds before checking gives up.
    pub max_checking_rounds: u32,
    /// Run the post-check verifier.
    pub verify: bool,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            whole_module: false,
            bridging_attr_requires_module: true,
            bridging_module_name: "Interop".to_string(),
            max_checking_rounds: MAX_CHECKING_ROUNDS,
            verify: true,
        }
    }
}

/// Work lists drained by the fixpoint loop.
///
/// `defined_functions` is append-only; `current_function` marks how far body
/// checking has progressed. `validated_types` is a LIFO stack.
/// External definitions live on the `AstContext` so their cursor survives
/// across sessions.
#[derive(Debug, Default)]
pub struct WorkQueues {
    pub defined_functions: Vec<DeclId>,
    pub current_function: usize,
    pub validated_types: Vec<DeclId>,
    pub implicitly_defined_functions: Vec<DeclId>,
    queued: FxHashSet<DeclId>,
}

impl WorkQueues {
    /// Queue a function for body checking once.
    pub fn define_function(&mut self, func: DeclId) -> bool {
        if !self.queued.insert(func) {
            return false;
        }
        self.defined_functions.push(func);
        true
    }

    pub fn add_implicit_function(&mut self, func: DeclId) {
        self.implicitly_defined_functions.push(func);
    }

    /// Move synthesized functions onto the defined list.
    pub fn merge_implicit_functions(&mut self) {
        for func in std::mem::take(&mut self.implicitly_defined_functions) {
            self.define_function(func);
        }
    }

    #[must_use]
    pub fn has_pending_functions(&self) -> bool {
        self.current_function < self.defined_functions.len()
    }
}

/// Counters for one session; exposed for tests and `--json` output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckerStatistics {
    pub rounds: u32,
    pub bodies_checked: u32,
    pub externals_processed: u32,
    pub types_revalidated: u32,
}

/// State shared by every checking step of one session.
pub struct CheckerContext<'a> {
    pub ast: &'a mut AstContext,
    pub options: CheckerOptions,
    pub diagnostics: DiagnosticSink,
    pub queues: WorkQueues,
    pub capabilities: CapabilityRegistry,
    pub stats: CheckerStatistics,
    /// Types inferred for unannotated variables.
    pub var_types: FxHashMap<DeclId, Type>,
    /// Unit being checked, if any. Standalone entry points run without one.
    pub unit: Option<UnitId>,
    /// Whether the bridging module is visible from `unit`.
    pub imports_bridging_module: bool,
    pub(crate) stdlib_module: Option<ModuleId>,
    pub(crate) bool_type: Option<Option<Type>>,
}

impl<'a> CheckerContext<'a> {
    pub fn new(ast: &'a mut AstContext, options: CheckerOptions, diagnostics: DiagnosticSink) -> Self {
        Self {
            ast,
            options,
            diagnostics,
            queues: WorkQueues::default(),
            capabilities: CapabilityRegistry::default(),
            stats: CheckerStatistics::default(),
            var_types: FxHashMap::default(),
            unit: None,
            imports_bridging_module: false,
            stdlib_module: None,
            bool_type: None,
        }
    }

    /// File name used for diagnostics about `decl`.
    #[must_use]
    pub fn file_of(&self, decl: DeclId) -> &str {
        &self.ast.unit(self.ast.decl(decl).unit).file_name
    }

    /// File name of the unit under check, or empty for standalone checks.
    #[must_use]
    pub fn current_file(&self) -> &str {
        self.unit
            .map_or("", |unit| self.ast.unit(unit).file_name.as_str())
    }
}
