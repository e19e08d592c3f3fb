//! Module loading seam.
//!
//! A `ModuleLoader` brings declarations from other compilation units into the
//! context. It needs type resolution for what it imports but must not depend
//! on the checker, so the active checking session lends it a `LazyResolver`
//! for the duration of each call.

use crate::context::{AstContext, ModuleId};
use crate::decl::DeclId;
use tracing::debug;

/// Callback through which imported declarations request type resolution.
pub trait LazyResolver {
    fn resolve_declaration(&mut self, ast: &mut AstContext, decl: DeclId);
}

pub trait ModuleLoader {
    /// Import whatever the loader has queued since the last call. Each
    /// imported declaration is appended to `ast.external_definitions` and
    /// reported to `resolver`.
    fn import_pending(&mut self, ast: &mut AstContext, resolver: &mut dyn LazyResolver);

    /// Modules this loader has produced.
    fn loaded_modules(&self) -> &[ModuleId];

    /// Consistency check over loaded modules. Returns a description of every
    /// violation found.
    fn verify_all_modules(&self, ast: &AstContext) -> Vec<String> {
        let mut problems = Vec::new();
        for &module in self.loaded_modules() {
            for &unit in &ast.module(module).units {
                if ast.unit(unit).module != module {
                    problems.push(format!(
                        "unit '{}' listed under module '{}' belongs elsewhere",
                        ast.unit(unit).file_name,
                        ast.text(ast.module(module).name)
                    ));
                }
            }
        }
        problems
    }
}

/// Loader that imports declarations queued up front by the embedder.
#[derive(Debug, Default)]
pub struct QueuedModuleLoader {
    pending: Vec<DeclId>,
    loaded: Vec<ModuleId>,
}

impl QueuedModuleLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_module(&mut self, module: ModuleId) {
        if !self.loaded.contains(&module) {
            self.loaded.push(module);
        }
    }

    pub fn queue_import(&mut self, decl: DeclId) {
        self.pending.push(decl);
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl ModuleLoader for QueuedModuleLoader {
    fn import_pending(&mut self, ast: &mut AstContext, resolver: &mut dyn LazyResolver) {
        for decl in std::mem::take(&mut self.pending) {
            debug!(decl = decl.0, name = ast.name_of(decl), "importing external definition");
            ast.add_external_definition(decl);
            resolver.resolve_declaration(ast, decl);
        }
    }

    fn loaded_modules(&self) -> &[ModuleId] {
        &self.loaded
    }
}
