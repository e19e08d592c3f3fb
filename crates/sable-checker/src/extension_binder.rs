//! Attaching extensions to the types they extend.
//!
//! An extension names its target through a dotted path (`Outer<T>.Inner`).
//! Binding resolves the path, checks the generic parameters written on each
//! component against the component's type, chains those parameter lists
//! through their `outer` links, and registers the extension with the target.
//!
//! Failures are local to the extension: it is marked invalid and its
//! extended type becomes `Type::Error`.

use crate::services::LookupScope;
use crate::state::TypeCheckingSession;
use crate::type_resolution::ComponentResolution;
use sable_ast::{DeclId, ExtensionRef, ExtensionState, GenericParamListId, Type};
use sable_common::{Diagnostic, diagnostic_codes, diagnostic_messages, format_message};
use tracing::{Level, debug, span};

impl TypeCheckingSession<'_> {
    /// Bind `ext` to its target type. Already-bound extensions are left
    /// alone and report their current state.
    pub fn bind_extension(&mut self, ext: DeclId) -> ExtensionState {
        let Some(data) = self.ctx.ast.decl(ext).kind.extension() else {
            return ExtensionState::Invalid;
        };
        if data.extended_type.is_some() {
            return data.state;
        }
        let refs = data.refs.clone();
        let _span = span!(Level::DEBUG, "bind_extension", ext = ext.0).entered();

        // `.Type` names a metatype, which can never be extended.
        if let Some(pos) = refs
            .iter()
            .skip(1)
            .position(|r| self.ctx.ast.text(r.name) == "Type")
        {
            let base = &refs[pos];
            let name = self.ctx.ast.text(base.name).to_string();
            self.error_at(ext, refs[pos + 1].span, diagnostic_codes::EXTENSION_METATYPE, &[&name]);
            return self.invalidate_extension(ext);
        }

        let Some(resolved) = self.resolve_extension_path(ext, &refs) else {
            return self.invalidate_extension(ext);
        };

        let mut refs = refs;
        let mut outer: Option<GenericParamListId> = None;
        for (i, ty) in resolved.iter().enumerate() {
            let Some(params) = refs[i].generic_params else {
                // Arity for a generic target without written parameters is
                // enforced when the generic environment is requested.
                continue;
            };
            let name = self.ctx.ast.text(refs[i].name).to_string();
            let param_span = self.ctx.ast.generic_params(params).span;

            let nominal = match ty {
                Type::Nominal(decl) | Type::UnboundGeneric(decl) => *decl,
                _ => {
                    self.error_at(
                        ext,
                        param_span,
                        diagnostic_codes::EXTENSION_GENERIC_PARAMS_FOR_NON_GENERIC,
                        &[&name],
                    );
                    refs[i].generic_params = None;
                    continue;
                }
            };

            let Some(target_params) = self.ctx.ast.decl(nominal).kind.generic_params() else {
                self.diagnose_params_on_non_generic(ext, nominal, &refs[i], &name);
                refs[i].generic_params = None;
                continue;
            };

            let have = self.ctx.ast.generic_params(params).len();
            let expected = self.ctx.ast.generic_params(target_params).len();
            if have != expected {
                let direction = if have > expected { "many" } else { "few" };
                self.error_at(
                    ext,
                    param_span,
                    diagnostic_codes::EXTENSION_GENERIC_WRONG_NUMBER_OF_PARAMETERS,
                    &[&name, direction, &have.to_string(), &expected.to_string()],
                );
                return self.invalidate_extension(ext);
            }

            self.ctx.ast.generic_params_mut(params).outer = outer;
            outer = Some(params);
        }

        let Some(extended) = resolved.last().cloned() else {
            return self.invalidate_extension(ext);
        };
        if !extended.is_extendable() {
            let name = extended.display(self.ctx.ast);
            let span = self.ctx.ast.decl(ext).span;
            self.error_at(ext, span, diagnostic_codes::NON_NOMINAL_EXTENSION, &[&name]);
            return self.invalidate_extension(ext);
        }

        for (r, ty) in refs.iter_mut().zip(&resolved) {
            r.bound = Some(ty.clone());
        }
        let nominal = extended.any_nominal();
        if let Some(data) = self.ctx.ast.decl_mut(ext).kind.extension_mut() {
            data.refs = refs;
            data.generic_params = outer;
            data.extended_type = Some(extended);
            data.state = ExtensionState::Bound;
        }
        if let Some(nominal) = nominal
            && let Some(target) = self.ctx.ast.decl_mut(nominal).kind.nominal_mut()
        {
            target.extensions.push(ext);
        }
        debug!(ext = ext.0, target = ?nominal, "extension bound");
        ExtensionState::Bound
    }

    /// Resolve every path component. Reports and returns `None` on the first
    /// component that is missing or not a type.
    fn resolve_extension_path(&mut self, ext: DeclId, refs: &[ExtensionRef]) -> Option<Vec<Type>> {
        let scope = LookupScope::around(self.ctx.ast, ext);
        let mut resolved: Vec<Type> = Vec::with_capacity(refs.len());
        for r in refs {
            let code = match self.resolve_path_component(resolved.last(), r.name, scope, 0) {
                ComponentResolution::Type(ty) if !ty.is_error() => {
                    resolved.push(ty);
                    continue;
                }
                ComponentResolution::Type(_) => return None,
                ComponentResolution::NotAType(_) => diagnostic_codes::NOT_A_TYPE,
                ComponentResolution::Missing => diagnostic_codes::CANNOT_FIND_TYPE_IN_SCOPE,
            };
            let name = self.ctx.ast.text(r.name).to_string();
            self.error_at(ext, r.span, code, &[&name]);
            return None;
        }
        Some(resolved)
    }

    fn diagnose_params_on_non_generic(&mut self, ext: DeclId, nominal: DeclId, component: &ExtensionRef, name: &str) {
        let span = component
            .generic_params
            .map_or(component.span, |params| self.ctx.ast.generic_params(params).span);
        let nominal_span = self.ctx.ast.decl(nominal).span;
        let note = format_message(diagnostic_messages::EXTENDED_TYPE_HERE, &[name]);
        let diagnostic = Diagnostic::from_code(
            self.ctx.file_of(ext),
            span,
            diagnostic_codes::EXTENSION_GENERIC_PARAMS_FOR_NON_GENERIC_TYPE,
            &[name],
        )
        .with_related(
            self.ctx.file_of(nominal).to_string(),
            nominal_span.start,
            nominal_span.length,
            note,
        );
        self.push_diagnostic(diagnostic);
    }

    fn invalidate_extension(&mut self, ext: DeclId) -> ExtensionState {
        let decl = self.ctx.ast.decl_mut(ext);
        decl.set_invalid();
        let previous = decl.kind.extension_mut().and_then(|data| {
            data.state = ExtensionState::Invalid;
            data.extended_type.replace(Type::Error)
        });
        // A lazily rejected extension was already registered with its target.
        if let Some(nominal) = previous.as_ref().and_then(Type::any_nominal)
            && let Some(target) = self.ctx.ast.decl_mut(nominal).kind.nominal_mut()
        {
            target.extensions.retain(|&e| e != ext);
        }
        debug!(ext = ext.0, "extension invalid");
        ExtensionState::Invalid
    }

    /// The generic parameter chain visible inside a bound extension.
    ///
    /// A path component naming a generic type without writing its parameters
    /// is accepted by binding; it is rejected here, when something actually
    /// needs the extension's generic environment.
    pub fn extension_generic_environment(&mut self, ext: DeclId) -> Option<GenericParamListId> {
        let data = self.ctx.ast.decl(ext).kind.extension()?;
        if data.state != ExtensionState::Bound {
            return None;
        }
        let chain = data.generic_params;
        let missing = data.refs.iter().find_map(|r| match (&r.bound, r.generic_params) {
            (Some(Type::UnboundGeneric(nominal)), None) => Some((r.name, r.span, *nominal)),
            _ => None,
        });
        let Some((name, span, nominal)) = missing else {
            return chain;
        };
        let expected = self
            .ctx
            .ast
            .decl(nominal)
            .kind
            .generic_params()
            .map_or(0, |params| self.ctx.ast.generic_params(params).len());
        let name = self.ctx.ast.text(name).to_string();
        self.error_at(
            ext,
            span,
            diagnostic_codes::EXTENSION_GENERIC_WRONG_NUMBER_OF_PARAMETERS,
            &[&name, "few", "0", &expected.to_string()],
        );
        self.invalidate_extension(ext);
        None
    }
}
