//! Semantic-analysis driver for the sable compiler front end.
//!
//! This crate schedules checking work over the `sable-ast` declaration arena:
//! - `state` / `state_checking` - `TypeCheckingSession` and the fixpoint loop
//! - `extension_binder` - attaching extensions to their target types
//! - `known_capabilities` - the capability registry and the syntactic gate
//! - `literal_capability` - literal forms to required capabilities
//! - `declarations` - validation and kind dispatch, external definitions
//! - `finality` - finality inference over a checked module
//! - `entry_points` - whole-unit and tooling entry points
//!
//! Name binding, lookup, signature validation, body checking and member
//! synthesis are collaborators (`services`), with reference implementations
//! in `name_lookup`, `signature`, `body_checker` and `synthesis`.

pub mod body_checker;
pub mod context;
pub mod declarations;
pub mod entry_points;
pub mod extension_binder;
pub mod finality;
pub mod known_capabilities;
pub mod literal_capability;
pub mod name_lookup;
pub mod services;
pub mod signature;
pub mod state;
pub mod state_checking;
pub mod synthesis;
pub mod top_level;
pub mod type_resolution;
pub mod verifier;

pub use context::{CheckerContext, CheckerOptions, CheckerStatistics, WorkQueues};
pub use entry_points::{
    CheckOutcome, perform_type_checking, perform_type_loc_checking, type_check_completion_context_expr,
    type_check_completion_decl, type_check_external_definitions, type_check_function_body_until,
    type_check_top_level_code_decl,
};
pub use finality::{FinalityInference, is_inferred_dynamic, perform_whole_module_checks};
pub use known_capabilities::{CapabilityRegistry, KnownCapability, may_conform_to_known_capability};
pub use literal_capability::literal_capability;
pub use services::{
    BodyChecker, CheckerServices, LookupResult, LookupScope, MemberSynthesizer, NameBinder, NameLookup,
    SignatureValidator,
};
pub use state::TypeCheckingSession;
pub use top_level::TopLevelContext;
pub use verifier::verify_unit;

#[cfg(test)]
pub(crate) mod test_fixtures;

#[cfg(test)]
#[path = "../tests/driver_tests.rs"]
mod driver_tests;
#[cfg(test)]
#[path = "../tests/entry_point_tests.rs"]
mod entry_point_tests;
#[cfg(test)]
#[path = "../tests/extension_binder_tests.rs"]
mod extension_binder_tests;
#[cfg(test)]
#[path = "../tests/finality_tests.rs"]
mod finality_tests;
#[cfg(test)]
#[path = "../tests/known_capability_tests.rs"]
mod known_capability_tests;
#[cfg(test)]
#[path = "../tests/literal_capability_tests.rs"]
mod literal_capability_tests;
#[cfg(test)]
#[path = "../tests/name_lookup_tests.rs"]
mod name_lookup_tests;
