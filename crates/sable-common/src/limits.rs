//! Centralized limits and thresholds for the checker.
//!
//! Shared constants for recursion depths and iteration counts used by the
//! scheduling loop and the declaration walks. Keeping them here prevents
//! duplicate definitions with inconsistent values.

// =============================================================================
// Iteration Limits
// =============================================================================

/// Maximum number of rounds of the checking fixpoint loop.
///
/// Each round drains the external-definition queue, the function-body queue
/// and the validated-types stack, then merges synthesized functions. For an
/// acyclic synthesis graph the round count is bounded by the synthesis depth,
/// which in practice is a handful of rounds. Hitting this limit means a
/// synthesizer keeps producing work for itself; the session stops the loop
/// and reports an internal error instead of spinning forever.
pub const MAX_CHECKING_ROUNDS: u32 = 10_000;

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum number of override links followed when deciding whether a
/// `dynamic` attribute was inferred.
///
/// Override chains are acyclic for well-formed input, but the chain is built
/// by external checking code; this bound keeps a malformed graph from
/// overflowing the stack.
pub const MAX_OVERRIDE_CHAIN_DEPTH: u32 = 256;

/// Maximum number of type aliases looked through when resolving a type path.
///
/// ```text
/// typealias A = B
/// typealias B = A   // cycle: resolution stops after this many hops
/// ```
pub const MAX_ALIAS_RESOLUTION_DEPTH: usize = 64;

/// Maximum lexical nesting followed by unqualified lookup.
pub const MAX_SCOPE_DEPTH: u32 = 512;
