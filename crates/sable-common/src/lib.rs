//! Common types and utilities for the sable compiler front end.
//!
//! This crate provides foundational types used across all sable crates:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`)
//! - Checker limits and thresholds
//! - Diagnostics (`Diagnostic`, `DiagnosticSink`, codes and message templates)

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Centralized limits and thresholds
pub mod limits;

pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticSink, SinkMode, diagnostic_codes,
    diagnostic_messages, format_message,
};

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod diagnostics_tests;
#[cfg(test)]
#[path = "../tests/interner_tests.rs"]
mod interner_tests;
