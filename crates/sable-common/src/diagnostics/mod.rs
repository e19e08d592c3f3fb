//! Diagnostic types and message lookup for the checker.
//!
//! Message data lives in `data.rs`. Templates use `{0}`, `{1}`, ...
//! placeholders that `format_message` fills in.

use crate::span::Span;
use serde::Serialize;

mod data;
pub use data::{DIAGNOSTIC_MESSAGES, diagnostic_codes, diagnostic_messages};

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Suggestion = 2,
    Message = 3,
}

/// Related information for a diagnostic (e.g., "see also" locations).
#[derive(Clone, Debug, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
}

/// A checking diagnostic message with optional related information.
#[derive(Clone, Debug, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
    /// Related information spans (e.g., where an extended type was declared)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub const fn error(file: String, start: u32, length: u32, message: String, code: u32) -> Self {
        Self {
            file,
            start,
            length,
            message_text: message,
            category: DiagnosticCategory::Error,
            code,
            related_information: Vec::new(),
        }
    }

    /// Create a diagnostic from a registered code, formatting its template.
    ///
    /// Unknown codes produce an error whose text is the raw arguments joined
    /// with spaces, so a missing table entry never loses information.
    #[must_use]
    pub fn from_code(file: impl Into<String>, span: Span, code: u32, args: &[&str]) -> Self {
        let (category, message_text) = match get_diagnostic_message(code) {
            Some(msg) => (msg.category, format_message(msg.message, args)),
            None => (DiagnosticCategory::Error, args.join(" ")),
        };
        Self {
            file: file.into(),
            start: span.start,
            length: span.length,
            message_text,
            category,
            code,
            related_information: Vec::new(),
        }
    }

    /// Add related information to this diagnostic.
    #[must_use]
    pub fn with_related(mut self, file: String, start: u32, length: u32, message: String) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            file,
            start,
            length,
            message_text: message,
            category: DiagnosticCategory::Message,
            code: 0,
        });
        self
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

/// Get the message template for a diagnostic code.
#[must_use]
pub fn get_message_template(code: u32) -> Option<&'static str> {
    get_diagnostic_message(code).map(|m| m.message)
}

// =============================================================================
// Diagnostic Sink
// =============================================================================

/// Whether a sink keeps what it is given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkMode {
    Collect,
    /// Speculative checks (code completion, bounded body checks) run with a
    /// sink that swallows everything.
    Discard,
}

/// Destination for diagnostics produced during one checking session.
#[derive(Clone, Debug)]
pub struct DiagnosticSink {
    mode: SinkMode,
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::collecting()
    }
}

impl DiagnosticSink {
    #[must_use]
    pub const fn collecting() -> Self {
        Self {
            mode: SinkMode::Collect,
            diagnostics: Vec::new(),
            error_count: 0,
        }
    }

    #[must_use]
    pub const fn discarding() -> Self {
        Self {
            mode: SinkMode::Discard,
            diagnostics: Vec::new(),
            error_count: 0,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> SinkMode {
        self.mode
    }

    /// Record a diagnostic. Errors are counted even when discarded so that
    /// speculative callers can still ask whether anything went wrong.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.error_count += 1;
        }
        match self.mode {
            SinkMode::Collect => self.diagnostics.push(diagnostic),
            SinkMode::Discard => {}
        }
    }

    #[must_use]
    pub fn had_error(&self) -> bool {
        self.error_count > 0
    }

    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.error_count
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn has_code(&self, code: u32) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
