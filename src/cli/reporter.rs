use colored::Colorize;
use rustc_hash::FxHashMap;
use std::path::PathBuf;

use sable_common::{Diagnostic, DiagnosticCategory};
use sable_common::diagnostics::DiagnosticRelatedInformation;

/// Renders diagnostics for a terminal.
///
/// Unit files are looked up under `root`; when a file can be read, locations
/// are shown as `file:line:column` with an underlined snippet, and otherwise
/// as `file@offset`.
pub struct Reporter {
    color: bool,
    root: Option<PathBuf>,
    sources: FxHashMap<String, Option<SourceText>>,
}

struct SourceText {
    text: String,
    /// Byte offset of the first character of each line.
    line_starts: Vec<u32>,
}

impl SourceText {
    fn new(text: String) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.char_indices()
                .filter(|&(_, ch)| ch == '\n')
                .map(|(i, _)| i as u32 + 1),
        );
        Self { text, line_starts }
    }

    /// One-based line and column of `offset`.
    fn position(&self, offset: u32) -> Option<(u32, u32)> {
        if offset as usize > self.text.len() {
            return None;
        }
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let column = offset - self.line_starts[line];
        Some((line as u32 + 1, column + 1))
    }

    fn line(&self, line: u32) -> Option<&str> {
        self.text.lines().nth(line.checked_sub(1)? as usize)
    }
}

impl Reporter {
    pub fn new(color: bool, root: Option<PathBuf>) -> Self {
        Reporter {
            color,
            root,
            sources: FxHashMap::default(),
        }
    }

    pub fn render(&mut self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for (index, diagnostic) in diagnostics.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&self.format_diagnostic(diagnostic));
        }
        out
    }

    pub fn format_diagnostic(&mut self, diagnostic: &Diagnostic) -> String {
        let mut output = self.format_location(&diagnostic.file, diagnostic.start);
        output.push_str(" - ");
        output.push_str(&self.format_category(diagnostic.category));
        let code = self.format_code(diagnostic.code);
        if !code.is_empty() {
            output.push(' ');
            output.push_str(&code);
        }
        output.push_str(": ");
        output.push_str(&diagnostic.message_text);

        if let Some(snippet) = self.format_snippet(&diagnostic.file, diagnostic.start, diagnostic.length) {
            output.push_str(&snippet);
        }

        for related in &diagnostic.related_information {
            output.push('\n');
            output.push_str(&self.format_related(related));
        }
        output
    }

    /// One-line summary, e.g. `Found 2 errors in main.sable.`
    pub fn format_summary(&self, diagnostics: &[Diagnostic], file: &str) -> String {
        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        let noun = if errors == 1 { "error" } else { "errors" };
        let text = format!("Found {errors} {noun} in {file}.");
        if self.color && errors > 0 {
            text.red().to_string()
        } else {
            text
        }
    }

    /// Source line with the span underlined:
    ///   12   let x = y
    ///                ~
    fn format_snippet(&mut self, file: &str, start: u32, length: u32) -> Option<String> {
        if length == 0 {
            return None;
        }
        let color = self.color;
        let source = self.source(file)?;
        let (line, column) = source.position(start)?;
        let text = source.line(line)?;

        let mut underline = String::new();
        let first = column as usize - 1;
        for (i, ch) in text.char_indices() {
            if i < first {
                underline.push_str(if ch == '\t' { "    " } else { " " });
            } else if i < first + length as usize {
                underline.push_str(if ch == '\t' { "~~~~" } else { "~" });
            } else {
                break;
            }
        }
        if !underline.contains('~') {
            underline.push('~');
        }
        let underline = if color {
            underline.red().to_string()
        } else {
            underline
        };
        Some(format!("\n  {line:>3}   {text}\n        {underline}"))
    }

    fn format_related(&mut self, related: &DiagnosticRelatedInformation) -> String {
        let location = self.format_location(&related.file, related.start);
        let prefix = if self.color {
            "  Related".dimmed().to_string()
        } else {
            "  Related".to_string()
        };
        format!("{prefix}: {location} - {}", related.message_text)
    }

    fn format_location(&mut self, file: &str, offset: u32) -> String {
        if file.is_empty() {
            return "<unknown>".to_string();
        }
        match self.source(file).and_then(|source| source.position(offset)) {
            Some((line, column)) => format!("{file}:{line}:{column}"),
            None if offset == u32::MAX => file.to_string(),
            None => format!("{file}@{offset}"),
        }
    }

    fn source(&mut self, file: &str) -> Option<&SourceText> {
        if file.is_empty() {
            return None;
        }
        if !self.sources.contains_key(file) {
            let path = match &self.root {
                Some(root) => root.join(file),
                None => PathBuf::from(file),
            };
            let source = std::fs::read_to_string(path).ok().map(SourceText::new);
            self.sources.insert(file.to_string(), source);
        }
        self.sources.get(file)?.as_ref()
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = match category {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        };
        if !self.color {
            return label.to_string();
        }
        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Suggestion => label.blue().bold().to_string(),
            DiagnosticCategory::Message => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        if code == 0 {
            return String::new();
        }
        let label = format!("SB{code}");
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }
}
