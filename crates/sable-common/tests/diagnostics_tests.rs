use super::*;
use crate::diagnostics::get_message_template;

#[test]
fn test_format_message_fills_positional_placeholders() {
    let text = format_message("'{0}' has too {1} parameters ({0})", &["Pair", "many"]);
    assert_eq!(text, "'Pair' has too many parameters (Pair)");
}

#[test]
fn test_every_registered_code_has_a_unique_entry() {
    let mut codes: Vec<u32> = diagnostics::DIAGNOSTIC_MESSAGES
        .iter()
        .map(|m| m.code)
        .collect();
    let total = codes.len();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), total);
    assert!(get_message_template(diagnostic_codes::NON_NOMINAL_EXTENSION).is_some());
}

#[test]
fn test_from_code_uses_template_and_category() {
    let diag = Diagnostic::from_code(
        "main.sable",
        Span::new(4, 3),
        diagnostic_codes::EXTENDED_TYPE_HERE,
        &["Point"],
    );
    assert_eq!(diag.start, 4);
    assert_eq!(diag.length, 3);
    assert_eq!(diag.category, DiagnosticCategory::Message);
    assert_eq!(diag.message_text, "Extended type 'Point' declared here.");
}

#[test]
fn test_discarding_sink_counts_errors_but_keeps_nothing() {
    let mut sink = DiagnosticSink::discarding();
    sink.push(Diagnostic::from_code(
        "a.sable",
        Span::at(0),
        diagnostic_codes::CANNOT_FIND_TYPE_IN_SCOPE,
        &["Q"],
    ));
    assert!(sink.had_error());
    assert!(sink.diagnostics().is_empty());
    assert_eq!(sink.mode(), SinkMode::Discard);
}

#[test]
fn test_collecting_sink_keeps_diagnostics_in_order() {
    let mut sink = DiagnosticSink::collecting();
    for code in [
        diagnostic_codes::EXTENSION_METATYPE,
        diagnostic_codes::EXTENDED_TYPE_HERE,
    ] {
        sink.push(Diagnostic::from_code("a.sable", Span::at(1), code, &["T"]));
    }
    let codes: Vec<u32> = sink.diagnostics().iter().map(|d| d.code).collect();
    assert_eq!(
        codes,
        vec![
            diagnostic_codes::EXTENSION_METATYPE,
            diagnostic_codes::EXTENDED_TYPE_HERE
        ]
    );
    // Only the first one is an error.
    assert_eq!(sink.error_count(), 1);
}

#[test]
fn test_diagnostic_serializes_without_empty_related_information() {
    let diag = Diagnostic::error("a.sable".into(), 0, 1, "boom".into(), 1);
    let json = serde_json::to_string(&diag).expect("serialize diagnostic");
    assert!(!json.contains("related_information"));
    assert!(json.contains("\"category\":\"Error\""));
}
