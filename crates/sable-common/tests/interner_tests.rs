use super::*;

#[test]
fn test_interning_is_idempotent() {
    let mut interner = Interner::new();
    let a = interner.intern("Point");
    let b = interner.intern("Point");
    assert_eq!(a, b);
    assert_eq!(interner.resolve(a), "Point");
}

#[test]
fn test_empty_string_is_preinterned() {
    let interner = Interner::new();
    assert_eq!(interner.get(""), Some(Atom::EMPTY));
    assert!(interner.is_empty());
    assert_eq!(interner.get("missing"), None);
}

#[test]
fn test_span_union_ignores_invalid_spans() {
    let a = Span::new(10, 5);
    assert_eq!(a.to(Span::INVALID), a);
    assert_eq!(Span::INVALID.to(a), a);
    assert_eq!(a.to(Span::new(2, 3)), Span::new(2, 13));
    assert!(a.starts_before(11));
    assert!(!a.starts_before(10));
}
