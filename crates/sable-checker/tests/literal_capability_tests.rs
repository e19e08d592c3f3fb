use super::*;
use sable_ast::{Expr, ExprKind, MagicIdentifierKind};
use sable_common::{Interner, Span};

fn lit(kind: ExprKind) -> Option<KnownCapability> {
    literal_capability(&kind)
}

fn string(text: &str) -> Option<KnownCapability> {
    lit(ExprKind::StringLiteral(text.to_string()))
}

fn element() -> Expr {
    Expr::new(ExprKind::IntegerLiteral("0".to_string()), Span::INVALID)
}

#[test]
fn test_scalar_literals() {
    assert_eq!(lit(ExprKind::NilLiteral), Some(KnownCapability::NilLiteral));
    assert_eq!(
        lit(ExprKind::IntegerLiteral("42".to_string())),
        Some(KnownCapability::IntegerLiteral)
    );
    assert_eq!(
        lit(ExprKind::FloatLiteral("1.5".to_string())),
        Some(KnownCapability::FloatLiteral)
    );
    assert_eq!(lit(ExprKind::BooleanLiteral(true)), Some(KnownCapability::BooleanLiteral));
    assert_eq!(lit(ExprKind::CharacterLiteral('c')), Some(KnownCapability::CharacterLiteral));
}

#[test]
fn test_single_grapheme_string_needs_grapheme_cluster_capability() {
    assert_eq!(string("x"), Some(KnownCapability::ExtendedGraphemeClusterLiteral));
    // One user-perceived character made of two scalars.
    assert_eq!(string("e\u{301}"), Some(KnownCapability::ExtendedGraphemeClusterLiteral));
    assert_eq!(string("🇫🇷"), Some(KnownCapability::ExtendedGraphemeClusterLiteral));
}

#[test]
fn test_longer_or_empty_strings_need_string_capability() {
    assert_eq!(string("xy"), Some(KnownCapability::StringLiteral));
    assert_eq!(string("hello, world"), Some(KnownCapability::StringLiteral));
    assert_eq!(string(""), Some(KnownCapability::StringLiteral));
}

#[test]
fn test_collection_and_interpolation_literals() {
    assert_eq!(
        lit(ExprKind::InterpolatedStringLiteral(vec![element()])),
        Some(KnownCapability::StringInterpolation)
    );
    assert_eq!(lit(ExprKind::Array(Vec::new())), Some(KnownCapability::ArrayLiteral));
    assert_eq!(
        lit(ExprKind::Dictionary(vec![(element(), element())])),
        Some(KnownCapability::DictionaryLiteral)
    );
}

#[test]
fn test_magic_identifiers() {
    let magic = |kind| lit(ExprKind::MagicIdentifier(kind));
    assert_eq!(magic(MagicIdentifierKind::File), Some(KnownCapability::StringLiteral));
    assert_eq!(magic(MagicIdentifierKind::Function), Some(KnownCapability::StringLiteral));
    assert_eq!(magic(MagicIdentifierKind::Line), Some(KnownCapability::IntegerLiteral));
    assert_eq!(magic(MagicIdentifierKind::Column), Some(KnownCapability::IntegerLiteral));
}

#[test]
fn test_non_literals_need_nothing() {
    let name = Interner::new().intern("x");
    assert_eq!(lit(ExprKind::DeclRef(name)), None);
    assert_eq!(
        lit(ExprKind::Call {
            callee: Box::new(Expr::new(ExprKind::DeclRef(name), Span::INVALID)),
            args: vec![element()],
        }),
        None
    );
    assert_eq!(lit(ExprKind::Error), None);
}
