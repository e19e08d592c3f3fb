//! Literal syntax to the capability a type needs to be built from it.

use crate::known_capabilities::KnownCapability;
use sable_ast::{ExprKind, MagicIdentifierKind};
use unicode_segmentation::UnicodeSegmentation;

/// The capability a literal of this form requires, or `None` when the
/// expression is not a literal.
#[must_use]
pub fn literal_capability(kind: &ExprKind) -> Option<KnownCapability> {
    let capability = match kind {
        ExprKind::NilLiteral => KnownCapability::NilLiteral,
        ExprKind::IntegerLiteral(_) => KnownCapability::IntegerLiteral,
        ExprKind::FloatLiteral(_) => KnownCapability::FloatLiteral,
        ExprKind::BooleanLiteral(_) => KnownCapability::BooleanLiteral,
        ExprKind::CharacterLiteral(_) => KnownCapability::CharacterLiteral,
        ExprKind::StringLiteral(text) => {
            if is_single_grapheme(text) {
                KnownCapability::ExtendedGraphemeClusterLiteral
            } else {
                KnownCapability::StringLiteral
            }
        }
        ExprKind::InterpolatedStringLiteral(_) => KnownCapability::StringInterpolation,
        ExprKind::Array(_) => KnownCapability::ArrayLiteral,
        ExprKind::Dictionary(_) => KnownCapability::DictionaryLiteral,
        ExprKind::MagicIdentifier(MagicIdentifierKind::File | MagicIdentifierKind::Function) => {
            KnownCapability::StringLiteral
        }
        ExprKind::MagicIdentifier(MagicIdentifierKind::Line | MagicIdentifierKind::Column) => {
            KnownCapability::IntegerLiteral
        }
        ExprKind::DeclRef(_) | ExprKind::Call { .. } | ExprKind::Closure(_) | ExprKind::Error => {
            return None;
        }
    };
    Some(capability)
}

fn is_single_grapheme(text: &str) -> bool {
    let mut graphemes = text.graphemes(true);
    graphemes.next().is_some() && graphemes.next().is_none()
}
