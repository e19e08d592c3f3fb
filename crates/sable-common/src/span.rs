//! Source spans as byte offsets into a unit's text.

use serde::Serialize;

/// A half-open byte range `[start, start + length)`.
///
/// `Span::INVALID` marks synthesized nodes that have no source location;
/// diagnostics attached to it are still reported, but callers that only
/// want to diagnose user-visible problems check `is_valid` first.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: u32,
    pub length: u32,
}

impl Span {
    pub const INVALID: Self = Self {
        start: u32::MAX,
        length: 0,
    };

    #[must_use]
    pub const fn new(start: u32, length: u32) -> Self {
        Self { start, length }
    }

    #[must_use]
    pub const fn at(start: u32) -> Self {
        Self { start, length: 0 }
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.start != u32::MAX
    }

    #[must_use]
    pub const fn end(self) -> u32 {
        self.start.saturating_add(self.length)
    }

    /// True when this span begins strictly before `offset`.
    #[must_use]
    pub const fn starts_before(self, offset: u32) -> bool {
        self.is_valid() && self.start < offset
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        if !self.is_valid() {
            return other;
        }
        if !other.is_valid() {
            return self;
        }
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Self::new(start, end - start)
    }
}
