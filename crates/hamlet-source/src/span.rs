use serde::Serialize;

use crate::LineCol;
use crate::LineIndex;

/// A contiguous byte range within a source document.
///
/// Every CST node carries one of these so that tooling can slice the
/// original text back out of the tree. Stored as start + length rather
/// than start + end so an empty span at an offset is representable
/// without ambiguity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    start: u32,
    length: u32,
}

impl Span {
    #[must_use]
    pub fn new(start: u32, length: u32) -> Self {
        Self { start, length }
    }

    /// Construct a span from `usize` byte bounds, saturating on overflow.
    #[must_use]
    pub fn from_bounds(start: usize, end: usize) -> Self {
        let start_u32 = u32::try_from(start).unwrap_or(u32::MAX);
        let length = u32::try_from(end.saturating_sub(start))
            .unwrap_or(u32::MAX.saturating_sub(start_u32));
        Self::new(start_u32, length)
    }

    /// A zero-length span at `offset`.
    #[must_use]
    pub fn empty_at(offset: usize) -> Self {
        Self::from_bounds(offset, offset)
    }

    #[must_use]
    pub fn start(self) -> u32 {
        self.start
    }

    #[must_use]
    pub fn end(self) -> u32 {
        self.start.saturating_add(self.length)
    }

    #[must_use]
    pub fn length(self) -> u32 {
        self.length
    }

    #[must_use]
    pub fn start_usize(self) -> usize {
        self.start as usize
    }

    #[must_use]
    pub fn end_usize(self) -> usize {
        self.end() as usize
    }

    #[must_use]
    pub fn length_usize(self) -> usize {
        self.length as usize
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.length == 0
    }

    /// The smallest span covering both `self` and `other`.
    #[must_use]
    pub fn cover(self, other: Span) -> Span {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Span::new(start, end - start)
    }

    /// Whether `other` lies entirely within `self`.
    #[must_use]
    pub fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end() <= self.end()
    }

    /// Slice `source` by this span, returning `""` if the span is out of
    /// bounds or does not fall on character boundaries.
    #[must_use]
    pub fn text(self, source: &str) -> &str {
        source.get(self.start_usize()..self.end_usize()).unwrap_or("")
    }

    /// Convert to start and end line/column positions via `index`.
    #[must_use]
    pub fn to_line_col(self, index: &LineIndex) -> (LineCol, LineCol) {
        (index.to_line_col(self.start), index.to_line_col(self.end()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_round_trip() {
        let span = Span::from_bounds(3, 10);
        assert_eq!(span.start(), 3);
        assert_eq!(span.end(), 10);
        assert_eq!(span.length(), 7);
        assert!(!span.is_empty());
    }

    #[test]
    fn empty_at_offset() {
        let span = Span::empty_at(5);
        assert_eq!(span.start(), 5);
        assert!(span.is_empty());
    }

    #[test]
    fn cover_unions_ranges() {
        let a = Span::from_bounds(2, 5);
        let b = Span::from_bounds(8, 12);
        assert_eq!(a.cover(b), Span::from_bounds(2, 12));
        assert_eq!(b.cover(a), Span::from_bounds(2, 12));
    }

    #[test]
    fn contains_is_inclusive() {
        let outer = Span::from_bounds(0, 10);
        assert!(outer.contains(Span::from_bounds(0, 10)));
        assert!(outer.contains(Span::from_bounds(3, 7)));
        assert!(!outer.contains(Span::from_bounds(3, 11)));
    }

    #[test]
    fn text_slices_source() {
        let source = "%div hello";
        assert_eq!(Span::from_bounds(0, 4).text(source), "%div");
        assert_eq!(Span::from_bounds(5, 10).text(source), "hello");
    }

    #[test]
    fn text_out_of_bounds_is_empty() {
        assert_eq!(Span::from_bounds(5, 20).text("short"), "");
    }

    #[test]
    fn text_off_char_boundary_is_empty() {
        // 'é' is two bytes; slicing through it must not panic.
        assert_eq!(Span::from_bounds(0, 1).text("é"), "");
    }

    #[test]
    fn to_line_col_maps_both_ends() {
        let source = "%div\n  %p hi\n";
        let index = LineIndex::from_text(source);
        let span = Span::from_bounds(7, 9);
        assert_eq!(span.text(source), "%p");
        let (start, end) = span.to_line_col(&index);
        assert_eq!(start, LineCol::new(1, 2));
        assert_eq!(end, LineCol::new(1, 4));
    }
}
