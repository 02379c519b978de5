//! # Positions, Spans and Selections
//!
//! Editor-facing coordinates are 0-based `(line, character)` pairs, with
//! characters counted in Unicode scalar values. Spans additionally carry the
//! byte range into the normalized source text so the printer can slice it.

use serde::{Deserialize, Serialize};
use std::cmp::{max, min};

/// A location in the document (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }

    pub fn put_at_start_of_line(self) -> Self {
        Self::new(self.line, 0)
    }
}

/// Source range of a parsed node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Byte offset of the first character (inclusive)
    pub start: usize,
    /// Byte offset past the last character (exclusive)
    pub end: usize,
    pub start_pos: Position,
    pub end_pos: Position,
}

impl Span {
    pub fn new(start: usize, end: usize, start_pos: Position, end_pos: Position) -> Self {
        Self {
            start,
            end,
            start_pos,
            end_pos,
        }
    }

    /// Smallest span covering both `self` and `other`
    pub fn cover(self, other: Span) -> Span {
        let (start, start_pos) = if other.start < self.start {
            (other.start, other.start_pos)
        } else {
            (self.start, self.start_pos)
        };
        let (end, end_pos) = if other.end > self.end {
            (other.end, other.end_pos)
        } else {
            (self.end, self.end_pos)
        };
        Span::new(start, end, start_pos, end_pos)
    }

    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn encloses(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Half-open text range selected by the user.
///
/// `start <= end` always holds: constructors normalize reversed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Selection {
    start: Position,
    end: Position,
}

impl Selection {
    pub fn new(a: Position, b: Position) -> Self {
        Self {
            start: min(a, b),
            end: max(a, b),
        }
    }

    pub fn from_coords(start_line: usize, start_char: usize, end_line: usize, end_char: usize) -> Self {
        Self::new(
            Position::new(start_line, start_char),
            Position::new(end_line, end_char),
        )
    }

    /// An empty selection, i.e. a cursor
    pub fn cursor_at(line: usize, character: usize) -> Self {
        let position = Position::new(line, character);
        Self::new(position, position)
    }

    pub fn from_span(span: &Span) -> Self {
        Self::new(span.start_pos, span.end_pos)
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn end(&self) -> Position {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_multi_lines(&self) -> bool {
        self.start.line != self.end.line
    }

    /// The selection lies entirely within `span`
    pub fn is_inside_node(&self, span: &Span) -> bool {
        span.start_pos <= self.start && self.end <= span.end_pos
    }

    pub fn is_inside(&self, other: &Selection) -> bool {
        other.start <= self.start && self.end <= other.end
    }

    /// Ranges share at least one character. A cursor overlaps a span that
    /// contains it, boundaries included.
    pub fn overlaps(&self, span: &Span) -> bool {
        if self.is_empty() {
            return span.start_pos <= self.start && self.start <= span.end_pos;
        }
        self.start < span.end_pos && span.start_pos < self.end
    }

    pub fn is_same_line_than(&self, other: &Selection) -> bool {
        self.start.line == other.start.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(sl: usize, sc: usize, el: usize, ec: usize) -> Span {
        Span::new(0, 0, Position::new(sl, sc), Position::new(el, ec))
    }

    #[test]
    fn test_new_normalizes_reversed_range() {
        let selection = Selection::from_coords(3, 4, 1, 0);
        assert_eq!(selection.start(), Position::new(1, 0));
        assert_eq!(selection.end(), Position::new(3, 4));
    }

    #[test]
    fn test_default_is_cursor_at_origin() {
        assert_eq!(Selection::default(), Selection::cursor_at(0, 0));
    }

    #[test]
    fn test_is_inside_node() {
        let node = span(1, 0, 3, 1);
        assert!(Selection::cursor_at(2, 5).is_inside_node(&node));
        assert!(Selection::from_coords(1, 0, 3, 1).is_inside_node(&node));
        assert!(!Selection::from_coords(0, 5, 2, 0).is_inside_node(&node));
    }

    #[test]
    fn test_overlaps() {
        let node = span(1, 4, 1, 10);
        assert!(Selection::from_coords(1, 0, 1, 5).overlaps(&node));
        assert!(!Selection::from_coords(1, 0, 1, 4).overlaps(&node));
        assert!(Selection::cursor_at(1, 10).overlaps(&node));
    }

    #[test]
    fn test_is_same_line_than() {
        let a = Selection::from_coords(4, 2, 4, 8);
        let b = Selection::from_coords(4, 0, 6, 0);
        assert!(a.is_same_line_than(&b));
        assert!(!a.is_same_line_than(&Selection::cursor_at(5, 0)));
    }
}
