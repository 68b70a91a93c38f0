//! Source location tracking for diagnostics.
//!
//! Provides [`Span`] to record where tokens, tree nodes and errors occur in
//! module source text.

use std::fmt;

/// A span of source code, represented by its starting position.
///
/// Tree nodes synthesized by a stage (hoisted assignments, desugared
/// `match` chains) reuse the span of the node they were derived from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed, 0 for "unknown").
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// A span that points at nothing in particular, used for module-level diagnostics.
    pub const UNKNOWN: Span = Span {
        line: 0,
        col: 0,
        len: 0,
    };

    /// Create a new span from a line, column, and length.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    /// Whether this span is empty (zero length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether this span refers to a real source position.
    #[inline]
    pub fn is_known(&self) -> bool {
        self.line != 0
    }

    /// Zero-length span at the end of this one.
    #[inline]
    pub fn right_edge(self) -> Span {
        Span::point(self.line, self.col + self.len)
    }

    /// Merge two spans into one that starts at the earlier span and covers both.
    ///
    /// Spans on different lines keep the first position and sum the lengths.
    pub fn merge(self, other: Span) -> Span {
        if !self.is_known() {
            return other;
        }
        if !other.is_known() {
            return self;
        }
        let (first, second) = if (other.line, other.col) < (self.line, self.col) {
            (other, self)
        } else {
            (self, other)
        };
        if first.line == second.line {
            let end = (second.col + second.len).max(first.col + first.len);
            Span::new(first.line, first.col, end - first.col)
        } else {
            Span::new(first.line, first.col, first.len + second.len)
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "{}:{}", self.line, self.col)
        } else {
            f.write_str("?:?")
        }
    }
}
