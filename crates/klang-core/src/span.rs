//! Source coordinates and spans.
//!
//! A `SourceCoord` is the (byte position, line, column) triple every
//! lexeme, AST node and diagnostic is anchored to (spec §3.1). Lines and
//! columns are 1-based; `pos` is a 0-based byte offset into the unit's
//! source buffer.

/// A single point in the source buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SourceCoord {
    pub pos: u32,
    pub line: u32,
    pub col: u32,
}

impl SourceCoord {
    pub const START: SourceCoord = SourceCoord {
        pos: 0,
        line: 1,
        col: 1,
    };

    /// Advance by `n` bytes on the same line. Callers handle newlines
    /// explicitly (CR, LF, CRLF all reset the column and bump the line by
    /// one, per spec §4.1) since that can't be expressed as a flat offset.
    pub fn advance(self, n: u32) -> SourceCoord {
        SourceCoord {
            pos: self.pos + n,
            line: self.line,
            col: self.col + n,
        }
    }

    pub fn newline(self) -> SourceCoord {
        SourceCoord {
            pos: self.pos + 1,
            line: self.line + 1,
            col: 1,
        }
    }
}

/// A half-open `[start, end)` range over the source buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Span {
    pub start: SourceCoord,
    pub end: SourceCoord,
}

impl Span {
    pub fn new(start: SourceCoord, end: SourceCoord) -> Self {
        Self { start, end }
    }

    /// A zero-width span at a single coordinate, used for diagnostics that
    /// have no natural range (e.g. "expected a statement here").
    pub fn point(coord: SourceCoord) -> Self {
        Self {
            start: coord,
            end: coord,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
        }
    }

    pub fn byte_range(self) -> std::ops::Range<usize> {
        self.start.pos as usize..self.end.pos as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_pos_and_col_together() {
        let c = SourceCoord::START.advance(3);
        assert_eq!(c.pos, 3);
        assert_eq!(c.col, 4);
        assert_eq!(c.line, 1);
    }

    #[test]
    fn newline_resets_column_and_bumps_line() {
        let c = SourceCoord::START.advance(5).newline();
        assert_eq!(c.line, 2);
        assert_eq!(c.col, 1);
        assert_eq!(c.pos, 6);
    }

    #[test]
    fn byte_range_matches_content() {
        let src = "return 42;";
        let start = SourceCoord::START.advance(7);
        let end = start.advance(2);
        let span = Span::new(start, end);
        assert_eq!(&src[span.byte_range()], "42");
    }

    #[test]
    fn to_spans_from_first_start_to_second_end() {
        let a = Span::point(SourceCoord::START.advance(1));
        let b = Span::point(SourceCoord::START.advance(5));
        let joined = a.to(b);
        assert_eq!(joined.start, a.start);
        assert_eq!(joined.end, b.end);
    }
}
