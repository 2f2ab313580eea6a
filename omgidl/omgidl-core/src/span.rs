use std::fmt::{Display, Formatter, Result};

/// Location of a token or node in the source text.
///
/// `offset` and `len` are byte based; `line` and `column` are 1-based and
/// count characters, for human-readable diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(offset: usize, len: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            len,
            line,
            column,
        }
    }

    /// Byte offset one past the last byte covered by this span.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Smallest span covering both `self` and `other`, keeping the line and
    /// column of whichever starts first.
    pub fn to(self, other: Span) -> Span {
        let (first, _) = if self.offset <= other.offset {
            (self, other)
        } else {
            (other, self)
        };
        let end = self.end().max(other.end());
        Span {
            offset: first.offset,
            len: end - first.offset,
            line: first.line,
            column: first.column,
        }
    }

    /// `true` when `other` starts exactly where `self` ends.
    pub fn is_adjacent_to(&self, other: &Span) -> bool {
        self.end() == other.offset
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
