use serde::Serialize;

/// A zero-based line and byte-column position within a text document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LineCol {
    line: u32,
    column: u32,
}

impl LineCol {
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    #[must_use]
    pub fn line(self) -> u32 {
        self.line
    }

    /// Byte offset from the start of the line.
    #[must_use]
    pub fn column(self) -> u32 {
        self.column
    }
}

/// Precomputed line-start offsets for a document, for converting byte
/// offsets into line/column positions when reporting diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineIndex {
    line_starts: Vec<u32>,
    length: u32,
}

impl LineIndex {
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut line_starts = vec![0];
        for newline in memchr::memchr_iter(b'\n', text.as_bytes()) {
            line_starts.push(u32::try_from(newline + 1).unwrap_or(u32::MAX));
        }
        Self {
            line_starts,
            length: u32::try_from(text.len()).unwrap_or(u32::MAX),
        }
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset of the start of `line`, or `None` past the last line.
    #[must_use]
    pub fn line_start(&self, line: u32) -> Option<u32> {
        self.line_starts.get(line as usize).copied()
    }

    /// Convert a byte offset into a line/column position. Offsets past the
    /// end of the document clamp to the final position.
    #[must_use]
    pub fn to_line_col(&self, offset: u32) -> LineCol {
        let offset = offset.min(self.length);
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let column = offset - self.line_starts[line];
        LineCol::new(u32::try_from(line).unwrap_or(u32::MAX), column)
    }
}
