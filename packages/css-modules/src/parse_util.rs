//! Parse Utilities
//!
//! Source locations attached to AST nodes and carried by every error.

use std::fmt;

/// A position in a source file. `line` and `col` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl SourceLocation {
    pub fn new(offset: usize, line: usize, col: usize) -> Self {
        SourceLocation { offset, line, col }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        SourceLocation::new(0, 1, 1)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Maps byte offsets of one source text to line/column pairs.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in content.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        LineIndex { line_starts }
    }

    pub fn location(&self, content: &str, offset: usize) -> SourceLocation {
        let offset = offset.min(content.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let col = content
            .get(line_start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - line_start);
        SourceLocation::new(offset, line + 1, col + 1)
    }
}
