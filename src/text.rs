//! Immutable text model with 1-based line/column indexing.
//!
//! Generalizes `location::offset_to_line_col`'s linear scan into a memoized,
//! O(log N)-lookup structure, since the rewriter calls it once per
//! diagnostic and potentially once per statement over large files.

use std::path::PathBuf;

/// A 1-based (line, column) position. Total order via derived `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FilePos {
    pub line: usize,
    pub col: usize,
}

impl FilePos {
    pub fn new(line: usize, col: usize) -> Self {
        debug_assert!(line >= 1 && col >= 1);
        Self { line, col }
    }
}

/// Immutable source text plus an optional filename and starting position.
#[derive(Debug, Clone)]
pub struct FileText {
    text: String,
    filename: Option<PathBuf>,
    startpos: FilePos,
    /// Byte offset of the start of each line (line_starts[0] == 0).
    line_starts: Vec<usize>,
}

impl FileText {
    pub fn from_string(text: String, filename: Option<PathBuf>) -> Self {
        Self::from_string_at(text, filename, FilePos::new(1, 1))
    }

    pub fn from_string_at(text: String, filename: Option<PathBuf>, startpos: FilePos) -> Self {
        let mut line_starts = vec![0usize];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            text,
            filename,
            startpos,
            line_starts,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn filename(&self) -> Option<&PathBuf> {
        self.filename.as_ref()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// `len(lines) == count('\n') + (1 if not endswith('\n') else 0)`.
    /// Exposed so the formatter can reproduce the source's terminal-newline
    /// convention.
    pub fn ends_with_newline(&self) -> bool {
        self.text.ends_with('\n')
    }

    pub fn line_count(&self) -> usize {
        let newlines = self.text.bytes().filter(|&b| b == b'\n').count();
        newlines + if self.ends_with_newline() { 0 } else { 1 }
    }

    /// Convert a 0-based byte offset into a [`FilePos`], offset by `startpos`.
    pub fn pos_of(&self, offset: usize) -> FilePos {
        let offset = offset.min(self.text.len());
        // binary search for the last line_start <= offset
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[idx];
        let col = self.text[line_start..offset].chars().count() + 1;
        FilePos::new(self.startpos.line + idx, if idx == 0 { self.startpos.col + col - 1 } else { col })
    }

    /// Byte slice between two offsets (half-open, `[start, end)`).
    pub fn slice(&self, start: usize, end: usize) -> &str {
        &self.text[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_of_first_line() {
        let ft = FileText::from_string("import os\n".to_string(), None);
        assert_eq!(ft.pos_of(0), FilePos::new(1, 1));
        assert_eq!(ft.pos_of(7), FilePos::new(1, 8));
    }

    #[test]
    fn test_pos_of_second_line() {
        let ft = FileText::from_string("import os\nimport sys\n".to_string(), None);
        assert_eq!(ft.pos_of(10), FilePos::new(2, 1));
    }

    #[test]
    fn test_ends_with_newline() {
        let with = FileText::from_string("x = 1\n".to_string(), None);
        let without = FileText::from_string("x = 1".to_string(), None);
        assert!(with.ends_with_newline());
        assert!(!without.ends_with_newline());
    }

    #[test]
    fn test_slice() {
        let ft = FileText::from_string("import os\nimport sys\n".to_string(), None);
        assert_eq!(ft.slice(0, 9), "import os");
        assert_eq!(ft.slice(10, 20), "import sys");
    }

    #[test]
    fn test_empty_text() {
        let ft = FileText::from_string(String::new(), None);
        assert_eq!(ft.pos_of(0), FilePos::new(1, 1));
        assert!(!ft.ends_with_newline());
    }
}
