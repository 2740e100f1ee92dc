//! Offset → LSP `Position` conversion, computed once per document.
//!
//! Supersedes the old needle-search approach to locating a JSON Pointer in
//! the raw text: every AST node already carries an exact byte offset, so
//! positions are derived from a line-start table instead of re-scanning the
//! document for substrings.

use tower_lsp::lsp_types::Position;

pub struct LineIndex {
    /// Byte offset of the first character of each line; always starts at 0.
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Converts a byte offset into `text` to a `Position` with a UTF-16
    /// character count, matching the LSP specification.
    pub fn position_at(&self, text: &str, offset: usize) -> Position {
        let offset = offset.min(text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(l) => l,
            Err(l) => l - 1,
        };
        let line_start = self.line_starts[line];
        let character = text[line_start..offset]
            .chars()
            .map(|c| c.len_utf16() as u32)
            .sum();
        Position {
            line: line as u32,
            character,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_offsets_map_to_line_zero() {
        let text = "abc\ndef";
        let idx = LineIndex::new(text);
        assert_eq!(idx.position_at(text, 0), Position { line: 0, character: 0 });
        assert_eq!(idx.position_at(text, 2), Position { line: 0, character: 2 });
    }

    #[test]
    fn offset_after_newline_is_next_line() {
        let text = "abc\ndef";
        let idx = LineIndex::new(text);
        assert_eq!(idx.position_at(text, 4), Position { line: 1, character: 0 });
        assert_eq!(idx.position_at(text, 6), Position { line: 1, character: 2 });
    }

    #[test]
    fn utf16_character_counts_surrogate_pairs() {
        let text = "\"😀\"x";
        let idx = LineIndex::new(text);
        // 😀 is 4 bytes in utf-8, 2 code units in utf-16.
        let x_offset = text.rfind('x').unwrap();
        let pos = idx.position_at(text, x_offset);
        assert_eq!(pos, Position { line: 0, character: 1 + 2 + 1 });
    }
}
