use tower_lsp::lsp_types::Range;
use tracing::{instrument, trace};

use crate::ast::JSONDocument;

/// Resolves the range for a diagnostic from a node's byte offset and length.
#[instrument(skip(doc))]
pub fn from_offset(doc: &JSONDocument, offset: usize, length: usize) -> Range {
    let range = doc.range_for(offset, length);
    trace!(
        line = range.start.line,
        character = range.start.character,
        "resolved diagnostic range"
    );
    range
}
