//! Attribution: which source an answer cites.

use crate::types::DocumentChunk;

/// Source of the most relevant chunk, or `None` when nothing was retrieved.
pub fn select_primary(retrieved: &[DocumentChunk]) -> Option<String> {
    retrieved
        .first()
        .and_then(|chunk| chunk.source())
        .map(str::to_string)
}
