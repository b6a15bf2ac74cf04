//! Chunk merger.
//!
//! Applies an ordered decision list to the stage-one sequence. Merging is
//! verbatim concatenation — no separator is inserted and no byte of content
//! is dropped or duplicated, so the concatenation of the output always
//! equals the concatenation of the input.

use tracing::debug;

use mosaik_core::{Chunk, ChunkMetadata, DocumentId};

use crate::agent::{BoundaryDecision, Verdict};
use crate::error::ChunkerError;

/// Apply `decisions` left to right: MERGE appends the right chunk's content
/// to the running accumulator, KEEP finalizes the accumulator and starts a
/// new one. Output chunks are re-indexed from 0 with freshly derived ids and
/// carry the shared `metadata`.
///
/// Requires exactly `chunks.len() - 1` decisions — anything else is a caller
/// contract violation and fails fast.
pub fn merge_chunks(
    document_id: DocumentId,
    chunks: Vec<Chunk>,
    decisions: &[BoundaryDecision],
    metadata: ChunkMetadata,
) -> Result<Vec<Chunk>, ChunkerError> {
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    let expected = chunks.len() - 1;
    if decisions.len() != expected {
        return Err(ChunkerError::MergeInconsistency {
            expected,
            actual: decisions.len(),
        });
    }

    let mut contents: Vec<String> = Vec::new();
    let mut iter = chunks.into_iter();
    let mut accumulator = match iter.next() {
        Some(first) => first.content,
        None => return Ok(Vec::new()),
    };

    for (chunk, decision) in iter.zip(decisions) {
        match decision.verdict {
            Verdict::Merge => accumulator.push_str(&chunk.content),
            Verdict::Keep => {
                contents.push(std::mem::replace(&mut accumulator, chunk.content));
            }
        }
    }
    contents.push(accumulator);

    debug!(merged_into = contents.len(), "decisions applied");

    Ok(contents
        .into_iter()
        .enumerate()
        .map(|(index, content)| Chunk::new(document_id, content, index, metadata.clone()))
        .collect())
}
