use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique document identifier, assigned by the extraction layer upstream.
pub type DocumentId = Uuid;

/// Fixed namespace for deriving chunk ids. Never change this — chunk ids are
/// the join key between the chunk store and the vector store, and downstream
/// consistency checks depend on them being reproducible.
pub const CHUNK_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x5b, 0xa2, 0x1d, 0x0e, 0x7c, 0x44, 0x4f, 0x9a, 0x8e, 0x31, 0xd6, 0x02, 0x9f, 0x5d, 0x7a, 0xc4,
]);

/// Derive the deterministic chunk id for a position within a document.
///
/// Two runs over identical input and configuration produce identical ids.
pub fn chunk_id_for(document_id: &DocumentId, chunk_index: usize) -> Uuid {
    let name = format!("{document_id}:{chunk_index}");
    Uuid::new_v5(&CHUNK_ID_NAMESPACE, name.as_bytes())
}

/// A contiguous span of document text treated as one retrieval unit.
///
/// Chunks are created fresh per pipeline run, re-indexed only by the merger,
/// and immutable once handed to the embedding collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: Uuid,
    pub document_id: DocumentId,
    pub content: String,
    pub chunk_index: usize,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Build a chunk at the given position, deriving its id.
    pub fn new(
        document_id: DocumentId,
        content: String,
        chunk_index: usize,
        metadata: ChunkMetadata,
    ) -> Self {
        Self {
            chunk_id: chunk_id_for(&document_id, chunk_index),
            document_id,
            content,
            chunk_index,
            metadata,
        }
    }
}

/// Which stage-one split path produced the chunk sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SplitSource {
    Semantic,
    Greedy,
}

/// Configuration echo attached to every chunk of a pipeline run, so stored
/// chunks can be traced back to the settings that produced them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    pub target_chunk_size: usize,
    pub similarity_threshold: f32,
    pub oracle_model: String,
    pub split_source: SplitSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_ids_are_deterministic() {
        let doc = Uuid::new_v4();
        assert_eq!(chunk_id_for(&doc, 0), chunk_id_for(&doc, 0));
        assert_eq!(chunk_id_for(&doc, 7), chunk_id_for(&doc, 7));
    }

    #[test]
    fn chunk_ids_differ_by_position_and_document() {
        let doc_a = Uuid::new_v4();
        let doc_b = Uuid::new_v4();
        assert_ne!(chunk_id_for(&doc_a, 0), chunk_id_for(&doc_a, 1));
        assert_ne!(chunk_id_for(&doc_a, 0), chunk_id_for(&doc_b, 0));
    }

    #[test]
    fn chunk_new_derives_id_from_position() {
        let doc = Uuid::new_v4();
        let metadata = ChunkMetadata {
            target_chunk_size: 1200,
            similarity_threshold: 0.35,
            oracle_model: "llama3.2".into(),
            split_source: SplitSource::Semantic,
        };
        let chunk = Chunk::new(doc, "hello".into(), 3, metadata);
        assert_eq!(chunk.chunk_id, chunk_id_for(&doc, 3));
        assert_eq!(chunk.chunk_index, 3);
    }
}
