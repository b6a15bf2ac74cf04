//! Boundary candidate extraction.
//!
//! Pure functions over the stage-one chunk sequence: every adjacent pair
//! yields one bounded-context snippet for the decision oracle.

use serde::{Deserialize, Serialize};

use mosaik_core::Chunk;

/// Separates the "before" context from the "after" context in a snippet.
pub const BOUNDARY_MARKER: &str = "\n---BOUNDARY---\n";

/// Context around the join point between chunk `boundary_index` and its
/// right neighbor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryCandidate {
    pub boundary_index: usize,
    pub snippet: String,
}

/// Build one candidate per adjacent chunk pair: `min(window, len)` trailing
/// characters of the left chunk, the marker, then `min(window, len)` leading
/// characters of the right chunk. Returns exactly N−1 candidates for N
/// chunks.
pub fn extract_candidates(chunks: &[Chunk], window: usize) -> Vec<BoundaryCandidate> {
    chunks
        .windows(2)
        .enumerate()
        .map(|(boundary_index, pair)| BoundaryCandidate {
            boundary_index,
            snippet: format!(
                "{}{}{}",
                tail_chars(&pair[0].content, window),
                BOUNDARY_MARKER,
                head_chars(&pair[1].content, window),
            ),
        })
        .collect()
}

/// Last `n` characters of `s`, respecting UTF-8 boundaries.
fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

/// First `n` characters of `s`, respecting UTF-8 boundaries.
fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaik_core::{Chunk, ChunkMetadata, SplitSource};
    use uuid::Uuid;

    fn chunk(index: usize, content: &str) -> Chunk {
        let metadata = ChunkMetadata {
            target_chunk_size: 1200,
            similarity_threshold: 0.35,
            oracle_model: "llama3.2".into(),
            split_source: SplitSource::Semantic,
        };
        Chunk::new(Uuid::nil(), content.to_string(), index, metadata)
    }

    #[test]
    fn produces_one_candidate_per_adjacent_pair() {
        let chunks: Vec<_> = (0..4).map(|i| chunk(i, "some content here")).collect();
        let candidates = extract_candidates(&chunks, 200);
        assert_eq!(candidates.len(), 3);
        for (i, candidate) in candidates.iter().enumerate() {
            assert_eq!(candidate.boundary_index, i);
        }
    }

    #[test]
    fn no_candidates_for_single_chunk() {
        let chunks = vec![chunk(0, "alone")];
        assert!(extract_candidates(&chunks, 200).is_empty());
        assert!(extract_candidates(&[], 200).is_empty());
    }

    #[test]
    fn snippet_contains_marker_between_contexts() {
        let chunks = vec![chunk(0, "left side text"), chunk(1, "right side text")];
        let candidates = extract_candidates(&chunks, 200);
        assert_eq!(
            candidates[0].snippet,
            format!("left side text{BOUNDARY_MARKER}right side text")
        );
    }

    #[test]
    fn window_caps_context_length() {
        let left = "a".repeat(500);
        let right = "b".repeat(500);
        let chunks = vec![chunk(0, &left), chunk(1, &right)];
        let candidates = extract_candidates(&chunks, 100);
        let snippet = &candidates[0].snippet;
        let (before, after) = snippet.split_once(BOUNDARY_MARKER).unwrap();
        assert_eq!(before.chars().count(), 100);
        assert_eq!(after.chars().count(), 100);
    }

    #[test]
    fn window_larger_than_chunk_takes_whole_chunk() {
        let chunks = vec![chunk(0, "tiny"), chunk(1, "also tiny")];
        let candidates = extract_candidates(&chunks, 1000);
        assert_eq!(
            candidates[0].snippet,
            format!("tiny{BOUNDARY_MARKER}also tiny")
        );
    }

    #[test]
    fn multibyte_content_is_sliced_on_char_boundaries() {
        let left = "日本語のテキストです".to_string();
        let right = "überraschung für alle".to_string();
        let chunks = vec![chunk(0, &left), chunk(1, &right)];
        let candidates = extract_candidates(&chunks, 5);
        let (before, after) = candidates[0].snippet.split_once(BOUNDARY_MARKER).unwrap();
        assert_eq!(before, "キストです");
        assert_eq!(after, "überr");
    }
}
