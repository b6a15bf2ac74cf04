//! Stage-one splitter.
//!
//! Splits raw document text into an ordered chunk sequence whose boundaries
//! follow semantic discontinuity: sentences are embedded in process, and a
//! new chunk opens when the next sentence drifts too far from the running
//! chunk centroid. When the semantic path fails or produces nothing, a
//! deterministic greedy splitter takes over — that path reconstructs the
//! input exactly when chunks are re-joined with single spaces.

use std::sync::Arc;

use tracing::warn;

use mosaik_core::config::ChunkingConfig;
use mosaik_core::{Chunk, ChunkMetadata, DocumentId, SplitSource};

/// A chunk must reach `target / MIN_CHUNK_DIVISOR` characters before a
/// semantic discontinuity is allowed to cut it.
const MIN_CHUNK_DIVISOR: usize = 4;

/// Dimensionality of the local feature-hash embedding.
const HASH_EMBEDDING_DIM: usize = 256;

// ── Sentence embedding ───────────────────────────────────────────────

/// Embeds one sentence into a fixed-dimension vector, in process.
///
/// Implementations must not perform I/O: the splitter runs synchronously
/// inside the pipeline's control flow.
pub trait SentenceEmbedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("embedder backend failed: {0}")]
    Backend(String),
}

/// Deterministic feature-hash embedder: each token is hashed into a fixed
/// bucket and the vector is L2-normalized. Captures lexical overlap well
/// enough for discontinuity detection without a model dependency.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashEmbedder;

impl SentenceEmbedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vec = vec![0.0f32; HASH_EMBEDDING_DIM];
        for token in tokenize(text) {
            let bucket = (seahash::hash(token.as_bytes()) as usize) % HASH_EMBEDDING_DIM;
            vec[bucket] += 1.0;
        }
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vec {
                *x /= norm;
            }
        }
        Ok(vec)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

/// Cosine similarity between two vectors. Zero-magnitude vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

// ── Splitter ─────────────────────────────────────────────────────────

pub struct StageOneSplitter {
    config: ChunkingConfig,
    embedder: Arc<dyn SentenceEmbedder>,
}

impl StageOneSplitter {
    pub fn new(config: ChunkingConfig, embedder: Arc<dyn SentenceEmbedder>) -> Self {
        Self { config, embedder }
    }

    /// Split `text` into an ordered, non-empty chunk sequence.
    ///
    /// Callers must pass non-blank text; the pipeline rejects blank input
    /// before reaching the splitter.
    pub fn split(&self, document_id: DocumentId, text: &str) -> Vec<Chunk> {
        let (parts, source) = match self.split_semantic(text) {
            Ok(parts) if !parts.is_empty() => (parts, SplitSource::Semantic),
            Ok(_) => {
                warn!(%document_id, "semantic split produced no chunks, using greedy fallback");
                (self.split_greedy(text), SplitSource::Greedy)
            }
            Err(e) => {
                warn!(%document_id, error = %e, "semantic split failed, using greedy fallback");
                (self.split_greedy(text), SplitSource::Greedy)
            }
        };

        let metadata = self.metadata(source);
        parts
            .into_iter()
            .enumerate()
            .map(|(index, content)| Chunk::new(document_id, content, index, metadata.clone()))
            .collect()
    }

    fn metadata(&self, source: SplitSource) -> ChunkMetadata {
        ChunkMetadata {
            target_chunk_size: self.config.target_chunk_size,
            similarity_threshold: self.config.similarity_threshold,
            oracle_model: self.config.oracle_model.clone(),
            split_source: source,
        }
    }

    /// Semantic path: accumulate sentences, cut where the next sentence
    /// drifts below the similarity threshold against the chunk centroid
    /// (once the chunk has a minimum amount of content) or where the target
    /// size would be exceeded.
    fn split_semantic(&self, text: &str) -> Result<Vec<String>, EmbedError> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Ok(Vec::new());
        }

        let target = self.config.target_chunk_size;
        let min_len = target / MIN_CHUNK_DIVISOR;

        let mut parts = Vec::new();
        let mut current = String::new();
        let mut centroid: Vec<f32> = Vec::new();

        for sentence in &sentences {
            let embedding = self.embedder.embed(sentence)?;

            let semantic_break = !centroid.is_empty()
                && current.len() >= min_len
                && cosine_similarity(&centroid, &embedding) < self.config.similarity_threshold;
            let size_break =
                !current.is_empty() && current.len() + sentence.len() + 1 > target;

            if semantic_break || size_break {
                parts.push(std::mem::take(&mut current));
                centroid.clear();
            }

            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);

            if centroid.is_empty() {
                centroid = embedding;
            } else {
                for (c, e) in centroid.iter_mut().zip(embedding.iter()) {
                    *c += *e;
                }
            }
        }

        if !current.is_empty() {
            parts.push(current);
        }
        Ok(parts)
    }

    /// Greedy fallback: accumulate whitespace tokens until adding the next
    /// would exceed the target, then cut. Joining the parts with single
    /// spaces reproduces the whitespace-normalized input exactly.
    fn split_greedy(&self, text: &str) -> Vec<String> {
        let target = self.config.target_chunk_size;
        let mut parts = Vec::new();
        let mut current = String::new();

        for token in text.split_whitespace() {
            if !current.is_empty() && current.len() + token.len() + 1 > target {
                parts.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(token);
        }

        if !current.is_empty() {
            parts.push(current);
        }
        parts
    }
}

/// Split prose into sentences on terminator punctuation followed by
/// whitespace (or end of input). Good enough for extracted plain text;
/// pathological inputs simply produce longer sentences.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(true, |n| n.is_whitespace()) {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}
