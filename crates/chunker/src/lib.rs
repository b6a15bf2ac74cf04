//! Two-stage semantic chunking engine.
//!
//! Stage one splits extracted document text at semantic discontinuities
//! (with a deterministic greedy fallback). Stage two reviews every chunk
//! boundary through an LLM oracle under a concurrency cap and merges
//! adjacent chunks the oracle judges to belong together. Oracle failures
//! degrade to keeping the stage-one split, never to data loss.

pub mod agent;
pub mod boundary;
pub mod error;
pub mod merger;
pub mod pipeline;
pub mod reviewer;
pub mod splitter;

pub use agent::{BoundaryDecision, BoundaryDecisionAgent, DecisionStatus, ReviewOutcome, Verdict};
pub use boundary::{extract_candidates, BoundaryCandidate, BOUNDARY_MARKER};
pub use error::ChunkerError;
pub use merger::merge_chunks;
pub use pipeline::{
    ChunkingOutcome, ChunkingPipeline, ChunkingReport, ChunkingRequest, ChunkingResult,
};
pub use reviewer::{ConcurrentBoundaryReviewer, ReviewStats};
pub use splitter::{HashEmbedder, SentenceEmbedder, StageOneSplitter};
