//! Pipeline orchestration.
//!
//! One run walks SPLIT → EXTRACT_BOUNDARIES → REVIEW → MERGE. Control flow
//! is single-threaded except the review fan-out; the only suspension points
//! are oracle calls. Callers always get either a definite chunk list or an
//! explicit error — never partial state.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use mosaik_core::config::ChunkingConfig;
use mosaik_core::{Chunk, DocumentId};
use mosaik_llm::LlmProvider;

use crate::agent::BoundaryDecisionAgent;
use crate::boundary::extract_candidates;
use crate::error::ChunkerError;
use crate::merger::merge_chunks;
use crate::reviewer::{ConcurrentBoundaryReviewer, ReviewStats};
use crate::splitter::{HashEmbedder, SentenceEmbedder, StageOneSplitter};

// ── Contracts ────────────────────────────────────────────────────────

/// Input to one pipeline run.
#[derive(Debug, Clone)]
pub struct ChunkingRequest {
    pub document_id: DocumentId,
    pub text: String,
    pub config: ChunkingConfig,
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkingReport {
    pub merged: usize,
    pub kept: usize,
    pub errored: usize,
    /// Mean confidence over successful oracle decisions only.
    pub avg_confidence: f32,
    pub stage_one_chunks: usize,
    pub final_chunks: usize,
    pub elapsed_ms: u64,
    pub completed_at: DateTime<Utc>,
}

/// Successful result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkingResult {
    pub document_id: DocumentId,
    pub chunks: Vec<Chunk>,
    pub report: ChunkingReport,
}

/// Serialized outcome contract for API/CLI boundaries.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChunkingOutcome {
    Completed {
        document_id: DocumentId,
        chunks: Vec<Chunk>,
        report: ChunkingReport,
    },
    Error {
        document_id: DocumentId,
        error: String,
        message: String,
    },
}

impl ChunkingOutcome {
    pub fn from_result(
        document_id: DocumentId,
        result: Result<ChunkingResult, ChunkerError>,
    ) -> Self {
        match result {
            Ok(result) => ChunkingOutcome::Completed {
                document_id: result.document_id,
                chunks: result.chunks,
                report: result.report,
            },
            Err(e) => ChunkingOutcome::Error {
                document_id,
                error: e.code().to_string(),
                message: e.to_string(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ChunkingOutcome::Error { .. })
    }
}

// ── Pipeline ─────────────────────────────────────────────────────────

/// Dependency-injected pipeline handle. Constructed once at process start
/// and shared by reference across runs; each run owns its chunks
/// exclusively.
pub struct ChunkingPipeline {
    provider: Arc<dyn LlmProvider>,
    embedder: Arc<dyn SentenceEmbedder>,
}

impl ChunkingPipeline {
    pub fn new(provider: Arc<dyn LlmProvider>, embedder: Arc<dyn SentenceEmbedder>) -> Self {
        Self { provider, embedder }
    }

    /// Pipeline with the local feature-hash embedder for stage one.
    pub fn with_default_embedder(provider: Arc<dyn LlmProvider>) -> Self {
        Self::new(provider, Arc::new(HashEmbedder))
    }

    /// Run the full two-stage pipeline for one document.
    pub async fn run(&self, request: ChunkingRequest) -> Result<ChunkingResult, ChunkerError> {
        if request.text.trim().is_empty() {
            return Err(ChunkerError::EmptyInput);
        }

        let start = Instant::now();
        let config = &request.config;
        let document_id = request.document_id;

        info!(%document_id, "stage one: splitting");
        let stage_one = self.split(&request);
        let stage_one_count = stage_one.len();
        info!(%document_id, chunks = stage_one_count, "stage one complete");

        if stage_one_count <= 1 {
            // Nothing to review: a single chunk has no boundaries.
            return Ok(finish(document_id, stage_one, stage_one_count, ReviewStats::default(), start));
        }

        let candidates = extract_candidates(&stage_one, config.boundary_context_chars);

        info!(%document_id, boundaries = candidates.len(), "stage two: boundary review");
        let agent = Arc::new(BoundaryDecisionAgent::new(
            Arc::clone(&self.provider),
            config.review_timeout(),
        ));
        let reviewer = ConcurrentBoundaryReviewer::new(agent, config.max_concurrent_reviews);
        let (decisions, stats) = reviewer.review_all(candidates).await;

        let metadata = stage_one[0].metadata.clone();
        let chunks = merge_chunks(document_id, stage_one, &decisions, metadata)?;

        info!(%document_id, final_chunks = chunks.len(), "pipeline complete");
        Ok(finish(document_id, chunks, stage_one_count, stats, start))
    }

    /// Stage one only — no oracle calls. Useful when no oracle is reachable
    /// or the caller wants the raw semantic split.
    pub fn split_only(&self, request: ChunkingRequest) -> Result<ChunkingResult, ChunkerError> {
        if request.text.trim().is_empty() {
            return Err(ChunkerError::EmptyInput);
        }
        let start = Instant::now();
        let document_id = request.document_id;
        let chunks = self.split(&request);
        let count = chunks.len();
        Ok(finish(document_id, chunks, count, ReviewStats::default(), start))
    }

    fn split(&self, request: &ChunkingRequest) -> Vec<Chunk> {
        let splitter =
            StageOneSplitter::new(request.config.clone(), Arc::clone(&self.embedder));
        splitter.split(request.document_id, &request.text)
    }
}

fn finish(
    document_id: DocumentId,
    chunks: Vec<Chunk>,
    stage_one_chunks: usize,
    stats: ReviewStats,
    start: Instant,
) -> ChunkingResult {
    let report = ChunkingReport {
        merged: stats.merged,
        kept: stats.kept,
        errored: stats.errored,
        avg_confidence: stats.avg_confidence,
        stage_one_chunks,
        final_chunks: chunks.len(),
        elapsed_ms: start.elapsed().as_millis() as u64,
        completed_at: Utc::now(),
    };
    ChunkingResult { document_id, chunks, report }
}
