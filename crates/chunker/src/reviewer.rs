//! Concurrent boundary reviewer.
//!
//! Fans candidate reviews out over a bounded pool of futures: at most
//! `max_concurrent` oracle calls are in flight at any instant. Completion
//! order is whatever the oracle's latency makes it; the returned decision
//! list is always sorted by boundary index because the merger applies
//! decisions strictly left to right.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::agent::{
    BoundaryDecision, BoundaryDecisionAgent, DecisionStatus, ReviewOutcome, Verdict,
};
use crate::boundary::BoundaryCandidate;

/// Aggregate statistics for one review pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewStats {
    pub merged: usize,
    pub kept: usize,
    pub errored: usize,
    /// Mean confidence over successful decisions only; 0.0 when none succeeded.
    pub avg_confidence: f32,
    pub elapsed: Duration,
}

pub struct ConcurrentBoundaryReviewer {
    agent: Arc<BoundaryDecisionAgent>,
    max_concurrent: usize,
}

impl ConcurrentBoundaryReviewer {
    pub fn new(agent: Arc<BoundaryDecisionAgent>, max_concurrent: usize) -> Self {
        Self {
            agent,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Review all candidates and return decisions sorted by boundary index,
    /// plus aggregate stats. Individual failures never abort the batch; they
    /// become conservative KEEP decisions and are counted.
    pub async fn review_all(
        &self,
        candidates: Vec<BoundaryCandidate>,
    ) -> (Vec<BoundaryDecision>, ReviewStats) {
        if candidates.is_empty() {
            return (Vec::new(), ReviewStats::default());
        }

        let start = Instant::now();
        let total = candidates.len();
        info!(boundaries = total, concurrency = self.max_concurrent, "reviewing boundaries");

        let mut decisions: Vec<BoundaryDecision> = stream::iter(candidates)
            .map(|candidate| {
                let agent = Arc::clone(&self.agent);
                async move {
                    let (outcome, latency) = agent.review(&candidate.snippet).await;
                    decide(candidate.boundary_index, outcome, latency)
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        decisions.sort_by_key(|d| d.boundary_index);

        let stats = aggregate(&decisions, start.elapsed());
        info!(
            merged = stats.merged,
            kept = stats.kept,
            errored = stats.errored,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "boundary review complete"
        );
        (decisions, stats)
    }
}

/// Convert one outcome into a decision, applying the conservative default:
/// never merge under uncertainty. An erroneous merge destroys a split
/// irreversibly, an erroneous keep is cheap to correct downstream.
fn decide(boundary_index: usize, outcome: ReviewOutcome, latency: Duration) -> BoundaryDecision {
    match outcome {
        ReviewOutcome::Success { verdict, confidence } => BoundaryDecision {
            boundary_index,
            verdict,
            confidence,
            status: DecisionStatus::Success,
            latency,
        },
        ReviewOutcome::Timeout => {
            warn!(boundary_index, "oracle call timed out — keeping split");
            BoundaryDecision {
                boundary_index,
                verdict: Verdict::Keep,
                confidence: 0.0,
                status: DecisionStatus::Timeout,
                latency,
            }
        }
        ReviewOutcome::Error(reason) => {
            warn!(boundary_index, %reason, "oracle call failed — keeping split");
            BoundaryDecision {
                boundary_index,
                verdict: Verdict::Keep,
                confidence: 0.0,
                status: DecisionStatus::Error,
                latency,
            }
        }
    }
}

fn aggregate(decisions: &[BoundaryDecision], elapsed: Duration) -> ReviewStats {
    let mut stats = ReviewStats { elapsed, ..ReviewStats::default() };
    let mut confidence_sum = 0.0f32;
    let mut successes = 0usize;

    for decision in decisions {
        match decision.status {
            DecisionStatus::Success => {
                successes += 1;
                confidence_sum += decision.confidence;
                match decision.verdict {
                    Verdict::Merge => stats.merged += 1,
                    Verdict::Keep => stats.kept += 1,
                }
            }
            DecisionStatus::Timeout | DecisionStatus::Error => stats.errored += 1,
        }
    }

    if successes > 0 {
        stats.avg_confidence = confidence_sum / successes as f32;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(
        boundary_index: usize,
        verdict: Verdict,
        confidence: f32,
        status: DecisionStatus,
    ) -> BoundaryDecision {
        BoundaryDecision {
            boundary_index,
            verdict,
            confidence,
            status,
            latency: Duration::from_millis(5),
        }
    }

    #[test]
    fn aggregate_counts_verdicts_and_errors() {
        let decisions = vec![
            decision(0, Verdict::Merge, 0.9, DecisionStatus::Success),
            decision(1, Verdict::Keep, 0.7, DecisionStatus::Success),
            decision(2, Verdict::Keep, 0.0, DecisionStatus::Timeout),
            decision(3, Verdict::Keep, 0.0, DecisionStatus::Error),
        ];
        let stats = aggregate(&decisions, Duration::from_millis(100));
        assert_eq!(stats.merged, 1);
        assert_eq!(stats.kept, 1);
        assert_eq!(stats.errored, 2);
        assert!((stats.avg_confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn aggregate_zeroes_confidence_without_successes() {
        let decisions = vec![decision(0, Verdict::Keep, 0.0, DecisionStatus::Timeout)];
        let stats = aggregate(&decisions, Duration::ZERO);
        assert_eq!(stats.avg_confidence, 0.0);
        assert_eq!(stats.errored, 1);
    }

    #[test]
    fn decide_applies_conservative_default() {
        let timeout = decide(3, ReviewOutcome::Timeout, Duration::from_secs(10));
        assert_eq!(timeout.verdict, Verdict::Keep);
        assert_eq!(timeout.confidence, 0.0);
        assert_eq!(timeout.status, DecisionStatus::Timeout);
        assert_eq!(timeout.boundary_index, 3);

        let errored = decide(
            1,
            ReviewOutcome::Error("boom".to_string()),
            Duration::from_millis(2),
        );
        assert_eq!(errored.verdict, Verdict::Keep);
        assert_eq!(errored.status, DecisionStatus::Error);
    }

    #[test]
    fn decide_passes_success_through() {
        let ok = decide(
            0,
            ReviewOutcome::Success { verdict: Verdict::Merge, confidence: 0.95 },
            Duration::from_millis(8),
        );
        assert_eq!(ok.verdict, Verdict::Merge);
        assert_eq!(ok.status, DecisionStatus::Success);
        assert!((ok.confidence - 0.95).abs() < 1e-6);
    }
}
