//! Boundary decision agent.
//!
//! Wraps one oracle call per boundary: a fixed prompt template is rendered
//! with the snippet, the call runs under a per-call timeout, and the reply
//! is parsed into a tagged [`ReviewOutcome`]. The agent never decides what
//! a failure means — the reviewer converts non-success outcomes to the
//! conservative default.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use mosaik_llm::{LlmProvider, Message};

/// Sampling settings for review calls. Verdicts should be short and
/// repeatable, so temperature stays at zero.
const REVIEW_TEMPERATURE: f32 = 0.0;
const REVIEW_MAX_TOKENS: u32 = 128;

const SNIPPET_PLACEHOLDER: &str = "<<<snippet>>>";

const SYSTEM_PROMPT: &str = "You review boundaries between adjacent text chunks produced by a \
document splitter. Given the end of one chunk and the start of the next, decide whether they \
continue the same thought (MERGE) or start a new topic (KEEP). Respond ONLY with JSON: \
{\"verdict\": \"MERGE\" or \"KEEP\", \"confidence\": 0.0-1.0}. No explanation.";

const REVIEW_TEMPLATE: &str = "The marker ---BOUNDARY--- separates the end of chunk A from the \
start of chunk B:\n\n<<<snippet>>>\n\nShould these chunks be merged? Respond with JSON only.";

/// Render the user prompt for a boundary snippet.
fn render_prompt(snippet: &str) -> String {
    REVIEW_TEMPLATE.replace(SNIPPET_PLACEHOLDER, snippet)
}

// ── Decision types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Merge,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    Success,
    Timeout,
    Error,
}

/// Final decision for one boundary, as handed to the merger and the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryDecision {
    pub boundary_index: usize,
    pub verdict: Verdict,
    pub confidence: f32,
    pub status: DecisionStatus,
    pub latency: Duration,
}

/// Outcome of a single oracle call, before the conservative default is
/// applied. Matched exhaustively at the call site.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    Success { verdict: Verdict, confidence: f32 },
    Timeout,
    Error(String),
}

// ── Agent ────────────────────────────────────────────────────────────

/// Immutable per-pipeline agent: provider handle plus call timeout. Built
/// once and shared across all concurrent review calls.
pub struct BoundaryDecisionAgent {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl BoundaryDecisionAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Review one boundary snippet. Always returns within roughly the
    /// configured timeout; the latency of the attempt is always reported.
    pub async fn review(&self, snippet: &str) -> (ReviewOutcome, Duration) {
        let start = Instant::now();
        let messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(render_prompt(snippet)),
        ];

        let outcome = match tokio::time::timeout(
            self.timeout,
            self.provider
                .complete(messages, REVIEW_TEMPERATURE, REVIEW_MAX_TOKENS),
        )
        .await
        {
            Err(_) => ReviewOutcome::Timeout,
            Ok(Err(e)) => ReviewOutcome::Error(e.to_string()),
            Ok(Ok(response)) => parse_verdict(&response),
        };

        let latency = start.elapsed();
        debug!(latency_ms = latency.as_millis() as u64, outcome = ?outcome, "boundary reviewed");
        (outcome, latency)
    }
}

// ── Reply parsing ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct OracleReply {
    verdict: String,
    #[serde(default)]
    confidence: f32,
}

/// Parse an oracle reply into an outcome. Anything that is not a
/// well-formed MERGE/KEEP verdict becomes an `Error` outcome.
fn parse_verdict(response: &str) -> ReviewOutcome {
    let json = extract_json(response);
    let reply: OracleReply = match serde_json::from_str(json) {
        Ok(reply) => reply,
        Err(e) => return ReviewOutcome::Error(format!("malformed oracle reply: {e}")),
    };

    let verdict = match reply.verdict.to_ascii_uppercase().as_str() {
        "MERGE" => Verdict::Merge,
        "KEEP" => Verdict::Keep,
        other => return ReviewOutcome::Error(format!("unrecognized verdict '{other}'")),
    };

    ReviewOutcome::Success {
        verdict,
        confidence: reply.confidence.clamp(0.0, 1.0),
    }
}

/// Extract JSON from an oracle response, handling markdown code blocks.
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    // Handle ```json ... ``` blocks
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    // Handle ``` ... ``` blocks
    if let Some(start) = trimmed.find("```") {
        let json_start = start + 3;
        let after_tick = &trimmed[json_start..];
        let content_start = after_tick.find('\n').map_or(0, |n| n + 1);
        if let Some(end) = after_tick[content_start..].find("```") {
            return after_tick[content_start..content_start + end].trim();
        }
    }

    // Try raw JSON (starts with {)
    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            return &trimmed[start..=end];
        }
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mosaik_llm::LlmError;

    struct CannedOracle {
        response: String,
    }

    #[async_trait]
    impl LlmProvider for CannedOracle {
        async fn complete(
            &self,
            _messages: Vec<Message>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, LlmError> {
            Ok(self.response.clone())
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    struct SlowOracle;

    #[async_trait]
    impl LlmProvider for SlowOracle {
        async fn complete(
            &self,
            _messages: Vec<Message>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("never".to_string())
        }

        fn model(&self) -> &str {
            "slow"
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl LlmProvider for FailingOracle {
        async fn complete(
            &self,
            _messages: Vec<Message>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, LlmError> {
            Err(LlmError::ApiError { status: 503, body: "overloaded".to_string() })
        }

        fn model(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn render_prompt_substitutes_snippet() {
        let prompt = render_prompt("left\n---BOUNDARY---\nright");
        assert!(prompt.contains("left\n---BOUNDARY---\nright"));
        assert!(!prompt.contains(SNIPPET_PLACEHOLDER));
    }

    #[test]
    fn parse_verdict_accepts_plain_json() {
        let outcome = parse_verdict(r#"{"verdict": "MERGE", "confidence": 0.9}"#);
        assert_eq!(
            outcome,
            ReviewOutcome::Success { verdict: Verdict::Merge, confidence: 0.9 }
        );
    }

    #[test]
    fn parse_verdict_accepts_code_block_and_lowercase() {
        let outcome = parse_verdict("```json\n{\"verdict\": \"keep\", \"confidence\": 0.7}\n```");
        assert_eq!(
            outcome,
            ReviewOutcome::Success { verdict: Verdict::Keep, confidence: 0.7 }
        );
    }

    #[test]
    fn parse_verdict_clamps_confidence() {
        let outcome = parse_verdict(r#"{"verdict": "MERGE", "confidence": 3.5}"#);
        assert_eq!(
            outcome,
            ReviewOutcome::Success { verdict: Verdict::Merge, confidence: 1.0 }
        );
    }

    #[test]
    fn parse_verdict_rejects_garbage() {
        assert!(matches!(parse_verdict("sure, merge them!"), ReviewOutcome::Error(_)));
        assert!(matches!(
            parse_verdict(r#"{"verdict": "MAYBE", "confidence": 0.5}"#),
            ReviewOutcome::Error(_)
        ));
    }

    #[tokio::test]
    async fn review_returns_success_for_valid_reply() {
        let agent = BoundaryDecisionAgent::new(
            Arc::new(CannedOracle {
                response: r#"{"verdict": "MERGE", "confidence": 0.8}"#.to_string(),
            }),
            Duration::from_secs(5),
        );
        let (outcome, latency) = agent.review("a---BOUNDARY---b").await;
        assert_eq!(
            outcome,
            ReviewOutcome::Success { verdict: Verdict::Merge, confidence: 0.8 }
        );
        assert!(latency < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn review_times_out_slow_oracle() {
        let agent =
            BoundaryDecisionAgent::new(Arc::new(SlowOracle), Duration::from_millis(50));
        let (outcome, latency) = agent.review("snippet").await;
        assert_eq!(outcome, ReviewOutcome::Timeout);
        assert!(latency >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn review_reports_oracle_errors() {
        let agent =
            BoundaryDecisionAgent::new(Arc::new(FailingOracle), Duration::from_secs(5));
        let (outcome, _) = agent.review("snippet").await;
        assert!(matches!(outcome, ReviewOutcome::Error(_)));
    }
}
