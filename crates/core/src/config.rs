use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f32(key: &str, default: f32) -> f32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub chunking: ChunkingConfig,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            chunking: ChunkingConfig::from_env(),
            llm: LlmConfig::from_env(),
            ollama: OllamaConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  chunking:  target_size={}, threshold={}, window={}, concurrency={}, timeout={}s",
            self.chunking.target_chunk_size,
            self.chunking.similarity_threshold,
            self.chunking.boundary_context_chars,
            self.chunking.max_concurrent_reviews,
            self.chunking.review_timeout_secs,
        );
        tracing::info!("  llm:       provider={}", self.llm.provider);
        tracing::info!("  ollama:    url={}, model={}", self.ollama.url, self.ollama.model);
    }
}

// ── Chunking ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkingConfig {
    /// Soft target for stage-one chunk size, in characters.
    pub target_chunk_size: usize,
    /// Cosine similarity below which the splitter opens a new chunk.
    pub similarity_threshold: f32,
    /// Characters of context taken from each side of a boundary snippet.
    pub boundary_context_chars: usize,
    /// Maximum oracle calls in flight during boundary review.
    pub max_concurrent_reviews: usize,
    /// Per-call oracle timeout, in seconds.
    pub review_timeout_secs: u32,
    /// Oracle model identifier, echoed into chunk metadata and reports.
    pub oracle_model: String,
}

impl ChunkingConfig {
    pub fn from_env() -> Self {
        Self {
            target_chunk_size: env_usize("CHUNK_TARGET_SIZE", 1200),
            similarity_threshold: env_f32("CHUNK_SIMILARITY_THRESHOLD", 0.35),
            boundary_context_chars: env_usize("CHUNK_BOUNDARY_CONTEXT", 200),
            max_concurrent_reviews: env_usize("CHUNK_MAX_CONCURRENT_REVIEWS", 8).max(1),
            review_timeout_secs: env_u32("CHUNK_REVIEW_TIMEOUT_SECS", 10),
            oracle_model: env_or("CHUNK_ORACLE_MODEL", "llama3.2"),
        }
    }

    pub fn review_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.review_timeout_secs))
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_chunk_size: 1200,
            similarity_threshold: 0.35,
            boundary_context_chars: 200,
            max_concurrent_reviews: 8,
            review_timeout_secs: 10,
            oracle_model: "llama3.2".to_string(),
        }
    }
}

// ── LLM (OpenAI / Anthropic / Ollama) ─────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai", "anthropic", "ollama"
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            provider: env_or("LLM_PROVIDER", "ollama"),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: env_opt("OPENAI_BASE_URL"),
            anthropic_api_key: env_opt("ANTHROPIC_API_KEY"),
            anthropic_model: env_or("ANTHROPIC_MODEL", "claude-sonnet-4-5-20250929"),
            temperature: env_f32("LLM_TEMPERATURE", 0.0),
            max_tokens: env_u32("LLM_MAX_TOKENS", 256),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "anthropic" => self.anthropic_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }

    /// Model identifier of the active provider.
    pub fn active_model<'a>(&'a self, ollama: &'a OllamaConfig) -> &'a str {
        match self.provider.as_str() {
            "openai" => &self.openai_model,
            "anthropic" => &self.anthropic_model,
            _ => &ollama.model,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: None,
            anthropic_api_key: None,
            anthropic_model: "claude-sonnet-4-5-20250929".to_string(),
            temperature: 0.0,
            max_tokens: 256,
        }
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        Self {
            url: env_or("OLLAMA_URL", "http://localhost:11434"),
            model: env_or("OLLAMA_MODEL", "llama3.2"),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_defaults_are_sane() {
        let cfg = ChunkingConfig::default();
        assert!(cfg.target_chunk_size > 0);
        assert!(cfg.similarity_threshold > 0.0 && cfg.similarity_threshold < 1.0);
        assert!(cfg.max_concurrent_reviews >= 1);
        assert_eq!(cfg.review_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn llm_config_reports_configured_providers() {
        let mut cfg = LlmConfig::default();
        assert!(cfg.is_configured(), "ollama needs no key");

        cfg.provider = "openai".to_string();
        assert!(!cfg.is_configured());
        cfg.openai_api_key = Some("sk-test".to_string());
        assert!(cfg.is_configured());

        cfg.provider = "something-else".to_string();
        assert!(!cfg.is_configured());
    }

    #[test]
    fn active_model_follows_provider() {
        let mut llm = LlmConfig::default();
        let ollama = OllamaConfig::default();
        assert_eq!(llm.active_model(&ollama), "llama3.2");
        llm.provider = "openai".to_string();
        assert_eq!(llm.active_model(&ollama), "gpt-4o-mini");
    }
}
