//! Concrete oracle backends and the provider factory.

pub mod anthropic;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use mosaik_core::config::{LlmConfig, OllamaConfig};

use crate::provider::{LlmError, LlmProvider};

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Create the provider named by `llm_config.provider`.
///
/// The returned handle is shared (`Arc`) because boundary review issues many
/// concurrent calls against a single provider instance.
pub fn create_provider(
    llm_config: &LlmConfig,
    ollama_config: &OllamaConfig,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match llm_config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaProvider::new(
            ollama_config.url.clone(),
            ollama_config.model.clone(),
        ))),
        "openai" => {
            let api_key = llm_config
                .openai_api_key
                .clone()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".to_string()))?;
            Ok(Arc::new(OpenAiProvider::new(
                api_key,
                llm_config.openai_model.clone(),
                llm_config.openai_base_url.clone(),
            )))
        }
        "anthropic" => {
            let api_key = llm_config
                .anthropic_api_key
                .clone()
                .ok_or_else(|| LlmError::NotConfigured("ANTHROPIC_API_KEY not set".to_string()))?;
            Ok(Arc::new(AnthropicProvider::new(
                api_key,
                llm_config.anthropic_model.clone(),
            )))
        }
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider '{other}' (expected ollama, openai, or anthropic)"
        ))),
    }
}
