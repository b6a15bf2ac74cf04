//! Anthropic chat backend (`/v1/messages`).
//!
//! The Messages API takes the system prompt as a top-level field, so system
//! messages are peeled off before the request is built.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::provider::{LlmError, LlmProvider, Message, Role};

const BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let (system_parts, chat): (Vec<_>, Vec<_>) = messages
            .into_iter()
            .partition(|m| matches!(m.role, Role::System));
        let system = if system_parts.is_empty() {
            None
        } else {
            Some(
                system_parts
                    .into_iter()
                    .map(|m| m.content)
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            )
        };

        let url = format!("{BASE_URL}/v1/messages");
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            temperature,
            system,
            messages: chat,
        };

        debug!(model = %self.model, "sending Anthropic messages request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let text = parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            return Err(LlmError::ParseError("response contained no text blocks".to_string()));
        }

        Ok(text.trim().to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_deserializes() {
        let raw = r#"{"id":"msg_1","content":[{"type":"text","text":"{\"verdict\":\"keep\"}"}],"model":"claude-sonnet-4-5-20250929"}"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.content[0].text, "{\"verdict\":\"keep\"}");
    }

    #[test]
    fn provider_reports_model() {
        let provider = AnthropicProvider::new("key".into(), "claude-sonnet-4-5-20250929".into());
        assert_eq!(provider.model(), "claude-sonnet-4-5-20250929");
    }
}
