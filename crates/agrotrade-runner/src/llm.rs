//! HTTP chat backends that speak for the negotiating parties.
//!
//! One [`LlmBackend`] wraps a `reqwest` client plus the wire dialect of the
//! configured provider. Both dialects receive the party's role prompt as
//! the system message and the rendered transcript as the single user
//! message; they differ only in endpoint, headers and response shape.

use serde::{Deserialize, Serialize};

use crate::config::{BackendType, LlmBackendConfig};
use crate::error::RunnerError;
use crate::prompt::RenderedPrompt;

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// `POST {api_url}/chat/completions` body.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// `POST {api_url}/messages` body.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// A configured chat backend.
pub struct LlmBackend {
    client: reqwest::Client,
    config: LlmBackendConfig,
}

impl LlmBackend {
    /// Provider name for logging.
    pub const fn name(&self) -> &'static str {
        match self.config.backend_type {
            BackendType::OpenAi => "openai-compatible",
            BackendType::Anthropic => "anthropic",
        }
    }

    /// Send one turn's prompt and return the raw reply text.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::LlmBackend`] on transport failures, non-2xx
    /// statuses, or a response without any text.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, RunnerError> {
        let cfg = &self.config;
        let request = match cfg.backend_type {
            BackendType::OpenAi => self
                .client
                .post(format!("{}/chat/completions", cfg.api_url))
                .bearer_auth(&cfg.api_key)
                .json(&ChatCompletionRequest {
                    model: &cfg.model,
                    messages: [
                        ChatMessage { role: "system", content: &prompt.system },
                        ChatMessage { role: "user", content: &prompt.user },
                    ],
                    temperature: cfg.temperature,
                    max_tokens: cfg.max_tokens,
                }),
            BackendType::Anthropic => self
                .client
                .post(format!("{}/messages", cfg.api_url))
                .header("x-api-key", &cfg.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&MessagesRequest {
                    model: &cfg.model,
                    system: &prompt.system,
                    messages: [ChatMessage { role: "user", content: &prompt.user }],
                    temperature: cfg.temperature,
                    max_tokens: cfg.max_tokens,
                }),
        };

        let response = request
            .send()
            .await
            .map_err(|e| RunnerError::LlmBackend(format!("{} request failed: {e}", self.name())))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            RunnerError::LlmBackend(format!("{} body unreadable: {e}", self.name()))
        })?;
        if !status.is_success() {
            return Err(RunnerError::LlmBackend(format!(
                "{} returned {status}: {body}",
                self.name()
            )));
        }

        match cfg.backend_type {
            BackendType::OpenAi => chat_completion_text(&body),
            BackendType::Anthropic => messages_text(&body),
        }
    }
}

/// Text of the first choice of a chat completion.
fn chat_completion_text(body: &str) -> Result<String, RunnerError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| RunnerError::LlmBackend(format!("unexpected chat completion body: {e}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| RunnerError::LlmBackend("chat completion carried no content".to_owned()))
}

/// Concatenated `text` blocks of a Messages response. Thinking blocks are skipped.
fn messages_text(body: &str) -> Result<String, RunnerError> {
    let parsed: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| RunnerError::LlmBackend(format!("unexpected messages body: {e}")))?;
    let text: String = parsed
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();
    if text.is_empty() {
        return Err(RunnerError::LlmBackend("messages response carried no text".to_owned()));
    }
    Ok(text)
}

/// Build the backend selected by `LLM_BACKEND`.
pub fn create_backend(config: &LlmBackendConfig) -> LlmBackend {
    LlmBackend {
        client: reqwest::Client::new(),
        config: config.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_config(backend_type: BackendType) -> LlmBackendConfig {
        LlmBackendConfig {
            backend_type,
            api_url: "http://localhost:1234/v1".to_owned(),
            api_key: "lm-studio".to_owned(),
            model: "local-model".to_owned(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    #[test]
    fn first_choice_content_is_the_reply() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "Ofereço R$14 por kg."}}]}"#;
        assert_eq!(chat_completion_text(body).ok().as_deref(), Some("Ofereço R$14 por kg."));
    }

    #[test]
    fn rate_limit_body_is_an_error() {
        assert!(chat_completion_text(r#"{"error": "rate_limit"}"#).is_err());
        assert!(chat_completion_text(r#"{"choices": [{"message": {"content": null}}]}"#).is_err());
    }

    #[test]
    fn thinking_blocks_are_skipped() {
        let body = r#"{"content": [
            {"type": "thinking", "thinking": "ele não vai ceder"},
            {"type": "text", "text": "Desisto da negociação."}
        ]}"#;
        assert_eq!(messages_text(body).ok().as_deref(), Some("Desisto da negociação."));
    }

    #[test]
    fn empty_messages_content_is_an_error() {
        assert!(messages_text(r#"{"content": []}"#).is_err());
    }

    #[test]
    fn chat_request_puts_role_prompt_first() {
        let request = ChatCompletionRequest {
            model: "m",
            messages: [
                ChatMessage { role: "system", content: "Você é Fz1." },
                ChatMessage { role: "user", content: "[Empresario]: Olá" },
            ],
            temperature: 0.5,
            max_tokens: 64,
        };
        let json = serde_json::to_value(&request).unwrap_or_default();
        assert_eq!(
            json.pointer("/messages/0/content").and_then(serde_json::Value::as_str),
            Some("Você é Fz1.")
        );
        assert_eq!(json.get("max_tokens").and_then(serde_json::Value::as_u64), Some(64));
    }

    #[test]
    fn backend_name_follows_config() {
        assert_eq!(create_backend(&backend_config(BackendType::OpenAi)).name(), "openai-compatible");
        assert_eq!(create_backend(&backend_config(BackendType::Anthropic)).name(), "anthropic");
    }
}
