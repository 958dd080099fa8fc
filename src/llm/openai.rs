//! OpenAI-compatible chat completions client.

use super::{CompletionRequest, LlmClient, LlmError};
use crate::config::LlmConfig;
use crate::retry::{self, Retryable, RetryConfig};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Client for any endpoint speaking the chat completions dialect.
///
/// Transient failures (429, 5xx, transport errors) are retried with
/// exponential backoff and jitter before surfacing [`LlmError::Unavailable`]
/// semantics to the caller.
pub struct OpenAiClient {
    http: reqwest::Client,
    completions_url: String,
    api_key: String,
    model: String,
    retry: RetryConfig,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow::anyhow!("llm.api_key is required for the openai provider"))?
            .to_string();

        let base = url::Url::parse(&config.base_url)
            .map_err(|e| anyhow::anyhow!("invalid llm.base_url {:?}: {e}", config.base_url))?;
        let completions_url = format!(
            "{}/chat/completions",
            base.as_str().trim_end_matches('/')
        );

        Ok(Self {
            http: reqwest::Client::new(),
            completions_url,
            api_key,
            model: config.model.clone(),
            retry: RetryConfig::completion(),
        })
    }

    async fn attempt(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
        });

        let response = self
            .http
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            return Err(LlmError::Http {
                status: status.as_u16(),
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

        Ok(text)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        retry::execute(&self.retry, "llm.complete", || self.attempt(&request))
            .await
            .map_err(|error| {
                // Persistent transient failure reads as "backend down" to
                // the rest of the engine.
                if error.is_retryable() {
                    LlmError::Unavailable
                } else {
                    error
                }
            })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}
