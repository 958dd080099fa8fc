//! Text-generation backends.
//!
//! The game core only sees [`LlmClient`]: one completion call with a
//! deadline. Provider selection, HTTP plumbing, and rate-limit retries all
//! stay behind the trait, so policies can be driven by a real model or by
//! the scripted backend interchangeably.

pub mod openai;
pub mod scripted;

use crate::config::{LlmConfig, LlmProviderKind};
use crate::retry::Retryable;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use openai::OpenAiClient;
pub use scripted::ScriptedClient;

/// A single completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt establishing the speaker.
    pub system: String,
    /// User-turn prompt.
    pub prompt: String,
    /// Token budget for the reply.
    pub max_tokens: u32,
    /// Hard deadline for this call.
    pub timeout: Duration,
}

/// Errors surfaced by completion backends.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("rate limited by provider")]
    RateLimited,
    #[error("provider returned HTTP {status}")]
    Http { status: u16 },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("completion deadline exceeded")]
    Timeout,
    #[error("malformed provider response: {0}")]
    InvalidResponse(String),
    #[error("backend unavailable")]
    Unavailable,
}

impl Retryable for LlmError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited | Self::Transport(_) | Self::Timeout => true,
            Self::Http { status } => *status >= 500,
            Self::InvalidResponse(_) | Self::Unavailable => false,
        }
    }
}

/// Abstract text generation. Implementations must be safe to call from
/// many worker tasks concurrently and must not share mutable state
/// across calls.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

/// Build the configured provider.
pub fn build_client(config: &LlmConfig) -> anyhow::Result<Arc<dyn LlmClient>> {
    match config.provider {
        LlmProviderKind::Openai => Ok(Arc::new(OpenAiClient::new(config)?)),
        LlmProviderKind::Scripted => Ok(Arc::new(ScriptedClient::new())),
    }
}
