//! LLM provider selection and request parameters.

use super::defaults::{default_llm_base_url, default_llm_model};
use serde::{Deserialize, Serialize};

/// Which text-generation backend drives the agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// Any OpenAI-compatible chat completions endpoint.
    Openai,
    /// Built-in canned responses; no network, no key. Useful for local
    /// play-testing and CI.
    #[default]
    Scripted,
}

/// LLM configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProviderKind,
    /// Model identifier passed to the provider
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// API key; required for the `openai` provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL of the chat completions API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            model: default_llm_model(),
            api_key: None,
            base_url: default_llm_base_url(),
        }
    }
}
