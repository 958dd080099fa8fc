//! Scripted completion backend: canned responses, no network.
//!
//! Doubles as the offline play-testing provider and the deterministic test
//! double. Probe prompts (those asking for a yes/no verdict) are answered
//! "yes" so scripted agents stay talkative.

use super::{CompletionRequest, LlmClient, LlmError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Marker the probe prompt carries; scripted mode keys off it.
const PROBE_MARKER: &str = "yes or no";

const STOCK_LINES: &[&str] = &[
    "honestly I'd pick the window seat every time",
    "wait, has anyone here actually tried that?",
    "I keep going back and forth on this one",
    "strong disagree, but I see where you're coming from",
    "that reminds me of something that happened last week",
    "ok but nobody has answered the real question yet",
    "I'll say it: overrated",
    "can we circle back to what Player 1 said earlier?",
];

enum Script {
    /// Rotate through the stock lines forever; answer probes with "yes".
    Stock,
    /// Pop responses from a fixed queue; error once exhausted.
    Queue(Mutex<VecDeque<String>>),
    /// Every call fails.
    Failing,
}

/// Deterministic [`LlmClient`] with optional artificial latency.
pub struct ScriptedClient {
    script: Script,
    cursor: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedClient {
    /// Stock behavior: always willing to speak, rotating canned lines.
    pub fn new() -> Self {
        Self {
            script: Script::Stock,
            cursor: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Answer calls strictly from the given queue (probes included), then
    /// fail with [`LlmError::Unavailable`].
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Script::Queue(Mutex::new(
                responses.into_iter().map(Into::into).collect(),
            )),
            cursor: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// A backend where every call fails; exercises the swallow-and-log path.
    pub fn failing() -> Self {
        Self {
            script: Script::Failing,
            cursor: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Add fixed latency to every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.script {
            Script::Stock => {
                if request.prompt.contains(PROBE_MARKER) {
                    return Ok("yes".to_string());
                }
                let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % STOCK_LINES.len();
                // SAFETY: index is reduced modulo the slice length.
                #[allow(clippy::indexing_slicing)]
                Ok(STOCK_LINES[idx].to_string())
            }
            Script::Queue(queue) => {
                let mut queue = queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                queue.pop_front().ok_or(LlmError::Unavailable)
            }
            Script::Failing => Err(LlmError::Unavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> CompletionRequest {
        CompletionRequest {
            system: "test".to_string(),
            prompt: prompt.to_string(),
            max_tokens: 64,
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn stock_mode_accepts_probes_and_rotates_lines() {
        let client = ScriptedClient::new();
        let verdict = client
            .complete(request("Answer with a single word: yes or no."))
            .await
            .unwrap();
        assert_eq!(verdict, "yes");

        let first = client.complete(request("say something")).await.unwrap();
        let second = client.complete(request("say something")).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn queue_mode_exhausts_then_fails() {
        let client = ScriptedClient::with_responses(["yes", "a line"]);
        assert_eq!(client.complete(request("probe")).await.unwrap(), "yes");
        assert_eq!(client.complete(request("speak")).await.unwrap(), "a line");
        assert_eq!(
            client.complete(request("speak")).await.unwrap_err(),
            LlmError::Unavailable
        );
    }

    #[tokio::test]
    async fn failing_mode_always_errors() {
        let client = ScriptedClient::failing();
        assert!(client.complete(request("anything")).await.is_err());
    }
}
