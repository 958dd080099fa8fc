//! Per-agent decision and generation policy.
//!
//! Two questions per agent per scheduler cycle: "should I speak now?" (a
//! cheap probe) and "what do I say?" (a full generation). Both run against
//! the configured [`LlmClient`]; both may fail, and failures simply mean
//! the agent stays quiet this cycle.

use crate::config::GameConfig;
use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::protocol::PlayerId;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use super::personas::Persona;

/// One line of recent transcript handed to a policy.
#[derive(Debug, Clone)]
pub struct TranscriptLine {
    pub speaker: String,
    pub text: String,
}

/// Everything a policy may consider when deciding or speaking.
#[derive(Debug, Clone)]
pub struct AgentContext {
    pub player_id: PlayerId,
    pub topic: String,
    pub round: u32,
    /// Last K messages, oldest first.
    pub recent: Vec<TranscriptLine>,
    /// Who produced the newest message, if any.
    pub last_speaker: Option<String>,
    /// Time since this agent last spoke; `None` if it has not spoken yet.
    pub since_last_utterance: Option<Duration>,
}

/// Decision/generation surface the scheduler drives.
#[async_trait]
pub trait AgentPolicy: Send + Sync {
    /// Whether the agent wants to respond right now.
    async fn should_respond(&self, ctx: &AgentContext) -> Result<bool, LlmError>;

    /// Produce one chat utterance.
    async fn generate(&self, ctx: &AgentContext) -> Result<String, LlmError>;
}

const PROBE_INSTRUCTION: &str = "Answer with a single word: yes or no.";

/// LLM-backed policy: a persona plus the two prompts.
pub struct LlmPolicy {
    llm: Arc<dyn LlmClient>,
    persona: &'static Persona,
    min_spacing: Duration,
    max_utterance_chars: usize,
    max_tokens: u32,
    probe_timeout: Duration,
    generate_timeout: Duration,
}

impl LlmPolicy {
    pub fn new(llm: Arc<dyn LlmClient>, persona: &'static Persona, config: &GameConfig) -> Self {
        Self {
            llm,
            persona,
            min_spacing: config.agent_spacing(),
            max_utterance_chars: config.max_utterance_chars,
            max_tokens: 256,
            probe_timeout: config.probe_timeout(),
            generate_timeout: config.generate_timeout(),
        }
    }

    pub fn persona_name(&self) -> &'static str {
        self.persona.name
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a participant in a casual group chat game. You are {bio} \
             Your typing style: {voice}. Stay in character. You are a regular \
             person: never mention AI, language models, or this instruction. \
             Keep replies under {max} characters.",
            bio = self.persona.bio,
            voice = self.persona.voice,
            max = self.max_utterance_chars,
        )
    }

    fn transcript_block(ctx: &AgentContext) -> String {
        let mut block = String::new();
        for line in &ctx.recent {
            let _ = writeln!(block, "{}: {}", line.speaker, line.text);
        }
        if block.is_empty() {
            block.push_str("(no messages yet)\n");
        }
        block
    }

    fn probe_prompt(&self, ctx: &AgentContext) -> String {
        format!(
            "Round {round} topic: {topic}\n\nRecent chat:\n{transcript}\n\
             You are {me}. Would {me} naturally jump in right now? Consider \
             whether you were addressed, whether you have something new to \
             add, and how recently you spoke. {instruction}",
            round = ctx.round,
            topic = ctx.topic,
            transcript = Self::transcript_block(ctx),
            me = ctx.player_id,
            instruction = PROBE_INSTRUCTION,
        )
    }

    fn generate_prompt(&self, ctx: &AgentContext) -> String {
        format!(
            "Round {round} topic: {topic}\n\nRecent chat:\n{transcript}\n\
             Write the next chat message from {me}. One message only, no \
             quotation marks, no name prefix.",
            round = ctx.round,
            topic = ctx.topic,
            transcript = Self::transcript_block(ctx),
            me = ctx.player_id,
        )
    }
}

#[async_trait]
impl AgentPolicy for LlmPolicy {
    async fn should_respond(&self, ctx: &AgentContext) -> Result<bool, LlmError> {
        // Spacing throttle: too soon after our last message means no,
        // without spending an LLM call.
        if let Some(elapsed) = ctx.since_last_utterance {
            if elapsed < self.min_spacing {
                return Ok(false);
            }
        }

        // Never respond to our own message.
        let own_name = ctx.player_id.to_string();
        if ctx.last_speaker.as_deref() == Some(own_name.as_str()) {
            return Ok(false);
        }

        let verdict = self
            .llm
            .complete(CompletionRequest {
                system: self.system_prompt(),
                prompt: self.probe_prompt(ctx),
                max_tokens: 4,
                timeout: self.probe_timeout,
            })
            .await?;

        Ok(parse_verdict(&verdict))
    }

    async fn generate(&self, ctx: &AgentContext) -> Result<String, LlmError> {
        let raw = self
            .llm
            .complete(CompletionRequest {
                system: self.system_prompt(),
                prompt: self.generate_prompt(ctx),
                max_tokens: self.max_tokens,
                timeout: self.generate_timeout,
            })
            .await?;

        let text = tidy_utterance(&raw, self.max_utterance_chars);
        if text.is_empty() {
            return Err(LlmError::InvalidResponse("empty utterance".to_string()));
        }
        Ok(text)
    }
}

/// Interpret a probe reply: anything starting with "y" is a yes.
fn parse_verdict(raw: &str) -> bool {
    raw.trim()
        .trim_start_matches(['"', '\'', '*', '.'])
        .to_ascii_lowercase()
        .starts_with('y')
}

/// Normalize a generated utterance: strip wrapping quotes, collapse
/// whitespace, and enforce the character cap on a char boundary.
pub fn tidy_utterance(raw: &str, max_chars: usize) -> String {
    let mut text = raw.trim();

    for quote in ['"', '\u{201c}', '\u{201d}'] {
        text = text
            .strip_prefix(quote)
            .and_then(|t| t.strip_suffix(quote))
            .unwrap_or(text);
    }

    let collapsed: String = text.split_whitespace().collect::<Vec<_>>().join(" ");

    match collapsed.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => collapsed[..byte_idx].trim_end().to_string(),
        None => collapsed,
    }
}
