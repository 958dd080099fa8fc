//! AI participants: personas, topics, and the decision/generation policy.

pub mod personas;
pub mod policy;
pub mod topics;

pub use personas::{persona_for_seat, Persona};
pub use policy::{AgentContext, AgentPolicy, LlmPolicy, TranscriptLine};
pub use topics::TopicPool;
