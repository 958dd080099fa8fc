use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use turing_hunt_server::agents::TopicPool;
use turing_hunt_server::bus::EventStream;
use turing_hunt_server::config::{GameConfig, StatsConfig};
use turing_hunt_server::llm::{LlmClient, ScriptedClient};
use turing_hunt_server::protocol::{EventEnvelope, GameEvent};
use turing_hunt_server::server::GameServer;

/// A server wired to a scripted LLM and a temp stats directory.
pub struct TestHarness {
    pub server: Arc<GameServer>,
    pub stats_dir: tempfile::TempDir,
}

/// Config tuned for tests: short phases, no agent spacing throttle.
#[allow(dead_code)]
pub fn fast_config() -> GameConfig {
    GameConfig {
        discussion_seconds: 5,
        voting_seconds: 3,
        min_agent_spacing_seconds: 0,
        ..GameConfig::default()
    }
}

#[allow(dead_code)]
pub fn harness_with(config: GameConfig, llm: Arc<dyn LlmClient>) -> TestHarness {
    let stats_dir = tempfile::tempdir().expect("temp stats dir");
    let stats = StatsConfig {
        dir: stats_dir.path().to_string_lossy().into_owned(),
    };
    let server = GameServer::with_topics(
        config,
        &stats,
        llm,
        TopicPool::with_topics(["topic one", "topic two", "topic three"]),
    );
    TestHarness { server, stats_dir }
}

#[allow(dead_code)]
pub fn harness() -> TestHarness {
    harness_with(fast_config(), Arc::new(ScriptedClient::new()))
}

/// Next envelope or panic; generous deadline so paused-clock tests
/// auto-advance through it.
#[allow(dead_code)]
pub async fn next_event(stream: &mut EventStream) -> Arc<EventEnvelope> {
    timeout(Duration::from_secs(60), stream.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event stream closed")
}

/// Drain events until one matches; returns the matching envelope.
#[allow(dead_code)]
pub async fn wait_for<F>(stream: &mut EventStream, mut matches: F) -> Arc<EventEnvelope>
where
    F: FnMut(&GameEvent) -> bool,
{
    loop {
        let envelope = next_event(stream).await;
        if matches(&envelope.event) {
            return envelope;
        }
    }
}

/// Like [`wait_for`] but without a deadline: for paused-clock tests where
/// auto-advance would fire the timeout ahead of real blocking I/O.
#[allow(dead_code)]
pub async fn wait_for_untimed<F>(stream: &mut EventStream, mut matches: F) -> Arc<EventEnvelope>
where
    F: FnMut(&GameEvent) -> bool,
{
    loop {
        let envelope = stream.recv().await.expect("event stream closed");
        if matches(&envelope.event) {
            return envelope;
        }
    }
}
