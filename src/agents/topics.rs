//! Discussion topic pool.

use rand::RngExt;

const STOCK_TOPICS: &[&str] = &[
    "What's a food everyone loves that you secretly can't stand?",
    "If you had to move to another city tomorrow, which one and why?",
    "What's the most overrated piece of technology right now?",
    "Describe the worst job you'd still do for a year if it paid triple.",
    "What's a small habit that noticeably improved your life?",
    "Which decade had the best music, and what's your evidence?",
    "What's something you believed for way too long before learning the truth?",
    "If animals could talk, which species would be the rudest?",
    "What's a purchase under 50 bucks that changed your daily routine?",
    "What skill do you wish schools actually taught?",
    "What's the best meal you've ever had that cost almost nothing?",
    "Which movie does everyone quote that you've never actually seen?",
];

/// Source of per-round discussion prompts. Rooms draw a topic at game
/// start and on every new round; the same topic is never drawn twice in a
/// row.
#[derive(Debug, Clone)]
pub struct TopicPool {
    topics: Vec<String>,
}

impl TopicPool {
    pub fn new() -> Self {
        Self {
            topics: STOCK_TOPICS.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    /// Pool with injected topics; falls back to the stock list when empty.
    pub fn with_topics<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let topics: Vec<String> = topics.into_iter().map(Into::into).collect();
        if topics.is_empty() {
            Self::new()
        } else {
            Self { topics }
        }
    }

    /// Draw a topic, avoiding an immediate repeat when the pool allows it.
    pub fn draw(&self, previous: Option<&str>) -> String {
        let mut rng = rand::rng();
        loop {
            let idx = rng.random_range(0..self.topics.len());
            // SAFETY: `idx` is produced by `random_range(0..len)`.
            #[allow(clippy::indexing_slicing)]
            let topic = &self.topics[idx];
            if self.topics.len() > 1 && previous == Some(topic.as_str()) {
                continue;
            }
            return topic.clone();
        }
    }
}

impl Default for TopicPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_never_repeats_immediately() {
        let pool = TopicPool::with_topics(["a", "b"]);
        for _ in 0..32 {
            let first = pool.draw(None);
            let second = pool.draw(Some(&first));
            assert_ne!(first, second);
        }
    }

    #[test]
    fn single_topic_pool_repeats() {
        let pool = TopicPool::with_topics(["only"]);
        assert_eq!(pool.draw(Some("only")), "only");
    }

    #[test]
    fn empty_injection_falls_back_to_stock() {
        let pool = TopicPool::with_topics(Vec::<String>::new());
        assert!(!pool.draw(None).is_empty());
    }
}
