//! Configuration validation functions.

use super::llm::LlmProviderKind;
use super::Config;

/// Validate a loaded configuration against the bounds the game engine
/// assumes. Returns one combined error listing every violation.
pub fn validate_config(config: &Config) -> Result<(), String> {
    let mut problems = Vec::new();

    let game = &config.game;
    if game.max_rooms == 0 {
        problems.push("game.max_rooms must be at least 1".to_string());
    }
    if game.max_humans_cap == 0 || game.max_humans_cap > 4 {
        problems.push("game.max_humans_cap must be in 1..=4".to_string());
    }
    if game.total_players_cap < game.max_humans_cap || game.total_players_cap > 12 {
        problems.push(format!(
            "game.total_players_cap must be in {}..=12",
            game.max_humans_cap
        ));
    }
    if game.discussion_seconds == 0 {
        problems.push("game.discussion_seconds must be non-zero".to_string());
    }
    if game.voting_seconds == 0 {
        problems.push("game.voting_seconds must be non-zero".to_string());
    }
    if game.rounds_to_win == 0 {
        problems.push("game.rounds_to_win must be at least 1".to_string());
    }
    if game.worker_pool_size == 0 {
        problems.push("game.worker_pool_size must be at least 1".to_string());
    }
    if game.bus_buffer_size == 0 {
        problems.push("game.bus_buffer_size must be at least 1".to_string());
    }
    if game.max_utterance_chars == 0 {
        problems.push("game.max_utterance_chars must be at least 1".to_string());
    }

    if config.llm.provider == LlmProviderKind::Openai {
        if config
            .llm
            .api_key
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .is_empty()
        {
            problems.push("llm.api_key is required for the openai provider".to_string());
        }
        if url::Url::parse(&config.llm.base_url).is_err() {
            problems.push(format!("llm.base_url is not a valid URL: {}", config.llm.base_url));
        }
    }

    if config.stats.dir.trim().is_empty() {
        problems.push("stats.dir must not be empty".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn openai_provider_requires_key() {
        let mut config = Config::default();
        config.llm.provider = LlmProviderKind::Openai;
        let err = validate_config(&config).unwrap_err();
        assert!(err.contains("api_key"));

        config.llm.api_key = Some("sk-test".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn bad_bounds_are_reported_together() {
        let mut config = Config::default();
        config.game.max_humans_cap = 9;
        config.game.voting_seconds = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.contains("max_humans_cap"));
        assert!(err.contains("voting_seconds"));
    }

    #[test]
    fn bad_base_url_rejected() {
        let mut config = Config::default();
        config.llm.provider = LlmProviderKind::Openai;
        config.llm.api_key = Some("sk-test".to_string());
        config.llm.base_url = "not a url".to_string();
        assert!(validate_config(&config).is_err());
    }
}
