use crate::config::GameConfig;

/// Normalize and validate a chat message body. Returns the trimmed text.
pub fn validate_message_text(text: &str, config: &GameConfig) -> Result<String, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("Message cannot be empty".to_string());
    }
    if trimmed.len() > config.max_message_chars {
        return Err(format!(
            "Message too long (max {} characters)",
            config.max_message_chars
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate the player-count parameters of a room-create request.
pub fn validate_player_counts(
    max_humans: u8,
    total_players: u8,
    config: &GameConfig,
) -> Result<(), String> {
    if max_humans < 1 {
        return Err("A room needs at least one human seat".to_string());
    }
    if max_humans > config.max_humans_cap {
        return Err(format!(
            "Human seats cannot exceed {}",
            config.max_humans_cap
        ));
    }
    if total_players < max_humans {
        return Err("Total players cannot be fewer than human seats".to_string());
    }
    if total_players > config.total_players_cap {
        return Err(format!(
            "Total players cannot exceed {}",
            config.total_players_cap
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_text_is_trimmed() {
        let config = GameConfig::default();
        assert_eq!(
            validate_message_text("  hi there \n", &config).unwrap(),
            "hi there"
        );
    }

    #[test]
    fn empty_and_whitespace_messages_rejected() {
        let config = GameConfig::default();
        assert!(validate_message_text("", &config).is_err());
        assert!(validate_message_text("   \t\n", &config).is_err());
    }

    #[test]
    fn oversized_messages_rejected() {
        let config = GameConfig::default();
        let long = "x".repeat(config.max_message_chars + 1);
        assert!(validate_message_text(&long, &config).is_err());
    }

    #[test]
    fn player_count_bounds() {
        let config = GameConfig::default();
        assert!(validate_player_counts(1, 5, &config).is_ok());
        assert!(validate_player_counts(4, 4, &config).is_ok());
        assert!(validate_player_counts(0, 5, &config).is_err());
        assert!(validate_player_counts(5, 5, &config).is_err());
        assert!(validate_player_counts(2, 13, &config).is_err());
        assert!(validate_player_counts(3, 2, &config).is_err());
    }
}
