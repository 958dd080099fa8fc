#![cfg_attr(not(test), deny(clippy::panic))]

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use turing_hunt_server::config;
use turing_hunt_server::llm;
use turing_hunt_server::logging;
use turing_hunt_server::server::GameServer;
use turing_hunt_server::transport;

/// Turing Hunt -- multi-room social-deduction server where humans hunt the AI
#[derive(Parser, Debug)]
#[command(name = "turing-hunt-server")]
#[command(about = "A multi-room social-deduction game server where humans chat with LLM-driven players and vote to find the AI")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from config.json if present; otherwise use code
    // defaults.
    let cfg = config::load();

    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    // config::load() already validates but only warns; capture the result
    // here for a proper exit code and to fail startup on bad settings.
    let validation_result = config::validate_config(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Port: {}", cfg.port);
                println!("  LLM provider: {:?}", cfg.llm.provider);
                println!("  Max rooms: {}", cfg.game.max_rooms);
                println!("  Discussion phase: {}s", cfg.game.discussion_seconds);
                println!("  Voting phase: {}s", cfg.game.voting_seconds);
                println!("  Rounds to win: {}", cfg.game.rounds_to_win);
                println!("  Stats directory: {}", cfg.stats.dir);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    validation_result.map_err(|e| anyhow::anyhow!("invalid configuration:\n{e}"))?;

    logging::init_with_config(&cfg.logging);

    let llm_client = llm::build_client(&cfg.llm)?;
    let server = GameServer::new(cfg.game.clone(), &cfg.stats, llm_client);

    let router = transport::create_router(Arc::clone(&server), &cfg.cors_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        provider = ?cfg.llm.provider,
        cors_origins = %cfg.cors_origins,
        "Turing Hunt server started - rooms: POST /v1/rooms, events: GET /v1/rooms/{{code}}/ws"
    );

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn test_cli_default_no_flags() {
        let cli = Cli::try_parse_from(["turing-hunt-server"]).unwrap();
        assert!(!cli.validate_config);
        assert!(!cli.print_config);
    }

    #[test]
    fn test_cli_validate_config_flags() {
        let cli = Cli::try_parse_from(["turing-hunt-server", "--validate-config"]).unwrap();
        assert!(cli.validate_config);
        let cli = Cli::try_parse_from(["turing-hunt-server", "-c"]).unwrap();
        assert!(cli.validate_config);
    }

    #[test]
    fn test_cli_validate_and_print_config_conflict() {
        let result =
            Cli::try_parse_from(["turing-hunt-server", "--validate-config", "--print-config"]);
        assert!(result.is_err());
    }
}
