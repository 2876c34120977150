use anyhow::Result;
use arena_core::ArenaConfig;
use colored::Colorize;

pub async fn cmd_serve(
    mut config: ArenaConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    println!("{}", "Starting Swarm Arena...".cyan().bold());
    println!("  {} Listening on {}", "→".blue(), config.bind_addr());
    println!("  {} Backend: {}", "→".blue(), config.backend.url);
    println!(
        "  {} Debate: {} rounds, {}-{}ms between messages",
        "→".blue(),
        config.debate.rounds,
        config.debate.min_delay_ms,
        config.debate.max_delay_ms
    );
    println!();

    arena_core::http::serve(&config).await?;

    println!("{} {}", "✓".green().bold(), "Server stopped".green());
    Ok(())
}
