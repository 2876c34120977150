use arena_core::config::ConfigLoadError;
use arena_core::{ArenaConfig, ArenaError, CliErrorDisplay};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

use commands::{
    cmd_build, cmd_config, cmd_config_init, cmd_intake, cmd_roster, cmd_run, cmd_serve,
    cmd_watch, BuildArgs, IntakeArgs,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Parser)]
#[command(name = "arena")]
#[command(version = VERSION)]
#[command(about = "Swarm Arena - watch a simulated PM/Dev/UX/QA team debate your project")]
#[command(long_about = r#"
Swarm Arena generates a four-agent team (PM, Dev, UX, QA) for a project brief,
streams a simulated debate between them and ends with an architecture plan.

Use 'arena serve' to start the HTTP API, then 'arena run "<brief>"' to follow a
debate over the event stream or 'arena watch "<brief>"' over the socket.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start the arena HTTP server")]
    Serve {
        #[arg(long, help = "Bind host (overrides server.host)")]
        host: Option<String>,

        #[arg(short, long, help = "Bind port (overrides server.port)")]
        port: Option<u16>,
    },

    #[command(about = "Generate a team for a brief and show it")]
    Roster {
        brief: String,

        #[arg(short, long, default_value = "text")]
        format: String,
    },

    #[command(about = "Run a debate over the event stream")]
    Run {
        brief: String,

        #[arg(long, help = "Arena server URL (overrides client.server_url)")]
        server: Option<String>,

        #[arg(long, help = "Run the debate in-process instead of calling a server")]
        offline: bool,

        #[arg(long, help = "Skip the message delays (offline only)")]
        fast: bool,

        #[arg(short, long, default_value = "text")]
        format: String,
    },

    #[command(about = "Run a debate over the socket endpoint")]
    Watch {
        brief: String,

        #[arg(long, help = "Socket URL (defaults to the arena server's /ws)")]
        url: Option<String>,

        #[arg(long, help = "Connect to the backend planning socket instead")]
        backend: bool,

        #[arg(short, long, default_value = "text")]
        format: String,
    },

    #[command(about = "Gather requirements through the AI backend conversation")]
    Intake(IntakeArgs),

    #[command(about = "Start a scaffold build and download the archive")]
    Build(BuildArgs),

    #[command(about = "Show or initialize configuration")]
    Config {
        #[arg(long, help = "Write a default config file")]
        init: bool,

        #[arg(long, help = "Overwrite an existing config file")]
        force: bool,

        #[arg(long, help = "Write to this path instead of the user config dir")]
        path: Option<PathBuf>,
    },

    #[command(about = "Show version information")]
    Version {
        #[arg(short, long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = ArenaConfig::load();
    let (level, json_logs) = match &loaded {
        Ok(config) => (config.log_level(), config.logging.json_format),
        Err(_) => ("warn", false),
    };
    init_logging(cli.verbose, level, json_logs);

    match run(cli, loaded).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ArenaError>() {
                Some(arena) => {
                    eprint!("{}: {}", "Error".red().bold(), CliErrorDisplay::new(arena))
                }
                None => eprintln!("{}: {}", "Error".red().bold(), e),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool, level: &str, json: bool) {
    let fallback = if verbose { "debug" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli, loaded: Result<ArenaConfig, ConfigLoadError>) -> anyhow::Result<()> {
    // These work without a usable config, so a broken file can be replaced.
    match &cli.command {
        Commands::Version { detailed } => return cmd_version(*detailed),
        Commands::Config {
            init: true,
            force,
            path,
        } => return cmd_config_init(*force, path.clone()),
        _ => {}
    }

    let config = loaded.map_err(ArenaError::from)?;

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(config, host, port).await,
        Commands::Roster { brief, format } => cmd_roster(&brief, &format),
        Commands::Run {
            brief,
            server,
            offline,
            fast,
            format,
        } => cmd_run(&config, &brief, server, offline, fast, &format).await,
        Commands::Watch {
            brief,
            url,
            backend,
            format,
        } => cmd_watch(&config, &brief, url, backend, &format).await,
        Commands::Intake(args) => cmd_intake(&config, args).await,
        Commands::Build(args) => cmd_build(&config, args).await,
        Commands::Config { .. } => cmd_config(&config),
        Commands::Version { .. } => Ok(()),
    }
}

fn cmd_version(detailed: bool) -> anyhow::Result<()> {
    if detailed {
        println!("{}", "Swarm Arena Version Information".cyan().bold());
        println!("{}", "═".repeat(40).dimmed());
        println!("  {:<15} {}", "Version:".bold(), VERSION);
        println!("  {:<15} {}", "Name:".bold(), NAME);
        println!("  {:<15} {}", "Core:".bold(), arena_core::VERSION);
        println!("  {:<15} Apache-2.0", "License:".bold());
        println!();
        println!("  {}", "Agents:".bold());
        for role in arena_core::AgentRole::ALL {
            println!("    {} {}", output::swatch(role.color()), role.display_name());
        }
        println!();
        println!("  {}", "Build Information:".bold());
        println!("    Rust Edition: 2021");
        #[cfg(debug_assertions)]
        println!("    Build:        Debug");
        #[cfg(not(debug_assertions))]
        println!("    Build:        Release");
    } else {
        println!("arena {}", VERSION);
    }

    Ok(())
}
