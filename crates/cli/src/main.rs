//! Parley CLI — the main entry point.
//!
//! Commands:
//! - `chat`    — Interactive chat or single-message mode
//! - `config`  — Show the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parley_config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "parley",
    about = "Parley — ask questions, get answers backed by live data",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "PARLEY_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Number of exchanges to remember
        #[arg(long)]
        max_turns: Option<usize>,
    },

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    let config = AppConfig::load_with_env(&config_path)
        .map_err(|e| format!("Failed to load config: {e}"))?;

    // Initialize tracing; RUST_LOG wins over everything else
    let filter = log_filter(cli.log_level.as_deref(), cli.debug, &config);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat { message, max_turns } => {
            commands::chat::run(config, message, max_turns).await?
        }
        Commands::Config => commands::config_cmd::show(&config, &config_path)?,
    }

    Ok(())
}

/// Pick the log filter: `--log-level`, then `--debug`, then the config.
fn log_filter(cli_level: Option<&str>, cli_debug: bool, config: &AppConfig) -> String {
    if let Some(level) = cli_level {
        return level.to_lowercase();
    }
    if cli_debug || config.logging.debug {
        return "debug".into();
    }
    config.logging.level.clone()
}
