//! CLI entry and dispatch.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use revu_core::config::Config;
use revu_core::logging;
use revu_core::review::{ReviewClient, resolve_server_url};

mod commands;

#[derive(Parser)]
#[command(name = "revu")]
#[command(version)]
#[command(about = "Send code to a review server and read the feedback in your terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// File to preload into the editor
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Review server base URL (overrides REVU_SERVER_URL and config)
    #[arg(long, global = true, value_name = "URL")]
    server_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Review a file (or stdin) and print the result
    Review {
        /// File to review (reads stdin if not provided)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Generate a fresh config from defaults
    Generate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("load config")?;

    // Keep the guard alive for the whole run so log lines flush on exit
    let _guard = logging::init(&config).context("init logging")?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli, config).await })
}

async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    // default to the editor, or one-shot mode when input is piped in
    let Some(command) = cli.command else {
        let server_url = resolve_server_url(cli.server_url.as_deref(), &config)?;
        if !std::io::stdin().is_terminal() {
            return commands::review::run(&server_url, None).await;
        }
        return launch_tui(config, &server_url, cli.file.as_deref()).await;
    };

    match command {
        Commands::Review { file } => {
            let server_url = resolve_server_url(cli.server_url.as_deref(), &config)?;
            commands::review::run(&server_url, file.as_deref()).await
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
        },
    }
}

async fn launch_tui(config: Config, server_url: &str, file: Option<&Path>) -> Result<()> {
    let client = ReviewClient::new(server_url)?;

    let initial_text = match file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Some(text.replace("\r\n", "\n").replace('\r', "\n"))
        }
        None => None,
    };

    revu_tui::run(config, client, initial_text).await
}
