//! Trackbridge CLI - runs the MCP server and manages its configuration.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trackbridge_core::Config;
use trackbridge_mcp::tools::default_registry;
use trackbridge_mcp::McpServer;

#[derive(Parser)]
#[command(name = "trackbridge")]
#[command(author, version, about = "Trackbridge - issue tracker tools over MCP", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdin/stdout
    Serve,

    /// Print the advertised tool schemas as JSON
    Tools,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Set a configuration value (e.g. `server.log_level debug`)
    Set { key: String, value: String },

    /// Get a configuration value
    Get { key: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    let config = Config::load_from(&config_path)?;

    // stdout carries protocol messages, so logs go to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&config.server.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Serve) => {
            let registry = default_registry(&config)?;
            let server = McpServer::new(registry).with_server_name(config.server.name.clone());
            server.run().await?;
        }
        Some(Commands::Tools) => {
            let registry = default_registry(&config)?;
            let json = serde_json::to_string_pretty(&registry.schema_list())?;
            println!("{}", json);
        }
        Some(Commands::Config { command }) => run_config(command, config, &config_path)?,
        None => {
            println!("Trackbridge - issue tracker tools over MCP");
            println!("Run with --help for usage information");
        }
    }

    Ok(())
}

fn run_config(command: ConfigCommands, mut config: Config, path: &Path) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            println!("# {}", path.display());
            println!("server.name = {}", config.server.name);
            println!("server.log_level = {}", config.server.log_level);
            println!("tools.disabled = {}", config.tools.disabled.join(","));
        }
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
        ConfigCommands::Set { key, value } => {
            config.set(&key, &value)?;
            config
                .save_to(path)
                .with_context(|| format!("saving {}", path.display()))?;
            tracing::info!("Set {} = {}", key, value);
        }
        ConfigCommands::Get { key } => {
            println!("{}", config.get(&key)?);
        }
    }
    Ok(())
}
