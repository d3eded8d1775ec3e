use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use reelpool_node::{api, cli, config::NodeConfig, logging, node::RewardsNode};

#[derive(Parser)]
#[command(name = "reelpool")]
#[command(about = "Reelpool - creator engagement rewards node", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the rewards node
    Start {
        /// Data directory for storage
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Port for HTTP API
        #[arg(long, default_value = "8080")]
        api_port: u16,
    },

    /// Initialize a new node configuration
    Init {
        /// Output directory for configuration
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Run a local end-to-end claim demo
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    config.apply_env_overrides();

    logging::init_logging(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Start { data_dir, api_port } => {
            config.node.data_dir = data_dir;
            config.api.port = api_port;

            logging::display_boot_banner(env!("CARGO_PKG_VERSION"));
            start_node(config).await
        }
        Commands::Init { output } => {
            let path = output.join("reelpool.toml");
            NodeConfig::default().save_to_file(&path)?;
            info!("Wrote default configuration to {}", path.display());
            Ok(())
        }
        Commands::Demo => cli::run_local_demo().await,
    }
}

async fn start_node(config: NodeConfig) -> Result<()> {
    let api_enabled = config.api.enabled;
    let api_host = config.api.host.clone();
    let api_port = config.api.port;

    let node = Arc::new(RewardsNode::new(config)?);

    let api_handle = if api_enabled {
        Some(api::start_api_server(node.clone(), api_host, api_port))
    } else {
        None
    };

    info!("Node running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("🛑 Shutdown requested");

    if let Some(handle) = api_handle {
        handle.abort();
    }

    let stats = node.get_stats().await;
    info!(
        videos = stats.videos,
        settlements = stats.settlements,
        "Node stopped"
    );
    Ok(())
}
