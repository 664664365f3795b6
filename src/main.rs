use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use webstate_cli::cli::{
    cmd_breadcrumbs, cmd_navigate, init_logging, BreadcrumbsArgs, NavigateArgs,
};
use webstate_cli::config::load_config;

#[derive(Parser)]
#[command(name = "webstate", version, about = "Navigation policy host and breadcrumb diagnostics")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (defaults to the configured level)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and append breadcrumbs
    Breadcrumbs(BreadcrumbsArgs),

    /// Run one navigation through the configured policy deciders
    Navigate(NavigateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = load_config(cli.config.as_deref())?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| loaded.config.log_level.clone());
    init_logging(&level, cli.debug)?;
    loaded.log_source();
    info!("Starting webstate v{}", env!("CARGO_PKG_VERSION"));

    let config = loaded.config;
    let result = match cli.command {
        Commands::Breadcrumbs(args) => cmd_breadcrumbs(args, &config).await,
        Commands::Navigate(args) => cmd_navigate(args, &config).await,
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
