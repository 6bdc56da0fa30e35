use anyhow::{Context, Result};
use clap::Parser;
use funnel_config::{ConfigLoader, FunnelConfig};
use std::path::PathBuf;

mod cli;
mod commands;

use cli::Cli;
use commands::Workspace;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config).await?;
    if let Some(data_dir) = cli.data_dir {
        config.sync.cache_dir = data_dir;
    }
    funnel_core::logging::init(&config.logging);

    let workspace = Workspace::open(&config)?;
    let result = commands::run(cli.command, &workspace, cli.json).await;
    workspace.persist()?;
    result
}

/// Explicit path, else the user config file when it exists, else defaults
async fn load_config(explicit: Option<PathBuf>) -> Result<FunnelConfig> {
    let path = explicit.or_else(|| {
        dirs::config_dir()
            .map(|dir| dir.join("funnel").join("config.toml"))
            .filter(|path| path.exists())
    });
    ConfigLoader::load_or_default(path.as_deref())
        .await
        .context("Failed to load configuration")
}
