mod cli;
mod commands;
mod render;

use anyhow::anyhow;
use clap::Parser;
use cli::Cli;
use shared::{init_tracing, Config};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_base_url(url);
    }
    if let Some(path) = &cli.session_file {
        config = config.with_session_file(path);
    }

    init_tracing(config.log_format).map_err(|e| anyhow!(e))?;

    info!(
        environment = %config.environment,
        api_base_url = %config.api_base_url,
        "Starting task client"
    );

    commands::run(cli, config).await
}
