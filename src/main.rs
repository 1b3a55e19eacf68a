mod cli;
mod commands;

use bulkenrich::config::Config;
use bulkenrich::observability;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    observability::init_tracing();

    let cli = Cli::parse();
    let config = Config::load_with(cli.config)?;

    match cli.command {
        Commands::Enrich(args) => commands::enrich(config, args).await?,
        Commands::Config => commands::show_config(&config)?,
    }

    Ok(())
}
