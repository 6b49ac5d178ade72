mod api;
mod cli;
mod config;
mod migrate;
mod sync;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate(args) => cli::commands::migrate::run(args).await,
        Commands::Sync(args) => cli::commands::sync::run(args).await,
    }
}
