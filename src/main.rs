mod auth;
mod cli;
mod config;
mod error;
mod gitlab;
mod relay;
mod server;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("starting mr-relay");
    cli.execute().await?;

    Ok(())
}
