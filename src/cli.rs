use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use crate::config::Config;
use crate::relay::Relay;
use crate::server;

#[derive(Parser, Debug)]
#[command(name = "mr-relay")]
#[command(author, version, about = "Relay GitLab merge request webhooks into CI pipeline triggers", long_about = None)]
pub struct Cli {
    /// Path to a TOML or JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// HTTP listen address
    #[arg(short, long)]
    pub listen: Option<String>,

    /// GitLab instance base URL
    #[arg(short, long, env = "MR_RELAY_URL")]
    pub url: Option<String>,

    /// Fixed pipeline trigger token (mutually exclusive with --private-token)
    #[arg(long, env = "MR_RELAY_TRIGGER_TOKEN")]
    pub trigger_token: Option<String>,

    /// Account token able to list and create pipeline triggers
    #[arg(long, env = "MR_RELAY_PRIVATE_TOKEN")]
    pub private_token: Option<String>,

    /// Also trigger pipelines for merge requests that were just merged
    #[arg(long)]
    pub trigger_merged: bool,

    /// Source branches whose remove-on-merge flag is never touched
    #[arg(long, value_delimiter = ',')]
    pub remove_source_exceptions: Vec<String>,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = Config::resolve(&self)?;
        let relay = Relay::new(&config)?;

        info!("relaying merge request events for {}", config.base_url);
        server::serve(config.listen, relay).await
    }
}
