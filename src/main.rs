use anyhow::Result;
use clap::Parser;
use log::info;
use std::sync::Arc;

mod cli;

use cli::commands::{
    handle_get_command, handle_list_command, handle_scopes_command, handle_token_command,
    handle_web_command,
};
use cli::{Cli, Commands};
use spo_connect::{Config, ConnectionCache};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("spo-connect.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    let mut config = Config::from_env();
    if let Some(strategy) = cli.credential {
        config.credential_strategy = strategy;
    }
    let identity = cli.site_identity(&config);
    info!("Starting spo-connect for {}", identity);

    let cache = ConnectionCache::new(Arc::new(config));

    match cli.command {
        Commands::Scopes => handle_scopes_command(&cache, &identity.tenant_prefix),
        Commands::Token(args) => handle_token_command(&cache, &identity.tenant_prefix, args).await,
        Commands::Web => handle_web_command(&cache, &identity).await,
        Commands::List(args) => handle_list_command(&cache, &identity, args).await,
        Commands::Get(args) => handle_get_command(&cache, &identity, args).await,
    }
}
