use anyhow::Result;
use chrono::Local;
use clap::Args;
use colored::*;

use spo_connect::ConnectionCache;

#[derive(Args)]
pub struct TokenCommands {
    /// Print the raw token
    #[arg(long)]
    pub show: bool,
}

pub fn handle_scopes_command(cache: &ConnectionCache, tenant_prefix: &str) -> Result<()> {
    let config = cache.config();
    let environment = if config.is_local_environment { "local" } else { "cloud" };

    println!("Tenant: {} ({})", tenant_prefix.bright_green().bold(), environment);
    for scope in cache.resolver().scopes_for(tenant_prefix) {
        println!("  {}", scope.cyan());
    }
    Ok(())
}

pub async fn handle_token_command(cache: &ConnectionCache, tenant_prefix: &str, args: TokenCommands) -> Result<()> {
    let credential = cache.resolver().resolve_credential();
    println!(
        "Requesting token for {} via {}",
        tenant_prefix.bright_green().bold(),
        credential.name().bright_yellow()
    );

    let token = cache.get_access_token(tenant_prefix).await?;

    println!(
        "{} expires {}",
        "✓ Token acquired,".green(),
        token.expires_on.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    );
    if args.show {
        println!("{}", token.token);
    }
    Ok(())
}
