use anyhow::Result;
use clap::Args;
use colored::*;
use serde_json::Value;

use spo_connect::{ConnectionCache, SiteIdentity};

#[derive(Args)]
pub struct ListCommands {
    /// List title
    pub title: String,
}

#[derive(Args)]
pub struct GetCommands {
    /// REST path below /_api (e.g. "web/lists?$select=Title")
    pub path: String,

    /// Compact JSON (no whitespace, for piping)
    #[arg(long)]
    pub compact: bool,
}

fn field<'a>(value: &'a Value, name: &str) -> &'a str {
    value.get(name).and_then(Value::as_str).unwrap_or("-")
}

pub async fn handle_web_command(cache: &ConnectionCache, identity: &SiteIdentity) -> Result<()> {
    let client = cache.get_client(Some(identity)).await?;
    let web = client.web().await?;

    println!("Site: {}", client.base_url().bright_green().bold());
    println!("  Title:       {}", field(&web, "Title"));
    println!("  Url:         {}", field(&web, "Url"));
    println!("  Description: {}", field(&web, "Description"));
    println!("  Created:     {}", field(&web, "Created"));
    Ok(())
}

pub async fn handle_list_command(cache: &ConnectionCache, identity: &SiteIdentity, args: ListCommands) -> Result<()> {
    let client = cache.get_client(Some(identity)).await?;
    let list = client.list_by_title(&args.title).await?;

    println!("List: {}", field(&list, "Title").bright_green().bold());
    println!("  Id:         {}", field(&list, "Id"));
    println!(
        "  Item count: {}",
        list.get("ItemCount").and_then(Value::as_u64).unwrap_or_default()
    );
    Ok(())
}

pub async fn handle_get_command(cache: &ConnectionCache, identity: &SiteIdentity, args: GetCommands) -> Result<()> {
    let client = cache.get_client(Some(identity)).await?;
    let value = client.get_json(&args.path).await?;

    let output = if args.compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    println!("{}", output);
    Ok(())
}
