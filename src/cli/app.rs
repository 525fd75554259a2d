use clap::{Parser, Subcommand};
use spo_connect::{CredentialStrategy, SiteIdentity};

use super::commands::{GetCommands, ListCommands, TokenCommands};

#[derive(Parser)]
#[command(name = "spo-connect")]
#[command(about = "Connect to SharePoint Online sites with cloud identity credentials")]
pub struct Cli {
    /// Tenant prefix (overrides TenantPrefix)
    #[arg(long, global = true)]
    pub tenant: Option<String>,

    /// Site-relative path including the leading slash (overrides SiteRelativePath)
    #[arg(long, global = true)]
    pub site: Option<String>,

    /// Credential strategy: default-chain, azure-cli or azure-developer-cli
    #[arg(long, global = true)]
    pub credential: Option<CredentialStrategy>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The site named on the command line, filling gaps from the config
    pub fn site_identity(&self, config: &spo_connect::Config) -> SiteIdentity {
        SiteIdentity::new(
            self.tenant.clone().unwrap_or_else(|| config.tenant_prefix.clone()),
            self.site.clone().unwrap_or_else(|| config.site_relative_path.clone()),
        )
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the OAuth scopes requested for the tenant
    Scopes,
    /// Acquire an access token for the tenant
    Token(TokenCommands),
    /// Show the site's web properties
    Web,
    /// Show a list's properties by title
    List(ListCommands),
    /// GET a REST path below the site's /_api endpoint
    Get(GetCommands),
}
