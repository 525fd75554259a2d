//! Cloud identity credentials and SharePoint scope resolution
//!
//! A [`TokenCredential`] turns a list of OAuth scopes into an [`AccessToken`].
//! The [`CredentialResolver`] picks the credential for the configured
//! [`CredentialStrategy`] and knows which scopes a SharePoint tenant needs.

pub mod chain;
pub mod cli;
pub mod credentials;
pub mod managed_identity;
pub mod resolver;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use chain::{ChainedTokenCredential, DefaultAzureCredential};
pub use cli::{AzureCliCredential, AzureDeveloperCliCredential};
pub use credentials::{ClientSecretCredential, EnvironmentCredential};
pub use managed_identity::ManagedIdentityCredential;
pub use resolver::{CredentialResolver, sharepoint_scopes};

/// Bearer token issued by the identity provider
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_on,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_on <= Utc::now()
    }

    /// True when the token expires within `margin` from now (or already has)
    pub fn expires_within(&self, margin: Duration) -> bool {
        match chrono::Duration::from_std(margin) {
            Ok(margin) => self.expires_on <= Utc::now() + margin,
            Err(_) => true,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Anything able to produce an access token for a set of scopes
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Short name used in logs and chained error messages
    fn name(&self) -> &'static str;

    async fn get_token(&self, scopes: &[String]) -> anyhow::Result<AccessToken>;
}

/// Which credential the resolver hands out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialStrategy {
    /// Environment, managed identity, Azure CLI, Azure Developer CLI, in that order
    #[default]
    DefaultChain,
    AzureCli,
    AzureDeveloperCli,
}

impl FromStr for CredentialStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "default" | "defaultchain" | "defaultazurecredential" => Ok(Self::DefaultChain),
            "az" | "azurecli" | "cli" => Ok(Self::AzureCli),
            "azd" | "azuredevelopercli" | "developercli" => Ok(Self::AzureDeveloperCli),
            _ => anyhow::bail!("Unknown credential strategy: {}", s),
        }
    }
}

impl fmt::Display for CredentialStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DefaultChain => "default-chain",
            Self::AzureCli => "azure-cli",
            Self::AzureDeveloperCli => "azure-developer-cli",
        };
        f.write_str(name)
    }
}

/// Parse an `expires_on` field that may be epoch seconds as a number or a string
pub(crate) fn expiry_from_epoch(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    let seconds = match value {
        serde_json::Value::Number(n) => n.as_i64()?,
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    DateTime::from_timestamp(seconds, 0)
}
