use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use super::{
    AccessToken, AzureCliCredential, AzureDeveloperCliCredential, EnvironmentCredential,
    ManagedIdentityCredential, TokenCredential,
};

/// Tries each source in order and returns the first token obtained
pub struct ChainedTokenCredential {
    sources: Vec<Arc<dyn TokenCredential>>,
}

impl ChainedTokenCredential {
    pub fn new(sources: Vec<Arc<dyn TokenCredential>>) -> Self {
        Self { sources }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    async fn first_token(&self, scopes: &[String]) -> std::result::Result<AccessToken, Vec<String>> {
        let mut failures = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            match source.get_token(scopes).await {
                Ok(token) => {
                    info!("Acquired token via {}", source.name());
                    return Ok(token);
                }
                Err(err) => {
                    debug!("{} could not provide a token: {}", source.name(), err);
                    failures.push(format!("{}: {}", source.name(), err));
                }
            }
        }

        Err(failures)
    }
}

#[async_trait]
impl TokenCredential for ChainedTokenCredential {
    fn name(&self) -> &'static str {
        "ChainedTokenCredential"
    }

    async fn get_token(&self, scopes: &[String]) -> Result<AccessToken> {
        self.first_token(scopes).await.map_err(|failures| {
            anyhow::anyhow!(
                "ChainedTokenCredential failed to retrieve a token from the included credentials.\n{}",
                failures.join("\n")
            )
        })
    }
}

/// The platform default chain: environment variables, managed identity,
/// then the developer CLIs.
pub struct DefaultAzureCredential {
    chain: ChainedTokenCredential,
}

impl DefaultAzureCredential {
    /// `managed_identity_client_id` selects a user-assigned identity; `None` uses the system-assigned one
    pub fn new(managed_identity_client_id: Option<String>) -> Self {
        let sources: Vec<Arc<dyn TokenCredential>> = vec![
            Arc::new(EnvironmentCredential::from_env()),
            Arc::new(ManagedIdentityCredential::new(managed_identity_client_id)),
            Arc::new(AzureCliCredential::new()),
            Arc::new(AzureDeveloperCliCredential::new()),
        ];

        Self {
            chain: ChainedTokenCredential::new(sources),
        }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.chain.source_names()
    }
}

#[async_trait]
impl TokenCredential for DefaultAzureCredential {
    fn name(&self) -> &'static str {
        "DefaultAzureCredential"
    }

    async fn get_token(&self, scopes: &[String]) -> Result<AccessToken> {
        self.chain.first_token(scopes).await.map_err(|failures| {
            anyhow::anyhow!(
                "DefaultAzureCredential failed to retrieve a token from the included credentials.\n{}",
                failures.join("\n")
            )
        })
    }
}
