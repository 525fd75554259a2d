use anyhow::Result;
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::client::SharePointClient;
use super::models::{SiteConnection, SiteIdentity};
use super::pipeline::Pipeline;
use crate::auth::{AccessToken, CredentialResolver};
use crate::config::Config;

/// Keeps one [`SharePointClient`] per site for the lifetime of the process.
///
/// Entries are never evicted or refreshed. The cache is meant for the handful
/// of sites a single process talks to, and is scanned linearly.
pub struct ConnectionCache {
    config: Arc<Config>,
    resolver: CredentialResolver,
    connections: RwLock<Vec<SiteConnection>>,
}

impl ConnectionCache {
    pub fn new(config: Arc<Config>) -> Self {
        let resolver = CredentialResolver::new(config.clone());
        Self::with_resolver(resolver)
    }

    pub fn from_env() -> Self {
        Self::new(Arc::new(Config::from_env()))
    }

    pub fn with_resolver(resolver: CredentialResolver) -> Self {
        Self {
            config: resolver.shared_config(),
            resolver,
            connections: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    /// Client for `identity`, or for the configured default site when `None`.
    ///
    /// Repeated calls for an equal identity return the same `Arc`.
    pub async fn get_client(&self, identity: Option<&SiteIdentity>) -> Result<Arc<SharePointClient>> {
        let identity = match identity {
            Some(identity) => identity.clone(),
            None => self.config.default_site(),
        };

        if let Some(client) = Self::find(&self.connections.read().await, &identity) {
            debug!("Using cached connection for {}", identity);
            return Ok(client);
        }

        let mut connections = self.connections.write().await;
        // Another task may have connected while we waited for the write lock
        if let Some(client) = Self::find(&connections, &identity) {
            return Ok(client);
        }

        let connection = self.connect(identity)?;
        let client = connection.client.clone();
        connections.push(connection);
        Ok(client)
    }

    /// Client for the configured default site
    pub async fn get_default_client(&self) -> Result<Arc<SharePointClient>> {
        self.get_client(None).await
    }

    /// Fresh token for the tenant, bypassing any cached client
    pub async fn get_access_token(&self, tenant_prefix: &str) -> Result<AccessToken> {
        self.resolver.get_access_token(tenant_prefix).await
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Identities in the order they were first connected
    pub async fn identities(&self) -> Vec<SiteIdentity> {
        self.connections
            .read()
            .await
            .iter()
            .map(|c| c.identity.clone())
            .collect()
    }

    fn find(connections: &[SiteConnection], identity: &SiteIdentity) -> Option<Arc<SharePointClient>> {
        connections
            .iter()
            .find(|c| c.identity == *identity)
            .map(|c| c.client.clone())
    }

    fn connect(&self, identity: SiteIdentity) -> Result<SiteConnection> {
        let credential = self.resolver.resolve_credential();
        let scopes = self.resolver.scopes_for(&identity.tenant_prefix);
        let pipeline = Pipeline::sharepoint(&self.config, credential, scopes.clone())?;
        let client = Arc::new(SharePointClient::new(identity.clone(), scopes, pipeline));

        info!("Connected to {}", client.base_url());

        Ok(SiteConnection { identity, client })
    }
}
