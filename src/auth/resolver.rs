use anyhow::Result;
use log::debug;
use std::sync::Arc;

use super::{
    AccessToken, AzureCliCredential, AzureDeveloperCliCredential, CredentialStrategy,
    DefaultAzureCredential, TokenCredential,
};
use crate::api::constants;
use crate::config::Config;

/// OAuth scopes needed to call a SharePoint tenant.
///
/// Locally the default chain usually ends up at the Azure CLI, whose delegated
/// token only carries `user_impersonation` and is rejected by SharePoint, so
/// `Sites.Selected` is requested as well. Managed identity accepts a single
/// scope only, so nothing is appended outside local runs.
pub fn sharepoint_scopes(tenant_prefix: &str, is_local_environment: bool) -> Vec<String> {
    let mut scopes = vec![constants::default_scope(tenant_prefix)];
    if is_local_environment {
        scopes.push(constants::SITES_SELECTED_SCOPE.to_string());
    }
    scopes
}

/// Hands out the configured credential and the scopes a tenant needs.
///
/// The credential is built once and shared by every connection.
#[derive(Clone)]
pub struct CredentialResolver {
    config: Arc<Config>,
    credential: Arc<dyn TokenCredential>,
}

impl CredentialResolver {
    pub fn new(config: Arc<Config>) -> Self {
        let credential = credential_for(&config);
        debug!(
            "Resolved {} credential for strategy {}",
            credential.name(),
            config.credential_strategy
        );
        Self { config, credential }
    }

    /// Always hand out `credential`, whatever the configured strategy says
    pub fn with_credential(config: Arc<Config>, credential: Arc<dyn TokenCredential>) -> Self {
        Self { config, credential }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<Config> {
        self.config.clone()
    }

    pub fn resolve_credential(&self) -> Arc<dyn TokenCredential> {
        self.credential.clone()
    }

    pub fn scopes_for(&self, tenant_prefix: &str) -> Vec<String> {
        sharepoint_scopes(tenant_prefix, self.config.is_local_environment)
    }

    /// Fetch a fresh token for the tenant. Identity errors are returned as-is.
    pub async fn get_access_token(&self, tenant_prefix: &str) -> Result<AccessToken> {
        let credential = self.resolve_credential();
        let scopes = self.scopes_for(tenant_prefix);
        debug!("Requesting token via {} for scopes {:?}", credential.name(), scopes);
        credential.get_token(&scopes).await
    }
}

fn credential_for(config: &Config) -> Arc<dyn TokenCredential> {
    match config.credential_strategy {
        CredentialStrategy::DefaultChain => Arc::new(DefaultAzureCredential::new(
            config.managed_identity_client_id.clone(),
        )),
        CredentialStrategy::AzureCli => Arc::new(AzureCliCredential::new()),
        CredentialStrategy::AzureDeveloperCli => Arc::new(AzureDeveloperCliCredential::new()),
    }
}
