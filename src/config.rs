use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::api::models::SiteIdentity;
use crate::auth::CredentialStrategy;

pub const DEFAULT_USER_AGENT: &str = "functions-quickstart-spo";
pub const DEFAULT_WEBHOOK_HISTORY_LIST_TITLE: &str = "webhookHistory";

/// Value of `AZURE_FUNCTIONS_ENVIRONMENT` that marks a local run
pub const LOCAL_ENVIRONMENT_MARKER: &str = "Development";

pub mod vars {
    pub const USER_AGENT: &str = "UserAgent";
    pub const TENANT_PREFIX: &str = "TenantPrefix";
    pub const SITE_RELATIVE_PATH: &str = "SiteRelativePath";
    pub const FUNCTIONS_ENVIRONMENT: &str = "AZURE_FUNCTIONS_ENVIRONMENT";
    pub const MANAGED_IDENTITY_CLIENT_ID: &str = "UserAssignedManagedIdentityClientId";
    pub const WEBHOOK_HISTORY_LIST_TITLE: &str = "WebhookHistoryListTitle";
    pub const CREDENTIAL_STRATEGY: &str = "CredentialStrategy";
}

/// Process-wide settings, read once from the environment at startup.
///
/// Nothing here is validated. An empty tenant prefix is accepted and only
/// shows up later as an unreachable site URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub user_agent: String,
    pub tenant_prefix: String,
    pub site_relative_path: String,
    pub is_local_environment: bool,
    pub managed_identity_client_id: Option<String>,
    pub webhook_history_list_title: String,
    #[serde(default)]
    pub credential_strategy: CredentialStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable source.
    ///
    /// Empty values are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let credential_strategy = match read(vars::CREDENTIAL_STRATEGY) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Unknown credential strategy '{}', using the default chain", raw);
                CredentialStrategy::default()
            }),
            None => CredentialStrategy::default(),
        };

        let config = Self {
            user_agent: read(vars::USER_AGENT).unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            tenant_prefix: read(vars::TENANT_PREFIX).unwrap_or_default(),
            site_relative_path: read(vars::SITE_RELATIVE_PATH).unwrap_or_default(),
            is_local_environment: read(vars::FUNCTIONS_ENVIRONMENT).as_deref()
                == Some(LOCAL_ENVIRONMENT_MARKER),
            managed_identity_client_id: read(vars::MANAGED_IDENTITY_CLIENT_ID),
            webhook_history_list_title: read(vars::WEBHOOK_HISTORY_LIST_TITLE)
                .unwrap_or_else(|| DEFAULT_WEBHOOK_HISTORY_LIST_TITLE.to_string()),
            credential_strategy,
        };

        debug!(
            "Loaded config: tenant '{}', site '{}', local: {}",
            config.tenant_prefix, config.site_relative_path, config.is_local_environment
        );
        config
    }

    /// The site used when a caller asks for a client without naming one
    pub fn default_site(&self) -> SiteIdentity {
        SiteIdentity::new(self.tenant_prefix.clone(), self.site_relative_path.clone())
    }

    pub fn tenant_base_url(&self) -> String {
        crate::api::constants::tenant_url(&self.tenant_prefix)
    }
}
