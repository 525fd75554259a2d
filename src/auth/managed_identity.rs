//! Managed identity tokens from App Service or the instance metadata service

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use std::time::Duration;

use super::{AccessToken, TokenCredential, expiry_from_epoch};

pub const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

// IMDS is unreachable off Azure; keep the probe short so a chain can move on
const IMDS_TIMEOUT: Duration = Duration::from_secs(3);
const APP_SERVICE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    AppService { endpoint: String, header: String },
    Imds { endpoint: String },
}

/// Token credential backed by the platform-assigned (or user-assigned) identity.
///
/// Only one scope can be requested at a time, mirroring what the platform
/// endpoints accept.
pub struct ManagedIdentityCredential {
    client_id: Option<String>,
    source: Source,
    http_client: reqwest::Client,
}

impl ManagedIdentityCredential {
    /// Detect the token endpoint from `IDENTITY_ENDPOINT`/`IDENTITY_HEADER`, falling back to IMDS
    pub fn new(client_id: Option<String>) -> Self {
        let endpoint = std::env::var("IDENTITY_ENDPOINT").ok().filter(|v| !v.is_empty());
        let header = std::env::var("IDENTITY_HEADER").ok().filter(|v| !v.is_empty());

        let source = match (endpoint, header) {
            (Some(endpoint), Some(header)) => Source::AppService { endpoint, header },
            _ => Source::Imds {
                endpoint: IMDS_ENDPOINT.to_string(),
            },
        };

        Self::with_source(client_id, source)
    }

    pub fn app_service(endpoint: impl Into<String>, header: impl Into<String>, client_id: Option<String>) -> Self {
        Self::with_source(
            client_id,
            Source::AppService {
                endpoint: endpoint.into(),
                header: header.into(),
            },
        )
    }

    pub fn imds(endpoint: impl Into<String>, client_id: Option<String>) -> Self {
        Self::with_source(
            client_id,
            Source::Imds {
                endpoint: endpoint.into(),
            },
        )
    }

    fn with_source(client_id: Option<String>, source: Source) -> Self {
        Self {
            client_id,
            source,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    fn build_request(&self, resource: &str) -> reqwest::RequestBuilder {
        let mut query = vec![("resource", resource.to_string())];
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.clone()));
        }

        match &self.source {
            Source::AppService { endpoint, header } => {
                query.push(("api-version", APP_SERVICE_API_VERSION.to_string()));
                self.http_client
                    .get(endpoint)
                    .query(&query)
                    .header("X-IDENTITY-HEADER", header)
                    .timeout(APP_SERVICE_TIMEOUT)
            }
            Source::Imds { endpoint } => {
                query.push(("api-version", IMDS_API_VERSION.to_string()));
                self.http_client
                    .get(endpoint)
                    .query(&query)
                    .header("Metadata", "true")
                    .timeout(IMDS_TIMEOUT)
            }
        }
    }
}

/// Managed identity endpoints take a resource, not a scope
fn scope_to_resource(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    fn name(&self) -> &'static str {
        "ManagedIdentityCredential"
    }

    async fn get_token(&self, scopes: &[String]) -> Result<AccessToken> {
        let scope = match scopes {
            [scope] => scope,
            [] => anyhow::bail!("ManagedIdentityCredential: no scope requested"),
            _ => anyhow::bail!("ManagedIdentityCredential: Multiple scopes are not supported"),
        };
        let resource = scope_to_resource(scope);

        debug!("Requesting managed identity token for {}", resource);

        let response = self.build_request(resource).send().await.map_err(|e| {
            anyhow::anyhow!("ManagedIdentityCredential: token endpoint unreachable: {}", e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "ManagedIdentityCredential: token request failed ({}): {}",
                status,
                error_text
            )
        }

        let token_data: serde_json::Value = response.json().await?;
        let access_token = token_data
            .get("access_token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| anyhow::anyhow!("ManagedIdentityCredential: no access token in response"))?;
        let expires_on = token_data
            .get("expires_on")
            .and_then(expiry_from_epoch)
            .ok_or_else(|| anyhow::anyhow!("ManagedIdentityCredential: missing or invalid expires_on"))?;

        Ok(AccessToken::new(access_token, expires_on))
    }
}
