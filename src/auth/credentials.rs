use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use std::time::Duration;

use super::{AccessToken, TokenCredential};

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// App registration credentials used with the client-credentials grant
#[derive(Clone)]
pub struct ClientSecretCredential {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    authority_host: String,
    http_client: reqwest::Client,
}

impl ClientSecretCredential {
    pub fn new(tenant_id: String, client_id: String, client_secret: String) -> Self {
        Self {
            tenant_id,
            client_id,
            client_secret,
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn with_authority_host(mut self, authority_host: impl Into<String>) -> Self {
        self.authority_host = authority_host.into().trim_end_matches('/').to_string();
        self
    }

    fn token_url(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority_host, self.tenant_id)
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    fn name(&self) -> &'static str {
        "ClientSecretCredential"
    }

    async fn get_token(&self, scopes: &[String]) -> Result<AccessToken> {
        let token_url = self.token_url();
        let scope = scopes.join(" ");

        let response = self
            .http_client
            .post(&token_url)
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", scope.as_str()),
            ])
            .send()
            .await?;

        debug!("Token request status: {}", response.status());

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("ClientSecretCredential: authentication failed: {}", error_text)
        }

        let token_data: serde_json::Value = response.json().await?;
        let access_token = token_data
            .get("access_token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| anyhow::anyhow!("ClientSecretCredential: no access token in response"))?;

        // Default to 1 hour if not provided
        let expires_in = token_data
            .get("expires_in")
            .and_then(|e| e.as_i64().or_else(|| e.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or(3600);

        Ok(AccessToken::new(
            access_token,
            Utc::now() + chrono::Duration::seconds(expires_in),
        ))
    }
}

/// Client-secret credential configured through `AZURE_TENANT_ID`,
/// `AZURE_CLIENT_ID` and `AZURE_CLIENT_SECRET`.
///
/// When any of them is missing the credential is unavailable and every token
/// request fails, which lets a chain move on to the next source.
pub struct EnvironmentCredential {
    inner: Option<ClientSecretCredential>,
}

impl EnvironmentCredential {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let inner = match (
            read("AZURE_TENANT_ID"),
            read("AZURE_CLIENT_ID"),
            read("AZURE_CLIENT_SECRET"),
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                info!("Using client secret credentials from environment variables");
                let credential = ClientSecretCredential::new(tenant_id, client_id, client_secret);
                Some(match read("AZURE_AUTHORITY_HOST") {
                    Some(host) => credential.with_authority_host(host),
                    None => credential,
                })
            }
            _ => None,
        };

        Self { inner }
    }

    pub fn is_available(&self) -> bool {
        self.inner.is_some()
    }
}

#[async_trait]
impl TokenCredential for EnvironmentCredential {
    fn name(&self) -> &'static str {
        "EnvironmentCredential"
    }

    async fn get_token(&self, scopes: &[String]) -> Result<AccessToken> {
        match &self.inner {
            Some(credential) => credential.get_token(scopes).await,
            None => anyhow::bail!(
                "EnvironmentCredential is unavailable: AZURE_TENANT_ID, AZURE_CLIENT_ID or AZURE_CLIENT_SECRET not set"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_environment_credential_requires_all_variables() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("AZURE_TENANT_ID", "tenant"), ("AZURE_CLIENT_ID", "client")]);
        let credential = EnvironmentCredential::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert!(!credential.is_available());
    }

    #[tokio::test]
    async fn test_unavailable_environment_credential_fails() {
        let credential = EnvironmentCredential::from_lookup(|_| None);
        let err = credential
            .get_token(&["https://contoso.sharepoint.com/.default".to_string()])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("EnvironmentCredential is unavailable"));
    }

    #[tokio::test]
    async fn test_client_secret_flow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-id/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("contoso.sharepoint.com%2F.default"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "secret-token"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential = ClientSecretCredential::new(
            "tenant-id".to_string(),
            "client-id".to_string(),
            "client-secret".to_string(),
        )
        .with_authority_host(server.uri());

        let token = credential
            .get_token(&["https://contoso.sharepoint.com/.default".to_string()])
            .await
            .unwrap();

        assert_eq!(token.token, "secret-token");
        assert!(!token.expires_within(Duration::from_secs(3000)));
    }

    #[tokio::test]
    async fn test_client_secret_rejection_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("AADSTS7000215: Invalid client secret"))
            .mount(&server)
            .await;

        let credential = ClientSecretCredential::new("t".into(), "c".into(), "wrong".into())
            .with_authority_host(server.uri());
        let err = credential.get_token(&["scope".to_string()]).await.unwrap_err();

        assert!(err.to_string().contains("AADSTS7000215"));
    }
}
