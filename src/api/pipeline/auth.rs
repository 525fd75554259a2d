use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Request, Response};
use std::sync::Arc;

use super::{Behavior, Next};
use crate::auth::{AccessToken, TokenCredential};

/// Attaches `Authorization: Bearer <token>` using the site's credential and scopes.
///
/// A token is requested from the credential for every request; whether that
/// hits the token endpoint is up to the credential.
pub struct BearerAuth {
    credential: Arc<dyn TokenCredential>,
    scopes: Vec<String>,
}

impl BearerAuth {
    pub fn new(credential: Arc<dyn TokenCredential>, scopes: Vec<String>) -> Self {
        Self { credential, scopes }
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub async fn token(&self) -> Result<AccessToken> {
        let token = self.credential.get_token(&self.scopes).await?;
        debug!(
            "Acquired access token via {} (expires {})",
            self.credential.name(),
            token.expires_on
        );
        Ok(token)
    }
}

#[async_trait]
impl Behavior for BearerAuth {
    fn name(&self) -> &'static str {
        "BearerAuth"
    }

    async fn handle(&self, mut request: Request, next: Next<'_>) -> Result<Response> {
        let token = self.token().await?;

        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.token))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);

        next.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Sequenced {
        calls: AtomicU32,
    }

    #[async_trait]
    impl TokenCredential for Sequenced {
        fn name(&self) -> &'static str {
            "Sequenced"
        }

        async fn get_token(&self, _scopes: &[String]) -> Result<AccessToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(AccessToken::new(format!("token-{}", n), Utc::now() + chrono::Duration::hours(1)))
        }
    }

    #[tokio::test]
    async fn test_every_call_asks_the_credential() {
        let credential = Arc::new(Sequenced {
            calls: AtomicU32::new(0),
        });
        let auth = BearerAuth::new(credential.clone(), vec!["scope".to_string()]);

        assert_eq!(auth.token().await.unwrap().token, "token-1");
        assert_eq!(auth.token().await.unwrap().token, "token-2");
        assert_eq!(credential.calls.load(Ordering::SeqCst), 2);
    }
}
