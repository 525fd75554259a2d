//! Shared fixtures for the integration tests

use async_trait::async_trait;
use chrono::Utc;
use spo_connect::{AccessToken, TokenCredential};
use std::collections::HashMap;
use std::sync::Mutex;

/// Hands out `token-1`, `token-2`, ... and remembers the scopes it was asked for
pub struct RecordingCredential {
    pub requests: Mutex<Vec<Vec<String>>>,
}

#[allow(dead_code)]
impl RecordingCredential {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_scopes(&self) -> Option<Vec<String>> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TokenCredential for RecordingCredential {
    fn name(&self) -> &'static str {
        "RecordingCredential"
    }

    async fn get_token(&self, scopes: &[String]) -> anyhow::Result<AccessToken> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(scopes.to_vec());
        Ok(AccessToken::new(
            format!("token-{}", requests.len()),
            Utc::now() + chrono::Duration::hours(1),
        ))
    }
}

/// Always fails the way an identity provider without a session does
#[allow(dead_code)]
pub struct NoSessionCredential;

#[async_trait]
impl TokenCredential for NoSessionCredential {
    fn name(&self) -> &'static str {
        "NoSessionCredential"
    }

    async fn get_token(&self, _scopes: &[String]) -> anyhow::Result<AccessToken> {
        anyhow::bail!("AzureCliCredential: Please run 'az login' to set up an account")
    }
}

#[allow(dead_code)]
pub fn config_from(pairs: &[(&str, &str)]) -> spo_connect::Config {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    spo_connect::Config::from_lookup(|name| vars.get(name).cloned())
}
