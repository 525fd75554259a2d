//! Ordered request/response behaviors applied to every SharePoint call
//!
//! A [`Pipeline`] is a stack of [`Behavior`]s in front of the raw HTTP
//! transport. Each behavior receives the request together with a [`Next`]
//! handle and decides when to hand the request on, so the first behavior in
//! the list sees the request first and the response last.
//!
//! [`Pipeline::sharepoint`] composes the fixed stack used by site clients:
//!
//! 1. [`DefaultHeaders`] fills in the standard service headers
//! 2. [`InjectHeaders`] overrides `UserAgent` and `X-ClientTag`
//! 3. [`BearerAuth`] attaches the access token
//! 4. [`DefaultParse`] turns error responses into [`SharePointError`]
//! 5. [`RetryFetch`] retries the raw transport call

pub mod auth;
pub mod headers;
pub mod parse;
pub mod retry;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Request, Response};
use std::sync::Arc;
use std::time::Duration;

pub use auth::BearerAuth;
pub use headers::{DefaultHeaders, InjectHeaders};
pub use parse::{DefaultParse, SharePointError};
pub use retry::RetryFetch;

use crate::api::resilience::{RetryConfig, RetryPolicy};
use crate::auth::TokenCredential;
use crate::config::Config;

/// One step of the request pipeline
#[async_trait]
pub trait Behavior: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response>;
}

/// The remainder of the pipeline after the current behavior
#[derive(Clone, Copy)]
pub struct Next<'a> {
    client: &'a reqwest::Client,
    behaviors: &'a [Arc<dyn Behavior>],
}

impl<'a> Next<'a> {
    pub async fn run(self, request: Request) -> Result<Response> {
        match self.behaviors.split_first() {
            Some((current, rest)) => {
                let next = Next {
                    client: self.client,
                    behaviors: rest,
                };
                current.handle(request, next).await
            }
            None => Ok(self.client.execute(request).await?),
        }
    }
}

#[derive(Clone)]
pub struct Pipeline {
    client: reqwest::Client,
    behaviors: Vec<Arc<dyn Behavior>>,
}

impl Pipeline {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            behaviors: Vec::new(),
        }
    }

    /// Append a behavior; it runs inside every behavior added before it
    pub fn with<B: Behavior + 'static>(mut self, behavior: B) -> Self {
        self.behaviors.push(Arc::new(behavior));
        self
    }

    pub fn behavior_names(&self) -> Vec<&'static str> {
        self.behaviors.iter().map(|b| b.name()).collect()
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn send(&self, request: Request) -> Result<Response> {
        let next = Next {
            client: &self.client,
            behaviors: &self.behaviors,
        };
        next.run(request).await
    }

    /// The stack every site client uses
    pub fn sharepoint(
        config: &Config,
        credential: Arc<dyn TokenCredential>,
        scopes: Vec<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Self::sharepoint_with_client(config, credential, scopes, client, RetryConfig::default())
    }

    pub fn sharepoint_with_client(
        config: &Config,
        credential: Arc<dyn TokenCredential>,
        scopes: Vec<String>,
        client: reqwest::Client,
        retry: RetryConfig,
    ) -> Result<Self> {
        Ok(Self::new(client)
            .with(DefaultHeaders::new())
            .with(InjectHeaders::user_agent(&config.user_agent)?)
            .with(BearerAuth::new(credential, scopes))
            .with(DefaultParse)
            .with(RetryFetch::new(RetryPolicy::new(retry))))
    }
}
