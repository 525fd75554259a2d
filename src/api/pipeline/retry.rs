use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use reqwest::{Request, Response};

use super::{Behavior, Next};
use crate::api::resilience::RetryPolicy;

/// Retries the raw transport call on transient failures.
///
/// Sits last in the stack so only the network round trip is repeated.
/// Requests with a streaming body cannot be replayed and are sent once.
#[derive(Debug, Clone, Default)]
pub struct RetryFetch {
    policy: RetryPolicy,
}

impl RetryFetch {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl Behavior for RetryFetch {
    fn name(&self) -> &'static str {
        "RetryFetch"
    }

    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        if request.try_clone().is_none() {
            debug!("Request body cannot be replayed, sending without retries");
            return next.run(request).await;
        }

        self.policy
            .execute(move |_attempt| {
                let attempt_request = request.try_clone();
                async move {
                    match attempt_request {
                        Some(attempt_request) => next.run(attempt_request).await,
                        None => anyhow::bail!("request could not be cloned for retry"),
                    }
                }
            })
            .await
    }
}
